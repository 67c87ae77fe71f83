//! Configuration structures for the routing pipeline.
//!
//! The configuration is built once at process start (file, then environment
//! overrides) and handed to each component. Nothing below this module reads
//! the process environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Main configuration for scanroute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanrouteConfig {
    /// Deployment profile.
    pub profile: Profile,

    /// Folder layout.
    pub paths: PathsConfig,

    /// OCR tool configuration.
    pub ocr: OcrConfig,

    /// HTTP listener configuration.
    pub server: ServerConfig,

    /// Retry policies for moves and per-file processing.
    pub retry: RetryConfig,

    /// Watch loop timing.
    pub watch: WatchConfig,

    /// Logging configuration.
    pub log: LogConfig,
}

/// Deployment profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// OCR every page of a scanned PDF.
    #[default]
    Full,
    /// Constrained hosts: first page only, at a reduced resolution.
    Lite,
}

impl FromStr for Profile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Profile::Full),
            "lite" | "minimal" => Ok(Profile::Lite),
            _ => Err(()),
        }
    }
}

/// The four logical folders plus the log folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Incoming drop folder.
    pub scan_dir: PathBuf,

    /// Documents with both a name and an account number.
    pub fully_indexed_dir: PathBuf,

    /// Documents with exactly one of name / account number.
    pub partial_indexed_dir: PathBuf,

    /// Documents nothing could be extracted from.
    pub failed_dir: PathBuf,

    /// Rolling log output.
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scan_dir: PathBuf::from("incoming-scan"),
            fully_indexed_dir: PathBuf::from("fully_indexed"),
            partial_indexed_dir: PathBuf::from("partially_indexed"),
            failed_dir: PathBuf::from("failed"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl PathsConfig {
    /// Create every configured folder if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.scan_dir,
            &self.fully_indexed_dir,
            &self.partial_indexed_dir,
            &self.failed_dir,
            &self.log_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// OCR tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable.
    pub tesseract_cmd: PathBuf,

    /// Directory holding the poppler utilities (`pdftoppm`).
    pub poppler_path: PathBuf,

    /// Resolution used when rasterising PDF pages.
    pub dpi: u32,

    /// Tesseract language code.
    pub language: String,

    /// Use the embedded PDF text layer when it is substantial.
    pub prefer_embedded_text: bool,

    /// Minimum non-whitespace characters for the text layer to count.
    pub min_text_length: usize,

    /// Maximum PDF pages to OCR (0 = unlimited).
    pub max_pages: usize,

    /// Resolution assumed for images converted to PDF.
    pub convert_dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("/usr/bin/tesseract"),
            poppler_path: PathBuf::from("/usr/bin"),
            dpi: 600,
            language: "eng".to_string(),
            prefer_embedded_text: true,
            min_text_length: 50,
            max_pages: 10,
            convert_dpi: 300,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Retry policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts for a single move.
    pub max_retries: u32,

    /// Seconds between move attempts.
    pub retry_delay_secs: f64,

    /// Attempts for processing one file within a batch.
    pub file_attempts: u32,

    /// Seconds between per-file attempts.
    pub file_backoff_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 1.0,
            file_attempts: 10,
            file_backoff_secs: 0.5,
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay_secs)
    }

    pub fn file_backoff(&self) -> Duration {
        secs(self.file_backoff_secs)
    }
}

/// Watch loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet window that must pass after the last event before a batch runs.
    pub batch_delay_secs: f64,

    /// Grace delay before each batch so slow writers can finish.
    pub process_delay_secs: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            batch_delay_secs: 0.5,
            process_delay_secs: 5.0,
        }
    }
}

impl WatchConfig {
    pub fn batch_delay(&self) -> Duration {
        secs(self.batch_delay_secs)
    }

    pub fn process_delay(&self) -> Duration {
        secs(self.process_delay_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// OCR resolution used by the `lite` profile.
pub const LITE_DPI: u32 = 150;

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl ScanrouteConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply the profile's OCR limits.
    ///
    /// `lite` OCRs only the first PDF page at a reduced resolution; with
    /// `keep_dpi` the configured resolution is left alone.
    pub fn apply_profile(&mut self, keep_dpi: bool) {
        if self.profile == Profile::Lite {
            if !keep_dpi {
                self.ocr.dpi = LITE_DPI;
            }
            self.ocr.max_pages = 1;
        }
    }

    /// Apply environment-style overrides through `lookup`, then the profile.
    ///
    /// This is the last step of loading, so a profile chosen in the file is
    /// honoured too. An explicit `OCR_DPI` wins over the profile resolution.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCANROUTE_PROFILE") {
            self.profile = v.parse().map_err(|_| invalid("SCANROUTE_PROFILE", &v))?;
        }

        let path_vars: [(&str, &mut PathBuf); 7] = [
            ("SCAN_DIR", &mut self.paths.scan_dir),
            ("FULLY_INDEXED_DIR", &mut self.paths.fully_indexed_dir),
            ("PARTIAL_INDEXED_DIR", &mut self.paths.partial_indexed_dir),
            ("FAILED_DIR", &mut self.paths.failed_dir),
            ("LOG_DIR", &mut self.paths.log_dir),
            ("TESSERACT_CMD", &mut self.ocr.tesseract_cmd),
            ("POPPLER_PATH", &mut self.ocr.poppler_path),
        ];
        for (key, slot) in path_vars {
            if let Some(v) = lookup(key) {
                *slot = PathBuf::from(v);
            }
        }

        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log.level = v.to_lowercase();
        }

        parse_into(&lookup, "OCR_DPI", &mut self.ocr.dpi)?;
        parse_into(&lookup, "PORT", &mut self.server.port)?;
        parse_into(&lookup, "MAX_RETRIES", &mut self.retry.max_retries)?;
        parse_into(&lookup, "RETRY_DELAY", &mut self.retry.retry_delay_secs)?;
        parse_into(&lookup, "BATCH_DELAY", &mut self.watch.batch_delay_secs)?;
        parse_into(&lookup, "PROCESS_DELAY", &mut self.watch.process_delay_secs)?;

        self.apply_profile(lookup("OCR_DPI").is_some());
        Ok(())
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(v) = lookup(key) {
        *slot = v.trim().parse().map_err(|_| invalid(key, &v))?;
    }
    Ok(())
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
