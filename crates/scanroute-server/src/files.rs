//! Read-only views over the four document folders.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scanroute_core::models::config::PathsConfig;
use scanroute_core::routing::split_filename;

use crate::error::{ApiError, ApiResult};

/// One of the four logical folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Folder {
    FullyIndexed,
    PartiallyIndexed,
    Scan,
    Failed,
}

impl Folder {
    /// Lookup order used by listing and download.
    pub const ALL: [Folder; 4] = [
        Folder::FullyIndexed,
        Folder::PartiallyIndexed,
        Folder::Scan,
        Folder::Failed,
    ];

    /// Map a `status` query value; unknown values mean the scan folder.
    pub fn from_query(value: &str) -> Self {
        match value {
            "fully" => Folder::FullyIndexed,
            "partial" => Folder::PartiallyIndexed,
            "failed" => Folder::Failed,
            _ => Folder::Scan,
        }
    }

    /// Processing status a file in this folder is in.
    pub fn status(&self) -> &'static str {
        match self {
            Folder::FullyIndexed => "fully_indexed",
            Folder::PartiallyIndexed => "partially_indexed",
            Folder::Scan => "pending",
            Folder::Failed => "failed",
        }
    }
}

/// The folder layout, as seen by the HTTP side.
#[derive(Debug, Clone)]
pub struct Folders {
    paths: PathsConfig,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FolderStats {
    pub scan: usize,
    pub fully_indexed: usize,
    pub partially_indexed: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct FileMetadata {
    pub filename: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub directory: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FileStatus {
    pub filename: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProcessedResult {
    pub original_filename: String,
    pub processed_filename: String,
    pub status: &'static str,
    pub file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_account: Option<String>,
}

/// Reject names that could escape a folder.
pub fn safe_file_name(name: &str) -> ApiResult<&str> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }
    Ok(name)
}

/// Plain files directly in `dir`, sorted; a missing folder lists as empty.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

fn dedup(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

impl Folders {
    pub fn new(paths: PathsConfig) -> Self {
        Self { paths }
    }

    pub fn dir(&self, folder: Folder) -> &Path {
        match folder {
            Folder::FullyIndexed => &self.paths.fully_indexed_dir,
            Folder::PartiallyIndexed => &self.paths.partial_indexed_dir,
            Folder::Scan => &self.paths.scan_dir,
            Folder::Failed => &self.paths.failed_dir,
        }
    }

    /// Names in one folder, or in all four when `folder` is `None`.
    pub fn list(&self, folder: Option<Folder>) -> Vec<String> {
        match folder {
            Some(f) => list_dir(self.dir(f)),
            None => dedup(Folder::ALL.iter().flat_map(|f| list_dir(self.dir(*f)))),
        }
    }

    /// First folder holding `name`.
    pub fn find(&self, name: &str) -> ApiResult<Option<(Folder, PathBuf)>> {
        let name = safe_file_name(name)?;
        Ok(Folder::ALL
            .iter()
            .map(|f| (*f, self.dir(*f).join(name)))
            .find(|(_, path)| path.is_file()))
    }

    pub fn metadata(&self, name: &str) -> ApiResult<FileMetadata> {
        let (folder, path) = self
            .find(name)?
            .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
        let meta = std::fs::metadata(&path)?;
        Ok(FileMetadata {
            filename: name.to_string(),
            size: meta.len(),
            modified: meta.modified().map(DateTime::<Utc>::from)?,
            directory: self.dir(folder).display().to_string(),
            status: folder.status(),
        })
    }

    /// Case-insensitive substring search over all folders.
    pub fn search(&self, query: &str) -> Vec<String> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.list(None)
            .into_iter()
            .filter(|n| n.to_lowercase().contains(&term))
            .collect()
    }

    pub fn stats(&self) -> FolderStats {
        FolderStats {
            scan: list_dir(self.dir(Folder::Scan)).len(),
            fully_indexed: list_dir(self.dir(Folder::FullyIndexed)).len(),
            partially_indexed: list_dir(self.dir(Folder::PartiallyIndexed)).len(),
            failed: list_dir(self.dir(Folder::Failed)).len(),
        }
    }

    /// Which folder holds `filename`, exactly or by a name sharing its stem.
    pub fn status_of(&self, filename: &str) -> FileStatus {
        let (stem, _) = split_filename(filename);
        let order = [
            Folder::FullyIndexed,
            Folder::PartiallyIndexed,
            Folder::Failed,
            Folder::Scan,
        ];

        for folder in order {
            let dir = self.dir(folder);
            if let Some(found) = list_dir(dir)
                .into_iter()
                .find(|f| f == filename || f.starts_with(stem))
            {
                return FileStatus {
                    filename: filename.to_string(),
                    status: folder.status(),
                    path: Some(dir.join(&found)),
                    processed_filename: Some(found),
                };
            }
        }

        FileStatus {
            filename: filename.to_string(),
            status: "not_found",
            processed_filename: None,
            path: None,
        }
    }

    /// Indexed result for `filename`, splitting `name_account` from the stem.
    pub fn processed_result(&self, filename: &str) -> ApiResult<ProcessedResult> {
        let (stem, _) = split_filename(filename);

        for folder in [Folder::FullyIndexed, Folder::PartiallyIndexed] {
            let dir = self.dir(folder);
            let Some(found) = list_dir(dir).into_iter().find(|f| f.starts_with(stem)) else {
                continue;
            };

            let (processed_stem, _) = split_filename(&found);
            let (extracted_name, extracted_account) = match processed_stem.rsplit_once('_') {
                Some((name, account)) => (Some(name.to_string()), Some(account.to_string())),
                None => (None, None),
            };

            return Ok(ProcessedResult {
                original_filename: filename.to_string(),
                file_path: dir.join(&found),
                processed_filename: found,
                status: folder.status(),
                extracted_name,
                extracted_account,
            });
        }

        Err(ApiError::NotFound(
            "File not found or not processed".to_string(),
        ))
    }
}
