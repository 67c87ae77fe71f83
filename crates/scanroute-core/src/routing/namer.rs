//! Collision-safe destination names.

use std::path::Path;

/// Split `filename` into stem and extension (with its dot, or empty).
pub fn split_filename(filename: &str) -> (&str, &str) {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) if filename.len() > ext.len() + 1 => {
            let dot = filename.len() - ext.len() - 1;
            (&filename[..dot], &filename[dot..])
        }
        _ => (filename, ""),
    }
}

/// Return `desired` if it is free in `dir`, otherwise the first free
/// `base_N.ext` for N = 1, 2, ...
///
/// The probe is not atomic: a concurrent writer can take the name between
/// this check and the write.
pub fn resolve(dir: &Path, desired: &str) -> String {
    if !dir.join(desired).exists() {
        return desired.to_string();
    }

    let (base, ext) = split_filename(desired);
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{}_{}{}", base, n, ext);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_split_filename() {
        assert_eq!(split_filename("foo.pdf"), ("foo", ".pdf"));
        assert_eq!(split_filename("John Smith_123.PDF"), ("John Smith_123", ".PDF"));
        assert_eq!(split_filename("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_filename("README"), ("README", ""));
        assert_eq!(split_filename(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_resolve_free_name_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve(dir.path(), "foo.pdf"), "foo.pdf");
    }

    #[test]
    fn test_resolve_appends_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.pdf"), b"a").unwrap();
        assert_eq!(resolve(dir.path(), "foo.pdf"), "foo_1.pdf");

        fs::write(dir.path().join("foo_1.pdf"), b"b").unwrap();
        assert_eq!(resolve(dir.path(), "foo.pdf"), "foo_2.pdf");
    }

    #[test]
    fn test_resolve_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scan"), b"a").unwrap();
        assert_eq!(resolve(dir.path(), "scan"), "scan_1");
    }
}
