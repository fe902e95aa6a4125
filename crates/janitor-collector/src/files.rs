//! Exclude and prescan files
//!
//! Either one reference per line (blank lines and `#` comments ignored)
//! or a JSON array of strings, which is what `scan` writes.

use camino::Utf8Path;
use janitor_core::{Error, ImageReference, LiveImageTable, Result};
use std::fs;
use tracing::{info, warn};

/// Load every file into one table, each reference attributed to its file
pub fn load_files<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<LiveImageTable> {
    let mut live = LiveImageTable::new();
    for path in paths {
        let path = path.as_ref();
        info!("Reading image references from {}", path);
        let loaded = load_file(path)?;
        info!("Loaded {} image references from {}", loaded.len(), path);
        live.merge(loaded);
    }
    Ok(live)
}

pub fn load_file(path: &Utf8Path) -> Result<LiveImageTable> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::configuration(format!("image list not found: {}", path))
        } else {
            Error::Io(e)
        }
    })?;
    parse_references(&content, path.as_str())
}

/// Parse file content; `source` becomes the consumer label
pub fn parse_references(content: &str, source: &str) -> Result<LiveImageTable> {
    let entries: Vec<String> = if content.trim_start().starts_with('[') {
        serde_json::from_str(content)?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect()
    };

    let mut live = LiveImageTable::new();
    for entry in entries {
        let reference = ImageReference::new(entry);
        if !reference.is_registry_hosted() {
            warn!("Skipping line {} in {}", reference, source);
            continue;
        }
        if live.add(reference.clone(), source) {
            info!("{} is defined in {}", reference, source);
        }
    }
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    const KEPT: &str = "123456789012.dkr.ecr.us-east-1.amazonaws.com/app:v1";

    #[test]
    fn test_line_format() {
        let content = format!("# keep forever\n\n{}\n  nginx:latest\n{}\n", KEPT, KEPT);
        let live = parse_references(&content, "keep.txt").unwrap();
        assert_eq!(live.len(), 1);
        assert!(live.contains(&KEPT.into()));
        assert!(!live.contains(&"nginx:latest".into()));
        assert_eq!(live.consumers(&KEPT.into()).unwrap().sorted(), vec!["keep.txt"]);
    }

    #[test]
    fn test_json_format() {
        let content = format!(r#"["{}", "public.ecr.aws/foo/bar:1"]"#, KEPT);
        let live = parse_references(&content, "scanned.json").unwrap();
        assert_eq!(live.len(), 1);
        assert!(live.contains(&KEPT.into()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_references("[\"unterminated", "bad.json").is_err());
    }

    #[test]
    fn test_load_files_merges() {
        let dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let a = base.join("a.txt");
        let b = base.join("b.json");
        fs::write(&a, format!("{}\n", KEPT)).unwrap();
        fs::write(&b, format!(r#"["{}"]"#, KEPT)).unwrap();

        let live = load_files(&[a, b]).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live.consumers(&KEPT.into()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_file(Utf8Path::new("/nonexistent/keep.txt")).is_err());
    }
}
