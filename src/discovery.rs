//! Source discovery.
//!
//! Recursively scans a directory for host files carrying template blocks.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::CompileOptions;
use crate::validate::CompilerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Matched extension, without the dot.
    pub extension: String,
}

impl SourceFile {
    /// `dir/name.gos` → `dir/name<suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.path.with_file_name(format!("{}{}", stem, suffix))
    }
}

/// Patterns match against the path relative to the discovery root.
fn is_ignored(root: &Path, entry: &DirEntry, ignore: &[String]) -> bool {
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let path = relative.to_string_lossy();
    ignore.iter().any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
}

/// Find every file under `dir` whose extension is configured, sorted by path.
pub fn find_sources(dir: &Path, options: &CompileOptions) -> Result<Vec<SourceFile>, CompilerError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(dir, e, &options.ignore));

    for entry in walker {
        let entry = entry.map_err(|e| CompilerError::io(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = match path.extension() {
            Some(ext) => ext.to_string_lossy(),
            None => continue,
        };
        if let Some(matched) = options.extensions.iter().find(|e| e.as_str() == ext) {
            files.push(SourceFile {
                path: path.to_path_buf(),
                extension: matched.clone(),
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("htmlc-discovery-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_finds_configured_extensions_and_skips_ignored() {
        let dir = scratch_dir("find");
        fs::create_dir_all(dir.join("app/views")).unwrap();
        fs::create_dir_all(dir.join("vendor/lib")).unwrap();
        fs::write(dir.join("app/main.gos"), "").unwrap();
        fs::write(dir.join("app/views/card.gos"), "").unwrap();
        fs::write(dir.join("app/views/card.go"), "").unwrap();
        fs::write(dir.join("vendor/lib/dep.gos"), "").unwrap();

        let files = find_sources(&dir, &CompileOptions::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.strip_prefix(&dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["app/main.gos", "app/views/card.gos"]);
        assert!(files.iter().all(|f| f.extension == "gos"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_output_path_replaces_extension() {
        let file = SourceFile {
            path: PathBuf::from("app/card.gos"),
            extension: "gos".to_string(),
        };
        assert_eq!(file.output_path("_gas.go"), PathBuf::from("app/card_gas.go"));
    }

    #[test]
    fn test_missing_directory_is_an_io_error() {
        let dir = std::env::temp_dir().join("htmlc-discovery-absent-dir");
        let err = find_sources(&dir, &CompileOptions::default()).unwrap_err();
        assert_eq!(err.code, crate::validate::ERR_IO);
    }
}
