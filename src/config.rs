//! Compiler configuration.
//!
//! Options are read from an optional `htmlc.json` next to the sources. Every
//! field has a default, so an empty object (or no file at all) is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::validate::{CompilerError, ERR_IO};

pub const CONFIG_FILE_NAME: &str = "htmlc.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Package identifier used in emitted calls (`gas.NE`, `gas.E`, ...).
    pub runtime: String,
    /// Source file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Replaces `.<ext>` in the output file name.
    pub output_suffix: String,
    pub cache_dir: String,
    pub use_cache: bool,
    /// Paths containing any of these substrings are skipped during discovery.
    pub ignore: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            runtime: "gas".to_string(),
            extensions: vec!["gos".to_string()],
            output_suffix: "_gas.go".to_string(),
            cache_dir: ".htmlc/cache".to_string(),
            use_cache: true,
            ignore: vec!["vendor".to_string(), ".git".to_string()],
        }
    }
}

impl CompileOptions {
    /// Load options from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|e| CompilerError::io(path, e))?;
        Self::from_json(&data).map_err(|e| e.with_file(&path.to_string_lossy()))
    }

    pub fn from_json(data: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(data)
            .map_err(|e| CompilerError::new(ERR_IO, format!("invalid configuration: {}", e)))
    }

    /// Stable serialization, folded into cache keys so option changes invalidate entries.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        assert_eq!(CompileOptions::from_json("{}").unwrap(), CompileOptions::default());
    }

    #[test]
    fn test_partial_override() {
        let opts =
            CompileOptions::from_json(r#"{"runtime": "ui", "extensions": ["gox", "gos"]}"#)
                .unwrap();
        assert_eq!(opts.runtime, "ui");
        assert_eq!(opts.extensions, vec!["gox", "gos"]);
        assert_eq!(opts.output_suffix, "_gas.go");
        assert!(opts.use_cache);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = CompileOptions::from_json(r#"{"runtime": 3}"#).unwrap_err();
        assert_eq!(err.code, ERR_IO);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("htmlc-config-does-not-exist.json");
        assert_eq!(CompileOptions::load(&path).unwrap(), CompileOptions::default());
    }
}
