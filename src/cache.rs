//! Incremental compile cache.
//!
//! One JSON entry per source file, keyed by the SHA-256 of the source text plus
//! the serialized options. A stale or unreadable entry is a miss, never an error.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::CompileOptions;
use crate::validate::CompilerError;

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub output: String,
}

pub struct IncrementalCache {
    cache_dir: PathBuf,
    fingerprint: String,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>, options: &CompileOptions) -> Result<Self, CompilerError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| CompilerError::io(&cache_dir, e))?;
        Ok(Self {
            cache_dir,
            fingerprint: options.fingerprint(),
        })
    }

    pub fn compute_hash(&self, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(self.fingerprint.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, file_path: &Path) -> PathBuf {
        let safe_name = file_path
            .to_string_lossy()
            .replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, file_path: &Path, source: &str) -> Option<String> {
        let entry_path = self.entry_path(file_path);
        let data = fs::read_to_string(&entry_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                warn!(file = %file_path.display(), error = %e, "discarding corrupt cache entry");
                fs::remove_file(entry_path).ok();
                return None;
            }
        };

        if entry.hash == self.compute_hash(source) {
            Some(entry.output)
        } else {
            None
        }
    }

    pub fn set(&self, file_path: &Path, source: &str, output: &str) {
        let entry = CacheEntry {
            hash: self.compute_hash(source),
            output: output.to_string(),
        };
        let entry_path = self.entry_path(file_path);
        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(&entry_path, data) {
                    warn!(file = %file_path.display(), error = %e, "failed to write cache entry");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("htmlc-cache-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_hit_after_set() {
        let dir = scratch_dir("hit");
        let cache = IncrementalCache::new(&dir, &CompileOptions::default()).unwrap();
        let file = Path::new("app/view.gos");
        assert_eq!(cache.get(file, "src"), None);
        cache.set(file, "src", "out");
        assert_eq!(cache.get(file, "src").as_deref(), Some("out"));
        assert_eq!(cache.get(file, "changed"), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_options_change_invalidates() {
        let dir = scratch_dir("opts");
        let file = Path::new("view.gos");
        IncrementalCache::new(&dir, &CompileOptions::default())
            .unwrap()
            .set(file, "src", "out");

        let other = CompileOptions {
            runtime: "ui".to_string(),
            ..CompileOptions::default()
        };
        let cache = IncrementalCache::new(&dir, &other).unwrap();
        assert_eq!(cache.get(file, "src"), None);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_entry_is_a_miss_and_removed() {
        let dir = scratch_dir("corrupt");
        let cache = IncrementalCache::new(&dir, &CompileOptions::default()).unwrap();
        let file = Path::new("view.gos");
        let entry = cache.entry_path(file);
        fs::write(&entry, "{not json").unwrap();

        assert_eq!(cache.get(file, "src"), None);
        assert!(!entry.exists());
        fs::remove_dir_all(&dir).ok();
    }
}
