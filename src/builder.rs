//! Multi-file build driver.
//!
//! discover → cache lookup → compile → write, with files compiled in parallel.
//! The first failing file aborts the build with its error.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::IncrementalCache;
use crate::compiler::HtmlCompiler;
use crate::discovery::{find_sources, SourceFile};
use crate::validate::CompilerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Compiled,
    Cached,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub compiled: usize,
    pub cached: usize,
    /// Written (or already up to date) output files, sorted.
    pub outputs: Vec<PathBuf>,
}

pub struct Builder<'c> {
    compiler: &'c HtmlCompiler,
    cache: Option<IncrementalCache>,
}

impl<'c> Builder<'c> {
    /// Cache entries live under `cacheDir`, resolved against `root` when relative.
    pub fn new(compiler: &'c HtmlCompiler, root: &Path) -> Result<Self, CompilerError> {
        let options = &compiler.options;
        let cache = if options.use_cache {
            Some(IncrementalCache::new(root.join(&options.cache_dir), options)?)
        } else {
            None
        };
        Ok(Builder { compiler, cache })
    }

    /// Compile one host file and return the rewritten text without writing it.
    pub fn compile_file(&self, path: &Path) -> Result<String, CompilerError> {
        let source = fs::read_to_string(path).map_err(|e| CompilerError::io(path, e))?;
        self.compiler
            .compile_source(&path.to_string_lossy(), &source)
    }

    fn build_file(&self, file: &SourceFile) -> Result<(PathBuf, FileOutcome), CompilerError> {
        let source = fs::read_to_string(&file.path).map_err(|e| CompilerError::io(&file.path, e))?;
        let output_path = file.output_path(&self.compiler.options.output_suffix);

        if let Some(cache) = &self.cache {
            if let Some(output) = cache.get(&file.path, &source) {
                if !output_path.exists() {
                    fs::write(&output_path, output).map_err(|e| CompilerError::io(&output_path, e))?;
                }
                debug!(file = %file.path.display(), "cache hit");
                return Ok((output_path, FileOutcome::Cached));
            }
        }

        let output = self
            .compiler
            .compile_source(&file.path.to_string_lossy(), &source)?;
        fs::write(&output_path, &output).map_err(|e| CompilerError::io(&output_path, e))?;
        if let Some(cache) = &self.cache {
            cache.set(&file.path, &source, &output);
        }

        info!(file = %file.path.display(), output = %output_path.display(), "compiled");
        Ok((output_path, FileOutcome::Compiled))
    }

    /// Build every source file under `dir`.
    pub fn build_dir(&self, dir: &Path) -> Result<BuildReport, CompilerError> {
        let files = find_sources(dir, &self.compiler.options)?;
        info!(dir = %dir.display(), files = files.len(), "building");

        let results: Vec<(PathBuf, FileOutcome)> = files
            .par_iter()
            .map(|file| self.build_file(file))
            .collect::<Result<_, _>>()?;

        let mut report = BuildReport::default();
        for (output, outcome) in results {
            match outcome {
                FileOutcome::Compiled => report.compiled += 1,
                FileOutcome::Cached => report.cached += 1,
            }
            report.outputs.push(output);
        }
        report.outputs.sort();
        Ok(report)
    }
}
