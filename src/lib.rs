//! # htmlc: markup template compiler
//!
//! Translates HTML-like template blocks, annotated with control-flow and
//! data-binding directives, into construction calls against a declarative UI
//! runtime (`gas.NE(&gas.E{...}, children...)` by default).
//!
//! ## Pipeline
//!
//! 1. **Extraction** (`document`): `$name{ … }$` blocks are found in host source.
//! 2. **Parsing** (`parse`): each block becomes an ordered [`MarkupNode`] tree.
//! 3. **Lowering** (`transform`, `component`): attributes are classified,
//!    text is interpolated, branch chains are merged and loops/switches/components
//!    are expanded, depth-first and in source order.
//! 4. **Emission** (`codegen`): fixed textual templates produce the output, which
//!    is spliced back into the host file.
//!
//! ## Key Invariants
//!
//! 1. **Source order**: emitted siblings appear in the order they were written.
//! 2. **One expression per chain**: `g-if` / `g-else-if` / `g-else` siblings lower
//!    to a single self-evaluating closure.
//! 3. **Unique loop names per file**: accumulators are `loop0`, `loop1`, ... from a
//!    generator shared by every block of one host file.
//! 4. **Deterministic**: identical input and options yield byte-identical output.
//! 5. **Fail fast**: the first error aborts the block; nothing partial is written.

mod builder;
mod cache;
mod classify;
mod codegen;
mod compiler;
mod component;
mod config;
mod discovery;
mod document;
mod interpolate;
mod parse;
mod transform;
mod validate;

#[cfg(test)]
mod safety_tests;

pub use builder::{BuildReport, Builder, FileOutcome};
pub use cache::IncrementalCache;
pub use classify::{classify_attribute, normalize_for_clause, AttributeClass, Branch, Directive, ElementInfo};
pub use codegen::Emitter;
pub use compiler::{AttributeObserver, BlockInfo, HtmlCompiler};
pub use config::{CompileOptions, CONFIG_FILE_NAME};
pub use discovery::{find_sources, SourceFile};
pub use document::extract_blocks;
pub use interpolate::{interpolate, Segment};
pub use parse::{parse_markup, Attribute, ElementNode, MarkupNode};
pub use transform::{lower_block, lower_children, lower_node, LoopIds, Lowered, LoweringContext};
pub use validate::*;
