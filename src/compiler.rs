//! Compile-one-block entry point.
//!
//! [`HtmlCompiler`] owns the options and the registered attribute observers.
//! Observers are added during setup and only read while compiling, so a shared
//! `&HtmlCompiler` can drive any number of blocks.

use tracing::debug;

use crate::codegen::Emitter;
use crate::config::CompileOptions;
use crate::parse::parse_markup;
use crate::transform::{lower_block, LoopIds, LoweringContext};
use crate::validate::CompilerError;

pub const BLOCK_HTML: &str = "html";
pub const BLOCK_HTML_ELEMENT: &str = "htmlEl";
pub const BLOCK_HTML_FUNC: &str = "htmlF";

/// One delimited template block and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub name: String,
    /// Block body, already trimmed.
    pub value: String,
    pub file: Option<String>,
    /// Byte offsets of the whole `$name{…}$` token in the host file.
    pub start: usize,
    pub end: usize,
}

impl BlockInfo {
    /// A block that does not come from a host file.
    pub fn standalone(name: &str, value: &str) -> Self {
        BlockInfo {
            name: name.to_string(),
            value: value.trim().to_string(),
            file: None,
            start: 0,
            end: value.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Markup,
    MarkupFunc,
    Passthrough,
}

impl BlockKind {
    fn of(name: &str) -> Self {
        match name {
            BLOCK_HTML | BLOCK_HTML_ELEMENT => BlockKind::Markup,
            BLOCK_HTML_FUNC => BlockKind::MarkupFunc,
            _ => BlockKind::Passthrough,
        }
    }
}

/// Receives every attribute `(key, value)` seen while lowering, in traversal order.
pub type AttributeObserver = Box<dyn Fn(&str, &str, &BlockInfo) + Send + Sync>;

#[derive(Default)]
pub struct HtmlCompiler {
    pub options: CompileOptions,
    observers: Vec<AttributeObserver>,
}

impl HtmlCompiler {
    pub fn new(options: CompileOptions) -> Self {
        HtmlCompiler {
            options,
            observers: Vec::new(),
        }
    }

    pub fn add_attribute_observer(&mut self, observer: AttributeObserver) {
        self.observers.push(observer);
    }

    pub fn emitter(&self) -> Emitter<'_> {
        Emitter::new(&self.options.runtime)
    }

    /// Compile one block. Errors carry the block name, offsets and file.
    pub fn compile_block(
        &self,
        block: &BlockInfo,
        loop_ids: &mut LoopIds,
    ) -> Result<String, CompilerError> {
        let kind = BlockKind::of(&block.name);
        if kind == BlockKind::Passthrough {
            return Ok(block.value.trim().to_string());
        }

        let locate = |e: CompilerError| {
            let e = e.with_block(&block.name, block.start, block.end);
            match &block.file {
                Some(file) => e.with_file(file),
                None => e,
            }
        };

        debug!(block = %block.name, start = block.start, end = block.end, "compiling block");

        let nodes = parse_markup(&block.value).map_err(locate)?;
        let observe = |key: &str, value: &str| {
            for observer in &self.observers {
                observer(key, value, block);
            }
        };
        let mut ctx = LoweringContext {
            emitter: self.emitter(),
            observe: &observe,
            loop_ids,
        };

        let body = lower_block(nodes, &mut ctx).map_err(locate)?;

        Ok(match kind {
            BlockKind::MarkupFunc => ctx.emitter.element_func(&body),
            _ => body,
        })
    }

    /// Compile a standalone `html` block with its own loop-name generator.
    pub fn compile_markup(&self, markup: &str) -> Result<String, CompilerError> {
        let block = BlockInfo::standalone(BLOCK_HTML, markup);
        self.compile_block(&block, &mut LoopIds::new())
    }
}
