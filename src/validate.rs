//! Error model for the markup compiler.
//!
//! Every failure in the pipeline is a [`CompilerError`]. Errors are fatal for the
//! block being compiled: the first one aborts that block and travels up to the
//! driver with as much positional context as the raising layer knows about.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_MISSING_ATTRIBUTE: &str = "HTMLC-MISSING-ATTR";
pub const ERR_ORPHAN_BRANCH: &str = "HTMLC-ORPHAN-BRANCH";
pub const ERR_ORPHAN_CASE: &str = "HTMLC-ORPHAN-CASE";
pub const ERR_DIRECTIVE_CONFLICT: &str = "HTMLC-DIRECTIVE-CONFLICT";
pub const ERR_SWITCH_CHILD: &str = "HTMLC-SWITCH-CHILD";
pub const ERR_DUPLICATE_KEY: &str = "HTMLC-DUPLICATE-KEY";
pub const ERR_COMPONENT_CALL: &str = "HTMLC-COMPONENT-CALL";
pub const ERR_TAG_DIRECTIVE: &str = "HTMLC-TAG-DIRECTIVE";
pub const ERR_PARSE: &str = "HTMLC-PARSE";
pub const ERR_IO: &str = "HTMLC-IO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// A tag is missing a mandatory attribute or has malformed children.
    Structure,
    /// `g-else-if`, `g-else` or a case arm without the construct that opens it.
    ControlFlow,
    /// The markup parser rejected the block.
    Parse,
    /// Reading sources, configuration or cache entries failed.
    Io,
}

fn category_of(code: &str) -> ErrorCategory {
    match code {
        ERR_ORPHAN_BRANCH | ERR_ORPHAN_CASE => ErrorCategory::ControlFlow,
        ERR_PARSE => ErrorCategory::Parse,
        ERR_IO => ErrorCategory::Io,
        _ => ErrorCategory::Structure,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HINTS
// ═══════════════════════════════════════════════════════════════════════════════

fn get_hint(code: &str) -> &'static str {
    match code {
        ERR_MISSING_ATTRIBUTE => {
            "`e` and `g-switch` need a `run` attribute; `g-slot` and component templates need `name`."
        }
        ERR_ORPHAN_BRANCH => "`g-else-if` and `g-else` must directly follow a `g-if` sibling.",
        ERR_ORPHAN_CASE => "`g-case` and `g-default` are only valid on children of a switch.",
        ERR_DIRECTIVE_CONFLICT => {
            "An element may carry at most one of g-if, g-else-if, g-else, g-case, g-default."
        }
        ERR_SWITCH_CHILD => "Every child of a switch must carry `g-case` or `g-default`.",
        ERR_DUPLICATE_KEY => "Slot names, template names and default arms must be unique.",
        ERR_COMPONENT_CALL => "The `run` attribute of `e` must be a call expression such as `Card()`.",
        ERR_TAG_DIRECTIVE => {
            "`e`, `g-slot`, `g-body` and `g-switch` accept only g-if, g-else-if, g-else, g-case, g-default and g-for; `template` accepts none and slot content cannot be a branch."
        }
        ERR_PARSE => "The block could not be parsed as markup.",
        ERR_IO => "Check that the path exists and is readable.",
        _ => "",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}", self.render())]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    pub file: Option<String>,
    pub block: Option<String>,
    /// Byte offsets of the block inside the host file.
    pub start: Option<usize>,
    pub end: Option<usize>,
    /// Opening tag of the offending element.
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        let hint = get_hint(code);
        CompilerError {
            code: code.to_string(),
            category: category_of(code),
            message: message.into(),
            file: None,
            block: None,
            start: None,
            end: None,
            context: None,
            hints: if hint.is_empty() {
                vec![]
            } else {
                vec![hint.to_string()]
            },
        }
    }

    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        CompilerError::new(ERR_IO, format!("{}: {}", path.display(), err))
            .with_file(&path.to_string_lossy())
    }

    /// Attach the offending element. The innermost element wins.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if self.context.is_none() {
            self.context = Some(context.into());
        }
        self
    }

    pub fn with_file(mut self, file: &str) -> Self {
        if self.file.is_none() {
            self.file = Some(file.to_string());
        }
        self
    }

    pub fn with_block(mut self, name: &str, start: usize, end: usize) -> Self {
        if self.block.is_none() {
            self.block = Some(name.to_string());
            self.start = Some(start);
            self.end = Some(end);
        }
        self
    }

    fn render(&self) -> String {
        let mut out = format!("[{}] {}", self.code, self.message);
        if let Some(ctx) = &self.context {
            out.push_str(&format!(" at {}", ctx));
        }
        if let Some(block) = &self.block {
            out.push_str(&format!(" in block `{}`", block));
            if let (Some(s), Some(e)) = (self.start, self.end) {
                out.push_str(&format!(" ({}..{})", s, e));
            }
        }
        if let Some(file) = &self.file {
            out.push_str(&format!(" of {}", file));
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
