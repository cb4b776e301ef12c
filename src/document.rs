//! Host-source documents.
//!
//! Template blocks live inside ordinary host-language source files using the
//! token grammar `$name{ … }$`. This module finds those blocks, compiles each
//! one, and splices the results back into the file text.
//!
//! ## Key Invariants
//!
//! 1. **Non-escaped close**: a block ends at the first `}$` whose `}` is not
//!    preceded by `\`.
//! 2. **Text outside blocks is untouched**: only the matched tokens are replaced,
//!    in source order.
//! 3. **One generator per file**: loop accumulator names are unique across every
//!    block of a file.
//! 4. **All or nothing**: a failing block fails the file; no partial text is returned.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::compiler::{BlockInfo, HtmlCompiler};
use crate::transform::LoopIds;
use crate::validate::CompilerError;

lazy_static! {
    static ref BLOCK_RE: Regex = Regex::new(r"(?s)\$([A-Za-z0-9]*)\{(.*?[^\\])\}\$").unwrap();
}

/// Every template block of `text`, in source order.
pub fn extract_blocks(file: Option<&str>, text: &str) -> Vec<BlockInfo> {
    BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(BlockInfo {
                name: caps.get(1)?.as_str().to_string(),
                value: caps.get(2)?.as_str().trim().to_string(),
                file: file.map(str::to_string),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

impl HtmlCompiler {
    /// Compile every block of a host file and return the rewritten text.
    pub fn compile_source(&self, path: &str, text: &str) -> Result<String, CompilerError> {
        let blocks = extract_blocks(Some(path), text);
        debug!(file = %path, blocks = blocks.len(), "compiling source");

        let mut loop_ids = LoopIds::new();
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for block in &blocks {
            let compiled = self.compile_block(block, &mut loop_ids)?;
            out.push_str(&text[cursor..block.start]);
            out.push_str(&compiled);
            cursor = block.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ERR_MISSING_ATTRIBUTE;

    #[test]
    fn test_extract_blocks_offsets() {
        let text = "a := $html{<br>}$\nb := $css{x}$";
        let blocks = extract_blocks(Some("f.gos"), text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "html");
        assert_eq!(blocks[0].value, "<br>");
        assert_eq!(&text[blocks[0].start..blocks[0].end], "$html{<br>}$");
        assert_eq!(blocks[1].name, "css");
        assert_eq!(blocks[1].file.as_deref(), Some("f.gos"));
    }

    #[test]
    fn test_escaped_brace_does_not_close() {
        let blocks = extract_blocks(None, r"$raw{ a \}$ b }$");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].value, r"a \}$ b");
    }

    #[test]
    fn test_blocks_span_lines() {
        let blocks = extract_blocks(None, "$html{\n  <p>x</p>\n}$");
        assert_eq!(blocks[0].value, "<p>x</p>");
    }

    #[test]
    fn test_splice_keeps_surrounding_text() {
        let compiler = HtmlCompiler::default();
        let out = compiler
            .compile_source("v.gos", "return $html{<br>}$ // done")
            .unwrap();
        assert_eq!(out, r#"return gas.NE(&gas.E{Tag:"br", },) // done"#);
    }

    #[test]
    fn test_source_without_blocks_is_unchanged() {
        let compiler = HtmlCompiler::default();
        let text = "package main\n\nfunc main() {}\n";
        assert_eq!(compiler.compile_source("m.gos", text).unwrap(), text);
    }

    #[test]
    fn test_loop_names_unique_across_blocks() {
        let compiler = HtmlCompiler::default();
        let text = r#"$html{<i g-for="xs"></i>}$ $html{<b g-for="ys"></b>}$"#;
        let out = compiler.compile_source("l.gos", text).unwrap();
        assert!(out.contains("var loop0 "));
        assert!(out.contains("var loop1 "));
    }

    #[test]
    fn test_failing_block_reports_file_and_offsets() {
        let compiler = HtmlCompiler::default();
        let text = "x := 1\ny := $html{<g-slot></g-slot>}$";
        let err = compiler.compile_source("bad.gos", text).unwrap_err();
        assert_eq!(err.code, ERR_MISSING_ATTRIBUTE);
        assert_eq!(err.file.as_deref(), Some("bad.gos"));
        assert_eq!(err.start, Some(12));
        assert_eq!(err.end, Some(text.len()));
    }
}
