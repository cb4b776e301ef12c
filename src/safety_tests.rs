//! Safety gate tests.
//!
//! Control-flow ordering and structural errors must abort the block with a
//! stable code, the offending element as context, and a hint. No partial
//! output ever escapes a failed compile.

#[cfg(test)]
mod tests {
    use crate::compiler::HtmlCompiler;
    use crate::validate::{
        CompilerError, ErrorCategory, ERR_DIRECTIVE_CONFLICT, ERR_DUPLICATE_KEY, ERR_ORPHAN_BRANCH,
        ERR_ORPHAN_CASE, ERR_SWITCH_CHILD,
    };

    fn compile_err(markup: &str) -> CompilerError {
        match HtmlCompiler::default().compile_markup(markup) {
            Ok(out) => panic!("expected an error, got {}", out),
            Err(e) => e,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ORPHAN BRANCHES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_else_without_if() {
        let err = compile_err("<p g-else>x</p>");
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
        assert_eq!(err.category, ErrorCategory::ControlFlow);
        assert_eq!(err.context.as_deref(), Some("<p g-else>"));
        assert!(!err.hints.is_empty());
    }

    #[test]
    fn test_else_if_without_if() {
        let err = compile_err(r#"<div><br><p g-else-if="b">x</p></div>"#);
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
    }

    #[test]
    fn test_sibling_between_if_and_else_closes_the_chain() {
        let err = compile_err(r#"<p g-if="a">A</p><br><p g-else>B</p>"#);
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
    }

    #[test]
    fn test_else_after_else_is_orphaned() {
        let err = compile_err(r#"<p g-if="a">A</p><p g-else>B</p><p g-else>C</p>"#);
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
    }

    #[test]
    fn test_chain_does_not_cross_parents() {
        let err = compile_err(r#"<p g-if="a">A</p><div><p g-else>B</p></div>"#);
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
    }

    #[test]
    fn test_nested_orphan_reports_innermost_element() {
        let err = compile_err(r#"<section><ul><li g-else>x</li></ul></section>"#);
        assert_eq!(err.code, ERR_ORPHAN_BRANCH);
        assert_eq!(err.context.as_deref(), Some("<li g-else>"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SWITCH ARMS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_case_outside_switch() {
        let err = compile_err(r#"<div><p g-case="1">x</p></div>"#);
        assert_eq!(err.code, ERR_ORPHAN_CASE);
        assert_eq!(err.category, ErrorCategory::ControlFlow);
    }

    #[test]
    fn test_default_outside_switch() {
        let err = compile_err("<p g-default>x</p>");
        assert_eq!(err.code, ERR_ORPHAN_CASE);
    }

    #[test]
    fn test_switch_child_without_arm() {
        let err = compile_err(r#"<g-switch run="x"><p g-case="1">a</p><p>b</p></g-switch>"#);
        assert_eq!(err.code, ERR_SWITCH_CHILD);
        assert_eq!(err.context.as_deref(), Some("<p>"));
    }

    #[test]
    fn test_switch_rejects_text() {
        let err = compile_err(r#"<g-switch run="x">stray</g-switch>"#);
        assert_eq!(err.code, ERR_SWITCH_CHILD);
        assert_eq!(err.context.as_deref(), Some(r#"<g-switch run="x">"#));
    }

    #[test]
    fn test_switch_with_two_defaults() {
        let err = compile_err(r#"<div g-switch="x"><p g-default>a</p><p g-default>b</p></div>"#);
        assert_eq!(err.code, ERR_DUPLICATE_KEY);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DIRECTIVE CONFLICTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_if_and_else_on_one_element() {
        let err = compile_err(r#"<p g-if="a" g-else>x</p>"#);
        assert_eq!(err.code, ERR_DIRECTIVE_CONFLICT);
        assert!(err.message.contains("g-else"));
        assert!(err.message.contains("g-if"));
    }

    #[test]
    fn test_case_and_if_on_one_element() {
        let err = compile_err(r#"<g-switch run="x"><p g-case="1" g-if="a">x</p></g-switch>"#);
        assert_eq!(err.code, ERR_DIRECTIVE_CONFLICT);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // REPORTING
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_display_includes_code_context_and_block() {
        let rendered = compile_err("<p g-else>x</p>").to_string();
        assert!(rendered.starts_with("[HTMLC-ORPHAN-BRANCH]"));
        assert!(rendered.contains("<p g-else>"));
        assert!(rendered.contains("in block `html`"));
    }

    #[test]
    fn test_failed_file_produces_no_output() {
        let compiler = HtmlCompiler::default();
        let text = "a := $html{<br>}$\nb := $html{<p g-else>x</p>}$";
        assert!(compiler.compile_source("two.gos", text).is_err());
    }
}
