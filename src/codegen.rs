//! Output emitter.
//!
//! Fixed textual templates for every construct the lowering passes produce.
//! Nothing in here makes decisions about the markup; it only formats what it
//! is handed, using the runtime package name from [`CompileOptions`].
//!
//! [`CompileOptions`]: crate::config::CompileOptions

use std::collections::BTreeMap;

use crate::classify::ElementInfo;
use crate::interpolate::Segment;

/// Separator placed after every emitted sibling except comments.
pub const SEPARATOR: char = ',';

/// Marker used for a slot whose content lowers to nothing.
pub const EMPTY_SLOT: &str = "``";

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Interpreted (double-quoted) string literal.
pub fn quote_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Raw (backtick) string literal, falling back to [`quote_str`] when the text has a backtick.
pub fn quote_text(value: &str) -> String {
    if value.contains('`') {
        quote_str(value)
    } else {
        format!("`{}`", value)
    }
}

pub fn render_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => quote_text(text),
            Segment::Expr(expr) => expr.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn comment(text: &str) -> String {
    format!("/*{}*/", text.replace("*/", "* /"))
}

/// True when `fragment` already ends with a separator once trailing whitespace is ignored.
pub fn ends_with_separator(fragment: &str) -> bool {
    fragment.trim_end().ends_with(SEPARATOR)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    rt: &'a str,
}

impl<'a> Emitter<'a> {
    pub fn new(runtime: &'a str) -> Self {
        Emitter { rt: runtime }
    }

    /// Zero-argument closure returning `ret`.
    pub fn closure(&self, ret: &str, body: &str) -> String {
        format!("func() {} {{{}}}", ret, body)
    }

    /// Closure invoked on the spot.
    pub fn self_evaluating(&self, ret: &str, body: &str) -> String {
        format!("{}()", self.closure(ret, body))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Elements
    // ───────────────────────────────────────────────────────────────────────────

    /// `rt.NE(&rt.E{...}, children...)`. `children` is the merged sibling output.
    pub fn element(&self, info: &ElementInfo, children: &str) -> String {
        format!("{}.NE({}{})", self.rt, self.element_body(info), children)
    }

    fn element_body(&self, info: &ElementInfo) -> String {
        format!(
            "&{}.E{{Tag:{}, {}{}{}{}{}}},",
            self.rt,
            quote_str(&info.tag),
            self.handlers(&info.handlers),
            self.attrs(&info.attrs, &info.binds),
            self.raw_html(info.raw_html.as_deref()),
            self.reference(info.reference.as_deref()),
            if info.is_pointer { "IsPointer: true," } else { "" },
        )
    }

    fn handlers(&self, handlers: &BTreeMap<String, String>) -> String {
        if handlers.is_empty() {
            return String::new();
        }
        let entries: String = handlers
            .iter()
            .map(|(event, body)| {
                format!("{}: func(e {}.Event) {{{}}},", quote_str(event), self.rt, body)
            })
            .collect();
        format!("Handlers: map[string]{}.Handler{{{}}},", self.rt, entries)
    }

    /// Plain attributes and binds share one map, rebuilt on every call of the closure.
    fn attrs(&self, attrs: &BTreeMap<String, String>, binds: &BTreeMap<String, String>) -> String {
        if attrs.is_empty() && binds.is_empty() {
            return String::new();
        }
        let mut entries = String::new();
        for (key, value) in attrs {
            entries.push_str(&format!("{}: {},", quote_str(key), quote_str(value)));
        }
        for (key, expr) in binds {
            entries.push_str(&format!("{}: {},", quote_str(key), expr));
        }
        let map_type = format!("{}.Map", self.rt);
        format!(
            "Attrs: {},",
            self.closure(&map_type, &format!(" return {}{{{}}} ", map_type, entries))
        )
    }

    fn raw_html(&self, render: Option<&str>) -> String {
        match render {
            Some(expr) => format!(
                "HTML: {}.HTMLDirective{{Render: {},}},",
                self.rt,
                self.closure("string", &format!(" return {} ", expr))
            ),
            None => String::new(),
        }
    }

    fn reference(&self, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("RefName: {},", quote_str(name)),
            None => String::new(),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Control flow
    // ───────────────────────────────────────────────────────────────────────────

    /// Run `element` once per iteration of `clause`, collecting results into `acc`.
    pub fn loop_form(&self, clause: &str, element: &str, acc: &str) -> String {
        self.self_evaluating(
            "[]interface{}",
            &format!(
                "var {acc} []interface{{}}; for {clause} {{ {acc} = append({acc}, {element}) }}; return {acc}",
                acc = acc,
                clause = clause,
                element = element,
            ),
        )
    }

    pub fn if_arm(&self, condition: &str, fragment: &str) -> String {
        format!("if {} {{\n\treturn {}\n}}", condition, fragment)
    }

    pub fn else_if_arm(&self, condition: &str, fragment: &str) -> String {
        format!(" else if {} {{\n\treturn {}\n}}", condition, fragment)
    }

    pub fn else_arm(&self, fragment: &str) -> String {
        format!(" else {{\n\treturn {}\n}}", fragment)
    }

    /// Wrap accumulated `if`/`else if`/`else` arms; yields nil when no arm matches.
    pub fn branch_chain(&self, arms: &str) -> String {
        self.self_evaluating("interface{}", &format!("\n{}\nreturn nil\n", arms))
    }

    pub fn case_arm(&self, value: &str, fragment: &str) -> String {
        format!("\tcase {}:\n\t\treturn {}\n", value, fragment)
    }

    pub fn default_arm(&self, fragment: &str) -> String {
        format!("\tdefault:\n\t\treturn {}\n", fragment)
    }

    pub fn switch_expr(&self, target: &str, arms: &str) -> String {
        self.self_evaluating(
            "interface{}",
            &format!("\n\tswitch {} {{\n{}\t}}\n\treturn nil\n", target, arms),
        )
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Components
    // ───────────────────────────────────────────────────────────────────────────

    pub fn slot_lookup(&self, name: &str) -> String {
        format!("e.Slots[{}]", quote_str(name))
    }

    pub fn body_passthrough(&self) -> String {
        format!("{}.NE(&{}.E{{}}, e.Compile)", self.rt, self.rt)
    }

    pub fn template_closure(&self, preamble: &str, body: &str) -> String {
        format!(
            "func(values ...interface{{}}) []interface{{}} {{\n{}\nreturn []interface{{}}{{{}}} }}",
            preamble, body
        )
    }

    /// The augmented-configuration argument of an external component call.
    /// Returns `None` when every part is empty.
    pub fn external_config(
        &self,
        body: &str,
        slots: &BTreeMap<String, String>,
        templates: &BTreeMap<String, String>,
        attrs: &BTreeMap<String, String>,
    ) -> Option<String> {
        let mut parts = String::new();
        if !body.is_empty() {
            parts.push_str(&format!("Body: []interface{{}}{{{}}},", body));
        }
        if !slots.is_empty() {
            let entries: String = slots
                .iter()
                .map(|(name, frag)| format!("{}: {},", quote_str(name), frag))
                .collect();
            parts.push_str(&format!("Slots: map[string]interface{{}}{{{}}},", entries));
        }
        if !templates.is_empty() {
            let entries: String = templates
                .iter()
                .map(|(name, closure)| format!("{}: {},", quote_str(name), closure))
                .collect();
            parts.push_str(&format!(
                "Templates: map[string]{}.Template{{{}}},",
                self.rt, entries
            ));
        }
        if !attrs.is_empty() {
            let entries: String = attrs
                .iter()
                .map(|(k, v)| format!("{}: {},", quote_str(k), quote_str(v)))
                .collect();
            parts.push_str(&format!("Attrs: map[string]string{{{}}},", entries));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("{}.External{{{}}}", self.rt, parts))
        }
    }

    /// Append `config` as the last argument of the call expression `call`.
    /// The caller guarantees `call` ends with `)`.
    pub fn append_call_argument(&self, call: &str, config: &str) -> String {
        let head = &call[..call.len() - 1];
        if head.trim_end().ends_with('(') {
            format!("{}{})", head, config)
        } else {
            format!("{}, {})", head, config)
        }
    }

    /// `htmlF` blocks: a function returning the element.
    pub fn element_func(&self, body: &str) -> String {
        format!("func() *{}.E {{return {}}}", self.rt, body)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ElementInfo;

    #[test]
    fn test_quote_str_escapes() {
        assert_eq!(quote_str(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(quote_str("x\ny"), r#""x\ny""#);
    }

    #[test]
    fn test_quote_text_prefers_raw_strings() {
        assert_eq!(quote_text("hello"), "`hello`");
        assert_eq!(quote_text("a `b`"), "\"a `b`\"");
    }

    #[test]
    fn test_render_segments() {
        let segments = vec![
            Segment::Literal("Hi".into()),
            Segment::Expr("c.Name".into()),
            Segment::Literal("!".into()),
        ];
        assert_eq!(render_segments(&segments), "`Hi`, c.Name, `!`");
    }

    #[test]
    fn test_comment_cannot_close_early() {
        assert_eq!(comment(" a */ b "), "/* a * / b */");
    }

    #[test]
    fn test_bare_element() {
        let em = Emitter::new("gas");
        let info = ElementInfo::bare("div");
        assert_eq!(em.element(&info, ""), r#"gas.NE(&gas.E{Tag:"div", },)"#);
    }

    #[test]
    fn test_element_with_everything() {
        let em = Emitter::new("gas");
        let mut info = ElementInfo::bare("input");
        info.handlers.insert("input".into(), "c.Sync(e)".into());
        info.attrs.insert("class".into(), "field".into());
        info.binds.insert("value".into(), "c.Value".into());
        info.raw_html = Some("c.HTML()".into());
        info.reference = Some("box".into());
        info.is_pointer = true;

        let out = em.element(&info, "`x`,");
        assert_eq!(
            out,
            concat!(
                r#"gas.NE(&gas.E{Tag:"input", "#,
                r#"Handlers: map[string]gas.Handler{"input": func(e gas.Event) {c.Sync(e)},},"#,
                r#"Attrs: func() gas.Map { return gas.Map{"class": "field","value": c.Value,} },"#,
                r#"HTML: gas.HTMLDirective{Render: func() string { return c.HTML() },},"#,
                r#"RefName: "box","#,
                r#"IsPointer: true,"#,
                r#"},`x`,)"#
            )
        );
    }

    #[test]
    fn test_runtime_name_is_configurable() {
        let em = Emitter::new("ui");
        assert_eq!(
            em.element(&ElementInfo::bare("p"), ""),
            r#"ui.NE(&ui.E{Tag:"p", },)"#
        );
        assert_eq!(em.body_passthrough(), "ui.NE(&ui.E{}, e.Compile)");
    }

    #[test]
    fn test_loop_form() {
        let em = Emitter::new("gas");
        assert_eq!(
            em.loop_form("key, val := range xs", "X", "loop0"),
            "func() []interface{} {var loop0 []interface{}; for key, val := range xs { loop0 = append(loop0, X) }; return loop0}()"
        );
    }

    #[test]
    fn test_branch_chain() {
        let em = Emitter::new("gas");
        let arms = format!(
            "{}{}{}",
            em.if_arm("a", "A"),
            em.else_if_arm("b", "B"),
            em.else_arm("C")
        );
        assert_eq!(
            em.branch_chain(&arms),
            "func() interface{} {\nif a {\n\treturn A\n} else if b {\n\treturn B\n} else {\n\treturn C\n}\nreturn nil\n}()"
        );
    }

    #[test]
    fn test_switch_expr() {
        let em = Emitter::new("gas");
        let arms = format!("{}{}", em.case_arm("1", "A"), em.default_arm("B"));
        assert_eq!(
            em.switch_expr("c.Tab", &arms),
            "func() interface{} {\n\tswitch c.Tab {\n\tcase 1:\n\t\treturn A\n\tdefault:\n\t\treturn B\n\t}\n\treturn nil\n}()"
        );
    }

    #[test]
    fn test_append_call_argument() {
        let em = Emitter::new("gas");
        assert_eq!(em.append_call_argument("Card()", "CFG"), "Card(CFG)");
        assert_eq!(em.append_call_argument("Card(a, b)", "CFG"), "Card(a, b, CFG)");
    }

    #[test]
    fn test_external_config_skips_empty_parts() {
        let em = Emitter::new("gas");
        let empty = BTreeMap::new();
        assert_eq!(em.external_config("", &empty, &empty, &empty), None);

        let mut slots = BTreeMap::new();
        slots.insert("header".to_string(), "`Title`".to_string());
        assert_eq!(
            em.external_config("", &slots, &empty, &empty).unwrap(),
            r#"gas.External{Slots: map[string]interface{}{"header": `Title`,},}"#
        );
    }
}
