//! Attribute classification.
//!
//! Splits an element's attribute list into event handlers, two-way binds,
//! structural directives and plain attributes, producing an [`ElementInfo`].
//!
//! ## Key Invariants
//!
//! 1. Classification is a pure function of `(key, value)`; unknown keys are plain attributes.
//! 2. Every `(key, value)` pair is reported to the attribute observers, in source order,
//!    before it is classified. Observers never influence the result.
//! 3. At most one branch directive (`g-if`, `g-else-if`, `g-else`, `g-case`, `g-default`)
//!    survives per element; a second one is a compile error, not a silent override.

use std::collections::BTreeMap;

use crate::parse::Attribute;
use crate::validate::{CompilerError, ERR_DIRECTIVE_CONFLICT};

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVE VOCABULARY
// ═══════════════════════════════════════════════════════════════════════════════

pub const ON_PREFIX: &str = "g-on:";
pub const ON_PREFIX_SHORT: &str = "@";

pub const BIND_PREFIX: &str = "g-bind:";
pub const BIND_PREFIX_SHORT: &str = ":";

pub const DIR_REF: &str = "g-ref";
pub const DIR_HTML: &str = "g-html";
pub const DIR_FOR: &str = "g-for";
pub const DIR_IF: &str = "g-if";
pub const DIR_ELSE_IF: &str = "g-else-if";
pub const DIR_ELSE: &str = "g-else";
pub const DIR_SWITCH: &str = "g-switch";
pub const DIR_CASE: &str = "g-case";
pub const DIR_DEFAULT: &str = "g-default";
pub const DIR_POINTER: &str = "g-pointer";

/// Structural directive keys recognised by exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Ref,
    Html,
    For,
    If,
    ElseIf,
    Else,
    Switch,
    Case,
    Default,
    Pointer,
}

impl Directive {
    pub fn from_key(key: &str) -> Option<Directive> {
        let directive = match key {
            DIR_REF => Directive::Ref,
            DIR_HTML => Directive::Html,
            DIR_FOR => Directive::For,
            DIR_IF => Directive::If,
            DIR_ELSE_IF => Directive::ElseIf,
            DIR_ELSE => Directive::Else,
            DIR_SWITCH => Directive::Switch,
            DIR_CASE => Directive::Case,
            DIR_DEFAULT => Directive::Default,
            DIR_POINTER => Directive::Pointer,
            _ => return None,
        };
        Some(directive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeClass {
    Handler(String),
    Bind(String),
    Directive(Directive),
    Plain(String),
}

fn strip_either<'a>(key: &'a str, long: &str, short: &str) -> Option<&'a str> {
    key.strip_prefix(long).or_else(|| key.strip_prefix(short))
}

/// Classify one attribute key. Prefixes are stripped from handler and bind keys.
pub fn classify_attribute(key: &str) -> AttributeClass {
    if let Some(event) = strip_either(key, ON_PREFIX, ON_PREFIX_SHORT) {
        return AttributeClass::Handler(event.to_string());
    }
    if let Some(target) = strip_either(key, BIND_PREFIX, BIND_PREFIX_SHORT) {
        return AttributeClass::Bind(target.to_string());
    }
    match Directive::from_key(key) {
        Some(directive) => AttributeClass::Directive(directive),
        None => AttributeClass::Plain(key.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ITERATION CLAUSE
// ═══════════════════════════════════════════════════════════════════════════════

pub const DEFAULT_KEY_VAR: &str = "key";
pub const DEFAULT_VALUE_VAR: &str = "val";

fn with_range(rhs: &str) -> String {
    let rhs = rhs.trim();
    if rhs == "range" || rhs.starts_with("range ") {
        rhs.to_string()
    } else {
        format!("range {}", rhs)
    }
}

/// Normalize a `g-for` value so the emitted loop always binds a key and a value.
///
/// `items` and `range items` become `key, val := range items`; `item := items`
/// becomes `key, item := range items`. Three-clause loops and plain assignments
/// are left untouched.
pub fn normalize_for_clause(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains(';') {
        return raw.to_string();
    }

    match raw.split_once(":=") {
        Some((lhs, rhs)) => {
            let lhs = lhs.trim();
            let lhs = if lhs.contains(',') {
                lhs.to_string()
            } else {
                format!("{}, {}", DEFAULT_KEY_VAR, lhs)
            };
            format!("{} := {}", lhs, with_range(rhs))
        }
        None if raw.contains('=') => raw.to_string(),
        None => format!(
            "{}, {} := {}",
            DEFAULT_KEY_VAR,
            DEFAULT_VALUE_VAR,
            with_range(raw)
        ),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// The single control-flow role an element plays among its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    If(String),
    ElseIf(String),
    Else,
    Case(String),
    Default,
}

impl Branch {
    fn key(&self) -> &'static str {
        match self {
            Branch::If(_) => DIR_IF,
            Branch::ElseIf(_) => DIR_ELSE_IF,
            Branch::Else => DIR_ELSE,
            Branch::Case(_) => DIR_CASE,
            Branch::Default => DIR_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub handlers: BTreeMap<String, String>,
    pub binds: BTreeMap<String, String>,
    pub reference: Option<String>,
    pub raw_html: Option<String>,
    pub for_clause: Option<String>,
    pub branch: Option<Branch>,
    pub switch_target: Option<String>,
    pub is_pointer: bool,
    /// Set for comment nodes: no separator follows them.
    pub is_comment: bool,
}

impl ElementInfo {
    /// Descriptor for nodes produced by the special component tags.
    pub fn bare(tag: &str) -> Self {
        ElementInfo {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn comment() -> Self {
        ElementInfo {
            is_comment: true,
            ..Default::default()
        }
    }

    fn set_branch(&mut self, branch: Branch) -> Result<(), CompilerError> {
        if let Some(existing) = &self.branch {
            return Err(CompilerError::new(
                ERR_DIRECTIVE_CONFLICT,
                format!(
                    "`{}` cannot be combined with `{}` on <{}>",
                    branch.key(),
                    existing.key(),
                    self.tag
                ),
            ));
        }
        self.branch = Some(branch);
        Ok(())
    }

    /// Build the descriptor for `tag`, reporting each attribute to `observe` first.
    pub fn from_attributes<F>(
        tag: &str,
        attributes: &[Attribute],
        mut observe: F,
    ) -> Result<ElementInfo, CompilerError>
    where
        F: FnMut(&str, &str),
    {
        let mut info = ElementInfo::bare(tag);

        for Attribute { key, value } in attributes {
            observe(key, value);

            match classify_attribute(key) {
                AttributeClass::Handler(event) => {
                    info.handlers.insert(event, value.clone());
                }
                AttributeClass::Bind(target) => {
                    info.binds.insert(target, value.clone());
                }
                AttributeClass::Plain(key) => {
                    info.attrs.insert(key, value.clone());
                }
                AttributeClass::Directive(directive) => match directive {
                    Directive::Ref => info.reference = Some(value.clone()),
                    Directive::Html => info.raw_html = Some(value.clone()),
                    Directive::For => info.for_clause = Some(normalize_for_clause(value)),
                    Directive::Switch => info.switch_target = Some(value.clone()),
                    Directive::Pointer => info.is_pointer = true,
                    Directive::If => info.set_branch(Branch::If(value.clone()))?,
                    Directive::ElseIf => info.set_branch(Branch::ElseIf(value.clone()))?,
                    Directive::Else => info.set_branch(Branch::Else)?,
                    Directive::Case => info.set_branch(Branch::Case(value.clone()))?,
                    Directive::Default => info.set_branch(Branch::Default)?,
                },
            }
        }

        Ok(info)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
