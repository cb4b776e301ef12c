//! Component-oriented tags.
//!
//! - `<e run="Card()">` calls an external component, passing its body, slots,
//!   templates and extra attributes as one configuration argument.
//! - `<g-slot name="x">` reads a slot handed to the current component.
//! - `<g-body>` renders the current component's own body.
//! - `<g-switch run="expr">` (or `g-switch="expr"` on any element) picks the
//!   first child whose `g-case` matches, falling back to `g-default`.

use std::collections::BTreeMap;

use tracing::trace;

use crate::classify::{classify_attribute, AttributeClass, Branch, Directive, ElementInfo};
use crate::codegen::EMPTY_SLOT;
use crate::parse::{ElementNode, MarkupNode};
use crate::transform::{lower_children, lower_node, ChildFilter, Lowered, LoweringContext};
use crate::validate::{
    CompilerError, ERR_COMPONENT_CALL, ERR_DUPLICATE_KEY, ERR_MISSING_ATTRIBUTE, ERR_SWITCH_CHILD,
    ERR_TAG_DIRECTIVE,
};

pub const TAG_COMPONENT: &str = "e";
pub const TAG_SLOT: &str = "g-slot";
pub const TAG_BODY: &str = "g-body";
pub const TAG_SWITCH: &str = "g-switch";
pub const TAG_TEMPLATE: &str = "template";

pub const ATTR_RUN: &str = "run";
pub const ATTR_NAME: &str = "name";
pub const ATTR_TYPES: &str = "types";
pub const ATTR_SLOT: &str = "slot";

fn require_attr<'e>(el: &'e ElementNode, key: &str) -> Result<&'e str, CompilerError> {
    el.get_attr(key).ok_or_else(|| {
        CompilerError::new(
            ERR_MISSING_ATTRIBUTE,
            format!("<{}> requires a `{}` attribute", el.tag, key),
        )
        .with_context(el.describe())
    })
}

fn insert_unique(
    map: &mut BTreeMap<String, String>,
    kind: &str,
    name: String,
    code: String,
) -> Result<(), CompilerError> {
    if map.contains_key(&name) {
        return Err(CompilerError::new(
            ERR_DUPLICATE_KEY,
            format!("{} `{}` is defined twice", kind, name),
        ));
    }
    map.insert(name, code);
    Ok(())
}

/// Classify the attributes of a component-oriented tag, reporting each one to the
/// observers. Plain attributes always pass; control-flow directives (`g-if`
/// family, `g-case`, `g-default`, `g-for`) only when `control_flow` is set.
fn classify_tag(
    el: &ElementNode,
    ctx: &LoweringContext,
    control_flow: bool,
) -> Result<ElementInfo, CompilerError> {
    let observe = ctx.observe;
    let info = ElementInfo::from_attributes(&el.tag, &el.attributes, |k, v| observe(k, v))
        .map_err(|e| e.with_context(el.describe()))?;

    for attr in &el.attributes {
        let accepted = match classify_attribute(&attr.key) {
            AttributeClass::Plain(_) => true,
            AttributeClass::Directive(directive) => {
                control_flow
                    && matches!(
                        directive,
                        Directive::If
                            | Directive::ElseIf
                            | Directive::Else
                            | Directive::Case
                            | Directive::Default
                            | Directive::For
                    )
            }
            AttributeClass::Handler(_) | AttributeClass::Bind(_) => false,
        };
        if !accepted {
            return Err(CompilerError::new(
                ERR_TAG_DIRECTIVE,
                format!("`{}` is not supported on <{}>", attr.key, el.tag),
            )
            .with_context(el.describe()));
        }
    }

    Ok(info)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTERNAL COMPONENT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn lower_external<'a>(
    el: ElementNode,
    ctx: &mut LoweringContext<'a>,
) -> Result<Lowered, CompilerError> {
    let info = classify_tag(&el, ctx, true)?;
    let run = require_attr(&el, ATTR_RUN)?.trim().to_string();
    if !run.ends_with(')') {
        return Err(CompilerError::new(
            ERR_COMPONENT_CALL,
            format!("`{}` is not a call expression", run),
        )
        .with_context(el.describe()));
    }
    let context = el.describe();

    let children = el.children;

    let mut slots = BTreeMap::new();
    let mut templates = BTreeMap::new();

    let extract: &mut ChildFilter<'_, 'a> = &mut |child, ctx| {
        let el = match child {
            MarkupNode::Element(el) => el,
            other => return Ok(Some(other)),
        };

        if el.tag == TAG_TEMPLATE {
            classify_tag(&el, ctx, false)?;
            let name = require_attr(&el, ATTR_NAME)?.to_string();
            let preamble = el.get_attr(ATTR_TYPES).unwrap_or_default().to_string();
            let body = lower_children(el.children, ctx, None)?;
            let closure = ctx.emitter.template_closure(&preamble, &body);
            insert_unique(&mut templates, "template", name, closure)?;
            return Ok(None);
        }

        if let Some(slot) = el.get_attr(ATTR_SLOT).map(str::to_string) {
            let context = el.describe();
            let Lowered { code, info } = lower_node(MarkupNode::Element(el), ctx)?;
            if info.map_or(false, |i| i.branch.is_some()) {
                return Err(CompilerError::new(
                    ERR_TAG_DIRECTIVE,
                    format!("content of slot `{}` cannot be a branch", slot),
                )
                .with_context(context));
            }
            let code = if code.is_empty() {
                EMPTY_SLOT.to_string()
            } else {
                code
            };
            insert_unique(&mut slots, "slot", slot, code)?;
            return Ok(None);
        }

        Ok(Some(MarkupNode::Element(el)))
    };

    let body = lower_children(children, ctx, Some(extract))
        .map_err(|e| e.with_context(context.clone()))?;

    let mut attrs = info.attrs.clone();
    attrs.remove(ATTR_RUN);

    trace!(
        run = %run,
        slots = slots.len(),
        templates = templates.len(),
        "lowered external component"
    );

    let code = match ctx
        .emitter
        .external_config(&body, &slots, &templates, &attrs)
    {
        Some(config) => ctx.emitter.append_call_argument(&run, &config),
        None => run,
    };

    Ok(Lowered::element(code, info))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SLOT & BODY
// ═══════════════════════════════════════════════════════════════════════════════

pub fn lower_slot(el: ElementNode, ctx: &mut LoweringContext) -> Result<Lowered, CompilerError> {
    let info = classify_tag(&el, ctx, true)?;
    let name = require_attr(&el, ATTR_NAME)?;
    Ok(Lowered::element(ctx.emitter.slot_lookup(name), info))
}

pub fn lower_body(el: ElementNode, ctx: &mut LoweringContext) -> Result<Lowered, CompilerError> {
    let info = classify_tag(&el, ctx, true)?;
    Ok(Lowered::element(ctx.emitter.body_passthrough(), info))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SWITCH
// ═══════════════════════════════════════════════════════════════════════════════

pub fn lower_switch_tag(el: ElementNode, ctx: &mut LoweringContext) -> Result<Lowered, CompilerError> {
    let info = classify_tag(&el, ctx, true)?;
    let target = require_attr(&el, ATTR_RUN)?.to_string();
    let context = el.describe();
    let code = lower_switch(&target, el.children, ctx).map_err(|e| e.with_context(context))?;
    Ok(Lowered::element(code, info))
}

/// Lower switch children into one self-evaluating switch over `target`.
pub fn lower_switch<'a>(
    target: &str,
    children: Vec<MarkupNode>,
    ctx: &mut LoweringContext<'a>,
) -> Result<String, CompilerError> {
    let mut arms = String::new();
    let mut has_default = false;

    let collect: &mut ChildFilter<'_, 'a> = &mut |child, ctx| {
        let context = match &child {
            MarkupNode::Comment { .. } => return Ok(None),
            MarkupNode::Text { .. } if child.is_blank() => return Ok(None),
            MarkupNode::Text { value } => {
                return Err(CompilerError::new(
                    ERR_SWITCH_CHILD,
                    format!("text `{}` cannot be a switch arm", value.trim()),
                ))
            }
            MarkupNode::Element(el) => el.describe(),
        };

        let Lowered { code, info } = lower_node(child, ctx)?;
        match info.and_then(|i| i.branch) {
            Some(Branch::Case(value)) => arms.push_str(&ctx.emitter.case_arm(&value, &code)),
            Some(Branch::Default) => {
                if has_default {
                    return Err(CompilerError::new(
                        ERR_DUPLICATE_KEY,
                        "switch has more than one g-default arm",
                    )
                    .with_context(context));
                }
                has_default = true;
                arms.push_str(&ctx.emitter.default_arm(&code));
            }
            _ => {
                return Err(CompilerError::new(
                    ERR_SWITCH_CHILD,
                    "switch child has neither g-case nor g-default",
                )
                .with_context(context))
            }
        }
        Ok(None)
    };

    lower_children(children, ctx, Some(collect))?;
    Ok(ctx.emitter.switch_expr(target, &arms))
}
