//! Tree lowering.
//!
//! Converts parsed markup into construction-call text, one node at a time.
//!
//! ## Key Invariants
//!
//! 1. **Drained input**: sibling lists are taken by value and consumed front-to-back.
//!    A node is never visited twice and never aliased with its former parent.
//! 2. **Source order**: output preserves sibling order exactly. A merged branch chain
//!    sits where its `g-if` member stood.
//! 3. **Chains**: `g-if` opens a chain, `g-else-if` extends it, `g-else` closes it.
//!    Any other sibling (or the end of the list) flushes an open chain.
//!    `g-else-if`/`g-else` without an open chain is a compile error.
//! 4. **Fail fast**: the first error aborts the whole block; no partial output.

use tracing::trace;

use crate::classify::{Branch, ElementInfo, DIR_CASE, DIR_DEFAULT, DIR_ELSE, DIR_ELSE_IF};
use crate::codegen::{self, Emitter, SEPARATOR};
use crate::component;
use crate::interpolate::interpolate;
use crate::parse::{describe_tag, ElementNode, MarkupNode};
use crate::validate::{CompilerError, ERR_ORPHAN_BRANCH, ERR_ORPHAN_CASE};

// ═══════════════════════════════════════════════════════════════════════════════
// LOWERING CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Hands out loop accumulator names. One generator covers one host file, so
/// names never repeat inside a file while output stays reproducible.
#[derive(Debug, Clone, Default)]
pub struct LoopIds {
    next: u64,
}

impl LoopIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        format!("loop{}", id)
    }
}

pub struct LoweringContext<'a> {
    pub emitter: Emitter<'a>,
    /// Called once per attribute, in traversal order.
    pub observe: &'a dyn Fn(&str, &str),
    pub loop_ids: &'a mut LoopIds,
}

/// Result of lowering one node. `info` is `None` for text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    pub code: String,
    pub info: Option<ElementInfo>,
}

impl Lowered {
    pub fn element(code: String, info: ElementInfo) -> Self {
        Lowered {
            code,
            info: Some(info),
        }
    }
}

/// Pre-filter for sibling lowering. Returning `Ok(None)` means the filter consumed the node.
pub type ChildFilter<'f, 'a> = dyn FnMut(MarkupNode, &mut LoweringContext<'a>) -> Result<Option<MarkupNode>, CompilerError>
    + 'f;

// ═══════════════════════════════════════════════════════════════════════════════
// NODE LOWERING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn lower_node(node: MarkupNode, ctx: &mut LoweringContext) -> Result<Lowered, CompilerError> {
    match node {
        MarkupNode::Comment { value } => Ok(Lowered {
            code: codegen::comment(&value),
            info: Some(ElementInfo::comment()),
        }),
        MarkupNode::Text { value } => Ok(Lowered {
            code: codegen::render_segments(&interpolate(&value)),
            info: None,
        }),
        MarkupNode::Element(el) => {
            let lowered = match el.tag.as_str() {
                component::TAG_COMPONENT => component::lower_external(el, ctx)?,
                component::TAG_SLOT => component::lower_slot(el, ctx)?,
                component::TAG_BODY => component::lower_body(el, ctx)?,
                component::TAG_SWITCH => component::lower_switch_tag(el, ctx)?,
                _ => lower_element(el, ctx)?,
            };
            Ok(wrap_loop(lowered, ctx))
        }
    }
}

/// Run the element once per iteration of its `g-for` clause, if it has one.
fn wrap_loop(lowered: Lowered, ctx: &mut LoweringContext) -> Lowered {
    let clause = match lowered.info.as_ref().and_then(|i| i.for_clause.as_deref()) {
        Some(clause) => clause,
        None => return lowered,
    };
    let acc = ctx.loop_ids.next_name();
    trace!(acc = %acc, "wrapping element in loop");
    let code = ctx.emitter.loop_form(clause, &lowered.code, &acc);
    Lowered {
        code,
        info: lowered.info,
    }
}

fn lower_element(el: ElementNode, ctx: &mut LoweringContext) -> Result<Lowered, CompilerError> {
    let ElementNode {
        tag,
        attributes,
        children,
    } = el;
    let with_context = |e: CompilerError| e.with_context(describe_tag(&tag, &attributes));

    let observe = ctx.observe;
    let info = ElementInfo::from_attributes(&tag, &attributes, |k, v| observe(k, v))
        .map_err(with_context)?;

    let children_out = match &info.switch_target {
        Some(target) => {
            let switch = component::lower_switch(target, children, ctx).map_err(with_context)?;
            format!("{}{}", switch, SEPARATOR)
        }
        None => lower_children(children, ctx, None).map_err(with_context)?,
    };

    let code = ctx.emitter.element(&info, &children_out);
    Ok(Lowered::element(code, info))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIBLING LOWERING
// ═══════════════════════════════════════════════════════════════════════════════

/// An `if`/`else if`/`else` run being merged into one expression.
#[derive(Debug, Default)]
struct BranchChain {
    arms: Option<String>,
}

impl BranchChain {
    fn open(&mut self, arm: String) {
        self.arms = Some(arm);
    }

    /// Append an arm to the open chain. Returns false when no chain is open.
    fn extend(&mut self, arm: &str) -> bool {
        match &mut self.arms {
            Some(arms) => {
                arms.push_str(arm);
                true
            }
            None => false,
        }
    }

    fn flush_into(&mut self, out: &mut Sequence, emitter: &Emitter) {
        if let Some(arms) = self.arms.take() {
            out.push_code(&emitter.branch_chain(&arms));
            out.push_separator();
        }
    }
}

/// Merged sibling output. Remembers where the separator after the last
/// non-comment sibling sits, so a block can drop it even when comments follow.
#[derive(Debug, Default)]
struct Sequence {
    out: String,
    last_separator: Option<usize>,
}

impl Sequence {
    fn push_code(&mut self, code: &str) {
        self.out.push_str(code);
    }

    fn push_separator(&mut self) {
        self.last_separator = Some(self.out.len());
        self.out.push(SEPARATOR);
    }

    /// Record a separator that arrived as the tail of an emitted fragment.
    fn mark_trailing_separator(&mut self) {
        let end = self.out.trim_end().len();
        self.last_separator = end.checked_sub(SEPARATOR.len_utf8());
    }
}

fn orphan(code: &str, info: &ElementInfo, directive: &str, reason: &str) -> CompilerError {
    CompilerError::new(code, format!("invalid {}: {}", directive, reason))
        .with_context(format!("<{} {}>", info.tag, directive))
}

fn lower_sequence<'a>(
    nodes: Vec<MarkupNode>,
    ctx: &mut LoweringContext<'a>,
    mut filter: Option<&mut ChildFilter<'_, 'a>>,
) -> Result<Sequence, CompilerError> {
    let mut chain = BranchChain::default();
    let mut out = Sequence::default();

    for node in nodes {
        let node = match filter.as_deref_mut() {
            Some(f) => match f(node, ctx)? {
                Some(node) => node,
                None => continue,
            },
            None => node,
        };

        let Lowered { code, info } = lower_node(node, ctx)?;
        if code.is_empty() {
            continue;
        }

        let branch = info.as_ref().and_then(|i| i.branch.as_ref().map(|b| (i, b)));
        match branch {
            Some((_, Branch::If(condition))) => {
                chain.flush_into(&mut out, &ctx.emitter);
                chain.open(ctx.emitter.if_arm(condition, &code));
            }
            Some((info, Branch::ElseIf(condition))) => {
                if !chain.extend(&ctx.emitter.else_if_arm(condition, &code)) {
                    return Err(orphan(ERR_ORPHAN_BRANCH, info, DIR_ELSE_IF, "no g-if before"));
                }
            }
            Some((info, Branch::Else)) => {
                if !chain.extend(&ctx.emitter.else_arm(&code)) {
                    return Err(orphan(ERR_ORPHAN_BRANCH, info, DIR_ELSE, "no g-if before"));
                }
                chain.flush_into(&mut out, &ctx.emitter);
            }
            Some((info, Branch::Case(_))) => {
                return Err(orphan(ERR_ORPHAN_CASE, info, DIR_CASE, "not inside a switch"));
            }
            Some((info, Branch::Default)) => {
                return Err(orphan(ERR_ORPHAN_CASE, info, DIR_DEFAULT, "not inside a switch"));
            }
            None => {
                chain.flush_into(&mut out, &ctx.emitter);
                if info.as_ref().map_or(false, |i| i.is_comment) {
                    out.push_code(&code);
                } else if codegen::ends_with_separator(&code) {
                    out.push_code(&code);
                    out.mark_trailing_separator();
                } else {
                    out.push_code(&code);
                    out.push_separator();
                }
            }
        }
    }

    chain.flush_into(&mut out, &ctx.emitter);
    Ok(out)
}

/// Lower an ordered sibling list into one merged fragment.
///
/// Every emitted sibling except comments is followed by a separator.
pub fn lower_children<'a>(
    nodes: Vec<MarkupNode>,
    ctx: &mut LoweringContext<'a>,
    filter: Option<&mut ChildFilter<'_, 'a>>,
) -> Result<String, CompilerError> {
    Ok(lower_sequence(nodes, ctx, filter)?.out)
}

/// Lower the top-level siblings of a block. The separator after the last
/// non-comment sibling is dropped, so the result is a bare argument list.
pub fn lower_block(nodes: Vec<MarkupNode>, ctx: &mut LoweringContext) -> Result<String, CompilerError> {
    let Sequence {
        mut out,
        last_separator,
    } = lower_sequence(nodes, ctx, None)?;
    if let Some(index) = last_separator {
        out.remove(index);
    }
    Ok(out)
}
