//! Parse Module
//!
//! Turns the raw text of a template block into an owned tree of [`MarkupNode`]s.
//! html5ever does the actual HTML parsing in fragment mode (as if the block
//! were the content of a `<div>`); this module only converts its `RcDom` into
//! plain owned values so the lowering passes can drain children front-to-back
//! without aliasing the parser's shared handles.

use html5ever::{local_name, namespace_url, ns, parse_fragment, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::{Deserialize, Serialize};
use tendril::TendrilSink;
use tracing::debug;

use crate::validate::{CompilerError, ERR_PARSE};

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    /// Source order is preserved.
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        ElementNode {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Value of the first attribute named `key`, treating an empty value as absent.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Short rendering of the opening tag, used as error context.
    pub fn describe(&self) -> String {
        describe_tag(&self.tag, &self.attributes)
    }
}

pub fn describe_tag(tag: &str, attributes: &[Attribute]) -> String {
    let mut out = format!("<{}", tag);
    for attr in attributes {
        if attr.value.is_empty() {
            out.push_str(&format!(" {}", attr.key));
        } else {
            out.push_str(&format!(" {}=\"{}\"", attr.key, attr.value));
        }
    }
    out.push('>');
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MarkupNode {
    Element(ElementNode),
    Text { value: String },
    Comment { value: String },
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        MarkupNode::Text {
            value: value.into(),
        }
    }

    pub fn comment(value: impl Into<String>) -> Self {
        MarkupNode::Comment {
            value: value.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, MarkupNode::Text { value } if value.trim().is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOM CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

fn convert_children(handle: &Handle) -> Vec<MarkupNode> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(MarkupNode::text(contents.borrow().to_string())),

        NodeData::Comment { contents } => Some(MarkupNode::comment(contents.to_string())),

        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|a| Attribute::new(a.name.local.to_string(), a.value.to_string()))
                .collect();

            // html5ever keeps <template> content in a separate fragment.
            let children = match template_contents.borrow().as_ref() {
                Some(contents) => convert_children(contents),
                None => convert_children(handle),
            };

            Some(MarkupNode::Element(ElementNode {
                tag: name.local.to_string(),
                attributes,
                children,
            }))
        }

        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a template block into its top-level sibling nodes.
pub fn parse_markup(source: &str) -> Result<Vec<MarkupNode>, CompilerError> {
    let context = QualName::new(None, ns!(html), local_name!("div"));

    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![])
        .from_utf8()
        .read_from(&mut source.as_bytes())
        .map_err(|e| CompilerError::new(ERR_PARSE, format!("failed to parse markup: {}", e)))?;

    for err in dom.errors.iter() {
        debug!(error = %err, "markup parser diagnostic");
    }

    // Fragment parsing yields Document > html > <fragment nodes>.
    let document = dom.document.children.borrow();
    let root = document
        .first()
        .ok_or_else(|| CompilerError::new(ERR_PARSE, "parser produced no fragment root"))?;

    Ok(convert_children(root))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
