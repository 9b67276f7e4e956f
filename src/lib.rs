//! Sequence handling for formish-style HTML forms.
//!
//! A form rendered by the server contains repeatable groups ("sequences")
//! whose items are addressed positionally: `person.0.name`, `person.1.name`.
//! [`SequenceEngine`] loads such markup into a small DOM, wires the add,
//! remove and drag affordances, and keeps every `id`, `name` and `for`
//! attribute numbered contiguously after each structural change.
//!
//! ```no_run
//! use formish_sequences::SequenceEngine;
//!
//! # fn main() -> formish_sequences::Result<()> {
//! let html = std::fs::read_to_string("form.html").unwrap_or_default();
//! let mut engine = SequenceEngine::from_html(&html)?;
//! engine.init()?;
//! engine.click("#form-people--field > a.adderlink")?;
//! println!("{}", engine.to_html());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

mod core_impl;
mod engine;
pub mod naming;
mod runtime_state;
mod selector;
pub mod sequence_data;

pub use engine::{ActivationEvent, EngineOptions, SequenceEngine, TemplateEncoding};
pub use sequence_data::SequenceData;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    MalformedPath {
        path: String,
        reason: String,
    },
    Template(String),
    SequenceData(String),
    Reorder(String),
    Dom(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl Error {
    pub(crate) fn malformed_path(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::MalformedPath { path, reason } => {
                write!(f, "malformed field path {path:?}: {reason}")
            }
            Self::Template(msg) => write!(f, "template error: {msg}"),
            Self::SequenceData(msg) => write!(f, "sequence data error: {msg}"),
            Self::Reorder(msg) => write!(f, "reorder error: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

/// Arena-backed document tree. Detached nodes stay in the arena; they are
/// simply unreachable from `root`.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

pub(crate) fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in value.chars().enumerate() {
        if count >= max_chars {
            out.push_str("...");
            return out;
        }
        out.push(ch);
    }
    out
}
