use super::*;
use crate::engine::EngineOptions;

mod affordances;
mod insert;
mod remove;
mod renumber;
mod reorder;
mod template;

pub(crate) use affordances::sync_affordances;
pub(crate) use insert::{add_item, add_items};
pub(crate) use remove::remove_item;
pub(crate) use renumber::renumber_all_forms;
pub(crate) use reorder::move_item;
pub(crate) use template::decode_template;

pub(crate) const FIELD_CLASS: &str = "field";
pub(crate) const GROUP_CLASS: &str = "group";
pub(crate) const SEQUENCE_CLASS: &str = "type-sequence";
pub(crate) const SEQUENCE_WIDGET_CLASS: &str = "widget-sequencedefault";
pub(crate) const CONTAINER_CLASS: &str = "type-container";
pub(crate) const ADDER_CLASS: &str = "adder";
pub(crate) const ADDER_LINK_CLASS: &str = "adderlink";
pub(crate) const REMOVE_CLASS: &str = "remove";
pub(crate) const SEQDELETE_CLASS: &str = "seqdelete";
pub(crate) const SORTABLE_CLASS: &str = "sortable";
pub(crate) const SEQGRAB_CLASS: &str = "seqgrab";
pub(crate) const HANDLE_CLASS: &str = "handle";
pub(crate) const SEQUENCE_DATA_CLASS: &str = "formish-sequencedata";

/// Structural flavour of a sequence's items. Container items carry nested
/// field wrappers, so their descendant paths keep one more trailing segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Container,
    Plain,
}

impl ItemKind {
    pub(crate) fn of_sequence(dom: &Dom, sequence: NodeId) -> Self {
        if dom.has_class(sequence, CONTAINER_CLASS) {
            Self::Container
        } else {
            Self::Plain
        }
    }

    pub(crate) fn strip_count(self) -> usize {
        match self {
            Self::Container => 0,
            Self::Plain => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RenumberSummary {
    pub(crate) sequences: usize,
    pub(crate) items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InsertSummary {
    pub(crate) adder_name: String,
    pub(crate) indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoveSummary {
    pub(crate) removed_id: String,
    pub(crate) renumbered: RenumberSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReorderSummary {
    pub(crate) moved_id: String,
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) renumbered: RenumberSummary,
}

/// Items render as `.field` wrappers, or as `fieldset.group` for structures.
pub(crate) fn is_item(dom: &Dom, node: NodeId) -> bool {
    dom.has_class(node, FIELD_CLASS) || dom.has_class(node, GROUP_CLASS)
}

pub(crate) fn closest_item(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if is_item(dom, current) {
            return Some(current);
        }
        cursor = dom.parent(current);
    }
    None
}

pub(crate) fn is_sequence(dom: &Dom, node: NodeId) -> bool {
    dom.has_class(node, SEQUENCE_CLASS) && dom.has_class(node, SEQUENCE_WIDGET_CLASS)
}

fn is_tagged(dom: &Dom, node: NodeId, tag: &str, class_name: &str) -> bool {
    dom.tag_name(node)
        .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        && dom.has_class(node, class_name)
}

pub(crate) fn is_adder_link(dom: &Dom, node: NodeId) -> bool {
    is_tagged(dom, node, "a", ADDER_LINK_CLASS)
}

pub(crate) fn is_remove_button(dom: &Dom, node: NodeId) -> bool {
    is_tagged(dom, node, "span", REMOVE_CLASS)
}

pub(crate) fn is_drag_handle(dom: &Dom, node: NodeId) -> bool {
    is_tagged(dom, node, "div", HANDLE_CLASS)
}

/// Form id used as the naming prefix, empty when the form has none.
pub(crate) fn form_id_for(dom: &Dom, node: NodeId) -> String {
    dom.find_ancestor_by_tag(node, "form")
        .and_then(|form| dom.attr(form, "id"))
        .unwrap_or_default()
        .to_string()
}
