use super::*;
use crate::naming::{Divider, FieldPath, SequencePrefix, splice_index};

/// Renumbers every form in the document. A document without a `<form>` is
/// treated as one id-less form.
pub(crate) fn renumber_all_forms(dom: &mut Dom) -> Result<RenumberSummary> {
    let forms = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| dom.tag_name(*node) == Some("form"))
        .collect::<Vec<_>>();
    if forms.is_empty() {
        let root = dom.root;
        return renumber_form(dom, root);
    }

    let mut total = RenumberSummary::default();
    for form in forms {
        let summary = renumber_form(dom, form)?;
        total.sequences += summary.sequences;
        total.items += summary.items;
    }
    Ok(total)
}

pub(crate) fn renumber_form(dom: &mut Dom, form: NodeId) -> Result<RenumberSummary> {
    let has_form_prefix = dom.attr(form, "id").is_some_and(|id| !id.is_empty());
    let sequences = dom
        .descendant_elements(form)
        .into_iter()
        .filter(|node| is_sequence(dom, *node))
        .collect::<Vec<_>>();

    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut summary = RenumberSummary::default();
    for sequence in sequences {
        // Read live: an enclosing sequence may have rewritten this id.
        let sequence_id = dom
            .attr(sequence, "id")
            .ok_or_else(|| Error::malformed_path("", "sequence element has no id"))?
            .to_string();
        let prefix = SequencePrefix::from_field_id(&sequence_id)?;
        let kind = ItemKind::of_sequence(dom, sequence);

        let items = direct_items(dom, sequence, &prefix);
        for item in items {
            let counter = counters.entry(prefix.as_str().to_string()).or_insert(0);
            let index = *counter;
            *counter += 1;
            renumber_item(dom, item, &prefix, index, kind, has_form_prefix)?;
            summary.items += 1;
        }
        summary.sequences += 1;
    }
    Ok(summary)
}

/// Items of `sequence` in document order: descendant field wrappers whose id
/// sits exactly one level below the sequence id.
pub(crate) fn direct_items(dom: &Dom, sequence: NodeId, prefix: &SequencePrefix) -> Vec<NodeId> {
    dom.descendant_elements(sequence)
        .into_iter()
        .filter(|node| is_item(dom, *node))
        .filter(|node| {
            dom.attr(*node, "id")
                .is_some_and(|id| prefix.is_direct_item_id(id))
        })
        .collect()
}

fn renumber_item(
    dom: &mut Dom,
    item: NodeId,
    prefix: &SequencePrefix,
    index: usize,
    kind: ItemKind,
    has_form_prefix: bool,
) -> Result<()> {
    let old_id = dom.attr(item, "id").unwrap_or_default().to_string();
    let old_index = prefix.item_index_segment(&old_id)?.to_string();
    dom.set_attr(item, "id", &prefix.item_id(index))?;

    let id_segments = prefix.id_segments();
    let name_prefix = prefix.name_prefix(has_form_prefix);
    let name_segments = name_prefix.split('.').collect::<Vec<_>>();
    let strip = kind.strip_count();
    let rules = [
        ("id", Divider::Dash, &id_segments),
        ("for", Divider::Dash, &id_segments),
        ("name", Divider::Dot, &name_segments),
    ];

    for node in dom.descendant_elements(item) {
        let mut updates = Vec::new();
        for (attr, divider, segments) in &rules {
            let Some(value) = dom.attr(node, attr) else {
                continue;
            };
            let path = FieldPath::parse(value, *divider);
            if let Some(remainder) = path.item_remainder(segments, &old_index) {
                updates.push((*attr, splice_index(segments, index, remainder, *divider, strip)));
            }
        }
        for (attr, value) in updates {
            dom.set_attr(node, attr, &value)?;
        }
    }
    Ok(())
}
