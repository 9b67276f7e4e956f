use super::*;
use crate::naming::{Divider, PLACEHOLDER, replace_indices, sequence_numbers};
use crate::sequence_data::SequenceData;

/// Runs one add action: inserts `batch_add_count` items, each recounting
/// the existing siblings, then resynchronises affordances.
pub(crate) fn add_items(
    dom: &mut Dom,
    adder_link: NodeId,
    options: &EngineOptions,
) -> Result<InsertSummary> {
    let data = sequence_data_for(dom, adder_link)?;
    let count = data.required_batch_add_count()?;
    let mut summary = InsertSummary {
        adder_name: adder_name(dom, adder_link)?,
        indices: Vec::with_capacity(count),
    };
    for _ in 0..count {
        summary.indices.push(insert_one(dom, adder_link, options)?);
    }
    sync_affordances(dom, options)?;
    Ok(summary)
}

/// Inserts a single item regardless of the batch configuration.
pub(crate) fn add_item(
    dom: &mut Dom,
    adder_link: NodeId,
    options: &EngineOptions,
) -> Result<InsertSummary> {
    let name = adder_name(dom, adder_link)?;
    let index = insert_one(dom, adder_link, options)?;
    sync_affordances(dom, options)?;
    Ok(InsertSummary {
        adder_name: name,
        indices: vec![index],
    })
}

fn sequence_data_for(dom: &Dom, adder_link: NodeId) -> Result<SequenceData> {
    let sequence = closest_item(dom, adder_link)
        .ok_or_else(|| Error::SequenceData("add link is not inside a sequence field".into()))?;
    let holder = dom
        .child_elements(sequence)
        .into_iter()
        .find(|child| dom.has_class(*child, SEQUENCE_DATA_CLASS))
        .ok_or_else(|| Error::SequenceData("sequence has no .formish-sequencedata holder".into()))?;
    let title = dom
        .attr(holder, "title")
        .ok_or_else(|| Error::SequenceData("sequence data holder has no title".into()))?;
    SequenceData::parse(title)
}

fn adder_for(dom: &Dom, adder_link: NodeId) -> Result<NodeId> {
    dom.next_element_sibling(adder_link)
        .filter(|node| dom.has_class(*node, ADDER_CLASS))
        .ok_or_else(|| Error::Template("add link is not followed by an .adder control".into()))
}

fn adder_name(dom: &Dom, adder_link: NodeId) -> Result<String> {
    let adder = adder_for(dom, adder_link)?;
    dom.attr(adder, "name")
        .map(str::to_string)
        .ok_or_else(|| Error::Template("adder control has no name".into()))
}

fn insert_one(dom: &mut Dom, adder_link: NodeId, options: &EngineOptions) -> Result<usize> {
    let adder = adder_for(dom, adder_link)?;
    let parent = dom
        .parent(adder_link)
        .ok_or_else(|| Error::Dom("add link is detached".into()))?;
    let code = dom
        .attr(adder, "value")
        .ok_or_else(|| Error::Template("adder control has no template value".into()))?
        .to_string();
    let name = adder_name(dom, adder_link)?;
    let position = dom
        .previous_element_siblings(adder)
        .into_iter()
        .filter(|node| is_item(dom, *node))
        .count();

    let html = decode_template(&code, options.template_encoding)?;
    let mut fragment = parse_fragment(&html)?;
    let indices = sequence_numbers(&name, position);
    let label_target = item_control_id(&form_id_for(dom, adder_link), &name, position);
    stamp_fragment(&mut fragment, &indices, &label_target, position)?;

    for top in fragment.child_elements(fragment.root) {
        let imported = dom.import_subtree(&fragment, top)?;
        dom.insert_before(parent, imported, adder_link)?;
    }
    Ok(position)
}

/// Id of the control inside the new item: the adder name with its last
/// segment set to the position, dash-joined behind the form id.
fn item_control_id(form_id: &str, adder_name: &str, position: usize) -> String {
    let mut segments = adder_name
        .split('.')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if let Some(last) = segments.last_mut() {
        *last = position.to_string();
    }
    let path = segments.join("-");
    if form_id.is_empty() {
        path
    } else {
        format!("{form_id}-{path}")
    }
}

fn stamp_fragment(
    fragment: &mut Dom,
    indices: &[usize],
    label_target: &str,
    position: usize,
) -> Result<()> {
    let label = position.to_string();
    for node in fragment.all_element_nodes() {
        if let Some(name) = fragment.attr(node, "name") {
            let stamped = replace_indices(name, indices, Divider::Dot);
            fragment.set_attr(node, "name", &stamped)?;
        }
        if let Some(id) = fragment.attr(node, "id") {
            let stamped = replace_indices(id, indices, Divider::Dash);
            fragment.set_attr(node, "id", &stamped)?;
        }
        if let Some(target) = fragment.attr(node, "for") {
            let stamped = replace_indices(target, indices, Divider::Dash);
            fragment.set_attr(node, "for", &stamped)?;
            if fragment.text_content(node) == PLACEHOLDER {
                fragment.set_text_content(node, &label)?;
            }
        }
    }

    for node in fragment.all_element_nodes() {
        let is_label = fragment.tag_name(node) == Some("label")
            && fragment.attr(node, "for") == Some(label_target);
        let is_legend = fragment.tag_name(node) == Some("legend")
            && fragment.text_content(node).contains(PLACEHOLDER);
        if is_label || is_legend {
            fragment.set_text_content(node, &label)?;
        }
    }
    Ok(())
}
