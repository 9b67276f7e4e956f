use super::*;

/// Brings injected controls in line with the current tree.
///
/// Every `.adder` gets an `a.adderlink` right before it, every `.seqdelete`
/// a `span.remove` right after it, and every `.seqgrab` inside a `.sortable`
/// a `div.handle` right after it. Injected controls that no longer sit next
/// to their anchor are dropped. Running this twice changes nothing.
pub(crate) fn sync_affordances(dom: &mut Dom, options: &EngineOptions) -> Result<()> {
    sync_add_links(dom, &options.add_label)?;
    sync_remove_buttons(dom, &options.remove_label)?;
    sync_drag_handles(dom, &options.handle_label)?;
    Ok(())
}

fn sync_add_links(dom: &mut Dom, label: &str) -> Result<()> {
    let stale = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| is_adder_link(dom, *node))
        .filter(|node| {
            !dom.next_element_sibling(*node)
                .is_some_and(|next| dom.has_class(next, ADDER_CLASS))
        })
        .collect::<Vec<_>>();
    remove_all(dom, stale)?;

    let adders = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| dom.has_class(*node, ADDER_CLASS))
        .collect::<Vec<_>>();
    for adder in adders {
        let existing = dom
            .previous_element_sibling(adder)
            .filter(|prev| is_adder_link(dom, *prev));
        match existing {
            Some(link) => ensure_text(dom, link, label)?,
            None => {
                let parent = dom
                    .parent(adder)
                    .ok_or_else(|| Error::Dom("adder control is detached".into()))?;
                let link = dom.create_detached_element("a", ADDER_LINK_CLASS, label);
                dom.insert_before(parent, link, adder)?;
            }
        }
    }
    Ok(())
}

fn sync_remove_buttons(dom: &mut Dom, label: &str) -> Result<()> {
    let stale = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| is_remove_button(dom, *node))
        .filter(|node| {
            !dom.previous_element_sibling(*node)
                .is_some_and(|prev| dom.has_class(prev, SEQDELETE_CLASS))
        })
        .collect::<Vec<_>>();
    remove_all(dom, stale)?;

    let markers = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| dom.has_class(*node, SEQDELETE_CLASS))
        .collect::<Vec<_>>();
    for marker in markers {
        place_after(dom, marker, label, "span", REMOVE_CLASS, is_remove_button)?;
    }
    Ok(())
}

fn sync_drag_handles(dom: &mut Dom, label: &str) -> Result<()> {
    let in_sortable = |dom: &Dom, node: NodeId| {
        dom.parent(node)
            .and_then(|parent| dom.closest_with_class(parent, SORTABLE_CLASS))
            .is_some()
    };

    let stale = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| is_drag_handle(dom, *node))
        .filter(|node| {
            !dom.previous_element_sibling(*node).is_some_and(|prev| {
                dom.has_class(prev, SEQGRAB_CLASS) && in_sortable(dom, prev)
            })
        })
        .collect::<Vec<_>>();
    remove_all(dom, stale)?;

    let grabs = dom
        .all_element_nodes()
        .into_iter()
        .filter(|node| dom.has_class(*node, SEQGRAB_CLASS) && in_sortable(dom, *node))
        .collect::<Vec<_>>();
    for grab in grabs {
        place_after(dom, grab, label, "div", HANDLE_CLASS, is_drag_handle)?;
    }
    Ok(())
}

fn place_after(
    dom: &mut Dom,
    anchor: NodeId,
    label: &str,
    tag: &str,
    class_name: &str,
    is_control: fn(&Dom, NodeId) -> bool,
) -> Result<()> {
    let existing = dom
        .next_element_sibling(anchor)
        .filter(|next| is_control(dom, *next));
    match existing {
        Some(control) => ensure_text(dom, control, label),
        None => {
            let control = dom.create_detached_element(tag, class_name, label);
            dom.insert_after(anchor, control)
        }
    }
}

fn ensure_text(dom: &mut Dom, node: NodeId, label: &str) -> Result<()> {
    if dom.text_content(node) != label {
        dom.set_text_content(node, label)?;
    }
    Ok(())
}

fn remove_all(dom: &mut Dom, nodes: Vec<NodeId>) -> Result<()> {
    for node in nodes {
        dom.remove_node(node)?;
    }
    Ok(())
}
