use super::*;

/// Drops the item grabbed by `handle` onto the sibling item containing
/// `target`, then renumbers every form.
///
/// Moving down places the item after the target, moving up places it before,
/// which matches how a sortable list settles on drop.
pub(crate) fn move_item(
    dom: &mut Dom,
    handle: NodeId,
    target: NodeId,
    options: &EngineOptions,
) -> Result<ReorderSummary> {
    if !is_drag_handle(dom, handle) {
        return Err(Error::Reorder("drag must start from a .handle".into()));
    }
    let item = sortable_item(dom, handle)
        .ok_or_else(|| Error::Reorder("drag handle is not inside a sortable item".into()))?;
    let container = dom
        .parent(item)
        .ok_or_else(|| Error::Reorder("sortable item is detached".into()))?;
    let drop_item = sibling_item(dom, target, container)
        .ok_or_else(|| Error::Reorder("drop target is not an item of the same list".into()))?;

    let items = sortable_items(dom, container);
    let from = position_of(&items, item)?;
    let to = position_of(&items, drop_item)?;
    if from < to {
        dom.insert_after(drop_item, item)?;
    } else if from > to {
        dom.insert_before(container, item, drop_item)?;
    }

    let moved_id = dom.attr(item, "id").unwrap_or_default().to_string();
    let renumbered = renumber_all_forms(dom)?;
    sync_affordances(dom, options)?;
    Ok(ReorderSummary {
        moved_id,
        from,
        to,
        renumbered,
    })
}

fn sortable_items(dom: &Dom, container: NodeId) -> Vec<NodeId> {
    dom.child_elements(container)
        .into_iter()
        .filter(|child| is_item(dom, *child))
        .collect()
}

fn sortable_item(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let parent = dom.parent(current);
        if is_item(dom, current)
            && parent.is_some_and(|p| dom.has_class(p, SORTABLE_CLASS))
        {
            return Some(current);
        }
        cursor = parent;
    }
    None
}

fn sibling_item(dom: &Dom, node: NodeId, container: NodeId) -> Option<NodeId> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let parent = dom.parent(current);
        if parent == Some(container) {
            return is_item(dom, current).then_some(current);
        }
        cursor = parent;
    }
    None
}

fn position_of(items: &[NodeId], node: NodeId) -> Result<usize> {
    items
        .iter()
        .position(|id| *id == node)
        .ok_or_else(|| Error::Reorder("item is not part of the sortable list".into()))
}
