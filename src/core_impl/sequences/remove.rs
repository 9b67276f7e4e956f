use super::*;

/// Deletes the item owning `remove_button` and renumbers every form.
pub(crate) fn remove_item(
    dom: &mut Dom,
    remove_button: NodeId,
    options: &EngineOptions,
) -> Result<RemoveSummary> {
    let item = closest_item(dom, remove_button)
        .ok_or_else(|| Error::Dom("remove button is not inside a field".into()))?;
    let removed_id = dom.attr(item, "id").unwrap_or_default().to_string();
    dom.remove_node(item)?;
    let renumbered = renumber_all_forms(dom)?;
    sync_affordances(dom, options)?;
    Ok(RemoveSummary {
        removed_id,
        renumbered,
    })
}
