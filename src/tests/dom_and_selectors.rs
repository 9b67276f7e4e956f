use super::*;
use crate::core_impl::parse_html;

fn first(dom: &Dom, selector: &str) -> Result<NodeId> {
    dom.query_selector(selector)?
        .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
}

#[test]
fn descendant_combinator_backtracks_over_ancestors() -> Result<()> {
    let dom = parse_html(
        r#"<div class="sortable"><div class="field"><section><div class="field"><span id="target"></span></div></section></div></div>"#,
    )?;
    // The nearest .field has no .sortable parent; the outer one does.
    assert_eq!(dom.query_selector_all(".sortable > .field span")?.len(), 1);
    assert_eq!(dom.query_selector_all(".sortable > .field > span")?.len(), 0);
    Ok(())
}

#[test]
fn sibling_combinators_skip_text_nodes() -> Result<()> {
    let dom = parse_html(
        "<div><span class=\"seqdelete\"></span>\n  <span class=\"remove\">delete</span> <b></b></div>",
    )?;
    assert_eq!(dom.query_selector_all(".seqdelete + .remove")?.len(), 1);
    assert_eq!(dom.query_selector_all(".seqdelete ~ b")?.len(), 1);
    assert_eq!(dom.query_selector_all(".remove + .seqdelete")?.len(), 0);
    Ok(())
}

#[test]
fn pseudo_classes_filter_candidates() -> Result<()> {
    let dom = parse_html(
        r#"<ul><li class="a"></li><li class="b">x</li><li class="a"></li></ul>"#,
    )?;
    assert_eq!(dom.query_selector_all("li:first-child")?.len(), 1);
    assert_eq!(dom.query_selector_all("li.a:last-child")?.len(), 1);
    assert_eq!(dom.query_selector_all("li:nth-child(2)")?.len(), 1);
    assert_eq!(dom.query_selector_all("li:not(.b)")?.len(), 2);
    assert_eq!(dom.query_selector_all("li:empty")?.len(), 2);
    Ok(())
}

#[test]
fn attribute_selectors_match_field_paths() -> Result<()> {
    let dom = parse_html(
        r#"<form><input name="people.0.name"><input name="people.1.name"><input name="pets.0"></form>"#,
    )?;
    assert_eq!(dom.query_selector_all("[name^='people.']")?.len(), 2);
    assert_eq!(dom.query_selector_all("input[name$='.name']")?.len(), 2);
    assert_eq!(dom.query_selector_all("[name*='ets']")?.len(), 1);
    assert_eq!(dom.query_selector_all("input[name='pets.0']")?.len(), 1);
    Ok(())
}

#[test]
fn insert_after_and_remove_keep_parent_links_consistent() -> Result<()> {
    let mut dom = parse_html(r#"<div id="list"><p id="a"></p><p id="b"></p></div>"#)?;
    let list = first(&dom, "#list")?;
    let a = first(&dom, "#a")?;
    let b = first(&dom, "#b")?;

    dom.insert_after(b, a)?;
    assert_eq!(dom.child_elements(list), vec![b, a]);
    assert_eq!(dom.parent(a), Some(list));

    dom.insert_before(list, a, b)?;
    assert_eq!(dom.child_elements(list), vec![a, b]);

    dom.remove_node(a)?;
    assert_eq!(dom.child_elements(list), vec![b]);
    assert_eq!(dom.parent(a), None);
    assert!(dom.query_selector("#a")?.is_none());
    dom.remove_node(a)?;
    Ok(())
}

#[test]
fn tree_mutation_rejects_cycles() -> Result<()> {
    let mut dom = parse_html(r#"<div id="outer"><div id="inner"></div></div>"#)?;
    let outer = first(&dom, "#outer")?;
    let inner = first(&dom, "#inner")?;
    assert!(matches!(
        dom.append_child(inner, outer),
        Err(Error::Dom(_))
    ));
    let root = dom.root;
    assert!(matches!(dom.remove_node(root), Err(Error::Dom(_))));
    Ok(())
}

#[test]
fn import_subtree_copies_between_documents() -> Result<()> {
    let source = parse_html(r#"<fieldset id="t"><legend>*</legend><input name="x.*"></fieldset>"#)?;
    let mut target = parse_html(r#"<div id="host"><a class="adderlink">Add</a></div>"#)?;
    let template = first(&source, "#t")?;
    let host = first(&target, "#host")?;
    let link = first(&target, "a.adderlink")?;

    let copy = target.import_subtree(&source, template)?;
    target.insert_before(host, copy, link)?;
    assert_eq!(
        target.dump_node(host),
        r#"<div id="host"><fieldset id="t"><legend>*</legend><input name="x.*"></fieldset><a class="adderlink">Add</a></div>"#
    );
    assert_eq!(source.query_selector_all("fieldset")?.len(), 1);
    Ok(())
}

#[test]
fn dump_node_sorts_attributes_and_escapes_text() -> Result<()> {
    let mut dom = parse_html(r#"<label for="f-a" class="x">a &lt; b</label>"#)?;
    let label = first(&dom, "label")?;
    assert_eq!(
        dom.dump_node(label),
        r#"<label class="x" for="f-a">a &lt; b</label>"#
    );
    dom.set_text_content(label, "2")?;
    dom.set_attr(label, "FOR", "f-b")?;
    assert_eq!(dom.dump_node(label), r#"<label class="x" for="f-b">2</label>"#);
    Ok(())
}

#[test]
fn closest_helpers_walk_inclusive_ancestors() -> Result<()> {
    let dom = parse_html(
        r#"<form id="f"><div class="field" id="seq"><div class="field" id="item"><span class="remove"></span></div></div></form>"#,
    )?;
    let remove = first(&dom, "span.remove")?;
    let item = first(&dom, "#item")?;
    let form = first(&dom, "#f")?;
    assert_eq!(dom.closest_with_class(remove, "field"), Some(item));
    assert_eq!(dom.closest_with_class(item, "field"), Some(item));
    assert_eq!(dom.find_ancestor_by_tag(remove, "form"), Some(form));
    assert_eq!(dom.previous_element_siblings(remove), Vec::<NodeId>::new());
    Ok(())
}

#[test]
fn compact_drops_detached_nodes_and_keeps_document_order() -> Result<()> {
    let mut dom = parse_html(r#"<div id="list"><p id="a">one</p><p id="b">two</p></div>"#)?;
    let before = dom.nodes.len();
    let a = first(&dom, "#a")?;
    dom.remove_node(a)?;
    let orphan = dom.create_detached_element("span", "remove", "delete");
    assert_eq!(dom.parent(orphan), None);

    let html = dom.dump_node(dom.root);
    dom.compact();
    assert_eq!(dom.nodes.len(), before - 2);
    assert_eq!(dom.root, NodeId(0));
    assert_eq!(dom.dump_node(dom.root), html);
    let b = first(&dom, "#b")?;
    let list = first(&dom, "#list")?;
    assert_eq!(dom.parent(b), Some(list));
    assert_eq!(dom.text_content(b), "two");

    let len = dom.nodes.len();
    dom.compact();
    assert_eq!(dom.nodes.len(), len);
    Ok(())
}
