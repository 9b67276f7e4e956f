use super::*;

fn phone_item(person: usize, index: usize, number: &str) -> String {
    format!(
        r#"<div id="f-people-{person}-phones-{index}--field" class="field type-string"><input id="f-people-{person}-phones-{index}" name="people.{person}.phones.{index}" value="{number}"><span class="seqdelete"></span></div>"#
    )
}

fn phone_template(person: &str) -> String {
    let html = format!(
        r#"<div id="f-people-{person}-phones-*--field" class="field type-string"><input id="f-people-{person}-phones-*" name="people.{person}.phones.*" value=""><span class="seqdelete"></span></div>"#
    );
    urlencoding::encode(&html).into_owned()
}

/// `numbers` is comma-separated; an empty string means no phone items.
fn phones_sequence(person: &str, numbers: &str) -> String {
    let items = numbers
        .split(',')
        .filter(|number| !number.is_empty())
        .enumerate()
        .map(|(index, number)| match person.parse::<usize>() {
            Ok(person) => phone_item(person, index, number),
            Err(_) => String::new(),
        })
        .collect::<String>();
    format!(
        r#"<div id="f-people-{person}-phones--field" class="field type-sequence widget-sequencedefault"><span class="formish-sequencedata" title="batch_add_count=1"></span>{items}<input type="hidden" class="adder" name="people.{person}.phones.*" value="{template}"></div>"#,
        template = phone_template(person)
    )
}

fn person_item(index: usize, name: &str, numbers: &str) -> String {
    format!(
        r#"<fieldset id="f-people-{index}--field" class="field type-structure"><legend>{index}</legend><div id="f-people-{index}-name--field" class="field type-string"><label for="f-people-{index}-name">Name</label><input id="f-people-{index}-name" name="people.{index}.name" value="{name}"></div>{phones}<span class="seqdelete"></span><span class="seqgrab"></span></fieldset>"#,
        phones = phones_sequence(&index.to_string(), numbers)
    )
}

fn person_template() -> String {
    let html = format!(
        r#"<fieldset id="f-people-*--field" class="field type-structure"><legend>*</legend><div id="f-people-*-name--field" class="field type-string"><label for="f-people-*-name">Name</label><input id="f-people-*-name" name="people.*.name" value=""></div>{phones}<span class="seqdelete"></span><span class="seqgrab"></span></fieldset>"#,
        phones = phones_sequence("*", "")
    );
    urlencoding::encode(&html).into_owned()
}

fn people_container_form(people: &[(&str, &str)]) -> String {
    let items = people
        .iter()
        .enumerate()
        .map(|(index, (name, numbers))| person_item(index, name, numbers))
        .collect::<String>();
    format!(
        r#"<form id="f"><div id="f-people--field" class="field type-sequence type-container widget-sequencedefault sortable"><span class="formish-sequencedata" title="batch_add_count=1"></span>{items}<input type="hidden" class="adder" name="people.*" value="{template}"></div></form>"#,
        template = person_template()
    )
}

fn control_names(engine: &SequenceEngine) -> Result<Vec<String>> {
    Ok(engine
        .named_controls("#f")?
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !name.ends_with('*'))
        .collect())
}

#[test]
fn removing_container_item_rewrites_nested_paths() -> Result<()> {
    let html = people_container_form(&[
        ("alice", "111"),
        ("bob", ""),
        ("carol", "333,334"),
    ]);
    let mut engine = SequenceEngine::from_html(&html)?;
    engine.init()?;
    engine.click("#f-people-1--field > span.remove")?;

    engine.assert_count("#f-people--field > fieldset.field", 2)?;
    engine.assert_attr("#f-people-1-name", "value", "carol")?;
    engine.assert_attr("#f-people-1-name", "name", "people.1.name")?;
    engine.assert_attr("label[for='f-people-1-name']", "for", "f-people-1-name")?;
    engine.assert_exists("#f-people-1-name--field")?;
    engine.assert_exists("#f-people-1-phones--field")?;
    engine.assert_attr("#f-people-1-phones-1", "value", "334")?;
    engine.assert_attr("#f-people-1-phones-1", "name", "people.1.phones.1")?;
    engine.assert_attr(
        "#f-people-1-phones--field > input.adder",
        "name",
        "people.1.phones.*",
    )?;
    assert_eq!(
        control_names(&engine)?,
        vec![
            "people.0.name",
            "people.0.phones.0",
            "people.1.name",
            "people.1.phones.0",
            "people.1.phones.1",
        ]
    );
    Ok(())
}

#[test]
fn nested_adder_stamps_parent_index_from_its_name() -> Result<()> {
    let html = people_container_form(&[("alice", "111"), ("bob", "")]);
    let mut engine = SequenceEngine::from_html(&html)?;
    engine.init()?;
    engine.click("#f-people-0--field > span.remove")?;
    // The surviving adder still carries a template stamped for person 1.
    engine.click("#f-people-0-phones--field > a.adderlink")?;

    engine.assert_exists("#f-people-0-phones-0--field")?;
    engine.assert_attr("#f-people-0-phones-0", "name", "people.0.phones.0")?;
    engine.assert_count("#f-people-0-phones--field > .field", 1)?;
    Ok(())
}

#[test]
fn adding_container_item_brings_its_own_nested_sequence() -> Result<()> {
    let html = people_container_form(&[("alice", "111")]);
    let mut engine = SequenceEngine::from_html(&html)?;
    engine.init()?;
    engine.click("#f-people--field > a.adderlink")?;

    engine.assert_exists("#f-people-1--field")?;
    engine.assert_text("#f-people-1--field > legend", "1")?;
    engine.assert_attr("#f-people-1-name", "name", "people.1.name")?;
    engine.assert_exists("#f-people-1-phones--field")?;
    engine.assert_attr(
        "#f-people-1-phones--field > input.adder",
        "name",
        "people.1.phones.*",
    )?;
    engine.assert_count("a.adderlink", 3)?;

    engine.click("#f-people-1-phones--field > a.adderlink")?;
    engine.assert_attr("#f-people-1-phones-0", "name", "people.1.phones.0")?;
    engine.click("#f-people-1-phones--field > a.adderlink")?;
    engine.assert_attr("#f-people-1-phones-1", "name", "people.1.phones.1")?;
    Ok(())
}

#[test]
fn dragging_container_items_keeps_nested_data_together() -> Result<()> {
    let html = people_container_form(&[("alice", "111"), ("bob", "222,223")]);
    let mut engine = SequenceEngine::from_html(&html)?;
    engine.init()?;
    engine.drag("#f-people-1--field > div.handle", "#f-people-0--field")?;

    engine.assert_attr("#f-people-0-name", "value", "bob")?;
    engine.assert_attr("#f-people-0-phones-1", "value", "223")?;
    engine.assert_attr("#f-people-1-name", "value", "alice")?;
    engine.assert_attr("#f-people-1-phones-0", "name", "people.1.phones.0")?;
    Ok(())
}

#[test]
fn renumber_closes_gaps_left_by_server_markup() -> Result<()> {
    let html = r#"
    <form id="f">
      <div id="f-tags--field" class="field type-sequence widget-sequencedefault">
        <div id="f-tags-3--field" class="field"><input id="f-tags-3" name="tags.3" value="a"></div>
        <div id="f-tags-7--field" class="field"><input id="f-tags-7" name="tags.7" value="b"></div>
      </div>
    </form>
    "#;
    let mut engine = SequenceEngine::from_html(html)?;
    engine.renumber()?;
    engine.assert_attr("#f-tags-0", "value", "a")?;
    engine.assert_attr("#f-tags-1", "value", "b")?;
    engine.assert_attr("#f-tags-1", "name", "tags.1")?;
    engine.assert_exists("#f-tags-1--field")?;
    Ok(())
}

#[test]
fn forms_without_id_keep_every_segment_in_names() -> Result<()> {
    let html = r#"
    <form>
      <div id="tags--field" class="field type-sequence widget-sequencedefault">
        <div id="tags-0--field" class="field"><input id="tags-0" name="tags.0" value="a"><span class="seqdelete"></span></div>
        <div id="tags-1--field" class="field"><input id="tags-1" name="tags.1" value="b"><span class="seqdelete"></span></div>
      </div>
    </form>
    "#;
    let mut engine = SequenceEngine::from_html(html)?;
    engine.init()?;
    engine.click("#tags-0--field span.remove")?;
    engine.assert_attr("#tags-0", "name", "tags.0")?;
    engine.assert_attr("#tags-0", "value", "b")?;
    Ok(())
}

#[test]
fn counters_are_independent_per_form() -> Result<()> {
    let html = r#"
    <form id="a">
      <div id="a-x--field" class="field type-sequence widget-sequencedefault">
        <div id="a-x-4--field" class="field"><input id="a-x-4" name="x.4"></div>
      </div>
    </form>
    <form id="b">
      <div id="b-x--field" class="field type-sequence widget-sequencedefault">
        <div id="b-x-9--field" class="field"><input id="b-x-9" name="x.9"></div>
      </div>
    </form>
    "#;
    let mut engine = SequenceEngine::from_html(html)?;
    engine.renumber()?;
    engine.assert_attr("#a-x-0", "name", "x.0")?;
    engine.assert_attr("#b-x-0", "name", "x.0")?;
    Ok(())
}

#[test]
fn malformed_sequence_id_aborts_renumbering() -> Result<()> {
    let html = r#"
    <form id="f">
      <div id="f-tags--field" class="field type-sequence widget-sequencedefault">
        <div id="f-tags-5--field" class="field"><input id="f-tags-5" name="tags.5"></div>
      </div>
      <div id="f-broken" class="field type-sequence widget-sequencedefault"></div>
    </form>
    "#;
    let mut engine = SequenceEngine::from_html(html)?;
    let before = engine.to_html();
    let err = engine.renumber().expect_err("malformed id should fail");
    match err {
        Error::MalformedPath { path, .. } => assert_eq!(path, "f-broken"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(engine.to_html(), before);
    Ok(())
}

#[test]
fn dragging_onto_another_list_is_rejected() -> Result<()> {
    let html = people_container_form(&[("alice", "111"), ("bob", "")]);
    let mut engine = SequenceEngine::from_html(&html)?;
    engine.init()?;
    let before = engine.to_html();

    let err = engine
        .drag("#f-people-0--field > div.handle", "#f")
        .expect_err("drop outside the list should fail");
    assert!(matches!(err, Error::Reorder(_)));

    let err = engine
        .drag(
            "#f-people-0--field > div.handle",
            "#f-people--field > span.formish-sequencedata",
        )
        .expect_err("drop onto a non-item sibling should fail");
    assert!(matches!(err, Error::Reorder(_)));

    let err = engine
        .drag("#f-people-0--field > span.remove", "#f-people-1--field")
        .expect_err("drag must start from a handle");
    assert!(matches!(err, Error::Reorder(_)));
    assert_eq!(engine.to_html(), before);
    Ok(())
}

#[test]
fn add_without_adder_control_reports_template_error() -> Result<()> {
    let html = r#"
    <form id="f">
      <div id="f-tags--field" class="field type-sequence widget-sequencedefault">
        <span class="formish-sequencedata" title="batch_add_count=1"></span>
        <a class="adderlink">Add</a>
      </div>
    </form>
    "#;
    let mut engine = SequenceEngine::from_html(html)?;
    let err = engine
        .add_items("a.adderlink")
        .expect_err("missing adder should fail");
    assert!(matches!(err, Error::Template(_)));

    let err = engine
        .add_items("#f-tags--field")
        .expect_err("selector must point at an add link");
    assert!(matches!(err, Error::Template(_)));
    Ok(())
}

fn group_item(index: &str, name: &str) -> String {
    // Structure fields render the class twice; the first one wins.
    format!(
        r#"<fieldset class="group" id="f-people-{index}--field" class="field type-structure"><legend>{index}</legend><div id="f-people-{index}-name--field" class="field type-string"><label for="f-people-{index}-name">Name</label><input id="f-people-{index}-name" name="people.{index}.name" value="{name}"></div><span class="seqdelete"></span><span class="seqgrab"></span></fieldset>"#
    )
}

fn group_form(names: &[&str]) -> String {
    let items = names
        .iter()
        .enumerate()
        .map(|(index, name)| group_item(&index.to_string(), name))
        .collect::<String>();
    format!(
        r#"<form id="f"><div id="f-people--field" class="field type-sequence type-container widget-sequencedefault sortable"><span class="formish-sequencedata" title="batch_add_count=1"></span>{items}<input type="hidden" class="adder" name="people.*" value="{template}"></div></form>"#,
        template = urlencoding::encode(&group_item("*", ""))
    )
}

#[test]
fn group_fieldset_items_are_added_removed_and_dragged_as_items() -> Result<()> {
    let mut engine = SequenceEngine::from_html(&group_form(&["alice", "bob"]))?;
    engine.init()?;
    engine.assert_count("#f-people--field > fieldset.group > span.remove", 2)?;
    engine.assert_count("#f-people--field > fieldset.group > div.handle", 2)?;

    engine.click("#f-people--field > a.adderlink")?;
    engine.assert_attr("#f-people-2-name", "name", "people.2.name")?;
    engine.assert_text("#f-people-2--field > legend", "2")?;

    engine.click("#f-people-0--field > span.remove")?;
    engine.assert_count("#f-people--field", 1)?;
    engine.assert_count("#f-people--field > fieldset.group", 2)?;
    let values = engine
        .named_controls("#f")?
        .into_iter()
        .filter(|(name, _)| !name.ends_with('*'))
        .collect::<Vec<_>>();
    assert_eq!(
        values,
        vec![
            ("people.0.name".to_string(), "bob".to_string()),
            ("people.1.name".to_string(), String::new()),
        ]
    );

    engine.drag("#f-people-1--field > div.handle", "#f-people-0--field")?;
    engine.assert_attr("#f-people-0-name", "value", "")?;
    engine.assert_attr("#f-people-1-name", "value", "bob")?;
    engine.assert_attr("#f-people-1-name--field > label", "for", "f-people-1-name")?;
    Ok(())
}
