use super::*;

#[test]
fn create_element_append_and_remove_child_work() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let body = fixture.document.body().expect("body");

    let div = fixture.document.create_element("div")?;
    div.set_attribute("id", "box")?;
    body.append_child(&div.as_node())?;

    let found = fixture.document.get_element_by_id("box").expect("#box");
    assert_eq!(found, div);
    assert_eq!(body.child_nodes().length(), 1);

    div.remove();
    assert!(fixture.document.get_element_by_id("box").is_none());
    assert!(body.child_nodes().is_empty());
    Ok(())
}

#[test]
fn create_text_node_append_and_text_content_work() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let body = fixture.document.body().expect("body");

    let text = fixture.document.create_text_node("hello");
    body.append_child(&text)?;
    assert_eq!(body.text_content(), "hello");
    assert_eq!(
        body.child_nodes().item(0).expect("first child").node_kind(),
        NodeKind::Text
    );
    Ok(())
}

#[test]
fn append_into_own_subtree_is_rejected() -> Result<()> {
    let fixture = DomFixture::from_html("<body><div id='outer'><div id='inner'></div></div></body>")?;
    let outer = fixture.document.get_element_by_id("outer").expect("#outer");
    let inner = fixture.document.get_element_by_id("inner").expect("#inner");

    let err = inner.append_child(&outer.as_node()).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    Ok(())
}

#[test]
fn appending_a_node_from_another_environment_is_rejected() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let other = DomFixture::blank_page()?;

    let foreign = other.document.create_element("div")?;
    let err = fixture
        .document
        .body()
        .expect("body")
        .append_child(&foreign.as_node())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidNode(_)));
    Ok(())
}

#[test]
fn replace_with_swaps_node_in_place() -> Result<()> {
    let fixture = DomFixture::from_html("<body><p>before</p><div id='old'>x</div><p>after</p></body>")?;
    let old = fixture.document.get_element_by_id("old").expect("#old");

    let new = fixture.document.create_element("span")?;
    new.set_text_content("y")?;
    old.replace_with(&new.as_node())?;

    let body = fixture.document.body().expect("body");
    assert_eq!(body.text_content(), "beforeyafter");
    assert_eq!(body.children().item(1).expect("middle"), new);
    assert!(fixture.document.get_element_by_id("old").is_none());
    Ok(())
}

#[test]
fn set_text_content_replaces_children() -> Result<()> {
    let fixture = DomFixture::from_html("<body><div id='box'><span>a</span><span>b</span></div></body>")?;
    let div = fixture.document.get_element_by_id("box").expect("#box");

    div.set_text_content("plain")?;
    assert_eq!(div.child_nodes().length(), 1);
    assert_eq!(div.text_content(), "plain");

    div.set_text_content("")?;
    assert!(div.child_nodes().is_empty());
    Ok(())
}

#[test]
fn inner_html_set_replaces_children_and_updates_id_index() -> Result<()> {
    let fixture = DomFixture::from_html("<body><div id='box'><span id='gone'></span></div></body>")?;
    let div = fixture.document.get_element_by_id("box").expect("#box");

    div.set_inner_html("<p id='fresh'>new</p>")?;
    assert!(fixture.document.get_element_by_id("gone").is_none());
    let fresh = fixture.document.get_element_by_id("fresh").expect("#fresh");
    assert_eq!(fresh.text_content(), "new");
    assert_eq!(div.inner_html()?, "<p id=\"fresh\">new</p>");
    Ok(())
}

#[test]
fn set_attribute_id_updates_the_id_index() -> Result<()> {
    let fixture = DomFixture::from_html("<body><div id='a'></div></body>")?;
    let div = fixture.document.get_element_by_id("a").expect("#a");

    div.set_attribute("id", "b")?;
    assert!(fixture.document.get_element_by_id("a").is_none());
    assert_eq!(fixture.document.get_element_by_id("b").expect("#b"), div);

    div.remove_attribute("id")?;
    assert!(fixture.document.get_element_by_id("b").is_none());
    Ok(())
}

#[test]
fn node_lists_and_collections_are_live() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let body = fixture.document.body().expect("body");

    let child_nodes = body.child_nodes();
    let divs = fixture.document.get_elements_by_tag_name("div");
    assert_eq!(child_nodes.length(), 0);
    assert_eq!(divs.length(), 0);

    let div = fixture.document.create_element("div")?;
    body.append_child(&div.as_node())?;

    assert_eq!(child_nodes.length(), 1);
    assert_eq!(divs.length(), 1);
    assert_eq!(divs.item(0).expect("div"), div);
    Ok(())
}

#[test]
fn children_skips_text_nodes_and_wildcard_matches_all() -> Result<()> {
    let fixture = DomFixture::from_html("<body>text<div>a</div>more<span>b</span></body>")?;
    let body = fixture.document.body().expect("body");

    assert_eq!(body.child_nodes().length(), 4);
    assert_eq!(body.children().length(), 2);

    // html, head, body, div, span
    assert_eq!(fixture.document.get_elements_by_tag_name("*").length(), 5);
    Ok(())
}

#[test]
fn has_class_reads_whitespace_separated_tokens() -> Result<()> {
    let fixture = DomFixture::from_html("<body><div id='x' class='card  wide'></div></body>")?;
    let div = fixture.document.get_element_by_id("x").expect("#x");
    assert!(div.has_class("card"));
    assert!(div.has_class("wide"));
    assert!(!div.has_class("car"));
    Ok(())
}
