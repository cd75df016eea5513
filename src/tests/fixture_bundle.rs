use super::*;

#[test]
fn bundle_handles_share_one_environment() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    assert!(fixture.is_internally_consistent());

    assert_eq!(fixture.document.default_view(), fixture.window);
    assert_eq!(fixture.window.document(), fixture.document);
    assert_eq!(fixture.window.environment_id(), fixture.document.environment_id());
    assert!(same_environment(&fixture.window, &fixture.document));
    Ok(())
}

#[test]
fn blank_page_body_exists_and_is_empty() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let body = fixture.document.body().expect("body");
    assert!(body.child_nodes().is_empty());
    assert_eq!(body.text_content(), "");
    Ok(())
}

#[test]
fn interface_handles_classify_instances() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let body = fixture.document.body().expect("body");

    assert!(fixture.html_document.is_instance(&fixture.document));
    assert!(fixture.element.is_instance(&body));
    assert!(fixture.node_list.is_instance(&body.child_nodes()));
    assert!(
        fixture
            .html_collection
            .is_instance(&fixture.document.get_elements_by_tag_name("*"))
    );

    assert!(!fixture.element.is_instance(&fixture.document));
    assert!(!fixture.html_document.is_instance(&body));
    Ok(())
}

#[test]
fn interface_handles_reject_objects_from_other_environments() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let other = DomFixture::blank_page()?;

    let other_body = other.document.body().expect("body");
    assert!(!fixture.element.is_instance(&other_body));
    assert!(!fixture.html_document.is_instance(&other.document));
    assert!(!same_environment(&fixture.document, &other.document));
    Ok(())
}

#[test]
fn each_construction_yields_an_independent_environment() -> Result<()> {
    let first = DomFixture::blank_page()?;
    let second = DomFixture::blank_page()?;

    assert_ne!(first.environment_id(), second.environment_id());
    assert_ne!(first.window, second.window);
    assert_ne!(first.document, second.document);

    // Mutating one environment is invisible to the other.
    let div = first.document.create_element("div")?;
    first
        .document
        .body()
        .expect("body")
        .append_child(&div.as_node())?;
    assert!(second.document.body().expect("body").child_nodes().is_empty());
    Ok(())
}

#[test]
fn text_nodes_report_the_text_interface() -> Result<()> {
    let fixture = DomFixture::from_html("<body>hi</body>")?;
    let text = fixture
        .document
        .body()
        .expect("body")
        .child_nodes()
        .item(0)
        .expect("text node");
    assert_eq!(text.node_kind(), NodeKind::Text);
    assert_eq!(text.interface(), DomInterface::Text);
    assert!(!fixture.element.is_instance(&text));
    Ok(())
}

#[test]
fn document_node_is_reachable_through_child_nodes() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    let document_node = fixture.document.as_node();
    assert_eq!(document_node.node_kind(), NodeKind::Document);
    assert!(fixture.html_document.is_instance(&document_node));

    let html = document_node
        .child_nodes()
        .item(0)
        .and_then(|node| node.as_element())
        .expect("html element");
    assert_eq!(html.tag_name(), "html");
    Ok(())
}
