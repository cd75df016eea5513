use std::sync::{Mutex, PoisonError};

use super::*;

// The ambient slot is process-wide; serialize these tests so they do not
// stomp on each other when the harness runs them on parallel threads.
static AMBIENT_TEST_LOCK: Mutex<()> = Mutex::new(());

fn ambient_lock() -> std::sync::MutexGuard<'static, ()> {
    AMBIENT_TEST_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[test]
fn init_dom_populates_all_six_bindings() -> Result<()> {
    let _guard = ambient_lock();
    ambient::reset();

    ambient::init_dom()?;
    assert!(ambient::window().is_some());
    assert!(ambient::document().is_some());
    assert!(ambient::html_document().is_some());
    assert!(ambient::element().is_some());
    assert!(ambient::html_collection().is_some());
    assert!(ambient::node_list().is_some());

    let installed = ambient::installed().expect("installed bundle");
    assert!(installed.is_internally_consistent());
    assert_eq!(
        ambient::document().expect("document").default_view(),
        ambient::window().expect("window")
    );

    ambient::reset();
    Ok(())
}

#[test]
fn init_dom_twice_replaces_the_whole_bundle() -> Result<()> {
    let _guard = ambient_lock();
    ambient::reset();

    ambient::init_dom()?;
    let first = ambient::installed().expect("first bundle");

    ambient::init_dom()?;
    let second = ambient::installed().expect("second bundle");

    assert_ne!(first.environment_id(), second.environment_id());
    assert!(second.is_internally_consistent());
    assert_eq!(
        ambient::document().expect("document").environment_id(),
        second.environment_id()
    );

    ambient::reset();
    Ok(())
}

#[test]
fn failed_construction_leaves_previous_bindings_untouched() -> Result<()> {
    let _guard = ambient_lock();
    ambient::reset();

    ambient::init_dom()?;
    let before = ambient::installed().expect("bundle").environment_id();

    let err = DomFixture::from_html("<body><!-- oops").unwrap_err();
    assert!(matches!(err, Error::HtmlParse(_)));

    assert_eq!(
        ambient::installed().expect("bundle").environment_id(),
        before
    );

    ambient::reset();
    Ok(())
}

#[test]
fn install_returns_the_displaced_bundle() -> Result<()> {
    let _guard = ambient_lock();
    ambient::reset();

    let first = DomFixture::blank_page()?;
    let first_id = first.environment_id();
    assert!(ambient::install(first).is_none());

    let second = DomFixture::blank_page()?;
    let displaced = ambient::install(second).expect("displaced bundle");
    assert_eq!(displaced.environment_id(), first_id);

    ambient::reset();
    Ok(())
}

#[test]
fn accessors_are_none_while_nothing_is_installed() {
    let _guard = ambient_lock();
    ambient::reset();

    assert!(ambient::window().is_none());
    assert!(ambient::document().is_none());
    assert!(ambient::html_document().is_none());
    assert!(ambient::element().is_none());
    assert!(ambient::html_collection().is_none());
    assert!(ambient::node_list().is_none());
    assert!(ambient::installed().is_none());
}
