// Process-wide DOM globals for legacy harnesses. The slot holds one whole
// bundle and swaps it atomically: racing initializers overwrite each other
// (last writer wins) but a reader never observes a mixed set.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Result;
use crate::fixture::{Document, DomFixture, InterfaceHandle, Window};

static AMBIENT_DOM: Mutex<Option<DomFixture>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<DomFixture>> {
    AMBIENT_DOM.lock().unwrap_or_else(PoisonError::into_inner)
}

// The fixture is constructed before the lock is taken: a parse failure
// leaves whatever was previously installed untouched.
pub fn init_dom() -> Result<()> {
    let fixture = DomFixture::blank_page()?;
    install(fixture);
    Ok(())
}

pub fn install(fixture: DomFixture) -> Option<DomFixture> {
    slot().replace(fixture)
}

pub fn installed() -> Option<DomFixture> {
    slot().clone()
}

pub fn reset() -> Option<DomFixture> {
    slot().take()
}

pub fn window() -> Option<Window> {
    slot().as_ref().map(|fixture| fixture.window.clone())
}

pub fn document() -> Option<Document> {
    slot().as_ref().map(|fixture| fixture.document.clone())
}

pub fn html_document() -> Option<InterfaceHandle> {
    slot().as_ref().map(|fixture| fixture.html_document.clone())
}

pub fn element() -> Option<InterfaceHandle> {
    slot().as_ref().map(|fixture| fixture.element.clone())
}

pub fn html_collection() -> Option<InterfaceHandle> {
    slot()
        .as_ref()
        .map(|fixture| fixture.html_collection.clone())
}

pub fn node_list() -> Option<InterfaceHandle> {
    slot().as_ref().map(|fixture| fixture.node_list.clone())
}
