use std::error::Error as StdError;
use std::fmt;

pub mod ambient;
mod dom;
mod fixture;
mod html;

#[cfg(test)]
mod tests;

pub use fixture::{
    Document, DomFixture, DomInterface, DomObject, ElementHandle, EnvironmentId, HtmlCollection,
    InterfaceHandle, NodeHandle, NodeKind, NodeList, Window, same_environment,
};

pub const BLANK_PAGE_HTML: &str = "<!DOCTYPE html><body></body></html>";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    InvalidNode(String),
    InvalidOperation(String),
    UnsupportedSelector(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::InvalidNode(msg) => write!(f, "invalid node: {msg}"),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
        }
    }
}

impl StdError for Error {}
