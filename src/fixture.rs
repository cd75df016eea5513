use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dom::{self, Dom, NodeId, NodeType};
use crate::{BLANK_PAGE_HTML, Error, Result, html};

static NEXT_ENVIRONMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentId(u64);

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env#{}", self.0)
    }
}

#[derive(Debug)]
struct EnvShared {
    id: EnvironmentId,
    dom: Mutex<Dom>,
}

impl EnvShared {
    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomInterface {
    Window,
    HtmlDocument,
    Element,
    Text,
    HtmlCollection,
    NodeList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Text,
}

pub trait DomObject {
    fn interface(&self) -> DomInterface;
    fn environment_id(&self) -> EnvironmentId;
}

pub fn same_environment(a: &dyn DomObject, b: &dyn DomObject) -> bool {
    a.environment_id() == b.environment_id()
}

#[derive(Debug, Clone)]
pub struct Window {
    shared: Arc<EnvShared>,
}

#[derive(Debug, Clone)]
pub struct Document {
    shared: Arc<EnvShared>,
}

#[derive(Debug, Clone)]
pub struct NodeHandle {
    shared: Arc<EnvShared>,
    node: NodeId,
}

#[derive(Debug, Clone)]
pub struct ElementHandle {
    shared: Arc<EnvShared>,
    node: NodeId,
}

#[derive(Debug, Clone)]
pub struct NodeList {
    shared: Arc<EnvShared>,
    owner: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CollectionFilter {
    ChildElements,
    ByTagName(String),
}

#[derive(Debug, Clone)]
pub struct HtmlCollection {
    shared: Arc<EnvShared>,
    scope: NodeId,
    filter: CollectionFilter,
}

#[derive(Debug, Clone)]
pub struct InterfaceHandle {
    shared: Arc<EnvShared>,
    interface: DomInterface,
}

#[derive(Debug, Clone)]
pub struct DomFixture {
    pub window: Window,
    pub document: Document,
    pub html_document: InterfaceHandle,
    pub element: InterfaceHandle,
    pub html_collection: InterfaceHandle,
    pub node_list: InterfaceHandle,
}

impl DomFixture {
    pub fn blank_page() -> Result<Self> {
        Self::from_html(BLANK_PAGE_HTML)
    }

    pub fn from_html(html_source: &str) -> Result<Self> {
        let dom = html::parse_document(html_source)?;
        let shared = Arc::new(EnvShared {
            id: EnvironmentId(NEXT_ENVIRONMENT_ID.fetch_add(1, Ordering::Relaxed)),
            dom: Mutex::new(dom),
        });
        Ok(Self::from_shared(shared))
    }

    fn from_shared(shared: Arc<EnvShared>) -> Self {
        Self {
            window: Window {
                shared: shared.clone(),
            },
            document: Document {
                shared: shared.clone(),
            },
            html_document: InterfaceHandle {
                shared: shared.clone(),
                interface: DomInterface::HtmlDocument,
            },
            element: InterfaceHandle {
                shared: shared.clone(),
                interface: DomInterface::Element,
            },
            html_collection: InterfaceHandle {
                shared: shared.clone(),
                interface: DomInterface::HtmlCollection,
            },
            node_list: InterfaceHandle {
                shared,
                interface: DomInterface::NodeList,
            },
        }
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.window.shared.id
    }

    pub fn is_internally_consistent(&self) -> bool {
        let anchor = &self.window.shared;
        Arc::ptr_eq(anchor, &self.document.shared)
            && Arc::ptr_eq(anchor, &self.html_document.shared)
            && Arc::ptr_eq(anchor, &self.element.shared)
            && Arc::ptr_eq(anchor, &self.html_collection.shared)
            && Arc::ptr_eq(anchor, &self.node_list.shared)
    }

    pub fn take_trace_logs(&self) -> Vec<String> {
        let mut dom = self.window.shared.dom();
        std::mem::take(&mut dom.trace_logs)
    }
}

impl Window {
    pub fn document(&self) -> Document {
        Document {
            shared: self.shared.clone(),
        }
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Window {}

impl DomObject for Window {
    fn interface(&self) -> DomInterface {
        DomInterface::Window
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl Document {
    pub fn default_view(&self) -> Window {
        Window {
            shared: self.shared.clone(),
        }
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }

    pub fn document_element(&self) -> Option<ElementHandle> {
        let node = self.shared.dom().document_element()?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn head(&self) -> Option<ElementHandle> {
        let node = self.shared.dom().head()?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn body(&self) -> Option<ElementHandle> {
        let node = self.shared.dom().body()?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementHandle> {
        let node = self.shared.dom().by_id(id)?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> HtmlCollection {
        let scope = self.shared.dom().root;
        HtmlCollection {
            shared: self.shared.clone(),
            scope,
            filter: CollectionFilter::ByTagName(tag.to_ascii_lowercase()),
        }
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let node = self.shared.dom().query_selector(selector)?;
        Ok(node.map(|node| ElementHandle {
            shared: self.shared.clone(),
            node,
        }))
    }

    pub fn create_element(&self, tag: &str) -> Result<ElementHandle> {
        let tag = tag.to_ascii_lowercase();
        if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(Error::InvalidOperation(format!("invalid tag name: {tag}")));
        }
        let node = self.shared.dom().create_detached_element(tag);
        Ok(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn create_text_node(&self, text: &str) -> NodeHandle {
        let node = self.shared.dom().create_detached_text(text.to_string());
        NodeHandle {
            shared: self.shared.clone(),
            node,
        }
    }

    pub fn child_nodes(&self) -> NodeList {
        let owner = self.shared.dom().root;
        NodeList {
            shared: self.shared.clone(),
            owner,
        }
    }

    pub fn text_content(&self) -> String {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.text_content(dom.root))
    }

    pub fn outer_html(&self) -> String {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.dump_node(dom.root))
    }

    pub fn as_node(&self) -> NodeHandle {
        let node = self.shared.dom().root;
        NodeHandle {
            shared: self.shared.clone(),
            node,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Document {}

impl DomObject for Document {
    fn interface(&self) -> DomInterface {
        DomInterface::HtmlDocument
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl NodeHandle {
    pub fn node_kind(&self) -> NodeKind {
        match self.shared.dom().nodes[self.node.0].node_type {
            NodeType::Document => NodeKind::Document,
            NodeType::Element(_) => NodeKind::Element,
            NodeType::Text(_) => NodeKind::Text,
        }
    }

    pub fn as_element(&self) -> Option<ElementHandle> {
        match self.node_kind() {
            NodeKind::Element => Some(ElementHandle {
                shared: self.shared.clone(),
                node: self.node,
            }),
            _ => None,
        }
    }

    pub fn text_content(&self) -> String {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.text_content(self.node))
    }

    pub fn parent_element(&self) -> Option<ElementHandle> {
        let dom = self.shared.dom();
        let parent = dom.parent(self.node)?;
        dom.element(parent)?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node: parent,
        })
    }

    pub fn child_nodes(&self) -> NodeList {
        NodeList {
            shared: self.shared.clone(),
            owner: self.node,
        }
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared) && self.node == other.node
    }
}

impl Eq for NodeHandle {}

impl DomObject for NodeHandle {
    fn interface(&self) -> DomInterface {
        match self.node_kind() {
            NodeKind::Document => DomInterface::HtmlDocument,
            NodeKind::Element => DomInterface::Element,
            NodeKind::Text => DomInterface::Text,
        }
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl ElementHandle {
    pub fn tag_name(&self) -> String {
        self.shared
            .dom()
            .tag_name(self.node)
            .unwrap_or_default()
            .to_string()
    }

    pub fn id(&self) -> String {
        self.get_attribute("id").unwrap_or_default()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.shared
            .dom()
            .element(self.node)
            .and_then(|element| element.attrs.get(&name).cloned())
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.shared.dom().set_attr(self.node, name, value)
    }

    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        self.shared.dom().remove_attr(self.node, name)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.shared
            .dom()
            .element(self.node)
            .map(|element| dom::has_class(element, class_name))
            .unwrap_or(false)
    }

    pub fn child_nodes(&self) -> NodeList {
        NodeList {
            shared: self.shared.clone(),
            owner: self.node,
        }
    }

    pub fn children(&self) -> HtmlCollection {
        HtmlCollection {
            shared: self.shared.clone(),
            scope: self.node,
            filter: CollectionFilter::ChildElements,
        }
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> HtmlCollection {
        HtmlCollection {
            shared: self.shared.clone(),
            scope: self.node,
            filter: CollectionFilter::ByTagName(tag.to_ascii_lowercase()),
        }
    }

    pub fn parent_element(&self) -> Option<ElementHandle> {
        self.as_node().parent_element()
    }

    pub fn append_child(&self, child: &NodeHandle) -> Result<()> {
        if !Arc::ptr_eq(&self.shared, &child.shared) {
            return Err(Error::InvalidNode(
                "node belongs to a different environment".into(),
            ));
        }
        self.shared.dom().append_child(self.node, child.node)
    }

    pub fn remove(&self) {
        self.shared.dom().detach(self.node);
    }

    pub fn replace_with(&self, new: &NodeHandle) -> Result<()> {
        if !Arc::ptr_eq(&self.shared, &new.shared) {
            return Err(Error::InvalidNode(
                "node belongs to a different environment".into(),
            ));
        }
        self.shared.dom().replace_node(self.node, new.node)
    }

    pub fn text_content(&self) -> String {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.text_content(self.node))
    }

    pub fn set_text_content(&self, value: &str) -> Result<()> {
        self.shared.dom().set_text_content(self.node, value)
    }

    pub fn inner_html(&self) -> Result<String> {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.inner_html(self.node))
    }

    pub fn set_inner_html(&self, html_source: &str) -> Result<()> {
        let mut dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || {
            dom.set_inner_html(self.node, html_source)
        })
    }

    pub fn outer_html(&self) -> String {
        let dom = self.shared.dom();
        stacker::grow(32 * 1024 * 1024, || dom.dump_node(self.node))
    }

    pub fn as_node(&self) -> NodeHandle {
        NodeHandle {
            shared: self.shared.clone(),
            node: self.node,
        }
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared) && self.node == other.node
    }
}

impl Eq for ElementHandle {}

impl DomObject for ElementHandle {
    fn interface(&self) -> DomInterface {
        DomInterface::Element
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl NodeList {
    pub fn length(&self) -> usize {
        self.shared.dom().nodes[self.owner.0].children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn item(&self, index: usize) -> Option<NodeHandle> {
        let node = self.shared.dom().nodes[self.owner.0]
            .children
            .get(index)
            .copied()?;
        Some(NodeHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn to_vec(&self) -> Vec<NodeHandle> {
        self.shared.dom().nodes[self.owner.0]
            .children
            .iter()
            .map(|node| NodeHandle {
                shared: self.shared.clone(),
                node: *node,
            })
            .collect()
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl PartialEq for NodeList {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared) && self.owner == other.owner
    }
}

impl Eq for NodeList {}

impl DomObject for NodeList {
    fn interface(&self) -> DomInterface {
        DomInterface::NodeList
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl HtmlCollection {
    fn matching_nodes(&self, dom: &Dom) -> Vec<NodeId> {
        match &self.filter {
            CollectionFilter::ChildElements => dom.child_elements(self.scope),
            CollectionFilter::ByTagName(tag) => {
                let mut all = Vec::new();
                stacker::grow(32 * 1024 * 1024, || {
                    dom.collect_element_descendants_dfs(self.scope, &mut all)
                });
                if tag == "*" {
                    all
                } else {
                    all.into_iter()
                        .filter(|node| {
                            dom.tag_name(*node)
                                .map(|node_tag| node_tag.eq_ignore_ascii_case(tag))
                                .unwrap_or(false)
                        })
                        .collect()
                }
            }
        }
    }

    pub fn length(&self) -> usize {
        let dom = self.shared.dom();
        self.matching_nodes(&dom).len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub fn item(&self, index: usize) -> Option<ElementHandle> {
        let dom = self.shared.dom();
        let node = self.matching_nodes(&dom).get(index).copied()?;
        Some(ElementHandle {
            shared: self.shared.clone(),
            node,
        })
    }

    pub fn to_vec(&self) -> Vec<ElementHandle> {
        let dom = self.shared.dom();
        self.matching_nodes(&dom)
            .into_iter()
            .map(|node| ElementHandle {
                shared: self.shared.clone(),
                node,
            })
            .collect()
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl PartialEq for HtmlCollection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
            && self.scope == other.scope
            && self.filter == other.filter
    }
}

impl Eq for HtmlCollection {}

impl DomObject for HtmlCollection {
    fn interface(&self) -> DomInterface {
        DomInterface::HtmlCollection
    }

    fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }
}

impl InterfaceHandle {
    pub fn interface(&self) -> DomInterface {
        self.interface
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.shared.id
    }

    pub fn is_instance(&self, object: &dyn DomObject) -> bool {
        object.environment_id() == self.shared.id && object.interface() == self.interface
    }
}

impl PartialEq for InterfaceHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared) && self.interface == other.interface
    }
}

impl Eq for InterfaceHandle {}
