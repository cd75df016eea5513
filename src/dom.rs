use std::collections::HashMap;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) id_index: HashMap<String, NodeId>,
    pub(crate) trace_logs: Vec<String>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
            trace_logs: Vec::new(),
        }
    }

    pub(crate) fn trace(&mut self, message: impl Into<String>) {
        self.trace_logs.push(message.into());
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = ElementData { tag_name, attrs };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self
            .element(id)
            .and_then(|element| element.attrs.get("id").cloned())
        {
            if !id_attr.is_empty() {
                self.id_index.insert(id_attr, id);
            }
        }
        id
    }

    pub(crate) fn create_detached_element(&mut self, tag_name: String) -> NodeId {
        let element = ElementData {
            tag_name,
            attrs: HashMap::new(),
        };
        self.create_node(None, NodeType::Element(element))
    }

    pub(crate) fn create_detached_text(&mut self, text: String) -> NodeId {
        self.create_node(None, NodeType::Text(text))
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&ElementData> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        matches!(
            self.nodes[node_id.0].node_type,
            NodeType::Document | NodeType::Element(_)
        )
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::InvalidNode(
                "text content target is not an element".into(),
            ));
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::InvalidNode("attribute target is not an element".into()))?;
        element.attrs.insert(name.clone(), value.to_string());
        if name == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::InvalidNode("attribute target is not an element".into()))?;
        element.attrs.remove(&name);
        if name == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn inner_html(&self, node_id: NodeId) -> Result<String> {
        if self.element(node_id).is_none() {
            return Err(Error::InvalidNode(
                "innerHTML target is not an element".into(),
            ));
        }
        let mut out = String::new();
        for child in &self.nodes[node_id.0].children {
            out.push_str(&self.dump_node(*child));
        }
        Ok(out)
    }

    pub(crate) fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::InvalidNode(
                "innerHTML target is not an element".into(),
            ));
        }

        let fragment = crate::html::parse_fragment(html)?;

        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }

        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            let _ = self.clone_subtree_from_dom(&fragment, child, Some(node_id))?;
        }

        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn clone_subtree_from_dom(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let node_type = match &source.nodes[source_node.0].node_type {
            NodeType::Document => {
                return Err(Error::InvalidNode(
                    "cannot clone a document node into an element".into(),
                ));
            }
            NodeType::Element(element) => NodeType::Element(element.clone()),
            NodeType::Text(text) => NodeType::Text(text.clone()),
        };

        let node = self.create_node(parent, node_type);
        for child in &source.nodes[source_node.0].children {
            let _ = self.clone_subtree_from_dom(source, *child, Some(node))?;
        }
        Ok(node)
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::InvalidOperation(
                "append target cannot have children".into(),
            ));
        }
        if child == self.root || child == parent {
            return Err(Error::InvalidNode("invalid node to append".into()));
        }
        if !self.is_valid_node(child) {
            return Err(Error::InvalidNode("append node is invalid".into()));
        }

        // Parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::InvalidOperation(
                    "append would create a cycle".into(),
                ));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let reference = self
            .nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|id| *id != child);
        if let Some(reference) = reference {
            self.insert_before(parent, child, reference)
        } else {
            self.append_child(parent, child)
        }
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::InvalidOperation(
                "insert target cannot have children".into(),
            ));
        }
        if child == self.root || child == parent {
            return Err(Error::InvalidNode("invalid node to insert".into()));
        }
        if !self.is_valid_node(child) || !self.is_valid_node(reference) {
            return Err(Error::InvalidNode("insert node is invalid".into()));
        }
        if self.parent(reference) != Some(parent) {
            return Err(Error::InvalidOperation(
                "insert reference is not a direct child".into(),
            ));
        }
        if child == reference {
            return Ok(());
        }

        // Parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::InvalidOperation(
                    "insert would create a cycle".into(),
                ));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
            .ok_or_else(|| Error::InvalidOperation("insert reference disappeared".into()))?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(position, child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::InvalidOperation(
                "remove target is not a direct child".into(),
            ));
        }
        self.detach(child);
        Ok(())
    }

    pub(crate) fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.nodes[parent.0].children.retain(|id| *id != node);
            self.nodes[node.0].parent = None;
            self.rebuild_id_index();
        }
    }

    pub(crate) fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let parent = self
            .parent(old)
            .ok_or_else(|| Error::InvalidOperation("replace target has no parent".into()))?;
        if old == new {
            return Ok(());
        }
        self.insert_before(parent, new, old)?;
        self.detach(old);
        Ok(())
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut next = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            match &self.nodes[node.0].node_type {
                NodeType::Element(element) => {
                    if let Some(id) = element.attrs.get("id") {
                        if !id.is_empty() {
                            next.insert(id.clone(), node);
                        }
                    }
                }
                NodeType::Document | NodeType::Text(_) => {}
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = next;
    }

    pub(crate) fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.nodes[node_id.0].node_type, NodeType::Element(_)) {
            out.push(node_id);
        }
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn collect_element_descendants_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        stacker::grow(32 * 1024 * 1024, || {
            self.collect_elements_dfs(self.root, &mut out)
        });
        out
    }

    pub(crate) fn child_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes[node_id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub(crate) fn first_element_child(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0]
            .children
            .iter()
            .copied()
            .find(|child| self.element(*child).is_some())
    }

    fn child_element_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        self.child_elements(node_id).into_iter().find(|child| {
            self.tag_name(*child)
                .map(|child_tag| child_tag.eq_ignore_ascii_case(tag))
                .unwrap_or(false)
        })
    }

    pub(crate) fn document_element(&self) -> Option<NodeId> {
        self.first_element_child(self.root)
    }

    pub(crate) fn head(&self) -> Option<NodeId> {
        if let Some(document_element) = self.document_element() {
            if self
                .tag_name(document_element)
                .map(|tag| tag.eq_ignore_ascii_case("html"))
                .unwrap_or(false)
            {
                return self.child_element_by_tag(document_element, "head");
            }
        }
        self.first_element_by_tag("head")
    }

    pub(crate) fn body(&self) -> Option<NodeId> {
        if let Some(document_element) = self.document_element() {
            if self
                .tag_name(document_element)
                .map(|tag| tag.eq_ignore_ascii_case("html"))
                .unwrap_or(false)
            {
                return self
                    .child_elements(document_element)
                    .into_iter()
                    .find(|child| self.is_body_like(*child));
            }
        }
        self.all_element_nodes()
            .into_iter()
            .find(|node| self.is_body_like(*node))
    }

    fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.all_element_nodes().into_iter().find(|node| {
            self.tag_name(*node)
                .map(|node_tag| node_tag.eq_ignore_ascii_case(tag))
                .unwrap_or(false)
        })
    }

    fn is_body_like(&self, node_id: NodeId) -> bool {
        self.tag_name(node_id)
            .map(|tag| tag.eq_ignore_ascii_case("body") || tag.eq_ignore_ascii_case("frameset"))
            .unwrap_or(false)
    }

    fn is_blank_text(&self, node_id: NodeId) -> bool {
        match &self.nodes[node_id.0].node_type {
            NodeType::Text(text) => text.chars().all(char::is_whitespace),
            _ => false,
        }
    }

    fn is_shell_tag(&self, node_id: NodeId) -> bool {
        self.tag_name(node_id)
            .map(|tag| {
                tag.eq_ignore_ascii_case("head")
                    || tag.eq_ignore_ascii_case("body")
                    || tag.eq_ignore_ascii_case("frameset")
            })
            .unwrap_or(false)
    }

    fn is_head_only_element(&self, node_id: NodeId) -> bool {
        self.tag_name(node_id)
            .map(|tag| {
                matches!(
                    tag.to_ascii_lowercase().as_str(),
                    "title" | "meta" | "link" | "base" | "style"
                )
            })
            .unwrap_or(false)
    }

    pub(crate) fn normalize_document_shell(&mut self) -> Result<()> {
        let html_element = match self.root_level_html_element() {
            Some(element) => element,
            None => {
                let element = self.create_element(self.root, "html".to_string(), HashMap::new());
                self.trace("document shell: implied html element");
                element
            }
        };

        // First hop: everything at root level moves under the html element;
        // the second loop settles non-shell nodes into head or body and is
        // the one that counts them.
        let root_children = self.nodes[self.root.0].children.clone();
        for child in root_children {
            if child == html_element {
                continue;
            }
            if self.is_blank_text(child) {
                self.detach(child);
                continue;
            }
            self.append_child(html_element, child)?;
        }

        let head = match self.child_element_by_tag(html_element, "head") {
            Some(head) => head,
            None => {
                let head = self.create_element(html_element, "head".to_string(), HashMap::new());
                self.prepend_child(html_element, head)?;
                self.trace("document shell: implied head element");
                head
            }
        };

        let body = match self
            .child_elements(html_element)
            .into_iter()
            .find(|child| self.is_body_like(*child))
        {
            Some(body) => body,
            None => {
                let body = self.create_element(html_element, "body".to_string(), HashMap::new());
                self.trace("document shell: implied body element");
                body
            }
        };

        let mut moved = 0usize;
        let shell_children = self.nodes[html_element.0].children.clone();
        for child in shell_children {
            if child == head || child == body || self.is_shell_tag(child) {
                continue;
            }
            if self.is_blank_text(child) {
                self.detach(child);
                continue;
            }
            let target = if self.is_head_only_element(child) {
                head
            } else {
                body
            };
            self.append_child(target, child)?;
            moved += 1;
        }

        if moved > 0 {
            self.trace(format!("document shell: moved {moved} stray node(s)"));
        }
        Ok(())
    }

    fn root_level_html_element(&self) -> Option<NodeId> {
        self.child_elements(self.root).into_iter().find(|child| {
            self.tag_name(*child)
                .map(|tag| tag.eq_ignore_ascii_case("html"))
                .unwrap_or(false)
        })
    }

    pub(crate) fn normalize_single_head_element(&mut self) -> Result<()> {
        let Some(document_element) = self.document_element() else {
            return Ok(());
        };
        if !self
            .tag_name(document_element)
            .map(|tag| tag.eq_ignore_ascii_case("html"))
            .unwrap_or(false)
        {
            return Ok(());
        }

        let head_children = self
            .child_elements(document_element)
            .into_iter()
            .filter(|child| {
                self.tag_name(*child)
                    .map(|tag| tag.eq_ignore_ascii_case("head"))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        if head_children.len() <= 1 {
            return Ok(());
        }

        let primary_head = head_children[0];
        let extra_count = head_children.len() - 1;
        for extra_head in head_children.into_iter().skip(1) {
            let children = self.nodes[extra_head.0].children.clone();
            for child in children {
                self.append_child(primary_head, child)?;
            }
            self.remove_child(document_element, extra_head)?;
        }
        self.trace(format!("merged {extra_count} extra head element(s)"));

        Ok(())
    }

    pub(crate) fn normalize_single_body_element(&mut self) -> Result<()> {
        let Some(document_element) = self.document_element() else {
            return Ok(());
        };
        if !self
            .tag_name(document_element)
            .map(|tag| tag.eq_ignore_ascii_case("html"))
            .unwrap_or(false)
        {
            return Ok(());
        }

        let body_like_children = self
            .child_elements(document_element)
            .into_iter()
            .filter(|child| self.is_body_like(*child))
            .collect::<Vec<_>>();
        if body_like_children.len() <= 1 {
            return Ok(());
        }

        let primary_body = body_like_children[0];
        let extra_count = body_like_children.len() - 1;
        for extra_body in body_like_children.into_iter().skip(1) {
            let children = self.nodes[extra_body.0].children.clone();
            for child in children {
                self.append_child(primary_body, child)?;
            }
            self.remove_child(document_element, extra_body)?;
        }
        self.trace(format!("merged {extra_count} extra body element(s)"));

        Ok(())
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                // Stable attribute order so serialized output is deterministic.
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_by(|a, b| a.0.cmp(b.0));
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(v);
                    out.push('"');
                }
                out.push('>');
                if crate::html::is_void_tag(&element.tag_name)
                    && self.nodes[node_id.0].children.is_empty()
                {
                    return out;
                }
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let parsed = parse_simple_selector(selector)?;
        Ok(self
            .all_element_nodes()
            .into_iter()
            .find(|node| self.matches_simple_selector(*node, &parsed)))
    }

    fn matches_simple_selector(&self, node_id: NodeId, selector: &SimpleSelector) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if let Some(tag) = &selector.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &selector.id {
            if element.attrs.get("id").map(String::as_str) != Some(id.as_str()) {
                return false;
            }
        }
        selector
            .classes
            .iter()
            .all(|class| has_class(element, class))
    }
}

pub(crate) fn has_class(element: &ElementData, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn parse_simple_selector(selector: &str) -> Result<SimpleSelector> {
    let trimmed = selector.trim();
    if trimmed.is_empty()
        || trimmed.chars().any(char::is_whitespace)
        || trimmed.contains(['>', '+', '~', '[', ']', ':', ','])
    {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }

    let chars = trimmed.chars().collect::<Vec<_>>();
    let mut tag = None;
    let mut id = None;
    let mut classes = Vec::new();
    let mut i = 0usize;

    if chars[0] != '#' && chars[0] != '.' {
        let start = i;
        while i < chars.len() && chars[i] != '#' && chars[i] != '.' {
            i += 1;
        }
        let name = chars[start..i].iter().collect::<String>();
        if name != "*" {
            tag = Some(name.to_ascii_lowercase());
        }
    }

    while i < chars.len() {
        let marker = chars[i];
        i += 1;
        let start = i;
        while i < chars.len() && chars[i] != '#' && chars[i] != '.' {
            i += 1;
        }
        let name = chars[start..i].iter().collect::<String>();
        if name.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        match marker {
            '#' => id = Some(name),
            '.' => classes.push(name),
            _ => return Err(Error::UnsupportedSelector(selector.to_string())),
        }
    }

    Ok(SimpleSelector { tag, id, classes })
}
