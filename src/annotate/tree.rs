//! Arena DOM used by the annotator
//!
//! The tree is built once from the html5ever parse that `scraper` produces.
//! Nodes own their ordered child lists; the parent link is a plain index, so
//! walking up never holds a borrow on the parent.
//!
//! Element and attribute names keep their html5ever [`QualName`], so the
//! tree serializes through `html5ever::serialize` with the namespace-aware
//! escaping and void-element rules of the parser it came from.

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::{Html, Node as ParsedNode};
use std::collections::VecDeque;
use std::io;

/// Index of a node inside a [`Document`]
pub type NodeId = usize;

/// An element's tag name and attributes, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualName,
    pub attrs: Vec<(QualName, String)>,
}

impl Element {
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// Value of the un-namespaced attribute `key`
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| is_plain_attr(k, key))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| is_plain_attr(k, key)) {
            Some(slot) => slot.1 = value,
            None => {
                let name = QualName::new(None, Namespace::from(""), LocalName::from(key));
                self.attrs.push((name, value));
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Comment(String),
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A parsed HTML document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parses a complete HTML document
    ///
    /// Parsing never fails: html5ever recovers from malformed markup the way a
    /// browser does, and always synthesizes `html`, `head` and `body`.
    pub fn parse(source: &str) -> Self {
        let parsed = Html::parse_document(source);
        let mut doc = Document {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
        };

        let mut pending = vec![(parsed.tree.root(), doc.root())];
        while let Some((source_node, id)) = pending.pop() {
            for child in source_node.children() {
                if let Some(kind) = convert(child.value()) {
                    let child_id = doc.push(id, kind);
                    pending.push((child, child_id));
                }
            }
        }

        doc
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Element children only, in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.element(child).is_some())
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(key))
    }

    /// Sets an attribute on an element; a no-op on other node kinds
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(key, value);
        }
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id)
            .map(|element| element.local_name().eq_ignore_ascii_case(name))
            .unwrap_or(false)
    }

    /// First element named `name` in breadth-first order below `from`
    pub fn find_element(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut queue: VecDeque<NodeId> = self.children(from).iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if self.is_element_named(id, name) {
                return Some(id);
            }
            queue.extend(self.children(id).iter().copied());
        }
        None
    }

    /// The root `<html>` element
    pub fn html_element(&self) -> Option<NodeId> {
        self.find_element(self.root(), "html")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_element(self.html_element()?, "body")
    }

    /// All elements strictly below `id`, in document (pre-)order
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.element_children(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mark = stack.len();
            stack.extend(self.element_children(node));
            stack[mark..].reverse();
        }
        out
    }

    /// Serializes the whole document back to HTML
    pub fn to_html(&self) -> String {
        let mut bytes = Vec::new();
        if let Err(e) = html5ever::serialize::serialize(&mut bytes, self, SerializeOpts::default())
        {
            tracing::warn!("Failed to serialize document: {}", e);
        }
        String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}

/// Walk step of [`Document`] serialization
enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let start = match traversal_scope {
            TraversalScope::IncludeNode => vec![self.root()],
            TraversalScope::ChildrenOnly(_) => self.children(self.root()).to_vec(),
        };
        let mut steps: Vec<Step> = start.into_iter().rev().map(Step::Open).collect();

        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(id) => {
                    if let Some(element) = self.element(id) {
                        serializer.end_elem(element.name.clone())?;
                    }
                    continue;
                }
            };

            match self.kind(id) {
                NodeKind::Document => {}
                NodeKind::Doctype { name, .. } => {
                    serializer.write_doctype(name)?;
                    continue;
                }
                NodeKind::Comment(text) => {
                    serializer.write_comment(text)?;
                    continue;
                }
                NodeKind::Text(text) => {
                    serializer.write_text(text)?;
                    continue;
                }
                NodeKind::Element(element) => {
                    serializer.start_elem(
                        element.name.clone(),
                        element.attrs.iter().map(|(k, v)| (k, v.as_str())),
                    )?;
                    steps.push(Step::Close(id));
                }
            }
            steps.extend(self.children(id).iter().rev().map(|&child| Step::Open(child)));
        }

        Ok(())
    }
}

fn is_plain_attr(name: &QualName, key: &str) -> bool {
    name.ns.is_empty() && &*name.local == key
}

fn convert(node: &ParsedNode) -> Option<NodeKind> {
    let kind = match node {
        ParsedNode::Doctype(doctype) => NodeKind::Doctype {
            name: doctype.name().to_string(),
            public_id: doctype.public_id().to_string(),
            system_id: doctype.system_id().to_string(),
        },
        ParsedNode::Comment(comment) => NodeKind::Comment(comment.comment.to_string()),
        ParsedNode::Text(text) => NodeKind::Text(text.text.to_string()),
        ParsedNode::Element(element) => NodeKind::Element(Element {
            name: element.name.clone(),
            attrs: element
                .attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        }),
        // The HTML parser never emits processing instructions; fragments
        // only appear when parsing fragments.
        _ => return None,
    };
    Some(kind)
}
