//! Arena-backed presentation fragment.
//!
//! A fragment is an ordered tree of element containers and text leaves owned
//! by one host component. Nodes live in a flat arena and refer to each other
//! by [`NodeId`]; removing a node only detaches it from its parent's child
//! list, so ids stay valid for the lifetime of the fragment.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::error::ClampError;

/// Index of a node inside a [`Fragment`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element attribute, stored unescaped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written in the markup.
    pub name: String,
    /// Decoded attribute value.
    pub value: String,
}

impl Attribute {
    /// Build an attribute from a name/value pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Payload of a fragment node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Container with ordered children (`<b>`, `<a>`, `<p>`, ...).
    Element {
        /// Lowercase tag name.
        tag: String,
        /// Attributes in source order.
        attrs: Vec<Attribute>,
    },
    /// Plain-text leaf.
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    detached: bool,
}

/// Ordered tree of containers and text leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Fragment {
    /// Create a fragment holding a single empty root element.
    pub fn new(root_tag: &str) -> Self {
        let root = Node {
            kind: NodeKind::Element {
                tag: root_tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
            parent: None,
            children: SmallVec::new(),
            detached: false,
        };
        Self {
            nodes: alloc::vec![root],
            root: NodeId(0),
        }
    }

    /// Root element id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total arena size, including detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the arena only holds the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append an element without attributes as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, ClampError> {
        self.append_element_with_attrs(parent, tag, Vec::new())
    }

    /// Append an element as the last child of `parent`.
    pub fn append_element_with_attrs(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: Vec<Attribute>,
    ) -> Result<NodeId, ClampError> {
        self.push_child(
            parent,
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs,
            },
        )
    }

    /// Append a text leaf as the last child of `parent`.
    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, ClampError> {
        self.push_child(parent, NodeKind::Text(text.into()))
    }

    fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, ClampError> {
        match self.nodes.get(parent.0).map(|node| &node.kind) {
            Some(NodeKind::Element { .. }) => {}
            Some(NodeKind::Text(_)) => {
                return Err(ClampError::new(
                    "FRAGMENT_TEXT_PARENT",
                    format!("node {} is a text leaf and cannot hold children", parent.0),
                ));
            }
            None => {
                return Err(ClampError::new(
                    "FRAGMENT_UNKNOWN_NODE",
                    format!("node {} is not part of this fragment", parent.0),
                ));
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: SmallVec::new(),
            detached: false,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Node payload.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    /// Element tag name, `None` for text leaves.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Element attributes, empty for text leaves.
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            Some(NodeKind::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    /// Text payload, `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    /// `true` when `id` names a text leaf.
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    /// Replace a text leaf's payload. Returns `false` for elements.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Text(text)) => {
                *text = value.into();
                true
            }
            _ => false,
        }
    }

    /// Attached children of `id` in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Last attached child of `id`.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Parent link. Detached nodes keep the link to their former parent.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// `true` when `id` and all of its ancestors are still in the tree.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current.0) else {
                return false;
            };
            if node.detached {
                return false;
            }
            cursor = node.parent;
        }
        true
    }

    /// Detach `id` from its parent. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if self.nodes[id.0].detached {
            return false;
        }
        self.nodes[parent.0].children.retain(|child| *child != id);
        self.nodes[id.0].detached = true;
        true
    }

    /// Re-insert a detached node as the last child of its nearest attached
    /// ancestor and return that ancestor.
    pub fn reattach_to_nearest_ancestor(&mut self, id: NodeId) -> Option<NodeId> {
        if id == self.root || id.0 >= self.nodes.len() {
            return None;
        }
        let mut ancestor = self.parent(id)?;
        while !self.is_attached(ancestor) {
            ancestor = self.parent(ancestor)?;
        }
        if let Some(old_parent) = self.parent(id) {
            self.nodes[old_parent.0].children.retain(|child| *child != id);
        }
        self.nodes[id.0].parent = Some(ancestor);
        self.nodes[id.0].detached = false;
        self.nodes[ancestor.0].children.push(id);
        Some(ancestor)
    }

    /// Attached text leaves in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = alloc::vec![self.root];
        while let Some(id) = stack.pop() {
            if self.is_text(id) {
                out.push(id);
                continue;
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all attached leaves in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for id in self.text_nodes() {
            if let Some(text) = self.text(id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Number of attached nodes, root included.
    pub fn attached_count(&self) -> usize {
        let mut count = 0usize;
        let mut stack: Vec<NodeId> = alloc::vec![self.root];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(id));
        }
        count
    }
}
