use std::fmt::Debug;

use thiserror::Error;

use super::{EdgeLength, NodeId};

/// Errors that can occur when manipulating [`Node`] structs.
#[derive(Error, Debug)]
pub enum NodeError {
    /// We are trying to access the an unexisting child of the node
    #[error("Node {parent} does not have child {child}.")]
    HasNoChild {
        /// Id of the parent the parent node
        parent: NodeId,
        /// Id of the inexistant child node
        child: NodeId,
    },
}

#[derive(Clone)]
/// A node of the Tree
pub struct Node {
    /// Index of the node
    pub id: NodeId,
    /// Name of the node
    pub name: Option<String>,
    /// Index of the parent node
    pub parent: Option<NodeId>,
    /// Indices of child nodes
    pub children: Vec<NodeId>,
    /// length of branch between parent and node
    pub parent_edge: Option<EdgeLength>,
    /// Optional comment attached to node
    pub comment: Option<String>,
    // Whether the node is deleted or not
    pub(crate) deleted: bool,
}

impl Node {
    /// Creates a new Node
    pub fn new() -> Self {
        Self {
            id: 0,
            name: None,
            parent: None,
            children: vec![],
            parent_edge: None,
            comment: None,
            deleted: false,
        }
    }

    /// Creates a new named Node
    pub fn new_named(name: &str) -> Self {
        Self {
            name: Some(String::from(name)),
            ..Self::new()
        }
    }

    /// Sets the internal Node name
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Set the parent node
    pub fn set_parent(&mut self, parent: NodeId, parent_edge: Option<EdgeLength>) {
        self.parent = Some(parent);
        self.parent_edge = parent_edge;
    }

    /// Empties the node and sets it as deleted
    pub(crate) fn delete(&mut self) {
        *self = Self::new();
        self.deleted = true;
    }

    /// Adds a child to the node
    /// ```
    /// use mclade::tree::Node;
    ///
    /// let mut parent = Node::new();
    /// parent.id = 0;
    /// let mut child = Node::new();
    /// child.id = 1;
    ///
    /// child.set_parent(parent.id, Some(0.1));
    /// parent.add_child(child.id);
    ///
    /// assert_eq!(child.parent, Some(0));
    /// assert_eq!(parent.children, vec![1]);
    /// ```
    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    fn child_position(&self, child: &NodeId) -> Result<usize, NodeError> {
        self.children
            .iter()
            .position(|node_id| node_id == child)
            .ok_or(NodeError::HasNoChild {
                parent: self.id,
                child: *child,
            })
    }

    /// Removes the child from the node
    pub fn remove_child(&mut self, child: &NodeId) -> Result<(), NodeError> {
        let vec_index = self.child_position(child)?;
        self.children.remove(vec_index);

        Ok(())
    }

    /// Replaces a child of the node with another node, keeping
    /// the position of the child in the list of children.
    /// ```
    /// use mclade::tree::Node;
    ///
    /// let mut node = Node::new();
    /// node.add_child(1);
    /// node.add_child(2);
    /// node.add_child(3);
    ///
    /// node.replace_child(&2, 7).unwrap();
    /// assert_eq!(node.children, vec![1, 7, 3]);
    /// ```
    pub fn replace_child(&mut self, child: &NodeId, with: NodeId) -> Result<(), NodeError> {
        let vec_index = self.child_position(child)?;
        self.children[vec_index] = with;

        Ok(())
    }

    /// Check if the node is a tip node
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if the node is a root node
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn format_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn format_length(&self) -> String {
        self.parent_edge
            .map(|v| format!(":{v}"))
            .unwrap_or_default()
    }

    fn format_comment(&self) -> String {
        self.comment
            .clone()
            .map(|v| format!("[{v}]"))
            .unwrap_or_default()
    }

    /// Returns String with node in newick format
    pub fn to_newick(&self) -> String {
        self.format_name() + &self.format_length() + &self.format_comment()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.is_root() != other.is_root() {
            return false;
        }

        let parent_edges_equal = match (self.parent_edge, other.parent_edge) {
            (None, None) => true,
            (Some(l1), Some(l2)) => (l1 - l2).abs() < f64::EPSILON,
            _ => false,
        };

        self.name == other.name && self.children.len() == other.children.len() && parent_edges_equal
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Eq for Node {}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}) {:?} Id[{}] Parent[{:?}] Comments[{:?}] Children({:?})",
            self.parent_edge, self.name, self.id, self.parent, self.comment, self.children,
        )
    }
}
