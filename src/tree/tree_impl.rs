use itertools::Itertools;
use std::{fs, path::Path};

use thiserror::Error;

use super::node::{Node, NodeError};
use super::{EdgeLength, NodeId};

/// Errors that can occur when reading, writing and manipulating [`Tree`] structs.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree is empty and we are trying to do something that require at least one node
    #[error("This tree is empty.")]
    IsEmpty,
    /// No root node was found in the tree and we are trying to do something
    /// that requires a root node
    #[error("No root node found")]
    RootNotFound,
    /// Some of the leaves in the tree have no name
    #[error("All your leaf nodes must be named.")]
    UnnamedLeaves,
    /// The requested node with index [`NodeId`] does not exist in the tree
    #[error("There is no node with index: {0}")]
    NodeNotFound(NodeId),
    /// The node with index [`NodeId`] could not be contracted
    #[error("Could not contract node {0}, it does not have exactly one parent and one child")]
    CouldNotContractNode(NodeId),
    /// There was a [`NodeError`] when operating on a node
    #[error("Could operate on Node")]
    NodeError(#[from] NodeError),
}

/// Errors that can occur when parsing newick files.
#[derive(Error, Debug)]
pub enum NewickParseError {
    /// There is whitespace in one of the branch lengths
    #[error("Cannot have whitespace in number field.")]
    WhiteSpaceInNumber,
    /// There is an unclosed bracket in the newick String
    #[error("Missing a closing bracket.")]
    UnclosedBracket,
    /// The newick string is missing a final semi-colon
    #[error("The tree is missing a semi colon at the end.")]
    NoClosingSemicolon,
    /// We are trying to close a subtre but have no parent node.
    #[error("Parent node of subtree not found")]
    NoSubtreeParent,
    /// The newick record does not contain any node
    #[error("Empty newick record")]
    EmptyRecord,
    /// There was a [`TreeError`] when building a tree fromthe newick string
    #[error("Problem with building the tree.")]
    TreeError(#[from] TreeError),
    /// There was a [`std::num::ParseFloatError`] when parsing branch lengths
    #[error("Could not parse a branch length")]
    FloatError(#[from] std::num::ParseFloatError),
    /// There was a [`std::io::Error`] when reading a newick file
    #[error("Problem reading file")]
    IoError(#[from] std::io::Error),
}

/// A Phylogenetic tree
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

/// Base methods to add and get [`Node`] objects to and from the [`Tree`].
///
/// ----
/// ----
impl Tree {
    /// Create a new empty Tree object
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    // ############################
    // # ADDING AND GETTING NODES #
    // ############################

    /// Add a new node to the tree.
    pub fn add(&mut self, node: Node) -> NodeId {
        let idx = self.nodes.len();
        let mut node = node;
        node.id = idx;
        self.nodes.push(node);

        idx
    }

    /// Add a child to one of the tree's nodes.
    ///
    /// # Example
    /// ```
    /// use mclade::tree::{Tree,Node};
    ///
    /// // Create the tree and add a root node
    /// let mut tree = Tree::new();
    /// let root_id = tree.add(Node::new());
    ///
    /// // Add children to the root
    /// let left = tree.add_child(Node::new(), root_id, None).unwrap();
    /// let right = tree.add_child(Node::new(), root_id, Some(0.1)).unwrap();
    ///
    /// assert_eq!(tree.get(&root_id).unwrap().children, vec![left, right]);
    /// assert_eq!(tree.get(&right).unwrap().parent_edge, Some(0.1));
    /// ```
    pub fn add_child(
        &mut self,
        node: Node,
        parent: NodeId,
        edge: Option<EdgeLength>,
    ) -> Result<NodeId, TreeError> {
        self.get(&parent)?;

        let mut node = node;
        node.set_parent(parent, edge);

        let id = self.add(node);
        self.get_mut(&parent)?.add_child(id);

        Ok(id)
    }

    /// Get a reference to a specific Node of the tree
    pub fn get(&self, id: &NodeId) -> Result<&Node, TreeError> {
        match self.nodes.get(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Get a mutable reference to a specific Node of the tree
    pub fn get_mut(&mut self, id: &NodeId) -> Result<&mut Node, TreeError> {
        match self.nodes.get_mut(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Get a reference to a node in the tree by name.
    /// Note that this does not check for name unicity, if several nodes
    /// match a name this funciton will return the first match in the tree.
    /// ```
    /// use mclade::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_idx = tree.add(Node::new_named("root"));
    /// let child_idx = tree.add_child(Node::new_named("child"), root_idx, None).unwrap();
    ///
    /// assert_eq!(tree.get_by_name("child"), Some(tree.get(&child_idx).unwrap()));
    /// ```
    pub fn get_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| !node.deleted && node.name.as_deref() == Some(name))
    }

    /// Gets the root node, i.e. the only live node without a parent.
    pub fn get_root(&self) -> Result<NodeId, TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::IsEmpty);
        }
        self.nodes
            .iter()
            .find(|&node| !node.deleted && node.parent.is_none())
            .map(|node| node.id)
            .ok_or(TreeError::RootNotFound)
    }

    /// Returns a [`Vec`] containing the Node IDs of leaf nodes of the tree
    /// ```
    /// use mclade::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_idx = tree.add(Node::new());
    /// let left = tree.add_child(Node::new(), root_idx, None).unwrap();
    /// let right = tree.add_child(Node::new(), root_idx, None).unwrap();
    ///
    /// assert_eq!(tree.get_leaves(), vec![left, right]);
    /// ```
    pub fn get_leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|&node| !node.deleted && node.is_tip())
            .map(|node| node.id)
            .collect()
    }

    /// Gets the node ids of all the nodes in the subtree rooted at the specified node
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
    /// let sub_root = tree.get_by_name("E").unwrap();
    /// let subtree: Vec<_> = tree.get_subtree(&sub_root.id)
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(subtree, vec!["E", "C", "D"])
    /// ```
    pub fn get_subtree(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![*root];

        for child in self.get(root)?.children.iter() {
            indices.extend(self.get_subtree(child)?);
        }

        Ok(indices)
    }

    /// Gets the node ids of all the leaves in the subtree rooted at the specified node
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
    /// let sub_root = tree.get_by_name("E").unwrap();
    /// let sub_leaves: Vec<_> = tree.get_subtree_leaves(&sub_root.id)
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(sub_leaves, vec!["C", "D"])
    /// ```
    pub fn get_subtree_leaves(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut leaves = vec![];
        for id in self.get_subtree(root)? {
            if self.get(&id)?.is_tip() {
                leaves.push(id);
            }
        }

        Ok(leaves)
    }
}

/// Methods to traverse the [`Tree`]
///
/// ----
/// ----
impl Tree {
    // ###################
    // # TREE TRAVERSALS #
    // ###################

    /// Returns a vector containing node ids in the same order as the
    /// [preorder](https://en.wikipedia.org/wiki/Tree_traversal#Pre-order,_NLR) tree traversal
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let preorder: Vec<_> = tree.preorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(preorder, vec!["F", "B", "A", "D", "C", "E", "G", "I", "H"])
    /// ```
    pub fn preorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![*root];
        for child in self.get(root)?.children.iter() {
            indices.extend(self.preorder(child)?)
        }

        Ok(indices)
    }

    /// Returns a vector containing node ids in the same order as the
    /// [postorder](https://en.wikipedia.org/wiki/Tree_traversal#Post-order,_LRN) tree traversal
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let postorder: Vec<_> = tree.postorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(postorder, vec!["A", "C", "E", "D", "B", "H", "I", "G", "F"])
    /// ```
    pub fn postorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![];
        for child in self.get(root)?.children.iter() {
            indices.extend(self.postorder(child)?)
        }
        indices.push(*root);

        Ok(indices)
    }
}

/// Methods that compute characteristics and measures to describe the [`Tree`]
///
/// ----
/// ----
impl Tree {
    // #######################################
    // # GETTING CHARACTERISTICS OF THE TREE #
    // #######################################

    /// Returns the number of nodes in the tree
    pub fn size(&self) -> usize {
        self.nodes.iter().filter(|&node| !node.deleted).count()
    }

    /// Returns the number of leaves in the tree
    pub fn n_leaves(&self) -> usize {
        self.get_leaves().len()
    }

    /// Check if no node of the tree has more than two children
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// assert!(Tree::from_newick("((A,B),C);").unwrap().is_binary());
    /// assert!(!Tree::from_newick("(A,B,C);").unwrap().is_binary());
    /// ```
    pub fn is_binary(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.deleted || node.children.len() <= 2)
    }

    /// Checks that every tip of the tree carries a name.
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// assert!(Tree::from_newick("(A,(B,C));").unwrap().check_named_leaves().is_ok());
    /// assert!(Tree::from_newick("(A,(,C));").unwrap().check_named_leaves().is_err());
    /// ```
    pub fn check_named_leaves(&self) -> Result<(), TreeError> {
        for leaf in self.get_leaves() {
            if self.get(&leaf)?.name.is_none() {
                return Err(TreeError::UnnamedLeaves);
            }
        }

        Ok(())
    }

    /// Returns the ids of internal nodes (root excluded) that have exactly one child.
    pub fn unary_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| !node.deleted && !node.is_root() && node.children.len() == 1)
            .map(|node| node.id)
            .collect()
    }
}

/// Methods to modify the [`Tree`]
///
/// ----
/// ----
impl Tree {
    // ##################
    // # ALTER THE TREE #
    // ##################

    /// Prune the subtree starting at a given root node.
    /// # Example
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let root_idx = tree.get_by_name("G").unwrap().id;
    ///
    /// tree.prune(&root_idx).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "((A,(C,E)D)B)F;")
    /// ```
    pub fn prune(&mut self, root: &NodeId) -> Result<(), TreeError> {
        for child in self.get(root)?.children.clone() {
            self.prune(&child)?
        }

        if let Some(parent) = self.get(root)?.parent {
            self.get_mut(&parent)?.remove_child(root)?;
        }

        self.get_mut(root)?.delete();

        Ok(())
    }

    /// Contract a node that has a parent and exactly one child: the child takes
    /// the place of the node under the node's parent, and the branch lengths are
    /// fused. The root cannot be contracted.
    /// Returns the id of the child that replaced the contracted node.
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A:1,(C:1,E:1)D:1)B:1,((H:1)I:1)G:1)F;").unwrap();
    /// let i = tree.get_by_name("I").unwrap().id;
    /// tree.contract(&i).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "((A:1,(C:1,E:1)D:1)B:1,(H:2)G:1)F;");
    ///
    /// let mut tree = Tree::from_newick("((A,B)C)D;").unwrap();
    /// let root = tree.get_root().unwrap();
    /// assert!(tree.contract(&root).is_err());
    /// ```
    pub fn contract(&mut self, id: &NodeId) -> Result<NodeId, TreeError> {
        let node = self.get(id)?;
        let (Some(parent), &[child]) = (node.parent, node.children.as_slice()) else {
            return Err(TreeError::CouldNotContractNode(*id));
        };

        let new_edge = match (node.parent_edge, self.get(&child)?.parent_edge) {
            (Some(p), c) => Some(p + c.unwrap_or(0.0)),
            (None, c) => c,
        };
        self.get_mut(&child)?.set_parent(parent, new_edge);
        self.get_mut(&parent)?.replace_child(id, child)?;

        self.get_mut(id)?.delete();

        Ok(child)
    }
}

/// Methods to read and write [`Tree`] objects to and from files or [`String`] objects.
///
/// ----
/// ----
impl Tree {
    // ########################
    // # READ AND WRITE TREES #
    // ########################

    /// Generate newick representation of tree
    fn to_newick_impl(&self, root: &NodeId) -> Result<String, TreeError> {
        let root = self.get(root)?;
        if root.children.is_empty() {
            Ok(root.to_newick())
        } else {
            let children: Vec<String> = root
                .children
                .iter()
                .map(|child_idx| self.to_newick_impl(child_idx))
                .collect::<Result<_, _>>()?;

            Ok(format!("({}){}", children.join(","), root.to_newick()))
        }
    }

    /// Writes the tree as a newick formatted string
    /// # Example
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F:0.6;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), newick);
    /// ```
    pub fn to_newick(&self) -> Result<String, TreeError> {
        let root = self.get_root()?;
        Ok(self.to_newick_impl(&root)? + ";")
    }

    /// Read a newick formatted string and build a [`Tree`] struct from it.
    /// Only the first record of the string is read, use
    /// [`Tree::from_newick_multi`] to read several trees.
    /// # Example
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.size(), 6);
    /// assert_eq!(tree.n_leaves(), 4);
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, NewickParseError> {
        #[derive(Debug, PartialEq)]
        enum Field {
            Name,
            Length,
            Comment,
        }

        fn push_or_init(field: &mut Option<String>, c: char) {
            match field.as_mut() {
                Some(value) => value.push(c),
                None => *field = Some(c.into()),
            }
        }

        let mut tree = Tree::new();

        let mut parsing = Field::Name;
        let mut current_name: Option<String> = None;
        let mut current_length: Option<String> = None;
        let mut current_comment: Option<String> = None;
        let mut current_index: Option<NodeId> = None;
        let mut parent_stack: Vec<NodeId> = Vec::new();

        let mut open_delimiters = Vec::new();
        let mut within_quotes = false;

        for c in newick.chars() {
            // Add character in quotes to name
            if within_quotes && parsing == Field::Name && c != '"' {
                push_or_init(&mut current_name, c);
                continue;
            }

            // Add current character to comment
            if parsing == Field::Comment && c != ']' {
                push_or_init(&mut current_comment, c);
                continue;
            }

            // Skip unquoted whitespace
            if c.is_whitespace() && !within_quotes {
                continue;
            }

            match c {
                '"' => {
                    // Enter or close quoted section (name)
                    within_quotes = !within_quotes;
                    if parsing == Field::Name {
                        push_or_init(&mut current_name, c);
                    }
                }
                '[' => {
                    parsing = Field::Comment;
                }
                ']' => {
                    parsing = Field::Name;
                }
                '(' => {
                    // Start subtree
                    match parent_stack.last() {
                        None => parent_stack.push(tree.add(Node::new())),
                        Some(parent) => {
                            parent_stack.push(tree.add_child(Node::new(), *parent, None)?)
                        }
                    };
                    open_delimiters.push(0);
                }
                ':' => {
                    // Start parsing length
                    parsing = Field::Length;
                }
                ',' | ')' => {
                    // Finish the current node, either a sibling follows or the subtree is closed
                    let index = match current_index {
                        Some(index) => index,
                        None => match parent_stack.last() {
                            Some(parent) => tree.add_child(Node::new(), *parent, None)?,
                            None => return Err(NewickParseError::NoSubtreeParent),
                        },
                    };

                    let edge = match current_length.take() {
                        Some(length) => Some(length.parse()?),
                        None => None,
                    };

                    let node = tree.get_mut(&index)?;
                    if let Some(name) = current_name.take() {
                        node.set_name(name);
                    }
                    node.parent_edge = edge;
                    node.comment = current_comment.take();

                    parsing = Field::Name;
                    current_index = None;

                    if c == ')' {
                        if open_delimiters.pop().is_none() {
                            return Err(NewickParseError::NoSubtreeParent);
                        }
                        match parent_stack.pop() {
                            Some(parent) => current_index = Some(parent),
                            None => return Err(NewickParseError::NoSubtreeParent),
                        }
                    }
                }
                ';' => {
                    // Finish parsing the Tree
                    if !open_delimiters.is_empty() {
                        return Err(NewickParseError::UnclosedBracket);
                    }

                    let index = match current_index {
                        Some(index) => index,
                        // Single node tree
                        None if tree.nodes.is_empty() && current_name.is_some() => {
                            tree.add(Node::new())
                        }
                        None => return Err(NewickParseError::EmptyRecord),
                    };

                    let node = tree.get_mut(&index)?;
                    node.name = current_name;
                    node.comment = current_comment;
                    if let Some(length) = current_length {
                        node.parent_edge = Some(length.parse()?);
                    }

                    return Ok(tree);
                }
                _ => {
                    // Parse characters in fields
                    match parsing {
                        Field::Name => push_or_init(&mut current_name, c),
                        Field::Length => {
                            if c.is_whitespace() {
                                return Err(NewickParseError::WhiteSpaceInNumber);
                            }
                            push_or_init(&mut current_length, c)
                        }
                        Field::Comment => unreachable!("comments are consumed above"),
                    };
                }
            }
        }

        Err(NewickParseError::NoClosingSemicolon)
    }

    /// Read all the newick records of a string, in order. Records are
    /// delimited by `;` characters outside of quoted names and comments.
    /// # Example
    /// ```
    /// use mclade::tree::Tree;
    ///
    /// let trees = Tree::from_newick_multi("(A,B);\n((A,C),B);\n").unwrap();
    /// assert_eq!(trees.len(), 2);
    /// assert_eq!(trees[1].to_newick().unwrap(), "((A,C),B);");
    /// ```
    pub fn from_newick_multi(newick: &str) -> Result<Vec<Self>, NewickParseError> {
        let mut records = vec![];
        let mut start = 0;
        let mut within_quotes = false;
        let mut within_comment = false;

        for (i, c) in newick.char_indices() {
            match c {
                '"' if !within_comment => within_quotes = !within_quotes,
                '[' if !within_quotes => within_comment = true,
                ']' if !within_quotes => within_comment = false,
                ';' if !within_quotes && !within_comment => {
                    let record = &newick[start..=i];
                    if !record[..record.len() - 1].trim().is_empty() {
                        records.push(record);
                    }
                    start = i + 1;
                }
                _ => {}
            }
        }

        if !newick[start..].trim().is_empty() {
            return Err(NewickParseError::NoClosingSemicolon);
        }

        records.into_iter().map(Self::from_newick).collect()
    }

    /// Reads all the trees of a newick file
    pub fn from_file_multi(path: &Path) -> Result<Vec<Self>, NewickParseError> {
        let newick_string = fs::read_to_string(path)?;
        Self::from_newick_multi(&newick_string)
    }

    /// Names of the leaves of the tree, unnamed leaves are skipped
    pub fn leaf_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|&node| !node.deleted && node.is_tip())
            .filter_map(|node| node.name.as_deref())
            .collect()
    }

    /// Comma separated list of the tree's leaf names, used in log messages
    pub(crate) fn leaf_summary(&self) -> String {
        self.leaf_names().iter().join(",")
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
