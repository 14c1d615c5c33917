//! Species clades of tree nodes.
//!
//! Leaf labels follow the `<species><separator><individual>` convention,
//! several individuals of the same species can therefore appear in a gene tree.
//! The clade of a node is the set of *species* found among the leaves below it.

use std::collections::BTreeSet;
use std::fmt::Display;

use itertools::Itertools;

use crate::tree::{NodeId, Tree, TreeError};

/// Returns the species part of a leaf label, i.e. everything before the first
/// occurence of `separator`.
/// ```
/// use mclade::clade::taxon_of;
///
/// assert_eq!(taxon_of("Homo_sapiens_2", '_'), "Homo");
/// assert_eq!(taxon_of("Pan", '_'), "Pan");
/// ```
pub fn taxon_of(label: &str, separator: char) -> &str {
    match label.split_once(separator) {
        Some((taxon, _)) => taxon,
        None => label,
    }
}

/// A set of species labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Clade(BTreeSet<String>);

impl Clade {
    /// Creates an empty clade
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Number of species in the clade
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the clade contains no species at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the species is part of the clade
    pub fn contains(&self, taxon: &str) -> bool {
        self.0.contains(taxon)
    }

    /// Whether the two clades share no species
    pub fn is_disjoint(&self, other: &Clade) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Iterates over the species of the clade in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Clade {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Display for Clade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

/// Methods to compute the species clades of the [`Tree`]
///
/// ----
/// ----
impl Tree {
    /// Computes the set of species found among the leaves below a node.
    /// The clade is computed from the current state of the tree every time
    /// this method is called. Unnamed leaves do not contribute any species.
    /// ```
    /// use mclade::tree::Tree;
    /// use mclade::clade::Clade;
    ///
    /// let tree = Tree::from_newick("((A_1,A_2)X,(B_1,C_1)Y)Z;").unwrap();
    /// let x = tree.get_by_name("X").unwrap().id;
    /// let root = tree.get_root().unwrap();
    ///
    /// assert_eq!(tree.get_clade(&x, '_').unwrap(), Clade::from_iter(["A"]));
    /// assert_eq!(tree.get_clade(&root, '_').unwrap().len(), 3);
    /// ```
    pub fn get_clade(&self, node: &NodeId, separator: char) -> Result<Clade, TreeError> {
        let mut clade = Clade::new();
        for leaf in self.get_subtree_leaves(node)? {
            if let Some(name) = self.get(&leaf)?.name.as_deref() {
                clade.0.insert(taxon_of(name, separator).to_string());
            }
        }

        Ok(clade)
    }

    /// Computes the clade of the root of the tree
    pub fn root_clade(&self, separator: char) -> Result<Clade, TreeError> {
        self.get_clade(&self.get_root()?, separator)
    }
}
