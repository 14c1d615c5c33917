//! Removal of the parts of a gene tree that lie outside of a target clade.

use tracing::trace;

use crate::clade::Clade;
use crate::tree::{Tree, TreeError};

/// Counts of the structural changes made by [`Tree::prune_to_clade`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Number of subtrees detached from their parent
    pub removed: usize,
    /// Number of unary nodes that were contracted
    pub contracted: usize,
}

impl PruneStats {
    /// Whether the pass left the tree untouched
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.contracted == 0
    }
}

/// Methods to restrict the [`Tree`] to a clade
///
/// ----
/// ----
impl Tree {
    /// Removes, in a single top-down pass, every subtree that shares no species
    /// with `target`. The children of each node are evaluated against the
    /// current state of the tree, then the node is contracted if it is left with
    /// a single child. The root is never contracted, it may keep a single child.
    ///
    /// The pass never judges the result: if no part of the tree belongs to the
    /// target, the root is left without any children.
    /// ```
    /// use mclade::clade::Clade;
    /// use mclade::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A,C),(B,D));").unwrap();
    /// tree.prune_to_clade(&Clade::from_iter(["A", "B"]), '_').unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "(A,B);");
    /// ```
    pub fn prune_to_clade(
        &mut self,
        target: &Clade,
        separator: char,
    ) -> Result<PruneStats, TreeError> {
        let mut stats = PruneStats::default();
        let mut stack = vec![self.get_root()?];

        while let Some(node) = stack.pop() {
            // Snapshot, children are removed while iterating
            let children = self.get(&node)?.children.clone();
            if children.is_empty() {
                continue;
            }

            for child in children {
                let clade = self.get_clade(&child, separator)?;
                if clade.is_disjoint(target) {
                    trace!("Removing subtree {child} with clade {clade}");
                    self.prune(&child)?;
                    stats.removed += 1;
                }
            }

            let node = self.get(&node)?;
            if node.children.len() == 1 && !node.is_root() {
                let id = node.id;
                stats.contracted += 1;
                stack.push(self.contract(&id)?);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clade(taxa: &[&str]) -> Clade {
        taxa.iter().copied().collect()
    }

    fn pruned(newick: &str, target: &[&str]) -> (String, PruneStats) {
        let mut tree = Tree::from_newick(newick).unwrap();
        let stats = tree.prune_to_clade(&clade(target), '_').unwrap();
        (tree.to_newick().unwrap(), stats)
    }

    #[test]
    fn removes_disjoint_branches() {
        let (newick, stats) = pruned("((A,(B,C)),D);", &["A", "B"]);
        assert_eq!(newick, "((A,B));");
        assert_eq!(
            stats,
            PruneStats {
                removed: 2,
                contracted: 1
            }
        );

        let (newick, _) = pruned("(((A,B),C),D);", &["A", "B"]);
        assert_eq!(newick, "((A,B));");
    }

    #[test]
    fn keeps_partially_intersecting_children() {
        let (newick, _) = pruned("((A_1,C_1)X,(B_1,D_1)Y,E_1)R;", &["A", "B"]);
        assert_eq!(newick, "(A_1,B_1)R;");

        let (newick, _) = pruned("((A_1,(C_1,B_1)Z)X,(D_1,E_1)Y)R;", &["A", "B", "C"]);
        assert_eq!(newick, "((A_1,(C_1,B_1)Z)X)R;");
    }

    #[test]
    fn individuals_share_species() {
        let (newick, _) = pruned("((A_1,(A_2,B_1)),(C_1,(A_3,D_1)));", &["A"]);
        assert_eq!(newick, "((A_1,A_2),A_3);");
    }

    #[test]
    fn branch_lengths_are_fused() {
        let (newick, _) = pruned("((A:1,(B:1,C:1):2):1,D:4);", &["A", "B"]);
        assert_eq!(newick, "((A:1,B:3):1);");

        let (newick, _) = pruned("((A:1,(B:1,C:1):2):1,D:4):0.5;", &["B"]);
        assert_eq!(newick, "(B:4):0.5;");
    }

    #[test]
    fn no_unary_nodes_left() {
        let cases = [
            ("((((A,B),C),D),E);", vec!["A", "C"]),
            ("(A,(B,(C,(D,(E,F)))));", vec!["F", "A"]),
            ("((A,(B)),((C)),(D,(E)));", vec!["B", "C", "E"]),
            ("((H)I,(A,(B,C)));", vec!["H", "B", "C"]),
        ];

        for (newick, target) in cases {
            let mut tree = Tree::from_newick(newick).unwrap();
            tree.prune_to_clade(&clade(&target), '_').unwrap();
            assert!(tree.unary_nodes().is_empty(), "{newick}");
            assert_eq!(tree.root_clade('_').unwrap(), clade(&target), "{newick}");
        }
    }

    #[test]
    fn second_pass_is_a_noop() {
        let cases = [
            ("(((A,B),C),D);", vec!["A", "B"]),
            ("((A_1,(A_2,B_1)),(C_1,(A_3,D_1)));", vec!["A", "D"]),
            ("((A,(B)),((C)),(D,(E)));", vec!["B", "C"]),
            ("(A,B);", vec!["C"]),
        ];

        for (newick, target) in cases {
            let target = clade(&target);
            let mut tree = Tree::from_newick(newick).unwrap();
            tree.prune_to_clade(&target, '_').unwrap();
            let once = tree.to_newick().unwrap();

            let stats = tree.prune_to_clade(&target, '_').unwrap();
            assert!(stats.is_noop(), "{newick}");
            assert_eq!(tree.to_newick().unwrap(), once, "{newick}");
        }
    }

    #[test]
    fn intersecting_every_branch_keeps_root_children() {
        let mut tree = Tree::from_newick("((A,B),(C,D),(E,F));").unwrap();
        let stats = tree.prune_to_clade(&clade(&["A", "C", "F"]), '_').unwrap();
        let root = tree.get_root().unwrap();

        assert_eq!(tree.get(&root).unwrap().children.len(), 3);
        assert_eq!(stats.removed, 3);
        assert_eq!(tree.to_newick().unwrap(), "(A,C,F);");
    }

    #[test]
    fn total_collapse() {
        let mut tree = Tree::from_newick("((A,B),(C,D));").unwrap();
        tree.prune_to_clade(&clade(&["E"]), '_').unwrap();
        let root = tree.get_root().unwrap();

        assert!(tree.get(&root).unwrap().children.is_empty());
        assert!(tree.root_clade('_').unwrap().is_empty());
    }

    #[test]
    fn single_leaf_stays_under_root() {
        let newick = "((A_1:1,B_1:1)X:1,(C_1:1,D_1:1)Y:1)R;";
        let mut tree = Tree::from_newick(newick).unwrap();
        let stats = tree.prune_to_clade(&clade(&["A"]), '_').unwrap();
        let root = tree.get_root().unwrap();

        assert_eq!(tree.to_newick().unwrap(), "(A_1:2)R;");
        assert_eq!(tree.get(&root).unwrap().children.len(), 1);
        assert_eq!(tree.root_clade('_').unwrap(), clade(&["A"]));
        assert_eq!(
            stats,
            PruneStats {
                removed: 2,
                contracted: 1
            }
        );
    }

    #[test]
    fn binary_trees_stay_binary() {
        let mut tree =
            Tree::from_newick("(((A_1,B_1),(C_1,A_2)),((D_1,(E_1,B_2)),(F_1,C_2)));").unwrap();
        tree.prune_to_clade(&clade(&["A", "B", "E"]), '_').unwrap();

        assert!(tree.is_binary());
        assert_eq!(tree.to_newick().unwrap(), "(((A_1,B_1),A_2),(E_1,B_2));");

        // Every live node is still reachable from the root
        let root = tree.get_root().unwrap();
        assert_eq!(tree.postorder(&root).unwrap().len(), tree.size());
        assert_eq!(tree.postorder(&root).unwrap().last(), Some(&root));
    }

    #[test]
    fn full_target_keeps_tree() {
        let newick = "((A:0.1,B:0.2)X:0.3,(C:0.4,D:0.5)Y:0.6)R;";
        let (pruned, stats) = pruned(newick, &["A", "B", "C", "D"]);
        assert_eq!(pruned, newick);
        assert!(stats.is_noop());
    }
}
