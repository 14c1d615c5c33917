//! Candidate clades of the species tree.
//!
//! The catalog is built once from the species tree and holds every clade whose
//! number of species lies strictly between a lower and an upper fraction of
//! the total number of taxa. These are the clades that may be kept in a gene
//! tree when simulating missing data.

use itertools::Itertools;
use rand::Rng;
use tracing::{debug, info};

use crate::clade::Clade;
use crate::simulate::SimulationError;
use crate::tree::Tree;

/// Deduplicated set of candidate clades, never empty.
#[derive(Debug, Clone)]
pub struct CladeCatalog {
    clades: Vec<Clade>,
    total_taxa: usize,
}

impl CladeCatalog {
    /// Lists the clades below every internal node of the species tree with
    /// `total_taxa * lower < size < total_taxa * upper`.
    /// Clades are kept in the order they are first found in a preorder traversal.
    /// ```
    /// use mclade::catalog::CladeCatalog;
    /// use mclade::clade::Clade;
    /// use mclade::tree::Tree;
    ///
    /// let species = Tree::from_newick("((A,B),(C,D));").unwrap();
    /// let catalog = CladeCatalog::build(&species, 0.2, 1.0, '_').unwrap();
    ///
    /// assert_eq!(catalog.total_taxa(), 4);
    /// assert!(catalog.contains(&Clade::from_iter(["A", "B"])));
    /// assert!(catalog.contains(&Clade::from_iter(["C", "D"])));
    /// assert!(!catalog.contains(&Clade::from_iter(["A", "B", "C", "D"])));
    /// ```
    pub fn build(
        species: &Tree,
        lower: f64,
        upper: f64,
        separator: char,
    ) -> Result<Self, SimulationError> {
        let root = species.get_root()?;
        let total_taxa = species.get_clade(&root, separator)?.len();

        let min_size = total_taxa as f64 * lower;
        let max_size = total_taxa as f64 * upper;

        let mut candidates = vec![];
        for node in species.preorder(&root)? {
            for child in species.get(&node)?.children.iter() {
                let clade = species.get_clade(child, separator)?;
                let size = clade.len() as f64;
                if min_size < size && size < max_size {
                    candidates.push(clade);
                }
            }
        }

        let clades: Vec<_> = candidates.into_iter().unique().collect();
        if clades.is_empty() {
            return Err(SimulationError::EmptyCatalog {
                lower,
                upper,
                total_taxa,
            });
        }

        info!(
            "Found {} candidate clades among {total_taxa} taxa",
            clades.len()
        );
        for clade in clades.iter() {
            debug!("Candidate clade {clade}");
        }

        Ok(Self { clades, total_taxa })
    }

    /// Builds a catalog from an existing list of clades, duplicates are removed.
    pub fn from_clades(
        total_taxa: usize,
        clades: impl IntoIterator<Item = Clade>,
    ) -> Result<Self, SimulationError> {
        let clades: Vec<_> = clades.into_iter().unique().collect();
        if clades.is_empty() {
            return Err(SimulationError::EmptyCatalog {
                lower: 0.0,
                upper: 1.0,
                total_taxa,
            });
        }

        Ok(Self { clades, total_taxa })
    }

    /// Number of taxa in the species tree
    pub fn total_taxa(&self) -> usize {
        self.total_taxa
    }

    /// Number of candidate clades
    pub fn len(&self) -> usize {
        self.clades.len()
    }

    /// Always false, an empty catalog cannot be built
    pub fn is_empty(&self) -> bool {
        self.clades.is_empty()
    }

    /// Whether the clade is one of the candidates
    pub fn contains(&self, clade: &Clade) -> bool {
        self.clades.contains(clade)
    }

    /// Iterates over the candidate clades
    pub fn iter(&self) -> impl Iterator<Item = &Clade> {
        self.clades.iter()
    }

    /// Draws one of the candidate clades uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &Clade {
        &self.clades[rng.gen_range(0..self.clades.len())]
    }
}
