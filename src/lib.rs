#![warn(missing_docs)]
//! The `mclade` crate simulates missing taxa in gene trees, in order to
//! benchmark species tree estimation methods.
//!
//! Missing data follows the clade model: candidate clades are listed from a
//! reference species tree ([`catalog`]), then each selected gene tree is
//! restricted to one of these clades ([`prune`]) as long as enough taxa remain
//! ([`simulate`]).
//!
//! ```
//! use mclade::simulate::{Outcome, SimulationConfig, Simulator};
//! use mclade::tree::Tree;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let species = Tree::from_newick("((A,B),(C,D));").unwrap();
//! let config = SimulationConfig { lower: 0.3, missing: 1.0, ..Default::default() };
//! let simulator = Simulator::from_species_tree(&species, config).unwrap();
//!
//! let mut gene_tree = Tree::from_newick("((A_1,(B_1,C_1)),(D_1,A_2));").unwrap();
//! let outcome = simulator.simulate(&mut gene_tree, &mut StdRng::seed_from_u64(1)).unwrap();
//!
//! assert!(matches!(outcome, Outcome::Accepted { .. }));
//! assert_eq!(gene_tree.root_clade('_').unwrap().len(), 2);
//! ```

pub mod catalog;
pub mod clade;
pub mod prune;
pub mod simulate;
pub mod tree;

pub use catalog::CladeCatalog;
pub use clade::Clade;
pub use simulate::{Outcome, SimulationConfig, SimulationError, Simulator, Summary};
pub use tree::Tree;
