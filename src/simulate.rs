//! Simulation of clade-based missing data in gene trees.
//!
//! Each eligible gene tree is restricted to a candidate clade drawn at random
//! from a [`CladeCatalog`]. When the restriction leaves too few taxa another
//! clade is tried, starting over from the original gene tree, and the gene tree
//! is left untouched if every try fails.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::CladeCatalog;
use crate::clade::Clade;
use crate::tree::{Tree, TreeError};

/// Errors that can occur when setting up a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    /// One of the simulation parameters is out of its range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// No clade of the species tree satisfies the size bounds
    #[error(
        "No clade of the species tree has strictly between {lower} and {upper} \
         of the {total_taxa} taxa"
    )]
    EmptyCatalog {
        /// Lower bound fraction
        lower: f64,
        /// Upper bound fraction
        upper: f64,
        /// Number of taxa in the species tree
        total_taxa: usize,
    },
    /// There was a [`TreeError`] when reading the species tree
    #[error("Problem with the species tree.")]
    TreeError(#[from] TreeError),
}

/// Parameters of the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Lower bound on clade size, as an exclusive fraction of the total number of taxa
    pub lower: f64,
    /// Upper bound on clade size, as an exclusive fraction of the total number of taxa
    pub upper: f64,
    /// Probability that an eligible gene tree gets missing data
    pub missing: f64,
    /// Maximum number of clades tried per gene tree
    pub tries: usize,
    /// Character separating the species from the individual in leaf labels
    pub separator: char,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lower: 0.2,
            upper: 1.0,
            missing: 0.95,
            tries: 5,
            separator: '_',
        }
    }
}

impl SimulationConfig {
    /// Checks that the parameters describe a possible simulation
    /// ```
    /// use mclade::simulate::SimulationConfig;
    ///
    /// assert!(SimulationConfig::default().validate().is_ok());
    /// let config = SimulationConfig { lower: 0.5, upper: 0.4, ..Default::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0 <= self.lower && self.lower < self.upper) {
            return Err(SimulationError::InvalidConfig(format!(
                "bounds must satisfy 0 <= lower < upper, got lower={} and upper={}",
                self.lower, self.upper
            )));
        }
        if !(0.0..=1.0).contains(&self.missing) {
            return Err(SimulationError::InvalidConfig(format!(
                "missing must be a probability, got {}",
                self.missing
            )));
        }
        if self.tries == 0 {
            return Err(SimulationError::InvalidConfig(
                "at least one try is needed".into(),
            ));
        }

        Ok(())
    }
}

/// What happened to a single gene tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tree was not selected for missing data
    Skipped,
    /// The tree was restricted to `clade` at the given try (starting at 1)
    Accepted {
        /// Try that was kept
        attempt: usize,
        /// The clade the tree was restricted to
        clade: Clade,
    },
    /// Every try left too few taxa, the tree was restored
    Reverted {
        /// Number of failed tries
        attempts: usize,
    },
}

/// Number of gene trees per [`Outcome`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Trees that were not selected
    pub skipped: usize,
    /// Trees with simulated missing data
    pub accepted: usize,
    /// Trees where every try failed
    pub reverted: usize,
}

impl Summary {
    /// Counts an outcome
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Accepted { .. } => self.accepted += 1,
            Outcome::Reverted { .. } => self.reverted += 1,
        }
    }

    /// Total number of trees processed
    pub fn total(&self) -> usize {
        self.skipped + self.accepted + self.reverted
    }
}

/// Deletes candidate clade complements from gene trees.
///
/// The catalog and the configuration are never modified once the simulator is
/// built, all randomness comes from the generator given to each call.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    catalog: CladeCatalog,
}

impl Simulator {
    /// Creates a simulator from an already built catalog
    pub fn new(config: SimulationConfig, catalog: CladeCatalog) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config, catalog })
    }

    /// Creates a simulator, building the catalog from the species tree
    /// ```
    /// use mclade::simulate::{SimulationConfig, Simulator};
    /// use mclade::tree::Tree;
    ///
    /// let species = Tree::from_newick("((A,B),(C,D));").unwrap();
    /// let simulator = Simulator::from_species_tree(&species, SimulationConfig::default()).unwrap();
    ///
    /// assert_eq!(simulator.catalog().total_taxa(), 4);
    /// ```
    pub fn from_species_tree(
        species: &Tree,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let catalog =
            CladeCatalog::build(species, config.lower, config.upper, config.separator)?;
        Ok(Self { config, catalog })
    }

    /// The candidate clades
    pub fn catalog(&self) -> &CladeCatalog {
        &self.catalog
    }

    /// Trees must keep strictly more taxa than this
    fn min_taxa(&self) -> f64 {
        self.catalog.total_taxa() as f64 * self.config.lower
    }

    /// A root without children means nothing of the tree was kept
    fn is_acceptable(&self, tree: &Tree) -> Result<bool, TreeError> {
        let root = tree.get_root()?;
        if tree.get(&root)?.children.is_empty() {
            return Ok(false);
        }
        let size = tree.get_clade(&root, self.config.separator)?.len();

        Ok(size as f64 > self.min_taxa())
    }

    /// Simulates missing data on a single gene tree, in place.
    ///
    /// The tree is left either untouched or restricted to the first accepted
    /// candidate clade, never in an intermediate state.
    /// ```
    /// use mclade::catalog::CladeCatalog;
    /// use mclade::clade::Clade;
    /// use mclade::simulate::{Outcome, SimulationConfig, Simulator};
    /// use mclade::tree::Tree;
    ///
    /// let catalog = CladeCatalog::from_clades(4, [Clade::from_iter(["A", "B"])]).unwrap();
    /// let config = SimulationConfig { missing: 1.0, ..Default::default() };
    /// let simulator = Simulator::new(config, catalog).unwrap();
    ///
    /// let mut gene_tree = Tree::from_newick("((A,C),(B,D));").unwrap();
    /// let outcome = simulator.simulate(&mut gene_tree, &mut rand::thread_rng()).unwrap();
    ///
    /// assert!(matches!(outcome, Outcome::Accepted { attempt: 1, .. }));
    /// assert_eq!(gene_tree.to_newick().unwrap(), "(A,B);");
    /// ```
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        tree: &mut Tree,
        rng: &mut R,
    ) -> Result<Outcome, TreeError> {
        let separator = self.config.separator;
        let size = tree.root_clade(separator)?.len();

        if size as f64 <= self.min_taxa() || !rng.gen_bool(self.config.missing) {
            debug!("Skipping tree with {size} taxa");
            return Ok(Outcome::Skipped);
        }

        let backup = tree.clone();
        for attempt in 1..=self.config.tries {
            let target = self.catalog.sample(rng);
            let stats = tree.prune_to_clade(target, separator)?;

            if self.is_acceptable(tree)? {
                debug!(
                    "Try {attempt}: kept {target} ({} removed, {} contracted), leaves: {}",
                    stats.removed,
                    stats.contracted,
                    tree.leaf_summary()
                );
                return Ok(Outcome::Accepted {
                    attempt,
                    clade: target.clone(),
                });
            }

            debug!("Try {attempt}: restricting to {target} leaves too few taxa");
            tree.clone_from(&backup);
        }

        debug!("All {} tries failed, keeping the tree", self.config.tries);
        Ok(Outcome::Reverted {
            attempts: self.config.tries,
        })
    }

    /// Simulates missing data on every gene tree, one after the other.
    pub fn simulate_all<'a, I, R>(&self, trees: I, rng: &mut R) -> Result<Summary, TreeError>
    where
        I: IntoIterator<Item = &'a mut Tree>,
        R: Rng + ?Sized,
    {
        let mut summary = Summary::default();
        for tree in trees {
            let outcome = self.simulate(tree, rng)?;
            summary.record(&outcome);
        }

        info!(
            "Processed {} gene trees: {} with missing data, {} reverted, {} skipped",
            summary.total(),
            summary.accepted,
            summary.reverted,
            summary.skipped
        );

        Ok(summary)
    }
}
