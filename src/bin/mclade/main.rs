#![warn(missing_docs)]
//! The `mclade` binary is a command line tool, using the [`mclade`] crate.
//! It reads a species tree and gene trees, deletes clades from the gene trees
//! and writes the resulting gene trees to stdout.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::ProgressIterator;
use mclade::{SimulationConfig, Simulator, Tree};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    io::{self, BufWriter, Write},
    path::Path,
};
use tracing::{info, Level};

/// contains the struct representing the command line arguments
/// parsed by [`clap`] and used to execute this binary
pub mod cli;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn read_trees(path: &Path) -> Result<Vec<Tree>> {
    let trees = Tree::from_file_multi(path)
        .with_context(|| format!("Could not read trees from {path:?}"))?;

    for (i, tree) in trees.iter().enumerate() {
        tree.check_named_leaves()
            .with_context(|| format!("Tree {} of {path:?} is invalid", i + 1))?;
    }

    Ok(trees)
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_logging(args.verbose);

    let config = SimulationConfig {
        lower: args.lower,
        upper: args.upper,
        missing: args.missing,
        tries: args.tries,
        separator: args.separator,
    };

    let species = read_trees(&args.speciestree)?;
    let [species] = species.as_slice() else {
        bail!(
            "Expected a single species tree in {:?}, found {}",
            args.speciestree,
            species.len()
        );
    };
    let simulator =
        Simulator::from_species_tree(species, config).context("Could not set up the simulation")?;

    let mut gene_trees = read_trees(&args.genetree)?;
    info!("Read {} gene trees from {:?}", gene_trees.len(), args.genetree);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if args.progress {
        simulator.simulate_all(gene_trees.iter_mut().progress(), &mut rng)?;
    } else {
        simulator.simulate_all(gene_trees.iter_mut(), &mut rng)?;
    }

    let mut writer = BufWriter::new(io::stdout().lock());
    for tree in gene_trees.iter() {
        writeln!(writer, "{}", tree.to_newick()?)?;
    }
    writer.flush()?;

    Ok(())
}
