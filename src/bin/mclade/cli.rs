use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Simulate missing data in gene trees by deleting species tree clades
///
/// Candidate clades are the clades of the species tree with strictly between
/// `lower` and `upper` of the taxa. Each gene tree with enough taxa is selected
/// with probability `missing`, and restricted to a random candidate clade.
/// If the restriction leaves too few taxa, another candidate is tried up to
/// `tries` times before the gene tree is left untouched.
///
/// Gene trees are written to stdout in newick format, in input order.
#[derive(Parser, Debug)]
#[command(author, version, verbatim_doc_comment)]
pub struct Args {
    /// Input gene trees (newick file, one or more trees)
    #[arg(short, long)]
    pub genetree: PathBuf,

    /// Input species tree (newick file, a single tree)
    #[arg(short, long)]
    pub speciestree: PathBuf,

    /// Lower limit of the fraction of taxa in a clade (excluding)
    #[arg(short, long, default_value_t = 0.2)]
    pub lower: f64,

    /// Upper limit of the fraction of taxa in a clade (excluding)
    #[arg(short, long, default_value_t = 1.0)]
    pub upper: f64,

    /// Fraction of gene trees with missing taxa
    #[arg(short, long, default_value_t = 0.95)]
    pub missing: f64,

    /// Number of tries to get a gene tree with missing data
    #[arg(short, long, default_value_t = 5, value_parser = parse_tries)]
    pub tries: usize,

    /// Separator between species and individual in leaf names
    #[arg(long, default_value_t = '_')]
    pub separator: char,

    /// Seed of the random generator, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show a progress bar while processing gene trees
    #[arg(long)]
    pub progress: bool,

    /// Log more details to stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parses a positive number of tries, `5` and `5.0` are both accepted
pub fn parse_tries(value: &str) -> Result<usize, String> {
    let tries = match value.parse::<usize>() {
        Ok(tries) => tries,
        Err(_) => {
            let float: f64 = value
                .parse()
                .map_err(|_| format!("'{value}' is not a number"))?;
            if !float.is_finite() || float.fract() != 0.0 || float < 0.0 {
                return Err(format!("'{value}' is not a whole number of tries"));
            }
            float as usize
        }
    };

    if tries == 0 {
        return Err("at least one try is needed".into());
    }

    Ok(tries)
}
