use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn newick_file(trees: &[&str]) -> anyhow::Result<NamedTempFile> {
    let mut file = Builder::new().suffix(".nwk").tempfile()?;
    for tree in trees {
        writeln!(file, "{tree}")?;
    }
    Ok(file)
}

const SPECIES: &str = "((A,B),(C,D));";

const GENE_TREES: [&str; 4] = [
    "(((A_1,B_1),C_1),D_1);",
    "((A_1:0.1,A_2:0.2):0.3,(B_1:0.1,(C_1:0.4,D_1:0.5):0.2):0.1);",
    "((A_1,C_1),(B_1,D_1));",
    "(A_1,B_1);",
];

#[test]
fn command_end_to_end() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&["(((A,B),C),D);"])?;

    // Candidates are {A,B} and {C,D}
    let mut cmd = Command::cargo_bin("mclade")?;
    let output = cmd
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .args(["-l", "0.3", "-m", "1"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(
        stdout == "((A,B));\n" || stdout == "(C,D);\n",
        "unexpected output: {stdout}"
    );

    Ok(())
}

#[test]
fn command_no_missing_data() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&GENE_TREES)?;

    let mut cmd = Command::cargo_bin("mclade")?;
    let output = cmd
        .arg("--speciestree")
        .arg(species.path())
        .arg("--genetree")
        .arg(genes.path())
        .args(["--missing", "0"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().collect::<Vec<_>>(), GENE_TREES.to_vec());

    Ok(())
}

#[test]
fn command_one_line_per_tree() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&GENE_TREES)?;

    let mut cmd = Command::cargo_bin("mclade")?;
    let output = cmd
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .args(["-m", "1", "-vv"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), GENE_TREES.len());
    assert!(stdout.lines().all(|line| line.ends_with(';')));
    // Logs never end up with the trees
    assert!(String::from_utf8(output.stderr)?.contains("Processed 4 gene trees"));

    Ok(())
}

#[test]
fn command_seed_is_reproducible() -> anyhow::Result<()> {
    let species = newick_file(&["(((A,B),(E,F)),((C,D),(G,H)));"])?;
    let genes = newick_file(&[
        "(((A_1,B_1),(E_1,F_1)),((C_1,D_1),(G_1,H_1)));",
        "((A_1,(C_1,E_1)),((B_1,G_1),(D_1,(F_1,H_1))));",
        "(((A_1,H_1),(E_1,B_1)),((C_1,F_1),(G_1,D_1)));",
    ])?;

    let run = || -> anyhow::Result<String> {
        let output = Command::cargo_bin("mclade")?
            .arg("-s")
            .arg(species.path())
            .arg("-g")
            .arg(genes.path())
            .args(["--seed", "42", "-m", "0.8"])
            .output()?;
        assert!(output.status.success());
        Ok(String::from_utf8(output.stdout)?)
    };

    assert_eq!(run()?, run()?);

    Ok(())
}

#[test]
fn command_empty_catalog() -> anyhow::Result<()> {
    let species = newick_file(&["(A,B);"])?;
    let genes = newick_file(&["(A_1,B_1);"])?;

    let mut cmd = Command::cargo_bin("mclade")?;
    cmd.arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .args(["-l", "0.6"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No clade of the species tree"));

    Ok(())
}

#[test]
fn command_invalid_tries() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&GENE_TREES)?;

    for tries in ["2.5", "0", "many"] {
        Command::cargo_bin("mclade")?
            .arg("-s")
            .arg(species.path())
            .arg("-g")
            .arg(genes.path())
            .args(["-t", tries])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--tries"));
    }

    Command::cargo_bin("mclade")?
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .args(["-t", "3.0"])
        .assert()
        .success();

    Ok(())
}

#[test]
fn command_invalid_bounds() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&GENE_TREES)?;

    Command::cargo_bin("mclade")?
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .args(["-l", "0.8", "-u", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lower < upper"));

    Ok(())
}

#[test]
fn command_malformed_newick() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&["((A_1,B_1),C_1;"])?;

    Command::cargo_bin("mclade")?
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Could not read trees"));

    Ok(())
}

#[test]
fn command_several_species_trees() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES, SPECIES])?;
    let genes = newick_file(&GENE_TREES)?;

    Command::cargo_bin("mclade")?
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected a single species tree"));

    Ok(())
}

#[test]
fn command_unnamed_leaves() -> anyhow::Result<()> {
    let species = newick_file(&[SPECIES])?;
    let genes = newick_file(&["((A_1,B_1),(,D_1));"])?;

    Command::cargo_bin("mclade")?
        .arg("-s")
        .arg(species.path())
        .arg("-g")
        .arg(genes.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be named"));

    Ok(())
}

#[test]
fn command_missing_arguments() -> anyhow::Result<()> {
    Command::cargo_bin("mclade")?
        .args(["-s", "species.nwk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--genetree"));

    Ok(())
}
