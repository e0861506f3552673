use std::fs::read_to_string;

use anyhow::{Context, Result};
use cable_trench::Problem;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("Usage: cable-trench <problem_file.yaml>")?;

    cable_trench::log::init()?;

    let buf =
        read_to_string(&path).with_context(|| format!("Failed to read problem file {path}"))?;
    let problem = Problem::from_yaml(&buf)?;
    let solution = problem.solve()?;

    println!("{}", serde_yaml::to_string(&solution)?);
    Ok(())
}
