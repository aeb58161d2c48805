use std::fs;
use std::io::Read;

use anyhow::{bail, Context, Result};

use cogniprint::models::{DeriveInput, DeriveOptions};
use cogniprint::services::derive::derive_all;
use cogniprint::init_logging;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read input from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read input file: {}", path))
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin derive_report -- <input.json | -> [--options <options.json>] [--out <json_path>] [--compact]\n\nNotes:\n  - `-` reads the input payload from stdin.\n  - The options file configures cohort list, distribution model, active signal IDs and role catalog.\n  - Output goes to stdout unless --out is given."
        );
        return Ok(());
    }

    init_logging();

    let input_raw = read_input(&args[1])?;
    let input: DeriveInput =
        serde_json::from_str(&input_raw).context("input is not a valid derivation payload")?;

    let opts: DeriveOptions = match parse_arg_value(&args, "--options") {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read options file: {}", path))?;
            serde_json::from_str(&raw).context("options file is not a valid configuration")?
        }
        None => DeriveOptions::default(),
    };

    let report = match derive_all(&input, &opts) {
        Ok(r) => r,
        Err(e) => bail!("derivation failed: {}", e),
    };

    let rendered = if has_flag(&args, "--compact") {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match parse_arg_value(&args, "--out") {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path))?;
            eprintln!("Report written to {}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
