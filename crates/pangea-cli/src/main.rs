//! Command line front end for pangea stack files.
//!
//! A stack file lists resources and components to declare. Every entry is
//! validated before anything is written.
//!
//! ```sh
//! pangea --stack stack.toml validate
//! pangea --stack stack.toml synth --out main.tf.json
//! pangea --stack stack.toml show --name main
//! pangea kinds
//! ```
//!
//! Run with `RUST_LOG=debug` to see each declaration.
use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use pangea::{catalog, config::StackConfig, ReferenceSummary, Synthesizer, TerraformSynthesizer};

#[derive(Parser, Debug)]
#[command(name = "pangea", version, about = "Validate and synthesize Terraform stacks")]
struct Cli {
    /// Stack file to load, TOML or JSON.
    #[arg(long, short, env = "PANGEA_STACK")]
    stack: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Check every declaration of the stack.
    Validate,
    /// Write the Terraform JSON document of the stack.
    Synth {
        /// Output file, stdout when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Print the references of declared resources.
    Show {
        /// Only show resources with this name.
        #[arg(long, short)]
        name: Option<String>,
    },
    /// List the resource types and components a stack may use.
    Kinds,
}

struct Loaded {
    synth: TerraformSynthesizer,
    summaries: Vec<ReferenceSummary>,
}

fn load(stack: Option<PathBuf>) -> anyhow::Result<Loaded> {
    let path = stack.context("no stack file, pass --stack or set PANGEA_STACK")?;
    let config = StackConfig::from_path(&path)?;
    let mut synth = TerraformSynthesizer::default();
    let summaries = config
        .declare_all(&mut synth)
        .with_context(|| format!("stack {path:?} is invalid"))?;
    for address in synth.unresolved().iter() {
        log::warn!("{address} is referenced but not declared in {path:?}");
    }
    Ok(Loaded { synth, summaries })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Validate => {
            let Loaded { synth, summaries } = load(cli.stack)?;
            for summary in summaries.iter() {
                println!("{} {}", "OK".green(), summary.address());
            }
            let unresolved = synth.unresolved();
            if !unresolved.is_empty() {
                println!("{} references outside the stack: {unresolved}", "note".yellow());
            }
            println!(
                "{} {} resources validated",
                "OK".green().bold(),
                summaries.len()
            );
        }
        Command::Synth { out } => {
            let Loaded { synth, .. } = load(cli.stack)?;
            match out {
                Some(path) => {
                    synth.save(&path)?;
                    println!("{} wrote {path:?}", "OK".green().bold());
                }
                None => {
                    println!("{}", serde_json::to_string_pretty(&synth.synthesis())?);
                }
            }
        }
        Command::Show { name } => {
            let Loaded { summaries, .. } = load(cli.stack)?;
            let shown: Vec<_> = summaries
                .into_iter()
                .filter(|summary| name.as_deref().is_none_or(|name| summary.name == name))
                .collect();
            if let Some(name) = name.as_deref() {
                anyhow::ensure!(!shown.is_empty(), "nothing named '{name}' in the stack");
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Command::Kinds => {
            for kind in catalog::KINDS {
                println!("{kind}");
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            if let Some(err) = e.downcast_ref::<pangea::Error>() {
                if let Some(received) = err.received() {
                    eprintln!("  {} {received}", "received".dimmed());
                }
            }
            ExitCode::FAILURE
        }
    }
}
