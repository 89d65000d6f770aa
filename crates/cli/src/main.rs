mod args;
mod commands;
mod printing;

use anyhow::Result;
use clap::{Parser, Subcommand};

use args::{ConsensusArgs, ConvertArgs, InitArgs, RunArgs};
use commands::{consensus, convert, init, run};

/// easme: an evolutionary algorithm for sequence design
///
/// Evolves a population of protein (or DNA) sequences towards the
/// conserved consensus of a reference set, with uniform or
/// conservation-directed mutation, crossover and survivor selection.
#[derive(Parser, Debug)]
#[command(name = "easme")]
#[command(author, version, about = "Evolves sequences against a conserved reference set", long_about = None)]
struct Cli {
    /// Number of threads to use for parallel fitness evaluation
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new run configuration.
    ///
    /// Sets up the parameters for an experiment (population size, mutation
    /// strategy, etc.) but does not run it yet.
    Init(Box<InitArgs>),

    /// Evolve a population against a reference set.
    ///
    /// Executes the simulation generation by generation and records
    /// population snapshots as JSON.
    Run(Box<RunArgs>),

    /// Print the consensus prototype of a reference set.
    Consensus(ConsensusArgs),

    /// Convert a FASTA file into JSON sequence records.
    Convert(ConvertArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match cli.command {
        Commands::Init(args) => init::init_configuration(&args)?,
        Commands::Run(args) => run::run_simulation(&args)?,
        Commands::Consensus(args) => consensus::show_consensus(&args)?,
        Commands::Convert(args) => convert::convert_records(&args)?,
    }

    Ok(())
}
