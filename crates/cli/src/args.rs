use clap::{Args, ValueEnum};
use easme_sim::base::AlphabetKind;
use easme_sim::evolution::{CrossoverPolicy, SurvivorSelection};
use easme_sim::simulation::Topology;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output configuration path
    #[arg(short, long, default_value = "easme.json")]
    pub output: PathBuf,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,

    /// Number of generations
    #[arg(short = 'g', long, default_value = "100")]
    pub generations: usize,

    /// Survivors kept at the end of each generation
    #[arg(short = 'n', long, default_value = "50")]
    pub population_size: usize,

    /// Unique children produced per generation
    #[arg(long, default_value = "20")]
    pub offspring: usize,

    /// Parent pool size (defaults to the current population size)
    #[arg(long)]
    pub parent_pool: Option<usize>,

    /// Consecutive duplicate children tolerated before a generation aborts
    #[arg(long, default_value = "100")]
    pub max_child_attempts: usize,

    /// Lineage representation
    #[arg(long, value_enum, default_value_t = TopologyArg::Flat)]
    pub topology: TopologyArg,

    /// Symbol alphabet of the evolved sequences
    #[arg(long, value_enum, default_value_t = AlphabetArg::AminoAcid)]
    pub alphabet: AlphabetArg,

    /// Custom alphabet symbols (overrides --alphabet)
    #[arg(long)]
    pub symbols: Option<String>,

    /// Positions changed per directed mutation
    ///
    /// Without this flag one uniformly chosen position is mutated.
    #[arg(long)]
    pub directed: Option<usize>,

    /// Reference sequences sampled per directed mutation (0 = all)
    #[arg(long, default_value = "0", requires = "directed")]
    pub comparison_size: usize,

    /// Crossover applied before mutation
    #[arg(long, value_enum, default_value_t = CrossoverArg::Uniform)]
    pub crossover: CrossoverArg,

    /// Tournament size for survivor selection
    ///
    /// Without this flag the fittest individuals survive (truncation).
    #[arg(long)]
    pub tournament: Option<usize>,

    /// Keep only seeds with this origin tag
    #[arg(long)]
    pub origin: Option<String>,

    /// Drop seeds whose length differs from the reference instead of failing
    #[arg(long)]
    pub drop_mismatched_seeds: bool,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration written by `easme init`
    #[arg(short, long, default_value = "easme.json")]
    pub config: PathBuf,

    /// Reference sequences (FASTA or JSON)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Seed individuals (FASTA or JSON); defaults to the reference set
    #[arg(short, long)]
    pub seeds: Option<PathBuf>,

    /// Output directory for population snapshots
    #[arg(short, long, default_value = "easme_output")]
    pub output: PathBuf,

    /// Override random seed (default: use configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override number of generations
    #[arg(short = 'g', long)]
    pub generations: Option<usize>,

    /// Record a snapshot every N generations (the final one is always written)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub record_every: u64,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// Reference sequences (FASTA or JSON)
    pub reference: PathBuf,

    /// Symbol alphabet of the reference sequences
    #[arg(long, value_enum, default_value_t = AlphabetArg::AminoAcid)]
    pub alphabet: AlphabetArg,

    /// Custom alphabet symbols (overrides --alphabet)
    #[arg(long)]
    pub symbols: Option<String>,

    /// Write the per-position observed-symbol table as JSON
    #[arg(long)]
    pub table: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input FASTA file
    pub input: PathBuf,

    /// Output JSON file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Keep only records with this origin tag
    #[arg(long)]
    pub origin: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyArg {
    Flat,
    Tree,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Flat => Topology::Flat,
            TopologyArg::Tree => Topology::Tree,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphabetArg {
    AminoAcid,
    Nucleotide,
}

/// Resolve `--alphabet` / `--symbols` into an alphabet kind.
pub fn alphabet_kind(alphabet: AlphabetArg, symbols: Option<&str>) -> AlphabetKind {
    match (symbols, alphabet) {
        (Some(symbols), _) => AlphabetKind::Custom {
            symbols: symbols.to_string(),
        },
        (None, AlphabetArg::AminoAcid) => AlphabetKind::AminoAcid,
        (None, AlphabetArg::Nucleotide) => AlphabetKind::Nucleotide,
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossoverArg {
    Uniform,
    SinglePoint,
    None,
}

impl From<CrossoverArg> for CrossoverPolicy {
    fn from(arg: CrossoverArg) -> Self {
        match arg {
            CrossoverArg::Uniform => CrossoverPolicy::Uniform,
            CrossoverArg::SinglePoint => CrossoverPolicy::SinglePoint,
            CrossoverArg::None => CrossoverPolicy::None,
        }
    }
}

pub fn survivor_selection(tournament: Option<usize>) -> SurvivorSelection {
    match tournament {
        Some(k) => SurvivorSelection::Tournament { k },
        None => SurvivorSelection::Truncation,
    }
}
