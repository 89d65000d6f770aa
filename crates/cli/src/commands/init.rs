use anyhow::{Context, Result, bail};
use easme_sim::evolution::MutationStrategy;
use easme_sim::simulation::{
    Configuration, EvolutionConfig, ExecutionConfig, InitializationConfig,
};

use crate::args::{InitArgs, alphabet_kind, survivor_selection};
use crate::printing::print_parameters;

pub fn init_configuration(args: &InitArgs) -> Result<()> {
    println!("🧬 easme - Evolutionary Sequence Design");
    println!("============================================\n");

    if args.output.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    let config = build_config(args);
    config.validate().context("Invalid configuration")?;

    print_parameters(&config);

    config
        .to_json_file(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("✓ Configuration written to {}", args.output.display());
    println!(
        "\n💡 Next: easme run -c {} -r <reference.fasta>",
        args.output.display()
    );
    Ok(())
}

fn build_config(args: &InitArgs) -> Configuration {
    let mutation = match args.directed {
        Some(count) => MutationStrategy::Directed {
            count,
            comparison_size: args.comparison_size,
        },
        None => MutationStrategy::Uniform,
    };

    Configuration {
        execution: ExecutionConfig {
            generations: args.generations,
            max_population_size: args.population_size,
            offspring_per_generation: args.offspring,
            parent_pool_size: args.parent_pool,
            max_child_attempts: args.max_child_attempts,
            seed: args.seed,
            topology: args.topology.into(),
        },
        evolution: EvolutionConfig {
            alphabet: alphabet_kind(args.alphabet, args.symbols.as_deref()),
            mutation,
            crossover: args.crossover.into(),
            survivor_selection: survivor_selection(args.tournament),
            ..Default::default()
        },
        initialization: InitializationConfig {
            origin: args.origin.clone(),
            drop_mismatched_seeds: args.drop_mismatched_seeds,
        },
    }
}
