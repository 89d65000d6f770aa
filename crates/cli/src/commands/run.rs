use anyhow::{Context, Result, bail};
use easme_sim::base::{Alphabet, Sequence};
use easme_sim::genome::StandardGeneticCode;
use easme_sim::simulation::{Configuration, SimulationBuilder, create_individuals, load_records};
use easme_sim::storage::{Recorder, RecordingStrategy};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;

use crate::args::RunArgs;
use crate::printing::{print_individual, print_model, print_parameters};

/// Parse a reference file into sequences over `alphabet`.
pub fn load_reference(path: &Path, alphabet: &Alphabet) -> Result<Vec<Sequence>> {
    let records =
        load_records(path).with_context(|| format!("Failed to read {}", path.display()))?;
    records
        .iter()
        .map(|record| {
            Sequence::parse(&record.sequence, alphabet)
                .with_context(|| format!("Invalid reference sequence '{}'", record.name))
        })
        .collect()
}

pub fn run_simulation(args: &RunArgs) -> Result<()> {
    println!("🧬 easme - Running Simulation");
    println!("============================================\n");

    let mut config = Configuration::from_json_file(&args.config).with_context(|| {
        format!(
            "Failed to load {}. Did you run 'easme init' first?",
            args.config.display()
        )
    })?;
    if let Some(seed) = args.seed {
        config.execution.seed = Some(seed);
    }
    if let Some(generations) = args.generations {
        config.execution.generations = generations;
    }
    config.validate().context("Invalid configuration")?;

    let alphabet = config
        .evolution
        .alphabet
        .build()
        .context("Invalid alphabet")?;
    let reference = load_reference(&args.reference, &alphabet)?;
    println!("✓ Loaded {} reference sequences", reference.len());

    let code = StandardGeneticCode::new();
    let mut builder = SimulationBuilder::from_config(config.clone())
        .reference(reference)
        .codon_table(code.clone());

    if let Some(path) = &args.seeds {
        let records =
            load_records(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let seeds = create_individuals(&records, &alphabet, Some(&code))
            .with_context(|| format!("Invalid seed in {}", path.display()))?;
        println!("✓ Loaded {} seed individuals", seeds.len());
        builder = builder.seeds(seeds);
    }

    let mut sim = builder
        .build()
        .context("Failed to initialize simulation")?;

    print_parameters(&config);
    print_model(sim.model());
    println!("  • Initial Population: {}", sim.population().size());

    let mut recorder = Recorder::new(
        &args.output,
        RecordingStrategy::EveryN(args.record_every as usize),
    )
    .context("Failed to create recorder")?;
    recorder
        .write_config(&config)
        .context("Failed to record configuration")?;

    let generations = config.execution.generations;
    println!("\nRunning {generations} generations...");

    let pb = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new(generations as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    let result = sim.run_with(|s| {
        recorder.record(s.population())?;
        if let Some(pb) = &pb {
            let best = s.best().map_or(0.0, |b| b.fitness().get());
            pb.set_message(format!("best {best:.4}"));
            pb.inc(1);
        }
        Ok(())
    });

    if let Some(pb) = &pb {
        if result.is_ok() {
            pb.finish_with_message("Done");
        } else {
            pb.abandon();
        }
    }
    result.with_context(|| {
        format!(
            "Simulation failed; snapshots up to generation {} are in {}",
            sim.generation(),
            args.output.display()
        )
    })?;

    let path = recorder
        .record_final(sim.population())
        .context("Failed to record final generation")?;
    info!("Final snapshot written to {}", path.display());

    println!("\n✓ Simulation complete!");
    println!("  Final generation: {}", sim.generation());
    println!("  Population size: {}", sim.population().size());
    println!("  Mean fitness: {:.4}", sim.population().mean_fitness());

    let Some(best) = sim.best() else {
        bail!("Population is empty after the run");
    };
    println!("\n🏆 Best Individual");
    print_individual(best);

    println!("\n💡 Snapshots written to {}", args.output.display());
    Ok(())
}
