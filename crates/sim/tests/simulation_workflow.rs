//! Integration tests for end-to-end simulation workflows.
//! Tests that combine ingestion, the engine and snapshot recording.

use std::collections::HashSet;

use easme_sim::{
    base::{Alphabet, AlphabetKind, Sequence},
    errors::SimulationError,
    evolution::{CrossoverPolicy, MutationStrategy, SurvivorSelection},
    genome::{CodonTable, Individual, StandardGeneticCode},
    simulation::{
        Configuration, SequenceRecord, Simulation, SimulationBuilder, Topology,
        create_individuals, parse_fasta,
    },
    storage::{Recorder, RecordingStrategy},
};

const REFERENCE_FASTA: &str = "\
>ref1
MKVLAAGHTW
>ref2
MKVLAAGHTW
>ref3
MRVLAAGHSW
>ref4
MKILAPGHTW
>ref5
MKVLSAGHTW
>short
MKVLA
";

fn reference() -> Vec<Sequence> {
    let alphabet = Alphabet::amino_acids();
    parse_fasta(REFERENCE_FASTA)
        .unwrap()
        .iter()
        .map(|r| Sequence::parse(&r.sequence, &alphabet).unwrap())
        .collect()
}

fn assert_unique(sim: &Simulation) {
    let members = sim.population().flatten();
    let sequences: HashSet<&Sequence> = members.iter().map(|ind| ind.sequence()).collect();
    assert_eq!(sequences.len(), members.len());
}

#[test]
fn test_flat_run_keeps_population_unique_and_bounded() {
    let mut sim = SimulationBuilder::new()
        .reference(reference())
        .generations(15)
        .max_population_size(10)
        .offspring_per_generation(6)
        .seed(42)
        .build()
        .unwrap();

    sim.run_with(|s| {
        assert!(s.population().size() <= 10);
        assert_unique(s);
        Ok(())
    })
    .unwrap();
    assert_eq!(sim.generation(), 15);
    // the reference consensus is present from the start and truncation keeps it
    assert_eq!(sim.best().unwrap().fitness().get(), 1.0);
}

#[test]
fn test_directed_mutation_run() {
    let mut sim = SimulationBuilder::new()
        .reference(reference())
        .generations(5)
        .max_population_size(8)
        .offspring_per_generation(4)
        .mutation(MutationStrategy::Directed {
            count: 1,
            comparison_size: 3,
        })
        .crossover(CrossoverPolicy::SinglePoint)
        .survivor_selection(SurvivorSelection::Tournament { k: 3 })
        .seed(9)
        .build()
        .unwrap();
    sim.run().unwrap();
    assert_eq!(sim.generation(), 5);
    assert_unique(&sim);
}

#[test]
fn test_directed_mutation_survives_low_diversity_reference() {
    let alphabet = Alphabet::new("AC").unwrap();
    let reference: Vec<Sequence> = ["AAAAAA", "AAAAAA", "AAAAAC", "AAAAAA", "AAAAAC"]
        .iter()
        .map(|text| Sequence::parse(text, &alphabet).unwrap())
        .collect();
    let seeds = vec![
        Individual::new("s0", Sequence::parse("CCAAAA", &alphabet).unwrap()),
        Individual::new("s1", Sequence::parse("ACACAC", &alphabet).unwrap()),
    ];

    for seed in 0..20 {
        let mut sim = SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "AC".into(),
            })
            .reference(reference.clone())
            .seeds(seeds.clone())
            .generations(3)
            .max_population_size(6)
            .offspring_per_generation(2)
            .mutation(MutationStrategy::Directed {
                count: 3,
                comparison_size: 2,
            })
            .seed(seed)
            .build()
            .unwrap();
        sim.run().unwrap();
        assert_eq!(sim.generation(), 3);
        assert_unique(&sim);
    }
}

#[test]
fn test_tree_run_grows_by_hill_climbing() {
    let alphabet = Alphabet::amino_acids();
    let seeds = vec![
        Individual::new("start", Sequence::parse("MRILSPGHSW", &alphabet).unwrap()),
    ];
    let mut sim = SimulationBuilder::new()
        .reference(reference())
        .seeds(seeds)
        .topology(Topology::Tree)
        .crossover(CrossoverPolicy::None)
        .generations(20)
        .max_population_size(20)
        .offspring_per_generation(3)
        .seed(3)
        .build()
        .unwrap();
    let start = sim.best().unwrap().fitness();
    sim.run_with(|s| {
        assert!(s.population().size() <= 20);
        assert_unique(s);
        Ok(())
    })
    .unwrap();

    fn check(node: &Individual) {
        for child in node.descendants() {
            assert!(child.fitness() > node.fitness());
            check(child);
        }
    }
    for root in sim.population().forest() {
        check(root);
    }
    assert!(sim.best().unwrap().fitness() >= start);
}

#[test]
fn test_same_seed_gives_same_snapshots() {
    let build = || {
        SimulationBuilder::new()
            .reference(reference())
            .generations(8)
            .max_population_size(6)
            .offspring_per_generation(5)
            .seed(2024)
            .build()
            .unwrap()
    };
    let mut a = build();
    let mut b = build();
    a.run().unwrap();
    b.run().unwrap();
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_stalled_generation_aborts_with_context() {
    let alphabet = Alphabet::new("AC").unwrap();
    let reference = ["A", "A", "C"]
        .iter()
        .map(|s| Sequence::parse(s, &alphabet).unwrap())
        .collect();
    let mut sim = SimulationBuilder::new()
        .alphabet(AlphabetKind::Custom {
            symbols: "AC".into(),
        })
        .reference(reference)
        .offspring_per_generation(1)
        .max_child_attempts(25)
        .seed(1)
        .build()
        .unwrap();

    let err = sim.step().unwrap_err();
    match err {
        SimulationError::ChildGenerationStalled {
            generation,
            produced,
            required,
            attempts,
        } => {
            assert_eq!(generation, 1);
            assert_eq!(produced, 0);
            assert_eq!(required, 1);
            assert_eq!(attempts, 25);
        }
        other => panic!("unexpected error: {other}"),
    }
    // the population is left as it was
    assert_eq!(sim.generation(), 0);
    assert_eq!(sim.population().size(), 2);
}

#[test]
fn test_recorded_generations_survive_a_later_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(dir.path(), RecordingStrategy::All).unwrap();
    let mut sim = SimulationBuilder::new()
        .reference(reference())
        .generations(3)
        .max_population_size(5)
        .offspring_per_generation(2)
        .seed(5)
        .build()
        .unwrap();

    let result = sim.run_with(|s| {
        recorder.record(s.population())?;
        if s.generation() == 2 {
            return Err(SimulationError::ChildGenerationStalled {
                generation: 3,
                produced: 0,
                required: 2,
                attempts: 100,
            });
        }
        Ok(())
    });
    assert!(result.is_err());

    for generation in 1..=2 {
        let snapshot = Recorder::read(recorder.path_for(generation)).unwrap();
        assert_eq!(snapshot.generation, generation);
        assert!(snapshot.size() <= 5);
    }
    assert!(!recorder.path_for(3).exists());
}

#[test]
fn test_config_driven_run_with_coding_sequences() {
    let json = r#"{
        "execution": {
            "generations": 4,
            "max_population_size": 6,
            "offspring_per_generation": 3,
            "seed": 11
        },
        "evolution": {
            "mutation": {"kind": "uniform"},
            "crossover": "uniform"
        }
    }"#;
    let config = Configuration::from_json_str(json).unwrap();
    let records = parse_fasta(">a\nMKVW\n>b\nMKVW\n>c\nMRAW\n").unwrap();
    let alphabet = Alphabet::amino_acids();
    let reference: Vec<Sequence> = records
        .iter()
        .map(|r| Sequence::parse(&r.sequence, &alphabet).unwrap())
        .collect();

    let mut seed = SequenceRecord::new("seed", "MKVW");
    seed.coding_sequence = Some("ATGAAAGTTTGGTAA".into());
    let code = StandardGeneticCode::new();
    let seeds = create_individuals(&[seed], &alphabet, Some(&code)).unwrap();

    let mut sim = SimulationBuilder::from_config(config)
        .reference(reference)
        .seeds(seeds)
        .codon_table(StandardGeneticCode::new())
        .build()
        .unwrap();
    sim.run().unwrap();

    for ind in sim.population().flatten() {
        let coding = ind.coding_sequence().unwrap();
        assert_eq!(code.translate(coding).unwrap(), *ind.sequence());
    }
}
