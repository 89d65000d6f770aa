//! Serializable population snapshots.

use serde::{Deserialize, Serialize};

use crate::base::{Alphabet, Sequence};
use crate::errors::SequenceError;
use crate::genome::Individual;
use crate::simulation::{Population, Topology};

/// Snapshot of one individual and, recursively, its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSnapshot {
    pub name: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_sequence: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub fitness: Option<f64>,
    #[serde(default)]
    pub descendants: Vec<IndividualSnapshot>,
}

impl From<&Individual> for IndividualSnapshot {
    fn from(ind: &Individual) -> Self {
        Self {
            name: ind.name().to_string(),
            sequence: ind.sequence().to_string(),
            coding_sequence: ind.coding_sequence().map(ToString::to_string),
            origin: ind.origin().map(str::to_string),
            fitness: ind.cached_fitness().map(|f| f.get()),
            descendants: ind.descendants().iter().map(Self::from).collect(),
        }
    }
}

impl IndividualSnapshot {
    /// Rebuild the individual and its subtree.
    ///
    /// The coding sequence is restored as recorded, without re-translating it.
    pub fn to_individual(&self, alphabet: &Alphabet) -> Result<Individual, SequenceError> {
        let sequence = Sequence::parse(&self.sequence, alphabet)?;
        let coding = self
            .coding_sequence
            .as_deref()
            .map(|coding| Sequence::parse(coding, &Alphabet::dna()))
            .transpose()?;

        let mut individual = Individual::new(self.name.as_str(), sequence)
            .with_resynced_coding(coding)
            .with_origin_opt(self.origin.as_deref().map(Into::into));
        if let Some(fitness) = self.fitness {
            individual.set_cached_fitness(fitness);
        }
        for child in &self.descendants {
            individual.add_descendant(child.to_individual(alphabet)?);
        }
        Ok(individual)
    }
}

/// The live population at the end of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub generation: usize,
    pub topology: Topology,
    pub individuals: Vec<IndividualSnapshot>,
}

impl PopulationSnapshot {
    pub fn capture(population: &Population) -> Self {
        Self {
            generation: population.generation(),
            topology: population.topology(),
            individuals: population
                .forest()
                .iter()
                .map(IndividualSnapshot::from)
                .collect(),
        }
    }

    /// Number of individuals including every descendant.
    pub fn size(&self) -> usize {
        fn count(node: &IndividualSnapshot) -> usize {
            1 + node.descendants.iter().map(count).sum::<usize>()
        }
        self.individuals.iter().map(count).sum()
    }

    /// Fittest recorded individual at any depth.
    pub fn best(&self) -> Option<&IndividualSnapshot> {
        fn walk<'a>(node: &'a IndividualSnapshot, best: &mut Option<&'a IndividualSnapshot>) {
            let fitness = node.fitness.unwrap_or(0.0);
            if best.is_none_or(|b| fitness > b.fitness.unwrap_or(0.0)) {
                *best = Some(node);
            }
            for child in &node.descendants {
                walk(child, best);
            }
        }
        let mut best = None;
        for root in &self.individuals {
            walk(root, &mut best);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FitnessValue;

    fn aa(text: &str) -> Sequence {
        Sequence::parse(text, &Alphabet::amino_acids()).unwrap()
    }

    fn lineage() -> Individual {
        let mut root = Individual::new("root", aa("MKV")).with_origin("Alabama");
        root.set_cached_fitness(0.5);
        let mut child = Individual::new("child", aa("MKA"));
        child.set_cached_fitness(0.75);
        root.add_descendant(child);
        root
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = IndividualSnapshot::from(&lineage());
        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["name"], "root");
        assert_eq!(json["sequence"], "MKV");
        assert_eq!(json["origin"], "Alabama");
        assert_eq!(json["fitness"], 0.5);
        assert_eq!(json["descendants"][0]["name"], "child");
        assert!(json.get("coding_sequence").is_none());
    }

    #[test]
    fn test_snapshot_restores_subtree() {
        let original = lineage();
        let restored = IndividualSnapshot::from(&original)
            .to_individual(&Alphabet::amino_acids())
            .unwrap();
        assert_eq!(restored.name(), "root");
        assert_eq!(restored.origin(), Some("Alabama"));
        assert_eq!(restored.subtree_size(), 2);
        assert_eq!(
            restored.descendants()[0].cached_fitness(),
            Some(FitnessValue::new(0.75))
        );
    }

    #[test]
    fn test_population_snapshot_best_and_size() {
        let population = Population::new(Topology::Tree, vec![lineage()]);
        let snapshot = PopulationSnapshot::capture(&population);
        assert_eq!(snapshot.topology, Topology::Tree);
        assert_eq!(snapshot.size(), 2);
        assert_eq!(snapshot.best().unwrap().name, "child");
    }
}
