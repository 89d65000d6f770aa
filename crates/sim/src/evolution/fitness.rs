//! Fitness evaluation against a conservation model.
//!
//! Two evaluators are provided:
//!
//! - [`ConsensusFitness`]: the fraction of positions whose symbol is a
//!   plurality symbol of the reference set. Any symbol sharing the highest
//!   count counts as a match.
//! - [`ConservationGatedFitness`]: zero whenever a conserved position was
//!   changed, otherwise the product of two injected external scores
//!   (validity and aggregation).
//!
//! Both are deterministic and side-effect free. A sequence whose length
//! differs from the model is rejected with [`FitnessError::LengthMismatch`];
//! it is never padded or truncated.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::base::{FitnessValue, Sequence};
use crate::errors::FitnessError;
use crate::evolution::ConservationModel;

/// Scores a sequence against a conservation model.
pub trait FitnessFunction: fmt::Debug + Send + Sync {
    /// Calculate the fitness of `sequence`.
    fn evaluate(
        &self,
        sequence: &Sequence,
        model: &ConservationModel,
    ) -> Result<FitnessValue, FitnessError>;
}

/// An external black-box score in [0, 1] for a sequence.
///
/// Implemented for any `Fn(&Sequence) -> f64 + Send + Sync`. Values outside
/// the range are clamped by the caller.
pub trait SequenceScorer: Send + Sync {
    fn score(&self, sequence: &Sequence) -> f64;
}

impl<F> SequenceScorer for F
where
    F: Fn(&Sequence) -> f64 + Send + Sync,
{
    fn score(&self, sequence: &Sequence) -> f64 {
        self(sequence)
    }
}

fn check_length(sequence: &Sequence, model: &ConservationModel) -> Result<(), FitnessError> {
    if sequence.len() != model.len() {
        return Err(FitnessError::LengthMismatch {
            expected: model.len(),
            actual: sequence.len(),
        });
    }
    Ok(())
}

/// Fraction of positions carrying a plurality symbol, normalised by the
/// sequence length.
pub fn consensus_fitness(
    sequence: &Sequence,
    model: &ConservationModel,
) -> Result<FitnessValue, FitnessError> {
    check_length(sequence, model)?;
    if sequence.is_empty() {
        return Ok(FitnessValue::LETHAL_FITNESS);
    }
    let matches = sequence
        .as_bytes()
        .iter()
        .zip(model.positions())
        .filter(|(symbol, stats)| stats.is_plurality(**symbol))
        .count();
    Ok(FitnessValue::new(matches as f64 / sequence.len() as f64))
}

/// True iff every conserved position still carries its single observed
/// symbol.
pub fn conservation_gate(
    sequence: &Sequence,
    model: &ConservationModel,
) -> Result<bool, FitnessError> {
    check_length(sequence, model)?;
    Ok(sequence
        .as_bytes()
        .iter()
        .zip(model.positions())
        .filter(|(_, stats)| stats.is_conserved())
        .all(|(symbol, stats)| stats.plurality() == Some(*symbol)))
}

/// Plurality-match fitness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsensusFitness;

impl FitnessFunction for ConsensusFitness {
    fn evaluate(
        &self,
        sequence: &Sequence,
        model: &ConservationModel,
    ) -> Result<FitnessValue, FitnessError> {
        consensus_fitness(sequence, model)
    }
}

/// Conservation gate combined with external validity and aggregation scores.
///
/// `fitness = 0` when the gate fails, else `validity × aggregation`.
#[derive(Clone)]
pub struct ConservationGatedFitness {
    validity: Arc<dyn SequenceScorer>,
    aggregation: Arc<dyn SequenceScorer>,
}

impl ConservationGatedFitness {
    pub fn new(
        validity: impl SequenceScorer + 'static,
        aggregation: impl SequenceScorer + 'static,
    ) -> Self {
        Self {
            validity: Arc::new(validity),
            aggregation: Arc::new(aggregation),
        }
    }

    /// Build from already-shared scorers.
    pub fn from_shared(
        validity: Arc<dyn SequenceScorer>,
        aggregation: Arc<dyn SequenceScorer>,
    ) -> Self {
        Self {
            validity,
            aggregation,
        }
    }
}

impl fmt::Debug for ConservationGatedFitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConservationGatedFitness")
            .finish_non_exhaustive()
    }
}

impl FitnessFunction for ConservationGatedFitness {
    fn evaluate(
        &self,
        sequence: &Sequence,
        model: &ConservationModel,
    ) -> Result<FitnessValue, FitnessError> {
        if !conservation_gate(sequence, model)? {
            return Ok(FitnessValue::LETHAL_FITNESS);
        }
        let validity = FitnessValue::new(self.validity.score(sequence));
        let aggregation = FitnessValue::new(self.aggregation.score(sequence));
        Ok(validity * aggregation)
    }
}

/// Score many sequences on the rayon pool. Output order matches input order.
pub fn evaluate_batch(
    fitness: &dyn FitnessFunction,
    model: &ConservationModel,
    sequences: &[&Sequence],
) -> Result<Vec<FitnessValue>, FitnessError> {
    sequences
        .par_iter()
        .map(|seq| fitness.evaluate(seq, model))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Alphabet;

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text, &Alphabet::new("AC").unwrap()).unwrap()
    }

    /// Four length-5 references: positions 0-3 unanimous, position 4 split 3:1.
    fn scenario_model() -> ConservationModel {
        let refs = vec![seq("AAAAA"), seq("AAAAA"), seq("AAAAA"), seq("AAAAC")];
        ConservationModel::build(&refs).unwrap()
    }

    #[test]
    fn test_consensus_fitness_scenario() {
        let model = scenario_model();
        let value = consensus_fitness(&seq("AAAAC"), &model).unwrap();
        assert!((value.get() - 0.8).abs() < 1e-12);
        assert!(conservation_gate(&seq("AAAAC"), &model).unwrap());
    }

    #[test]
    fn test_consensus_fitness_perfect_match() {
        let model = scenario_model();
        assert_eq!(
            consensus_fitness(&model.consensus(), &model).unwrap(),
            FitnessValue::MAX_FITNESS
        );
    }

    #[test]
    fn test_consensus_fitness_counts_tied_symbols() {
        let refs = vec![seq("AA"), seq("CA")];
        let model = ConservationModel::build(&refs).unwrap();
        assert_eq!(
            consensus_fitness(&seq("CA"), &model).unwrap(),
            FitnessValue::MAX_FITNESS
        );
    }

    #[test]
    fn test_consensus_fitness_is_deterministic() {
        let model = scenario_model();
        let s = seq("CACAC");
        let first = consensus_fitness(&s, &model).unwrap();
        for _ in 0..10 {
            assert_eq!(consensus_fitness(&s, &model).unwrap(), first);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let model = scenario_model();
        let err = consensus_fitness(&seq("AAAA"), &model).unwrap_err();
        assert_eq!(
            err,
            FitnessError::LengthMismatch {
                expected: 5,
                actual: 4
            }
        );
        assert!(conservation_gate(&seq("AAAAAA"), &model).is_err());
    }

    #[test]
    fn test_gate_fails_on_conserved_change() {
        let model = scenario_model();
        assert!(!conservation_gate(&seq("CAAAA"), &model).unwrap());
    }

    #[test]
    fn test_gate_monotonic_under_non_conserved_changes() {
        let alphabet = Alphabet::new("ACG").unwrap();
        let parse = |text: &str| Sequence::parse(text, &alphabet).unwrap();
        // positions 0, 2 and 4 conserved; 1, 3 and 5 variable
        let refs = vec![
            parse("AACAGA"),
            parse("ACCCGA"),
            parse("AGCAGC"),
            parse("AACGGG"),
        ];
        let model = ConservationModel::build(&refs).unwrap();
        let variable: Vec<usize> = (0..model.len()).filter(|&i| !model.is_conserved(i)).collect();
        assert_eq!(variable, vec![1, 3, 5]);

        let base = model.consensus();
        assert!(conservation_gate(&base, &model).unwrap());

        // every assignment of the variable positions over the alphabet
        let symbols = alphabet.symbols();
        let combinations = symbols.len().pow(variable.len() as u32);
        for mut code in 0..combinations {
            let edits: Vec<(usize, u8)> = variable
                .iter()
                .map(|&position| {
                    let symbol = symbols[code % symbols.len()];
                    code /= symbols.len();
                    (position, symbol)
                })
                .collect();
            let variant = base.with_substitutions(&edits).unwrap();
            assert!(
                conservation_gate(&variant, &model).unwrap(),
                "gate rejected {variant}"
            );
        }

        // and any conserved change fails it
        for &position in &[0, 2, 4] {
            let current = base.as_bytes()[position];
            let other = symbols.iter().copied().find(|&s| s != current).unwrap();
            let variant = base.with_substitutions(&[(position, other)]).unwrap();
            assert!(!conservation_gate(&variant, &model).unwrap());
        }
    }

    #[test]
    fn test_gated_fitness_multiplies_external_scores() {
        let model = scenario_model();
        let gated = ConservationGatedFitness::new(|_: &Sequence| 0.5, |_: &Sequence| 0.8);
        let value = gated.evaluate(&seq("AAAAC"), &model).unwrap();
        assert!((value.get() - 0.4).abs() < 1e-12);

        let zero = gated.evaluate(&seq("AACAA"), &model).unwrap();
        assert!(zero.is_lethal());
    }

    #[test]
    fn test_gated_fitness_clamps_scores() {
        let model = scenario_model();
        let gated = ConservationGatedFitness::new(|_: &Sequence| 3.0, |_: &Sequence| 1.0);
        assert_eq!(
            gated.evaluate(&seq("AAAAA"), &model).unwrap(),
            FitnessValue::MAX_FITNESS
        );
    }

    #[test]
    fn test_evaluate_batch_preserves_order() {
        let model = scenario_model();
        let seqs = [seq("AAAAA"), seq("CAAAA"), seq("CCAAC")];
        let refs: Vec<&Sequence> = seqs.iter().collect();
        let values = evaluate_batch(&ConsensusFitness, &model, &refs).unwrap();
        let expected: Vec<f64> = vec![1.0, 0.8, 0.4];
        for (v, e) in values.iter().zip(expected) {
            assert!((v.get() - e).abs() < 1e-12);
        }
    }
}
