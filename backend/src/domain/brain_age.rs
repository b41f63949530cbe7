//! Brain-age scoring engine.
//!
//! Pure arithmetic over recent per-kind samples; persistence of the computed
//! value is the caller's job. The estimate is a synthetic 20–80 scalar: three
//! per-kind averages are normalised onto a 0–100 fitness scale and the
//! combined fitness is mapped linearly onto the age range.

/// Number of most-recent results per kind fed into the estimate.
pub const SAMPLE_WINDOW: usize = 5;

/// Youngest age the estimate can produce.
pub const MIN_BRAIN_AGE: f64 = 20.0;
/// Oldest age the estimate can produce.
pub const MAX_BRAIN_AGE: f64 = 80.0;

/// Per-kind samples for one user, newest first or oldest first — order does
/// not matter, only the values do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainAgeInputs {
    /// Reaction latencies in milliseconds.
    pub reaction_times_ms: Vec<f64>,
    /// Sequence levels reached.
    pub sequence_levels: Vec<f64>,
    /// Verbal correct-answer counts.
    pub correct_answers: Vec<f64>,
}

impl BrainAgeInputs {
    /// True when every kind has at least one sample.
    pub fn is_complete(&self) -> bool {
        !self.reaction_times_ms.is_empty()
            && !self.sequence_levels.is_empty()
            && !self.correct_answers.is_empty()
    }
}

/// Estimate a brain age from the given samples.
///
/// Returns `None` unless at least one sample exists for every kind; a user
/// who has never taken one of the three tests has no brain age. The result
/// is rounded to one decimal place and always lies in
/// [[`MIN_BRAIN_AGE`], [`MAX_BRAIN_AGE`]].
pub fn estimate(inputs: &BrainAgeInputs) -> Option<f64> {
    if !inputs.is_complete() {
        return None;
    }

    let avg_reaction = mean(&inputs.reaction_times_ms);
    let avg_level = mean(&inputs.sequence_levels);
    let avg_correct = mean(&inputs.correct_answers);

    let fitness =
        reaction_factor(avg_reaction) + level_factor(avg_level) + correct_factor(avg_correct);

    let age = MIN_BRAIN_AGE + (MAX_BRAIN_AGE - MIN_BRAIN_AGE) * (1.0 - fitness / 300.0);
    Some(round_to_tenth(age))
}

/// 200 ms maps to 100, 600 ms to 0; inverse and clamped at both ends.
fn reaction_factor(avg_reaction_ms: f64) -> f64 {
    (((600.0 - avg_reaction_ms) / 400.0) * 100.0).clamp(0.0, 100.0)
}

/// Level 10 maps to 100.
fn level_factor(avg_level: f64) -> f64 {
    ((avg_level / 10.0) * 100.0).clamp(0.0, 100.0)
}

/// 50 correct answers map to 100.
fn correct_factor(avg_correct: f64) -> f64 {
    ((avg_correct / 50.0) * 100.0).clamp(0.0, 100.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
