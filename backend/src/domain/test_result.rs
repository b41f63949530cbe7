//! Cognitive test results: kinds, stored rows, and submission drafts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Closed set of cognitive test categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ReactionTime,
    SequenceMemory,
    VerbalMemory,
}

impl TestKind {
    /// All kinds, in the order the scoring engine consumes them.
    pub const ALL: [TestKind; 3] = [
        TestKind::ReactionTime,
        TestKind::SequenceMemory,
        TestKind::VerbalMemory,
    ];

    /// Stable wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReactionTime => "reaction_time",
            Self::SequenceMemory => "sequence_memory",
            Self::VerbalMemory => "verbal_memory",
        }
    }
}

/// Error returned when parsing a test kind from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTestKindError;

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ParseTestKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid test kind")
    }
}

impl std::error::Error for ParseTestKindError {}

impl FromStr for TestKind {
    type Err = ParseTestKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "reaction_time" => Ok(Self::ReactionTime),
            "sequence_memory" => Ok(Self::SequenceMemory),
            "verbal_memory" => Ok(Self::VerbalMemory),
            _ => Err(ParseTestKindError),
        }
    }
}

/// A stored test result. Immutable once created: no update port exists.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub kind: TestKind,
    pub score: f64,
    /// Reaction latency in milliseconds; reaction-time results only.
    pub reaction_time_ms: Option<i32>,
    /// Sequence level reached; sequence-memory results only.
    pub level: Option<i32>,
    /// Correct answers; verbal-memory results only.
    pub correct_answers: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Validated submission payload for a new test result.
///
/// Shape validation happens in [`TestResultDraft::new`]; out-of-range but
/// well-formed scores are accepted as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResultDraft {
    pub kind: TestKind,
    pub score: f64,
    pub reaction_time_ms: Option<i32>,
    pub level: Option<i32>,
    pub correct_answers: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

/// Validation errors for test submissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestSubmissionError {
    #[error("score must be a finite, non-negative number")]
    InvalidScore,
    #[error("{field} must be non-negative")]
    NegativeField { field: &'static str },
}

impl TestResultDraft {
    /// Validate a submission's shape.
    pub fn new(
        kind: TestKind,
        score: f64,
        reaction_time_ms: Option<i32>,
        level: Option<i32>,
        correct_answers: Option<i32>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, TestSubmissionError> {
        if !score.is_finite() || score < 0.0 {
            return Err(TestSubmissionError::InvalidScore);
        }
        for (field, value) in [
            ("reactionTimeMs", reaction_time_ms),
            ("level", level),
            ("correctAnswers", correct_answers),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(TestSubmissionError::NegativeField { field });
            }
        }
        Ok(Self {
            kind,
            score,
            reaction_time_ms,
            level,
            correct_answers,
            metadata,
        })
    }
}
