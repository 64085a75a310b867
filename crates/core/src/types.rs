use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MockviewError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Managerial,
    Coding,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Managerial => "managerial",
            InterviewType::Coding => "coding",
        }
    }
}

impl FromStr for InterviewType {
    type Err = MockviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "managerial" => Ok(InterviewType::Managerial),
            "coding" => Ok(InterviewType::Coding),
            _ => Err(MockviewError::validation(
                "Please select the type of interview.",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cpp,
    Python,
    Java,
    Javascript,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::Java => "java",
            Language::Javascript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores the evaluation backend assigns to one answer, each out of 10.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_score: Option<f64>,
}

impl DomainScores {
    /// Present scores in display order, keyed by their wire names.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        [
            ("clarity_score", self.clarity_score),
            ("technical_score", self.technical_score),
            ("structure_score", self.structure_score),
            ("face_confidence", self.face_confidence),
            ("answer_score", self.answer_score),
        ]
        .into_iter()
        .filter_map(|(name, score)| score.map(|s| (name, s)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub gpt: String,
}

/// One answered question. Appended once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question: String,
    #[serde(default)]
    pub transcription: String,
    #[serde(default)]
    pub feedback: Feedback,
    #[serde(flatten)]
    pub scores: DomainScores,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub average_clarity_score: f64,
    pub average_technical_score: f64,
    pub average_structure_score: f64,
    pub average_face_confidence: f64,
}

impl Summary {
    pub fn rows(&self) -> [(&'static str, f64); 4] {
        [
            ("Clarity", self.average_clarity_score),
            ("Technical", self.average_technical_score),
            ("Structure", self.average_structure_score),
            ("Face Confidence", self.average_face_confidence),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewReport {
    pub summary: Summary,
    pub evaluations: Vec<Evaluation>,
    pub overall_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_path: Option<Vec<String>>,
}

/// A past code submission as listed by the backend.
///
/// Null and empty fields fall back the same way a missing key does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default = "Submission::unknown_role", deserialize_with = "role_or_unknown")]
    pub role: String,
    #[serde(
        default = "Submission::default_difficulty",
        deserialize_with = "difficulty_or_medium"
    )]
    pub difficulty: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub code: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub output: String,
}

impl Submission {
    fn unknown_role() -> String {
        "Unknown".to_string()
    }

    fn default_difficulty() -> String {
        "Medium".to_string()
    }
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

fn role_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(non_empty(deserializer)?.unwrap_or_else(Submission::unknown_role))
}

fn difficulty_or_medium<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(non_empty(deserializer)?.unwrap_or_else(Submission::default_difficulty))
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
