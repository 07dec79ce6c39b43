//! Status and kind enums shared by form templates.

use serde::{Deserialize, Serialize};

/// Lifecycle of a feedback form template.
///
/// Serialized with the backend's capitalized names (`"Created"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FormStatus {
    #[default]
    Created,
    Sent,
    Completed,
}

impl std::fmt::Display for FormStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Sent => write!(f, "Sent"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Kind of answer a feedback question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "Multiple Choice")]
    MultipleChoice,
    Free,
    Scale,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleChoice => write!(f, "Multiple Choice"),
            Self::Free => write!(f, "Free"),
            Self::Scale => write!(f, "Scale"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "multiple choice" | "multiple_choice" | "choice" => Ok(Self::MultipleChoice),
            "free" => Ok(Self::Free),
            "scale" => Ok(Self::Scale),
            _ => Err(format!("invalid question type: {s}")),
        }
    }
}
