//! Keyword-based task priority classifier
//!
//! Priority is never chosen by the client. Whenever a task's title or
//! description is written, the stored priority is recomputed from the text:
//!
//! | Lowercased `"{title} {description}"` contains | Priority |
//! |-----------------------------------------------|----------|
//! | `urgent` or `important`                       | `high`   |
//! | `later`                                       | `low`    |
//! | anything else                                 | `medium` |
//!
//! The `high` keywords win over `later` when both appear.

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use std::fmt;
use std::str::FromStr;

/// Task priority as stored in `tasks.priority`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Short human-readable recommendation shown next to the suggestion
    pub fn advice(&self) -> &'static str {
        match self {
            Priority::High => "This task looks urgent. Prioritize it right away.",
            Priority::Medium => "Standard priority. Schedule it accordingly.",
            Priority::Low => "This can wait. No rush.",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

// Stored as plain TEXT (guarded by a CHECK constraint) rather than a Postgres enum
impl sqlx::Type<Postgres> for Priority {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, Postgres> for Priority {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <&str as sqlx::Encode<'q, Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for Priority {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as sqlx::Decode<'r, Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

/// Result of `POST /tasks/analyze-task`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub advice: String,
    pub suggested_priority: Priority,
}

const HIGH_KEYWORDS: &[&str] = &["urgent", "important"];
const LOW_KEYWORDS: &[&str] = &["later"];

/// Classifies a task's text into a priority
pub fn classify(title: &str, description: Option<&str>) -> Priority {
    let combined = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();

    if HIGH_KEYWORDS.iter().any(|k| combined.contains(k)) {
        Priority::High
    } else if LOW_KEYWORDS.iter().any(|k| combined.contains(k)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Classifies a task and attaches the matching advice
pub fn analyze_task(title: &str, description: Option<&str>) -> TaskAnalysis {
    let priority = classify(title, description);
    TaskAnalysis {
        advice: priority.advice().to_string(),
        suggested_priority: priority,
    }
}
