use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One resume's evaluation as returned by the scoring service.
///
/// Every field decodes leniently: the service fills these from model output,
/// so a wrong-typed value degrades to a default instead of rejecting the
/// whole batch. Use the `effective_*` accessors wherever a score is ranked
/// or displayed; they apply the zero default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(default, deserialize_with = "lenient_filename")]
    pub filename: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub candidate_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub skills_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub experience_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub education_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub gaps: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub justification: Option<String>,
}

impl ScoredCandidate {
    pub fn effective_overall_score(&self) -> f64 {
        effective(self.overall_score)
    }

    pub fn effective_skills_score(&self) -> f64 {
        effective(self.skills_score)
    }

    pub fn effective_experience_score(&self) -> f64 {
        effective(self.experience_score)
    }

    pub fn effective_education_score(&self) -> f64 {
        effective(self.education_score)
    }
}

/// Envelope returned by `POST /match`.
///
/// `shortlisted_candidates` is required: a body without it is a malformed
/// response, not an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub shortlisted_candidates: Vec<ScoredCandidate>,
}

/// Absent, NaN and infinite scores all count as 0.
fn effective(score: Option<f64>) -> f64 {
    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

/// Accepts JSON numbers and numeric strings; everything else decodes as absent.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(score_from_value))
}

fn score_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Strings pass through and numbers are stringified; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_from_value))
}

fn lenient_filename<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Arrays keep their text items and drop the rest. A bare string becomes a
/// one-item list, or an empty one when blank.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_from_value).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
