use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of material labels the classifier can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cardboard,
    Glass,
    Metal,
    Paper,
    Plastic,
    Trash,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cardboard,
        Category::Glass,
        Category::Metal,
        Category::Paper,
        Category::Plastic,
        Category::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cardboard => "cardboard",
            Category::Glass => "glass",
            Category::Metal => "metal",
            Category::Paper => "paper",
            Category::Plastic => "plastic",
            Category::Trash => "trash",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Request body sent to the classifier.
#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub image: &'a str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f32,
    pub all_predictions: Option<BTreeMap<Category, f32>>,
}

impl ClassificationResult {
    /// Validate a classifier response body into a typed result.
    ///
    /// `predicted_class` must be a vocabulary member and `confidence_score` a
    /// number in [0,1]. `all_predictions` may be absent or null; when present
    /// every entry must be a known category mapped to a number. Extra fields
    /// are ignored.
    pub fn from_response_body(body: &str) -> PipelineResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| PipelineError::malformed(format!("body is not JSON: {}", e)))?;

        let obj = value
            .as_object()
            .ok_or_else(|| PipelineError::malformed("body is not a JSON object"))?;

        let category = match obj.get("predicted_class") {
            Some(Value::String(s)) => s.parse::<Category>().map_err(PipelineError::malformed)?,
            Some(_) => return Err(PipelineError::malformed("predicted_class is not a string")),
            None => return Err(PipelineError::malformed("missing predicted_class")),
        };

        let confidence = match obj.get("confidence_score") {
            Some(v) => score_from_value(v).ok_or_else(|| {
                PipelineError::malformed("confidence_score is not a number in [0,1]")
            })?,
            None => return Err(PipelineError::malformed("missing confidence_score")),
        };

        let all_predictions = match obj.get("all_predictions") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => {
                let mut scores = BTreeMap::new();
                for (name, v) in map {
                    let cat = name.parse::<Category>().map_err(PipelineError::malformed)?;
                    let score = score_from_value(v).ok_or_else(|| {
                        PipelineError::malformed(format!(
                            "score for '{}' is not a number in [0,1]",
                            name
                        ))
                    })?;
                    scores.insert(cat, score);
                }
                Some(scores)
            }
            Some(_) => return Err(PipelineError::malformed("all_predictions is not an object")),
        };

        Ok(ClassificationResult {
            category,
            confidence,
            all_predictions,
        })
    }

    pub fn confidence_percent(&self) -> String {
        format_percent(self.confidence)
    }

    /// The "Done!" summary shown once a run succeeds.
    pub fn summary(&self) -> String {
        format!(
            "Predicted: {}\nConfidence: {}",
            self.category,
            self.confidence_percent()
        )
    }

    /// Per-category scores, highest first. Empty when the classifier sent none.
    pub fn ranked_predictions(&self) -> Vec<(Category, f32)> {
        let mut ranked: Vec<(Category, f32)> = self
            .all_predictions
            .as_ref()
            .map(|m| m.iter().map(|(c, s)| (*c, *s)).collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

fn score_from_value(v: &Value) -> Option<f32> {
    let score = v.as_f64()?;
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Some(score as f32)
    } else {
        None
    }
}

/// Render a [0,1] score as a percentage with two decimals.
pub fn format_percent(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}
