//! Maps learning objectives onto curriculum standards by word overlap.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{content_words, jaccard, require_text, round_to};

pub const DEFAULT_THRESHOLD: f64 = 0.15;
pub const DEFAULT_MAX_MATCHES: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct Standard {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumMapInput {
    pub objectives: Vec<String>,
    pub standards: Vec<Standard>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_max_matches() -> usize {
    DEFAULT_MAX_MATCHES
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardMatch {
    pub code: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveMapping {
    pub objective: String,
    pub matches: Vec<StandardMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumMapOutput {
    pub mappings: Vec<ObjectiveMapping>,
    pub unmapped_objectives: Vec<String>,
    pub uncovered_standards: Vec<String>,
    pub coverage_percent: f64,
}

pub fn map_curriculum(input: CurriculumMapInput) -> Result<CurriculumMapOutput, ToolError> {
    if input.objectives.is_empty() {
        return Err(ToolError::invalid("objectives must not be empty"));
    }
    if input.standards.is_empty() {
        return Err(ToolError::invalid("standards must not be empty"));
    }
    if !(0.0..=1.0).contains(&input.threshold) {
        return Err(ToolError::invalid("threshold must be between 0 and 1"));
    }
    if input.max_matches == 0 {
        return Err(ToolError::invalid("maxMatches must be at least 1"));
    }

    let mut standards: Vec<(String, BTreeSet<String>)> = Vec::with_capacity(input.standards.len());
    for (i, standard) in input.standards.iter().enumerate() {
        let code = require_text(&format!("standards[{i}].code"), &standard.code)?;
        let description =
            require_text(&format!("standards[{i}].description"), &standard.description)?;
        standards.push((code.to_string(), content_words(description)));
    }

    let mut mappings = Vec::with_capacity(input.objectives.len());
    let mut unmapped_objectives = Vec::new();
    let mut covered: HashSet<String> = HashSet::new();

    for (i, objective) in input.objectives.iter().enumerate() {
        let objective = require_text(&format!("objectives[{i}]"), objective)?;
        let words = content_words(objective);

        let mut matches: Vec<StandardMatch> = standards
            .iter()
            .map(|(code, standard_words)| StandardMatch {
                code: code.clone(),
                score: jaccard(&words, standard_words),
            })
            // exclude zero overlap even when the threshold is 0
            .filter(|m| m.score > 0.0 && m.score >= input.threshold)
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.code.cmp(&b.code)));
        matches.truncate(input.max_matches);
        for m in &mut matches {
            m.score = round_to(m.score, 3);
            covered.insert(m.code.clone());
        }

        if matches.is_empty() {
            unmapped_objectives.push(objective.to_string());
        }
        mappings.push(ObjectiveMapping {
            objective: objective.to_string(),
            matches,
        });
    }

    let uncovered_standards: Vec<String> = standards
        .iter()
        .filter(|(code, _)| !covered.contains(code))
        .map(|(code, _)| code.clone())
        .collect();
    let covered_count = standards.len() - uncovered_standards.len();

    Ok(CurriculumMapOutput {
        mappings,
        unmapped_objectives,
        uncovered_standards,
        coverage_percent: round_to(covered_count as f64 * 100.0 / standards.len() as f64, 1),
    })
}

pub struct CurriculumMap;

#[async_trait]
impl ToolPackage for CurriculumMap {
    fn name(&self) -> &'static str {
        "@toolpipe/curriculum-map"
    }

    fn export_name(&self) -> &'static str {
        "curriculumMap"
    }

    fn description(&self) -> &'static str {
        "Map learning objectives to curriculum standards by keyword similarity and report coverage gaps."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("objectives", "string[]", "Learning objectives"),
            ParameterSpec::required(
                "standards",
                "object[]",
                "Standards as {code, description}",
            ),
            ParameterSpec::optional(
                "threshold",
                "number",
                "Minimum similarity score for a match",
                Some(json!(DEFAULT_THRESHOLD)),
            ),
            ParameterSpec::optional(
                "maxMatches",
                "number",
                "Maximum matches per objective",
                Some(json!(DEFAULT_MAX_MATCHES)),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Objective mappings, unmapped objectives, uncovered standards and coverage",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&map_curriculum(parse_input(input)?)?)
    }
}
