//! Incident runbook drafting.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::require_text;

const MINUTES_PER_DIAGNOSTIC: usize = 5;
const MINUTES_PER_REMEDIATION: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Sev1,
    Sev2,
    Sev3,
    Sev4,
}

impl IncidentSeverity {
    fn label(self) -> &'static str {
        match self {
            IncidentSeverity::Sev1 => "SEV1 (critical, page immediately)",
            IncidentSeverity::Sev2 => "SEV2 (major, page during business hours)",
            IncidentSeverity::Sev3 => "SEV3 (minor, ticket)",
            IncidentSeverity::Sev4 => "SEV4 (informational)",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EscalationContact {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunbookDraftInput {
    pub service: String,
    pub alert_name: String,
    pub severity: IncidentSeverity,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
    pub remediation: Vec<String>,
    #[serde(default)]
    pub escalation: Vec<EscalationContact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunbookDraftOutput {
    pub title: String,
    pub markdown: String,
    pub sections: Vec<String>,
    pub step_count: usize,
    pub estimated_minutes: usize,
}

fn clean_list(field: &str, items: Vec<String>) -> Result<Vec<String>, ToolError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| require_text(&format!("{field}[{i}]"), &item).map(str::to_string))
        .collect()
}

fn numbered(out: &mut String, steps: &[String]) {
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {step}", i + 1);
    }
}

pub fn draft_runbook(input: RunbookDraftInput) -> Result<RunbookDraftOutput, ToolError> {
    let service = require_text("service", &input.service)?;
    let alert_name = require_text("alertName", &input.alert_name)?;
    let symptoms = clean_list("symptoms", input.symptoms)?;
    let diagnostics = clean_list("diagnostics", input.diagnostics)?;
    let remediation = clean_list("remediation", input.remediation)?;
    if remediation.is_empty() {
        return Err(ToolError::invalid(
            "remediation must contain at least one step",
        ));
    }

    let title = format!("{service}: {alert_name}");
    let mut sections = vec!["Overview".to_string()];
    let mut markdown = format!("# Runbook: {title}\n\n## Overview\n\n");
    let _ = writeln!(markdown, "- **Service:** {service}");
    let _ = writeln!(markdown, "- **Alert:** {alert_name}");
    let _ = writeln!(markdown, "- **Severity:** {}", input.severity.label());

    if !symptoms.is_empty() {
        sections.push("Symptoms".into());
        markdown.push_str("\n## Symptoms\n\n");
        for symptom in &symptoms {
            let _ = writeln!(markdown, "- {symptom}");
        }
    }

    if !diagnostics.is_empty() {
        sections.push("Diagnostics".into());
        markdown.push_str("\n## Diagnostics\n\n");
        numbered(&mut markdown, &diagnostics);
    }

    sections.push("Remediation".into());
    markdown.push_str("\n## Remediation\n\n");
    numbered(&mut markdown, &remediation);

    if !input.escalation.is_empty() {
        sections.push("Escalation".into());
        markdown.push_str("\n## Escalation\n\n");
        for (i, contact) in input.escalation.iter().enumerate() {
            let name = require_text(&format!("escalation[{i}].name"), &contact.name)?;
            let reach = require_text(&format!("escalation[{i}].contact"), &contact.contact)?;
            let _ = writeln!(markdown, "{}. {name} ({reach})", i + 1);
        }
    }

    Ok(RunbookDraftOutput {
        title,
        markdown,
        sections,
        step_count: diagnostics.len() + remediation.len(),
        estimated_minutes: diagnostics.len() * MINUTES_PER_DIAGNOSTIC
            + remediation.len() * MINUTES_PER_REMEDIATION,
    })
}

pub struct RunbookDraft;

#[async_trait]
impl ToolPackage for RunbookDraft {
    fn name(&self) -> &'static str {
        "@toolpipe/runbook-draft"
    }

    fn export_name(&self) -> &'static str {
        "runbookDraft"
    }

    fn description(&self) -> &'static str {
        "Draft an incident runbook in markdown from an alert's symptoms, diagnostic steps, remediation steps and escalation contacts."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("service", "string", "Affected service"),
            ParameterSpec::required("alertName", "string", "Alert that triggers the runbook"),
            ParameterSpec::required("severity", "'sev1'|'sev2'|'sev3'|'sev4'", "Incident severity"),
            ParameterSpec::optional("symptoms", "string[]", "Observable symptoms", None),
            ParameterSpec::optional("diagnostics", "string[]", "Diagnostic steps", None),
            ParameterSpec::required("remediation", "string[]", "Remediation steps"),
            ParameterSpec::optional(
                "escalation",
                "object[]",
                "Escalation contacts as {name, contact}",
                None,
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Runbook markdown, section list and time estimate",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&draft_runbook(parse_input(input)?)?)
    }
}
