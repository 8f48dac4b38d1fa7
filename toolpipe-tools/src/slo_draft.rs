//! Drafts service level objectives with error budgets.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{require_finite, require_text, round_to};

const MAX_METRICS: usize = 20;
const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SloDraftInput {
    pub service: String,
    pub metrics: Vec<MetricInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricInput {
    pub name: String,
    pub target: f64,
    pub window: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn for_target(target: f64) -> Self {
        if target >= 99.9 {
            Severity::Critical
        } else if target >= 99.0 {
            Severity::High
        } else if target >= 95.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Rolling,
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorBudget {
    pub percent: f64,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slo {
    pub name: String,
    pub target: f64,
    pub window: String,
    pub window_type: WindowType,
    pub window_days: f64,
    pub severity: Severity,
    pub error_budget: ErrorBudget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SloDraftOutput {
    pub service: String,
    pub slos: Vec<Slo>,
    pub markdown: String,
}

/// Parses a window such as `30d`, `12h`, `4w` or `calendar-month` into
/// its type and length in minutes.
pub fn parse_window(window: &str) -> Result<(WindowType, f64), ToolError> {
    let normalized = window.trim().to_lowercase();
    match normalized.as_str() {
        "month" | "monthly" | "calendar-month" => {
            return Ok((WindowType::Calendar, 30.0 * MINUTES_PER_DAY));
        }
        "quarter" | "quarterly" | "calendar-quarter" => {
            return Ok((WindowType::Calendar, 90.0 * MINUTES_PER_DAY));
        }
        _ => {}
    }

    let invalid = || {
        ToolError::invalid(format!(
            "window '{window}' must look like '30d', '24h', '4w', 'calendar-month' or 'quarter'"
        ))
    };
    let unit = normalized.chars().last().ok_or_else(invalid)?;
    let amount: u32 = normalized[..normalized.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }
    let minutes_per_unit = match unit {
        'h' => 60.0,
        'd' => MINUTES_PER_DAY,
        'w' => 7.0 * MINUTES_PER_DAY,
        _ => return Err(invalid()),
    };
    Ok((WindowType::Rolling, f64::from(amount) * minutes_per_unit))
}

pub fn draft_slos(input: SloDraftInput) -> Result<SloDraftOutput, ToolError> {
    let service = require_text("service", &input.service)?.to_string();
    if input.metrics.is_empty() || input.metrics.len() > MAX_METRICS {
        return Err(ToolError::invalid(format!(
            "metrics must contain between 1 and {MAX_METRICS} entries"
        )));
    }

    let mut slos = Vec::with_capacity(input.metrics.len());
    for (position, metric) in input.metrics.into_iter().enumerate() {
        let name = require_text(&format!("metrics[{position}].name"), &metric.name)?.to_string();
        let target = require_finite(&format!("metrics[{position}].target"), metric.target)?;
        if target <= 0.0 || target >= 100.0 {
            return Err(ToolError::invalid(format!(
                "metrics[{position}].target must be between 0 and 100 (exclusive), got {target}"
            )));
        }
        let (window_type, window_minutes) = parse_window(&metric.window)?;
        let budget_percent = 100.0 - target;

        slos.push(Slo {
            name,
            target,
            window: metric.window.trim().to_string(),
            window_type,
            window_days: round_to(window_minutes / MINUTES_PER_DAY, 2),
            severity: Severity::for_target(target),
            error_budget: ErrorBudget {
                percent: round_to(budget_percent, 4),
                minutes: round_to(budget_percent / 100.0 * window_minutes, 1),
            },
            description: metric
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        });
    }

    let markdown = render_markdown(&service, &slos);
    Ok(SloDraftOutput {
        service,
        slos,
        markdown,
    })
}

fn render_markdown(service: &str, slos: &[Slo]) -> String {
    let mut out = format!("# Service Level Objectives: {service}\n\n");
    out.push_str("| SLO | Target | Window | Severity | Error budget |\n");
    out.push_str("|-----|--------|--------|----------|--------------|\n");
    for slo in slos {
        let window_type = match slo.window_type {
            WindowType::Rolling => "rolling",
            WindowType::Calendar => "calendar",
        };
        let _ = writeln!(
            out,
            "| {} | {}% | {} ({}) | {} | {} min |",
            slo.name,
            slo.target,
            slo.window,
            window_type,
            slo.severity.as_str(),
            slo.error_budget.minutes
        );
    }

    let described: Vec<&Slo> = slos.iter().filter(|s| s.description.is_some()).collect();
    if !described.is_empty() {
        out.push_str("\n## Notes\n\n");
        for slo in described {
            let _ = writeln!(
                out,
                "- **{}**: {}",
                slo.name,
                slo.description.as_deref().unwrap_or_default()
            );
        }
    }

    out.push_str("\n## Alerting\n\n");
    out.push_str(
        "- Page when the burn rate would exhaust the error budget within 1 hour.\n\
         - Open a ticket when the burn rate would exhaust it within 3 days.\n",
    );
    out
}

pub struct SloDraft;

#[async_trait]
impl ToolPackage for SloDraft {
    fn name(&self) -> &'static str {
        "@toolpipe/slo-draft"
    }

    fn export_name(&self) -> &'static str {
        "sloDraft"
    }

    fn description(&self) -> &'static str {
        "Draft SLOs for a service: classify each metric's severity, window type and error budget, and render a markdown summary."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("service", "string", "Service name"),
            ParameterSpec::required(
                "metrics",
                "object[]",
                "Metrics as {name, target (percent), window (e.g. 30d), description?}",
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new("object", "SLO list and markdown document"))
    }

    fn input_schema(&self) -> Option<Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "service": { "type": "string", "description": "Service name" },
                "metrics": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": MAX_METRICS,
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "target": { "type": "number" },
                            "window": { "type": "string" },
                            "description": { "type": "string" }
                        },
                        "required": ["name", "target", "window"]
                    }
                }
            },
            "required": ["service", "metrics"]
        }))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&draft_slos(parse_input(input)?)?)
    }
}
