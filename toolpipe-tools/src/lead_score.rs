//! Rule-based B2B lead scoring.
//!
//! The score is the sum of four capped categories (fit 30, authority 20,
//! timing 10, engagement 40) and maps onto a letter grade.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::tokens;

const FIT_CAP: u32 = 30;
const AUTHORITY_CAP: u32 = 20;
const TIMING_CAP: u32 = 10;
const ENGAGEMENT_CAP: u32 = 40;

const DEFAULT_TARGET_INDUSTRIES: &[&str] = &["software", "saas", "technology", "fintech"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScoreInput {
    pub lead: Lead,
    #[serde(default)]
    pub target_industries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_size: Option<u64>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub budget_confirmed: Option<bool>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Grade::A,
            65..=79 => Grade::B,
            50..=64 => Grade::C,
            35..=49 => Grade::D,
            _ => Grade::F,
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Grade::A => "Route to sales immediately",
            Grade::B => "Schedule a discovery call within 48 hours",
            Grade::C => "Nurture with targeted content and re-score after new activity",
            Grade::D => "Keep in automated nurture sequence",
            Grade::F => "Do not route to sales; revisit if engagement increases",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub fit: u32,
    pub authority: u32,
    pub timing: u32,
    pub engagement: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScoreOutput {
    pub score: u32,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub signals: Vec<String>,
    pub recommendation: String,
}

pub fn score_lead(input: LeadScoreInput) -> Result<LeadScoreOutput, ToolError> {
    let lead = &input.lead;
    validate(lead)?;

    let mut signals = Vec::new();
    let targets: Vec<String> = match &input.target_industries {
        Some(list) => list.iter().map(|s| s.trim().to_lowercase()).collect(),
        None => DEFAULT_TARGET_INDUSTRIES
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let fit = fit_points(lead, &targets, &mut signals);
    let authority = authority_points(lead.job_title.as_deref(), &mut signals);
    let timing = timing_points(lead, &mut signals);
    let engagement = engagement_points(&lead.activities, &mut signals);

    let breakdown = ScoreBreakdown {
        fit,
        authority,
        timing,
        engagement,
    };
    let score = fit + authority + timing + engagement;
    let grade = Grade::from_score(score);

    Ok(LeadScoreOutput {
        score,
        grade,
        breakdown,
        signals,
        recommendation: grade.recommendation().to_string(),
    })
}

fn validate(lead: &Lead) -> Result<(), ToolError> {
    if let Some(email) = &lead.email {
        if !email.contains('@') {
            return Err(ToolError::invalid(format!(
                "lead.email '{email}' is not a valid email address"
            )));
        }
    }
    for (position, activity) in lead.activities.iter().enumerate() {
        if activity.kind.trim().is_empty() {
            return Err(ToolError::invalid(format!(
                "lead.activities[{position}].type must be a non-empty string"
            )));
        }
        if activity.count == 0 {
            return Err(ToolError::invalid(format!(
                "lead.activities[{position}].count must be at least 1"
            )));
        }
    }
    Ok(())
}

fn fit_points(lead: &Lead, targets: &[String], signals: &mut Vec<String>) -> u32 {
    let mut points = match lead.company_size {
        None | Some(0) => 0,
        Some(1..=10) => 5,
        Some(11..=50) => 10,
        Some(51..=200) => 15,
        Some(201..=1000) => 20,
        Some(_) => 25,
    };
    if let Some(size) = lead.company_size.filter(|size| *size > 0) {
        signals.push(format!("company size {size} (+{points})"));
    }
    if let Some(industry) = lead.industry.as_deref() {
        let normalized = industry.trim().to_lowercase();
        if targets.iter().any(|target| *target == normalized) {
            points += 5;
            signals.push(format!("target industry '{normalized}' (+5)"));
        }
    }
    points.min(FIT_CAP)
}

fn authority_points(title: Option<&str>, signals: &mut Vec<String>) -> u32 {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };
    let words = tokens(title);
    let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(&w.as_str()));

    let points = if has(&[
        "ceo", "cto", "cfo", "coo", "cmo", "cio", "chief", "founder", "cofounder", "owner",
        "president", "vp",
    ]) {
        20
    } else if has(&["director", "head"]) {
        15
    } else if has(&["manager", "lead"]) {
        10
    } else {
        5
    };
    signals.push(format!("job title '{title}' (+{points})"));
    points.min(AUTHORITY_CAP)
}

fn timing_points(lead: &Lead, signals: &mut Vec<String>) -> u32 {
    let mut points = 0;
    if lead.budget_confirmed == Some(true) {
        points += 5;
        signals.push("budget confirmed (+5)".to_string());
    }
    if let Some(timeline) = lead.timeline.as_deref() {
        let normalized = normalize_key(timeline);
        let bonus = match normalized.as_str() {
            "immediate" | "this_month" | "this_quarter" => 5,
            "this_year" => 2,
            _ => 0,
        };
        if bonus > 0 {
            points += bonus;
            signals.push(format!("timeline '{normalized}' (+{bonus})"));
        }
    }
    points.min(TIMING_CAP)
}

fn activity_weight(kind: &str) -> Option<u32> {
    match kind {
        "demo_request" => Some(15),
        "trial_signup" => Some(12),
        "pricing_page" | "pricing_page_visit" => Some(10),
        "webinar" | "webinar_attended" => Some(8),
        "content_download" => Some(5),
        "email_click" => Some(3),
        "website_visit" => Some(2),
        "email_open" => Some(1),
        _ => None,
    }
}

fn engagement_points(activities: &[Activity], signals: &mut Vec<String>) -> u32 {
    let mut total = 0u32;
    for activity in activities {
        let kind = normalize_key(&activity.kind);
        match activity_weight(&kind) {
            Some(weight) => {
                let points = weight.saturating_mul(activity.count);
                total = total.saturating_add(points);
                signals.push(format!("{kind} x{} (+{points})", activity.count));
            }
            None => signals.push(format!("{kind} ignored (unknown activity)")),
        }
    }
    if total > ENGAGEMENT_CAP {
        signals.push(format!("engagement capped at {ENGAGEMENT_CAP}"));
    }
    total.min(ENGAGEMENT_CAP)
}

fn normalize_key(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

pub struct LeadScore;

#[async_trait]
impl ToolPackage for LeadScore {
    fn name(&self) -> &'static str {
        "@toolpipe/lead-score"
    }

    fn export_name(&self) -> &'static str {
        "leadScore"
    }

    fn description(&self) -> &'static str {
        "Score a B2B lead from 0 to 100 across fit, authority, timing and engagement, and assign a grade from A to F."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required(
                "lead",
                "object",
                "Lead attributes: companySize, industry, jobTitle, budgetConfirmed, timeline, activities[{type, count}]",
            ),
            ParameterSpec::optional(
                "targetIndustries",
                "string[]",
                "Industries that earn a fit bonus",
                Some(json!(DEFAULT_TARGET_INDUSTRIES)),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Score, grade, per-category breakdown, signals and a routing recommendation",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&score_lead(parse_input(input)?)?)
    }
}
