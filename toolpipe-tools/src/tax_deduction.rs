//! Flags potentially deductible expenses using a keyword rule table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{require_finite, require_text, round_to, tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingType {
    #[default]
    Individual,
    Business,
}

struct Rule {
    category: &'static str,
    keywords: &'static [&'static str],
    individual_rate: f64,
    business_rate: f64,
}

impl Rule {
    fn rate(&self, filing: FilingType) -> f64 {
        match filing {
            FilingType::Individual => self.individual_rate,
            FilingType::Business => self.business_rate,
        }
    }
}

const RULES: &[Rule] = &[
    Rule {
        category: "home_office",
        keywords: &["home office", "desk", "office chair", "internet", "coworking"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "software",
        keywords: &["software", "subscription", "saas", "license", "hosting", "cloud"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "equipment",
        keywords: &["laptop", "computer", "monitor", "printer", "equipment", "phone"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "professional_services",
        keywords: &["accountant", "lawyer", "legal", "consultant", "bookkeeping"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "education",
        keywords: &["course", "training", "conference", "certification", "tuition", "book"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "travel",
        keywords: &["flight", "hotel", "airfare", "train", "taxi", "uber", "lodging"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "mileage",
        keywords: &["mileage", "fuel", "gas", "parking", "toll"],
        individual_rate: 1.0,
        business_rate: 1.0,
    },
    Rule {
        category: "meals",
        keywords: &["meal", "lunch", "dinner", "restaurant", "coffee", "catering"],
        individual_rate: 0.5,
        business_rate: 0.5,
    },
    Rule {
        category: "charitable",
        keywords: &["donation", "charity", "charitable", "nonprofit"],
        individual_rate: 1.0,
        business_rate: 0.0,
    },
    Rule {
        category: "medical",
        keywords: &["medical", "doctor", "dental", "pharmacy", "prescription", "hospital"],
        individual_rate: 1.0,
        business_rate: 0.0,
    },
];

const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Deserialize)]
pub struct Expense {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeductionInput {
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub filing_type: FilingType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub deductible_amount: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub deductible: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeductionOutput {
    pub items: Vec<ScannedExpense>,
    pub by_category: Vec<CategoryTotal>,
    pub total_expenses: f64,
    pub total_deductible: f64,
    pub non_deductible: Vec<String>,
    pub notes: Vec<String>,
}

/// Resolves the rule for an expense: an explicit category wins, otherwise
/// the first rule with a keyword among the description's words.
fn find_rule(expense: &Expense) -> Option<&'static Rule> {
    if let Some(category) = expense.category.as_deref() {
        let wanted = category.trim().to_lowercase().replace([' ', '-'], "_");
        if let Some(rule) = RULES.iter().find(|r| r.category == wanted) {
            return Some(rule);
        }
    }
    let words = tokens(&expense.description);
    RULES.iter().find(|rule| {
        rule.keywords
            .iter()
            .any(|keyword| contains_phrase(&words, keyword))
    })
}

/// True when the words of `keyword` appear consecutively in `words`.
/// A trailing plural `s` on a description word still matches.
fn contains_phrase(words: &[String], keyword: &str) -> bool {
    let phrase: Vec<&str> = keyword.split_whitespace().collect();
    if phrase.is_empty() || phrase.len() > words.len() {
        return false;
    }
    words.windows(phrase.len()).any(|window| {
        window.iter().zip(&phrase).all(|(word, wanted)| {
            word == wanted || word.strip_suffix('s') == Some(*wanted)
        })
    })
}

pub fn scan_deductions(input: TaxDeductionInput) -> Result<TaxDeductionOutput, ToolError> {
    if input.expenses.is_empty() {
        return Err(ToolError::invalid("expenses must not be empty"));
    }

    let mut items = Vec::with_capacity(input.expenses.len());
    let mut by_category: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    let mut non_deductible = Vec::new();
    let mut seen_meals = false;

    for (i, expense) in input.expenses.iter().enumerate() {
        let description = require_text(&format!("expenses[{i}].description"), &expense.description)?;
        let amount = require_finite(&format!("expenses[{i}].amount"), expense.amount)?;
        if amount < 0.0 {
            return Err(ToolError::invalid(format!(
                "expenses[{i}].amount must not be negative"
            )));
        }

        let rule = find_rule(expense);
        let category = rule.map_or(UNCATEGORIZED, |r| r.category);
        let rate = rule.map_or(0.0, |r| r.rate(input.filing_type));
        let deductible_amount = round_to(amount * rate, 2);
        seen_meals |= category == "meals";

        if deductible_amount == 0.0 {
            non_deductible.push(description.to_string());
        }
        let entry = by_category.entry(category.to_string()).or_default();
        entry.0 += amount;
        entry.1 += deductible_amount;

        items.push(ScannedExpense {
            description: description.to_string(),
            amount,
            category: category.to_string(),
            deductible_amount,
            rate,
        });
    }

    let total_expenses = round_to(items.iter().map(|i| i.amount).sum(), 2);
    let total_deductible = round_to(items.iter().map(|i| i.deductible_amount).sum(), 2);

    let mut notes = Vec::new();
    if seen_meals {
        notes.push("Meals are generally only 50% deductible.".to_string());
    }
    if input.filing_type == FilingType::Business
        && items
            .iter()
            .any(|i| i.category == "charitable" || i.category == "medical")
    {
        notes.push(
            "Charitable and medical expenses are not deductible on a business return.".to_string(),
        );
    }
    if items.iter().any(|i| i.category == UNCATEGORIZED) {
        notes.push("Uncategorized expenses need manual review.".to_string());
    }
    notes.push("This is an estimate; confirm with a tax professional.".to_string());

    Ok(TaxDeductionOutput {
        items,
        by_category: by_category
            .into_iter()
            .map(|(category, (total, deductible))| CategoryTotal {
                category,
                total: round_to(total, 2),
                deductible: round_to(deductible, 2),
            })
            .collect(),
        total_expenses,
        total_deductible,
        non_deductible,
        notes,
    })
}

pub struct TaxDeductionScan;

#[async_trait]
impl ToolPackage for TaxDeductionScan {
    fn name(&self) -> &'static str {
        "@toolpipe/tax-deduction-scan"
    }

    fn export_name(&self) -> &'static str {
        "taxDeductionScan"
    }

    fn description(&self) -> &'static str {
        "Scan a list of expenses for likely tax deductions, with per-category totals and review notes."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required(
                "expenses",
                "object[]",
                "Expenses as {description, amount, category?}",
            ),
            ParameterSpec::optional(
                "filingType",
                "'individual'|'business'",
                "Type of tax return",
                Some(json!("individual")),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Categorised expenses with deductible amounts and totals",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&scan_deductions(parse_input(input)?)?)
    }
}
