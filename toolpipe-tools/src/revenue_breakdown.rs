//! Revenue totals by category, month and recurrence.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{require_finite, require_text, round_to};

#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevenueBreakdownInput {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdownOutput {
    pub total: f64,
    pub transaction_count: usize,
    pub by_category: Vec<CategoryShare>,
    pub recurring_total: f64,
    pub one_time_total: f64,
    pub by_month: Vec<MonthTotal>,
    pub top_category: String,
    pub average_transaction: f64,
}

pub fn break_down_revenue(
    input: RevenueBreakdownInput,
) -> Result<RevenueBreakdownOutput, ToolError> {
    if input.transactions.is_empty() {
        return Err(ToolError::invalid("transactions must not be empty"));
    }

    let mut categories: HashMap<String, (f64, usize)> = HashMap::new();
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    let mut recurring_total = 0.0;

    for (i, tx) in input.transactions.iter().enumerate() {
        let amount = require_finite(&format!("transactions[{i}].amount"), tx.amount)?;
        let category = require_text(&format!("transactions[{i}].category"), &tx.category)?;

        if let Some(date) = tx.date.as_deref() {
            let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
                ToolError::invalid(format!(
                    "transactions[{i}].date must be a YYYY-MM-DD date, got '{date}'"
                ))
            })?;
            *months.entry(parsed.format("%Y-%m").to_string()).or_default() += amount;
        }

        let entry = categories.entry(category.to_string()).or_default();
        entry.0 += amount;
        entry.1 += 1;
        total += amount;
        if tx.recurring {
            recurring_total += amount;
        }
    }

    let mut by_category: Vec<CategoryShare> = categories
        .into_iter()
        .map(|(category, (sum, count))| CategoryShare {
            percent: if total == 0.0 {
                0.0
            } else {
                round_to(sum / total * 100.0, 1)
            },
            total: round_to(sum, 2),
            category,
            count,
        })
        .collect();
    by_category.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    let top_category = by_category
        .first()
        .map(|c| c.category.clone())
        .unwrap_or_default();
    let count = input.transactions.len();

    Ok(RevenueBreakdownOutput {
        total: round_to(total, 2),
        transaction_count: count,
        by_category,
        recurring_total: round_to(recurring_total, 2),
        one_time_total: round_to(total - recurring_total, 2),
        by_month: months
            .into_iter()
            .map(|(month, total)| MonthTotal {
                month,
                total: round_to(total, 2),
            })
            .collect(),
        top_category,
        average_transaction: round_to(total / count as f64, 2),
    })
}

pub struct RevenueBreakdown;

#[async_trait]
impl ToolPackage for RevenueBreakdown {
    fn name(&self) -> &'static str {
        "@toolpipe/revenue-breakdown"
    }

    fn export_name(&self) -> &'static str {
        "revenueBreakdown"
    }

    fn description(&self) -> &'static str {
        "Summarise revenue transactions by category, month and recurring versus one-time income."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "transactions",
            "object[]",
            "Transactions as {amount, category, date? (YYYY-MM-DD), recurring?}",
        )]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Totals, category shares, monthly totals and averages",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&break_down_revenue(parse_input(input)?)?)
    }
}
