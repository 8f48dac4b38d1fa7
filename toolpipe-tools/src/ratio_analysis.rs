//! Financial ratio analysis from balance sheet and income statement figures.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{require_finite, round_to};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub revenue: f64,
    pub net_income: f64,
    #[serde(default)]
    pub inventory: f64,
    #[serde(default)]
    pub gross_profit: Option<f64>,
    #[serde(default)]
    pub operating_income: Option<f64>,
    #[serde(default)]
    pub interest_expense: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatioAnalysisInput {
    pub financials: Financials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Assessment {
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "watch")]
    Watch,
    #[serde(rename = "concern")]
    Concern,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl Assessment {
    fn as_str(self) -> &'static str {
        match self {
            Assessment::Healthy => "healthy",
            Assessment::Watch => "watch",
            Assessment::Concern => "concern",
            Assessment::NotApplicable => "n/a",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratio {
    pub name: String,
    pub value: Option<f64>,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioAnalysisOutput {
    pub ratios: Vec<Ratio>,
    pub notes: Vec<String>,
    pub markdown: String,
}

/// Thresholds for one ratio. `higher_is_better` flips the comparison.
struct Band {
    healthy: f64,
    watch: f64,
    higher_is_better: bool,
}

impl Band {
    const fn up(healthy: f64, watch: f64) -> Self {
        Self {
            healthy,
            watch,
            higher_is_better: true,
        }
    }

    const fn down(healthy: f64, watch: f64) -> Self {
        Self {
            healthy,
            watch,
            higher_is_better: false,
        }
    }

    fn assess(&self, value: f64) -> Assessment {
        let (meets_healthy, meets_watch) = if self.higher_is_better {
            (value >= self.healthy, value >= self.watch)
        } else {
            (value <= self.healthy, value <= self.watch)
        };
        if meets_healthy {
            Assessment::Healthy
        } else if meets_watch {
            Assessment::Watch
        } else {
            Assessment::Concern
        }
    }
}

struct Analyzer {
    ratios: Vec<Ratio>,
    notes: Vec<String>,
}

impl Analyzer {
    fn add(&mut self, name: &str, numerator: Option<f64>, denominator: f64, band: Band) {
        let value = match numerator {
            None => {
                self.notes.push(format!("{name}: input not provided."));
                None
            }
            Some(_) if denominator == 0.0 => {
                self.notes
                    .push(format!("{name}: denominator is zero, ratio undefined."));
                None
            }
            Some(n) => Some(round_to(n / denominator, 4)),
        };
        self.ratios.push(Ratio {
            name: name.to_string(),
            value,
            assessment: value.map_or(Assessment::NotApplicable, |v| band.assess(v)),
        });
    }
}

fn check(field: &str, value: f64) -> Result<f64, ToolError> {
    require_finite(&format!("financials.{field}"), value)
}

pub fn analyze_ratios(input: RatioAnalysisInput) -> Result<RatioAnalysisOutput, ToolError> {
    let f = &input.financials;
    let current_assets = check("currentAssets", f.current_assets)?;
    let current_liabilities = check("currentLiabilities", f.current_liabilities)?;
    let total_assets = check("totalAssets", f.total_assets)?;
    let total_liabilities = check("totalLiabilities", f.total_liabilities)?;
    let total_equity = check("totalEquity", f.total_equity)?;
    let revenue = check("revenue", f.revenue)?;
    let net_income = check("netIncome", f.net_income)?;
    let inventory = check("inventory", f.inventory)?;
    let gross_profit = f.gross_profit.map(|v| check("grossProfit", v)).transpose()?;
    let operating_income = f
        .operating_income
        .map(|v| check("operatingIncome", v))
        .transpose()?;
    let interest_expense = f
        .interest_expense
        .map(|v| check("interestExpense", v))
        .transpose()?;

    let mut analyzer = Analyzer {
        ratios: Vec::new(),
        notes: Vec::new(),
    };
    analyzer.add(
        "Current Ratio",
        Some(current_assets),
        current_liabilities,
        Band::up(1.5, 1.0),
    );
    analyzer.add(
        "Quick Ratio",
        Some(current_assets - inventory),
        current_liabilities,
        Band::up(1.0, 0.7),
    );
    analyzer.add(
        "Debt-to-Equity",
        Some(total_liabilities),
        total_equity,
        Band::down(1.0, 2.0),
    );
    analyzer.add(
        "Debt Ratio",
        Some(total_liabilities),
        total_assets,
        Band::down(0.5, 0.7),
    );
    analyzer.add("Net Margin", Some(net_income), revenue, Band::up(0.1, 0.03));
    analyzer.add("Gross Margin", gross_profit, revenue, Band::up(0.4, 0.2));
    analyzer.add(
        "Return on Assets",
        Some(net_income),
        total_assets,
        Band::up(0.05, 0.02),
    );
    analyzer.add(
        "Return on Equity",
        Some(net_income),
        total_equity,
        Band::up(0.15, 0.08),
    );
    analyzer.add(
        "Interest Coverage",
        operating_income.filter(|_| interest_expense.is_some()),
        interest_expense.unwrap_or(0.0),
        Band::up(3.0, 1.5),
    );

    let markdown = render_markdown(&analyzer.ratios);
    Ok(RatioAnalysisOutput {
        ratios: analyzer.ratios,
        notes: analyzer.notes,
        markdown,
    })
}

fn render_markdown(ratios: &[Ratio]) -> String {
    let mut out = String::from("| Ratio | Value | Assessment |\n|-------|-------|------------|\n");
    for ratio in ratios {
        let value = ratio
            .value
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            ratio.name,
            value,
            ratio.assessment.as_str()
        );
    }
    out
}

pub struct RatioAnalysis;

#[async_trait]
impl ToolPackage for RatioAnalysis {
    fn name(&self) -> &'static str {
        "@toolpipe/ratio-analysis"
    }

    fn export_name(&self) -> &'static str {
        "ratioAnalysis"
    }

    fn description(&self) -> &'static str {
        "Compute liquidity, leverage, profitability and coverage ratios from financial statements and assess each one."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "financials",
            "object",
            "Figures: currentAssets, currentLiabilities, totalAssets, totalLiabilities, totalEquity, revenue, netIncome, inventory?, grossProfit?, operatingIncome?, interestExpense?",
        )]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Ratios with assessments, notes and a markdown table",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&analyze_ratios(parse_input(input)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn financials() -> Financials {
        Financials {
            current_assets: 300.0,
            current_liabilities: 150.0,
            total_assets: 1000.0,
            total_liabilities: 400.0,
            total_equity: 600.0,
            revenue: 800.0,
            net_income: 120.0,
            inventory: 100.0,
            gross_profit: Some(400.0),
            operating_income: Some(200.0),
            interest_expense: Some(40.0),
        }
    }

    fn ratio<'a>(output: &'a RatioAnalysisOutput, name: &str) -> &'a Ratio {
        output.ratios.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn computes_and_assesses_ratios() {
        let output = analyze_ratios(RatioAnalysisInput {
            financials: financials(),
        })
        .unwrap();

        assert_eq!(output.ratios.len(), 9);
        assert_eq!(ratio(&output, "Current Ratio").value, Some(2.0));
        assert_eq!(ratio(&output, "Current Ratio").assessment, Assessment::Healthy);
        assert_eq!(ratio(&output, "Quick Ratio").value, Some(1.3333));
        assert_eq!(ratio(&output, "Net Margin").value, Some(0.15));
        assert_eq!(ratio(&output, "Interest Coverage").value, Some(5.0));
        assert_eq!(ratio(&output, "Return on Equity").assessment, Assessment::Healthy);
        assert!(output.notes.is_empty());
        assert!(output.markdown.contains("| Current Ratio | 2.00 | healthy |"));
    }

    #[test]
    fn zero_denominator_yields_null_and_note() {
        let mut figures = financials();
        figures.current_liabilities = 0.0;
        let output = analyze_ratios(RatioAnalysisInput {
            financials: figures,
        })
        .unwrap();

        let current = ratio(&output, "Current Ratio");
        assert_eq!(current.value, None);
        assert_eq!(current.assessment, Assessment::NotApplicable);
        assert!(output.notes.iter().any(|n| n.starts_with("Current Ratio")));
    }

    #[tokio::test]
    async fn optional_inputs_serialize_as_not_applicable() {
        let output = RatioAnalysis
            .execute(json!({
                "financials": {
                    "currentAssets": 100, "currentLiabilities": 100,
                    "totalAssets": 500, "totalLiabilities": 200, "totalEquity": 300,
                    "revenue": 400, "netIncome": 20
                }
            }))
            .await
            .unwrap();
        let gross = output["ratios"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == "Gross Margin")
            .unwrap();
        assert!(gross["value"].is_null());
        assert_eq!(gross["assessment"], "n/a");
    }
}
