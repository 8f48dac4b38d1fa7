//! Approximate token counts and cost for a tool run.

use serde_json::{Map, Value};

use crate::config::Pricing;
use crate::domain::tool::{Parameter, Returns, TokenBreakdown};

/// Roughly four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

/// Breakdown using the default per-token prices.
pub fn calculate_token_breakdown(
    prompt: &str,
    tool_description: &str,
    parameters: &[Parameter],
    returns: Option<&Returns>,
    output: &str,
) -> TokenBreakdown {
    calculate_token_breakdown_with(
        &Pricing::default(),
        prompt,
        tool_description,
        parameters,
        returns,
        output,
    )
}

pub fn calculate_token_breakdown_with(
    pricing: &Pricing,
    prompt: &str,
    tool_description: &str,
    parameters: &[Parameter],
    returns: Option<&Returns>,
    output: &str,
) -> TokenBreakdown {
    let input_tokens = estimate_tokens(prompt);
    let tool_desc_tokens = estimate_tokens(tool_description);
    let schema_tokens = estimate_tokens(&schema_text(parameters, returns));
    let output_tokens = estimate_tokens(output);

    let billed_input = (input_tokens + tool_desc_tokens + schema_tokens) as f64;
    TokenBreakdown {
        input_tokens,
        tool_desc_tokens,
        schema_tokens,
        output_tokens,
        total_tokens: input_tokens + tool_desc_tokens + schema_tokens + output_tokens,
        estimated_cost: billed_input * pricing.input_per_token
            + output_tokens as f64 * pricing.output_per_token,
    }
}

fn schema_text(parameters: &[Parameter], returns: Option<&Returns>) -> String {
    let mut fields = Map::new();
    fields.insert(
        "parameters".to_string(),
        serde_json::to_value(parameters).unwrap_or(Value::Null),
    );
    if let Some(returns) = returns {
        fields.insert(
            "returns".to_string(),
            serde_json::to_value(returns).unwrap_or(Value::Null),
        );
    }
    Value::Object(fields).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_whole_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(estimate_tokens("äöüß"), 1);
    }

    #[test]
    fn total_is_sum_of_components() {
        let parameters = vec![Parameter::new("text", "string", "Input", true)];
        let returns = Returns {
            type_name: "object".into(),
            description: "Result".into(),
        };
        let breakdown = calculate_token_breakdown(
            "Summarise this document please",
            "Splits text",
            &parameters,
            Some(&returns),
            "done",
        );
        assert_eq!(
            breakdown.total_tokens,
            breakdown.input_tokens
                + breakdown.tool_desc_tokens
                + breakdown.schema_tokens
                + breakdown.output_tokens
        );
        assert_eq!(breakdown.input_tokens, 8);
        assert_eq!(breakdown.output_tokens, 1);
    }

    #[test]
    fn cost_uses_pricing() {
        let pricing = Pricing {
            input_per_token: 1.0,
            output_per_token: 10.0,
        };
        let breakdown = calculate_token_breakdown_with(&pricing, "abcd", "", &[], None, "abcdefgh");
        let schema_tokens = estimate_tokens(r#"{"parameters":[]}"#);
        assert_eq!(breakdown.schema_tokens, schema_tokens);
        assert_eq!(
            breakdown.estimated_cost,
            (1 + schema_tokens) as f64 + 2.0 * 10.0
        );
    }
}
