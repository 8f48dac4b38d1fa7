//! Suggests canned support responses for an incoming customer message.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::{content_words, jaccard, require_text, round_to, tokens};

pub const DEFAULT_LIMIT: usize = 3;
const TAG_BONUS: f64 = 0.2;

const INTENTS: &[(&str, &[&str])] = &[
    ("refund", &["refund", "return", "money", "reimburse", "cancel", "chargeback"]),
    ("shipping", &["shipping", "delivery", "package", "tracking", "shipped", "arrive", "courier"]),
    ("billing", &["bill", "billing", "invoice", "charge", "charged", "payment", "card", "receipt"]),
    ("technical", &["error", "bug", "crash", "broken", "login", "install", "working", "issue"]),
    ("account", &["account", "password", "email", "username", "profile", "delete", "reset"]),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTemplateInput {
    pub message: String,
    #[serde(default)]
    pub templates: Option<Vec<Template>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub body: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTemplateOutput {
    pub intent: String,
    pub confidence: f64,
    pub suggestions: Vec<Suggestion>,
}

fn builtin_templates() -> Vec<Template> {
    let template = |id: &str, title: &str, body: &str, tags: &[&str]| Template {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };
    vec![
        template(
            "refund-request",
            "Refund request received",
            "Thanks for reaching out. We have started your refund; the money should return to your original payment method within 5-7 business days.",
            &["refund"],
        ),
        template(
            "shipping-delay",
            "Shipping delay",
            "Sorry your package has not arrived yet. Here is your tracking link; delivery usually completes within 2 business days of the estimate.",
            &["shipping"],
        ),
        template(
            "billing-question",
            "Billing question",
            "Thanks for your question about your bill. We have reviewed the charge on your invoice and attached a detailed receipt.",
            &["billing"],
        ),
        template(
            "technical-troubleshooting",
            "Troubleshooting steps",
            "Sorry you hit an error. Please clear your cache, update to the latest version and try again; if the issue persists send us a screenshot.",
            &["technical"],
        ),
        template(
            "account-access",
            "Account access help",
            "To regain access to your account, use the password reset link on the login page. The reset email arrives within a few minutes.",
            &["account"],
        ),
        template(
            "general-ack",
            "We received your message",
            "Thanks for contacting us. A member of our team will reply within one business day.",
            &["general"],
        ),
    ]
}

/// Picks the intent with the most keyword hits; ties keep table order.
/// Confidence is the winner's share of all hits.
fn detect_intent(message: &str) -> (&'static str, f64) {
    let words = tokens(message);
    let mut best = ("general", 0usize);
    let mut total_hits = 0usize;
    for (intent, keywords) in INTENTS {
        let hits = words
            .iter()
            .filter(|w| keywords.contains(&w.as_str()))
            .count();
        total_hits += hits;
        if hits > best.1 {
            best = (*intent, hits);
        }
    }
    if total_hits == 0 {
        return ("general", 0.0);
    }
    (best.0, round_to(best.1 as f64 / total_hits as f64, 2))
}

pub fn suggest_templates(
    input: ResponseTemplateInput,
) -> Result<ResponseTemplateOutput, ToolError> {
    let message = require_text("message", &input.message)?;
    if input.limit == 0 {
        return Err(ToolError::invalid("limit must be at least 1"));
    }
    let templates = match input.templates {
        Some(templates) if !templates.is_empty() => templates,
        _ => builtin_templates(),
    };

    let (intent, confidence) = detect_intent(message);
    let message_words = content_words(message);
    let message_tokens: BTreeSet<String> = tokens(message).into_iter().collect();

    let mut suggestions: Vec<Suggestion> = templates
        .into_iter()
        .map(|template| {
            let template_words = content_words(&format!("{} {}", template.title, template.body));
            let tag_hits = template
                .tags
                .iter()
                .map(|tag| tag.to_lowercase())
                .filter(|tag| tag == intent || message_tokens.contains(tag))
                .count();
            let score = jaccard(&message_words, &template_words) + TAG_BONUS * tag_hits as f64;
            Suggestion {
                id: template.id,
                title: template.title,
                body: template.body,
                score: round_to(score, 3),
            }
        })
        .collect();
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    suggestions.truncate(input.limit);

    Ok(ResponseTemplateOutput {
        intent: intent.to_string(),
        confidence,
        suggestions,
    })
}

pub struct ResponseTemplateSuggest;

#[async_trait]
impl ToolPackage for ResponseTemplateSuggest {
    fn name(&self) -> &'static str {
        "@toolpipe/response-template-suggest"
    }

    fn export_name(&self) -> &'static str {
        "responseTemplateSuggest"
    }

    fn description(&self) -> &'static str {
        "Detect the intent of a customer support message and rank response templates for it."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("message", "string", "Incoming customer message"),
            ParameterSpec::optional(
                "templates",
                "object[]",
                "Templates as {id, title, body, tags}; built-in templates when omitted",
                None,
            ),
            ParameterSpec::optional(
                "limit",
                "number",
                "Maximum suggestions",
                Some(json!(DEFAULT_LIMIT)),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Detected intent, confidence and ranked suggestions",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&suggest_templates(parse_input(input)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> ResponseTemplateInput {
        ResponseTemplateInput {
            message: message.into(),
            templates: None,
            limit: DEFAULT_LIMIT,
        }
    }

    #[test]
    fn detects_refund_intent_and_ranks_refund_template_first() {
        let output = suggest_templates(request("I want a refund, please return my money")).unwrap();
        assert_eq!(output.intent, "refund");
        assert_eq!(output.confidence, 1.0);
        assert_eq!(output.suggestions[0].id, "refund-request");
        assert_eq!(output.suggestions.len(), 3);
    }

    #[test]
    fn falls_back_to_general_intent() {
        let output = suggest_templates(request("Hello there")).unwrap();
        assert_eq!(output.intent, "general");
        assert_eq!(output.confidence, 0.0);
        assert_eq!(output.suggestions[0].id, "general-ack");
    }

    #[test]
    fn ranks_custom_templates_with_tag_bonus() {
        let output = suggest_templates(ResponseTemplateInput {
            message: "My tracking number shows no delivery".into(),
            templates: Some(vec![
                Template {
                    id: "a".into(),
                    title: "Anything".into(),
                    body: "Generic reply".into(),
                    tags: vec![],
                },
                Template {
                    id: "b".into(),
                    title: "Where is my order".into(),
                    body: "Check the courier site".into(),
                    tags: vec!["shipping".into()],
                },
            ]),
            limit: 1,
        })
        .unwrap();
        assert_eq!(output.intent, "shipping");
        assert_eq!(output.suggestions.len(), 1);
        assert_eq!(output.suggestions[0].id, "b");
        assert!(output.suggestions[0].score >= 0.2);
    }

    #[test]
    fn rejects_blank_message() {
        assert!(matches!(
            suggest_templates(request("  ")),
            Err(ToolError::InvalidInput(_))
        ));
    }
}
