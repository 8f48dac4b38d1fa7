//! Sentence-aware text chunking with optional overlap.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::package::{ParameterSpec, ReturnsSpec, ToolPackage, parse_input, to_output};
use crate::text::require_text;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;
pub const MAX_CHUNK_SIZE_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChunkInput {
    pub text: String,
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    #[serde(default)]
    pub overlap: usize,
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub char_count: usize,
    /// Number of leading chars copied from the previous chunk.
    pub overlap_chars: usize,
    /// Char offset of the chunk body in the normalised text.
    pub start: usize,
    pub end: usize,
    /// The body stops mid-word; the next body follows without a separating space.
    pub continues: bool,
}

impl Chunk {
    /// The chunk text without its overlap prefix.
    pub fn body(&self) -> String {
        self.text.chars().skip(self.overlap_chars).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChunkOutput {
    pub chunks: Vec<Chunk>,
    pub total_chunks: usize,
    pub total_chars: usize,
}

pub fn chunk_text(input: TextChunkInput) -> Result<TextChunkOutput, ToolError> {
    require_text("text", &input.text)?;
    if input.max_chunk_size == 0 || input.max_chunk_size > MAX_CHUNK_SIZE_LIMIT {
        return Err(ToolError::invalid(format!(
            "maxChunkSize must be between 1 and {MAX_CHUNK_SIZE_LIMIT}"
        )));
    }
    if input.overlap >= input.max_chunk_size {
        return Err(ToolError::invalid(
            "overlap must be smaller than maxChunkSize",
        ));
    }

    let normalized: Vec<char> = input
        .text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();

    let bodies = pack_sentences(&normalized, input.max_chunk_size, input.overlap);

    let mut chunks: Vec<Chunk> = Vec::with_capacity(bodies.len());
    for (index, Body { start, end, continues }) in bodies.into_iter().enumerate() {
        let body = &normalized[start..end];
        let prefix: &[char] = match chunks.last() {
            Some(previous) if input.overlap > 0 => {
                let previous_body = &normalized[previous.start..previous.end];
                let take = input.overlap.min(previous_body.len());
                &previous_body[previous_body.len() - take..]
            }
            _ => &[],
        };
        let text: String = prefix.iter().chain(body.iter()).collect();
        chunks.push(Chunk {
            index,
            char_count: prefix.len() + body.len(),
            overlap_chars: prefix.len(),
            text,
            start,
            end,
            continues,
        });
    }

    Ok(TextChunkOutput {
        total_chunks: chunks.len(),
        total_chars: normalized.len(),
        chunks,
    })
}

/// Splits normalised text into `(start, end)` sentence spans.
fn sentence_spans(text: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < text.len() {
        let ch = text[index];
        let at_boundary = matches!(ch, '.' | '!' | '?')
            && (index + 1 == text.len() || text[index + 1] == ' ');
        if at_boundary {
            spans.push((start, index + 1));
            // skip the separating space
            start = index + 2;
            index += 2;
            continue;
        }
        index += 1;
    }
    if start < text.len() {
        spans.push((start, text.len()));
    }
    spans
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Body {
    start: usize,
    end: usize,
    continues: bool,
}

impl Body {
    fn whole(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            continues: false,
        }
    }
}

/// Greedily packs sentences into chunk bodies, hard-splitting oversized ones.
///
/// A hard split prefers the last space within the budget; that space is the
/// separator and belongs to neither body. Words longer than the budget are
/// cut mid-word and the body is marked as continuing.
fn pack_sentences(text: &[char], max_chunk_size: usize, overlap: usize) -> Vec<Body> {
    let budget = |chunk_index: usize| {
        if chunk_index == 0 {
            max_chunk_size
        } else {
            max_chunk_size - overlap
        }
    };

    let mut bodies: Vec<Body> = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (sentence_start, sentence_end) in sentence_spans(text) {
        let mut cursor = sentence_start;
        while cursor < sentence_end {
            let limit = budget(bodies.len());
            let remaining = sentence_end - cursor;
            match current {
                Some((start, end)) if end - start + 1 + remaining <= limit => {
                    current = Some((start, sentence_end));
                    cursor = sentence_end;
                }
                Some((start, end)) => {
                    bodies.push(Body::whole(start, end));
                    current = None;
                }
                None if remaining <= limit => {
                    current = Some((cursor, sentence_end));
                    cursor = sentence_end;
                }
                None => {
                    let window = cursor + 1..=cursor + limit;
                    match window.rev().find(|index| text[*index] == ' ') {
                        Some(space) => {
                            bodies.push(Body::whole(cursor, space));
                            cursor = space + 1;
                        }
                        None => {
                            bodies.push(Body {
                                start: cursor,
                                end: cursor + limit,
                                continues: true,
                            });
                            cursor += limit;
                        }
                    }
                }
            }
        }
    }
    if let Some((start, end)) = current {
        bodies.push(Body::whole(start, end));
    }
    bodies
}

pub struct TextChunk;

#[async_trait]
impl ToolPackage for TextChunk {
    fn name(&self) -> &'static str {
        "@toolpipe/text-chunk"
    }

    fn export_name(&self) -> &'static str {
        "textChunk"
    }

    fn description(&self) -> &'static str {
        "Split text into sentence-aware chunks no longer than maxChunkSize characters, with optional overlap between consecutive chunks."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("text", "string", "Text to split"),
            ParameterSpec::optional(
                "maxChunkSize",
                "number",
                "Maximum characters per chunk",
                Some(json!(DEFAULT_MAX_CHUNK_SIZE)),
            ),
            ParameterSpec::optional(
                "overlap",
                "number",
                "Characters repeated from the previous chunk",
                Some(json!(0)),
            ),
        ]
    }

    fn returns(&self) -> Option<ReturnsSpec> {
        Some(ReturnsSpec::new(
            "object",
            "Chunks with index, text and character counts",
        ))
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        to_output(&chunk_text(parse_input(input)?)?)
    }
}
