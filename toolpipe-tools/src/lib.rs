//! # Tool packages
//!
//! Each module implements one self-contained tool: a typed input, explicit
//! validation, a pure computation and a fully specified output. Every tool is
//! also exposed through the [`ToolPackage`] trait so the pipeline can run it by
//! package name with JSON input.
//!
//! ## Packages
//!
//! | Package | Export |
//! |---------|--------|
//! | `@toolpipe/text-chunk` | `textChunk` |
//! | `@toolpipe/lead-score` | `leadScore` |
//! | `@toolpipe/slo-draft` | `sloDraft` |
//! | `@toolpipe/runbook-draft` | `runbookDraft` |
//! | `@toolpipe/curriculum-map` | `curriculumMap` |
//! | `@toolpipe/tax-deduction-scan` | `taxDeductionScan` |
//! | `@toolpipe/revenue-breakdown` | `revenueBreakdown` |
//! | `@toolpipe/response-template-suggest` | `responseTemplateSuggest` |
//! | `@toolpipe/ratio-analysis` | `ratioAnalysis` |
//! | `@toolpipe/fetch-text` | `fetchText` |

pub mod curriculum_map;
pub mod error;
pub mod fetch_text;
pub mod lead_score;
pub mod package;
pub mod ratio_analysis;
pub mod registry;
pub mod response_template;
pub mod revenue_breakdown;
pub mod runbook_draft;
pub mod slo_draft;
pub mod tax_deduction;
pub mod text_chunk;

mod text;

pub use error::{FetchErrorKind, ToolError};
pub use package::{ParameterSpec, ReturnsSpec, ToolPackage};
pub use registry::ToolRegistry;
