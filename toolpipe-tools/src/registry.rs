use std::collections::BTreeMap;
use std::sync::Arc;

use crate::curriculum_map::CurriculumMap;
use crate::fetch_text::FetchText;
use crate::lead_score::LeadScore;
use crate::package::ToolPackage;
use crate::ratio_analysis::RatioAnalysis;
use crate::response_template::ResponseTemplateSuggest;
use crate::revenue_breakdown::RevenueBreakdown;
use crate::runbook_draft::RunbookDraft;
use crate::slo_draft::SloDraft;
use crate::tax_deduction::TaxDeductionScan;
use crate::text_chunk::TextChunk;

/// Tool packages keyed by package name.
#[derive(Clone)]
pub struct ToolRegistry {
    packages: BTreeMap<&'static str, Arc<dyn ToolPackage>>,
}

impl ToolRegistry {
    /// Registry holding every package shipped with this crate.
    pub fn builtin() -> Self {
        let packages: [Arc<dyn ToolPackage>; 10] = [
            Arc::new(TextChunk),
            Arc::new(LeadScore),
            Arc::new(SloDraft),
            Arc::new(RunbookDraft),
            Arc::new(CurriculumMap),
            Arc::new(TaxDeductionScan),
            Arc::new(RevenueBreakdown),
            Arc::new(ResponseTemplateSuggest),
            Arc::new(RatioAnalysis),
            Arc::new(FetchText),
        ];
        Self {
            packages: packages.into_iter().map(|p| (p.name(), p)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolPackage>> {
        self.packages.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolPackage>> {
        self.packages.values()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("packages", &self.packages.keys().collect::<Vec<_>>())
            .finish()
    }
}
