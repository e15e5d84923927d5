use std::collections::BTreeMap;

use serde::Serialize;

/// Which recognizer produced a concept occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConceptKind {
    Statute,
    CaseCitation,
    Term,
}

/// One recognized concept on one page. Created per page by the scanner and
/// discarded once folded into the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub label: String,
    pub kind: ConceptKind,
    pub category: Option<String>,
    pub page: i64,
}

/// Per-label subject-matter entry. The flattened category map is empty when
/// the category breakdown is suppressed; `all_references` always holds the
/// union of the per-category page lists.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SubjectEntry {
    #[serde(flatten)]
    pub categories: BTreeMap<String, Vec<i64>>,
    pub all_references: Vec<i64>,
}

/// The frozen index produced once every page has been folded in. All page
/// lists are ascending and deduplicated; all maps are sorted by label.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AggregatedIndex {
    pub case_law_references: BTreeMap<String, Vec<i64>>,
    pub statutory_references: BTreeMap<String, Vec<i64>>,
    pub subject_matter_index: BTreeMap<String, SubjectEntry>,
    pub cross_references: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<IndexStatistics>,
}

impl AggregatedIndex {
    /// Flat combined listing over all three buckets, sorted
    /// case-insensitively by label.
    pub fn alphabetical_entries(&self) -> Vec<(&str, &[i64])> {
        let mut entries = Vec::<(&str, &[i64])>::new();

        for (label, pages) in &self.case_law_references {
            entries.push((label.as_str(), pages.as_slice()));
        }
        for (label, pages) in &self.statutory_references {
            entries.push((label.as_str(), pages.as_slice()));
        }
        for (label, entry) in &self.subject_matter_index {
            entries.push((label.as_str(), entry.all_references.as_slice()));
        }

        entries.sort_by(|left, right| {
            left.0
                .to_lowercase()
                .cmp(&right.0.to_lowercase())
                .then_with(|| left.0.cmp(right.0))
        });
        entries
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TermCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexStatistics {
    pub unique_terms: usize,
    pub unique_statutes: usize,
    pub unique_citations: usize,
    pub total_occurrences: usize,
    pub top_terms: Vec<TermCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub filename: String,
    pub sha256: String,
    pub page_count: usize,
    pub empty_page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexRunConfig {
    pub page_offset: i64,
    pub format: String,
    pub terms_file: Option<String>,
    pub subcategories: bool,
    pub top_terms: usize,
    pub max_cross_refs: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexRunCounts {
    pub unique_terms: usize,
    pub unique_statutes: usize,
    pub unique_citations: usize,
    pub total_occurrences: usize,
    pub cross_reference_count: usize,
    pub dropped_statute_candidates: usize,
    pub dropped_citation_candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub source: SourceInfo,
    pub config: IndexRunConfig,
    pub counts: IndexRunCounts,
    pub output_path: String,
    pub warnings: Vec<String>,
}
