use std::collections::HashSet;

use crate::model::{ConceptKind, Occurrence};
use crate::patterns::PatternLibrary;

/// Per-page scan result: deduplicated occurrences plus the recognizer
/// drop counts for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub occurrences: Vec<Occurrence>,
    pub dropped_statute_candidates: usize,
    pub dropped_citation_candidates: usize,
}

/// Applies the pattern library to one page at a time. Pure: holds no
/// mutable state, so pages may be scanned in any order or in parallel.
pub struct PageScanner<'a> {
    patterns: &'a PatternLibrary,
    page_offset: i64,
}

impl<'a> PageScanner<'a> {
    pub fn new(patterns: &'a PatternLibrary, page_offset: i64) -> PageScanner<'a> {
        PageScanner {
            patterns,
            page_offset,
        }
    }

    /// Scans one page's text. The configured offset is applied to the raw
    /// page number before tagging; a non-positive result is passed through
    /// unchanged (deliberate pass-through, the caller decides what to do
    /// with it). Repeated matches of the same concept collapse to one
    /// page-level occurrence: counting is presence, not frequency.
    pub fn scan(&self, page_number: i64, text: &str) -> ScanOutcome {
        let page = page_number + self.page_offset;

        if text.trim().is_empty() {
            return ScanOutcome::default();
        }

        let matches = self.patterns.scan_page(text);
        let mut seen = HashSet::<(String, ConceptKind, Option<String>)>::new();
        let mut occurrences = Vec::<Occurrence>::new();

        for found in matches.matches {
            let key = (found.label.clone(), found.kind, found.category.clone());
            if !seen.insert(key) {
                continue;
            }
            occurrences.push(Occurrence {
                label: found.label,
                kind: found.kind,
                category: found.category,
                page,
            });
        }

        ScanOutcome {
            occurrences,
            dropped_statute_candidates: matches.dropped_statute_candidates,
            dropped_citation_candidates: matches.dropped_citation_candidates,
        }
    }
}
