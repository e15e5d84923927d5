use crate::model::{AggregatedIndex, IndexStatistics, TermCount};

/// Derives summary counts from a frozen index. Occurrence counts sum the
/// per-category page-list lengths, not the deduplicated `all_references`
/// union, so a label indexed under two categories on one page counts
/// twice.
pub fn summarize(index: &AggregatedIndex, top_n: usize) -> IndexStatistics {
    let mut counts = Vec::<TermCount>::new();
    let mut total_occurrences = 0usize;

    for (label, pages) in &index.statutory_references {
        total_occurrences += pages.len();
        counts.push(TermCount {
            label: label.clone(),
            count: pages.len(),
        });
    }

    for (label, pages) in &index.case_law_references {
        total_occurrences += pages.len();
        counts.push(TermCount {
            label: label.clone(),
            count: pages.len(),
        });
    }

    for (label, entry) in &index.subject_matter_index {
        let count = if entry.categories.is_empty() {
            entry.all_references.len()
        } else {
            entry.categories.values().map(Vec::len).sum()
        };
        total_occurrences += count;
        counts.push(TermCount {
            label: label.clone(),
            count,
        });
    }

    counts.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.label.cmp(&right.label))
    });
    counts.truncate(top_n);

    IndexStatistics {
        unique_terms: index.subject_matter_index.len(),
        unique_statutes: index.statutory_references.len(),
        unique_citations: index.case_law_references.len(),
        total_occurrences,
        top_terms: counts,
    }
}
