use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{AggregatedIndex, ConceptKind, Occurrence, SubjectEntry};

/// Folds per-page occurrence lists into the canonical index. Pages are
/// collected into sets while folding and only converted to sorted
/// sequences at freeze time, so the result is identical regardless of the
/// order pages arrive in.
pub struct IndexAggregator {
    case_law: HashMap<String, BTreeSet<i64>>,
    statutes: HashMap<String, BTreeSet<i64>>,
    subjects: HashMap<String, HashMap<String, BTreeSet<i64>>>,
    include_categories: bool,
    max_cross_refs: Option<usize>,
}

impl IndexAggregator {
    pub fn new(include_categories: bool, max_cross_refs: Option<usize>) -> IndexAggregator {
        IndexAggregator {
            case_law: HashMap::new(),
            statutes: HashMap::new(),
            subjects: HashMap::new(),
            include_categories,
            max_cross_refs,
        }
    }

    pub fn fold(&mut self, occurrences: Vec<Occurrence>) {
        for occurrence in occurrences {
            match occurrence.kind {
                ConceptKind::Statute => {
                    self.statutes
                        .entry(occurrence.label)
                        .or_default()
                        .insert(occurrence.page);
                }
                ConceptKind::CaseCitation => {
                    self.case_law
                        .entry(occurrence.label)
                        .or_default()
                        .insert(occurrence.page);
                }
                ConceptKind::Term => {
                    let Some(category) = occurrence.category else {
                        continue;
                    };
                    self.subjects
                        .entry(occurrence.label)
                        .or_default()
                        .entry(category)
                        .or_default()
                        .insert(occurrence.page);
                }
            }
        }
    }

    /// Freezes the folded state into the canonical immutable structure.
    pub fn finish(self) -> AggregatedIndex {
        let case_law_references = freeze_bucket(self.case_law);
        let statutory_references = freeze_bucket(self.statutes);

        let mut subject_matter_index = BTreeMap::<String, SubjectEntry>::new();
        for (label, categories) in &self.subjects {
            let mut all_references = BTreeSet::<i64>::new();
            for pages in categories.values() {
                all_references.extend(pages.iter().copied());
            }

            let category_lists = if self.include_categories {
                categories
                    .iter()
                    .map(|(category, pages)| {
                        (category.clone(), pages.iter().copied().collect::<Vec<i64>>())
                    })
                    .collect()
            } else {
                BTreeMap::new()
            };

            subject_matter_index.insert(
                label.clone(),
                SubjectEntry {
                    categories: category_lists,
                    all_references: all_references.into_iter().collect(),
                },
            );
        }

        let cross_references = derive_cross_references(&self.subjects, self.max_cross_refs);

        AggregatedIndex {
            case_law_references,
            statutory_references,
            subject_matter_index,
            cross_references,
            statistics: None,
        }
    }
}

fn freeze_bucket(bucket: HashMap<String, BTreeSet<i64>>) -> BTreeMap<String, Vec<i64>> {
    bucket
        .into_iter()
        .map(|(label, pages)| (label, pages.into_iter().collect()))
        .collect()
}

/// Relates every subject label to the other labels sharing at least one
/// category: symmetric, irreflexive. Statutes and citations carry no
/// category and therefore never appear. An optional cap truncates each
/// sorted set so capped output stays deterministic.
fn derive_cross_references(
    subjects: &HashMap<String, HashMap<String, BTreeSet<i64>>>,
    max_cross_refs: Option<usize>,
) -> BTreeMap<String, Vec<String>> {
    let mut members = HashMap::<&str, BTreeSet<&str>>::new();
    for (label, categories) in subjects {
        for category in categories.keys() {
            members
                .entry(category.as_str())
                .or_default()
                .insert(label.as_str());
        }
    }

    let mut cross_references = BTreeMap::<String, Vec<String>>::new();
    for (label, categories) in subjects {
        let mut related = BTreeSet::<&str>::new();
        for category in categories.keys() {
            if let Some(labels) = members.get(category.as_str()) {
                related.extend(labels.iter().copied());
            }
        }
        related.remove(label.as_str());

        if related.is_empty() {
            continue;
        }

        let mut related = related
            .into_iter()
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();
        if let Some(cap) = max_cross_refs {
            related.truncate(cap);
        }
        cross_references.insert(label.clone(), related);
    }

    cross_references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TermDictionary;
    use crate::patterns::PatternLibrary;
    use crate::scanner::PageScanner;

    fn term(label: &str, category: &str, page: i64) -> Occurrence {
        Occurrence {
            label: label.to_string(),
            kind: ConceptKind::Term,
            category: Some(category.to_string()),
            page,
        }
    }

    fn statute(label: &str, page: i64) -> Occurrence {
        Occurrence {
            label: label.to_string(),
            kind: ConceptKind::Statute,
            category: None,
            page,
        }
    }

    #[test]
    fn all_references_is_union_of_category_lists() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            term("Negligence", "torts", 5),
            term("Negligence", "torts", 12),
            term("Negligence", "criminal_law", 5),
            term("Negligence", "criminal_law", 22),
        ]);

        let index = aggregator.finish();
        let entry = &index.subject_matter_index["Negligence"];
        assert_eq!(entry.categories["torts"], vec![5, 12]);
        assert_eq!(entry.categories["criminal_law"], vec![5, 22]);
        assert_eq!(entry.all_references, vec![5, 12, 22]);
    }

    #[test]
    fn page_lists_are_sorted_and_deduplicated() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![statute("Penal Law § 120.00", 9)]);
        aggregator.fold(vec![statute("Penal Law § 120.00", 3)]);
        aggregator.fold(vec![statute("Penal Law § 120.00", 9)]);

        let index = aggregator.finish();
        assert_eq!(index.statutory_references["Penal Law § 120.00"], vec![3, 9]);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let pages = vec![
            vec![term("Negligence", "torts", 3), statute("Penal Law § 10", 3)],
            vec![term("Custody", "family_law", 7)],
            vec![term("Negligence", "torts", 8)],
        ];

        let mut forward = IndexAggregator::new(true, None);
        for page in pages.clone() {
            forward.fold(page);
        }

        let mut reversed = IndexAggregator::new(true, None);
        for page in pages.into_iter().rev() {
            reversed.fold(page);
        }

        assert_eq!(forward.finish(), reversed.finish());
    }

    #[test]
    fn category_suppression_keeps_only_all_references() {
        let mut aggregator = IndexAggregator::new(false, None);
        aggregator.fold(vec![term("Negligence", "torts", 4)]);

        let index = aggregator.finish();
        let entry = &index.subject_matter_index["Negligence"];
        assert!(entry.categories.is_empty());
        assert_eq!(entry.all_references, vec![4]);
    }

    #[test]
    fn cross_references_are_symmetric_and_irreflexive() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            term("Negligence", "torts", 1),
            term("Battery", "torts", 2),
            term("Custody", "family_law", 3),
        ]);

        let index = aggregator.finish();
        assert_eq!(index.cross_references["Negligence"], vec!["Battery"]);
        assert_eq!(index.cross_references["Battery"], vec!["Negligence"]);
        assert!(!index.cross_references.contains_key("Custody"));
    }

    #[test]
    fn cross_reference_cap_truncates_deterministically() {
        let mut aggregator = IndexAggregator::new(true, Some(2));
        aggregator.fold(vec![
            term("Assault", "torts", 1),
            term("Battery", "torts", 1),
            term("Negligence", "torts", 1),
            term("Nuisance", "torts", 1),
        ]);

        let index = aggregator.finish();
        assert_eq!(
            index.cross_references["Assault"],
            vec!["Battery", "Negligence"]
        );
    }

    #[test]
    fn same_label_under_two_categories_is_not_collapsed() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            term("Due Process", "administrative_law", 2),
            term("Due Process", "criminal_law", 2),
        ]);

        let index = aggregator.finish();
        let entry = &index.subject_matter_index["Due Process"];
        assert_eq!(entry.categories.len(), 2);
        assert_eq!(entry.all_references, vec![2]);
    }

    #[test]
    fn alphabetical_entries_mix_buckets_case_insensitively() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            statute("Penal Law § 10", 1),
            term("Negligence", "torts", 2),
        ]);
        aggregator.fold(vec![Occurrence {
            label: "Abel v. Baker".to_string(),
            kind: ConceptKind::CaseCitation,
            category: None,
            page: 3,
        }]);

        let index = aggregator.finish();
        let labels = index
            .alphabetical_entries()
            .into_iter()
            .map(|(label, _)| label)
            .collect::<Vec<&str>>();
        assert_eq!(labels, vec!["Abel v. Baker", "Negligence", "Penal Law § 10"]);
    }

    #[test]
    fn statute_spellings_merge_into_one_page_list() {
        let dictionary = TermDictionary::baseline();
        let patterns = PatternLibrary::new(&dictionary).expect("pattern library builds");
        let scanner = PageScanner::new(&patterns, 0);

        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(scanner.scan(5, "CPLR § 3212 applies").occurrences);
        aggregator.fold(
            scanner
                .scan(12, "Civil Practice Law and Rules § 3212 applies")
                .occurrences,
        );

        let index = aggregator.finish();
        assert_eq!(index.statutory_references.len(), 1);
        assert_eq!(
            index.statutory_references["Civil Practice Law and Rules § 3212"],
            vec![5, 12]
        );
    }

    #[test]
    fn end_to_end_three_page_document() {
        let dictionary = TermDictionary::baseline();
        let patterns = PatternLibrary::new(&dictionary).expect("pattern library builds");
        let scanner = PageScanner::new(&patterns, 0);

        let pages: Vec<(i64, &str)> = vec![
            (1, ""),
            (2, "This is a claim for summary judgment."),
            (3, "Summary Judgment was granted on the negligence claim."),
        ];

        let mut aggregator = IndexAggregator::new(true, None);
        for (page_number, text) in pages {
            aggregator.fold(scanner.scan(page_number, text).occurrences);
        }

        let index = aggregator.finish();

        let judgment = &index.subject_matter_index["Summary Judgment"];
        assert_eq!(judgment.categories["civil_procedure"], vec![2, 3]);
        assert_eq!(judgment.all_references, vec![2, 3]);

        let negligence = &index.subject_matter_index["Negligence"];
        assert_eq!(negligence.categories["torts"], vec![3]);
        assert_eq!(negligence.all_references, vec![3]);

        // Different home categories: no cross-reference between the two.
        if let Some(related) = index.cross_references.get("Summary Judgment") {
            assert!(!related.iter().any(|label| label == "Negligence"));
        }
    }
}
