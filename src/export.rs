use anyhow::{Context, Result};

use crate::cli::OutputFormat;
use crate::model::AggregatedIndex;
use crate::util::title_case;

/// Renders the frozen index in the requested format. Text and JSON are
/// lossless against the canonical structure; CSV, XML and Markdown are
/// lossy only in presentation.
pub fn render(index: &AggregatedIndex, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(index)),
        OutputFormat::Json => render_json(index),
        OutputFormat::Csv => Ok(render_csv(index)),
        OutputFormat::Xml => Ok(render_xml(index)),
        OutputFormat::Markdown => Ok(render_markdown(index)),
    }
}

fn format_pages(pages: &[i64]) -> String {
    pages
        .iter()
        .map(|page| page.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn category_heading(category: &str) -> String {
    title_case(&category.replace('_', " "))
}

fn render_text(index: &AggregatedIndex) -> String {
    let mut output = String::new();
    output.push_str("COMPREHENSIVE LEGAL INDEX\n");
    output.push_str(&"=".repeat(50));
    output.push_str("\n\n");

    output.push_str("CASE LAW REFERENCES\n");
    output.push_str(&"-".repeat(50));
    output.push('\n');
    for (label, pages) in &index.case_law_references {
        output.push_str(&format!("{label}: {}\n", format_pages(pages)));
    }
    output.push('\n');

    output.push_str("STATUTORY REFERENCES\n");
    output.push_str(&"-".repeat(50));
    output.push('\n');
    for (label, pages) in &index.statutory_references {
        output.push_str(&format!("{label}: {}\n", format_pages(pages)));
    }
    output.push('\n');

    let by_category = group_subjects_by_category(index);
    if !by_category.is_empty() {
        output.push_str("INDEX BY SUBJECT\n");
        output.push_str(&"-".repeat(50));
        output.push('\n');
        for (category, terms) in &by_category {
            output.push_str(&format!("\n-- {} --\n", category_heading(category)));
            for (label, pages) in terms {
                output.push_str(&format!("{label}: {}\n", format_pages(pages)));
            }
        }
        output.push('\n');
    }

    output.push_str("ALPHABETICAL INDEX\n");
    output.push_str(&"-".repeat(50));
    output.push('\n');
    for (label, pages) in index.alphabetical_entries() {
        output.push_str(&format!("{label}: {}\n", format_pages(pages)));
        if let Some(related) = index.cross_references.get(label) {
            output.push_str(&format!("  See also: {}\n", related.join(", ")));
        }
    }

    if let Some(statistics) = &index.statistics {
        output.push('\n');
        output.push_str("STATISTICS\n");
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!("Unique terms: {}\n", statistics.unique_terms));
        output.push_str(&format!("Unique statutes: {}\n", statistics.unique_statutes));
        output.push_str(&format!(
            "Unique citations: {}\n",
            statistics.unique_citations
        ));
        output.push_str(&format!(
            "Total occurrences: {}\n",
            statistics.total_occurrences
        ));
        for term in &statistics.top_terms {
            output.push_str(&format!("  {}: {}\n", term.label, term.count));
        }
    }

    output
}

fn render_json(index: &AggregatedIndex) -> Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(index).context("failed to serialize index to json")?;
    rendered.push('\n');
    Ok(rendered)
}

fn render_csv(index: &AggregatedIndex) -> String {
    let mut output = String::from("Term,Category,Pages\n");

    for (label, pages) in &index.case_law_references {
        push_csv_row(&mut output, label, "case_law_references", pages);
    }
    for (label, pages) in &index.statutory_references {
        push_csv_row(&mut output, label, "statutory_references", pages);
    }
    for (label, entry) in &index.subject_matter_index {
        for (category, pages) in &entry.categories {
            push_csv_row(&mut output, label, category, pages);
        }
        push_csv_row(&mut output, label, "all_references", &entry.all_references);
    }

    output
}

fn push_csv_row(output: &mut String, label: &str, category: &str, pages: &[i64]) {
    output.push_str(&format!(
        "{},{},{}\n",
        csv_escape(label),
        csv_escape(category),
        csv_escape(&format_pages(pages))
    ));
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_xml(index: &AggregatedIndex) -> String {
    let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<LegalIndex>\n");

    output.push_str("  <CaseLawReferences>\n");
    for (label, pages) in &index.case_law_references {
        output.push_str(&format!(
            "    <Reference name=\"{}\">{}</Reference>\n",
            xml_escape(label),
            xml_escape(&format_pages(pages))
        ));
    }
    output.push_str("  </CaseLawReferences>\n");

    output.push_str("  <StatutoryReferences>\n");
    for (label, pages) in &index.statutory_references {
        output.push_str(&format!(
            "    <Reference name=\"{}\">{}</Reference>\n",
            xml_escape(label),
            xml_escape(&format_pages(pages))
        ));
    }
    output.push_str("  </StatutoryReferences>\n");

    output.push_str("  <SubjectMatterIndex>\n");
    for (label, entry) in &index.subject_matter_index {
        output.push_str(&format!("    <Term name=\"{}\">\n", xml_escape(label)));
        for (category, pages) in &entry.categories {
            output.push_str(&format!(
                "      <Category name=\"{}\">{}</Category>\n",
                xml_escape(category),
                xml_escape(&format_pages(pages))
            ));
        }
        output.push_str(&format!(
            "      <Category name=\"all_references\">{}</Category>\n",
            xml_escape(&format_pages(&entry.all_references))
        ));
        output.push_str("    </Term>\n");
    }
    output.push_str("  </SubjectMatterIndex>\n");

    output.push_str("  <CrossReferences>\n");
    for (label, related) in &index.cross_references {
        output.push_str(&format!(
            "    <Term name=\"{}\">{}</Term>\n",
            xml_escape(label),
            xml_escape(&related.join(", "))
        ));
    }
    output.push_str("  </CrossReferences>\n");

    output.push_str("</LegalIndex>\n");
    output
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_markdown(index: &AggregatedIndex) -> String {
    let mut output = String::from("# Comprehensive Legal Index\n\n");

    output.push_str("## Case Law References\n");
    for (label, pages) in &index.case_law_references {
        output.push_str(&format!("- {label}: {}\n", format_pages(pages)));
    }
    output.push('\n');

    output.push_str("## Statutory References\n");
    for (label, pages) in &index.statutory_references {
        output.push_str(&format!("- {label}: {}\n", format_pages(pages)));
    }
    output.push('\n');

    let by_category = group_subjects_by_category(index);
    if !by_category.is_empty() {
        output.push_str("## Index by Subject\n");
        for (category, terms) in &by_category {
            output.push_str(&format!("### {}\n", category_heading(category)));
            for (label, pages) in terms {
                output.push_str(&format!("- {label}: {}\n", format_pages(pages)));
            }
            output.push('\n');
        }
    }

    output.push_str("## Alphabetical Index\n");
    for (label, pages) in index.alphabetical_entries() {
        output.push_str(&format!("- {label}: {}\n", format_pages(pages)));
        if let Some(related) = index.cross_references.get(label) {
            output.push_str(&format!("  - See also: {}\n", related.join(", ")));
        }
    }

    output
}

fn group_subjects_by_category(
    index: &AggregatedIndex,
) -> std::collections::BTreeMap<&str, Vec<(&str, &[i64])>> {
    let mut by_category = std::collections::BTreeMap::<&str, Vec<(&str, &[i64])>>::new();
    for (label, entry) in &index.subject_matter_index {
        for (category, pages) in &entry.categories {
            by_category
                .entry(category.as_str())
                .or_default()
                .push((label.as_str(), pages.as_slice()));
        }
    }
    by_category
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::IndexAggregator;
    use crate::model::{ConceptKind, Occurrence};

    fn sample_index() -> AggregatedIndex {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            Occurrence {
                label: "Smith v. Jones".to_string(),
                kind: ConceptKind::CaseCitation,
                category: None,
                page: 4,
            },
            Occurrence {
                label: "Civil Practice Law and Rules § 3212".to_string(),
                kind: ConceptKind::Statute,
                category: None,
                page: 2,
            },
            Occurrence {
                label: "Negligence".to_string(),
                kind: ConceptKind::Term,
                category: Some("torts".to_string()),
                page: 3,
            },
            Occurrence {
                label: "Battery".to_string(),
                kind: ConceptKind::Term,
                category: Some("torts".to_string()),
                page: 7,
            },
        ]);
        aggregator.finish()
    }

    #[test]
    fn text_renderer_emits_all_sections() {
        let rendered = render_text(&sample_index());
        assert!(rendered.contains("CASE LAW REFERENCES"));
        assert!(rendered.contains("STATUTORY REFERENCES"));
        assert!(rendered.contains("INDEX BY SUBJECT"));
        assert!(rendered.contains("-- Torts --"));
        assert!(rendered.contains("ALPHABETICAL INDEX"));
        assert!(rendered.contains("Smith v. Jones: 4"));
        assert!(rendered.contains("Civil Practice Law and Rules § 3212: 2"));
        assert!(rendered.contains("See also: Battery"));
    }

    #[test]
    fn json_renderer_matches_canonical_shape() {
        let rendered = render_json(&sample_index()).expect("json renders");
        let value: serde_json::Value =
            serde_json::from_str(&rendered).expect("rendered json parses");

        assert_eq!(
            value["case_law_references"]["Smith v. Jones"],
            serde_json::json!([4])
        );
        assert_eq!(
            value["subject_matter_index"]["Negligence"]["torts"],
            serde_json::json!([3])
        );
        assert_eq!(
            value["subject_matter_index"]["Negligence"]["all_references"],
            serde_json::json!([3])
        );
        assert_eq!(
            value["cross_references"]["Negligence"],
            serde_json::json!(["Battery"])
        );
        assert!(value.get("statistics").is_none());
    }

    #[test]
    fn csv_renderer_quotes_fields_with_commas() {
        let rendered = render_csv(&sample_index());
        assert!(rendered.starts_with("Term,Category,Pages\n"));
        assert!(rendered.contains("Smith v. Jones,case_law_references,4\n"));
        // Multi-page lists contain ", " and must be quoted.
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![
            Occurrence {
                label: "Negligence".to_string(),
                kind: ConceptKind::Term,
                category: Some("torts".to_string()),
                page: 1,
            },
            Occurrence {
                label: "Negligence".to_string(),
                kind: ConceptKind::Term,
                category: Some("torts".to_string()),
                page: 2,
            },
        ]);
        let rendered = render_csv(&aggregator.finish());
        assert!(rendered.contains("Negligence,torts,\"1, 2\"\n"));
    }

    #[test]
    fn xml_renderer_escapes_reserved_characters() {
        let mut aggregator = IndexAggregator::new(true, None);
        aggregator.fold(vec![Occurrence {
            label: "Johnson & Sons v. Acme".to_string(),
            kind: ConceptKind::CaseCitation,
            category: None,
            page: 1,
        }]);
        let rendered = render_xml(&aggregator.finish());
        assert!(rendered.contains("Johnson &amp; Sons v. Acme"));
        assert!(!rendered.contains("Johnson & Sons"));
    }

    #[test]
    fn markdown_renderer_lists_subject_groups() {
        let rendered = render_markdown(&sample_index());
        assert!(rendered.contains("## Index by Subject"));
        assert!(rendered.contains("### Torts"));
        assert!(rendered.contains("- Negligence: 3"));
    }

    #[test]
    fn suppressed_categories_omit_subject_section() {
        let mut aggregator = IndexAggregator::new(false, None);
        aggregator.fold(vec![Occurrence {
            label: "Negligence".to_string(),
            kind: ConceptKind::Term,
            category: Some("torts".to_string()),
            page: 3,
        }]);
        let index = aggregator.finish();

        let rendered = render_text(&index);
        assert!(!rendered.contains("INDEX BY SUBJECT"));
        assert!(rendered.contains("Negligence: 3"));
    }
}
