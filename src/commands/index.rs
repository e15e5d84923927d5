use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregate::IndexAggregator;
use crate::cli::{IndexArgs, OutputFormat};
use crate::dictionary::TermDictionary;
use crate::export;
use crate::extract;
use crate::model::{IndexRunConfig, IndexRunCounts, IndexRunManifest, SourceInfo};
use crate::patterns::PatternLibrary;
use crate::scanner::PageScanner;
use crate::stats;
use crate::util::{
    now_utc_string, sha256_file, utc_compact_string, write_json_pretty, write_text_file,
};

pub fn run(args: IndexArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    // Configuration problems abort here, before any page is scanned and
    // before any output is written.
    let dictionary = TermDictionary::load(args.terms_file.as_deref())
        .context("failed to load term dictionary")?;
    let patterns = PatternLibrary::new(&dictionary).context("failed to build pattern library")?;

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_extension(&args.output));

    info!(
        input = %args.input.display(),
        run_id = %run_id,
        format = format.as_str(),
        page_offset = args.page_offset,
        "starting index run"
    );

    let pages = extract::extract_pages(&args.input, args.max_pages)?;
    let page_count = pages.len();
    let empty_page_count = pages
        .iter()
        .filter(|text| text.trim().is_empty())
        .count();

    // Pages are independent, so scanning runs as a parallel map; folding
    // stays sequential and the aggregate is order-independent anyway.
    let scanner = PageScanner::new(&patterns, args.page_offset);
    let outcomes = pages
        .par_iter()
        .enumerate()
        .map(|(index, text)| scanner.scan((index + 1) as i64, text))
        .collect::<Vec<_>>();

    let mut aggregator = IndexAggregator::new(!args.no_subcategories, args.max_cross_refs);
    let mut dropped_statute_candidates = 0usize;
    let mut dropped_citation_candidates = 0usize;
    for outcome in outcomes {
        dropped_statute_candidates += outcome.dropped_statute_candidates;
        dropped_citation_candidates += outcome.dropped_citation_candidates;
        aggregator.fold(outcome.occurrences);
    }

    if dropped_statute_candidates > 0 || dropped_citation_candidates > 0 {
        debug!(
            dropped_statutes = dropped_statute_candidates,
            dropped_citations = dropped_citation_candidates,
            "recognizer candidates dropped by guards"
        );
    }

    let mut index = aggregator.finish();
    let statistics = stats::summarize(&index, args.top_terms);

    let counts = IndexRunCounts {
        unique_terms: statistics.unique_terms,
        unique_statutes: statistics.unique_statutes,
        unique_citations: statistics.unique_citations,
        total_occurrences: statistics.total_occurrences,
        cross_reference_count: index.cross_references.len(),
        dropped_statute_candidates,
        dropped_citation_candidates,
    };

    if args.stats {
        index.statistics = Some(statistics);
    }

    let mut warnings = Vec::<String>::new();
    if args.page_offset < 0 && page_count > 0 {
        let underflow_pages = (args.page_offset.unsigned_abs() as usize).min(page_count);
        warnings.push(format!(
            "page offset {} leaves the first {} page(s) with non-positive indexed numbers",
            args.page_offset, underflow_pages
        ));
    }
    for warning in &warnings {
        warn!(warning = %warning, "index run warning");
    }

    let rendered = export::render(&index, format)?;
    write_text_file(&args.output, &rendered)?;
    info!(path = %args.output.display(), format = format.as_str(), "wrote index");

    if let Some(statistics) = &index.statistics {
        info!(
            unique_terms = statistics.unique_terms,
            unique_statutes = statistics.unique_statutes,
            unique_citations = statistics.unique_citations,
            total_occurrences = statistics.total_occurrences,
            "index statistics"
        );
        for term in &statistics.top_terms {
            info!(label = %term.label, count = term.count, "top term");
        }
    }

    let manifest_path = args.cache_root.join("manifests").join(format!(
        "index_run_{}.json",
        utc_compact_string(started_ts)
    ));
    let manifest = IndexRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        source: SourceInfo {
            filename: args.input.display().to_string(),
            sha256: sha256_file(&args.input)?,
            page_count,
            empty_page_count,
        },
        config: IndexRunConfig {
            page_offset: args.page_offset,
            format: format.as_str().to_string(),
            terms_file: args
                .terms_file
                .as_ref()
                .map(|path| path.display().to_string()),
            subcategories: !args.no_subcategories,
            top_terms: args.top_terms,
            max_cross_refs: args.max_cross_refs,
            max_pages: args.max_pages,
        },
        counts,
        output_path: args.output.display().to_string(),
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote index run manifest");
    info!(
        pages = page_count,
        empty_pages = empty_page_count,
        concepts = manifest.counts.unique_terms
            + manifest.counts.unique_statutes
            + manifest.counts.unique_citations,
        "index run completed"
    );

    Ok(())
}
