use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

/// Produces the per-page text sequence for the scanner. Page N of the
/// document is `pages[N - 1]`; pages may be empty (image-only or
/// non-extractable) and are handed through as-is.
pub fn extract_pages(path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("input file not found: {}", path.display());
    }

    let is_pdf = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let pages = if is_pdf {
        extract_pages_with_pdftotext(path, max_pages)?
    } else {
        extract_pages_from_text(path, max_pages)?
    };

    info!(
        path = %path.display(),
        page_count = pages.len(),
        "extracted page text"
    );

    Ok(pages)
}

fn extract_pages_with_pdftotext(path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(split_form_feed_pages(&raw, max_pages))
}

/// Plain-text inputs use form feed as the page separator; a file with no
/// form feeds is a single page.
fn extract_pages_from_text(path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    Ok(split_form_feed_pages(&raw, max_pages))
}

fn split_form_feed_pages(raw: &str, max_pages: Option<usize>) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    // A trailing form feed leaves one empty chunk behind the last real
    // page. Drop only that artifact; a legitimately empty (image-only)
    // final page stays.
    if pages.len() > 1 && pages.last().is_some_and(|last| last.trim().is_empty()) {
        pages.pop();
    }

    if let Some(max_pages) = max_pages {
        pages.truncate(max_pages);
    }

    pages
}
