use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::TermsArgs;
use crate::dictionary::TermDictionary;

/// Lists the effective dictionary: baseline plus any override file.
pub fn run(args: TermsArgs) -> Result<()> {
    let dictionary = TermDictionary::load(args.terms_file.as_deref())?;

    let mut by_category = BTreeMap::<&str, Vec<&str>>::new();
    for entry in dictionary.entries() {
        by_category
            .entry(entry.category.as_str())
            .or_default()
            .push(entry.label.as_str());
    }

    if let Some(category) = &args.category {
        let Some(labels) = by_category.get(category.as_str()) else {
            warn!(category = %category, "no such category in the effective dictionary");
            return Ok(());
        };
        for label in labels {
            info!(category = %category, term = %label, "dictionary term");
        }
        info!(category = %category, terms = labels.len(), "category listed");
        return Ok(());
    }

    for (category, labels) in &by_category {
        info!(category = %category, terms = labels.len(), "dictionary category");
    }
    info!(
        categories = by_category.len(),
        terms = dictionary.entries().len(),
        "effective dictionary"
    );

    Ok(())
}
