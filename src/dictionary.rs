use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::util::{normalize_whitespace, title_case};

/// Baseline controlled vocabulary: category name to canonical phrases.
/// Categories are open strings; an override file may extend any list or
/// introduce new categories.
const BASELINE_TERMS: &[(&str, &[&str])] = &[
    (
        "administrative_law",
        &[
            "rulemaking",
            "adjudication",
            "judicial review",
            "administrative agency",
            "due process",
            "equal protection",
            "public disclosure",
            "freedom of information",
            "administrative procedure act",
            "chevron deference",
            "arbitrary and capricious",
        ],
    ),
    (
        "business_entities",
        &[
            "corporation",
            "limited liability company",
            "llc",
            "partnership",
            "limited partnership",
            "general partnership",
            "professional service corporation",
            "articles of incorporation",
            "bylaws",
            "board of directors",
            "shareholders",
            "piercing corporate veil",
            "ultra vires",
            "derivative suit",
        ],
    ),
    (
        "civil_procedure",
        &[
            "personal jurisdiction",
            "service of process",
            "statute of limitations",
            "pleadings",
            "discovery",
            "deposition",
            "interrogatories",
            "summary judgment",
            "motion to dismiss",
            "motion for summary judgment",
            "motion in limine",
            "directed verdict",
            "judgment as a matter of law",
            "res judicata",
            "collateral estoppel",
            "standard of review",
            "affidavit",
            "affirmation",
            "provisional remedies",
            "attachment",
            "preliminary injunction",
            "temporary restraining order",
            "mandamus",
            "certiorari",
        ],
    ),
    (
        "conflict_of_laws",
        &[
            "choice of law",
            "lex loci",
            "comity",
            "full faith and credit",
            "renvoi",
            "domicile",
            "forum shopping",
            "most significant relationship",
        ],
    ),
    (
        "contracts",
        &[
            "consideration",
            "statute of frauds",
            "parol evidence rule",
            "unconscionability",
            "mutual mistake",
            "unilateral mistake",
            "third-party beneficiary",
            "meeting of minds",
            "offer and acceptance",
            "mutual assent",
            "material breach",
            "anticipatory breach",
            "substantial performance",
            "breach of contract",
            "specific performance",
            "rescission",
            "reformation",
            "quantum meruit",
            "unjust enrichment",
            "good faith",
            "bad faith",
            "arm's length",
            "bona fide",
        ],
    ),
    (
        "courts_jurisdiction",
        &[
            "appellate court",
            "trial court",
            "supreme court",
            "family court",
            "surrogate court",
            "criminal court",
            "civil court",
            "district court",
            "court of appeals",
            "jurisdiction",
            "venue",
            "forum non conveniens",
            "subject matter jurisdiction",
            "in rem",
            "quasi in rem",
        ],
    ),
    (
        "criminal_law",
        &[
            "felony",
            "misdemeanor",
            "mens rea",
            "actus reus",
            "recklessness",
            "probable cause",
            "reasonable suspicion",
            "affirmative defense",
            "self-defense",
            "duress",
            "entrapment",
            "insanity defense",
            "juvenile offender",
            "youthful offender",
            "arraignment",
            "indictment",
            "plea bargain",
        ],
    ),
    (
        "estates_trusts",
        &[
            "testament",
            "intestate",
            "probate",
            "executor",
            "administrator",
            "beneficiary",
            "devise",
            "bequest",
            "trustee",
            "settlor",
            "power of attorney",
            "health care proxy",
            "living will",
            "estate planning",
            "elective share",
            "pretermitted heir",
            "per stirpes",
            "per capita",
        ],
    ),
    (
        "evidence",
        &[
            "relevance",
            "hearsay",
            "privilege",
            "attorney-client privilege",
            "physician-patient privilege",
            "spousal privilege",
            "work product",
            "judicial notice",
            "authentication",
            "best evidence rule",
            "burden of proof",
            "preponderance of evidence",
            "clear and convincing",
            "beyond reasonable doubt",
            "chain of custody",
            "expert witness",
            "expert testimony",
            "lay witness",
            "lay opinion",
            "impeachment",
            "character evidence",
            "habit evidence",
            "prior bad acts",
        ],
    ),
    (
        "family_law",
        &[
            "marriage",
            "divorce",
            "separation",
            "annulment",
            "custody",
            "child support",
            "spousal support",
            "maintenance",
            "alimony",
            "equitable distribution",
            "marital property",
            "separate property",
            "adoption",
            "parentage",
            "paternity",
            "visitation",
            "parenting time",
            "legal custody",
            "physical custody",
            "best interests of child",
            "domestic violence",
            "family offense",
            "order of protection",
        ],
    ),
    (
        "professional_responsibility",
        &[
            "attorney-client relationship",
            "confidentiality",
            "conflict of interest",
            "retainer agreement",
            "legal fees",
            "client funds",
            "trust account",
            "solicitation",
            "pro bono",
            "disciplinary proceedings",
            "competent representation",
            "zealous advocacy",
            "candor to tribunal",
            "withdrawal from representation",
        ],
    ),
    (
        "real_property",
        &[
            "landlord",
            "tenant",
            "lease",
            "mortgage",
            "deed",
            "easement",
            "covenant",
            "zoning",
            "eminent domain",
            "adverse possession",
            "chain of title",
            "encumbrance",
            "fee simple",
            "life estate",
            "remainder",
            "reversion",
            "servitude",
        ],
    ),
    (
        "torts",
        &[
            "negligence",
            "duty of care",
            "breach of duty",
            "causation",
            "proximate cause",
            "foreseeability",
            "substantial factor",
            "strict liability",
            "negligence per se",
            "res ipsa loquitur",
            "product liability",
            "defamation",
            "libel",
            "slander",
            "intentional tort",
            "assault",
            "battery",
            "false imprisonment",
            "no-fault insurance",
            "emotional distress",
            "invasion of privacy",
            "nuisance",
        ],
    ),
];

/// Phrases whose display label is written as-is instead of title-cased.
const DISPLAY_AS_WRITTEN: &[(&str, &str)] = &[("llc", "LLC")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    /// Normalized matching phrase: lowercase, single-spaced.
    pub phrase: String,
    /// Canonical display label.
    pub label: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct TermDictionary {
    entries: Vec<TermEntry>,
}

impl TermDictionary {
    /// Builds the dictionary from the baseline table, merging an optional
    /// override file of shape `{"category": ["phrase", ...]}`. Override
    /// phrases append to existing categories; unknown category names
    /// create new ones.
    pub fn load(override_path: Option<&Path>) -> Result<TermDictionary> {
        let mut dictionary = TermDictionary::baseline();

        if let Some(path) = override_path {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read terms file: {}", path.display()))?;
            let overrides: BTreeMap<String, Vec<String>> = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse terms file: {}", path.display()))?;

            if overrides.values().all(|phrases| phrases.is_empty()) {
                bail!("terms file contains no phrases: {}", path.display());
            }

            let added = dictionary.merge_overrides(&overrides);
            info!(
                path = %path.display(),
                categories = overrides.len(),
                phrases_added = added,
                "merged override terms"
            );
        }

        Ok(dictionary)
    }

    pub fn baseline() -> TermDictionary {
        let mut dictionary = TermDictionary::default();
        for (category, phrases) in BASELINE_TERMS {
            for phrase in *phrases {
                dictionary.insert(category, phrase);
            }
        }
        dictionary
    }

    pub fn entries(&self) -> &[TermEntry] {
        &self.entries
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories = self
            .entries
            .iter()
            .map(|entry| entry.category.as_str())
            .collect::<Vec<&str>>();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    fn merge_overrides(&mut self, overrides: &BTreeMap<String, Vec<String>>) -> usize {
        let mut added = 0usize;
        for (category, phrases) in overrides {
            for phrase in phrases {
                if self.insert(category, phrase) {
                    added += 1;
                }
            }
        }
        added
    }

    fn insert(&mut self, category: &str, phrase: &str) -> bool {
        let normalized = normalize_whitespace(&phrase.to_lowercase());
        if normalized.is_empty() {
            return false;
        }

        let duplicate = self
            .entries
            .iter()
            .any(|entry| entry.phrase == normalized && entry.category == category);
        if duplicate {
            return false;
        }

        self.entries.push(TermEntry {
            label: display_label(&normalized),
            phrase: normalized,
            category: category.to_string(),
        });
        true
    }
}

fn display_label(phrase: &str) -> String {
    for (written, label) in DISPLAY_AS_WRITTEN {
        if phrase == *written {
            return (*label).to_string();
        }
    }
    title_case(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_covers_all_named_categories() {
        let dictionary = TermDictionary::baseline();
        let categories = dictionary.categories();
        for expected in [
            "administrative_law",
            "business_entities",
            "civil_procedure",
            "conflict_of_laws",
            "contracts",
            "courts_jurisdiction",
            "criminal_law",
            "estates_trusts",
            "evidence",
            "family_law",
            "professional_responsibility",
            "real_property",
            "torts",
        ] {
            assert!(categories.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn phrases_are_normalized_and_labelled() {
        let dictionary = TermDictionary::baseline();
        let entry = dictionary
            .entries()
            .iter()
            .find(|entry| entry.phrase == "summary judgment")
            .expect("summary judgment in baseline");
        assert_eq!(entry.label, "Summary Judgment");
        assert_eq!(entry.category, "civil_procedure");
    }

    #[test]
    fn abbreviations_keep_written_form() {
        let dictionary = TermDictionary::baseline();
        let entry = dictionary
            .entries()
            .iter()
            .find(|entry| entry.phrase == "llc")
            .expect("llc in baseline");
        assert_eq!(entry.label, "LLC");
    }

    #[test]
    fn overrides_append_and_create_categories() {
        let mut dictionary = TermDictionary::baseline();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "torts".to_string(),
            vec!["Loss  Of Consortium".to_string()],
        );
        overrides.insert(
            "immigration".to_string(),
            vec!["asylum".to_string()],
        );

        let added = dictionary.merge_overrides(&overrides);
        assert_eq!(added, 2);

        let consortium = dictionary
            .entries()
            .iter()
            .find(|entry| entry.phrase == "loss of consortium")
            .expect("override phrase normalized");
        assert_eq!(consortium.label, "Loss Of Consortium");
        assert_eq!(consortium.category, "torts");

        assert!(dictionary.categories().contains(&"immigration"));
    }

    #[test]
    fn same_phrase_may_live_in_two_categories() {
        let mut dictionary = TermDictionary::baseline();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "family_law".to_string(),
            vec!["negligence".to_string()],
        );

        dictionary.merge_overrides(&overrides);

        let homes = dictionary
            .entries()
            .iter()
            .filter(|entry| entry.phrase == "negligence")
            .map(|entry| entry.category.as_str())
            .collect::<Vec<&str>>();
        assert!(homes.contains(&"torts"));
        assert!(homes.contains(&"family_law"));
    }

    fn write_terms_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "legalindex_terms_{name}_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("write terms file");
        path
    }

    #[test]
    fn load_rejects_empty_override_object() {
        let path = write_terms_file("empty_object", "{}");
        let result = TermDictionary::load(Some(&path));
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_all_empty_phrase_lists() {
        let path = write_terms_file("empty_lists", r#"{"torts": [], "contracts": []}"#);
        let result = TermDictionary::load(Some(&path));
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn load_rejects_non_object_terms_file() {
        let path = write_terms_file("non_object", "[1, 2, 3]");
        let result = TermDictionary::load(Some(&path));
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn load_fails_for_missing_terms_file() {
        let path = std::env::temp_dir().join("legalindex_terms_does_not_exist.json");
        assert!(TermDictionary::load(Some(&path)).is_err());
    }

    #[test]
    fn duplicate_override_phrase_is_ignored() {
        let mut dictionary = TermDictionary::baseline();
        let before = dictionary.entries().len();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "torts".to_string(),
            vec!["negligence".to_string()],
        );

        let added = dictionary.merge_overrides(&overrides);
        assert_eq!(added, 0);
        assert_eq!(dictionary.entries().len(), before);
    }
}
