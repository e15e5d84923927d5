use anyhow::{Context, Result};
use regex::Regex;

use crate::dictionary::{TermDictionary, TermEntry};
use crate::model::ConceptKind;
use crate::util::normalize_whitespace;

/// New York code families recognized by the statute recognizer. Spellings
/// are matched case-insensitively; every spelling folds to the full code
/// name on the right.
const CODE_FAMILIES: &[(&str, &str)] = &[
    ("civil practice law and rules", "Civil Practice Law and Rules"),
    ("cplr", "Civil Practice Law and Rules"),
    ("criminal procedure law", "Criminal Procedure Law"),
    ("cpl", "Criminal Procedure Law"),
    ("penal law", "Penal Law"),
    ("domestic relations law", "Domestic Relations Law"),
    ("drl", "Domestic Relations Law"),
    ("general obligations law", "General Obligations Law"),
    ("gol", "General Obligations Law"),
    ("real property law", "Real Property Law"),
    ("rpl", "Real Property Law"),
    ("estates, powers and trusts law", "Estates, Powers and Trusts Law"),
    ("eptl", "Estates, Powers and Trusts Law"),
    ("business corporation law", "Business Corporation Law"),
    ("bcl", "Business Corporation Law"),
    ("family court act", "Family Court Act"),
    ("fca", "Family Court Act"),
    ("rule", "Rule"),
];

/// Single capitalized words that never stand alone as a case-caption party.
/// A candidate citation whose party reduces to one of these is dropped.
const PARTY_GUARD_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "cf", "e.g", "for", "he", "id",
    "if", "in", "it", "no", "of", "on", "or", "see", "she", "that", "the",
    "they", "this", "to", "we",
];

/// One accepted recognizer match against a single page's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub label: String,
    pub kind: ConceptKind,
    pub category: Option<String>,
    pub start: usize,
    pub end: usize,
}

/// Union of the three recognizers over one page, plus the candidates each
/// recognizer matched but dropped on a sanity guard.
#[derive(Debug, Clone, Default)]
pub struct PageMatches {
    pub matches: Vec<PatternMatch>,
    pub dropped_statute_candidates: usize,
    pub dropped_citation_candidates: usize,
}

pub struct PatternLibrary {
    statutes: StatuteRecognizer,
    citations: CitationRecognizer,
    phrases: PhraseRecognizer,
}

impl PatternLibrary {
    pub fn new(dictionary: &TermDictionary) -> Result<PatternLibrary> {
        Ok(PatternLibrary {
            statutes: StatuteRecognizer::new()?,
            citations: CitationRecognizer::new()?,
            phrases: PhraseRecognizer::new(dictionary)?,
        })
    }

    /// Runs all three recognizers against one page's text. The recognizers
    /// are independent; their results are unioned with no class-level
    /// precedence. No match crosses a page boundary.
    pub fn scan_page(&self, text: &str) -> PageMatches {
        let mut page = PageMatches::default();

        let (statutes, statutes_dropped) = self.statutes.recognize(text);
        page.matches.extend(statutes);
        page.dropped_statute_candidates += statutes_dropped;

        let (citations, citations_dropped) = self.citations.recognize(text);
        page.matches.extend(citations);
        page.dropped_citation_candidates += citations_dropped;

        page.matches.extend(self.phrases.recognize(text));
        page
    }
}

struct StatuteRecognizer {
    family_pattern: Regex,
    generic_pattern: Regex,
}

#[derive(Debug, Clone)]
struct StatuteCandidate {
    label: String,
    family_len: usize,
    start: usize,
    end: usize,
}

impl StatuteRecognizer {
    fn new() -> Result<StatuteRecognizer> {
        // Longer spellings first so the alternation prefers a full code
        // name over an abbreviation starting at the same position.
        let mut spellings = CODE_FAMILIES
            .iter()
            .map(|(spelling, _)| *spelling)
            .collect::<Vec<&str>>();
        spellings.sort_by(|left, right| right.len().cmp(&left.len()));

        let alternation = spellings
            .iter()
            .map(|spelling| regex::escape(spelling))
            .collect::<Vec<String>>()
            .join("|");

        let section = r"[0-9]+(?:[.\-][0-9]+)*(?:\([a-z0-9\-]+\))*";
        let family_pattern = Regex::new(&format!(
            r"(?i)\b(?P<family>{alternation})\s*(?:article\s+[0-9ivxlc]+\s*,?\s*)?(?:§|section\b|sec\.)?\s*(?P<section>{section})"
        ))
        .context("failed to compile statute family pattern")?;

        let generic_pattern = Regex::new(&format!(
            r"\b(?P<family>(?:N\.Y\.|New York)\s+(?:[A-Z][A-Za-z]*\s+){{0,4}}?(?:Law|Code))\s*(?:§|Section\b|Sec\.)?\s*(?P<section>{section})"
        ))
        .context("failed to compile generic statute pattern")?;

        Ok(StatuteRecognizer {
            family_pattern,
            generic_pattern,
        })
    }

    fn recognize(&self, text: &str) -> (Vec<PatternMatch>, usize) {
        let mut candidates = Vec::<StatuteCandidate>::new();

        for captures in self.family_pattern.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let family = &captures["family"];
            let section = &captures["section"];
            let full_name = full_code_name(family);

            candidates.push(StatuteCandidate {
                label: format!("{full_name} § {section}"),
                family_len: family.len(),
                start: whole.start(),
                end: whole.end(),
            });
        }

        for captures in self.generic_pattern.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let family = normalize_whitespace(&captures["family"]).replace("N.Y.", "New York");
            let section = &captures["section"];
            let full_name = strip_known_state_prefix(&family);

            candidates.push(StatuteCandidate {
                label: format!("{full_name} § {section}"),
                family_len: family.len(),
                start: whole.start(),
                end: whole.end(),
            });
        }

        resolve_statute_overlaps(candidates)
    }
}

fn full_code_name(spelling: &str) -> String {
    let lowered = spelling.to_lowercase();
    let normalized = normalize_whitespace(&lowered);
    for (candidate, full_name) in CODE_FAMILIES {
        if *candidate == normalized {
            return (*full_name).to_string();
        }
    }
    crate::util::title_case(&normalized)
}

/// "New York Penal Law" and the table's "Penal Law" must agree on one
/// canonical label, so a known family hiding behind the state prefix wins.
fn strip_known_state_prefix(family: &str) -> String {
    if let Some(remainder) = family.strip_prefix("New York ") {
        let lowered = remainder.to_lowercase();
        for (candidate, full_name) in CODE_FAMILIES {
            if *candidate == lowered {
                return (*full_name).to_string();
            }
        }
    }
    family.to_string()
}

/// Overlapping statute candidates resolve to the longest matched
/// code-family name; the discarded shorter candidates are counted as
/// dropped for diagnostics.
fn resolve_statute_overlaps(mut candidates: Vec<StatuteCandidate>) -> (Vec<PatternMatch>, usize) {
    candidates.sort_by(|left, right| {
        right
            .family_len
            .cmp(&left.family_len)
            .then_with(|| left.start.cmp(&right.start))
    });

    let mut kept = Vec::<StatuteCandidate>::new();
    let mut dropped = 0usize;

    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|existing| candidate.start < existing.end && existing.start < candidate.end);
        if overlaps {
            dropped += 1;
        } else {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|candidate| candidate.start);
    let matches = kept
        .into_iter()
        .map(|candidate| PatternMatch {
            label: candidate.label,
            kind: ConceptKind::Statute,
            category: None,
            start: candidate.start,
            end: candidate.end,
        })
        .collect();

    (matches, dropped)
}

struct CitationRecognizer {
    pattern: Regex,
}

impl CitationRecognizer {
    fn new() -> Result<CitationRecognizer> {
        let word = r"[A-Z][A-Za-z'&.\-]*";
        let party = format!(r"{word}(?:\s+(?:&|{word})){{0,4}}");
        let pattern = Regex::new(&format!(
            r"\b(?P<left>{party})\s+(?:v|vs)\.?\s+(?P<right>{party})(?:\s*\([^)\n]{{0,60}}\))?"
        ))
        .context("failed to compile citation pattern")?;

        Ok(CitationRecognizer { pattern })
    }

    fn recognize(&self, text: &str) -> (Vec<PatternMatch>, usize) {
        let mut matches = Vec::<PatternMatch>::new();
        let mut dropped = 0usize;

        for captures in self.pattern.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let left = trim_party(&captures["left"], true);
            let right = trim_party(&captures["right"], false);

            let (Some(left), Some(right)) = (left, right) else {
                dropped += 1;
                continue;
            };

            matches.push(PatternMatch {
                label: format!("{left} v. {right}"),
                kind: ConceptKind::CaseCitation,
                category: None,
                start: whole.start(),
                end: whole.end(),
            });
        }

        (matches, dropped)
    }
}

/// Normalizes a party fragment and applies the stray-word guard. Leading
/// stray words are shed from the left party, trailing ones from the right
/// party (the pattern can overrun into the neighbouring sentence). Returns
/// None when nothing defensible remains.
fn trim_party(raw: &str, leading: bool) -> Option<String> {
    let normalized = normalize_whitespace(raw);
    let mut words = normalized.split(' ').collect::<Vec<&str>>();

    if leading {
        while words.len() > 1 && sheds_from_left(words[0]) {
            words.remove(0);
        }
    } else {
        while words.len() > 1 && is_guard_word(words[words.len() - 1]) {
            words.pop();
        }
    }

    if words.is_empty() {
        return None;
    }
    if words.len() == 1 && is_guard_word(words[0]) {
        return None;
    }

    Some(words.join(" "))
}

fn is_guard_word(word: &str) -> bool {
    let bare = word.trim_matches('.').to_lowercase();
    PARTY_GUARD_WORDS.contains(&bare.as_str())
}

/// A leading word carrying a period is the tail of the previous sentence,
/// not part of the party, unless it is a corporate suffix or an
/// initialism ("W.T.", "U.S.").
fn sheds_from_left(word: &str) -> bool {
    if is_guard_word(word) {
        return true;
    }
    word.ends_with('.') && !is_party_suffix(word)
}

fn is_party_suffix(word: &str) -> bool {
    const SUFFIXES: &[&str] = &["inc.", "corp.", "co.", "ltd."];
    let lowered = word.to_lowercase();
    SUFFIXES.contains(&lowered.as_str()) || is_initialism(word)
}

/// Strict letter-period pairs only: "U.S.", "W.T.", "J.".
fn is_initialism(word: &str) -> bool {
    let mut characters = word.chars();
    let mut pairs = 0usize;
    while let Some(character) = characters.next() {
        if !character.is_alphabetic() {
            return false;
        }
        if characters.next() != Some('.') {
            return false;
        }
        pairs += 1;
    }
    pairs > 0
}

struct PhrasePattern {
    regex: Regex,
    entry: TermEntry,
}

struct PhraseRecognizer {
    patterns: Vec<PhrasePattern>,
}

impl PhraseRecognizer {
    fn new(dictionary: &TermDictionary) -> Result<PhraseRecognizer> {
        let mut patterns = Vec::with_capacity(dictionary.entries().len());
        for entry in dictionary.entries() {
            let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&entry.phrase)))
                .with_context(|| format!("failed to compile phrase pattern: {}", entry.phrase))?;
            patterns.push(PhrasePattern {
                regex,
                entry: entry.clone(),
            });
        }
        Ok(PhraseRecognizer { patterns })
    }

    fn recognize(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::<PatternMatch>::new();

        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(text) {
                matches.push(PatternMatch {
                    label: pattern.entry.label.clone(),
                    kind: ConceptKind::Term,
                    category: Some(pattern.entry.category.clone()),
                    start: found.start(),
                    end: found.end(),
                });
            }
        }

        suppress_contained_phrases(matches)
    }
}

/// A phrase match fully contained inside a longer phrase match is
/// suppressed ("support" inside "spousal support"); partial overlaps that
/// merely share some text are all kept.
fn suppress_contained_phrases(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    matches.sort_by(|left, right| {
        (right.end - right.start)
            .cmp(&(left.end - left.start))
            .then_with(|| left.start.cmp(&right.start))
            .then_with(|| left.label.cmp(&right.label))
    });

    let mut kept = Vec::<PatternMatch>::new();
    for candidate in matches {
        let contained = kept.iter().any(|existing| {
            candidate.start >= existing.start
                && candidate.end <= existing.end
                && (candidate.end - candidate.start) < (existing.end - existing.start)
        });
        if !contained {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|found| (found.start, found.end));
    kept
}
