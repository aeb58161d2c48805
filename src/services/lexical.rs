// Locked lexical lists, regex builders and deterministic marker counts.
//
// The lists are the single source of truth for segmentation locks and the
// strictly lexical counts (reasons, hedges, adjacency links, revisions,
// evidence types). Keep them stable to preserve numeric reproducibility; do
// not normalize punctuation or spacing anywhere in this module.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvidenceType {
    Example,
    Data,
    Authority,
    Analogy,
    Counterexample,
    Experience,
    Theory,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Example => "example",
            EvidenceType::Data => "data",
            EvidenceType::Authority => "authority",
            EvidenceType::Analogy => "analogy",
            EvidenceType::Counterexample => "counterexample",
            EvidenceType::Experience => "experience",
            EvidenceType::Theory => "theory",
        }
    }
}

/// Fixed output order for evidence types.
pub const FIXED_EVIDENCE_ORDER: [EvidenceType; 7] = [
    EvidenceType::Example,
    EvidenceType::Data,
    EvidenceType::Authority,
    EvidenceType::Analogy,
    EvidenceType::Counterexample,
    EvidenceType::Experience,
    EvidenceType::Theory,
];

// Structural markers for factor lock segmentation. They can appear at
// sentence start or early in the sentence; prefer fewer units when uncertain.
pub const FACTOR_INDICATORS: &[&str] = &[
    "first",
    "firstly",
    "second",
    "secondly",
    "third",
    "thirdly",
    "fourth",
    "fourthly",
    "finally",
    "in conclusion",
    "to conclude",
    "overall",
    "one reason",
    "another reason",
    "a key factor",
    "the first factor",
    "the second factor",
    "the third factor",
    "the key factor",
];

// Sentences starting with these connectors must stay in the same unit as the
// preceding factor sentence.
pub const EXAMPLE_MERGE_LEADERS: &[&str] = &[
    "for example",
    "in this case",
    "therefore",
    "thus",
    "because",
    "as a result",
    "which means",
];

// Reasons counted only on explicit justification connectors.
pub const REASON_CONNECTORS: &[&str] = &[
    "because",
    "since",
    "therefore",
    "thus",
    "so that",
    "as a result",
    "which means",
];

// Adjacency links counted only on explicit logical connectors.
pub const ADJACENCY_CONNECTORS: &[&str] = &[
    "because",
    "therefore",
    "thus",
    "since",
    "so that",
    "hence",
    "consequently",
    "as a result",
    "which means",
];

pub const HEDGE_WORDS: &[&str] = &["may", "might", "could", "possibly", "likely", "suggest"];

// Shallow reframing markers (revision depth 0.2).
pub const REFRAME_MARKERS: &[&str] = &[
    "rather than",
    "instead of",
    "more important than",
    "less important than",
    "move away from",
    "shift from",
];

// Explicit correction markers (revision depth 0.5).
pub const CORRECTION_MARKERS: &[&str] = &[
    "however i revise",
    "on reconsideration",
    "i change",
    "correction",
    "reconsideration",
    "withdraw",
    "replace",
];

const EXAMPLE_HINTS: &[&str] = &["for example", "in this case"];
const DATA_HINTS: &[&str] = &["data", "statistics", "percent", "%"];
const AUTHORITY_HINTS: &[&str] = &[
    "according to",
    "research",
    "study",
    "report",
    "expert",
    "explanation (",
];
// "like" is ambiguous and explodes false positives; keep analogy conservative.
const ANALOGY_HINTS: &[&str] = &["as if"];
const COUNTEREXAMPLE_HINTS: &[&str] = &["counterexample"];
const EXPERIENCE_HINTS: &[&str] = &["experienced"];
const THEORY_HINTS: &[&str] = &["principle", "theory", "framework"];

// ============ Regex tables ============

fn numbered_line_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(\d{1,3})\s*([.)]|:|-)\s+").unwrap())
}

fn ordinal_line_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^\s*(first|firstly|second|secondly|third|thirdly|fourth|fourthly|finally)\b")
            .unwrap()
    })
}

fn page_marker_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*-\s*\d{1,4}\s*-\s*$").unwrap())
}

fn not_x_but_y() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bnot\b[\s\S]{1,80}\bbut\b").unwrap())
}

fn no_longer_instead() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bno longer\b[\s\S]{1,80}\binstead\b").unwrap())
}

fn lead_regexes(phrases: &[&str]) -> Vec<Regex> {
    phrases
        .iter()
        .map(|p| {
            Regex::new(&format!(
                "(?i)^\\s*[\"'(\\[]?\\s*{}\\b",
                regex::escape(p)
            ))
            .unwrap()
        })
        .collect()
}

fn factor_lead_regexes() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| lead_regexes(FACTOR_INDICATORS))
}

fn merge_leader_regexes() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| lead_regexes(EXAMPLE_MERGE_LEADERS))
}

// ============ Detectors ============

pub fn is_factor_lead_sentence(sentence: &str) -> bool {
    if ordinal_line_start().is_match(sentence) {
        return true;
    }
    factor_lead_regexes().iter().any(|re| re.is_match(sentence))
}

pub fn is_example_merge_leader_sentence(sentence: &str) -> bool {
    merge_leader_regexes().iter().any(|re| re.is_match(sentence))
}

pub fn has_numbered_list_structure(full_text: &str) -> bool {
    if full_text.is_empty() {
        return false;
    }
    let cleaned = strip_first_page_marker_line(full_text);
    numbered_line_start().is_match(&cleaned)
}

pub fn numbered_item_starts(full_text: &str) -> Vec<usize> {
    numbered_line_start()
        .find_iter(full_text)
        .map(|m| m.start())
        .collect()
}

/// Removes the first pure page-marker line ("- N -" pagination artifact).
pub fn strip_first_page_marker_line(text: &str) -> String {
    page_marker_line().replace(text, "").into_owned()
}

/// Deterministic edge trim: leading and trailing whitespace only.
pub fn trim_edges_only(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace())
}

// ============ Counts ============

#[derive(Debug, Clone, Default)]
pub struct DeterministicCounts {
    pub reasons: u32,
    pub hedges: u32,
    pub adjacency_links: u32,
    pub evidence_types: Vec<EvidenceType>,
    /// 0/1 flags aligned to the unit list.
    pub per_unit_revisions: Vec<u32>,
    pub revisions: u32,
    pub revision_depth_sum: f64,
}

fn count_occurrences_boundary(text: &str, phrase: &str) -> u32 {
    if text.is_empty() || phrase.is_empty() {
        return 0;
    }
    let re = Regex::new(&format!("(?i)\\b{}\\b", regex::escape(phrase))).unwrap();
    re.find_iter(text).count() as u32
}

fn count_phrases(text: &str, phrases: &[&str]) -> u32 {
    phrases
        .iter()
        .map(|p| count_occurrences_boundary(text, p))
        .sum()
}

fn stable_round1(x: f64) -> f64 {
    ((x + f64::EPSILON) * 10.0).round() / 10.0
}

// At most one revision event per unit; correction markers take precedence
// over shallow reframing.
fn detect_single_revision_event(unit: &str) -> Option<f64> {
    let t = unit.to_lowercase();

    for m in CORRECTION_MARKERS {
        if t.contains(m) {
            return Some(0.5);
        }
    }
    for m in REFRAME_MARKERS {
        if t.contains(m) {
            return Some(0.2);
        }
    }
    if not_x_but_y().is_match(&t) {
        return Some(0.2);
    }
    if no_longer_instead().is_match(&t) {
        return Some(0.2);
    }
    None
}

fn contains_any(text_lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text_lower.contains(p))
}

/// Presence-only evidence type detection over the joined unit text, emitted
/// in the fixed output order.
pub fn detect_evidence_types(units: &[String]) -> Vec<EvidenceType> {
    let full = units.join("\n").to_lowercase();

    let checks: [(EvidenceType, &[&str]); 7] = [
        (EvidenceType::Example, EXAMPLE_HINTS),
        (EvidenceType::Data, DATA_HINTS),
        (EvidenceType::Authority, AUTHORITY_HINTS),
        (EvidenceType::Analogy, ANALOGY_HINTS),
        (EvidenceType::Counterexample, COUNTEREXAMPLE_HINTS),
        (EvidenceType::Experience, EXPERIENCE_HINTS),
        (EvidenceType::Theory, THEORY_HINTS),
    ];

    let present: Vec<EvidenceType> = checks
        .iter()
        .filter(|(_, hints)| contains_any(&full, hints))
        .map(|(t, _)| *t)
        .collect();

    FIXED_EVIDENCE_ORDER
        .iter()
        .filter(|t| present.contains(t))
        .copied()
        .collect()
}

/// Strictly lexical-marker counts over the final deterministic units.
/// Claims, evidence, transitions and drift stay with the caller; they need
/// richer interpretation than marker matching.
pub fn compute_deterministic_counts(unit_texts: &[String]) -> DeterministicCounts {
    let units: Vec<String> = unit_texts
        .iter()
        .map(|u| trim_edges_only(u).to_string())
        .collect();
    let joined = units.join("\n");

    let reasons = count_phrases(&joined, REASON_CONNECTORS);
    let hedges = count_phrases(&joined, HEDGE_WORDS);
    let adjacency_links = count_phrases(&joined, ADJACENCY_CONNECTORS);

    let mut per_unit_revisions = Vec::with_capacity(units.len());
    let mut revisions = 0;
    let mut depth_sum = 0.0;
    for u in &units {
        match detect_single_revision_event(u) {
            Some(depth) => {
                per_unit_revisions.push(1);
                revisions += 1;
                depth_sum += depth;
            }
            None => per_unit_revisions.push(0),
        }
    }

    DeterministicCounts {
        reasons,
        hedges,
        adjacency_links,
        evidence_types: detect_evidence_types(&units),
        per_unit_revisions,
        revisions,
        revision_depth_sum: stable_round1(depth_sum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_boundary_counting() {
        assert_eq!(count_occurrences_boundary("because Because BECAUSE", "because"), 3);
        // "thusly" must not count as "thus".
        assert_eq!(count_occurrences_boundary("thusly", "thus"), 0);
        assert_eq!(count_occurrences_boundary("so that it works, so that", "so that"), 2);
    }

    #[test]
    fn test_factor_lead_detection() {
        assert!(is_factor_lead_sentence("First, the cost matters."));
        assert!(is_factor_lead_sentence("  \"Secondly\" the point stands."));
        assert!(is_factor_lead_sentence("One reason is simple."));
        assert!(!is_factor_lead_sentence("The first thing we tried failed."));
    }

    #[test]
    fn test_merge_leader_detection() {
        assert!(is_example_merge_leader_sentence("For example, consider birds."));
        assert!(is_example_merge_leader_sentence(" (Therefore the claim holds.)"));
        assert!(!is_example_merge_leader_sentence("Examples are plentiful."));
    }

    #[test]
    fn test_numbered_list_detection() {
        assert!(has_numbered_list_structure("1. point one\n2) point two"));
        assert!(!has_numbered_list_structure("no numbers here"));
        // A pure page marker alone is not a numbered list.
        assert!(!has_numbered_list_structure(" - 1 - "));
    }

    #[test]
    fn test_revision_markers() {
        let c = compute_deterministic_counts(&units(&[
            "On reconsideration, I withdraw the claim.",
            "It is not speed but accuracy that matters.",
            "Nothing changes here.",
        ]));
        assert_eq!(c.per_unit_revisions, vec![1, 1, 0]);
        assert_eq!(c.revisions, 2);
        assert_eq!(c.revision_depth_sum, 0.7);
    }

    #[test]
    fn test_one_revision_event_per_unit() {
        // Correction marker wins over reframing in the same unit; depth 0.5 once.
        let c = compute_deterministic_counts(&units(&[
            "Correction: rather than X, I now argue not A but B.",
        ]));
        assert_eq!(c.revisions, 1);
        assert_eq!(c.revision_depth_sum, 0.5);
    }

    #[test]
    fn test_evidence_types_fixed_order() {
        let e = detect_evidence_types(&units(&[
            "The theory rests on a principle.",
            "For example, statistics show 40 percent growth.",
        ]));
        let names: Vec<&str> = e.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["example", "data", "theory"]);
    }

    #[test]
    fn test_counts_over_joined_units() {
        let c = compute_deterministic_counts(&units(&[
            "This holds because the data agrees.",
            "Therefore we might conclude it could work.",
        ]));
        assert_eq!(c.reasons, 2);
        assert_eq!(c.adjacency_links, 2);
        assert_eq!(c.hedges, 2);
    }

    #[test]
    fn test_trim_edges_only() {
        assert_eq!(trim_edges_only("  a  b \n"), "a  b");
        assert_eq!(trim_edges_only("\t\n"), "");
    }
}
