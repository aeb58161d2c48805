// Deterministic reasoning-unit segmentation.
//
// Priority order is locked:
//   1) structural locks (factor markers, then numbered lists)
//   2) merge rules (parenthesis containment, example merge leaders)
//   3) intro / conclusion boundary splits
//   4) minimum unit variance (merge tiny fragments)
//
// Punctuation, spacing and capitalization are never normalized; line breaks
// count as one character downstream. Prefer fewer units when uncertain.

use crate::services::lexical::{
    has_numbered_list_structure, is_example_merge_leader_sentence, is_factor_lead_sentence,
    numbered_item_starts, strip_first_page_marker_line, trim_edges_only,
};

#[derive(Debug, Clone)]
struct Sentence {
    text: String,
    /// Byte offsets into the source slice.
    start: usize,
    end: usize,
}

/// Split raw text into semantic reasoning units.
pub fn segment_text(full_text_raw: &str) -> Vec<String> {
    let cleaned = strip_first_page_marker_line(full_text_raw);

    let sentences = split_sentences_conservative(&cleaned);
    if sentences.is_empty() {
        let t = trim_edges_only(&cleaned);
        return if t.is_empty() { Vec::new() } else { vec![t.to_string()] };
    }

    let base_units = build_units_by_structural_locks(&cleaned, &sentences);
    let merged = merge_units_by_rules(base_units);
    let with_boundaries = apply_intro_conclusion_rules(merged);
    let final_units = minimize_unit_variance(with_boundaries);

    final_units
        .iter()
        .map(|u| trim_edges_only(u).to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// Per-unit character counts. All characters count, including spaces and
/// punctuation; only leading and trailing whitespace is excluded, and a line
/// break counts as one character.
pub fn compute_unit_lengths(unit_texts: &[String]) -> Vec<usize> {
    unit_texts
        .iter()
        .map(|u| trim_edges_only(u).chars().count())
        .collect()
}

// ============ Step 1: structural locks ============

fn build_units_by_structural_locks(full_text: &str, sentences: &[Sentence]) -> Vec<String> {
    let has_factor = sentences.iter().any(|s| is_factor_lead_sentence(&s.text));

    // Factor lock takes precedence over numbered lists when both apply.
    if has_factor {
        return build_units_by_factor_locks(full_text, sentences);
    }
    if has_numbered_list_structure(full_text) {
        return build_units_by_numbered_lines(full_text);
    }
    build_units_by_paragraph_blocks(full_text)
}

// Each factor block is one unit: the factor claim sentence plus everything
// up to the next factor lead.
fn build_units_by_factor_locks(full_text: &str, sentences: &[Sentence]) -> Vec<String> {
    let factor_starts: Vec<usize> = sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| is_factor_lead_sentence(&s.text))
        .map(|(i, _)| i)
        .collect();

    if factor_starts.is_empty() {
        return build_units_by_paragraph_blocks(full_text);
    }

    let mut blocks = Vec::with_capacity(factor_starts.len());
    for (k, &start_idx) in factor_starts.iter().enumerate() {
        let end_idx_exclusive = factor_starts
            .get(k + 1)
            .copied()
            .unwrap_or(sentences.len());
        let start = sentences[start_idx].start;
        let end = sentences[end_idx_exclusive - 1].end;
        blocks.push(full_text[start..end].to_string());
    }
    blocks
}

fn build_units_by_numbered_lines(full_text: &str) -> Vec<String> {
    let starts = numbered_item_starts(full_text);
    if starts.is_empty() {
        return build_units_by_paragraph_blocks(full_text);
    }

    let mut units = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(full_text.len());
        units.push(full_text[start..end].to_string());
    }
    units
}

fn build_units_by_paragraph_blocks(full_text: &str) -> Vec<String> {
    let paras: Vec<String> = split_by_blank_lines(full_text)
        .into_iter()
        .map(|p| trim_edges_only(&p).to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if paras.is_empty() {
        let t = trim_edges_only(full_text);
        return if t.is_empty() { Vec::new() } else { vec![t.to_string()] };
    }
    paras
}

// ============ Step 2: merge rules ============

fn merge_units_by_rules(base_units: Vec<String>) -> Vec<String> {
    if base_units.len() <= 1 {
        return base_units;
    }
    let mut units = base_units;

    // Parenthesis boundary protection: a boundary inside open parentheses
    // merges with the next unit.
    let mut i = 0;
    while i + 1 < units.len() {
        if boundary_splits_open_parenthesis(&units[i], &units[i + 1]) {
            let right = units.remove(i + 1);
            units[i].push_str(&right);
            continue;
        }
        i += 1;
    }

    // A right unit whose first sentence starts with an example merge leader
    // must stay with the preceding factor sentence.
    let mut i = 0;
    while i + 1 < units.len() {
        let right_first = first_sentence_text(&units[i + 1]);
        if !right_first.is_empty() && is_example_merge_leader_sentence(&right_first) {
            let right = units.remove(i + 1);
            units[i].push_str(&right);
            continue;
        }
        i += 1;
    }

    units
}

fn boundary_splits_open_parenthesis(left: &str, right: &str) -> bool {
    if parenthesis_balance(left) <= 0 {
        return false;
    }
    right.chars().any(|c| matches!(c, ')' | ']' | '}'))
}

fn parenthesis_balance(s: &str) -> i32 {
    let mut bal = 0;
    for ch in s.chars() {
        match ch {
            '(' | '[' | '{' => bal += 1,
            ')' | ']' | '}' => bal -= 1,
            _ => {}
        }
    }
    bal
}

// ============ Step 3: intro / conclusion ============

fn apply_intro_conclusion_rules(units: Vec<String>) -> Vec<String> {
    if units.is_empty() {
        return units;
    }
    let mut out = units;

    let intro = split_intro_if_safe(&out[0]);
    out.splice(0..1, intro);

    let last_idx = out.len() - 1;
    let tail = split_conclusion_if_safe(&out[last_idx]);
    out.splice(last_idx..last_idx + 1, tail);

    out
}

// An introductory sentence that defines the overall claim before the factors
// becomes its own unit, unless extremely short.
fn split_intro_if_safe(unit: &str) -> Vec<String> {
    let sentences = split_sentences_conservative(unit);
    if sentences.len() < 2 {
        return vec![unit.to_string()];
    }

    let first = &sentences[0].text;
    if trim_edges_only(first).chars().count() < 40 {
        return vec![unit.to_string()];
    }

    let second = &sentences[1].text;
    if is_factor_lead_sentence(first) || !is_factor_lead_sentence(second) {
        return vec![unit.to_string()];
    }

    let intro_end = sentences[0].end;
    let intro = &unit[..intro_end];
    let rest = &unit[intro_end..];
    if parenthesis_balance(intro) != 0 {
        return vec![unit.to_string()];
    }

    vec![intro.to_string(), rest.to_string()]
}

fn split_conclusion_if_safe(unit: &str) -> Vec<String> {
    let sentences = split_sentences_conservative(unit);
    if sentences.len() < 2 {
        return vec![unit.to_string()];
    }

    let last = &sentences[sentences.len() - 1];
    let last_lower = trim_edges_only(&last.text).to_lowercase();
    let is_conclusion_lead = last_lower.starts_with("in conclusion")
        || last_lower.starts_with("to conclude")
        || last_lower.starts_with("overall");
    if !is_conclusion_lead {
        return vec![unit.to_string()];
    }
    if trim_edges_only(&last.text).chars().count() < 40 {
        return vec![unit.to_string()];
    }

    let head = &unit[..last.start];
    let concl = &unit[last.start..];
    if parenthesis_balance(head) != 0 {
        return vec![unit.to_string()];
    }

    vec![head.to_string(), concl.to_string()]
}

// ============ Step 4: minimum unit variance ============

// Units under 40 trimmed characters are likely artifacts; merge them into a
// neighbor rather than keeping extra units.
fn minimize_unit_variance(units: Vec<String>) -> Vec<String> {
    if units.len() <= 1 {
        return units;
    }
    let mut out = units;
    let mut i = 0;
    while i < out.len() {
        let len = trim_edges_only(&out[i]).chars().count();
        if len > 0 && len < 40 {
            if i > 0 {
                let cur = out.remove(i);
                out[i - 1].push_str(&cur);
                i = i.saturating_sub(1);
                continue;
            } else if out.len() > 1 {
                let next = out.remove(1);
                out[0].push_str(&next);
                continue;
            }
        }
        i += 1;
    }
    out
}

// ============ Sentence splitting ============

// Conservative splitter: break on . ? ! followed by whitespace or end of
// string, keeping the punctuation. No abbreviation handling; stability over
// perfect NLP.
fn split_sentences_conservative(text: &str) -> Vec<Sentence> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        let is_end_punct = matches!(b, b'.' | b'?' | b'!');
        if !is_end_punct {
            continue;
        }
        let boundary = i + 1 == bytes.len()
            || matches!(bytes[i + 1], b' ' | b'\n' | b'\r' | b'\t');
        if !boundary {
            continue;
        }
        let end = i + 1;
        out.push(Sentence {
            text: text[start..end].to_string(),
            start,
            end,
        });
        start = end;
    }

    if start < text.len() {
        out.push(Sentence {
            text: text[start..].to_string(),
            start,
            end: text.len(),
        });
    }

    out.into_iter()
        .filter(|s| !trim_edges_only(&s.text).is_empty())
        .collect()
}

fn first_sentence_text(unit: &str) -> String {
    split_sentences_conservative(unit)
        .into_iter()
        .next()
        .map(|s| s.text)
        .unwrap_or_default()
}

fn split_by_blank_lines(text: &str) -> Vec<String> {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"\n\s*\n+").unwrap());
    re.split(text).map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_trivial_input() {
        assert!(segment_text("").is_empty());
        assert!(segment_text("   \n  ").is_empty());
        let out = segment_text("Just one short line without structure at all here");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_factor_lock_segmentation() {
        let text = "First, the economic argument is strong because trade grows steadily. \
                    Second, the social argument also matters for communities over time. \
                    Third, environmental costs are real and must be weighed carefully.";
        let out = segment_text(text);
        assert_eq!(out.len(), 3);
        assert!(out[0].starts_with("First,"));
        assert!(out[1].starts_with("Second,"));
        assert!(out[2].starts_with("Third,"));
    }

    #[test]
    fn test_example_sentences_merge_into_factor_unit() {
        let text = "First, renewable energy lowers long-term costs for most households. \
                    For example, solar installations pay back within a decade in sunny regions. \
                    Second, grid stability improves when generation is distributed widely.";
        let out = segment_text(text);
        assert_eq!(out.len(), 2);
        assert!(out[0].contains("For example"));
    }

    #[test]
    fn test_numbered_list_segmentation() {
        let text = "1. The first consideration concerns overall project cost and timing.\n\
                    2. The second consideration concerns maintenance burden over years.\n\
                    3. The third consideration concerns the training required for staff.";
        let out = segment_text(text);
        assert_eq!(out.len(), 3);
        assert!(out[0].starts_with("1."));
    }

    #[test]
    fn test_factor_lock_beats_numbered_list() {
        let text = "First, the plan addresses cost directly through shared infrastructure.\n\
                    1. cost sharing arrangements between participating departments.\n\
                    Second, the plan addresses speed through parallel work streams here.";
        let out = segment_text(text);
        // Factor lock produces two blocks; the numbered line stays inside.
        assert_eq!(out.len(), 2);
        assert!(out[0].contains("1. cost sharing"));
    }

    #[test]
    fn test_paragraph_fallback() {
        let text = "The committee reviewed the proposal in depth during the session.\n\n\
                    Its recommendation was delivered the following week with full notes.";
        let out = segment_text(text);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_tiny_units_are_merged() {
        let text = "Short note.\n\n\
                    The full analysis follows in this much longer paragraph which stands alone.";
        let out = segment_text(text);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_conclusion_split() {
        let text = "First, early testing catches design flaws before they become expensive. \
                    Teams that test early report fewer emergency fixes in production systems. \
                    In conclusion, the evidence favors continuous testing across the lifecycle.";
        let out = segment_text(text);
        assert!(out.len() >= 2);
        assert!(out.last().unwrap().starts_with("In conclusion"));
    }

    #[test]
    fn test_unit_lengths_count_chars() {
        let lengths = compute_unit_lengths(&[
            "  abc def  ".to_string(),
            "a\nb".to_string(),
        ]);
        // Internal spaces count; the line break counts as one character.
        assert_eq!(lengths, vec![7, 3]);
    }

    #[test]
    fn test_parenthesis_containment() {
        let text = "First, the study design (a longitudinal cohort\n\n\
                    spanning ten years) controls for most confounders effectively. \
                    Second, replication across three sites strengthens the finding further.";
        let out = segment_text(text);
        for u in &out {
            assert_eq!(parenthesis_balance(u), 0);
        }
    }
}
