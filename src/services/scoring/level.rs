// RSL level determination with deterministic evidence signals.
//
// The upstream extraction step supplies only quote candidates; state
// assignment, sanitization, and evidence selection happen here. Cut points
// convert the historical 0..6 band edges to the 0..5 scale by multiplying
// with 5/6. Emerging evidence never triggers gates: the L5 gate and the L6
// promotion react to Present only.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::clamp_0_to_5;
use crate::models::{LevelInfo, RawSignalsQuotes, SignalBin, SignalTri};

const CUT_L2: f64 = 2.5 * (5.0 / 6.0);
const CUT_L3: f64 = 3.3 * (5.0 / 6.0);
const CUT_L4: f64 = 4.1 * (5.0 / 6.0);
const CUT_L5: f64 = 4.8 * (5.0 / 6.0);
const CUT_L6: f64 = 5.4 * (5.0 / 6.0);

const MAX_EVIDENCE_QUOTES: usize = 2;
const MAX_QUOTE_LEN: usize = 220;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelCode {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
}

fn level_meta(level: LevelCode) -> LevelInfo {
    let (short_name, full_name, definition) = match level {
        LevelCode::L1 => (
            "L1 Fragmented",
            "L1 Fragmented Reasoning",
            "Disconnected statements without a traceable reasoning structure.",
        ),
        LevelCode::L2 => (
            "L2 Linear",
            "L2 Linear Reasoning",
            "Single-direction logic with limited perspective branching or qualification.",
        ),
        LevelCode::L3 => (
            "L3 Structured",
            "L3 Structured Reasoning",
            "Organized reasoning components with partial coordination across dimensions.",
        ),
        LevelCode::L4 => (
            "L4 Integrated",
            "L4 Integrated Reasoning",
            "Multiple reasoning dimensions coordinated into a stable, non-dominant structure.",
        ),
        LevelCode::L5 => (
            "L5 Reflective",
            "L5 Reflective Reasoning",
            "Explicit self-correction and value-based constraints applied within the reasoning flow.",
        ),
        LevelCode::L6 => (
            "L6 Generative",
            "L6 Generative Reasoning",
            "Reasoning that models, evaluates, and generates transferable cognitive frameworks.",
        ),
    };
    LevelInfo {
        short_name: short_name.to_string(),
        full_name: full_name.to_string(),
        definition: definition.to_string(),
    }
}

// ============ Evidence signals ============

#[derive(Debug, Clone)]
pub struct EvidenceSignalTri {
    pub state: SignalTri,
    pub evidence_quotes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EvidenceSignalBin {
    pub state: SignalBin,
    pub evidence_quotes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ComputedSignals {
    pub a7_value_aware: EvidenceSignalTri,
    pub a8_perspective_flexible: EvidenceSignalTri,
    pub self_repair: EvidenceSignalBin,
    pub framework_generation: EvidenceSignalBin,
}

fn normalize_candidates(arr: &[Value]) -> Vec<String> {
    arr.iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Evidence quotes must be short single-sentence excerpts: multi-line blocks
/// and overlong candidates are rejected, the rest are whitespace-collapsed,
/// case-insensitively deduplicated, and capped at two.
fn sanitize_evidence_quotes(candidates: &[String]) -> Vec<String> {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let mut seen = std::collections::HashSet::new();
    let mut cleaned = Vec::new();

    for c in candidates {
        if c.contains('\r') || c.contains('\n') {
            continue;
        }
        let s = ws.replace_all(c, " ").trim().to_string();
        if s.is_empty() || s.len() > MAX_QUOTE_LEN {
            continue;
        }
        let key = s.to_lowercase();
        if !seen.insert(key) {
            continue;
        }
        cleaned.push(s);
        if cleaned.len() >= MAX_EVIDENCE_QUOTES {
            break;
        }
    }
    cleaned
}

// Present requires stronger structural markers; Emerging is weaker support.
// Marker lists are bilingual and intentionally conservative.

fn a7_present_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(if|unless|only if|provided that|in order to|constraint|trade[- ]?off|cost|benefit|risk|priority|must|should|cannot|limit|threshold|조건|만약|오직|제약|트레이드오프|비용|편익|리스크|우선|반드시|해야|불가)\b").unwrap()
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+(\.\d+)?\b").unwrap())
}

fn a7_emerging_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(value|prefer|important|should|consider|worth|desirable|좋다|중요|선호|바람직|고려)\b")
            .unwrap()
    })
}

fn a8_present_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(on the other hand|however|whereas|in contrast|compared to|versus|while|yet|but|although|반면|하지만|비교|대조|한편)\b").unwrap()
    })
}

fn a8_emerging_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(perspective|viewpoint|stakeholder|different|another|alternatively|관점|시각|이해관계자|다른|또는|대안)\b").unwrap()
    })
}

fn is_a7_present(q: &str) -> bool {
    a7_present_re().is_match(q) || numeric_re().is_match(q)
}

fn is_a7_emerging(q: &str) -> bool {
    a7_emerging_re().is_match(q)
}

fn is_a8_present(q: &str) -> bool {
    a8_present_re().is_match(q)
}

fn is_a8_emerging(q: &str) -> bool {
    a8_emerging_re().is_match(q)
}

fn compute_tri_state(
    quotes: &[String],
    present: fn(&str) -> bool,
    emerging: fn(&str) -> bool,
) -> SignalTri {
    if quotes.is_empty() {
        return SignalTri::NotEvidenced;
    }
    if quotes.iter().any(|q| present(q)) {
        return SignalTri::Present;
    }
    if quotes.iter().any(|q| emerging(q)) {
        return SignalTri::Emerging;
    }
    // Evidence without markers still reads as weak support, never as a gate.
    SignalTri::Emerging
}

fn compute_bin_state(quotes: &[String]) -> SignalBin {
    if quotes.is_empty() {
        SignalBin::NotEvidenced
    } else {
        SignalBin::Present
    }
}

pub fn compute_signals_from_raw_quotes(raw: Option<&RawSignalsQuotes>) -> ComputedSignals {
    let empty = Vec::new();
    let a7 = sanitize_evidence_quotes(&normalize_candidates(
        raw.map(|r| r.a7_value_aware_quote_candidates.as_slice())
            .unwrap_or(&empty),
    ));
    let a8 = sanitize_evidence_quotes(&normalize_candidates(
        raw.map(|r| r.a8_perspective_flexible_quote_candidates.as_slice())
            .unwrap_or(&empty),
    ));
    let sr = sanitize_evidence_quotes(&normalize_candidates(
        raw.map(|r| r.self_repair_quote_candidates.as_slice())
            .unwrap_or(&empty),
    ));
    let fw = sanitize_evidence_quotes(&normalize_candidates(
        raw.map(|r| r.framework_generation_quote_candidates.as_slice())
            .unwrap_or(&empty),
    ));

    let a7_state = compute_tri_state(&a7, is_a7_present, is_a7_emerging);
    let a8_state = compute_tri_state(&a8, is_a8_present, is_a8_emerging);
    let sr_state = compute_bin_state(&sr);
    let fw_state = compute_bin_state(&fw);

    ComputedSignals {
        a7_value_aware: EvidenceSignalTri {
            evidence_quotes: if a7_state == SignalTri::NotEvidenced { vec![] } else { a7 },
            state: a7_state,
        },
        a8_perspective_flexible: EvidenceSignalTri {
            evidence_quotes: if a8_state == SignalTri::NotEvidenced { vec![] } else { a8 },
            state: a8_state,
        },
        self_repair: EvidenceSignalBin {
            evidence_quotes: if sr_state == SignalBin::NotEvidenced { vec![] } else { sr },
            state: sr_state,
        },
        framework_generation: EvidenceSignalBin {
            evidence_quotes: if fw_state == SignalBin::NotEvidenced { vec![] } else { fw },
            state: fw_state,
        },
    }
}

// ============ Level computation ============

pub struct LevelArgs<'a> {
    pub fri: f64,
    pub r6: f64,
    pub r7: f64,
    pub r8: f64,
    pub raw_signals_quotes: Option<&'a RawSignalsQuotes>,
}

#[derive(Debug, Clone)]
pub struct LevelOutcome {
    pub level: LevelInfo,
    pub signals: ComputedSignals,
    pub basis: Vec<String>,
}

/// Level flow: FRI cuts give L1..L5, the L5 gate demands self-repair
/// evidence, and L6 is reachable only from a passed L5 via the single
/// promotion path (framework + expansion + strict numeric gate).
pub fn compute_level_with_signals(args: &LevelArgs) -> LevelOutcome {
    let f = clamp_0_to_5(args.fri);
    let r6 = clamp_0_to_5(args.r6);
    let r7 = clamp_0_to_5(args.r7);
    let r8 = clamp_0_to_5(args.r8);

    let signals = compute_signals_from_raw_quotes(args.raw_signals_quotes);
    let mut basis: Vec<String> = Vec::new();

    let mut level = LevelCode::L1;
    if f >= CUT_L2 {
        level = LevelCode::L2;
    }
    if f >= CUT_L3 {
        level = LevelCode::L3;
    }
    if f >= CUT_L4 {
        level = LevelCode::L4;
    }
    if f >= CUT_L5 {
        level = LevelCode::L5;
    }
    basis.push("FRI band".to_string());

    if level == LevelCode::L5 {
        if signals.self_repair.state != SignalBin::Present {
            level = LevelCode::L4;
            basis.push("L5 gate failed (self_repair Present required)".to_string());
        } else {
            basis.push("L5 gate passed (self_repair Present)".to_string());
        }
    }

    if level == LevelCode::L5 {
        let expansion_ok = signals.a7_value_aware.state == SignalTri::Present
            || signals.a8_perspective_flexible.state == SignalTri::Present;
        let framework_ok = signals.framework_generation.state == SignalBin::Present;
        let strict_numeric_ok = f >= CUT_L6 && r6 >= 4.0 && (r7 >= 4.0 || r8 >= 4.0);

        if framework_ok && expansion_ok && strict_numeric_ok {
            level = LevelCode::L6;
            basis.push("L6 promotion (framework + expansion + strict numeric gate)".to_string());
        }
    }

    LevelOutcome {
        level: level_meta(level),
        signals,
        basis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quotes(
        a7: &[&str],
        a8: &[&str],
        sr: &[&str],
        fw: &[&str],
    ) -> RawSignalsQuotes {
        let to_vals = |xs: &[&str]| xs.iter().map(|s| json!(s)).collect::<Vec<Value>>();
        RawSignalsQuotes {
            a7_value_aware_quote_candidates: to_vals(a7),
            a8_perspective_flexible_quote_candidates: to_vals(a8),
            self_repair_quote_candidates: to_vals(sr),
            framework_generation_quote_candidates: to_vals(fw),
        }
    }

    #[test]
    fn test_base_level_cut_boundaries() {
        let cases = [
            (0.0, "L1 Fragmented"),
            (CUT_L2, "L2 Linear"),
            (CUT_L3, "L3 Structured"),
            (CUT_L4, "L4 Integrated"),
        ];
        for (fri, expected) in cases {
            let out = compute_level_with_signals(&LevelArgs {
                fri,
                r6: 0.0,
                r7: 0.0,
                r8: 0.0,
                raw_signals_quotes: None,
            });
            assert_eq!(out.level.short_name, expected, "fri={}", fri);
        }
    }

    #[test]
    fn test_l5_gate_requires_self_repair() {
        let args = LevelArgs {
            fri: 4.2,
            r6: 0.0,
            r7: 0.0,
            r8: 0.0,
            raw_signals_quotes: None,
        };
        let out = compute_level_with_signals(&args);
        assert_eq!(out.level.short_name, "L4 Integrated");
        assert!(out
            .basis
            .contains(&"L5 gate failed (self_repair Present required)".to_string()));

        let q = quotes(&[], &[], &["I noticed my earlier claim was too broad."], &[]);
        let out = compute_level_with_signals(&LevelArgs {
            raw_signals_quotes: Some(&q),
            ..args
        });
        assert_eq!(out.level.short_name, "L5 Reflective");
    }

    #[test]
    fn test_l6_promotion_single_path() {
        let q = quotes(
            &["We must weigh cost against benefit before committing."],
            &[],
            &["On reflection, I revised the premise."],
            &["This generalizes into a reusable decision framework."],
        );
        let out = compute_level_with_signals(&LevelArgs {
            fri: 4.6,
            r6: 4.0,
            r7: 4.0,
            r8: 0.0,
            raw_signals_quotes: Some(&q),
        });
        assert_eq!(out.level.short_name, "L6 Generative");
        assert!(out
            .basis
            .contains(&"L6 promotion (framework + expansion + strict numeric gate)".to_string()));

        // Same signals but FRI below the L6 cut: stays L5.
        let out = compute_level_with_signals(&LevelArgs {
            fri: 4.4,
            r6: 4.0,
            r7: 4.0,
            r8: 0.0,
            raw_signals_quotes: Some(&q),
        });
        assert_eq!(out.level.short_name, "L5 Reflective");
    }

    #[test]
    fn test_emerging_does_not_trigger_gates() {
        // A7 candidate with soft preference language only -> Emerging.
        let q = quotes(
            &["It seems important to consider what we prefer here"],
            &[],
            &["I corrected my earlier reasoning midway."],
            &["A new framework emerges from this analysis."],
        );
        let out = compute_level_with_signals(&LevelArgs {
            fri: 4.8,
            r6: 5.0,
            r7: 5.0,
            r8: 5.0,
            raw_signals_quotes: Some(&q),
        });
        assert_eq!(out.signals.a7_value_aware.state, SignalTri::Emerging);
        // No Present expansion signal, so no promotion.
        assert_eq!(out.level.short_name, "L5 Reflective");
    }

    #[test]
    fn test_sanitize_rejects_multiline_and_long_quotes() {
        let long = "x".repeat(221);
        let candidates = vec![
            "line one\nline two".to_string(),
            long,
            "  A   clean   quote.  ".to_string(),
            "a CLEAN quote.".to_string(),
            "Another quote.".to_string(),
            "Third quote never selected.".to_string(),
        ];
        let cleaned = sanitize_evidence_quotes(&candidates);
        assert_eq!(cleaned, vec!["A clean quote.", "Another quote."]);
    }

    #[test]
    fn test_tri_state_defaults() {
        assert_eq!(
            compute_tri_state(&[], is_a7_present, is_a7_emerging),
            SignalTri::NotEvidenced
        );
        let plain = vec!["plain words with no markers at all".to_string()];
        assert_eq!(
            compute_tri_state(&plain, is_a7_present, is_a7_emerging),
            SignalTri::Emerging
        );
        let numeric = vec!["the threshold is 3.5 here".to_string()];
        assert_eq!(
            compute_tri_state(&numeric, is_a7_present, is_a7_emerging),
            SignalTri::Present
        );
    }

    #[test]
    fn test_not_evidenced_clears_quotes() {
        let signals = compute_signals_from_raw_quotes(None);
        assert_eq!(signals.a7_value_aware.state, SignalTri::NotEvidenced);
        assert!(signals.a7_value_aware.evidence_quotes.is_empty());
        assert_eq!(signals.self_repair.state, SignalBin::NotEvidenced);
    }
}
