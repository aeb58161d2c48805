// Structural Reliability Index (SRI).
//
// Raw counts feed a four-part rubric (coherence, structure, evaluation,
// integration, each 0..5). The normalized rubric vector plus two penalty
// scores (transition jump, meta imbalance) combine into an instability
// measure; SRI is its complement. A rubric vector shorter than two entries
// degrades to the neutral 0.5 with a coaching note.

use super::{clamp01, entropy01, mean, num_or, peak01, round2, safe_array, safe_int, std_dev};
use crate::models::{RawFeatures, ScoreInterpretation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RslRubric4 {
    pub coherence: f64,
    pub structure: f64,
    pub evaluation: f64,
    pub integration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SriBand {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone)]
pub struct SriOutput {
    pub sri: f64,
    pub band: SriBand,
    pub notes: &'static str,
    pub variance_score: f64,
    pub transition_score: f64,
    pub meta_score: f64,
    pub instability: f64,
}

const INSUFFICIENT_NOTE: &str = "Structural reliability is not fully available due to insufficient structural data. Results are shown with coaching emphasis.";

pub fn compute_rubric4_from_raw(raw: &RawFeatures) -> RslRubric4 {
    let units = safe_int(raw.layer_0.units, 1.0).max(1.0);
    let claims = safe_int(raw.layer_0.claims, 0.0);
    let reasons = safe_int(raw.layer_0.reasons, 0.0);
    let evidence = safe_int(raw.layer_0.evidence, 0.0);

    let warrants = safe_int(raw.layer_1.warrants, 0.0);
    let counterpoints = safe_int(raw.layer_1.counterpoints, 0.0);
    let refutations = safe_int(raw.layer_1.refutations, 0.0);

    let transitions = safe_int(raw.layer_2.transitions, 0.0);
    let transition_ok = safe_int(raw.layer_2.transition_ok, 0.0);
    let revisions = safe_int(raw.layer_2.revisions, 0.0);
    let revision_depth_sum = num_or(raw.layer_2.revision_depth_sum, 0.0);

    let intent_markers = safe_int(raw.layer_3.intent_markers, 0.0);
    let drift_segments = safe_int(raw.layer_3.drift_segments, 0.0);
    let hedges = safe_int(raw.layer_3.hedges, 0.0);
    let loops = safe_int(raw.layer_3.loops, 0.0);
    let self_reg = safe_int(raw.layer_3.self_regulation_signals, 0.0);

    let adjacency_links = safe_int(raw.adjacency_links, 0.0);

    let denom_trans = (units - 1.0).max(1.0);
    let trans_rate = clamp01(transitions / denom_trans);
    let trans_quality = clamp01(transition_ok / transitions.max(1.0));

    let rev_rate = clamp01(revisions / units.max(1.0));
    // Depth average normalized by a fixed calibration constant of 1.5.
    let rev_depth_avg = revision_depth_sum / revisions.max(1.0);
    let rev_depth01 = clamp01(rev_depth_avg / 1.5);

    let drift_rate = clamp01((drift_segments + loops) / units.max(1.0));
    let drift_penalty = drift_rate;

    let atoms = (claims + reasons + warrants + evidence).max(1.0);
    let adjacency01 = clamp01(adjacency_links / atoms);

    let evidence01 = clamp01(evidence / claims.max(1.0));
    let warrant01 = clamp01(warrants / claims.max(1.0));
    let counter_ref01 = clamp01((counterpoints + refutations) / claims.max(1.0) / 0.6);

    let hedge_rate = hedges / claims.max(1.0);
    let hedge_penalty = clamp01(hedge_rate / 0.7);

    let balance01 = entropy01(&[claims, reasons, warrants, evidence]);

    let coherence01 = clamp01(0.45 * trans_quality + 0.25 * adjacency01 + 0.30 * (1.0 - drift_penalty));

    // Revision rate is best around 0.15 per unit.
    let rev_moderation01 = peak01(rev_rate, 0.15, 0.15);
    let intent01 = clamp01(intent_markers / 2.0);
    let structure01 = clamp01(0.40 * trans_rate + 0.30 * intent01 + 0.30 * rev_moderation01);

    let evaluation01 = clamp01(
        0.35 * evidence01 + 0.25 * warrant01 + 0.25 * counter_ref01 + 0.15 * (1.0 - hedge_penalty),
    );

    let self_reg01 = clamp01(self_reg / 2.0);
    let integration01 =
        clamp01(0.50 * balance01 + 0.20 * self_reg01 + 0.20 * trans_quality + 0.10 * rev_depth01);

    RslRubric4 {
        coherence: round2(5.0 * coherence01),
        structure: round2(5.0 * structure01),
        evaluation: round2(5.0 * evaluation01),
        integration: round2(5.0 * integration01),
    }
}

pub fn rubric_to_vector(r: &RslRubric4) -> Vec<f64> {
    vec![
        clamp01(r.coherence / 5.0),
        clamp01(r.structure / 5.0),
        clamp01(r.evaluation / 5.0),
        clamp01(r.integration / 5.0),
    ]
}

/// Transition jump penalty, 0..1 where higher is worse: poor transition
/// quality, per-unit transition volatility, and unit-length variance, with a
/// small-sample surcharge below 3 units.
pub fn compute_transition_jump_score(raw: &RawFeatures) -> f64 {
    let units = safe_int(raw.layer_0.units, 1.0).max(1.0);

    let transitions = safe_int(raw.layer_2.transitions, 0.0);
    let transition_ok = safe_int(raw.layer_2.transition_ok, 0.0);

    let trans_quality = clamp01(transition_ok / transitions.max(1.0));
    let bad_rate = clamp01(1.0 - trans_quality);

    let per_unit_trans = safe_array(raw.layer_0.per_unit.transitions.as_ref());
    let vol = if per_unit_trans.len() > 1 {
        clamp01(std_dev(&per_unit_trans) / (mean(&per_unit_trans) + 1.0).max(1.0))
    } else {
        0.5
    };

    let unit_lengths = safe_array(raw.layer_0.unit_lengths.as_ref());
    let len_var = if unit_lengths.len() > 1 {
        clamp01(std_dev(&unit_lengths) / mean(&unit_lengths).max(1.0))
    } else {
        0.5
    };

    let small_units_penalty = if units < 3.0 { 0.15 } else { 0.0 };

    clamp01(0.50 * bad_rate + 0.25 * vol + 0.25 * len_var + small_units_penalty)
}

/// Meta imbalance penalty, 0..1 where higher is worse: skewed atom balance,
/// drift/loop rate, and hedge excess.
pub fn compute_meta_imbalance_score(raw: &RawFeatures) -> f64 {
    let units = safe_int(raw.layer_0.units, 1.0).max(1.0);

    let claims = safe_int(raw.layer_0.claims, 0.0);
    let reasons = safe_int(raw.layer_0.reasons, 0.0);
    let evidence = safe_int(raw.layer_0.evidence, 0.0);
    let warrants = safe_int(raw.layer_1.warrants, 0.0);

    let drift_segments = safe_int(raw.layer_3.drift_segments, 0.0);
    let loops = safe_int(raw.layer_3.loops, 0.0);
    let hedges = safe_int(raw.layer_3.hedges, 0.0);

    let bal = entropy01(&[claims, reasons, warrants, evidence]);
    let imbalance_core = clamp01(1.0 - bal);

    let drift_rate = clamp01((drift_segments + loops) / units.max(1.0));
    let drift_penalty = clamp01(drift_rate / 0.25);

    let hedge_rate = hedges / claims.max(1.0);
    let hedge_penalty = clamp01(hedge_rate / 0.7);

    clamp01(0.60 * imbalance_core + 0.20 * drift_penalty + 0.20 * hedge_penalty)
}

pub fn compute_sri(
    rsl_vector: &[f64],
    transition_jump_score: Option<f64>,
    meta_imbalance_score: Option<f64>,
) -> SriOutput {
    if rsl_vector.len() < 2 {
        return SriOutput {
            sri: 0.5,
            band: SriBand::Moderate,
            notes: INSUFFICIENT_NOTE,
            variance_score: 0.5,
            transition_score: 0.5,
            meta_score: 0.5,
            instability: 0.5,
        };
    }

    let v01: Vec<f64> = rsl_vector.iter().map(|&x| clamp01(x)).collect();

    let variance_score = clamp01(std_dev(&v01) / 0.5);
    let transition_score = clamp01(num_or(transition_jump_score, 0.5));
    let meta_score = clamp01(num_or(meta_imbalance_score, 0.5));

    let instability = clamp01(0.4 * variance_score + 0.3 * transition_score + 0.3 * meta_score);
    let sri = clamp01(1.0 - instability);

    let (band, notes) = if sri >= 0.8 {
        (
            SriBand::High,
            "Structural coherence is consistently maintained across reasoning segments. The structural reference is considered stable.",
        )
    } else if sri >= 0.65 {
        (
            SriBand::Moderate,
            "Structural coherence is generally maintained, with localized variability across segments. Stability is acceptable with moderate fluctuation.",
        )
    } else {
        (
            SriBand::Low,
            "Structural variability is evident across reasoning segments. Stability is limited and interpretive caution is advised.",
        )
    };

    SriOutput {
        sri,
        band,
        notes,
        variance_score,
        transition_score,
        meta_score,
        instability,
    }
}

/// One-shot derivation from raw features to the public score shape.
pub fn derive_sri_from_raw(raw: &RawFeatures) -> ScoreInterpretation {
    let rubric = compute_rubric4_from_raw(raw);
    let vector = rubric_to_vector(&rubric);
    let out = compute_sri(
        &vector,
        Some(compute_transition_jump_score(raw)),
        Some(compute_meta_imbalance_score(raw)),
    );
    ScoreInterpretation {
        score: round2(out.sri),
        interpretation: out.notes.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawFeatures;
    use serde_json::json;

    fn raw_fixture() -> RawFeatures {
        RawFeatures::from_value(&json!({
            "layer_0": {
                "units": 5,
                "unit_lengths": [110, 130, 120, 125, 115],
                "per_unit": { "transitions": [1, 1, 1, 1, 0], "revisions": [0, 1, 0, 0, 0] },
                "claims": 3, "reasons": 4, "evidence": 3
            },
            "layer_1": { "warrants": 2, "counterpoints": 1, "refutations": 1 },
            "layer_2": { "transitions": 4, "transition_ok": 4, "revisions": 1, "revision_depth_sum": 0.5 },
            "layer_3": { "intent_markers": 2, "drift_segments": 0, "hedges": 1, "loops": 0, "self_regulation_signals": 1 },
            "adjacency_links": 6
        }))
    }

    #[test]
    fn test_degenerate_vector_neutral() {
        let out = compute_sri(&[0.8], None, None);
        assert_eq!(out.sri, 0.5);
        assert_eq!(out.band, SriBand::Moderate);
        assert_eq!(out.notes, INSUFFICIENT_NOTE);
        assert_eq!(out.variance_score, 0.5);
        assert_eq!(out.instability, 0.5);
    }

    #[test]
    fn test_uniform_vector_with_clean_penalties_is_high() {
        let out = compute_sri(&[0.8, 0.8, 0.8, 0.8], Some(0.0), Some(0.0));
        assert_eq!(out.sri, 1.0);
        assert_eq!(out.band, SriBand::High);
    }

    #[test]
    fn test_missing_penalties_default_to_half() {
        let out = compute_sri(&[0.8, 0.8, 0.8, 0.8], None, Some(f64::NAN));
        assert_eq!(out.transition_score, 0.5);
        assert_eq!(out.meta_score, 0.5);
        // instability = 0.3*0.5 + 0.3*0.5 = 0.3
        assert!((out.sri - 0.7).abs() < 1e-12);
        assert_eq!(out.band, SriBand::Moderate);
    }

    #[test]
    fn test_rubric_ranges() {
        let r = compute_rubric4_from_raw(&raw_fixture());
        for s in [r.coherence, r.structure, r.evaluation, r.integration] {
            assert!((0.0..=5.0).contains(&s));
        }
        // Clean transitions and no drift keep coherence strong.
        assert!(r.coherence >= 3.0);
    }

    #[test]
    fn test_transition_jump_small_sample_penalty() {
        let raw = RawFeatures::from_value(&json!({
            "layer_0": { "units": 2 },
            "layer_2": { "transitions": 1, "transition_ok": 1 }
        }));
        // bad_rate 0, vol 0.5, len_var 0.5, plus 0.15 for < 3 units.
        let s = compute_transition_jump_score(&raw);
        assert!((s - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_derive_from_raw_is_rounded_and_banded() {
        let out = derive_sri_from_raw(&raw_fixture());
        assert!((0.0..=1.0).contains(&out.score));
        assert_eq!(out.score, super::super::round2(out.score));
        assert!(!out.interpretation.is_empty());
    }
}
