// Foundational Reasoning Index (FRI).
//
// Inputs are rubric dimension scores on the 0..5 scale:
//   R3 = Evidence Quality
//   R4 = Reasoning & Counterfactuals
//   R5 = Coherence & Clarity
//   R6 = Metacognition & Self-repair
//
// CRS = 0.30*R3 + 0.40*R4 + 0.30*R5
// RM  = 0.85 + (R6/5) * 0.30          (range 0.85..1.15)
// FRI = clamp0..5(CRS * RM), rounded to 2 decimals.

use super::{clamp_0_to_5, round2};
use crate::models::{RslDimension, ScoreInterpretation};

/// Dimension score lookup by code; missing or malformed scores read as 0.
pub fn get_r_score(dimensions: &[RslDimension], code: &str) -> f64 {
    let score = dimensions
        .iter()
        .find(|d| d.code == code)
        .map(|d| d.score_1to5)
        .unwrap_or(0.0);
    clamp_0_to_5(score)
}

pub fn compute_fri(r3: f64, r4: f64, r5: f64, r6: f64) -> ScoreInterpretation {
    let r3 = clamp_0_to_5(r3);
    let r4 = clamp_0_to_5(r4);
    let r5 = clamp_0_to_5(r5);
    let r6 = clamp_0_to_5(r6);

    let crs = 0.3 * r3 + 0.4 * r4 + 0.3 * r5;
    let rm = 0.85 + (r6 / 5.0) * 0.3;

    let fri = round2(clamp_0_to_5(crs * rm));
    ScoreInterpretation {
        score: fri,
        interpretation: fri_note(fri).to_string(),
    }
}

pub fn compute_fri_from_dimensions(dimensions: &[RslDimension]) -> ScoreInterpretation {
    compute_fri(
        get_r_score(dimensions, "R3"),
        get_r_score(dimensions, "R4"),
        get_r_score(dimensions, "R5"),
        get_r_score(dimensions, "R6"),
    )
}

/// Interpretation band text on the 0..5 output scale.
pub fn fri_note(fri: f64) -> &'static str {
    let x = clamp_0_to_5(fri);
    if x <= 0.8 {
        return "Your reasoning structure is still taking shape. Ideas often appear separately, making connections harder to follow.";
    }
    if x <= 1.6 {
        return "Early signs of structure are beginning to appear. Some steps are present, but connections and checks are not yet consistent.";
    }
    if x <= 2.4 {
        return "A basic reasoning structure is forming. Key steps align, though stability can drop as complexity increases.";
    }
    if x <= 3.2 {
        return "Your reasoning structure works well overall. Most ideas connect, with occasional gaps in validation or monitoring.";
    }
    if x <= 4.0 {
        return "Your reasoning structure is stable in most situations. Connections and evaluations usually remain consistent.";
    }
    "You can reason structurally even in complex situations. Your thinking stays stable and self-regulated as ideas scale."
}
