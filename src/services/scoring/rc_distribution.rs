// Reasoning control distribution.
//
// Two builders produce the Human/Hybrid/AI percentage split and the final
// determination: a logistic path when a calibrated model is supplied, and a
// deterministic heuristic over the structural control signals otherwise.

use super::clamp01;
use crate::models::{Cfv, ControlDistribution, LogisticModel, StructuralControlSignals};

const TH_RDX_LOW: f64 = 0.40;
const TH_HI_MID: f64 = 0.55;
const TH_AAS_HUMAN_LIKE: f64 = 0.60;
const TH_EDS_AI_LIKE: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Determination {
    Human,
    Hybrid,
    Ai,
}

impl Determination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Determination::Human => "Human",
            Determination::Hybrid => "Hybrid",
            Determination::Ai => "AI",
        }
    }

    fn sentence(&self) -> &'static str {
        match self {
            Determination::Human => {
                "The combined signal profile supports classification as human-controlled reasoning."
            }
            Determination::Hybrid => {
                "The combined signal profile indicates mixed control dynamics across structural decision boundaries, consistent with hybrid reasoning control."
            }
            Determination::Ai => {
                "The combined signal profile supports classification as AI-assisted or AI-dominant reasoning control across structural decision boundaries."
            }
        }
    }
}

fn pct(x01: f64) -> String {
    format!("{}%", (clamp01(x01) * 100.0).round() as i64)
}

fn normalize3(a: f64, b: f64, c: f64) -> (f64, f64, f64) {
    let a = clamp01(a);
    let b = clamp01(b);
    let c = clamp01(c);
    let s = a + b + c;
    if s <= 0.0 {
        return (1.0, 0.0, 0.0);
    }
    (a / s, b / s, c / s)
}

fn sigmoid(z: f64) -> f64 {
    let zz = if z.is_finite() { z } else { 0.0 };
    let zc = zz.clamp(-20.0, 20.0);
    1.0 / (1.0 + (-zc).exp())
}

/// Logistic P(human) over the clamped composite feature vector.
pub fn p_human_from_cfv(cfv: &Cfv, model: &LogisticModel) -> f64 {
    let z_clip = model.z_clip.filter(|z| z.is_finite()).unwrap_or(20.0);

    let mut z = if model.beta0.is_finite() { model.beta0 } else { 0.0 };
    for k in Cfv::KEYS {
        let b = model
            .betas
            .get(k)
            .copied()
            .filter(|b| b.is_finite())
            .unwrap_or(0.0);
        z += b * clamp01(cfv.get(k).unwrap_or(0.0));
    }

    clamp01(sigmoid(z.clamp(-z_clip, z_clip)))
}

/// Band from P(human), with a validity gate on the Hybrid band. A Hybrid call
/// additionally requires mixed probabilities and the hybrid signature over
/// RDX, rhythm, AAS and EDS; otherwise it collapses to the dominant side.
pub fn determine_label_from_probs(cfv: &Cfv, p_human01: f64) -> Determination {
    let p_h = clamp01(p_human01);
    let p_a = clamp01(1.0 - p_h);

    let band = if p_h >= 0.75 {
        Determination::Human
    } else if p_h >= 0.45 {
        Determination::Hybrid
    } else {
        Determination::Ai
    };

    if band == Determination::Hybrid {
        let hybrid_cond = p_h >= 0.35
            && p_a >= 0.35
            && clamp01(cfv.rdx) < TH_RDX_LOW
            && clamp01(cfv.hi) >= TH_HI_MID
            && clamp01(cfv.aas) >= TH_AAS_HUMAN_LIKE
            && clamp01(cfv.eds) >= TH_EDS_AI_LIKE;
        if !hybrid_cond {
            return if p_h >= p_a {
                Determination::Human
            } else {
                Determination::Ai
            };
        }
    }

    band
}

fn allocate(final_det: Determination, p_h: f64, p_a: f64) -> (f64, f64, f64) {
    let (human, hybrid, ai) = if final_det == Determination::Hybrid {
        let hybrid = clamp01(2.0 * p_h.min(p_a));
        (clamp01(p_h - hybrid / 2.0), hybrid, clamp01(p_a - hybrid / 2.0))
    } else {
        let hybrid = clamp01(p_h.min(p_a));
        (clamp01(p_h - hybrid), hybrid, clamp01(p_a - hybrid))
    };
    normalize3(human, hybrid, ai)
}

pub fn build_distribution(cfv: &Cfv, model: &LogisticModel) -> ControlDistribution {
    let p_h = p_human_from_cfv(cfv, model);
    let p_a = clamp01(1.0 - p_h);

    let final_det = determine_label_from_probs(cfv, p_h);
    let (human, hybrid, ai) = allocate(final_det, p_h, p_a);

    ControlDistribution {
        human: pct(human),
        hybrid: pct(hybrid),
        ai: pct(ai),
        final_determination: final_det.as_str().to_string(),
        determination_sentence: final_det.sentence().to_string(),
    }
}

/// Deterministic fallback when no logistic model is supplied. Produces
/// non-zero stable outputs from the computed structural signals.
pub fn build_distribution_heuristic(
    cfv: &Cfv,
    ind: &StructuralControlSignals,
) -> ControlDistribution {
    let hi = clamp01(ind.human_rhythm_index);
    let rd = clamp01(ind.revision_depth);
    let tf = clamp01(ind.transition_flow);
    let sv = clamp01(ind.structural_variance);
    let ctf = clamp01(cfv.ctf);

    let p_h = clamp01(0.20 + 0.35 * hi + 0.20 * rd + 0.20 * tf - 0.15 * sv + 0.10 * ctf);
    let p_a = clamp01(1.0 - p_h);

    let final_det = if p_h >= 0.67 {
        Determination::Human
    } else if p_h <= 0.33 {
        Determination::Ai
    } else {
        Determination::Hybrid
    };

    let (human, hybrid, ai) = allocate(final_det, p_h, p_a);

    ControlDistribution {
        human: pct(human),
        hybrid: pct(hybrid),
        ai: pct(ai),
        final_determination: final_det.as_str().to_string(),
        // The heuristic path keeps a fixed sentence.
        determination_sentence: Determination::Human.sentence().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfv(aas: f64, ctf: f64, rmd: f64, rdx: f64, eds: f64, hi: f64, tps: f64, ifd: f64) -> Cfv {
        Cfv {
            aas,
            ctf,
            rmd,
            rdx,
            eds,
            hi,
            tps_hist: tps,
            ifd,
        }
    }

    fn model(beta0: f64, pairs: &[(&str, f64)]) -> LogisticModel {
        LogisticModel {
            beta0,
            betas: pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect(),
            z_clip: None,
        }
    }

    #[test]
    fn test_logistic_probability() {
        let c = cfv(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let m = model(0.0, &[("aas", 2.0)]);
        // z = 2 -> sigmoid(2)
        let p = p_human_from_cfv(&c, &m);
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);

        // Non-finite coefficients read as zero.
        let m = model(f64::NAN, &[("aas", f64::INFINITY)]);
        assert_eq!(p_human_from_cfv(&c, &m), 0.5);
    }

    #[test]
    fn test_z_clipping() {
        let c = cfv(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut m = model(0.0, &[("aas", 100.0)]);
        m.z_clip = Some(1.0);
        let p = p_human_from_cfv(&c, &m);
        assert!((p - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_hybrid_band_requires_signature() {
        // pH 0.6 lands in the Hybrid band but the signature fails on RDX.
        let c = cfv(0.7, 0.5, 0.5, 0.8, 0.7, 0.6, 0.5, 0.5);
        assert_eq!(determine_label_from_probs(&c, 0.6), Determination::Human);

        // Full signature holds.
        let c = cfv(0.7, 0.5, 0.5, 0.2, 0.7, 0.6, 0.5, 0.5);
        assert_eq!(determine_label_from_probs(&c, 0.6), Determination::Hybrid);

        // Collapse goes to the dominant side.
        assert_eq!(
            determine_label_from_probs(&cfv(0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0), 0.46),
            Determination::Ai
        );
    }

    #[test]
    fn test_distribution_percentages_sum_to_whole() {
        let c = cfv(0.7, 0.5, 0.5, 0.2, 0.7, 0.6, 0.5, 0.5);
        let m = model(0.3, &[("aas", 0.5), ("rdx", -0.8)]);
        let out = build_distribution(&c, &m);
        let parse = |s: &str| s.trim_end_matches('%').parse::<i64>().unwrap();
        let total = parse(&out.human) + parse(&out.hybrid) + parse(&out.ai);
        // Rounding keeps the split within one point of 100.
        assert!((99..=101).contains(&total));
        assert!(!out.determination_sentence.is_empty());
    }

    #[test]
    fn test_heuristic_path() {
        let ind = StructuralControlSignals {
            structural_variance: 0.1,
            human_rhythm_index: 0.9,
            transition_flow: 0.8,
            revision_depth: 0.7,
        };
        let c = cfv(0.5, 0.8, 0.5, 0.5, 0.5, 0.9, 0.5, 0.5);
        let out = build_distribution_heuristic(&c, &ind);
        // pH = 0.20 + 0.315 + 0.14 + 0.16 - 0.015 + 0.08 = 0.88 -> Human.
        assert_eq!(out.final_determination, "Human");
        assert_eq!(
            out.determination_sentence,
            "The combined signal profile supports classification as human-controlled reasoning."
        );

        let flat = StructuralControlSignals::default();
        let out = build_distribution_heuristic(&cfv(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0), &flat);
        // pH = 0.20 -> AI, but the heuristic sentence stays fixed.
        assert_eq!(out.final_determination, "AI");
        assert!(out.determination_sentence.contains("human-controlled"));
    }

    #[test]
    fn test_normalize3_degenerate() {
        assert_eq!(normalize3(0.0, 0.0, 0.0), (1.0, 0.0, 0.0));
        let (a, b, c) = normalize3(0.2, 0.2, 0.6);
        assert!((a + b + c - 1.0).abs() < 1e-12);
    }
}
