// Reasoning control summary.
//
// Computes an (Agency, Depth, Reflection) control vector from the layered
// counts, assigns the nearest of nine control-pattern centroids, and maps
// the centroid distance to a reliability band.

use super::{clamp01, safe_div, sat};
use crate::models::RawFeatures;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlVector {
    pub agency: f64,
    pub depth: f64,
    pub reflection: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPattern {
    DeepReflectiveHuman,
    ModerateReflectiveHuman,
    ModerateProceduralHuman,
    ShallowProceduralHuman,
    ModerateReflectiveHybrid,
    ShallowProceduralHybrid,
    ShallowProceduralAi,
    ModerateProceduralAi,
    DeepProceduralAi,
}

const PATTERN_ORDER: [ControlPattern; 9] = [
    ControlPattern::DeepReflectiveHuman,
    ControlPattern::ModerateReflectiveHuman,
    ControlPattern::ModerateProceduralHuman,
    ControlPattern::ShallowProceduralHuman,
    ControlPattern::ModerateReflectiveHybrid,
    ControlPattern::ShallowProceduralHybrid,
    ControlPattern::ShallowProceduralAi,
    ControlPattern::ModerateProceduralAi,
    ControlPattern::DeepProceduralAi,
];

impl ControlPattern {
    fn centroid(&self) -> ControlVector {
        let (a, d, r) = match self {
            ControlPattern::DeepReflectiveHuman => (0.85, 0.8, 0.8),
            ControlPattern::ModerateReflectiveHuman => (0.8, 0.55, 0.6),
            ControlPattern::ModerateProceduralHuman => (0.75, 0.55, 0.25),
            ControlPattern::ShallowProceduralHuman => (0.7, 0.3, 0.2),
            ControlPattern::ModerateReflectiveHybrid => (0.55, 0.55, 0.55),
            ControlPattern::ShallowProceduralHybrid => (0.5, 0.3, 0.2),
            ControlPattern::ShallowProceduralAi => (0.2, 0.3, 0.15),
            ControlPattern::ModerateProceduralAi => (0.15, 0.55, 0.15),
            ControlPattern::DeepProceduralAi => (0.1, 0.8, 0.1),
        };
        ControlVector { agency: a, depth: d, reflection: r }
    }

    fn slug(&self) -> &'static str {
        match self {
            ControlPattern::DeepReflectiveHuman => "deep_reflective_human",
            ControlPattern::ModerateReflectiveHuman => "moderate_reflective_human",
            ControlPattern::ModerateProceduralHuman => "moderate_procedural_human",
            ControlPattern::ShallowProceduralHuman => "shallow_procedural_human",
            ControlPattern::ModerateReflectiveHybrid => "moderate_reflective_hybrid",
            ControlPattern::ShallowProceduralHybrid => "shallow_procedural_hybrid",
            ControlPattern::ShallowProceduralAi => "shallow_procedural_ai",
            ControlPattern::ModerateProceduralAi => "moderate_procedural_ai",
            ControlPattern::DeepProceduralAi => "deep_procedural_ai",
        }
    }

    pub fn label(&self) -> String {
        self.slug()
            .split('_')
            .map(|w| {
                let mut cs = w.chars();
                match cs.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + cs.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    // (pattern_description, pattern_interpretation, band_rationale)
    fn meta(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ControlPattern::DeepReflectiveHuman => (
                "Human-led reasoning with sustained reflective control and stable structural revision. The current position is centered within the human reasoning cluster.",
                "A high human proportion indicates stable human-led control at structural decision boundaries across the task.",
                "Reasoning decisions originate from explicit human-driven revision and counter-evaluative judgment rather than automated continuation flow.",
            ),
            ControlPattern::ModerateReflectiveHuman => (
                "Human-led reasoning with localized reflective adjustment and generally stable structure. The current position remains within the human cluster with moderate dispersion.",
                "A high human proportion indicates largely human-led control, with reflective adjustment appearing in localized segments.",
                "Reasoning decisions include limited human revision but do not extend to full structural reconfiguration.",
            ),
            ControlPattern::ModerateProceduralHuman => (
                "Human-authored reasoning following a stable procedural structure. The current position lies within the human cluster but closer to the procedural boundary.",
                "A high human proportion indicates human-led control under a procedural sequence, with limited reflective intervention.",
                "Reasoning decisions follow a predefined structural sequence with minimal reflective intervention.",
            ),
            ControlPattern::ShallowProceduralHuman => (
                "Human-generated reasoning with shallow procedural progression and limited structural depth. The current position is weakly anchored within the human reasoning cluster.",
                "A high human proportion indicates human-led control, though structural decisions tend to follow shallow continuation patterns.",
                "Reasoning decisions rely on surface-level continuation rather than deliberate structural control.",
            ),
            ControlPattern::ModerateReflectiveHybrid => (
                "Mixed-agency reasoning with partial human reflection and assisted structural development. The current position spans the boundary between human and hybrid clusters.",
                "A mixed distribution indicates shared control, where human intent is present but transitions partially reflect assisted continuation.",
                "Reasoning decisions reflect human intent but are partially influenced by assisted continuation patterns.",
            ),
            ControlPattern::ShallowProceduralHybrid => (
                "Hybrid reasoning with procedural structure and limited reflective control. The current position trends toward the hybrid procedural region.",
                "A mixed distribution indicates assisted procedural flow, with limited human-led structural revision at decision boundaries.",
                "Reasoning decisions follow assisted procedural flow with minimal human structural revision.",
            ),
            ControlPattern::ShallowProceduralAi => (
                "AI-dominant reasoning with shallow procedural expansion. The current position is located near the automated cluster perimeter.",
                "A low human proportion indicates control signals are dominated by automated continuation rather than human-led structural decisions.",
                "Reasoning decisions primarily arise from automated continuation without observable human control signals.",
            ),
            ControlPattern::ModerateProceduralAi => (
                "AI-generated reasoning with stable but non-reflective procedural structure. The current position is centered within the automated reasoning cluster.",
                "A low human proportion indicates stable automated continuation patterns with minimal evidence of human-originated structural control.",
                "Reasoning decisions follow internally consistent continuation patterns without human-originated revision.",
            ),
            ControlPattern::DeepProceduralAi => (
                "AI-generated reasoning exhibiting high structural complexity without reflective control. The current position is deeply embedded within the automated procedural cluster.",
                "A low human proportion indicates layered procedural expansion without consistent reflective control signals originating from the individual.",
                "Reasoning decisions reflect layered procedural expansion rather than intentional evaluative judgment.",
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RcSummary {
    pub summary: String,
    pub control_pattern: String,
    pub reliability_band: String,
    pub band_rationale: String,
    pub pattern_interpretation: String,
}

fn n0(x: Option<f64>) -> f64 {
    x.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Agency, Depth, Reflection from the minimal layered counts. Each axis is a
/// weighted sum of spike-safe saturation terms minus drift penalties.
pub fn compute_adr(rf: &RawFeatures) -> ControlVector {
    let u = n0(rf.layer_0.units).floor().max(1.0);
    let claims = n0(rf.layer_0.claims).max(0.0);
    let reasons = n0(rf.layer_0.reasons).max(0.0);
    let evidence = n0(rf.layer_0.evidence).max(0.0);

    let counterpoints = n0(rf.layer_1.counterpoints).max(0.0);
    let refutations = n0(rf.layer_1.refutations).max(0.0);

    let transitions = n0(rf.layer_2.transitions).max(0.0);
    let transition_ok = n0(rf.layer_2.transition_ok).max(0.0);
    let revisions = n0(rf.layer_2.revisions).max(0.0);
    let revision_depth_sum = n0(rf.layer_2.revision_depth_sum).max(0.0);

    let intent_markers = n0(rf.layer_3.intent_markers).max(0.0);
    let drift_segments = n0(rf.layer_3.drift_segments).max(0.0);
    let self_reg = n0(rf.layer_3.self_regulation_signals).max(0.0);

    let transition_density = safe_div(transitions, u);
    let transition_quality = clamp01(safe_div(transition_ok, transitions));

    let revision_rate = safe_div(revisions, u);
    let revision_depth_avg = safe_div(revision_depth_sum, revisions.max(1.0));

    let counter_rate = safe_div(counterpoints + refutations, claims.max(1.0));
    let intent_rate = safe_div(intent_markers, u);
    let drift_rate = safe_div(drift_segments, u);

    let reason_rate = safe_div(reasons, claims.max(1.0));
    let evidence_rate = safe_div(evidence, claims.max(1.0));

    let a_core = 0.30 * sat(intent_rate, 0.25)
        + 0.28 * sat(revision_rate, 0.30)
        + 0.24 * sat(counter_rate, 0.35)
        + 0.12 * transition_quality
        + 0.06 * sat(safe_div(self_reg, u), 0.20);
    let a_penalty = 0.24 * sat(drift_rate, 0.25)
        + 0.16 * sat(transition_density * (1.0 - transition_quality), 0.25);
    let agency = clamp01(a_core - a_penalty);

    let depth = clamp01(
        0.45 * sat(reason_rate, 0.9)
            + 0.35 * sat(evidence_rate, 0.7)
            + 0.20 * sat(transition_density, 0.7),
    );

    let r_core = 0.32 * sat(revision_rate, 0.28)
        + 0.24 * sat(revision_depth_avg, 0.9)
        + 0.22 * sat(counter_rate, 0.30)
        + 0.16 * sat(safe_div(self_reg, u), 0.25)
        + 0.06 * transition_quality;
    let r_penalty = 0.12 * sat(drift_rate, 0.30);
    let reflection = clamp01(r_core - r_penalty);

    ControlVector { agency, depth, reflection }
}

fn euclidean(a: &ControlVector, b: &ControlVector) -> f64 {
    let da = a.agency - b.agency;
    let dd = a.depth - b.depth;
    let dr = a.reflection - b.reflection;
    (da * da + dd * dd + dr * dr).sqrt()
}

fn band_from_distance(d: f64) -> &'static str {
    if d < 0.12 {
        "HIGH"
    } else if d < 0.22 {
        "MEDIUM"
    } else {
        "LOW"
    }
}

pub fn infer_rc_from_adr(v_in: &ControlVector) -> RcSummary {
    let norm = |x: f64| clamp01(if x.is_finite() { x } else { 0.5 });
    let v = ControlVector {
        agency: norm(v_in.agency),
        depth: norm(v_in.depth),
        reflection: norm(v_in.reflection),
    };

    let mut best = ControlPattern::ModerateReflectiveHuman;
    let mut best_dist = f64::INFINITY;
    for p in PATTERN_ORDER {
        let d = euclidean(&v, &p.centroid());
        if d < best_dist {
            best_dist = d;
            best = p;
        }
    }

    let (description, interpretation, rationale) = best.meta();
    RcSummary {
        summary: description.to_string(),
        control_pattern: best.label(),
        reliability_band: band_from_distance(best_dist).to_string(),
        band_rationale: rationale.to_string(),
        pattern_interpretation: interpretation.to_string(),
    }
}

pub fn compute_rc_summary(rf: &RawFeatures) -> RcSummary {
    infer_rc_from_adr(&compute_adr(rf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(
        units: f64,
        claims: f64,
        reasons: f64,
        evidence: f64,
        transitions: f64,
        transition_ok: f64,
        revisions: f64,
        depth_sum: f64,
        intent: f64,
        drift: f64,
        self_reg: f64,
        counterpoints: f64,
    ) -> RawFeatures {
        let mut rf = RawFeatures::default();
        rf.layer_0.units = Some(units);
        rf.layer_0.claims = Some(claims);
        rf.layer_0.reasons = Some(reasons);
        rf.layer_0.evidence = Some(evidence);
        rf.layer_1.counterpoints = Some(counterpoints);
        rf.layer_1.refutations = Some(0.0);
        rf.layer_2.transitions = Some(transitions);
        rf.layer_2.transition_ok = Some(transition_ok);
        rf.layer_2.revisions = Some(revisions);
        rf.layer_2.revision_depth_sum = Some(depth_sum);
        rf.layer_3.intent_markers = Some(intent);
        rf.layer_3.drift_segments = Some(drift);
        rf.layer_3.self_regulation_signals = Some(self_reg);
        rf
    }

    #[test]
    fn test_adr_axes_are_unit_interval() {
        let rf = features(8.0, 5.0, 6.0, 4.0, 6.0, 5.0, 3.0, 2.0, 3.0, 0.0, 2.0, 2.0);
        let v = compute_adr(&rf);
        for x in [v.agency, v.depth, v.reflection] {
            assert!((0.0..=1.0).contains(&x));
        }
        // Rich reflective activity scores well above a flat document.
        let flat = features(8.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let vf = compute_adr(&flat);
        assert!(v.agency > vf.agency);
        assert!(v.reflection > vf.reflection);
    }

    #[test]
    fn test_drift_penalizes_agency() {
        let clean = features(8.0, 5.0, 4.0, 3.0, 4.0, 4.0, 2.0, 1.5, 2.0, 0.0, 1.0, 1.0);
        let drifty = features(8.0, 5.0, 4.0, 3.0, 4.0, 4.0, 2.0, 1.5, 2.0, 4.0, 1.0, 1.0);
        assert!(compute_adr(&clean).agency > compute_adr(&drifty).agency);
    }

    #[test]
    fn test_nearest_centroid_on_exact_match() {
        let out = infer_rc_from_adr(&ControlVector {
            agency: 0.85,
            depth: 0.8,
            reflection: 0.8,
        });
        assert_eq!(out.control_pattern, "Deep Reflective Human");
        assert_eq!(out.reliability_band, "HIGH");
        assert!(out.summary.starts_with("Human-led reasoning with sustained"));
    }

    #[test]
    fn test_non_finite_axes_default_to_midpoint() {
        let out = infer_rc_from_adr(&ControlVector {
            agency: f64::NAN,
            depth: f64::NAN,
            reflection: f64::NAN,
        });
        // (0.5, 0.5, 0.5) lands nearest the hybrid centroid at distance
        // sqrt(3) * 0.05, well inside the HIGH band.
        assert_eq!(out.control_pattern, "Moderate Reflective Hybrid");
        assert_eq!(out.reliability_band, "HIGH");
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(band_from_distance(0.0), "HIGH");
        assert_eq!(band_from_distance(0.119), "HIGH");
        assert_eq!(band_from_distance(0.12), "MEDIUM");
        assert_eq!(band_from_distance(0.22), "LOW");
    }

    #[test]
    fn test_ai_region_maps_to_ai_pattern() {
        let out = infer_rc_from_adr(&ControlVector {
            agency: 0.12,
            depth: 0.78,
            reflection: 0.12,
        });
        assert_eq!(out.control_pattern, "Deep Procedural Ai");
        assert!(out.pattern_interpretation.starts_with("A low human proportion"));
    }
}
