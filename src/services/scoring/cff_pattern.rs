// Observed reasoning-pattern profiles (Cognitive Pattern Profile Layer).
//
// Eight fixed profiles are scored from the CFF axes; a score is null when
// its required inputs are unavailable (notably HE/MD without a similarity
// measurement, and IE/SI without derived meta-axes). Selection keeps every
// profile at or above the threshold, capped at three and padded back to two
// from the computable pool.

use super::clamp01;
use crate::models::{PatternDefinition, PatternInfo};

pub const OBSERVED_THRESHOLD: f64 = 0.62;
pub const OBSERVED_MIN: usize = 2;
pub const OBSERVED_MAX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCode {
    Re,
    Ie,
    Ew,
    Ar,
    Si,
    Rr,
    He,
    Md,
}

const PROFILE_ORDER: [ProfileCode; 8] = [
    ProfileCode::Re,
    ProfileCode::Ie,
    ProfileCode::Ew,
    ProfileCode::Ar,
    ProfileCode::Si,
    ProfileCode::Rr,
    ProfileCode::He,
    ProfileCode::Md,
];

pub fn profile_meta(code: ProfileCode) -> (&'static str, &'static str) {
    match code {
        ProfileCode::Re => (
            "Reflective Explorer",
            "Reflective Explorer shows active self-revision and exploratory restructuring during reasoning. Thought progresses through reflection, reassessment, and adaptive refinement.",
        ),
        ProfileCode::Ie => (
            "Intuitive Explorer",
            "Intuitive Explorer advances reasoning through associative leaps and conceptual exploration. Structure emerges gradually rather than being predefined.",
        ),
        ProfileCode::Ew => (
            "Evidence Weaver",
            "Evidence Weaver emphasizes linking claims with supporting material. Reasoning strength lies in evidence connectivity rather than abstract inference.",
        ),
        ProfileCode::Ar => (
            "Analytical Reasoner",
            "Analytical Reasoner breaks a problem into explicit components and evaluates them through stepwise logic. Reasoning emphasizes clear structure, rule-based validation, and consistency across claims and supporting points.",
        ),
        ProfileCode::Si => (
            "Strategic Integrator",
            "Strategic Integrator aligns multiple reasoning strands into a unified direction. Decision-making reflects coordination and long-term framing.",
        ),
        ProfileCode::Rr => (
            "Reflective Regulator",
            "Reflective Regulator actively monitors and controls reasoning boundaries. This type prioritizes balance, restraint, and intentional stopping points.",
        ),
        ProfileCode::He => (
            "Human Expressionist",
            "Human Expressionist expresses reasoning through narrative and contextual meaning. Communication clarity and human resonance are central.",
        ),
        ProfileCode::Md => (
            "Machine-Dominant",
            "Machine-Dominant pattern reflects heavy dependence on automated or system-driven reasoning flow. Human agency signals are limited.",
        ),
    }
}

/// Axis inputs for profile scoring. Every field is optional: absent axes
/// disable the profiles that require them instead of defaulting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAxes {
    pub aas: Option<f64>,
    pub ctf: Option<f64>,
    pub rmd: Option<f64>,
    pub rdx: Option<f64>,
    pub eds: Option<f64>,
    pub ifd: Option<f64>,
    pub kpf: Option<f64>,
    pub tps: Option<f64>,
    pub analyticity: Option<f64>,
    pub flow: Option<f64>,
    pub metacog_raw: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ProfileScore {
    pub code: ProfileCode,
    pub label: &'static str,
    pub description: &'static str,
    pub score: Option<f64>,
    pub pass_rule: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObservedPatterns {
    pub layer: &'static str,
    pub threshold: f64,
    pub min_count: usize,
    pub max_count: usize,
    pub all_profiles: Vec<ProfileScore>,
    pub profiles: Vec<ProfileScore>,
}

fn weighted_avg(terms: &[(Option<f64>, f64)]) -> Option<f64> {
    let mut w_sum = 0.0;
    let mut s = 0.0;
    for (v, w) in terms {
        if let Some(v) = v {
            w_sum += w;
            s += v * w;
        }
    }
    if w_sum <= 0.0 {
        None
    } else {
        Some(s / w_sum)
    }
}

fn score_re(core: &PatternAxes) -> Option<f64> {
    weighted_avg(&[(core.rdx, 0.45), (core.ctf, 0.30), (core.rmd, 0.25)])
}

fn score_ie(core: &PatternAxes) -> Option<f64> {
    let flow = core.flow?;
    let analyticity = core.analyticity?;
    Some(clamp01(0.60 * flow + 0.40 * (1.0 - analyticity)))
}

fn score_ew(core: &PatternAxes) -> Option<f64> {
    weighted_avg(&[(core.eds, 0.55), (core.aas, 0.45)])
}

fn score_ar(core: &PatternAxes) -> Option<f64> {
    let base = weighted_avg(&[(core.aas, 0.65), (core.eds, 0.35)]);
    if base.is_none() && core.ctf.is_none() {
        return None;
    }
    let out = base.unwrap_or(0.0) - core.ctf.map(|c| 0.20 * c).unwrap_or(0.0);
    Some(clamp01(out))
}

fn score_si(core: &PatternAxes) -> Option<f64> {
    let a = core.analyticity?;
    let f = core.flow?;
    let m = core.metacog_raw?;
    Some(clamp01(a.min(f).min(m)))
}

fn score_rr(core: &PatternAxes) -> Option<f64> {
    weighted_avg(&[(core.rdx, 0.60), (core.ifd.map(|x| 1.0 - x), 0.40)])
}

fn authenticity(core: &PatternAxes) -> Option<f64> {
    match (core.kpf, core.tps) {
        (None, None) => None,
        (Some(kpf), Some(tps)) => Some((1.0 - kpf + tps) / 2.0),
        (Some(kpf), None) => Some(1.0 - kpf),
        (None, Some(tps)) => Some(tps),
    }
}

fn machine_score(core: &PatternAxes) -> Option<f64> {
    match (core.kpf, core.tps) {
        (None, None) => None,
        (Some(kpf), Some(tps)) => Some((kpf + (1.0 - tps)) / 2.0),
        (Some(kpf), None) => Some(kpf),
        (None, Some(tps)) => Some(1.0 - tps),
    }
}

fn score_he(core: &PatternAxes) -> Option<f64> {
    let a = authenticity(core)?;
    Some(clamp01(
        0.55 * a + 0.25 * core.ctf.unwrap_or(0.0) + 0.20 * core.rmd.unwrap_or(0.0),
    ))
}

fn score_md(core: &PatternAxes) -> Option<f64> {
    machine_score(core).map(clamp01)
}

fn pass_rule(code: ProfileCode, core: &PatternAxes, score: Option<f64>, th: f64) -> (bool, Vec<String>) {
    let mut reasons = Vec::new();

    let score = match score {
        None => {
            if matches!(code, ProfileCode::He | ProfileCode::Md) {
                if core.kpf.is_none() && core.tps.is_none() {
                    reasons.push(
                        "KPF-Sim and TPS-H are not available, score is not computable".to_string(),
                    );
                } else {
                    reasons.push(
                        "KPF-Sim or TPS-H available, but required inputs for score are missing"
                            .to_string(),
                    );
                }
            } else {
                reasons.push("Required indicators missing, score is not computable".to_string());
            }
            return (false, reasons);
        }
        Some(s) => s,
    };

    let pass = score >= th;
    if !pass {
        reasons.push(format!("score < threshold ({})", th));
    }
    (pass, reasons)
}

pub fn compute_observed_patterns(core: &PatternAxes) -> ObservedPatterns {
    let th = OBSERVED_THRESHOLD;

    let all_profiles: Vec<ProfileScore> = PROFILE_ORDER
        .iter()
        .map(|&code| {
            let (label, description) = profile_meta(code);
            let raw = match code {
                ProfileCode::Re => score_re(core),
                ProfileCode::Ie => score_ie(core),
                ProfileCode::Ew => score_ew(core),
                ProfileCode::Ar => score_ar(core),
                ProfileCode::Si => score_si(core),
                ProfileCode::Rr => score_rr(core),
                ProfileCode::He => score_he(core),
                ProfileCode::Md => score_md(core),
            };
            let score = raw.map(clamp01);
            let (pass, reasons) = pass_rule(code, core, score, th);
            ProfileScore {
                code,
                label,
                description,
                score,
                pass_rule: pass,
                reasons,
            }
        })
        .collect();

    let mut pool: Vec<ProfileScore> = all_profiles
        .iter()
        .filter(|p| p.score.is_some())
        .cloned()
        .collect();
    pool.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut picked: Vec<ProfileScore> = pool
        .iter()
        .filter(|p| p.score.unwrap_or(0.0) >= th)
        .cloned()
        .collect();

    if picked.len() > OBSERVED_MAX {
        picked.truncate(OBSERVED_MAX);
    }
    if picked.len() < OBSERVED_MIN {
        picked = pool.iter().take(OBSERVED_MIN.min(pool.len())).cloned().collect();
    }

    ObservedPatterns {
        layer: "Cognitive Pattern Profile Layer",
        threshold: th,
        min_count: OBSERVED_MIN,
        max_count: OBSERVED_MAX,
        all_profiles,
        profiles: picked,
    }
}

/// Compact primary/secondary pattern block. Falls back to the full
/// computable pool when the selection holds fewer than two profiles, and to
/// the RE/EW metadata when even that is empty.
pub fn compute_pattern_out(core: &PatternAxes) -> PatternInfo {
    let observed = compute_observed_patterns(core);

    let sort_desc = |mut v: Vec<ProfileScore>| {
        v.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        v
    };

    let selected = sort_desc(
        observed
            .profiles
            .iter()
            .filter(|p| p.score.is_some())
            .cloned()
            .collect(),
    );
    let fallback = sort_desc(
        observed
            .all_profiles
            .iter()
            .filter(|p| p.score.is_some())
            .cloned()
            .collect(),
    );

    let list = if selected.len() >= 2 { selected } else { fallback };

    let (re_label, re_desc) = profile_meta(ProfileCode::Re);
    let (ew_label, ew_desc) = profile_meta(ProfileCode::Ew);

    let (primary_label, primary_desc) = list
        .first()
        .map(|p| (p.label, p.description))
        .unwrap_or((re_label, re_desc));
    let (secondary_label, secondary_desc) = list
        .get(1)
        .map(|p| (p.label, p.description))
        .unwrap_or((ew_label, ew_desc));

    PatternInfo {
        primary_label: primary_label.to_string(),
        secondary_label: secondary_label.to_string(),
        definition: PatternDefinition {
            primary: primary_desc.to_string(),
            secondary: secondary_desc.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes_six(aas: f64, ctf: f64, rmd: f64, rdx: f64, eds: f64, ifd: f64) -> PatternAxes {
        PatternAxes {
            aas: Some(aas),
            ctf: Some(ctf),
            rmd: Some(rmd),
            rdx: Some(rdx),
            eds: Some(eds),
            ifd: Some(ifd),
            ..PatternAxes::default()
        }
    }

    #[test]
    fn test_profiles_requiring_missing_axes_are_null() {
        let core = axes_six(0.7, 0.7, 0.7, 0.7, 0.7, 0.3);
        let out = compute_observed_patterns(&core);
        let by = |c: ProfileCode| out.all_profiles.iter().find(|p| p.code == c).unwrap().clone();
        assert!(by(ProfileCode::Ie).score.is_none());
        assert!(by(ProfileCode::Si).score.is_none());
        assert!(by(ProfileCode::He).score.is_none());
        assert!(by(ProfileCode::Md).score.is_none());
        assert!(by(ProfileCode::Re).score.is_some());
        assert!(by(ProfileCode::He)
            .reasons
            .iter()
            .any(|r| r.contains("KPF-Sim and TPS-H are not available")));
    }

    #[test]
    fn test_score_formulas() {
        let core = axes_six(0.8, 0.6, 0.4, 0.9, 0.7, 0.3);
        let re = score_re(&core).unwrap();
        assert!((re - (0.45 * 0.9 + 0.30 * 0.6 + 0.25 * 0.4)).abs() < 1e-12);
        let ew = score_ew(&core).unwrap();
        assert!((ew - (0.55 * 0.7 + 0.45 * 0.8)).abs() < 1e-12);
        let ar = score_ar(&core).unwrap();
        assert!((ar - (0.65 * 0.8 + 0.35 * 0.7 - 0.20 * 0.6)).abs() < 1e-12);
        let rr = score_rr(&core).unwrap();
        assert!((rr - (0.60 * 0.9 + 0.40 * 0.7)).abs() < 1e-12);
    }

    #[test]
    fn test_selection_pads_to_two() {
        // Low scores everywhere: nothing passes the threshold, so the top
        // two computable profiles are kept.
        let core = axes_six(0.1, 0.1, 0.1, 0.1, 0.1, 0.9);
        let out = compute_observed_patterns(&core);
        assert_eq!(out.profiles.len(), 2);
        assert!(out.profiles.iter().all(|p| !p.pass_rule));
    }

    #[test]
    fn test_selection_caps_at_three() {
        let core = PatternAxes {
            kpf: Some(0.0),
            tps: Some(1.0),
            analyticity: Some(0.9),
            flow: Some(0.9),
            metacog_raw: Some(0.9),
            ..axes_six(0.9, 0.9, 0.9, 0.9, 0.9, 0.1)
        };
        let out = compute_observed_patterns(&core);
        assert!(out.profiles.len() <= 3);
        assert!(out.profiles.iter().all(|p| p.score.unwrap() >= OBSERVED_THRESHOLD));
    }

    #[test]
    fn test_pattern_out_orders_primary_secondary() {
        let core = axes_six(0.9, 0.5, 0.5, 0.9, 0.9, 0.5);
        let info = compute_pattern_out(&core);
        assert_ne!(info.primary_label, info.secondary_label);
        assert!(!info.definition.primary.is_empty());
        assert!(!info.definition.secondary.is_empty());
    }

    #[test]
    fn test_machine_authenticity_single_source() {
        let core = PatternAxes {
            kpf: Some(0.3),
            ..PatternAxes::default()
        };
        assert_eq!(authenticity(&core), Some(0.7));
        assert_eq!(machine_score(&core), Some(0.3));
        let core = PatternAxes {
            tps: Some(0.8),
            ..PatternAxes::default()
        };
        assert_eq!(authenticity(&core), Some(0.8));
        assert!((machine_score(&core).unwrap() - 0.2).abs() < 1e-12);
    }
}
