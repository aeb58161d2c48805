// Final type determination from the CFF indicator set.
//
// Active indicator scores fold into meta-axes (Analyticity, Flow,
// MetacogRaw, Regulation, Authenticity, MachineScore). MachineScore splits
// the decision into Human / Hybrid / AI tracks; each track walks an ordered
// rule table and the first match wins, with the human table as the shared
// fallback. Confidence derives from the rule margin, clamped to 0.55..0.92.

use super::{clamp01, round2};
use crate::models::FinalTypeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorStatus {
    #[default]
    Missing,
    Excluded,
    Active,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorValue {
    pub score: Option<f64>,
    pub status: IndicatorStatus,
}

impl IndicatorValue {
    pub fn active(score: f64) -> Self {
        IndicatorValue {
            score: Some(score),
            status: IndicatorStatus::Active,
        }
    }

    pub fn missing() -> Self {
        IndicatorValue::default()
    }
}

/// The eight CFF indicators with their availability status.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalTypeInput {
    pub aas: IndicatorValue,
    pub ctf: IndicatorValue,
    pub rmd: IndicatorValue,
    pub rdx: IndicatorValue,
    pub eds: IndicatorValue,
    pub ifd: IndicatorValue,
    pub kpf_sim: IndicatorValue,
    pub tps_h: IndicatorValue,
}

#[derive(Debug, Clone, Copy)]
pub struct FinalTypeOptions {
    /// T2 gate axis: Regulation when true, MetacogRaw when false.
    pub t2_regulation: bool,
    /// Force the Human track regardless of MachineScore.
    pub conservative_lock_ai_hybrid: bool,
}

impl Default for FinalTypeOptions {
    fn default() -> Self {
        FinalTypeOptions {
            t2_regulation: true,
            conservative_lock_ai_hybrid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetCode {
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    Ax1,
    Ax2,
    Ax3,
    Ax4,
    Hx1,
    Hx2,
    Hx3,
    Hx4,
}

impl DetCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetCode::T1 => "T1",
            DetCode::T2 => "T2",
            DetCode::T3 => "T3",
            DetCode::T4 => "T4",
            DetCode::T5 => "T5",
            DetCode::T6 => "T6",
            DetCode::Ax1 => "Ax-1",
            DetCode::Ax2 => "Ax-2",
            DetCode::Ax3 => "Ax-3",
            DetCode::Ax4 => "Ax-4",
            DetCode::Hx1 => "Hx-1",
            DetCode::Hx2 => "Hx-2",
            DetCode::Hx3 => "Hx-3",
            DetCode::Hx4 => "Hx-4",
        }
    }
}

fn registry(code: DetCode) -> (&'static str, &'static str) {
    match code {
        DetCode::T1 => (
            "Analytical Reasoner",
            "T1. Analytical Reasoner approaches problems through structured decomposition and logical sequencing. Reasoning is driven by explicit analysis, rule-based evaluation, and clear separation of components. This pattern prioritizes correctness, internal consistency, and stepwise justification.",
        ),
        DetCode::T2 => (
            "Reflective Thinker",
            "T2. Reflective Thinker emphasizes self-monitoring and internal revision during reasoning. This pattern frequently revisits prior assumptions, adjusts interpretations, and refines conclusions through reflection. Reasoning quality is shaped by iterative reassessment rather than linear progression.",
        ),
        DetCode::T3 => (
            "Intuitive Explorer",
            "T3. Intuitive Explorer relies on associative thinking and exploratory inference. Reasoning advances through pattern recognition, conceptual leaps, and hypothesis generation rather than explicit structure. This pattern prioritizes discovery and possibility over immediate validation.",
        ),
        DetCode::T4 => (
            "Strategic Integrator",
            "T4. Strategic Integrator focuses on synthesizing multiple perspectives into a coherent direction. Reasoning involves alignment of goals, constraints, and long-term implications. This pattern emphasizes coordination, prioritization, and purposeful convergence.",
        ),
        DetCode::T5 => (
            "Human Expressionist",
            "T5. Human Expressionist centers reasoning around meaning, context, and human experience. Thought is shaped by narrative coherence, emotional nuance, and communicative clarity. This pattern prioritizes expressiveness and interpretive depth over formal structure.",
        ),
        DetCode::T6 => (
            "Machine-Dominant",
            "T6. Machine-Dominant pattern shows strong reliance on external systems or automated reasoning flows. Decision progression often mirrors templated logic or system-driven optimization. Human agency and self-directed revision signals remain limited.",
        ),
        DetCode::Ax1 => (
            "Template Generator",
            "Ax-1. Template Generator produces reasoning by following predefined structural patterns. Responses are consistent and organized but show limited adaptation beyond the template. Original restructuring signals are minimal.",
        ),
        DetCode::Ax2 => (
            "Evidence Synthesizer",
            "Ax-2. Evidence Synthesizer focuses on collecting and linking supporting information. Reasoning emphasizes aggregation and alignment of evidence rather than original inference. Conclusions emerge from evidence density rather than internal exploration.",
        ),
        DetCode::Ax3 => (
            "Style Emulator",
            "Ax-3. Style Emulator mirrors linguistic and structural patterns.",
        ),
        DetCode::Ax4 => (
            "Reasoning Simulator",
            "Ax-4. Reasoning Simulator reproduces the appearance of structured reasoning through iterative expansion and recombination. While transitions and revisions are present, they are driven by simulation rather than genuine internal intent formation.",
        ),
        DetCode::Hx1 => (
            "Draft-Assist",
            "Hx-1. Draft-Assist Type uses AI support primarily for initial idea formation. Human control increases in later stages through revision and refinement.",
        ),
        DetCode::Hx2 => (
            "Structure-Assist",
            "Hx-2. Structure-Assist Type relies on AI to organize and scaffold reasoning. Core ideas remain human-driven, while structural clarity is externally supported.",
        ),
        DetCode::Hx3 => (
            "Evidence-Assist",
            "Hx-3. Evidence-Assist Type leverages AI to gather or arrange supporting material. Human reasoning determines relevance and final judgment.",
        ),
        DetCode::Hx4 => (
            "Reasoning-Assist",
            "Hx-4. Reasoning-Assist Type involves AI participation in intermediate reasoning steps. Human oversight remains, but reasoning momentum is partially shared.",
        ),
    }
}

fn interpretation_for(code: DetCode) -> String {
    match code {
        DetCode::Ax4 => "Reasoning Simulator reflects a reasoning structure that appears coherent and well-formed, while transitions and revisions are driven by simulated control patterns rather than direct intent formation.".to_string(),
        _ => format!(
            "{} reflects the dominant reasoning pattern inferred from the current indicator configuration.",
            registry(code).0
        ),
    }
}

fn ensure_type_code_prefix(code: DetCode, type_name: &str) -> String {
    let trimmed = type_name.trim();
    if trimmed.is_empty() {
        return code.as_str().to_string();
    }
    let normalized = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    let c = code.as_str();
    if normalized.starts_with(&format!("{}.", c)) || normalized.starts_with(&format!("{} ", c)) {
        return normalized;
    }
    format!("{}. {}", c, normalized)
}

fn avg(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some((a + b) / 2.0),
    }
}

fn active_score(iv: &IndicatorValue, normalize_tps_h: bool) -> Option<f64> {
    if iv.status != IndicatorStatus::Active {
        return None;
    }
    let mut x = iv.score.filter(|v| v.is_finite())?;
    // Percent-scaled histories are normalized back to 0..1.
    if normalize_tps_h && x > 1.01 {
        x /= 100.0;
    }
    Some(clamp01(x))
}

fn conf_from_margin(margin: f64) -> f64 {
    clamp01((0.65 + 0.7 * margin).clamp(0.55, 0.92))
}

struct Choice {
    code: DetCode,
    conf: f64,
}

pub fn compute_final_type(input: &FinalTypeInput, opts: &FinalTypeOptions) -> FinalTypeInfo {
    let aas = active_score(&input.aas, false);
    let ctf = active_score(&input.ctf, false);
    let rmd = active_score(&input.rmd, false);
    let rdx = active_score(&input.rdx, false);
    let eds = active_score(&input.eds, false);
    let ifd = active_score(&input.ifd, false);
    let kpf = active_score(&input.kpf_sim, false);
    let tps = active_score(&input.tps_h, true);

    let analyticity = avg(aas, eds);
    let flow = avg(ctf, rmd);
    let metacog_raw = avg(rdx, ifd);
    let regulation = avg(rdx, ifd.map(|x| 1.0 - x));

    let authenticity = match (kpf, tps) {
        (Some(k), Some(t)) => avg(Some(1.0 - k), Some(t)),
        (Some(k), None) => Some(1.0 - k),
        (None, Some(t)) => Some(t),
        (None, None) => None,
    };
    let machine_score = match (kpf, tps) {
        (Some(k), Some(t)) => avg(Some(k), Some(1.0 - t)),
        (Some(k), None) => Some(k),
        (None, Some(t)) => Some(1.0 - t),
        (None, None) => None,
    };

    let track = match machine_score {
        None => "Human",
        Some(_) if opts.conservative_lock_ai_hybrid => "Human",
        Some(m) if m >= 0.7 => "AI",
        Some(m) if m >= 0.4 => "Hybrid",
        Some(_) => "Human",
    };

    let choose_human_t = || -> Choice {
        let mut cand: Vec<(i32, DetCode, f64)> = Vec::new();

        if let (Some(a), Some(f), Some(m)) = (analyticity, flow, metacog_raw) {
            if a >= 0.6 && f >= 0.6 && m >= 0.6 {
                let margin = (a - 0.6).min(f - 0.6).min(m - 0.6);
                cand.push((4, DetCode::T4, conf_from_margin(margin)));
            }
        }

        let axis = if opts.t2_regulation { regulation } else { metacog_raw };
        if let Some(axis) = axis {
            if axis >= 0.7 {
                cand.push((3, DetCode::T2, conf_from_margin(axis - 0.7)));
            }
        }

        if let (Some(a), Some(f)) = (analyticity, flow) {
            if a >= 0.7 && f < 0.55 {
                let margin = (a - 0.7).min(0.55 - f);
                cand.push((2, DetCode::T1, conf_from_margin(margin)));
            }
            if f >= 0.7 && a < 0.55 {
                let margin = (f - 0.7).min(0.55 - a);
                cand.push((1, DetCode::T3, conf_from_margin(margin)));
            }
        }

        cand.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
        });
        match cand.first() {
            Some(&(_, code, conf)) => Choice { code, conf },
            None => Choice { code: DetCode::T2, conf: 0.6 },
        }
    };

    let choose_ax = || -> Option<Choice> {
        if let (Some(a), Some(r), Some(m)) = (aas, rdx, rmd) {
            if a >= 0.8 && r <= 0.4 && m <= 0.45 {
                let margin = (a - 0.8).min(0.4 - r).min(0.45 - m);
                return Some(Choice { code: DetCode::Ax1, conf: conf_from_margin(margin) });
            }
        }
        if let (Some(e), Some(a), Some(i)) = (eds, aas, ifd) {
            if e >= 0.8 && a >= 0.65 && i <= 0.4 {
                let margin = (e - 0.8).min(a - 0.65).min(0.4 - i);
                return Some(Choice { code: DetCode::Ax2, conf: conf_from_margin(margin) });
            }
        }
        if let (Some(f), Some(m)) = (flow, machine_score) {
            if f >= 0.65 && m >= 0.7 {
                let margin = (f - 0.65).min(m - 0.7);
                return Some(Choice { code: DetCode::Ax3, conf: conf_from_margin(margin) });
            }
        }
        if let (Some(a), Some(r), Some(i)) = (aas, rdx, ifd) {
            if a >= 0.75 && r <= 0.45 && i <= 0.35 {
                let margin = (a - 0.75).min(0.45 - r).min(0.35 - i);
                return Some(Choice { code: DetCode::Ax4, conf: conf_from_margin(margin) });
            }
        }
        None
    };

    let choose_hx = || -> Option<Choice> {
        let k = kpf?;

        if let Some(r) = rdx {
            if r >= 0.6 && (0.25..=0.55).contains(&k) {
                let margin = (r - 0.6).min(k - 0.25).min(0.55 - k);
                return Some(Choice { code: DetCode::Hx1, conf: conf_from_margin(margin) });
            }
        }
        if let (Some(a), Some(c)) = (aas, ctf) {
            if a >= 0.6 && c >= 0.6 && (0.25..=0.55).contains(&k) {
                let margin = (a - 0.6).min(c - 0.6).min(k - 0.25).min(0.55 - k);
                return Some(Choice { code: DetCode::Hx2, conf: conf_from_margin(margin) });
            }
        }
        if let Some(e) = eds {
            if e >= 0.75 && (0.25..=0.55).contains(&k) {
                let margin = (e - 0.75).min(k - 0.25).min(0.55 - k);
                return Some(Choice { code: DetCode::Hx3, conf: conf_from_margin(margin) });
            }
        }
        if let (Some(a), Some(m)) = (aas, rmd) {
            if a >= 0.7 && m <= 0.45 && k >= 0.45 {
                let margin = (a - 0.7).min(0.45 - m).min(k - 0.45);
                return Some(Choice { code: DetCode::Hx4, conf: conf_from_margin(margin) });
            }
        }
        None
    };

    let choose_t5_t6 = || -> Option<Choice> {
        let auth = authenticity?;
        let machine = machine_score?;

        if machine >= 0.7 || auth <= 0.4 {
            let margin = (machine - 0.7).max(0.4 - auth);
            return Some(Choice { code: DetCode::T6, conf: conf_from_margin(margin) });
        }
        if auth >= 0.75 {
            return Some(Choice { code: DetCode::T5, conf: conf_from_margin(auth - 0.75) });
        }
        None
    };

    let choice = match track {
        "Human" => choose_t5_t6().unwrap_or_else(choose_human_t),
        "Hybrid" => choose_hx().unwrap_or_else(choose_human_t),
        _ => choose_ax().unwrap_or_else(choose_human_t),
    };

    let (type_name, _description) = registry(choice.code);
    let label = ensure_type_code_prefix(choice.code, type_name);

    FinalTypeInfo {
        chip_label: label.clone(),
        label,
        type_code: choice.code.as_str().to_string(),
        confidence: round2(clamp01(choice.conf)),
        interpretation: interpretation_for(choice.code),
    }
}
