// Cognitive style summary.
//
// Two compact axes (structure, exploration) over the CFF indicators plus
// light RSL proxies, thresholded into a 9-type grid. Produces a pattern name
// and a representative phrase; narrative interpretation lives elsewhere.

use super::clamp01;

#[derive(Debug, Clone, Copy, Default)]
pub struct StyleInputs {
    pub aas: f64,
    pub ctf: f64,
    pub rmd: f64,
    pub rdx: f64,
    pub eds: f64,
    pub ifd: f64,
    // Pass 0 when sub-scores are unavailable; the classifier still works.
    pub rsl_control: f64,
    pub rsl_validation: f64,
    pub rsl_hypothesis: f64,
    pub rsl_expansion: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSummary {
    pub primary_pattern: String,
    pub representative_phrase: String,
}

fn safe01(x: f64) -> f64 {
    clamp01(if x.is_finite() { x } else { 0.0 })
}

pub fn structure_score(m: &StyleInputs) -> f64 {
    clamp01(
        0.40 * safe01(m.rdx)
            + 0.30 * safe01(m.aas)
            + 0.20 * safe01(m.eds)
            + 0.10 * (1.0 - safe01(m.ifd)),
    )
}

pub fn exploration_score(m: &StyleInputs) -> f64 {
    clamp01(
        0.45 * safe01(m.ctf)
            + 0.25 * safe01(m.rmd)
            + 0.20 * safe01(m.rsl_hypothesis)
            + 0.10 * safe01(m.rsl_expansion),
    )
}

// HIGH >= 0.67, MEDIUM >= 0.45.
pub fn classify_style_id(structure: f64, exploration: f64) -> u8 {
    let s = clamp01(structure);
    let e = clamp01(exploration);

    if s >= 0.67 {
        if e >= 0.67 {
            1
        } else if e >= 0.45 {
            2
        } else {
            3
        }
    } else if s >= 0.45 {
        if e >= 0.67 {
            4
        } else if e >= 0.45 {
            5
        } else {
            6
        }
    } else if e >= 0.67 {
        7
    } else if e >= 0.45 {
        8
    } else {
        9
    }
}

fn pattern_name(style_id: u8) -> &'static str {
    match style_id {
        1 | 2 | 5 => "Reflective Explorer",
        3 => "Analytical Reasoner",
        4 => "Intuitive Explorer",
        6 => "Procedural Thinker",
        7 => "Creative Explorer",
        8 => "Associative Thinker",
        _ => "Linear Responder",
    }
}

fn phrase(style_id: u8) -> &'static str {
    match style_id {
        1 => "structured and exploratory",
        2 => "structured but exploratory",
        3 => "highly structured and deliberate",
        4 => "exploratory with emerging structure",
        5 => "balanced and adaptive",
        6 => "moderately structured and steady",
        7 => "highly exploratory and fluid",
        8 => "loosely structured with exploration",
        _ => "unstructured and linear",
    }
}

pub fn compute_style_summary(inputs: &StyleInputs) -> StyleSummary {
    let style_id = classify_style_id(structure_score(inputs), exploration_score(inputs));
    StyleSummary {
        primary_pattern: pattern_name(style_id).to_string(),
        representative_phrase: phrase(style_id).to_string(),
    }
}
