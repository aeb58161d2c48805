// Cognitive Fingerprint Framework indicators (CFF v1 formulas, fixed).
//
// Six axes are computed from raw counts; two similarity axes (KPF-Sim,
// TPS-H) are caller-measured and may be missing. Internally a missing
// similarity reads as the neutral 0.5; the UI value list instead reports
// "N/A" so absence stays visible.

use std::collections::HashSet;

use serde_json::Value;

use super::{clamp01, round2, safe_div};
use crate::models::{value_bool, value_num, ScoreOrNa};

#[derive(Debug, Clone, Default)]
pub struct RawFeaturesV1 {
    pub units: f64,
    pub claims: f64,
    pub reasons: f64,
    pub evidence: f64,
    pub sub_claims: Option<f64>,
    pub warrants: f64,
    pub structure_type: Option<String>,
    pub transitions: f64,
    pub transition_ok: f64,
    pub belief_change: Option<bool>,
    pub evidence_types: Option<Vec<String>>,
    pub adjacency_links: Option<f64>,
    pub revisions: f64,
    pub revision_depth_sum: f64,
    pub hedges: f64,
    pub loops: f64,
    pub intent_markers: f64,
    pub drift_segments: f64,
    pub kpf_sim: Option<f64>,
    pub tps_h: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cff6 {
    pub aas: f64,
    pub ctf: f64,
    pub rmd: f64,
    pub rdx: f64,
    pub eds: f64,
    pub ifd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cff8 {
    pub aas: f64,
    pub ctf: f64,
    pub rmd: f64,
    pub rdx: f64,
    pub eds: f64,
    pub ifd: f64,
    pub kpf_sim: f64,
    pub tps_h: f64,
}

/// Radar-chart label order, fixed.
pub const CFF_LABELS: [&str; 8] = ["AAS", "CTF", "RMD", "RDX", "EDS", "IFD", "KPF-Sim", "TPS-H"];

fn num_or0(v: Option<&Value>) -> f64 {
    value_num(v).unwrap_or(0.0)
}

fn str_arr(v: Option<&Value>) -> Option<Vec<String>> {
    match v? {
        Value::Array(arr) => {
            let out: Vec<String> = arr
                .iter()
                .filter(|x| !x.is_null())
                .map(|x| match x {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .filter(|s| !s.trim().is_empty())
                .collect();
            if out.is_empty() {
                None
            } else {
                Some(out)
            }
        }
        Value::String(s) => {
            let parts: Vec<String> = s
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts)
            }
        }
        _ => None,
    }
}

/// Extract the CFF input record from a loosely shaped payload. The
/// `evidence_types` field may arrive as a string list under `layer_2` or as
/// a root-level count map; both shapes are accepted, and the count map can
/// also backfill a missing evidence total.
pub fn pick_raw_features_v1(input: &Value) -> RawFeaturesV1 {
    let rf = input.get("raw_features").filter(|v| v.is_object()).unwrap_or(input);
    let l0 = rf.get("layer_0");
    let l1 = rf.get("layer_1");
    let l2 = rf.get("layer_2");
    let l3 = rf.get("layer_3");
    let reserved = rf.get("backend_reserved");

    let ev_map = rf.get("evidence_types").filter(|v| v.is_object());
    let ev_arr_from_map: Option<Vec<String>> = ev_map.and_then(|m| {
        let obj = m.as_object()?;
        let out: Vec<String> = obj
            .iter()
            .filter(|(_, v)| value_num(Some(v)).map(|n| n > 0.0).unwrap_or(false))
            .map(|(k, _)| k.clone())
            .collect();
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    });
    let ev_arr_from_layer2 = str_arr(l2.and_then(|l| l.get("evidence_types")));
    let evidence_types = ev_arr_from_layer2.or(ev_arr_from_map);

    let evidence_from_layer0 = num_or0(l0.and_then(|l| l.get("evidence")));
    let evidence_from_map: f64 = ev_map
        .and_then(|m| m.as_object())
        .map(|obj| {
            obj.values()
                .filter_map(|v| value_num(Some(v)))
                .filter(|n| *n > 0.0)
                .sum()
        })
        .unwrap_or(0.0);
    let evidence = if evidence_from_layer0 > 0.0 {
        evidence_from_layer0
    } else {
        evidence_from_map
    };

    let opt_num = |layer: Option<&Value>, key: &str| -> Option<f64> {
        let slot = layer.and_then(|l| l.get(key));
        match slot {
            None | Some(Value::Null) => None,
            some => Some(value_num(some).unwrap_or(0.0)),
        }
    };

    RawFeaturesV1 {
        units: num_or0(l0.and_then(|l| l.get("units"))),
        claims: num_or0(l0.and_then(|l| l.get("claims"))),
        reasons: num_or0(l0.and_then(|l| l.get("reasons"))),
        evidence,

        sub_claims: opt_num(l1, "sub_claims"),
        warrants: num_or0(l1.and_then(|l| l.get("warrants"))),
        structure_type: l1
            .and_then(|l| l.get("structure_type"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),

        transitions: num_or0(l2.and_then(|l| l.get("transitions"))),
        transition_ok: num_or0(l2.and_then(|l| l.get("transition_ok"))),
        belief_change: value_bool(l2.and_then(|l| l.get("belief_change"))),
        evidence_types,
        adjacency_links: opt_num(l2, "adjacency_links"),

        revisions: num_or0(l2.and_then(|l| l.get("revisions"))),
        revision_depth_sum: num_or0(l2.and_then(|l| l.get("revision_depth_sum"))),

        hedges: num_or0(l3.and_then(|l| l.get("hedges"))),
        loops: num_or0(l3.and_then(|l| l.get("loops"))),
        intent_markers: num_or0(l3.and_then(|l| l.get("intent_markers"))),
        drift_segments: num_or0(l3.and_then(|l| l.get("drift_segments"))),

        kpf_sim: reserved.and_then(|r| value_num(r.get("kpf_sim"))),
        tps_h: reserved.and_then(|r| value_num(r.get("tps_h"))),
    }
}

fn structure_weight(st: Option<&str>) -> f64 {
    match st.unwrap_or("linear") {
        "hierarchical" => 0.6,
        "networked" => 1.0,
        _ => 0.3,
    }
}

fn na_to_mid01(x: Option<f64>) -> f64 {
    match x {
        Some(v) if v.is_finite() => clamp01(v),
        _ => 0.5,
    }
}

fn nz(x: f64) -> f64 {
    if x.is_finite() {
        x.max(0.0)
    } else {
        0.0
    }
}

pub fn compute_cff6(raw: &RawFeaturesV1) -> Cff6 {
    let u = if raw.units.is_finite() && raw.units >= 1.0 {
        raw.units.floor()
    } else {
        1.0
    };
    let c = nz(raw.claims);
    let r = nz(raw.reasons);
    let e = nz(raw.evidence);

    let sub = nz(raw.sub_claims.unwrap_or(0.0));
    let w = nz(raw.warrants);

    let t = nz(raw.transitions);
    let t_ok = nz(raw.transition_ok);

    let hedges = nz(raw.hedges);
    let loops = nz(raw.loops);

    let rev = nz(raw.revisions);
    let rev_depth_sum = nz(raw.revision_depth_sum);
    let belief_change = raw.belief_change.unwrap_or(false);

    let intent_markers = nz(raw.intent_markers);
    let drift_seg = nz(raw.drift_segments);

    let ev_type_count = raw
        .evidence_types
        .as_ref()
        .map(|v| v.iter().collect::<HashSet<_>>().len() as f64)
        .unwrap_or(0.0);

    // 1) AAS: argument architecture style
    let hierarchy_ratio = safe_div(sub, c);
    let warrant_ratio = safe_div(w, c);
    let aas = clamp01(0.4 * hierarchy_ratio + 0.4 * warrant_ratio + 0.2 * structure_weight(raw.structure_type.as_deref()));

    // 2) CTF: cognitive transition flow
    let transition_density = safe_div(t, u);
    let valid_transition_ratio = safe_div(t_ok, t);
    let ctf = clamp01(0.6 * transition_density + 0.4 * valid_transition_ratio);

    // 3) RMD: reasoning momentum delta
    let progress_rate = safe_div(r, u);
    let friction_rate = safe_div(hedges + loops, u);
    let rmd = clamp01(0.5 + (progress_rate - friction_rate));

    // 4) RDX: revision depth index
    let depth_avg = safe_div(rev_depth_sum, rev);
    let belief_bonus = if belief_change { 0.2 } else { 0.0 };
    let rdx = clamp01(0.7 * depth_avg + belief_bonus);

    // 5) EDS: evidence diversity over the four canonical kinds
    let type_diversity = safe_div(ev_type_count, 4.0);
    let evidence_density = safe_div(e, c);
    let eds = clamp01(0.6 * type_diversity + 0.4 * evidence_density);

    // 6) IFD: intent friction delta
    let intent_strength = if intent_markers > 0.0 { 1.0 } else { 0.5 };
    let drift_rate = safe_div(drift_seg, u);
    let ifd = clamp01(intent_strength - drift_rate);

    Cff6 { aas, ctf, rmd, rdx, eds, ifd }
}

pub fn compute_cff8(raw: &RawFeaturesV1) -> Cff8 {
    let base = compute_cff6(raw);
    Cff8 {
        aas: base.aas,
        ctf: base.ctf,
        rmd: base.rmd,
        rdx: base.rdx,
        eds: base.eds,
        ifd: base.ifd,
        kpf_sim: na_to_mid01(raw.kpf_sim),
        tps_h: na_to_mid01(raw.tps_h),
    }
}

fn to_score_or_na(x: Option<f64>) -> ScoreOrNa {
    match x {
        Some(v) if v.is_finite() => ScoreOrNa::Score(round2(clamp01(v))),
        _ => ScoreOrNa::NotAvailable,
    }
}

/// UI value list in [`CFF_LABELS`] order. The similarity slots surface the
/// raw measurements, so "missing" renders as "N/A" rather than the internal
/// neutral midpoint.
pub fn compute_cff_ui(raw: &RawFeaturesV1) -> (Vec<String>, Vec<ScoreOrNa>) {
    let v6 = compute_cff6(raw);
    let labels = CFF_LABELS.iter().map(|s| s.to_string()).collect();
    let values = vec![
        to_score_or_na(Some(v6.aas)),
        to_score_or_na(Some(v6.ctf)),
        to_score_or_na(Some(v6.rmd)),
        to_score_or_na(Some(v6.rdx)),
        to_score_or_na(Some(v6.eds)),
        to_score_or_na(Some(v6.ifd)),
        to_score_or_na(raw.kpf_sim),
        to_score_or_na(raw.tps_h),
    ];
    (labels, values)
}
