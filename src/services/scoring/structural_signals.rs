// Structural control signals (agency indicators).
//
// Four 0..1 normalized magnitudes (not probabilities) derived from per-unit
// event arrays when available, with totals-based fallbacks:
//   structural_variance, human_rhythm_index, transition_flow, revision_depth.

use super::{clamp01, mean, round2, safe_div, std_dev};
use crate::models::{RawFeatures, StructuralControlSignals};

const SV_MAX: f64 = 0.35;
const CV_REF: f64 = 0.6;
const D_MAX: f64 = 3.0;
const R_REF: f64 = 12.0;

/// Event counts reshaped for the agency indicators. Per-unit arrays are only
/// trusted when their length matches the unit count; totals always carry.
#[derive(Debug, Clone, Default)]
pub struct AgencyRaw {
    pub units: usize,
    pub unit_lengths: Option<Vec<f64>>,
    pub per_unit: Option<AgencyPerUnit>,
    pub totals: AgencyTotals,
}

#[derive(Debug, Clone, Default)]
pub struct AgencyPerUnit {
    pub claims: Option<Vec<f64>>,
    pub reasons: Option<Vec<f64>>,
    pub evidence: Option<Vec<f64>>,
    pub sub_claims: Option<Vec<f64>>,
    pub warrants: Option<Vec<f64>>,
    pub counterpoints: Option<Vec<f64>>,
    pub refutations: Option<Vec<f64>>,
    pub transitions: Option<Vec<f64>>,
    pub transition_ok: Option<Vec<f64>>,
    pub revisions: Option<Vec<f64>>,
    pub revision_depth: Option<Vec<f64>>,
    pub belief_change: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct AgencyTotals {
    pub claims: f64,
    pub reasons: f64,
    pub evidence: f64,
    pub sub_claims: f64,
    pub warrants: f64,
    pub counterpoints: f64,
    pub refutations: f64,
    pub transitions: f64,
    pub transition_ok: f64,
    pub revisions: f64,
    pub revision_depth_sum: f64,
    pub belief_change: f64,
}

fn safe_num(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn sum(arr: &[f64]) -> f64 {
    arr.iter().map(|&v| safe_num(v)).sum()
}

fn cv(arr: &[f64]) -> f64 {
    let m = mean(arr);
    if m <= 0.0 {
        return 0.0;
    }
    std_dev(arr) / m
}

fn event_indices(per_unit: Option<&Vec<f64>>) -> Vec<usize> {
    per_unit
        .map(|arr| {
            arr.iter()
                .enumerate()
                .filter(|(_, &v)| safe_num(v) > 0.0)
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default()
}

fn diffs_sorted(indices: &[usize]) -> Vec<f64> {
    if indices.len() < 2 {
        return Vec::new();
    }
    let mut xs: Vec<usize> = indices.to_vec();
    xs.sort_unstable();
    xs.windows(2).map(|w| (w[1] - w[0]) as f64).collect()
}

// K = clip(round(sqrt(units)), 3, 8); fewer than 6 units always gets K = 3.
fn choose_k(units: usize) -> usize {
    let u = units.max(1);
    if u < 6 {
        return 3;
    }
    let k = (u as f64).sqrt().round() as usize;
    k.clamp(3, 8)
}

fn segment_ranges(units: usize, k: usize) -> Vec<(usize, usize)> {
    let u = units.max(1);
    let k = k.max(1);
    (0..k)
        .map(|i| {
            let start = (i * u) / k;
            let end = ((i + 1) * u) / k;
            (start, end)
        })
        .collect()
}

fn slice_sum(arr: Option<&Vec<f64>>, start: usize, end: usize) -> f64 {
    match arr {
        Some(a) if !a.is_empty() => {
            let e = end.min(a.len()).max(start);
            a[start.min(a.len())..e].iter().map(|&v| safe_num(v)).sum()
        }
        _ => 0.0,
    }
}

fn l2_dist(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().max(b.len());
    let mut ss = 0.0;
    for i in 0..n {
        let dv = safe_num(*a.get(i).unwrap_or(&0.0)) - safe_num(*b.get(i).unwrap_or(&0.0));
        ss += dv * dv;
    }
    ss.sqrt()
}

// Mean L2 distance of per-segment structure vectors to their mean vector,
// normalized by SV_MAX. Without per-unit arrays restructuring across segment
// boundaries cannot be measured, so the indicator stays at 0.
fn structural_variance(raw: &AgencyRaw) -> f64 {
    let units = raw.units.max(1);
    let ranges = segment_ranges(units, choose_k(units));

    let pu = match &raw.per_unit {
        Some(pu) => pu,
        None => return 0.0,
    };
    let keys: [Option<&Vec<f64>>; 8] = [
        pu.claims.as_ref(),
        pu.reasons.as_ref(),
        pu.evidence.as_ref(),
        pu.sub_claims.as_ref(),
        pu.warrants.as_ref(),
        pu.counterpoints.as_ref(),
        pu.refutations.as_ref(),
        pu.transitions.as_ref(),
    ];
    if !keys.iter().any(|a| a.map_or(false, |v| !v.is_empty())) {
        return 0.0;
    }

    let seg_vecs: Vec<Vec<f64>> = ranges
        .iter()
        .map(|&(start, end)| {
            let u_seg = (end.saturating_sub(start)).max(1) as f64;
            keys.iter()
                .map(|arr| slice_sum(*arr, start, end) / u_seg)
                .collect()
        })
        .collect();

    let dim = seg_vecs.first().map_or(0, |v| v.len());
    let mut s_bar = vec![0.0; dim];
    for v in &seg_vecs {
        for j in 0..dim {
            s_bar[j] += safe_num(v[j]);
        }
    }
    for x in s_bar.iter_mut() {
        *x = safe_div(*x, seg_vecs.len() as f64);
    }

    let acc: f64 = seg_vecs.iter().map(|v| l2_dist(v, &s_bar)).sum();
    let sv_raw = safe_div(acc, seg_vecs.len() as f64);

    clamp01(safe_div(sv_raw, SV_MAX))
}

// Weighted combination of coefficient-of-variation terms over unit lengths
// and transition/revision event intervals, normalized by CV_REF.
fn human_rhythm_index(raw: &AgencyRaw) -> f64 {
    let mut cvs: Vec<(f64, f64)> = Vec::new();

    if let Some(lengths) = &raw.unit_lengths {
        if lengths.len() >= 2 {
            let xs: Vec<f64> = lengths.iter().map(|&x| safe_num(x).max(0.0)).collect();
            cvs.push((cv(&xs), 0.6));
        }
    }

    if let Some(pu) = &raw.per_unit {
        let t_diffs = diffs_sorted(&event_indices(pu.transitions.as_ref()));
        if t_diffs.len() >= 2 {
            cvs.push((cv(&t_diffs), 0.2));
        }
        let r_diffs = diffs_sorted(&event_indices(pu.revisions.as_ref()));
        if r_diffs.len() >= 2 {
            cvs.push((cv(&r_diffs), 0.2));
        }
    }

    if cvs.is_empty() {
        return 0.0;
    }

    let num: f64 = cvs.iter().map(|&(v, w)| safe_num(v) * w).sum();
    let den: f64 = cvs.iter().map(|&(_, w)| w).sum();
    let combined = if den > 0.0 { num / den } else { 0.0 };

    clamp01(safe_div(combined, CV_REF))
}

fn avg_chain_length(per_unit_transitions: Option<&Vec<f64>>) -> f64 {
    let xs = match per_unit_transitions {
        Some(a) if !a.is_empty() => a,
        _ => return 1.0,
    };
    let mut runs: Vec<f64> = Vec::new();
    let mut cur = 0.0;
    for &x in xs {
        if safe_num(x) > 0.0 {
            cur += 1.0;
        } else if cur > 0.0 {
            runs.push(cur);
            cur = 0.0;
        }
    }
    if cur > 0.0 {
        runs.push(cur);
    }
    if runs.is_empty() {
        1.0
    } else {
        mean(&runs)
    }
}

// transition_flow = (valid / total) * ln(1 + avg_chain_length), clipped 0..1.
fn transition_flow(raw: &AgencyRaw) -> f64 {
    let pu_transitions = raw.per_unit.as_ref().and_then(|pu| pu.transitions.as_ref());
    let pu_transition_ok = raw.per_unit.as_ref().and_then(|pu| pu.transition_ok.as_ref());

    let total = pu_transitions
        .map(|a| sum(a))
        .unwrap_or(safe_num(raw.totals.transitions));
    let valid = pu_transition_ok
        .map(|a| sum(a))
        .unwrap_or(safe_num(raw.totals.transition_ok));

    let ratio = safe_div(valid, total.max(1.0));
    let chain = avg_chain_length(pu_transitions);

    clamp01(ratio * (1.0 + chain.max(0.0)).ln())
}

// revision_depth = min(1, depth_sum / D_MAX); without an explicit depth sum,
// a log-scaled revision-count proxy stands in.
fn revision_depth(raw: &AgencyRaw) -> f64 {
    let pu = raw.per_unit.as_ref();

    let depth_sum = pu
        .and_then(|p| p.revision_depth.as_ref())
        .map(|a| sum(a))
        .or_else(|| {
            let t = raw.totals.revision_depth_sum;
            if t.is_finite() {
                Some(t)
            } else {
                None
            }
        });

    if let Some(d) = depth_sum.filter(|d| d.is_finite()) {
        return clamp01(safe_div(d, D_MAX));
    }

    let revisions = pu
        .and_then(|p| p.revisions.as_ref())
        .map(|a| sum(a))
        .unwrap_or(safe_num(raw.totals.revisions));

    clamp01(safe_div(
        (1.0 + revisions.max(0.0)).ln(),
        (1.0 + R_REF.max(1.0)).ln(),
    ))
}

pub fn compute_agency_indicators(raw: &AgencyRaw) -> StructuralControlSignals {
    StructuralControlSignals {
        structural_variance: round2(structural_variance(raw)),
        human_rhythm_index: round2(human_rhythm_index(raw)),
        transition_flow: round2(transition_flow(raw)),
        revision_depth: round2(revision_depth(raw)),
    }
}

/// Reshapes the layered feature payload into [`AgencyRaw`]. Per-unit arrays
/// are dropped unless their length equals the unit count.
pub fn agency_raw_from_features(rf: &RawFeatures) -> AgencyRaw {
    let units = rf.layer_0.units.map(safe_num).unwrap_or(0.0).max(0.0) as usize;

    let arr_or_none = |a: Option<&Vec<f64>>| -> Option<Vec<f64>> {
        a.filter(|v| v.len() == units)
            .map(|v| v.iter().map(|&x| safe_num(x).max(0.0)).collect())
    };

    let unit_lengths = rf
        .layer_0
        .unit_lengths
        .as_ref()
        .filter(|v| v.len() == units)
        .map(|v| v.iter().map(|&x| (safe_num(x).floor()).max(0.0)).collect());

    let pu0 = &rf.layer_0.per_unit;
    let per_unit = AgencyPerUnit {
        transitions: arr_or_none(pu0.transitions.as_ref()),
        revisions: arr_or_none(pu0.revisions.as_ref()),
        claims: arr_or_none(pu0.claims.as_ref()),
        reasons: arr_or_none(pu0.reasons.as_ref()),
        evidence: arr_or_none(pu0.evidence.as_ref()),
        sub_claims: arr_or_none(pu0.sub_claims.as_ref()),
        warrants: arr_or_none(pu0.warrants.as_ref()),
        counterpoints: arr_or_none(pu0.counterpoints.as_ref()),
        refutations: arr_or_none(pu0.refutations.as_ref()),
        transition_ok: arr_or_none(pu0.transition_ok.as_ref()),
        revision_depth: arr_or_none(pu0.revision_depth.as_ref()),
        belief_change: arr_or_none(pu0.belief_change.as_ref()),
    };

    let nz = |x: Option<f64>| x.map(safe_num).unwrap_or(0.0).max(0.0);
    let totals = AgencyTotals {
        claims: nz(rf.layer_0.claims),
        reasons: nz(rf.layer_0.reasons),
        evidence: nz(rf.layer_0.evidence),
        sub_claims: nz(rf.layer_1.sub_claims),
        warrants: nz(rf.layer_1.warrants),
        counterpoints: nz(rf.layer_1.counterpoints),
        refutations: nz(rf.layer_1.refutations),
        transitions: nz(rf.layer_2.transitions),
        transition_ok: nz(rf.layer_2.transition_ok),
        revisions: nz(rf.layer_2.revisions),
        revision_depth_sum: nz(rf.layer_2.revision_depth_sum),
        belief_change: if rf.layer_2.belief_change.unwrap_or(false) {
            1.0
        } else {
            0.0
        },
    };

    let has_any_per_unit = [
        &per_unit.transitions,
        &per_unit.revisions,
        &per_unit.claims,
        &per_unit.reasons,
        &per_unit.evidence,
        &per_unit.sub_claims,
        &per_unit.warrants,
        &per_unit.counterpoints,
        &per_unit.refutations,
        &per_unit.transition_ok,
        &per_unit.revision_depth,
        &per_unit.belief_change,
    ]
    .iter()
    .any(|a| a.as_ref().map_or(false, |v| !v.is_empty()));

    AgencyRaw {
        units,
        unit_lengths,
        per_unit: if has_any_per_unit { Some(per_unit) } else { None },
        totals,
    }
}

pub fn compute_structural_control_signals(rf: &RawFeatures) -> StructuralControlSignals {
    compute_agency_indicators(&agency_raw_from_features(rf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_k_rule() {
        assert_eq!(choose_k(1), 3);
        assert_eq!(choose_k(5), 3);
        assert_eq!(choose_k(9), 3);
        assert_eq!(choose_k(25), 5);
        assert_eq!(choose_k(100), 8);
    }

    #[test]
    fn test_segment_ranges_cover_all_units() {
        let ranges = segment_ranges(10, 3);
        assert_eq!(ranges.first().map(|r| r.0), Some(0));
        assert_eq!(ranges.last().map(|r| r.1), Some(10));
        let total: usize = ranges.iter().map(|&(s, e)| e - s).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_structural_variance_requires_per_unit() {
        let raw = AgencyRaw {
            units: 12,
            totals: AgencyTotals {
                claims: 4.0,
                transitions: 6.0,
                ..AgencyTotals::default()
            },
            ..AgencyRaw::default()
        };
        assert_eq!(structural_variance(&raw), 0.0);
    }

    #[test]
    fn test_structural_variance_uneven_segments() {
        let raw = AgencyRaw {
            units: 9,
            per_unit: Some(AgencyPerUnit {
                claims: Some(vec![3.0, 3.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ..AgencyPerUnit::default()
            }),
            ..AgencyRaw::default()
        };
        let sv = structural_variance(&raw);
        assert!(sv > 0.0 && sv <= 1.0);

        // A uniform distribution across segments shows no variance.
        let flat = AgencyRaw {
            units: 9,
            per_unit: Some(AgencyPerUnit {
                claims: Some(vec![1.0; 9]),
                ..AgencyPerUnit::default()
            }),
            ..AgencyRaw::default()
        };
        assert_eq!(structural_variance(&flat), 0.0);
    }

    #[test]
    fn test_human_rhythm_index_zero_without_signals() {
        let raw = AgencyRaw {
            units: 4,
            ..AgencyRaw::default()
        };
        assert_eq!(human_rhythm_index(&raw), 0.0);

        // Constant lengths have zero CV.
        let uniform = AgencyRaw {
            units: 4,
            unit_lengths: Some(vec![50.0, 50.0, 50.0, 50.0]),
            ..AgencyRaw::default()
        };
        assert_eq!(human_rhythm_index(&uniform), 0.0);

        let varied = AgencyRaw {
            units: 4,
            unit_lengths: Some(vec![10.0, 90.0, 20.0, 80.0]),
            ..AgencyRaw::default()
        };
        assert!(human_rhythm_index(&varied) > 0.0);
    }

    #[test]
    fn test_transition_flow_prefers_per_unit_arrays() {
        let raw = AgencyRaw {
            units: 4,
            per_unit: Some(AgencyPerUnit {
                transitions: Some(vec![1.0, 1.0, 0.0, 1.0]),
                transition_ok: Some(vec![1.0, 1.0, 0.0, 1.0]),
                ..AgencyPerUnit::default()
            }),
            totals: AgencyTotals {
                transitions: 100.0,
                transition_ok: 0.0,
                ..AgencyTotals::default()
            },
            ..AgencyRaw::default()
        };
        // ratio 1.0, chains [2, 1] -> avg 1.5 -> ln(2.5) clipped to 1.
        assert_eq!(transition_flow(&raw), (2.5f64).ln().min(1.0));
    }

    #[test]
    fn test_revision_depth_explicit_and_proxy() {
        let explicit = AgencyRaw {
            units: 4,
            totals: AgencyTotals {
                revision_depth_sum: 1.5,
                ..AgencyTotals::default()
            },
            ..AgencyRaw::default()
        };
        assert_eq!(revision_depth(&explicit), 0.5);

        let capped = AgencyRaw {
            units: 4,
            totals: AgencyTotals {
                revision_depth_sum: 9.0,
                ..AgencyTotals::default()
            },
            ..AgencyRaw::default()
        };
        assert_eq!(revision_depth(&capped), 1.0);
    }

    #[test]
    fn test_adapter_rejects_mismatched_arrays() {
        let mut rf = RawFeatures::default();
        rf.layer_0.units = Some(4.0);
        rf.layer_0.unit_lengths = Some(vec![10.0, 20.0]);
        rf.layer_0.per_unit.transitions = Some(vec![1.0, 0.0, 1.0, 0.0]);
        rf.layer_2.transitions = Some(2.0);
        rf.layer_2.transition_ok = Some(2.0);

        let raw = agency_raw_from_features(&rf);
        assert_eq!(raw.units, 4);
        assert!(raw.unit_lengths.is_none());
        let pu = raw.per_unit.expect("matching array kept");
        assert_eq!(pu.transitions.as_deref(), Some(&[1.0, 0.0, 1.0, 0.0][..]));
        assert_eq!(raw.totals.transitions, 2.0);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let raw = AgencyRaw {
            units: 4,
            unit_lengths: Some(vec![10.0, 90.0, 20.0, 80.0]),
            totals: AgencyTotals {
                transitions: 3.0,
                transition_ok: 2.0,
                revisions: 3.0,
                revision_depth_sum: f64::NAN,
                ..AgencyTotals::default()
            },
            ..AgencyRaw::default()
        };
        let out = compute_agency_indicators(&raw);
        for v in [
            out.structural_variance,
            out.human_rhythm_index,
            out.transition_flow,
            out.revision_depth,
        ] {
            assert!((0.0..=1.0).contains(&v));
            assert_eq!(v, (v * 100.0).round() / 100.0);
        }
    }
}
