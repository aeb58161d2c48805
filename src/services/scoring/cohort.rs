// Cohort percentile placement for the FRI score.
//
// Two paths: a caller-supplied reference list (strictly-below counting), or
// the built-in pseudo-PDF curve integrated with the trapezoid rule when no
// list is available. Percentiles are rounded to 3 decimals.

use crate::models::CohortInfo;

#[derive(Debug, Clone, Copy)]
struct CurvePoint {
    x: f64,
    y: f64,
}

const DEFAULT_COHORT_CURVE: [CurvePoint; 11] = [
    CurvePoint { x: 0.0, y: 2.0 },
    CurvePoint { x: 0.5, y: 6.0 },
    CurvePoint { x: 1.0, y: 14.0 },
    CurvePoint { x: 1.5, y: 26.0 },
    CurvePoint { x: 2.0, y: 30.0 },
    CurvePoint { x: 2.5, y: 45.0 },
    CurvePoint { x: 3.0, y: 58.0 },
    CurvePoint { x: 3.5, y: 42.0 },
    CurvePoint { x: 4.0, y: 22.0 },
    CurvePoint { x: 4.5, y: 10.0 },
    CurvePoint { x: 5.0, y: 4.0 },
];

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn percentile_from_curve(fri_value: f64, curve: &[CurvePoint]) -> f64 {
    let mut pts: Vec<CurvePoint> = curve
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    if pts.len() < 2 {
        return 0.5;
    }
    pts.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let v = if fri_value.is_finite() { fri_value } else { 0.0 };

    let mut total_area = 0.0;
    let mut below_area = 0.0;

    for i in 1..pts.len() {
        let x0 = pts[i - 1].x;
        let x1 = pts[i].x;
        let y0 = pts[i - 1].y.max(0.0);
        let y1 = pts[i].y.max(0.0);

        let dx = x1 - x0;
        if !(dx > 0.0) {
            continue;
        }

        let seg_area = (y0 + y1) * 0.5 * dx;
        total_area += seg_area;

        if v <= x0 {
            continue;
        } else if v >= x1 {
            below_area += seg_area;
        } else {
            // Partial segment: linear interpolation at v.
            let t = (v - x0) / dx;
            let yv = y0 + (y1 - y0) * t;
            below_area += (y0 + yv) * 0.5 * (v - x0);
        }
    }

    if !(total_area > 0.0) {
        return 0.5;
    }
    round3((below_area / total_area).clamp(0.0, 1.0))
}

/// Fraction of the reference list strictly below the score, or the default
/// curve placement when the list is empty.
pub fn percentile_0to1(fri_value: f64, cohort_fri_list: &[f64]) -> f64 {
    if cohort_fri_list.is_empty() {
        return percentile_from_curve(fri_value, &DEFAULT_COHORT_CURVE);
    }

    let v = if fri_value.is_finite() { fri_value } else { 0.0 };
    let lower = cohort_fri_list
        .iter()
        .map(|&x| if x.is_finite() { x } else { 0.0 })
        .filter(|&x| x < v)
        .count();

    round3(lower as f64 / cohort_fri_list.len() as f64)
}

pub fn top_percent_label(percentile: f64) -> String {
    let p = if percentile.is_finite() { percentile } else { 0.5 };
    let top_percent = ((1.0 - p) * 100.0).round() as i64;
    if top_percent <= 1 {
        "Top 1%".to_string()
    } else {
        format!("Top {}%", top_percent)
    }
}

pub fn cohort_interpretation_from_top_percent(top_percent_value: f64) -> &'static str {
    let t = if top_percent_value.is_finite() { top_percent_value } else { 50.0 };

    if t >= 50.0 {
        return "Core reasoning steps are emerging, with structure still developing compared to most peers.";
    }
    if t >= 30.0 {
        return "Developing structure, with several reasoning patterns beginning to align relative to comparable peers.";
    }
    if t >= 20.0 {
        return "Generally well-structured reasoning compared to most peers, with room for further stabilization.";
    }
    if t >= 10.0 {
        return "Consistently structured reasoning relative to comparable peers.";
    }
    if t >= 5.0 {
        return "Highly consistent reasoning structure compared to most peers, even as complexity increases.";
    }
    "Exceptionally stable reasoning structure within the current comparison group."
}

pub fn compute_cohort(fri_value: f64, cohort_fri_list: &[f64]) -> CohortInfo {
    let percentile = percentile_0to1(fri_value, cohort_fri_list);
    let label = top_percent_label(percentile);
    let top_percent_value = ((1.0 - percentile) * 100.0).round();

    CohortInfo {
        percentile_0to1: percentile,
        top_percent_label: label,
        interpretation: cohort_interpretation_from_top_percent(top_percent_value).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_path_counts_strictly_below() {
        let list = [1.0, 2.0, 3.0, 3.0, 4.0];
        assert_eq!(percentile_0to1(3.0, &list), 0.4);
        assert_eq!(percentile_0to1(5.0, &list), 1.0);
        assert_eq!(percentile_0to1(0.5, &list), 0.0);
    }

    #[test]
    fn test_list_path_treats_non_finite_entries_as_zero() {
        let list = [f64::NAN, 2.0];
        // NaN entry reads as 0, which is below 1.5.
        assert_eq!(percentile_0to1(1.5, &list), 0.5);
    }

    #[test]
    fn test_default_curve_extremes() {
        assert_eq!(percentile_0to1(0.0, &[]), 0.0);
        assert_eq!(percentile_0to1(5.0, &[]), 1.0);
        let mid = percentile_0to1(2.5, &[]);
        assert!(mid > 0.0 && mid < 1.0);
        // 3 decimal rounding
        assert_eq!(mid, (mid * 1000.0).round() / 1000.0);
    }

    #[test]
    fn test_curve_is_monotone_in_score() {
        let mut last = -1.0;
        for i in 0..=10 {
            let p = percentile_0to1(i as f64 * 0.5, &[]);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_top_percent_label() {
        assert_eq!(top_percent_label(0.62), "Top 38%");
        assert_eq!(top_percent_label(0.995), "Top 1%");
        assert_eq!(top_percent_label(1.0), "Top 1%");
        assert_eq!(top_percent_label(f64::NAN), "Top 50%");
    }

    #[test]
    fn test_interpretation_bands() {
        assert!(cohort_interpretation_from_top_percent(50.0).starts_with("Core reasoning steps"));
        assert!(cohort_interpretation_from_top_percent(30.0).starts_with("Developing structure"));
        assert!(cohort_interpretation_from_top_percent(20.0).starts_with("Generally well-structured"));
        assert!(cohort_interpretation_from_top_percent(10.0).starts_with("Consistently structured"));
        assert!(cohort_interpretation_from_top_percent(5.0).starts_with("Highly consistent"));
        assert!(cohort_interpretation_from_top_percent(4.0).starts_with("Exceptionally stable"));
    }

    #[test]
    fn test_compute_cohort_shape() {
        let out = compute_cohort(3.0, &[]);
        assert!(out.percentile_0to1 > 0.0 && out.percentile_0to1 < 1.0);
        assert!(out.top_percent_label.starts_with("Top "));
        assert!(!out.interpretation.is_empty());
    }
}
