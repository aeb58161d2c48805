// Scoring engines: each submodule turns raw features (or upstream engine
// output) into one section of the report. All functions are pure and
// deterministic; shared numeric helpers live here.

pub mod cff_indicators;
pub mod cff_pattern;
pub mod cohort;
pub mod final_type;
pub mod fri;
pub mod level;
pub mod observed_signals;
pub mod rc_distribution;
pub mod rc_summary;
pub mod role_fit;
pub mod sri;
pub mod structural_signals;
pub mod style;

/// Clamp to [0, 1]; non-finite values collapse to 0.
pub(crate) fn clamp01(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Clamp to an arbitrary range; non-finite values collapse to the low bound.
pub(crate) fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if !x.is_finite() {
        return lo;
    }
    x.clamp(lo, hi)
}

pub(crate) fn clamp_0_to_5(x: f64) -> f64 {
    clamp(x, 0.0, 5.0)
}

/// Round to 2 decimals with a tiny epsilon so X.005 halves round up.
pub(crate) fn round2(x: f64) -> f64 {
    ((x + f64::EPSILON) * 100.0).round() / 100.0
}

/// Round to 1 decimal with the same epsilon treatment as [`round2`].
pub(crate) fn stable_round1(x: f64) -> f64 {
    ((x + f64::EPSILON) * 10.0).round() / 10.0
}

/// Division that treats a zero denominator as "no signal" instead of an
/// error.
pub(crate) fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

pub(crate) fn num_or(x: Option<f64>, fallback: f64) -> f64 {
    match x {
        Some(v) if v.is_finite() => v,
        _ => fallback,
    }
}

/// Non-negative integer read with a fallback for unmeasured values.
pub(crate) fn safe_int(x: Option<f64>, fallback: f64) -> f64 {
    match x {
        Some(v) if v.is_finite() => v.floor().max(0.0),
        _ => fallback,
    }
}

/// Finite entries of a possibly absent array, order preserved.
pub(crate) fn safe_array(x: Option<&Vec<f64>>) -> Vec<f64> {
    x.map(|v| v.iter().copied().filter(|n| n.is_finite()).collect())
        .unwrap_or_default()
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    var.sqrt()
}

/// Normalized Shannon entropy over a count vector: 1 means balanced, 0 means
/// fully concentrated (or empty).
pub(crate) fn entropy01(counts: &[f64]) -> f64 {
    let xs: Vec<f64> = counts
        .iter()
        .map(|&v| if v.is_finite() && v > 0.0 { v } else { 0.0 })
        .collect();
    let s: f64 = xs.iter().sum();
    if s <= 0.0 {
        return 0.0;
    }
    let ps: Vec<f64> = xs.iter().map(|v| v / s).filter(|p| *p > 0.0).collect();
    let h: f64 = -ps.iter().map(|p| p * p.ln()).sum::<f64>();
    let h_max = (ps.len().max(1) as f64).ln();
    if h_max <= 0.0 {
        return 0.0;
    }
    clamp01(h / h_max)
}

/// Linear peak at `target`, falling to 0 at `target +/- width`.
pub(crate) fn peak01(x: f64, target: f64, width: f64) -> f64 {
    if !x.is_finite() || width <= 0.0 {
        return 0.0;
    }
    clamp01(1.0 - (x - target).abs() / width)
}

/// Saturating ratio: grows toward 1 as `x` outpaces the half-point `k`.
pub(crate) fn sat(x: f64, k: f64) -> f64 {
    let x = x.max(0.0);
    x / (x + k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp01_non_finite() {
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(f64::INFINITY), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.004999), 2.0);
        assert_eq!(round2(3.0), 3.0);
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_entropy01_balance() {
        assert_eq!(entropy01(&[0.0, 0.0]), 0.0);
        assert!((entropy01(&[2.0, 2.0, 2.0, 2.0]) - 1.0).abs() < 1e-12);
        assert_eq!(entropy01(&[5.0, 0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_std_dev_population() {
        assert_eq!(std_dev(&[2.0, 2.0, 2.0]), 0.0);
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak01() {
        assert_eq!(peak01(0.15, 0.15, 0.15), 1.0);
        assert_eq!(peak01(0.0, 0.15, 0.15), 0.0);
        assert_eq!(peak01(0.3, 0.15, 0.15), 0.0);
        assert!((peak01(0.225, 0.15, 0.15) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sat() {
        assert_eq!(sat(0.0, 0.25), 0.0);
        assert!((sat(0.25, 0.25) - 0.5).abs() < 1e-12);
        assert!(sat(10.0, 0.25) > 0.97);
    }
}
