// Derivation pipeline.
//
// Orchestrates the full report: raw-feature normalization and deterministic
// backfill, then the RSL chain (FRI, level, cohort, SRI), the CFF chain
// (indicators, pattern, final type), the RC chain (structural signals,
// summary, distribution, observed signals) and the RFS role fit. Section
// engines never see the wire payload; they receive typed inputs built here.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::DeriveError;
use crate::models::{
    value_num, CffReport, Cfv, DeriveInput, DeriveOptions, RawFeatures, RawSignalsQuotes,
    RcReport, Report, RfsReport, RslDimension, RslReport,
};
use crate::services::extraction::fill_extraction_json;
use crate::services::scoring::cff_indicators::{compute_cff8, compute_cff_ui, pick_raw_features_v1};
use crate::services::scoring::cff_pattern::{compute_pattern_out, PatternAxes};
use crate::services::scoring::cohort::compute_cohort;
use crate::services::scoring::final_type::{
    compute_final_type, FinalTypeInput, FinalTypeOptions, IndicatorValue,
};
use crate::services::scoring::fri::{compute_fri_from_dimensions, get_r_score};
use crate::services::scoring::level::{compute_level_with_signals, LevelArgs};
use crate::services::scoring::observed_signals::{
    select_observed_signals, to_signal_lines, SIGNAL_LIBRARY,
};
use crate::services::scoring::rc_distribution::{build_distribution, build_distribution_heuristic};
use crate::services::scoring::rc_summary::compute_rc_summary;
use crate::services::scoring::role_fit::{compute_group_top3, default_role_configs, RoleFitInput};
use crate::services::scoring::sri::derive_sri_from_raw;
use crate::services::scoring::structural_signals::compute_structural_control_signals;
use crate::services::scoring::style::{compute_style_summary, StyleInputs};
use crate::models::NeuprintAxes;

fn num_or0(v: Option<&Value>) -> f64 {
    value_num(v).unwrap_or(0.0)
}

// ============ Input normalization ============

fn parse_dimension(v: &Value) -> Option<RslDimension> {
    if !v.is_object() {
        return None;
    }
    Some(RslDimension {
        code: v.get("code").and_then(|x| x.as_str()).unwrap_or("").to_string(),
        label: v.get("label").and_then(|x| x.as_str()).unwrap_or("").to_string(),
        score_1to5: num_or0(v.get("score_1to5")),
        observation: v
            .get("observation")
            .and_then(|x| x.as_str())
            .unwrap_or("")
            .to_string(),
    })
}

/// Rubric dimensions, first spelling that carries an array: the wrapper's
/// `rsl.dimensions`, the record's `rsl.dimensions`, or a flat
/// `rsl_dimensions` list.
fn collect_dimensions(input: &DeriveInput, raw: &Value) -> Vec<RslDimension> {
    let candidates = [
        input.rsl.as_ref().and_then(|r| r.get("dimensions")),
        raw.get("rsl").and_then(|r| r.get("dimensions")),
        raw.get("rsl_dimensions"),
    ];
    for c in candidates.into_iter().flatten() {
        if let Some(arr) = c.as_array() {
            return arr.iter().filter_map(parse_dimension).collect();
        }
    }
    Vec::new()
}

fn collect_quotes(input: &DeriveInput, raw: &Value) -> Option<RawSignalsQuotes> {
    let v = input
        .raw_signals_quotes
        .as_ref()
        .or_else(|| raw.get("raw_signals_quotes"))?;
    serde_json::from_value(v.clone()).ok()
}

fn has_all_layers(raw: &Value) -> bool {
    ["layer_0", "layer_1", "layer_2", "layer_3"]
        .iter()
        .all(|k| raw.get(k).is_some_and(|v| v.is_object()))
}

fn arc_level_from_short_name(short_name: &str) -> f64 {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\bL([1-6])\b").unwrap());
    re.captures(short_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(3.0)
}

fn library_text(id: &str) -> &'static str {
    SIGNAL_LIBRARY
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.text)
        .unwrap_or("")
}

// ============ Report validation ============

fn must(cond: bool, msg: &str) -> Result<(), DeriveError> {
    if cond {
        Ok(())
    } else {
        Err(DeriveError::Contract(msg.to_string()))
    }
}

/// Final contract check. The type system pins the report shape, so only
/// value-level conditions remain checkable at runtime.
fn assert_report(report: &Report) -> Result<(), DeriveError> {
    must(
        report.rsl.fri.score.is_finite(),
        "report: rsl.fri.score must be finite",
    )?;
    must(
        report.rsl.cohort.percentile_0to1.is_finite(),
        "report: rsl.cohort.percentile_0to1 must be finite",
    )?;
    must(
        report.rsl.sri.score.is_finite(),
        "report: rsl.sri.score must be finite",
    )?;
    must(
        !report.rsl.level.short_name.is_empty(),
        "report: rsl.level.short_name must be present",
    )?;
    must(
        !report.cff.pattern.primary_label.is_empty(),
        "report: cff.pattern.primary_label must be present",
    )?;
    must(
        report.cff.final_type.confidence.is_finite()
            && (0.0..=1.0).contains(&report.cff.final_type.confidence),
        "report: cff.final_type.confidence must be in [0,1]",
    )?;
    must(
        !report.rc.summary.is_empty(),
        "report: rc.summary must be present",
    )?;
    must(
        !report
            .rc
            .reasoning_control_distribution
            .final_determination
            .is_empty(),
        "report: rc.reasoning_control_distribution.final_determination must be present",
    )?;
    Ok(())
}

// ============ Pipeline ============

/// Derives the complete four-section report from a raw derivation input.
///
/// Configuration problems (an unknown role id, invalid axis weights) fail the
/// call; data anomalies never do, they degrade to neutral scores inside the
/// section engines.
pub fn derive_all(input: &DeriveInput, opts: &DeriveOptions) -> Result<Report, DeriveError> {
    let mut raw = input.raw_value();
    let dims = collect_dimensions(input, &raw);
    let quotes = collect_quotes(input, &raw);

    // Deterministic backfill runs only when the submitted text is present and
    // the record carries all four layers; otherwise the caller's numbers are
    // taken as-is.
    let text = input.source_text();
    if !text.is_empty() && has_all_layers(&raw) {
        let units = fill_extraction_json(&mut raw, &text);
        debug!(units = units.len(), chars = text.chars().count(), "extraction backfill applied");
    }

    let rf = RawFeatures::from_value(&raw);

    // RSL chain.
    let fri = compute_fri_from_dimensions(&dims);
    let level = compute_level_with_signals(&LevelArgs {
        fri: fri.score,
        r6: get_r_score(&dims, "R6"),
        r7: get_r_score(&dims, "R7"),
        r8: get_r_score(&dims, "R8"),
        raw_signals_quotes: quotes.as_ref(),
    });
    let cohort = compute_cohort(fri.score, &opts.cohort_fri_list);
    let sri = derive_sri_from_raw(&rf);

    // CFF chain.
    let raw_v1 = pick_raw_features_v1(&raw);
    let (labels, values) = compute_cff_ui(&raw_v1);
    let cff8 = compute_cff8(&raw_v1);

    let pattern = compute_pattern_out(&PatternAxes {
        aas: Some(cff8.aas),
        ctf: Some(cff8.ctf),
        rmd: Some(cff8.rmd),
        rdx: Some(cff8.rdx),
        eds: Some(cff8.eds),
        ifd: Some(cff8.ifd),
        ..PatternAxes::default()
    });

    // Similarity indicators stay Missing when unmeasured; a measured zero is
    // a real signal and must not be invented here.
    let kpf = match raw_v1.kpf_sim {
        Some(_) => IndicatorValue::active(cff8.kpf_sim),
        None => IndicatorValue::missing(),
    };
    let tps = match raw_v1.tps_h {
        Some(_) => IndicatorValue::active(cff8.tps_h),
        None => IndicatorValue::missing(),
    };
    let final_type = compute_final_type(
        &FinalTypeInput {
            aas: IndicatorValue::active(cff8.aas),
            ctf: IndicatorValue::active(cff8.ctf),
            rmd: IndicatorValue::active(cff8.rmd),
            rdx: IndicatorValue::active(cff8.rdx),
            eds: IndicatorValue::active(cff8.eds),
            ifd: IndicatorValue::active(cff8.ifd),
            kpf_sim: kpf,
            tps_h: tps,
        },
        &FinalTypeOptions::default(),
    );

    // RC chain.
    let structural = compute_structural_control_signals(&rf);
    let rc_summary = compute_rc_summary(&rf);

    let cfv = Cfv {
        aas: cff8.aas,
        ctf: cff8.ctf,
        rmd: cff8.rmd,
        rdx: cff8.rdx,
        eds: cff8.eds,
        ifd: cff8.ifd,
        hi: structural.human_rhythm_index,
        tps_hist: cff8.tps_h,
    };
    let distribution = match &opts.rc_logistic_model {
        Some(model) => build_distribution(&cfv, model),
        None => build_distribution_heuristic(&cfv, &structural),
    };

    // Without caller-activated signal IDs the selector would reorder lines by
    // group priority, so the canonical four-line default is emitted directly.
    let observed = if opts.active_signal_ids.is_empty() {
        crate::models::ObservedSignalLines {
            line1: library_text("S1").to_string(),
            line2: library_text("S2").to_string(),
            line3: library_text("S5").to_string(),
            line4: library_text("S14").to_string(),
        }
    } else {
        to_signal_lines(&select_observed_signals(&opts.active_signal_ids))
    };

    // RFS chain. The style summary feeds logging and future narrative
    // sections; the exported report carries the role fit only.
    let rsl_any = input
        .rsl
        .clone()
        .or_else(|| raw.get("rsl").cloned())
        .unwrap_or(Value::Null);
    let style = compute_style_summary(&StyleInputs {
        aas: cff8.aas,
        ctf: cff8.ctf,
        rmd: cff8.rmd,
        rdx: cff8.rdx,
        eds: cff8.eds,
        ifd: cff8.ifd,
        rsl_control: num_or0(rsl_any.get("rsl_control")),
        rsl_validation: num_or0(rsl_any.get("rsl_validation")),
        rsl_hypothesis: num_or0(rsl_any.get("rsl_hypothesis")),
        rsl_expansion: num_or0(rsl_any.get("rsl_expansion")),
    });
    debug!(pattern = %style.primary_pattern, "style summary computed");

    let role_configs = if opts.role_configs.is_empty() {
        default_role_configs()
    } else {
        opts.role_configs.clone()
    };
    let rfs: RfsReport = compute_group_top3(
        &RoleFitInput {
            axes: NeuprintAxes {
                analyticity: cff8.aas,
                flow: cff8.ctf,
                metacognition: cff8.rmd,
                authenticity: cff8.ifd,
            },
            arc_level: arc_level_from_short_name(&level.level.short_name),
        },
        &role_configs,
        true,
    )?;

    let report = Report {
        rsl: RslReport {
            level: level.level,
            fri,
            cohort,
            sri,
        },
        cff: CffReport {
            pattern,
            final_type,
            labels,
            values_0to1: values,
        },
        rc: RcReport {
            summary: rc_summary.summary,
            control_pattern: rc_summary.control_pattern,
            reliability_band: rc_summary.reliability_band,
            band_rationale: rc_summary.band_rationale,
            pattern_interpretation: rc_summary.pattern_interpretation,
            observed_structural_signals: observed,
            reasoning_control_distribution: distribution,
            structural_control_signals: structural,
        },
        rfs,
    };

    assert_report(&report)?;
    info!(
        level = %report.rsl.level.short_name,
        fri = report.rsl.fri.score,
        determination = %report.rc.reasoning_control_distribution.final_determination,
        "report derived"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> Value {
        json!({
            "raw_features": {
                "layer_0": {
                    "units": 5,
                    "unit_lengths": [140, 155, 120, 160, 150],
                    "per_unit": {
                        "transitions": [0, 1, 1, 0, 1],
                        "revisions": [0, 0, 1, 0, 0]
                    },
                    "claims": 4,
                    "reasons": 5,
                    "evidence": 3
                },
                "layer_1": { "sub_claims": 2, "warrants": 3, "structure_type": "tree" },
                "layer_2": {
                    "transitions": 3,
                    "transition_ok": 3,
                    "revisions": 1,
                    "revision_depth_sum": 1.5,
                    "belief_change": true,
                    "adjacency_links": 2
                },
                "layer_3": { "hedges": 2, "loops": 0, "intent_markers": 1, "drift_segments": 0 },
                "backend_reserved": { "kpf_sim": null, "tps_h": null }
            },
            "rsl": {
                "dimensions": [
                    { "code": "R3", "label": "Inference", "score_1to5": 4.0, "observation": "" },
                    { "code": "R4", "label": "Evidence", "score_1to5": 3.5, "observation": "" },
                    { "code": "R5", "label": "Counter", "score_1to5": 3.0, "observation": "" },
                    { "code": "R6", "label": "Revision", "score_1to5": 4.0, "observation": "" },
                    { "code": "R7", "label": "Framework", "score_1to5": 2.0, "observation": "" },
                    { "code": "R8", "label": "Expansion", "score_1to5": 2.0, "observation": "" }
                ]
            }
        })
    }

    #[test]
    fn test_full_pipeline_produces_complete_report() {
        let input: DeriveInput = serde_json::from_value(sample_input()).unwrap();
        let report = derive_all(&input, &DeriveOptions::default()).unwrap();

        assert!(report.rsl.level.short_name.starts_with('L'));
        assert!(report.rsl.fri.score > 0.0);
        assert!(!report.rsl.fri.interpretation.is_empty());
        assert!(report.rsl.cohort.percentile_0to1 > 0.0);
        assert!(!report.rsl.sri.interpretation.is_empty());

        assert_eq!(report.cff.labels.len(), 8);
        assert_eq!(report.cff.values_0to1.len(), 8);
        assert!(!report.cff.pattern.primary_label.is_empty());
        assert!(!report.cff.final_type.type_code.is_empty());

        assert!(!report.rc.summary.is_empty());
        assert!(report.rc.reasoning_control_distribution.human.ends_with('%'));
        assert!(!report.rc.observed_structural_signals.line1.is_empty());

        assert_eq!(report.rfs.top_groups.len(), 3);
        assert!(!report.rfs.recommended_roles_line.is_empty());
    }

    #[test]
    fn test_unwrapped_payload_is_accepted() {
        let mut v = sample_input();
        let raw = v["raw_features"].take();
        let mut obj = raw;
        obj["rsl"] = v["rsl"].take();
        let input: DeriveInput = serde_json::from_value(obj).unwrap();
        let report = derive_all(&input, &DeriveOptions::default()).unwrap();
        assert!(report.rsl.fri.score > 0.0);
    }

    #[test]
    fn test_backfill_overrides_caller_counts() {
        let mut v = sample_input();
        v["input_text"] = json!(
            "First, the plan works because the data supports it and adoption is growing. \
             Second, the costs stay manageable for the team across the next quarters. \
             In conclusion, we should proceed carefully with staged rollouts and reviews."
        );
        // Caller claims far more units than the text contains.
        v["raw_features"]["layer_0"]["units"] = json!(40);
        let input: DeriveInput = serde_json::from_value(v).unwrap();
        let report = derive_all(&input, &DeriveOptions::default()).unwrap();
        // The derived report must reflect the recomputed segmentation, which
        // keeps CFF density scores in a sane range.
        assert!(report.rsl.sri.score >= 0.0);
        for val in &report.cff.values_0to1 {
            if let crate::models::ScoreOrNa::Score(s) = val {
                assert!((0.0..=1.0).contains(s));
            }
        }
    }

    #[test]
    fn test_default_observed_signal_lines() {
        let input: DeriveInput = serde_json::from_value(sample_input()).unwrap();
        let report = derive_all(&input, &DeriveOptions::default()).unwrap();
        assert_eq!(
            report.rc.observed_structural_signals.line1,
            "Revision activity occurs at semantic decision boundaries."
        );
        assert_eq!(
            report.rc.observed_structural_signals.line3,
            "Consistency checks appear across structural transitions."
        );
    }

    #[test]
    fn test_active_signal_ids_drive_selection() {
        let input: DeriveInput = serde_json::from_value(sample_input()).unwrap();
        let opts = DeriveOptions {
            active_signal_ids: vec!["S3".to_string(), "S6".to_string()],
            ..DeriveOptions::default()
        };
        let report = derive_all(&input, &opts).unwrap();
        assert!(!report.rc.observed_structural_signals.line1.is_empty());
        assert!(!report.rc.observed_structural_signals.line2.is_empty());
        assert!(report.rc.observed_structural_signals.line3.is_empty());
    }

    #[test]
    fn test_empty_input_still_yields_contractual_report() {
        let input: DeriveInput = serde_json::from_value(json!({})).unwrap();
        let report = derive_all(&input, &DeriveOptions::default()).unwrap();
        assert_eq!(report.rsl.fri.score, 0.0);
        assert!(!report.rsl.level.short_name.is_empty());
        assert!(!report.rc.reasoning_control_distribution.final_determination.is_empty());
    }

    #[test]
    fn test_unknown_role_id_is_a_configuration_error() {
        use crate::models::{RoleConfig, RoleMinRequirements};
        let input: DeriveInput = serde_json::from_value(sample_input()).unwrap();
        let opts = DeriveOptions {
            role_configs: vec![RoleConfig {
                role_code: "RFS-X-001".to_string(),
                job_id: "nonexistent_job".to_string(),
                neuprint_axes_weights: crate::models::NeuprintAxes {
                    analyticity: 1.0,
                    ..Default::default()
                },
                min_requirements: RoleMinRequirements {
                    arc_level: 1.0,
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..DeriveOptions::default()
        };
        let err = derive_all(&input, &opts).unwrap_err();
        assert!(matches!(err, DeriveError::Configuration(_)));
    }

    #[test]
    fn test_arc_level_extraction() {
        assert_eq!(arc_level_from_short_name("L4"), 4.0);
        assert_eq!(arc_level_from_short_name("Level L2 (Systematic)"), 2.0);
        assert_eq!(arc_level_from_short_name("unknown"), 3.0);
    }
}
