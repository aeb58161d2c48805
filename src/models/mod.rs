// CogniPrint Data Models

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Raw feature layers ============

/// Structured measurements of a reasoning text, grouped in four layers.
///
/// Wire payloads are loosely typed, so this struct is built with
/// [`RawFeatures::from_value`] rather than plain serde: non-numeric entries
/// degrade to `None` (scalars) or `NaN` (array slots) instead of failing the
/// whole parse. Array slots keep their position so length checks against
/// `units` still see the original shape.
#[derive(Debug, Clone, Default)]
pub struct RawFeatures {
    pub layer_0: Layer0,
    pub layer_1: Layer1,
    pub layer_2: Layer2,
    pub layer_3: Layer3,
    pub adjacency_links: Option<f64>,
    pub backend_reserved: BackendReserved,
}

#[derive(Debug, Clone, Default)]
pub struct Layer0 {
    pub units: Option<f64>,
    pub unit_lengths: Option<Vec<f64>>,
    pub per_unit: PerUnit,
    pub claims: Option<f64>,
    pub reasons: Option<f64>,
    pub evidence: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct PerUnit {
    pub transitions: Option<Vec<f64>>,
    pub revisions: Option<Vec<f64>>,
    pub revision_depth: Option<Vec<f64>>,
    // Optional expansions; enable richer variance and rhythm features.
    pub claims: Option<Vec<f64>>,
    pub reasons: Option<Vec<f64>>,
    pub evidence: Option<Vec<f64>>,
    pub sub_claims: Option<Vec<f64>>,
    pub warrants: Option<Vec<f64>>,
    pub counterpoints: Option<Vec<f64>>,
    pub refutations: Option<Vec<f64>>,
    pub transition_ok: Option<Vec<f64>>,
    pub belief_change: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct Layer1 {
    pub sub_claims: Option<f64>,
    pub warrants: Option<f64>,
    pub counterpoints: Option<f64>,
    pub refutations: Option<f64>,
    pub structure_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Layer2 {
    pub transitions: Option<f64>,
    pub transition_ok: Option<f64>,
    pub revisions: Option<f64>,
    pub revision_depth_sum: Option<f64>,
    pub belief_change: Option<bool>,
    pub adjacency_links: Option<f64>,
    pub self_regulation: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Layer3 {
    pub intent_markers: Option<f64>,
    pub drift_segments: Option<f64>,
    pub hedges: Option<f64>,
    pub loops: Option<f64>,
    pub self_regulation_signals: Option<f64>,
}

/// Caller-reserved similarity measurements; absent means "not measured",
/// which is distinct from a measured zero everywhere downstream.
#[derive(Debug, Clone, Default)]
pub struct BackendReserved {
    pub kpf_sim: Option<f64>,
    pub tps_h: Option<f64>,
}

impl RawFeatures {
    pub fn from_value(v: &Value) -> Self {
        let l0 = field(v, "layer_0");
        let l1 = field(v, "layer_1");
        let l2 = field(v, "layer_2");
        let l3 = field(v, "layer_3");
        let per_unit = l0.and_then(|l| l.get("per_unit"));
        let reserved = field(v, "backend_reserved");

        RawFeatures {
            layer_0: Layer0 {
                units: num_in(l0, "units"),
                unit_lengths: arr_in(l0, "unit_lengths"),
                per_unit: PerUnit {
                    transitions: arr_in(per_unit, "transitions"),
                    revisions: arr_in(per_unit, "revisions"),
                    revision_depth: arr_in(per_unit, "revision_depth"),
                    claims: arr_in(per_unit, "claims"),
                    reasons: arr_in(per_unit, "reasons"),
                    evidence: arr_in(per_unit, "evidence"),
                    sub_claims: arr_in(per_unit, "sub_claims"),
                    warrants: arr_in(per_unit, "warrants"),
                    counterpoints: arr_in(per_unit, "counterpoints"),
                    refutations: arr_in(per_unit, "refutations"),
                    transition_ok: arr_in(per_unit, "transition_ok"),
                    belief_change: arr_in(per_unit, "belief_change"),
                },
                claims: num_in(l0, "claims"),
                reasons: num_in(l0, "reasons"),
                evidence: num_in(l0, "evidence"),
            },
            layer_1: Layer1 {
                sub_claims: num_in(l1, "sub_claims"),
                warrants: num_in(l1, "warrants"),
                counterpoints: num_in(l1, "counterpoints"),
                refutations: num_in(l1, "refutations"),
                structure_type: str_in(l1, "structure_type"),
            },
            layer_2: Layer2 {
                transitions: num_in(l2, "transitions"),
                transition_ok: num_in(l2, "transition_ok"),
                revisions: num_in(l2, "revisions"),
                revision_depth_sum: num_in(l2, "revision_depth_sum"),
                belief_change: bool_in(l2, "belief_change"),
                adjacency_links: num_in(l2, "adjacency_links"),
                self_regulation: num_in(l2, "self_regulation"),
            },
            layer_3: Layer3 {
                intent_markers: num_in(l3, "intent_markers"),
                drift_segments: num_in(l3, "drift_segments"),
                hedges: num_in(l3, "hedges"),
                loops: num_in(l3, "loops"),
                self_regulation_signals: num_in(l3, "self_regulation_signals"),
            },
            adjacency_links: value_num(v.get("adjacency_links")),
            backend_reserved: BackendReserved {
                kpf_sim: num_in(reserved, "kpf_sim"),
                tps_h: num_in(reserved, "tps_h"),
            },
        }
    }
}

fn field<'a>(v: &'a Value, key: &str) -> Option<&'a Value> {
    v.get(key).filter(|x| x.is_object())
}

fn num_in(obj: Option<&Value>, key: &str) -> Option<f64> {
    value_num(obj.and_then(|o| o.get(key)))
}

fn str_in(obj: Option<&Value>, key: &str) -> Option<String> {
    obj.and_then(|o| o.get(key))
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
}

fn bool_in(obj: Option<&Value>, key: &str) -> Option<bool> {
    value_bool(obj.and_then(|o| o.get(key)))
}

fn arr_in(obj: Option<&Value>, key: &str) -> Option<Vec<f64>> {
    let arr = obj.and_then(|o| o.get(key))?.as_array()?;
    Some(
        arr.iter()
            .map(|x| value_num(Some(x)).unwrap_or(f64::NAN))
            .collect(),
    )
}

/// Lenient numeric read: numbers pass through, numeric strings are parsed,
/// everything else is absent.
pub(crate) fn value_num(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Lenient boolean read mirroring common wire encodings: booleans pass
/// through, positive numbers are true, and a handful of string spellings are
/// recognized. Unrecognized non-empty strings count as true.
pub(crate) fn value_bool(v: Option<&Value>) -> Option<bool> {
    match v? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()).map(|x| x > 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            if s.is_empty() {
                return None;
            }
            match s.as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => Some(true),
            }
        }
        Value::Null => None,
        _ => None,
    }
}

// ============ Rubric dimensions & signal quotes ============

/// One scored rubric dimension supplied by the upstream extraction step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RslDimension {
    pub code: String,
    pub label: String,
    pub score_1to5: f64,
    pub observation: String,
}

/// Candidate evidence quotes for the level-signal classifiers. Entries are
/// kept as raw values; non-string entries are dropped during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSignalsQuotes {
    #[serde(rename = "A7_value_aware_quote_candidates")]
    pub a7_value_aware_quote_candidates: Vec<Value>,
    #[serde(rename = "A8_perspective_flexible_quote_candidates")]
    pub a8_perspective_flexible_quote_candidates: Vec<Value>,
    pub self_repair_quote_candidates: Vec<Value>,
    pub framework_generation_quote_candidates: Vec<Value>,
}

// ============ Signal states ============

/// Three-state evidence classification for level signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalTri {
    Present,
    Emerging,
    #[serde(rename = "Not_evidenced")]
    NotEvidenced,
}

/// Two-state evidence classification for level signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalBin {
    Present,
    #[serde(rename = "Not_evidenced")]
    NotEvidenced,
}

// ============ Derived vectors ============

/// The eight control-fingerprint axes after neutral-midpoint substitution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoreAxes {
    pub aas: f64,
    pub ctf: f64,
    pub rmd: f64,
    pub rdx: f64,
    pub eds: f64,
    pub ifd: f64,
    pub kpf_sim: f64,
    pub tps_h: f64,
}

/// Control-feature vector consumed by the distribution engine, all 0..1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cfv {
    pub aas: f64,
    pub ctf: f64,
    pub rmd: f64,
    pub rdx: f64,
    pub eds: f64,
    pub hi: f64,
    pub tps_hist: f64,
    pub ifd: f64,
}

impl Cfv {
    /// Feature iteration order used by the logistic combiner.
    pub const KEYS: [&'static str; 8] =
        ["aas", "ctf", "rmd", "rdx", "eds", "hi", "tps_hist", "ifd"];

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "aas" => Some(self.aas),
            "ctf" => Some(self.ctf),
            "rmd" => Some(self.rmd),
            "rdx" => Some(self.rdx),
            "eds" => Some(self.eds),
            "hi" => Some(self.hi),
            "tps_hist" => Some(self.tps_hist),
            "ifd" => Some(self.ifd),
            _ => None,
        }
    }
}

// ============ Options ============

/// Logistic model for the reasoning-control distribution. Coefficients are
/// keyed by [`Cfv::KEYS`] names; missing keys contribute nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticModel {
    pub beta0: f64,
    pub betas: std::collections::BTreeMap<String, f64>,
    pub z_clip: Option<f64>,
}

/// User-facing axis scores for role fit, all 0..1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuprintAxes {
    pub analyticity: f64,
    pub flow: f64,
    pub metacognition: f64,
    pub authenticity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMinRequirements {
    pub arc_level: f64,
    pub analyticity: Option<f64>,
    pub flow: Option<f64>,
    pub metacognition: Option<f64>,
    pub authenticity: Option<f64>,
}

/// One scorable role. `neuprint_axes_weights` must sum to 1.0 and `job_id`
/// must resolve against the canonical job index; both are validated at use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub role_code: String,
    pub job_id: String,
    pub onet_code: String,
    pub oecd_core_skills: Vec<String>,
    pub neuprint_axes_weights: NeuprintAxes,
    pub min_requirements: RoleMinRequirements,
}

/// Caller configuration for a derivation run. Everything is optional; the
/// defaults reproduce the reference behavior for a bare call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveOptions {
    /// Reference score list for the cohort percentile. Empty means "use the
    /// built-in default curve".
    pub cohort_fri_list: Vec<f64>,
    /// Calibrated distribution model; absent selects the heuristic path.
    pub rc_logistic_model: Option<LogisticModel>,
    /// Active observed-signal IDs (S1..S18). Empty selects the canonical
    /// four-line default.
    pub active_signal_ids: Vec<String>,
    /// Role catalog for the fit section. Empty selects the minimal built-in
    /// catalog.
    pub role_configs: Vec<RoleConfig>,
}

// ============ Input envelope ============

/// Raw derivation input. Callers send either a wrapper object carrying
/// `raw_features` plus rubric data, or the raw-feature record itself; both
/// shapes are accepted, so unrecognized fields are retained.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeriveInput {
    pub raw_features: Option<Value>,
    pub raw: Option<Value>,
    #[serde(rename = "rawFeatures")]
    pub raw_features_alias: Option<Value>,
    pub rsl: Option<Value>,
    pub raw_signals_quotes: Option<Value>,
    pub input_text: Option<String>,
    pub text: Option<String>,
    pub submitted_text: Option<String>,
    pub essay_text: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl DeriveInput {
    /// The raw-feature record: an explicit wrapper field when present,
    /// otherwise the payload itself.
    pub fn raw_value(&self) -> Value {
        if let Some(v) = self
            .raw_features
            .as_ref()
            .or(self.raw.as_ref())
            .or(self.raw_features_alias.as_ref())
        {
            return v.clone();
        }
        let mut map = self.rest.clone();
        if let Some(rsl) = &self.rsl {
            map.insert("rsl".to_string(), rsl.clone());
        }
        if let Some(q) = &self.raw_signals_quotes {
            map.insert("raw_signals_quotes".to_string(), q.clone());
        }
        Value::Object(map)
    }

    /// Submitted source text, first spelling that is present.
    pub fn source_text(&self) -> String {
        self.input_text
            .as_deref()
            .or(self.text.as_deref())
            .or(self.submitted_text.as_deref())
            .or(self.essay_text.as_deref())
            .unwrap_or("")
            .to_string()
    }
}

// ============ Report ============

/// A score slot that can carry "not measured" through to the UI list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOrNa {
    Score(f64),
    NotAvailable,
}

impl Serialize for ScoreOrNa {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScoreOrNa::Score(x) => serializer.serialize_f64(*x),
            ScoreOrNa::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelInfo {
    pub short_name: String,
    pub full_name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreInterpretation {
    pub score: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CohortInfo {
    pub percentile_0to1: f64,
    pub top_percent_label: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RslReport {
    pub level: LevelInfo,
    pub fri: ScoreInterpretation,
    pub cohort: CohortInfo,
    pub sri: ScoreInterpretation,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternDefinition {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternInfo {
    pub primary_label: String,
    pub secondary_label: String,
    pub definition: PatternDefinition,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalTypeInfo {
    pub label: String,
    pub type_code: String,
    pub chip_label: String,
    pub confidence: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CffReport {
    pub pattern: PatternInfo,
    pub final_type: FinalTypeInfo,
    pub labels: Vec<String>,
    pub values_0to1: Vec<ScoreOrNa>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservedSignalLines {
    #[serde(rename = "1")]
    pub line1: String,
    #[serde(rename = "2")]
    pub line2: String,
    #[serde(rename = "3")]
    pub line3: String,
    #[serde(rename = "4")]
    pub line4: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlDistribution {
    #[serde(rename = "Human")]
    pub human: String,
    #[serde(rename = "Hybrid")]
    pub hybrid: String,
    #[serde(rename = "AI")]
    pub ai: String,
    pub final_determination: String,
    pub determination_sentence: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StructuralControlSignals {
    pub structural_variance: f64,
    pub human_rhythm_index: f64,
    pub transition_flow: f64,
    pub revision_depth: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RcReport {
    pub summary: String,
    pub control_pattern: String,
    pub reliability_band: String,
    pub band_rationale: String,
    pub pattern_interpretation: String,
    pub observed_structural_signals: ObservedSignalLines,
    pub reasoning_control_distribution: ControlDistribution,
    pub structural_control_signals: StructuralControlSignals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopGroup {
    pub group_name: String,
    pub percent: u32,
    pub roles: Vec<String>,
    pub recommended_role: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RfsReport {
    pub summary_lines: Vec<String>,
    pub top_groups: Vec<TopGroup>,
    pub recommended_roles_top3: Vec<String>,
    pub recommended_roles_line: String,
    pub pattern_interpretation: String,
}

/// The complete four-section report. Field sets are closed; serialization
/// produces the exact output contract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub rsl: RslReport,
    pub cff: CffReport,
    pub rc: RcReport,
    pub rfs: RfsReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_features_lenient_parse() {
        let v = json!({
            "layer_0": { "units": 4, "unit_lengths": [120, "x", 80], "claims": "3" },
            "layer_2": { "belief_change": "yes", "transitions": 5 },
            "backend_reserved": { "kpf_sim": null, "tps_h": 0.4 }
        });
        let raw = RawFeatures::from_value(&v);
        assert_eq!(raw.layer_0.units, Some(4.0));
        assert_eq!(raw.layer_0.claims, Some(3.0));
        let lens = raw.layer_0.unit_lengths.as_ref().unwrap();
        assert_eq!(lens.len(), 3);
        assert!(lens[1].is_nan());
        assert_eq!(raw.layer_2.belief_change, Some(true));
        assert_eq!(raw.backend_reserved.kpf_sim, None);
        assert_eq!(raw.backend_reserved.tps_h, Some(0.4));
    }

    #[test]
    fn test_derive_input_unwrapped_payload() {
        let input: DeriveInput = serde_json::from_value(json!({
            "layer_0": { "units": 2 },
            "rsl": { "dimensions": [] },
            "input_text": "First, a claim."
        }))
        .unwrap();
        let raw = input.raw_value();
        assert_eq!(raw["layer_0"]["units"], json!(2));
        assert!(raw.get("rsl").is_some());
        assert_eq!(input.source_text(), "First, a claim.");
    }

    #[test]
    fn test_derive_input_wrapped_payload() {
        let input: DeriveInput = serde_json::from_value(json!({
            "raw_features": { "layer_0": { "units": 7 } },
            "text": "body"
        }))
        .unwrap();
        assert_eq!(input.raw_value()["layer_0"]["units"], json!(7));
        assert_eq!(input.source_text(), "body");
    }

    #[test]
    fn test_score_or_na_serialization() {
        let v = serde_json::to_value(vec![ScoreOrNa::Score(0.25), ScoreOrNa::NotAvailable]).unwrap();
        assert_eq!(v, json!([0.25, "N/A"]));
    }

    #[test]
    fn test_signal_state_wire_strings() {
        assert_eq!(
            serde_json::to_value(SignalTri::NotEvidenced).unwrap(),
            json!("Not_evidenced")
        );
        assert_eq!(serde_json::to_value(SignalBin::Present).unwrap(), json!("Present"));
    }

    #[test]
    fn test_options_defaults() {
        let opts: DeriveOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.cohort_fri_list.is_empty());
        assert!(opts.rc_logistic_model.is_none());
        assert!(opts.active_signal_ids.is_empty());
        assert!(opts.role_configs.is_empty());
    }
}
