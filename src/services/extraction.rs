// Extraction fill.
//
// Takes the caller-produced extraction record plus the raw input text,
// recomputes the deterministic backend fields (segmentation, unit lengths,
// lexical counts) and overwrites ONLY those fields. Everything else in the
// record is preserved, including unknown keys. Field names never change and
// no root `raw_features` key may survive.

use serde_json::{json, Map, Value};

use crate::services::lexical::compute_deterministic_counts;
use crate::services::segmenter::{compute_unit_lengths, segment_text};

fn normalize_array_length(arr: Option<&Value>, n: usize, fill: i64) -> Value {
    let mut out: Vec<Value> = arr
        .and_then(|v| v.as_array())
        .map(|a| a.iter().cloned().collect())
        .unwrap_or_default();
    out.truncate(n);
    while out.len() < n {
        out.push(json!(fill));
    }
    Value::Array(out)
}

fn ensure_object<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut().unwrap()
}

/// Overwrites the deterministic fields of an extraction record in place and
/// returns the final unit texts. Fields overwritten:
/// layer_0.{units, unit_lengths, per_unit.transitions, per_unit.revisions,
/// reasons}, layer_2.{revisions, revision_depth_sum}, layer_3.hedges, and the
/// root {adjacency_links, evidence_types, backend_reserved}.
pub fn fill_extraction_json(record: &mut Value, input_text: &str) -> Vec<String> {
    let unit_texts = segment_text(input_text);
    let unit_lengths = compute_unit_lengths(&unit_texts);
    let counts = compute_deterministic_counts(&unit_texts);
    let units = unit_texts.len();

    if !record.is_object() {
        *record = Value::Object(Map::new());
    }
    let root = record.as_object_mut().unwrap();

    let layer_0 = ensure_object(root, "layer_0");
    layer_0.insert("units".to_string(), json!(units));
    layer_0.insert("unit_lengths".to_string(), json!(unit_lengths));
    {
        let per_unit = ensure_object(layer_0, "per_unit");
        // Transitions stay caller-provided, only length-normalized.
        let transitions = normalize_array_length(per_unit.get("transitions"), units, 0);
        per_unit.insert("transitions".to_string(), transitions);
        per_unit.insert(
            "revisions".to_string(),
            json!(counts.per_unit_revisions),
        );
    }
    layer_0.insert("reasons".to_string(), json!(counts.reasons));

    let layer_2 = ensure_object(root, "layer_2");
    layer_2.insert("revisions".to_string(), json!(counts.revisions));
    layer_2.insert(
        "revision_depth_sum".to_string(),
        json!(counts.revision_depth_sum),
    );

    let layer_3 = ensure_object(root, "layer_3");
    layer_3.insert("hedges".to_string(), json!(counts.hedges));

    root.insert("adjacency_links".to_string(), json!(counts.adjacency_links));
    root.insert(
        "evidence_types".to_string(),
        json!(counts
            .evidence_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()),
    );

    root.insert(
        "backend_reserved".to_string(),
        json!({ "kpf_sim": null, "tps_h": null }),
    );

    // The record itself must not nest another raw-feature record.
    root.remove("raw_features");

    unit_texts
}
