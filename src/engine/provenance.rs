//! PROV-O statements for a rendered output.
//!
//! One request becomes one `prov:Activity` that used the inputs, was
//! associated with the service as a `prov:SoftwareAgent`, and generated the
//! output entity. The nodes are emitted in expanded JSON-LD so they can be
//! appended to an expanded document or turned into triples.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::graph::{dct, prov, rdfs, xsd};
use crate::types::{FileProvenance, ProvenanceMetadata};

const ACTIVITY_ID: &str = "_:provActivity";
const AGENT_ID: &str = "_:provAgent";
const OUTPUT_ID: &str = "_:provOutput";

/// Expanded JSON-LD nodes describing how an output was produced.
pub fn provenance_nodes(metadata: &ProvenanceMetadata, agent_label: &str) -> Vec<Value> {
    let used_ids: Vec<String> = metadata
        .used
        .iter()
        .enumerate()
        .map(|(i, file)| file.uri.clone().unwrap_or_else(|| format!("_:provUsed{i}")))
        .collect();
    let output_id = metadata
        .output
        .as_ref()
        .map(|o| o.uri.clone().unwrap_or_else(|| OUTPUT_ID.to_string()));

    let mut activity = Map::new();
    activity.insert("@id".into(), json!(ACTIVITY_ID));
    activity.insert("@type".into(), json!([prov::ACTIVITY]));
    activity.insert(prov::STARTED_AT_TIME.into(), json!([date_time(metadata.start)]));
    if let Some(end) = metadata.end {
        activity.insert(prov::ENDED_AT_TIME.into(), json!([date_time(end)]));
    }
    activity.insert(prov::WAS_ASSOCIATED_WITH.into(), json!([{ "@id": AGENT_ID }]));
    if !used_ids.is_empty() {
        let used: Vec<Value> = used_ids.iter().map(|id| json!({ "@id": id })).collect();
        activity.insert(prov::USED.into(), Value::Array(used));
    }
    if let Some(id) = &output_id {
        activity.insert(prov::GENERATED.into(), json!([{ "@id": id }]));
    }

    let mut nodes = vec![
        Value::Object(activity),
        json!({
            "@id": AGENT_ID,
            "@type": [prov::SOFTWARE_AGENT],
            (rdfs::LABEL): [{ "@value": agent_label }],
        }),
    ];

    for (id, file) in used_ids.iter().zip(&metadata.used) {
        nodes.push(Value::Object(entity(id, file)));
    }

    if let (Some(id), Some(output)) = (output_id, &metadata.output) {
        let mut node = entity(&id, output);
        node.insert(prov::WAS_GENERATED_BY.into(), json!([{ "@id": ACTIVITY_ID }]));
        nodes.push(Value::Object(node));
    }

    nodes
}

fn entity(id: &str, file: &FileProvenance) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("@id".into(), json!(id));
    node.insert("@type".into(), json!([prov::ENTITY]));
    node.insert(dct::FORMAT.into(), json!([{ "@value": file.mime_type }]));
    if let Some(label) = &file.label {
        node.insert(rdfs::LABEL.into(), json!([{ "@value": label }]));
    }
    node
}

fn date_time(at: DateTime<Utc>) -> Value {
    json!({
        "@value": at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "@type": xsd::DATE_TIME,
    })
}
