use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::models::history_event::EventAttributes;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Decoded(Value),
    Opaque(String),
}

/// Strict base64, then JSON. Anything else comes back unchanged as `Opaque`.
pub fn decode_payload(raw: &str) -> DisplayValue {
    let Ok(bytes) = STANDARD.decode(raw) else {
        return DisplayValue::Opaque(raw.to_string());
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => DisplayValue::Decoded(value),
        Err(_) => DisplayValue::Opaque(raw.to_string()),
    }
}

fn decode_inputs(inputs: &Option<Vec<String>>) -> Value {
    match inputs {
        Some(inputs) => Value::Array(
            inputs
                .iter()
                .map(|p| serde_json::to_value(decode_payload(p)).unwrap_or(Value::Null))
                .collect(),
        ),
        None => Value::Null,
    }
}

fn decode_optional(payload: &Option<String>) -> Value {
    match payload {
        Some(p) => serde_json::to_value(decode_payload(p)).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn format_timestamp(at: &OffsetDateTime) -> Value {
    match at.format(&Rfc3339) {
        Ok(s) => Value::String(s),
        Err(_) => Value::String(at.to_string()),
    }
}

// Decoding stays one level deep: decoded documents are not re-scanned for
// further payloads.
pub fn decode_attribute_payloads(attributes: &EventAttributes) -> Value {
    match attributes {
        EventAttributes::ExecutionStarted { name, inputs } => json!({
            "name": name,
            "inputs": decode_inputs(inputs),
        }),
        EventAttributes::ExecutionFinished { result, error } => json!({
            "result": decode_optional(result),
            "error": error,
        }),
        EventAttributes::ExecutionContinuedAsNew {
            result,
            continued_execution_id,
        } => json!({
            "result": decode_optional(result),
            "continued_execution_id": continued_execution_id,
        }),
        EventAttributes::ExecutionCanceled {} => json!({}),
        EventAttributes::ActivityScheduled { name, inputs } => json!({
            "name": name,
            "inputs": decode_inputs(inputs),
        }),
        EventAttributes::ActivityCompleted { result } => json!({
            "result": decode_optional(result),
        }),
        EventAttributes::ActivityFailed { error } => json!({ "error": error }),
        EventAttributes::TimerScheduled { at } => json!({ "at": format_timestamp(at) }),
        EventAttributes::TimerFired { at } => json!({ "at": format_timestamp(at) }),
        EventAttributes::TimerCanceled {} => json!({}),
        EventAttributes::SignalReceived { name, arg } => json!({
            "name": name,
            "arg": decode_optional(arg),
        }),
        EventAttributes::SideEffectResult { result } => json!({
            "result": decode_optional(result),
        }),
        EventAttributes::SubWorkflowScheduled {
            name,
            sub_workflow_instance_id,
            inputs,
        } => json!({
            "name": name,
            "sub_workflow_instance_id": sub_workflow_instance_id,
            "inputs": decode_inputs(inputs),
        }),
        EventAttributes::SubWorkflowCompleted { result } => json!({
            "result": decode_optional(result),
        }),
        EventAttributes::SubWorkflowFailed { error } => json!({ "error": error }),
        EventAttributes::Unknown { attributes, .. } => attributes.clone(),
    }
}
