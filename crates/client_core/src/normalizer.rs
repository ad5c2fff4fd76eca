//! Flattening of the parsed-document payload into [`NormalizedPatientData`].
//!
//! The payload carries two sources: the `microservice_response.data`
//! envelope with processing-session metadata, and the top-level `data`
//! object with the extracted fields. Either may be missing at any level;
//! missing pieces resolve to empty defaults instead of failing the load.

use serde::Serialize;
use serde_json::{Map, Value};
use shared::{
    domain::{DocumentId, ParsedDocId},
    protocol::{value_as_text, DocumentRecord},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document {document_id} has no parsed document id")]
pub struct IncompleteDocumentError {
    pub document_id: DocumentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsed document payload must be a JSON object, got {found}")]
pub struct PayloadDecodeError {
    pub found: &'static str,
}

/// Decoded parsed-document payload with every optional level defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocumentPayload {
    pub extracted_data: Map<String, Value>,
    pub scanned_doc_id: Option<String>,
    pub validation_session_id: Option<String>,
    pub chunks: Vec<Value>,
}

/// The only document shape consumed past the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPatientData {
    pub document_id: DocumentId,
    pub parsed_doc_id: ParsedDocId,
    pub scanned_doc_id: Option<String>,
    pub validation_session_id: Option<String>,
    pub extracted_data: Map<String, Value>,
    pub chunks: Vec<Value>,
    pub file_path: Option<String>,
}

pub fn decode_payload(raw: &Value) -> Result<ParsedDocumentPayload, PayloadDecodeError> {
    let Some(root) = raw.as_object() else {
        return Err(PayloadDecodeError {
            found: json_kind(raw),
        });
    };

    let envelope = root
        .get("microservice_response")
        .and_then(Value::as_object)
        .and_then(|response| response.get("data"))
        .and_then(Value::as_object);

    let envelope_field = |key: &str| envelope.and_then(|data| data.get(key));

    Ok(ParsedDocumentPayload {
        extracted_data: root
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        scanned_doc_id: envelope_field("scanned_doc_id").and_then(value_as_text),
        validation_session_id: envelope_field("validation_session_id").and_then(value_as_text),
        chunks: envelope_field("chunks")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Builds the normalized shape. A document without a parsed id is
/// incomplete; an absent payload yields empty extraction fields.
pub fn normalize(
    document_id: &DocumentId,
    record: &DocumentRecord,
    payload: Option<&ParsedDocumentPayload>,
) -> Result<NormalizedPatientData, IncompleteDocumentError> {
    let parsed_doc_id = record
        .parsed_doc_id()
        .ok_or_else(|| IncompleteDocumentError {
            document_id: document_id.clone(),
        })?;

    let payload = payload.cloned().unwrap_or_default();

    Ok(NormalizedPatientData {
        document_id: document_id.clone(),
        parsed_doc_id,
        scanned_doc_id: payload.scanned_doc_id,
        validation_session_id: payload.validation_session_id,
        extracted_data: payload.extracted_data,
        chunks: payload.chunks,
        file_path: record.file_path.clone(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
