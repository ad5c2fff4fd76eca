use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{DocumentId, DocumentStatus, ParsedDocId, QueueEntryId, QueueStatus, Station};

/// Body of `GET /api/gp/documents/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: DocumentRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, deserialize_with = "flexible_string")]
    pub id: Option<String>,
    pub status: DocumentStatus,
    #[serde(default, deserialize_with = "flexible_string")]
    pub parsed_doc_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl DocumentRecord {
    pub fn parsed_doc_id(&self) -> Option<ParsedDocId> {
        self.parsed_doc_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(ParsedDocId::from)
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.id.as_deref().map(DocumentId::from)
    }
}

/// Body of `GET /api/queue/current`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueResponse {
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
}

/// Body of `GET /api/queue/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub stats: QueueStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(default, deserialize_with = "flexible_entry_id")]
    pub id: QueueEntryId,
    #[serde(default, alias = "name")]
    pub patient_name: String,
    #[serde(default)]
    pub station: Station,
    #[serde(default)]
    pub status: QueueStatus,
    #[serde(default, deserialize_with = "flexible_string")]
    pub queue_number: Option<String>,
    #[serde(default)]
    pub reason_for_visit: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub wait_time_minutes: i64,
}

/// Server-side aggregates; read-only on the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_checked_in: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub waiting: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub in_progress: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_wait_time_minutes: f64,
}

/// Accepts a JSON string or number and keeps it as text. `null` maps to `None`.
pub fn flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value_as_text(&value)))
}

fn flexible_entry_id<'de, D>(deserializer: D) -> Result<QueueEntryId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flexible_string(deserializer)?
        .map(QueueEntryId::new)
        .unwrap_or_default())
}

/// Counts and durations: `null` or unparsable text becomes 0, fractions are rounded.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_f64().unwrap_or_default(),
        Some(serde_json::Value::String(text)) => text.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.round() as i64)
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.round().max(0.0) as u32)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer)
}

pub fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
