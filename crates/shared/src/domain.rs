use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id_newtype!(QueueEntryId);
string_id_newtype!(DocumentId);
string_id_newtype!(ParsedDocId);

/// Lifecycle of a scanned document as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    /// OCR/structure extracted, fields not yet structured.
    Parsed,
    /// Structured fields available, pending human review.
    Extracted,
    /// Reviewed and committed.
    Approved,
    Other(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parsed => "parsed",
            Self::Extracted => "extracted",
            Self::Approved => "approved",
            Self::Other(raw) => raw,
        }
    }

    /// Whether structured fields exist server-side for this document.
    pub fn has_extraction(&self) -> bool {
        matches!(self, Self::Extracted | Self::Approved)
    }
}

impl From<String> for DocumentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "parsed" => Self::Parsed,
            "extracted" => Self::Extracted,
            "approved" => Self::Approved,
            _ => Self::Other(value),
        }
    }
}

impl From<DocumentStatus> for String {
    fn from(value: DocumentStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Physical service point a queue entry is currently assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Station {
    Vitals,
    Consultation,
    Dispensary,
    Other(String),
}

impl Station {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vitals => "vitals",
            Self::Consultation => "consultation",
            Self::Dispensary => "dispensary",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for Station {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Station {
    fn from(value: String) -> Self {
        match value.as_str() {
            "vitals" => Self::Vitals,
            "consultation" => Self::Consultation,
            "dispensary" => Self::Dispensary,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for Station {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<Station> for String {
    fn from(value: Station) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum QueueStatus {
    Waiting,
    InVitals,
    InConsultation,
    InDispensary,
    Other(String),
}

impl QueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Waiting => "waiting",
            Self::InVitals => "in_vitals",
            Self::InConsultation => "in_consultation",
            Self::InDispensary => "in_dispensary",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for QueueStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for QueueStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "waiting" => Self::Waiting,
            "in_vitals" => Self::InVitals,
            "in_consultation" => Self::InConsultation,
            "in_dispensary" => Self::InDispensary,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for QueueStatus {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<QueueStatus> for String {
    fn from(value: QueueStatus) -> Self {
        value.as_str().to_string()
    }
}
