//! Client core for the clinic front desk: the document workflow controller,
//! the live queue poller, and the backend client both of them drive.

pub mod backend;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod presentation;
pub mod queue;
pub mod workflow;

pub use backend::{ClinicBackend, HttpClinicBackend};
pub use config::{load_settings, ClientSettings, ConfigError};
pub use error::ClientError;
pub use normalizer::{NormalizedPatientData, ParsedDocumentPayload};
pub use presentation::{Badge, BadgeColor, QueueBoard, QueueRow};
pub use queue::{PollSettings, QueueEvent, QueuePoller, QueueSnapshot, QueueSync};
pub use workflow::{
    AvailableActions, DocumentWorkflow, MissingValidationInterface, Notification,
    NotificationLevel, ValidationInterface, ValidationOutcome, ViewMode, WorkflowError,
    WorkflowEvent, WorkflowView,
};
