pub mod config;
pub mod deadline;
pub mod error;
pub mod ids;
pub mod models;
pub mod relations;
pub mod storage;

// Re-export commonly used types
pub use config::{default_config_path, StoreConfig};
pub use deadline::{is_valid_deadline, validate_deadline, MAX_DEADLINE_ATTEMPTS};
pub use error::{Missing, Result, TrackerError};
pub use ids::mint_id;
pub use models::{
    Confirmation, Decline, Field, FieldValue, Fields, Links, Record, RecordKind, DATE_FORMAT,
    DEFAULT_STATE,
};
pub use relations::{
    delete_project, delete_task, link_task, repair_project_references, repair_task_references,
    unlink_task, update_task_list, DeleteReport, LinkChange,
};
pub use storage::RecordStore;
