mod asset;
mod compliance;
mod conversation_id;
mod message;
mod mode;
mod page;
mod tag;
mod version;
mod workflow;

pub use asset::Asset;
pub use compliance::{
    COMPLIANCE_CATEGORIES, CategoryInfo, ComplianceCategory, ComplianceCheck, ComplianceResult,
    Grade, OverallStats,
};
pub use conversation_id::ConversationId;
pub use message::{Message, Role};
pub use mode::{Mode, ModeParseError};
pub use page::Page;
pub use tag::Tag;
pub use version::{Version, VersionContent, VersionDiff};
pub use workflow::{WorkflowModel, WorkflowStart};
