pub mod context;
pub mod coordinator;
pub mod models;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use context::{ConversationContext, PhotoContext};
pub use coordinator::{IncidentCoordinator, IMAGE_STORED, INVALID_LOCATION, LOCATION_UPDATED, NO_GUIDELINES};
pub use models::{Incident, IncidentOutcome, IncidentReport};
pub use session::{Conversation, ConversationRegistry, DEFAULT_CONVERSATION_IDLE};
pub use tools::{tool_definitions, ToolCommand, ToolDefinition, ToolError, ToolHandler};
