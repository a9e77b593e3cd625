//! Built-in task handlers.
//!
//! Each handler speaks to the model through the injected provider and
//! pulls its own specialized context from the memory manager. They all
//! go through the `TaskHandler::process` boundary, so a failure inside
//! any of them is recorded on the state rather than raised.

mod calendar;
mod email;
mod idea;
mod tools;

pub use calendar::CalendarHandler;
pub use email::EmailHandler;
pub use idea::IdeaHandler;
pub use tools::ToolAgentHandler;
