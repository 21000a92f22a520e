//! The conversation with the assistant.
//!
//! [`ChatSession`] owns the message log of one conversation and enforces at
//! most one in-flight send.

mod session;

pub use session::{
    CLEARED_GREETING, ChatResponse, ChatSession, GREETING, SessionStats, transcript_text,
};
