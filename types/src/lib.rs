//! Core domain types for Redink.
//!
//! This crate contains pure domain and wire types with no IO, no async, and
//! minimal dependencies. Everything here can be used from any layer of the
//! application. Wire structs mirror the server's snake_case JSON exactly;
//! the client never mutates server-owned fields, it replaces its local copy
//! wholesale on every fetch.

mod analysis;
mod ids;
mod user;
mod writing;

pub use analysis::{Analysis, AnalysisErrorCode, AnalysisStatus, SubmitReceipt};
pub use ids::{AnalysisId, UserId, WritingId};
pub use user::{AuthSession, Credentials, User};
pub use writing::{
    MAX_CONTENT_CHARS, MAX_TITLE_CHARS, NewWriting, ParseWritingTypeError, ValidationError,
    Writing, WritingPage, WritingPatch, WritingStatus, WritingType,
};
