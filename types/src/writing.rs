//! Writing resources and the client-side mirror of server validation rules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{UserId, WritingId};

/// Server-enforced bounds, mirrored here so callers can reject bad input
/// before spending a round trip. Counted in Unicode scalar values, matching
/// the server.
pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingType {
    Essay,
    CoverLetter,
}

impl WritingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WritingType::Essay => "essay",
            WritingType::CoverLetter => "cover_letter",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            WritingType::Essay => "Essay",
            WritingType::CoverLetter => "Cover letter",
        }
    }
}

impl fmt::Display for WritingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid writing type '{raw}'; expected 'essay' or 'cover_letter'")]
pub struct ParseWritingTypeError {
    raw: String,
}

impl FromStr for WritingType {
    type Err = ParseWritingTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "essay" => Ok(WritingType::Essay),
            "cover_letter" | "cover-letter" => Ok(WritingType::CoverLetter),
            _ => Err(ParseWritingTypeError { raw: s.to_owned() }),
        }
    }
}

/// Where a writing sits in its lifecycle: drafts are editable and
/// submittable, submitted writings are being analyzed, analyzed writings
/// have a finished analysis attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStatus {
    Draft,
    Submitted,
    Analyzed,
}

impl WritingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WritingStatus::Draft => "draft",
            WritingStatus::Submitted => "submitted",
            WritingStatus::Analyzed => "analyzed",
        }
    }

    /// Only drafts may be submitted for analysis; the server rejects the
    /// rest with a validation error.
    #[must_use]
    pub const fn is_submittable(self) -> bool {
        matches!(self, WritingStatus::Draft)
    }
}

impl fmt::Display for WritingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Writing {
    pub id: WritingId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: WritingType,
    pub title: String,
    pub content: String,
    pub status: WritingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// One page of the writings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingPage {
    pub writings: Vec<Writing>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must be between 1 and {MAX_TITLE_CHARS} characters")]
    TitleLength,
    #[error("content must be between 1 and {MAX_CONTENT_CHARS} characters")]
    ContentLength,
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleLength);
    }
    Ok(())
}

fn check_content(content: &str) -> Result<(), ValidationError> {
    let len = content.chars().count();
    if len == 0 || len > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentLength);
    }
    Ok(())
}

/// Request body for creating a writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWriting {
    #[serde(rename = "type")]
    pub kind: WritingType,
    pub title: String,
    pub content: String,
}

impl NewWriting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_content(&self.content)
    }
}

/// Request body for a partial update; unset fields are left untouched
/// server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<WritingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl WritingPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            check_title(title)?;
        }
        if let Some(content) = self.content.as_deref() {
            check_content(content)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.title.is_none() && self.content.is_none()
    }
}
