//! Public comment listing model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::row::{Fields, FromRawRow};

/// One row of `comments`, every field rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub comment_id: String,
    /// `commentor`
    pub name: String,
    pub email: String,
    /// `tipcounty`
    pub county: String,
    /// `comments`
    pub comment_text: String,
    pub submitdate: String,
    pub mpms: String,
}

impl FromRawRow for Comment {
    const RECORD: &'static str = "Comment";
    const FIELD_COUNT: usize = 7;

    fn from_fields(mut fields: Fields<'_>) -> Self {
        Self {
            comment_id: fields.take(),
            name: fields.take(),
            email: fields.take(),
            county: fields.take(),
            comment_text: fields.take(),
            submitdate: fields.take(),
            mpms: fields.take(),
        }
    }
}
