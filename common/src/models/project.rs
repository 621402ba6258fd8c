//! Infrastructure project listing model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::row::{Fields, FromRawRow};

/// Category reported for every project.
pub const PROJECT_TYPE: &str = "Other";

/// One row of `master_web`, every field rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    /// `dbnum`
    pub id: String,
    /// `"Project Name"`
    pub road_name: String,
    /// `descript`
    pub description: String,
    pub county: String,
    /// `section`
    pub limits: String,
    pub aqcode: String,
    /// `lrpid`
    pub mrp: String,
    /// `mcds`
    pub municipalities: String,
    /// `"Type"`
    pub category: String,
    /// Always `"Other"`.
    #[serde(rename = "type")]
    pub project_type: String,
}

impl FromRawRow for Project {
    const RECORD: &'static str = "Project";
    const FIELD_COUNT: usize = 9;

    fn from_fields(mut fields: Fields<'_>) -> Self {
        Self {
            id: fields.take(),
            road_name: fields.take(),
            description: fields.take(),
            county: fields.take(),
            limits: fields.take(),
            aqcode: fields.take(),
            mrp: fields.take(),
            municipalities: fields.take(),
            category: fields.take(),
            project_type: PROJECT_TYPE.to_string(),
        }
    }
}
