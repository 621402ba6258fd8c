//! Shared data models.

pub mod comment;
pub mod project;
pub mod row;

pub use comment::Comment;
pub use project::Project;
pub use row::{map_rows, CellValue, Fields, FromRawRow, RawRow};
