//! Wire and domain models for the tracker API.
//!
//! All records are owned by the server; the client only deserialises them
//! for the duration of one operation.

pub mod identity;
pub mod project;
pub mod report;

pub use identity::{Identity, MeResponse, Role};
pub use project::{
    AssignedUser, NewProject, ParseEnumError, Priority, Project, ProjectDetails, ProjectEdits,
    ProjectFilter, ProjectUpdate, Status,
};
pub use report::{Report, StatusCount};
