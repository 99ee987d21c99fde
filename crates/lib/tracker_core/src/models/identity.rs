//! Authenticated identity.

use serde::{Deserialize, Serialize};

use super::project::Project;

/// Body of `GET /auth/me/`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_trainer: Option<bool>,
}

/// The user a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_trainer: bool,
}

impl From<MeResponse> for Identity {
    fn from(me: MeResponse) -> Self {
        Self {
            id: me.id,
            username: me.username,
            email: me.email.unwrap_or_default(),
            is_trainer: me.is_trainer.unwrap_or(false),
        }
    }
}

/// Role derived from `is_trainer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Trainer,
    Trainee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trainer => write!(f, "trainer"),
            Self::Trainee => write!(f, "trainee"),
        }
    }
}

impl Identity {
    pub fn role(&self) -> Role {
        if self.is_trainer {
            Role::Trainer
        } else {
            Role::Trainee
        }
    }

    /// Trainers may create, delete and report; trainees may not.
    pub fn can_manage_projects(&self) -> bool {
        self.is_trainer
    }

    /// Trainers edit anything; trainees only what is assigned to them.
    pub fn can_edit(&self, project: &Project) -> bool {
        self.is_trainer || project.assignee_id() == Some(self.id)
    }
}
