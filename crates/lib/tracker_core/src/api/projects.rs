//! Mini-project CRUD.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ApiError;
use crate::models::{
    Identity, NewProject, Project, ProjectDetails, ProjectEdits, ProjectFilter, ProjectUpdate,
};
use crate::transport::{ApiClient, ApiRequest};

pub const PROJECTS_PATH: &str = "mini-projects/";

fn project_path(id: i64) -> String {
    format!("{PROJECTS_PATH}{id}/")
}

/// `GET /mini-projects/`. Trainees only ever receive their assigned records.
pub async fn list(
    client: &ApiClient,
    filter: &ProjectFilter,
    cancel: &CancellationToken,
) -> Result<Vec<Project>, ApiError> {
    let request = filter
        .query_pairs()
        .into_iter()
        .fold(ApiRequest::get(PROJECTS_PATH), |req, (k, v)| req.query(k, v));
    Ok(client.fetch(&request, cancel).await?)
}

/// Look a project up in the caller's listing.
pub async fn find(
    client: &ApiClient,
    id: i64,
    cancel: &CancellationToken,
) -> Result<Project, ApiError> {
    list(client, &ProjectFilter::default(), cancel)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or(ApiError::NotFound(id))
}

/// `POST /mini-projects/`.
pub async fn create(
    client: &ApiClient,
    project: &NewProject,
    cancel: &CancellationToken,
) -> Result<Project, ApiError> {
    project.validate().map_err(ApiError::Validation)?;
    let request = ApiRequest::post(PROJECTS_PATH).json(project)?;
    Ok(client.fetch(&request, cancel).await?)
}

/// `PUT /mini-projects/{id}/`.
pub async fn update(
    client: &ApiClient,
    id: i64,
    update: &ProjectUpdate,
    cancel: &CancellationToken,
) -> Result<Project, ApiError> {
    update.validate().map_err(ApiError::Validation)?;
    let request = ApiRequest::put(project_path(id)).json(update)?;
    Ok(client.fetch(&request, cancel).await?)
}

/// `DELETE /mini-projects/{id}/`.
pub async fn delete(
    client: &ApiClient,
    id: i64,
    cancel: &CancellationToken,
) -> Result<(), ApiError> {
    client
        .send(&ApiRequest::delete(project_path(id)), cancel)
        .await?;
    debug!(id, "project deleted");
    Ok(())
}

/// Build the role-scoped update payload for `identity` editing `current`.
///
/// Trainees may only change status and progress of projects assigned to
/// them; trainers send the full editable record.
pub fn prepare_update(
    identity: &Identity,
    current: &Project,
    edits: ProjectEdits,
) -> Result<ProjectUpdate, ApiError> {
    if !identity.can_edit(current) {
        return Err(ApiError::Forbidden(format!(
            "project {} is not assigned to {}",
            current.id, identity.username
        )));
    }
    if edits.is_empty() {
        return Err(ApiError::Validation("nothing to update".into()));
    }

    let details = if identity.is_trainer {
        Some(ProjectDetails {
            title: edits.title.unwrap_or_else(|| current.title.clone()),
            description: edits
                .description
                .or_else(|| current.description.clone())
                .unwrap_or_default(),
            priority: edits.priority.unwrap_or(current.priority),
            due_date: edits.due_date.unwrap_or(current.due_date),
        })
    } else if edits.touches_details() {
        return Err(ApiError::Forbidden(
            "trainees may only change status and progress".into(),
        ));
    } else {
        None
    };

    let update = ProjectUpdate {
        status: edits.status.unwrap_or(current.status),
        progress: edits.progress.unwrap_or(current.progress),
        details,
    };
    update.validate().map_err(ApiError::Validation)?;
    Ok(update)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use reqwest::Method;
    use serde_json::json;
    use tokio::sync::broadcast;

    use super::*;
    use crate::config::ClientConfig;
    use crate::models::{Priority, Status};
    use crate::token_store::MemoryTokenStore;
    use crate::transport::testing::{ScriptedBackend, Step};

    const PROJECT_JSON: &str = r#"{
        "id": 4, "title": "Parser", "description": "tokens",
        "assigned_to": {"id": 5, "username": "ana"},
        "priority": "medium", "status": "pending",
        "due_date": "2025-02-01", "progress": 10
    }"#;

    fn client_with(steps: Vec<Step>) -> (ApiClient, Arc<ScriptedBackend>) {
        let backend = ScriptedBackend::new(steps);
        let (tx, _rx) = broadcast::channel(4);
        let client = ApiClient::new(
            ClientConfig::new("http://tracker.test/app").unwrap(),
            backend.clone(),
            Arc::new(MemoryTokenStore::with_token("t")),
            tx,
        );
        (client, backend)
    }

    fn current() -> Project {
        serde_json::from_str(PROJECT_JSON).unwrap()
    }

    fn trainer() -> Identity {
        Identity {
            id: 1,
            username: "lead".into(),
            email: "lead@example.com".into(),
            is_trainer: true,
        }
    }

    fn trainee(id: i64) -> Identity {
        Identity {
            id,
            username: format!("trainee{id}"),
            email: String::new(),
            is_trainer: false,
        }
    }

    #[tokio::test]
    async fn list_sends_filters_as_query() {
        let (client, backend) = client_with(vec![Step::reply(200, &format!("[{PROJECT_JSON}]"))]);
        let filter = ProjectFilter {
            status: Some(Status::Pending),
            priority: Some(Priority::High),
            due_date: None,
        };
        let projects = list(&client, &filter, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(
            backend.seen()[0].call.url.as_str(),
            "http://tracker.test/app/mini-projects/?status=pending&priority=high"
        );
    }

    #[tokio::test]
    async fn find_reports_missing_project() {
        let (client, _) = client_with(vec![Step::reply(200, "[]")]);
        let err = find(&client, 99, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(99)));
    }

    #[tokio::test]
    async fn create_posts_payload() {
        let (client, backend) = client_with(vec![Step::reply(201, PROJECT_JSON)]);
        let mut project = NewProject::new("Parser");
        project.assigned_to_id = Some(5);
        let created = create(&client, &project, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(created.id, 4);

        let seen = &backend.seen()[0];
        assert_eq!(seen.call.method, Method::POST);
        assert_eq!(seen.call.body.as_ref().unwrap()["assigned_to_id"], json!(5));
    }

    #[tokio::test]
    async fn create_rejects_short_title_without_request() {
        let (client, backend) = client_with(vec![]);
        let err = create(&client, &NewProject::new("ab"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn update_puts_to_project_path() {
        let (client, backend) = client_with(vec![Step::reply(200, PROJECT_JSON)]);
        let payload = ProjectUpdate {
            status: Status::InProgress,
            progress: 50,
            details: None,
        };
        update(&client, 4, &payload, &CancellationToken::new())
            .await
            .unwrap();
        let seen = &backend.seen()[0];
        assert_eq!(seen.call.method, Method::PUT);
        assert_eq!(seen.call.url.path(), "/app/mini-projects/4/");
        assert_eq!(
            seen.call.body,
            Some(json!({"status": "inprogress", "progress": 50}))
        );
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let (client, backend) = client_with(vec![Step::reply(204, "")]);
        delete(&client, 4, &CancellationToken::new()).await.unwrap();
        assert_eq!(backend.seen()[0].call.method, Method::DELETE);
    }

    #[test]
    fn trainee_update_is_scoped_to_status_and_progress() {
        let edits = ProjectEdits {
            status: Some(Status::Completed),
            progress: Some(100),
            ..Default::default()
        };
        let update = prepare_update(&trainee(5), &current(), edits).unwrap();
        assert_eq!(update.details, None);
        assert_eq!(update.status, Status::Completed);
        assert_eq!(update.progress, 100);
    }

    #[test]
    fn trainee_keeps_current_values_for_untouched_fields() {
        let edits = ProjectEdits {
            progress: Some(60),
            ..Default::default()
        };
        let update = prepare_update(&trainee(5), &current(), edits).unwrap();
        assert_eq!(update.status, Status::Pending);
        assert_eq!(update.progress, 60);
    }

    #[test]
    fn trainee_cannot_touch_trainer_fields() {
        let edits = ProjectEdits {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let err = prepare_update(&trainee(5), &current(), edits).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn trainee_cannot_edit_unassigned_project() {
        let edits = ProjectEdits {
            status: Some(Status::Completed),
            ..Default::default()
        };
        let err = prepare_update(&trainee(6), &current(), edits).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn trainer_update_merges_edits_over_current_record() {
        let edits = ProjectEdits {
            priority: Some(Priority::High),
            due_date: Some(NaiveDate::from_ymd_opt(2025, 4, 1)),
            ..Default::default()
        };
        let update = prepare_update(&trainer(), &current(), edits).unwrap();
        assert_eq!(
            update.details,
            Some(ProjectDetails {
                title: "Parser".into(),
                description: "tokens".into(),
                priority: Priority::High,
                due_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            })
        );
        assert_eq!(update.status, Status::Pending);
        assert_eq!(update.progress, 10);
    }

    #[test]
    fn trainer_can_clear_due_date() {
        let edits = ProjectEdits {
            due_date: Some(None),
            ..Default::default()
        };
        let update = prepare_update(&trainer(), &current(), edits).unwrap();
        let details = update.details.clone().unwrap();
        assert_eq!(details.due_date, None);
        assert_eq!(details.title, "Parser");
        assert_eq!(serde_json::to_value(&update).unwrap()["due_date"], json!(null));
    }

    #[test]
    fn trainee_cannot_clear_due_date() {
        let edits = ProjectEdits {
            due_date: Some(None),
            ..Default::default()
        };
        let err = prepare_update(&trainee(5), &current(), edits).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn update_hints_apply_before_sending() {
        let edits = ProjectEdits {
            progress: Some(150),
            ..Default::default()
        };
        let err = prepare_update(&trainer(), &current(), edits).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = prepare_update(&trainer(), &current(), ProjectEdits::default()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn unassigned_project_is_trainer_editable() {
        let mut project = current();
        project.assigned_to = None;
        let edits = ProjectEdits {
            status: Some(Status::InProgress),
            ..Default::default()
        };
        assert!(prepare_update(&trainer(), &project, edits).is_ok());
    }
}
