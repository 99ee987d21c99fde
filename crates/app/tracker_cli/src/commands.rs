//! Command handlers. Every gated command restores the session first.

use std::future::Future;
use std::io::{self, BufRead, Write};

use log::debug;
use tokio_util::sync::CancellationToken;
use tracker_core::api::{ApiError, projects, reports};
use tracker_core::models::{Identity, NewProject, ProjectEdits, ProjectFilter};
use tracker_core::{SessionSignal, SessionState, SessionStore};

use crate::cli::{Commands, CreateArgs, ProjectCommands, UpdateArgs};
use crate::{Error, Result, render};

pub struct Context {
    store: SessionStore,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(store: SessionStore, cancel: CancellationToken) -> Self {
        Self { store, cancel }
    }

    async fn require_identity(&self) -> Result<Identity> {
        match self.store.restore(&self.cancel).await {
            SessionState::Authenticated(identity) => Ok(identity),
            _ if self.cancel.is_cancelled() => Err(Error::Canceled),
            _ => Err(Error::NotLoggedIn),
        }
    }

    async fn require_trainer(&self) -> Result<Identity> {
        let identity = self.require_identity().await?;
        if !identity.can_manage_projects() {
            return Err(Error::AccessDenied(format!(
                "{} is not a trainer",
                identity.username
            )));
        }
        Ok(identity)
    }

    /// Await a domain call, reporting a 401 that ended the session as such.
    async fn guarded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, ApiError>>,
    ) -> Result<T> {
        let mut signals = self.store.signals();
        match call.await {
            Ok(value) => Ok(value),
            Err(e) if e.is_canceled() => Err(Error::Canceled),
            Err(e) => match signals.try_recv() {
                Ok(SessionSignal::Invalidated) => Err(Error::SessionExpired),
                Err(_) => Err(e.into()),
            },
        }
    }
}

pub async fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => login(ctx, &username, password).await,
        Commands::Logout => {
            ctx.store.logout();
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => {
            let identity = ctx.require_identity().await?;
            print!("{}", render::identity(&identity));
            Ok(())
        }
        Commands::Projects(command) => projects_command(ctx, command).await,
        Commands::Report => {
            ctx.require_trainer().await?;
            let report = ctx
                .guarded(reports::fetch(ctx.store.client(), &ctx.cancel))
                .await?;
            print!("{}", render::report(&report));
            Ok(())
        }
        // Printed before a session is built.
        Commands::Version => Ok(()),
    }
}

async fn login(ctx: &Context, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password(&ctx.cancel).await?,
    };
    let identity = ctx.store.login(username, &password, &ctx.cancel).await?;
    println!("Logged in as {} ({}).", identity.username, identity.role());
    Ok(())
}

async fn read_password(cancel: &CancellationToken) -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map(|_| line)
    });
    let line = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Canceled),
        joined = read => joined.map_err(|e| Error::Custom(e.to_string()))??,
    };

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::Custom("Password is required".into()));
    }
    Ok(password)
}

async fn projects_command(ctx: &Context, command: ProjectCommands) -> Result<()> {
    let client = ctx.store.client();
    match command {
        ProjectCommands::List {
            status,
            priority,
            due_before,
        } => {
            ctx.require_identity().await?;
            let filter = ProjectFilter {
                status,
                priority,
                due_date: due_before,
            };
            let list = ctx
                .guarded(projects::list(client, &filter, &ctx.cancel))
                .await?;
            print!("{}", render::projects(&list));
        }
        ProjectCommands::Show { id } => {
            ctx.require_identity().await?;
            let project = ctx
                .guarded(projects::find(client, id, &ctx.cancel))
                .await?;
            print!("{}", render::project_detail(&project));
        }
        ProjectCommands::Create(args) => {
            ctx.require_trainer().await?;
            let project = new_project(args);
            let created = ctx
                .guarded(projects::create(client, &project, &ctx.cancel))
                .await?;
            println!("Created project {}.", created.id);
            print!("{}", render::projects(&[created]));
        }
        ProjectCommands::Update(args) => {
            let identity = ctx.require_identity().await?;
            let id = args.id;
            let current = ctx
                .guarded(projects::find(client, id, &ctx.cancel))
                .await?;
            let payload = projects::prepare_update(&identity, &current, edits(args))?;
            debug!("updating project {id}");
            let updated = ctx
                .guarded(projects::update(client, id, &payload, &ctx.cancel))
                .await?;
            print!("{}", render::projects(&[updated]));
        }
        ProjectCommands::Delete { id } => {
            ctx.require_trainer().await?;
            ctx.guarded(projects::delete(client, id, &ctx.cancel))
                .await?;
            println!("Deleted project {id}.");
        }
    }
    Ok(())
}

fn new_project(args: CreateArgs) -> NewProject {
    NewProject {
        description: args.description,
        assigned_to_id: args.assign_to,
        priority: args.priority,
        due_date: args.due_date,
        status: args.status,
        ..NewProject::new(args.title)
    }
}

fn edits(args: UpdateArgs) -> ProjectEdits {
    ProjectEdits {
        title: args.title,
        description: args.description,
        priority: args.priority,
        due_date: if args.clear_due_date {
            Some(None)
        } else {
            args.due_date.map(Some)
        },
        status: args.status,
        progress: args.progress,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tracker_core::models::{Priority, Status};
    use tracker_core::transport::testing::{ScriptedBackend, Step};
    use tracker_core::{ClientConfig, MemoryTokenStore, TokenStore};

    use super::*;

    const TRAINEE_JSON: &str =
        r#"{"id": 5, "username": "ana", "email": "ana@example.com", "is_trainer": false}"#;
    const PROJECT_JSON: &str = r#"{
        "id": 4, "title": "Parser", "description": "tokens",
        "assigned_to": {"id": 5, "username": "ana"},
        "priority": "medium", "status": "pending",
        "due_date": null, "progress": 10
    }"#;

    fn context_with(
        steps: Vec<Step>,
    ) -> (Context, Arc<ScriptedBackend>, Arc<MemoryTokenStore>) {
        let backend = ScriptedBackend::new(steps);
        let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
        let config = ClientConfig::new("http://tracker.test/app").unwrap();
        let store = SessionStore::new(config, backend.clone(), tokens.clone());
        (
            Context::new(store, CancellationToken::new()),
            backend,
            tokens,
        )
    }

    fn list() -> ProjectCommands {
        ProjectCommands::List {
            status: None,
            priority: None,
            due_before: None,
        }
    }

    fn update_args() -> UpdateArgs {
        UpdateArgs {
            id: 4,
            status: None,
            progress: None,
            title: None,
            description: None,
            priority: None,
            due_date: None,
            clear_due_date: false,
        }
    }

    #[test]
    fn create_args_map_onto_payload() {
        let project = new_project(CreateArgs {
            title: "Parser".into(),
            description: "tokens".into(),
            assign_to: Some(5),
            priority: Priority::High,
            due_date: None,
            status: Status::Pending,
        });
        assert_eq!(project.title, "Parser");
        assert_eq!(project.assigned_to_id, Some(5));
        assert_eq!(project.priority, Priority::High);
        assert_eq!(project.progress, 0);
    }

    #[test]
    fn update_args_become_edits() {
        let edits = edits(UpdateArgs {
            status: Some(Status::Completed),
            progress: Some(100),
            ..update_args()
        });
        assert!(!edits.touches_details());
        assert_eq!(edits.progress, Some(100));
        assert_eq!(edits.due_date, None);
    }

    #[test]
    fn due_date_flags_become_edits() {
        let set = edits(UpdateArgs {
            due_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
            ..update_args()
        });
        assert_eq!(set.due_date, Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 1)));

        let cleared = edits(UpdateArgs {
            clear_due_date: true,
            ..update_args()
        });
        assert_eq!(cleared.due_date, Some(None));
        assert!(cleared.touches_details());
    }

    #[tokio::test]
    async fn rejected_token_mid_command_is_session_expired() {
        let (ctx, backend, tokens) = context_with(vec![
            Step::reply(200, TRAINEE_JSON),
            Step::reply(401, r#"{"detail": "Token expired"}"#),
        ]);

        let err = projects_command(&ctx, list()).await.unwrap_err();

        assert!(matches!(err, Error::SessionExpired), "{err:?}");
        assert_eq!(backend.calls(), 2);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn server_error_is_not_session_expired() {
        let (ctx, _, tokens) = context_with(vec![
            Step::reply(200, TRAINEE_JSON),
            Step::reply(500, "boom"),
        ]);

        let err = projects_command(&ctx, list()).await.unwrap_err();

        assert!(matches!(err, Error::Api(_)), "{err:?}");
        assert_eq!(tokens.load().unwrap().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn canceled_call_is_reported_as_canceled() {
        let (ctx, backend, tokens) = context_with(vec![Step::reply(200, TRAINEE_JSON)]);
        let trigger = ctx.cancel.clone();
        backend.push(Step::then(move || trigger.cancel(), Step::Hang));

        let err = projects_command(&ctx, list()).await.unwrap_err();

        assert!(matches!(err, Error::Canceled), "{err:?}");
        assert!(err.is_canceled());
        assert_eq!(tokens.load().unwrap().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn trainee_is_refused_report_without_a_request() {
        let (ctx, backend, _) = context_with(vec![Step::reply(200, TRAINEE_JSON)]);

        let err = dispatch(&ctx, Commands::Report).await.unwrap_err();

        assert!(matches!(err, Error::AccessDenied(_)), "{err:?}");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn show_fetches_one_project() {
        let (ctx, backend, _) = context_with(vec![
            Step::reply(200, TRAINEE_JSON),
            Step::reply(200, &format!("[{PROJECT_JSON}]")),
        ]);

        projects_command(&ctx, ProjectCommands::Show { id: 4 })
            .await
            .unwrap();

        let seen = backend.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].call.url.path(), "/app/mini-projects/");
    }
}
