use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracker_core::models::{Priority, Status};

#[derive(Parser, Debug)]
#[command(name = "tracker", about = "Mini-project tracker client", version)]
pub struct Cli {
    /// API base URL, including the path prefix
    #[arg(long, global = true, env = "TRACKER_API_URL")]
    pub api_url: Option<String>,

    /// File holding the session token
    #[arg(long, global = true, env = "TRACKER_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(short, long, env = "TRACKER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Remove the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Work with mini-projects
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Show the progress report (trainers only)
    Report,

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List visible projects
    List {
        #[arg(long)]
        status: Option<Status>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Only projects due on or before this date (YYYY-MM-DD)
        #[arg(long)]
        due_before: Option<NaiveDate>,
    },

    /// Show one project in full
    Show { id: i64 },

    /// Create a project (trainers only)
    Create(CreateArgs),

    /// Update a project
    Update(UpdateArgs),

    /// Delete a project (trainers only)
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// User id of the assignee
    #[arg(long)]
    pub assign_to: Option<i64>,

    #[arg(long, default_value_t = Priority::Medium)]
    pub priority: Priority,

    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    #[arg(long, default_value_t = Status::Pending)]
    pub status: Status,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub status: Option<Status>,

    /// 0 to 100
    #[arg(long)]
    pub progress: Option<u8>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    /// Remove the due date
    #[arg(long, conflicts_with = "due_date")]
    pub clear_due_date: bool,
}
