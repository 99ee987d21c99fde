use thiserror::Error;
use tracker_core::AuthError;
use tracker_core::api::ApiError;
use tracker_core::config::ConfigError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("Not logged in. Run `tracker login` first.")]
    NotLoggedIn,

    #[error("Session expired. Log in again.")]
    SessionExpired,

    #[error("Access denied: {}", .0)]
    AccessDenied(String),

    #[error("Canceled")]
    Canceled,

    #[error("Config::{}", .0)]
    Config(#[from] ConfigError),

    #[error("{}", .0)]
    Auth(#[from] AuthError),

    #[error("{}", .0)]
    Api(#[from] ApiError),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),
}

impl Error {
    /// Canceled outcomes end the process quietly.
    pub fn is_canceled(&self) -> bool {
        match self {
            Self::Canceled => true,
            Self::Auth(e) => e.is_canceled(),
            Self::Api(e) => e.is_canceled(),
            _ => false,
        }
    }
}
