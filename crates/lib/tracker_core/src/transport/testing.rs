//! Scripted backend for tests of the client and the code built on it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tokio::time::Instant;

use super::backend::{BackendError, HttpBackend, HttpCall, HttpReply};

/// One scripted outcome.
pub enum Step {
    Reply(u16, String),
    Network,
    /// The status line arrived but reading the body failed.
    BodyLost(u16),
    /// Never completes; only the client timeout or cancellation ends it.
    Hang,
    /// Run a side effect, then play the next step.
    Then(Box<dyn FnOnce() + Send>, Box<Step>),
    /// Wait, then play the next step.
    Delayed(Duration, Box<Step>),
}

impl Step {
    pub fn reply(status: u16, body: &str) -> Self {
        Step::Reply(status, body.to_string())
    }

    pub fn then(f: impl FnOnce() + Send + 'static, next: Step) -> Self {
        Step::Then(Box::new(f), Box::new(next))
    }

    pub fn delayed(delay: Duration, next: Step) -> Self {
        Step::Delayed(delay, Box::new(next))
    }
}

/// Recorded attempt.
#[derive(Debug, Clone)]
pub struct Seen {
    pub at: Instant,
    pub call: HttpCall,
}

impl Seen {
    pub fn bearer(&self) -> Option<String> {
        self.call
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Backend that plays back steps in order and records every call.
#[derive(Default)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    async fn execute(&self, call: HttpCall) -> Result<HttpReply, BackendError> {
        self.seen.lock().unwrap().push(Seen {
            at: Instant::now(),
            call: call.clone(),
        });
        let mut step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to {}", call.url));
        loop {
            match step {
                Step::Reply(status, body) => return Ok(HttpReply::new(status, body)),
                Step::Network => return Err(BackendError::Network("connection reset".into())),
                Step::BodyLost(status) => {
                    return Err(BackendError::Body {
                        status,
                        message: "connection closed mid-body".into(),
                    });
                }
                Step::Hang => return std::future::pending().await,
                Step::Then(effect, next) => {
                    effect();
                    step = *next;
                }
                Step::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    step = *next;
                }
            }
        }
    }
}
