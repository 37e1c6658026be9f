use std::future::Future;
use std::pin::Pin;
use std::sync::{mpsc, Arc};

use serde::Deserialize;

use crate::client::SchoolClient;
use crate::registry::Registry;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Sink for replies and events. A single writer drains it so stdout stays
/// line-atomic.
pub type OutSender = mpsc::Sender<serde_json::Value>;

/// One bound page context: the server client plus the container binding
/// table built at `session.open`.
pub struct Session {
    pub id: String,
    pub client: Arc<SchoolClient>,
    pub registry: Arc<Registry>,
}

pub struct AppState {
    pub rt: tokio::runtime::Handle,
    pub out: OutSender,
    pub session: Option<Session>,
}

impl AppState {
    pub fn new(rt: tokio::runtime::Handle, out: OutSender) -> AppState {
        AppState {
            rt,
            out,
            session: None,
        }
    }
}

/// Background work started by a handler, spawned by the main loop after the
/// reply has been queued (so a fast job can never outrun its own reply).
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct Outcome {
    pub reply: serde_json::Value,
    pub job: Option<Job>,
}

impl Outcome {
    pub fn reply(reply: serde_json::Value) -> Outcome {
        Outcome { reply, job: None }
    }

    pub fn with_job(reply: serde_json::Value, job: Job) -> Outcome {
        Outcome {
            reply,
            job: Some(job),
        }
    }
}
