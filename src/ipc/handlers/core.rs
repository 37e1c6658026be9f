use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::client::SchoolClient;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Outcome, Request, Session};
use crate::registry::{ContainerKey, Registry};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionId": state.session.as_ref().map(|s| s.id.clone()),
        }),
    )
}

fn teacher_ids(params: &serde_json::Value) -> Result<Vec<String>, HandlerErr> {
    let Some(raw) = params.get("teacherIds") else {
        return Ok(Vec::new());
    };
    let Some(items) = raw.as_array() else {
        return Err(HandlerErr::bad_params("teacherIds must be an array"));
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(id) if !id.trim().is_empty() => ids.push(id.trim().to_string()),
            _ => return Err(HandlerErr::bad_params("teacherIds entries must be non-empty strings")),
        }
    }
    Ok(ids)
}

/// Bind the daemon to one authenticated page: server base URL, the page's
/// anti-forgery token, and the teacher rows whose containers exist on it.
/// Re-opening replaces the previous session wholesale.
fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = match get_required_str(&req.params, "baseUrl") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let csrf_token = match get_required_str(&req.params, "csrfToken") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let teachers = match teacher_ids(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let client = match SchoolClient::new(&base_url, &csrf_token) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let mut keys = vec![ContainerKey::SharedPanel];
    for teacher in &teachers {
        keys.push(ContainerKey::AssignedSubjects(teacher.clone()));
        keys.push(ContainerKey::AssignedClasses(teacher.clone()));
    }
    let registry = Registry::with_bindings(keys);
    let containers = registry.keys();

    let session_id = Uuid::new_v4().to_string();
    log::info!(
        "session {} open against {} ({} teachers)",
        session_id,
        base_url,
        teachers.len()
    );
    state.session = Some(Session {
        id: session_id.clone(),
        client: Arc::new(client),
        registry: Arc::new(registry),
    });

    ok(
        &req.id,
        json!({
            "sessionId": session_id,
            "containers": containers,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "health" => Some(Outcome::reply(handle_health(state, req))),
        "session.open" => Some(Outcome::reply(handle_session_open(state, req))),
        _ => None,
    }
}
