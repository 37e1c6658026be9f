use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Outcome, Request};
use crate::registry::ContainerKey;

fn handle_containers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    ok(&req.id, json!({ "containers": session.registry.keys() }))
}

fn handle_containers_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_session", "open a session first", None);
    };
    let raw = match get_required_str(&req.params, "container") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(key) = ContainerKey::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("malformed container key: {}", raw),
            None,
        );
    };
    match session.registry.snapshot(&key) {
        Ok(snap) => ok(
            &req.id,
            json!({
                "container": raw,
                "issued": snap.issued,
                "applied": snap.applied,
                "content": snap.content,
                "error": snap.error,
            }),
        ),
        Err(e) => err(&req.id, "unknown_container", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "containers.list" => Some(Outcome::reply(handle_containers_list(state, req))),
        "containers.get" => Some(Outcome::reply(handle_containers_get(state, req))),
        _ => None,
    }
}
