use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::assignments::finish_job;
use crate::client::Section;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Job, Outcome, Request};
use crate::registry::ContainerKey;

/// Load one of the management sections into the shared panel. The section
/// set is closed; unknown names are an explicit error rather than the
/// original's silent no-op.
fn handle_sections_load(state: &mut AppState, req: &Request) -> Outcome {
    let Some(session) = state.session.as_ref() else {
        return Outcome::reply(err(&req.id, "no_session", "open a session first", None));
    };

    let raw = match get_required_str(&req.params, "section") {
        Ok(v) => v,
        Err(e) => return Outcome::reply(e.response(&req.id)),
    };
    let Some(section) = Section::parse(&raw) else {
        return Outcome::reply(err(
            &req.id,
            "bad_params",
            format!("unknown section: {}", raw),
            None,
        ));
    };

    let key = ContainerKey::SharedPanel;
    let ticket = match session.registry.begin(&key) {
        Ok(t) => t,
        Err(e) => return Outcome::reply(err(&req.id, "unknown_container", e.to_string(), None)),
    };

    let job_id = Uuid::new_v4().to_string();
    log::debug!("job {} issued: load {:?} ticket={}", job_id, section, ticket.seq());
    let reply = ok(
        &req.id,
        json!({
            "issued": true,
            "jobId": job_id.clone(),
            "container": key.to_string(),
            "ticket": ticket.seq(),
        }),
    );

    let client = Arc::clone(&session.client);
    let registry = Arc::clone(&session.registry);
    let out = state.out.clone();
    let job: Job = Box::pin(async move {
        let result = client.load_section(section).await;
        finish_job(&registry, &out, &job_id, &ticket, result);
    });

    Outcome::with_job(reply, job)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "sections.load" => Some(handle_sections_load(state, req)),
        _ => None,
    }
}
