use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::client::ClientError;
use crate::ipc::error::{err, event, ok};
use crate::ipc::helpers::{get_required_str, get_str_or_empty};
use crate::ipc::types::{AppState, Job, Outcome, OutSender, Request};
use crate::registry::{ApplyOutcome, ContainerKey, Registry, Ticket};

#[derive(Debug, Clone, Copy)]
enum EditOp {
    AssignSubject,
    AssignClass,
    RemoveSubject,
    RemoveClass,
}

impl EditOp {
    fn resource_key(&self) -> &'static str {
        match self {
            EditOp::AssignSubject | EditOp::RemoveSubject => "subjectId",
            EditOp::AssignClass | EditOp::RemoveClass => "classId",
        }
    }

    fn is_assign(&self) -> bool {
        matches!(self, EditOp::AssignSubject | EditOp::AssignClass)
    }

    fn container(&self, teacher_id: &str) -> ContainerKey {
        match self {
            EditOp::AssignSubject | EditOp::RemoveSubject => {
                ContainerKey::AssignedSubjects(teacher_id.to_string())
            }
            EditOp::AssignClass | EditOp::RemoveClass => {
                ContainerKey::AssignedClasses(teacher_id.to_string())
            }
        }
    }
}

/// Shared tail for every sync job: run the ticket guard over the response
/// and emit the matching event. Failures land on the edited container only,
/// with prior content left intact.
pub(super) fn finish_job(
    registry: &Registry,
    out: &OutSender,
    job_id: &str,
    ticket: &Ticket,
    result: Result<String, ClientError>,
) {
    let container = ticket.key().to_string();
    match result {
        Ok(html) => match registry.apply(ticket, html.clone()) {
            Ok(ApplyOutcome::Applied) => {
                log::debug!("applied {} ticket {}", container, ticket.seq());
                let _ = out.send(event(
                    "container.updated",
                    json!({
                        "container": container,
                        "jobId": job_id,
                        "ticket": ticket.seq(),
                        "html": html,
                        "occurredAt": Utc::now().to_rfc3339(),
                    }),
                ));
            }
            Ok(ApplyOutcome::Superseded) => {
                log::debug!(
                    "discarded stale response for {} ticket {}",
                    container,
                    ticket.seq()
                );
                let _ = out.send(event(
                    "container.superseded",
                    json!({
                        "container": container,
                        "jobId": job_id,
                        "ticket": ticket.seq(),
                    }),
                ));
            }
            Err(e) => log::warn!("apply for job {} hit unbound container: {}", job_id, e),
        },
        Err(e) => {
            log::warn!("{} job {} failed: {}", container, job_id, e);
            match registry.fail(ticket, &e.to_string()) {
                Ok(ApplyOutcome::Applied) => {
                    let _ = out.send(event(
                        "container.error",
                        json!({
                            "container": container,
                            "jobId": job_id,
                            "ticket": ticket.seq(),
                            "kind": e.kind(),
                            "message": e.to_string(),
                            "occurredAt": Utc::now().to_rfc3339(),
                        }),
                    ));
                }
                Ok(ApplyOutcome::Superseded) => {}
                Err(e2) => log::warn!("error record for job {} dropped: {}", job_id, e2),
            }
        }
    }
}

fn handle_edit(state: &mut AppState, req: &Request, op: EditOp) -> Outcome {
    let Some(session) = state.session.as_ref() else {
        return Outcome::reply(err(&req.id, "no_session", "open a session first", None));
    };

    let teacher_id = match get_required_str(&req.params, "teacherId") {
        Ok(v) => v,
        Err(e) => return Outcome::reply(e.response(&req.id)),
    };

    // A cleared <select> fires change with an empty value; that is a no-op
    // for assigns and a caller bug for removes.
    let resource_id = get_str_or_empty(&req.params, op.resource_key());
    if resource_id.is_empty() {
        if op.is_assign() {
            return Outcome::reply(ok(&req.id, json!({ "issued": false })));
        }
        return Outcome::reply(err(
            &req.id,
            "bad_params",
            format!("missing {}", op.resource_key()),
            None,
        ));
    }

    let key = op.container(&teacher_id);
    let ticket = match session.registry.begin(&key) {
        Ok(t) => t,
        Err(e) => return Outcome::reply(err(&req.id, "unknown_container", e.to_string(), None)),
    };

    let job_id = Uuid::new_v4().to_string();
    log::debug!(
        "job {} issued: {:?} teacher={} resource={} ticket={}",
        job_id,
        op,
        teacher_id,
        resource_id,
        ticket.seq()
    );
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
        let result = match op {
            EditOp::AssignSubject => client.assign_subject(&teacher_id, &resource_id).await,
            EditOp::AssignClass => client.assign_class(&teacher_id, &resource_id).await,
            EditOp::RemoveSubject => client.remove_subject(&teacher_id, &resource_id).await,
            EditOp::RemoveClass => client.remove_class(&teacher_id, &resource_id).await,
        };
        finish_job(&registry, &out, &job_id, &ticket, result);
    });

    Outcome::with_job(reply, job)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "assignments.assignSubject" => Some(handle_edit(state, req, EditOp::AssignSubject)),
        "assignments.assignClass" => Some(handle_edit(state, req, EditOp::AssignClass)),
        "assignments.removeSubject" => Some(handle_edit(state, req, EditOp::RemoveSubject)),
        "assignments.removeClass" => Some(handle_edit(state, req, EditOp::RemoveClass)),
        _ => None,
    }
}
