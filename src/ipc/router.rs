use super::handlers;
use super::types::{AppState, Outcome, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> Outcome {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::fields::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::assignments::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::sections::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::containers::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, &req) {
        return resp;
    }

    Outcome::reply(err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    ))
}
