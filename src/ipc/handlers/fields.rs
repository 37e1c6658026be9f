use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::get_str_or_empty;
use crate::ipc::types::{AppState, Outcome, Request};
use crate::roles::{toggle_fields, Role};

/// Role-driven auxiliary field visibility. Called once when the form loads
/// (pre-filled edit forms included) and again on every role change; both are
/// the same pure computation. An absent role reads as unrecognized, which
/// hides all three fields.
fn handle_fields_toggle(req: &Request) -> serde_json::Value {
    let role = Role::parse(&get_str_or_empty(&req.params, "role"));
    let vis = toggle_fields(role);
    ok(
        &req.id,
        json!({
            "role": role.as_str(),
            "district": vis.district,
            "circuit": vis.circuit,
            "school": vis.school,
        }),
    )
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "fields.toggle" => Some(Outcome::reply(handle_fields_toggle(req))),
        _ => None,
    }
}
