use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Outcome, Request};
use crate::reports;

fn handle_performance_trend(req: &Request) -> serde_json::Value {
    let points = serde_json::to_value(reports::PERFORMANCE_TREND).unwrap_or_else(|_| json!([]));
    ok(&req.id, json!({ "points": points }))
}

fn handle_student_results(req: &Request) -> serde_json::Value {
    let results = serde_json::to_value(reports::STUDENT_RESULTS).unwrap_or_else(|_| json!([]));
    ok(&req.id, json!({ "results": results }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Outcome> {
    match req.method.as_str() {
        "reports.performanceTrend" => Some(Outcome::reply(handle_performance_trend(req))),
        "reports.studentResults" => Some(Outcome::reply(handle_student_results(req))),
        _ => None,
    }
}
