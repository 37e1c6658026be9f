use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Unsolicited message. Events never carry an "id" key, which is how the
/// shell tells them apart from replies.
pub fn event(name: &str, fields: serde_json::Value) -> serde_json::Value {
    let mut msg = json!({ "event": name });
    if let Some(map) = fields.as_object() {
        for (k, v) in map {
            msg[k.as_str()] = v.clone();
        }
    }
    msg
}
