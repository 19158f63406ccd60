use serde_json::json;

// Stable error codes surfaced to the front-end. Everything in the taxonomy
// degrades to an explicit envelope; nothing here crashes the process.
pub const BAD_PARAMS: &str = "bad_params";
pub const BAD_STATE: &str = "bad_state";
pub const UNKNOWN_SESSION: &str = "unknown_session";
pub const GUARD_REQUIRED: &str = "guard_required";
pub const INCOMPLETE_SELECTION: &str = "incomplete_selection";
pub const EMPTY_CATALOG: &str = "empty_catalog";
pub const UNKNOWN_BOOK: &str = "unknown_book";
pub const UNKNOWN_CHAPTER: &str = "unknown_chapter";
pub const NOT_OWNER: &str = "not_owner";
pub const NOT_AUTHORIZED: &str = "not_authorized";
pub const BAD_URL: &str = "bad_url";

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
