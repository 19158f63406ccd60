use crate::ipc::error::{err, ok, BAD_PARAMS};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "classes": state.class_ids,
            "sessions": state.sessions.len(),
        }),
    )
}

/// Injects the platform configuration: the owner allow-list (the only path to
/// the Owner role) and optionally the set of class deployments.
fn handle_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(emails) = req.params.get("ownerEmails").and_then(|v| v.as_array()) else {
        return err(&req.id, BAD_PARAMS, "missing params.ownerEmails", None);
    };
    let emails: Vec<String> = emails
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect();
    state.classifier.set_owner_emails(emails);

    if let Some(ids) = req.params.get("classIds").and_then(|v| v.as_array()) {
        let ids: Vec<String> = ids
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect();
        if ids.is_empty() {
            return err(&req.id, BAD_PARAMS, "params.classIds must be non-empty", None);
        }
        state.class_ids = ids;
    }

    ok(&req.id, json!({ "classes": state.class_ids }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "platform.configure" => Some(handle_configure(state, req)),
        _ => None,
    }
}
