use crate::identity::Role;
use crate::ipc::error::{err, ok, BAD_PARAMS, NOT_OWNER, UNKNOWN_SESSION};
use crate::ipc::types::{AppState, Request};
use crate::lens;
use serde_json::json;

fn session_id_of(req: &Request) -> Option<&str> {
    req.params.get("sessionId").and_then(|v| v.as_str())
}

fn targets_payload(state: &AppState) -> serde_json::Value {
    let targets: Vec<serde_json::Value> = lens::targets(&state.class_ids)
        .into_iter()
        .map(|t| {
            json!({
                "label": t.label,
                "role": t.role.as_str(),
                "classId": t.class_id,
            })
        })
        .collect();
    json!(targets)
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = session_id_of(req) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let owner = state.is_true_owner(session);
    ok(
        &req.id,
        json!({
            "requested": session.lens.requested,
            "ready": session.lens.ready,
            "viewingAs": session.lens.viewing_as.map(|r| r.as_str()),
            "targets": if owner { targets_payload(state) } else { json!([]) },
        }),
    )
}

/// Completion of the asynchronous overlay load. For non-owner sessions this
/// is a handled no-op, never a failure: the capability is simply absent.
fn handle_inject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = session_id_of(req) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    if !state.is_true_owner(session) || !session.lens.requested {
        return ok(&req.id, json!({ "injected": false }));
    }
    let targets = targets_payload(state);
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    session.lens.ready = true;
    ok(&req.id, json!({ "injected": true, "targets": targets }))
}

/// Switches the lens target: re-runs classification with an overridden role
/// for the remainder of the session, with no new authentication round-trip.
fn handle_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = session_id_of(req) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(role_raw) = req.params.get("role").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.role", None);
    };
    let Some(role) = Role::parse(role_raw) else {
        return err(&req.id, BAD_PARAMS, format!("unknown role: {}", role_raw), None);
    };
    // Only roles the widget actually offers may be selected.
    if !lens::targets(&state.class_ids).iter().any(|t| t.role == role) {
        return err(
            &req.id,
            BAD_PARAMS,
            format!("not a lens target: {}", role_raw),
            None,
        );
    }
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    if !state.is_true_owner(session) {
        return err(&req.id, NOT_OWNER, "persona lens is owner-only", None);
    }
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    // Selecting the owner target drops the override.
    session.lens.viewing_as = match role {
        Role::Owner => None,
        other => Some(other),
    };
    ok(
        &req.id,
        json!({ "viewingAs": session.lens.viewing_as.map(|r| r.as_str()) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lens.status" => Some(handle_status(state, req)),
        "lens.inject" => Some(handle_inject(state, req)),
        "lens.select" => Some(handle_select(state, req)),
        _ => None,
    }
}
