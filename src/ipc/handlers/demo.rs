use crate::demo;
use crate::identity::Role;
use crate::ipc::error::{err, ok, BAD_PARAMS, NOT_AUTHORIZED, UNKNOWN_SESSION};
use crate::ipc::types::{AppState, Request};

/// Canned dashboard for the demo principal console. Restricted to the demo
/// principal role (and owners, who see everything).
fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    if !state.has_class(class_id) {
        return err(&req.id, BAD_PARAMS, format!("unknown class: {}", class_id), None);
    }
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let (_, role) = state.effective_role(session);
    match role {
        Role::DemoPrincipal | Role::Owner => ok(&req.id, demo::dashboard(class_id)),
        _ => err(
            &req.id,
            NOT_AUTHORIZED,
            "demo dashboard is for demo principal accounts",
            None,
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "demo.dashboard" => Some(handle_dashboard(state, req)),
        _ => None,
    }
}
