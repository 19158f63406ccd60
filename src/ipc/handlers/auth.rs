use crate::guard::EntitlementRecord;
use crate::identity::ProviderRecord;
use crate::ipc::error::{err, ok, BAD_PARAMS, UNKNOWN_SESSION};
use crate::ipc::types::{AppState, Request, Session};
use serde_json::json;
use uuid::Uuid;

/// Seeds the provider directory, the daemon-side equivalent of the test
/// harness substituting a canned auth module for a deployment.
fn handle_auth_seed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("sessions") else {
        return err(&req.id, BAD_PARAMS, "missing params.sessions", None);
    };
    let records: Vec<ProviderRecord> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, BAD_PARAMS, format!("bad sessions: {}", e), None),
    };
    let count = records.len();
    state.provider.seed(records);
    ok(&req.id, json!({ "seeded": count }))
}

fn handle_entitlements_seed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("records") else {
        return err(&req.id, BAD_PARAMS, "missing params.records", None);
    };
    let records: Vec<EntitlementRecord> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, BAD_PARAMS, format!("bad records: {}", e), None),
    };
    let count = records.len();
    state.entitlements.seed(records);
    ok(&req.id, json!({ "seeded": count }))
}

fn resolution_payload(state: &AppState, session_id: &str, session: &Session) -> serde_json::Value {
    let (identity, role) = state.effective_role(session);
    match identity {
        None => json!({
            "sessionId": session_id,
            "resolved": "guest",
            "role": role.as_str(),
        }),
        Some(id) => json!({
            "sessionId": session_id,
            "resolved": "user",
            "role": role.as_str(),
            "identity": { "uid": id.uid, "email": id.email },
        }),
    }
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let token = req
        .params
        .get("token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let session_id = Uuid::new_v4().to_string();
    let session = Session::new(token);
    let payload = resolution_payload(state, &session_id, &session);
    state.sessions.insert(session_id, session);
    ok(&req.id, payload)
}

fn handle_session_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    ok(&req.id, resolution_payload(state, session_id, session))
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let closed = state.sessions.remove(session_id).is_some();
    ok(&req.id, json!({ "closed": closed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.seed" => Some(handle_auth_seed(state, req)),
        "entitlements.seed" => Some(handle_entitlements_seed(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        "session.resolve" => Some(handle_session_resolve(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        _ => None,
    }
}
