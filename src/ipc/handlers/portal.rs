use crate::guard::DeploymentContext;
use crate::ipc::error::{err, ok, BAD_PARAMS, BAD_STATE, UNKNOWN_SESSION};
use crate::ipc::types::{AppState, Request};
use crate::portal::{PortalState, SchoolRole, SCHOOL_ROLE_OPTIONS};
use serde_json::json;

/// Observable portal state. The two modal-visibility flags mirror the
/// front-end's `#portalChoiceModal` / `#schoolRoleModal` contract and are
/// mutually exclusive by construction.
fn portal_payload(portal: &PortalState) -> serde_json::Value {
    let options: Vec<&str> = SCHOOL_ROLE_OPTIONS.iter().map(|r| r.as_str()).collect();
    match portal {
        PortalState::Start => json!({ "state": "start" }),
        PortalState::NoAuthLanding => json!({
            "state": "no_auth_landing",
            "loginAffordance": true,
            "portalChoiceVisible": false,
            "schoolRoleVisible": false,
        }),
        PortalState::PortalChoice => json!({
            "state": "portal_choice",
            "portalChoiceVisible": true,
            "schoolRoleVisible": false,
            "options": ["student", "school"],
        }),
        PortalState::SchoolRoleChoice { preselected } => json!({
            "state": "school_role_choice",
            "portalChoiceVisible": false,
            "schoolRoleVisible": true,
            "options": options,
            "preselected": preselected.map(|r| r.as_str()),
        }),
        PortalState::Browsing => json!({
            "state": "browsing",
            "portalChoiceVisible": false,
            "schoolRoleVisible": false,
        }),
        PortalState::OwnerBypass => json!({
            "state": "owner_bypass",
            "portalChoiceVisible": false,
            "schoolRoleVisible": false,
            "lensRequested": true,
        }),
        PortalState::Redirected { target } => json!({
            "state": "redirected",
            "portalChoiceVisible": false,
            "schoolRoleVisible": false,
            "target": target,
        }),
    }
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let (_, role) = state.effective_role(session);
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    session.portal = PortalState::open(role);
    if session.portal == PortalState::OwnerBypass {
        // Kick off the lens load; nothing waits on it.
        session.lens.request();
    }
    ok(&req.id, portal_payload(&session.portal))
}

fn handle_choose(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(portal) = req.params.get("portal").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.portal", None);
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let (_, role) = state.effective_role(session);
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    match session.portal.choose(portal, role) {
        Ok(next) => {
            session.portal = next;
            ok(&req.id, portal_payload(&session.portal))
        }
        Err(msg) => err(&req.id, BAD_STATE, msg, None),
    }
}

fn handle_select_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(role_raw) = req.params.get("role").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.role", None);
    };
    let Some(school_role) = SchoolRole::parse(role_raw) else {
        return err(
            &req.id,
            BAD_PARAMS,
            format!("unknown school role: {}", role_raw),
            None,
        );
    };
    if !state.has_class(class_id) {
        return err(&req.id, BAD_PARAMS, format!("unknown class: {}", class_id), None);
    }
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let deployment = DeploymentContext::new(class_id);
    match session.portal.select_school_role(&deployment, school_role) {
        Ok(next) => {
            session.portal = next;
            ok(&req.id, portal_payload(&session.portal))
        }
        Err(msg) => err(&req.id, BAD_STATE, msg, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "portal.open" => Some(handle_open(state, req)),
        "portal.choose" => Some(handle_choose(state, req)),
        "portal.selectRole" => Some(handle_select_role(state, req)),
        _ => None,
    }
}
