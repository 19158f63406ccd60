use chrono::{DateTime, Utc};
use serde_json::json;

use crate::guard::{self, DeploymentContext, GuardOutcome};
use crate::ipc::error::{err, ok, BAD_PARAMS, UNKNOWN_SESSION};
use crate::ipc::types::{AppState, Request};

/// Runs the per-deployment access guard for one protected page load. Every
/// outcome carries the `page` visibility flags: the loading placeholder holds
/// until the guard settles, and the app container opens only on a grant.
fn handle_run(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = req.params.get("sessionId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    if !state.has_class(class_id) {
        return err(&req.id, BAD_PARAMS, format!("unknown class: {}", class_id), None);
    }
    let now = match req.params.get("now").and_then(|v| v.as_str()) {
        None => Utc::now(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => return err(&req.id, BAD_PARAMS, format!("bad now: {}", e), None),
        },
    };
    let Some(session) = state.sessions.get(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };

    let deployment = DeploymentContext::new(class_id);
    let outcome = guard::run(
        &state.classifier,
        &state.provider,
        &state.entitlements,
        &deployment,
        session.token.as_deref(),
        session.lens.viewing_as,
        now,
    );
    let lens_requested = state.is_true_owner(session);

    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };

    // A fresh guard run is a fresh page load: bump the epoch and drop any
    // in-flight curriculum state so stale results never reach the new page.
    let epoch = session.epochs.entry(class_id.to_string()).or_insert(0);
    *epoch += 1;
    let epoch = *epoch;
    session.navigators.remove(class_id);
    session.grants.remove(class_id);

    match outcome {
        GuardOutcome::Redirect { target } => ok(
            &req.id,
            json!({
                "outcome": "redirect",
                "target": target,
                "page": { "loading": false, "app": false },
            }),
        ),
        GuardOutcome::Expired { entitlement } => ok(
            &req.id,
            json!({
                "outcome": "expired",
                "interstitial": true,
                "dismissible": false,
                "entitlement": {
                    "classId": entitlement.class_id,
                    "allowed": false,
                    "reason": entitlement.reason,
                },
                "page": { "loading": false, "app": false },
            }),
        ),
        GuardOutcome::Granted {
            identity,
            role,
            entitlement,
        } => {
            session.grants.insert(class_id.to_string(), epoch);
            if lens_requested {
                session.lens.request();
            }
            ok(
                &req.id,
                json!({
                    "outcome": "granted",
                    "identity": { "uid": identity.uid, "email": identity.email },
                    "role": role.as_str(),
                    "entitlement": {
                        "classId": entitlement.class_id,
                        "allowed": true,
                        "reason": entitlement.reason,
                    },
                    "lensRequested": lens_requested,
                    "page": { "loading": false, "app": true },
                }),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "guard.run" => Some(handle_run(state, req)),
        _ => None,
    }
}
