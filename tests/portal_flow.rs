use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_ready4examd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ready4examd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(
        stdin,
        reader,
        "cfg",
        "platform.configure",
        json!({ "ownerEmails": ["owner@ready4exam.com"] }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "seed",
        "auth.seed",
        json!({ "sessions": [
            { "token": "student-token", "uid": "s1", "email": "student@school.com", "role": "student" },
            { "token": "principal-token", "uid": "p1", "email": "principal@school.com", "role": "principal" },
            { "token": "owner-token", "uid": "o1", "email": "owner@ready4exam.com" }
        ]}),
    );
}

fn open_session(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    token: Option<&str>,
) -> String {
    let params = match token {
        Some(t) => json!({ "token": t }),
        None => json!({}),
    };
    let result = request_ok(stdin, reader, "open", "session.open", params);
    result
        .get("sessionId")
        .and_then(|v| v.as_str())
        .expect("sessionId")
        .to_string()
}

#[test]
fn resolved_non_owner_sees_portal_choice_before_any_redirect() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, Some("student-token"));

    let portal = request_ok(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.open",
        json!({ "sessionId": sid }),
    );
    assert_eq!(portal.get("state").and_then(|v| v.as_str()), Some("portal_choice"));
    assert_eq!(portal.get("portalChoiceVisible"), Some(&json!(true)));
    assert_eq!(portal.get("schoolRoleVisible"), Some(&json!(false)));
    assert!(portal.get("target").is_none());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn guest_never_sees_portal_choice_but_always_a_login_affordance() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, None);

    let portal = request_ok(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.open",
        json!({ "sessionId": sid }),
    );
    assert_eq!(
        portal.get("state").and_then(|v| v.as_str()),
        Some("no_auth_landing")
    );
    assert_eq!(portal.get("loginAffordance"), Some(&json!(true)));
    assert_eq!(portal.get("portalChoiceVisible"), Some(&json!(false)));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_portal_closes_modal_without_redirect() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, Some("student-token"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.open",
        json!({ "sessionId": sid }),
    );
    let chosen = request_ok(
        &mut stdin,
        &mut reader,
        "p2",
        "portal.choose",
        json!({ "sessionId": sid, "portal": "student" }),
    );
    assert_eq!(chosen.get("state").and_then(|v| v.as_str()), Some("browsing"));
    assert_eq!(chosen.get("portalChoiceVisible"), Some(&json!(false)));
    assert!(chosen.get("target").is_none());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn school_portal_always_shows_exactly_four_role_options() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);

    // Regardless of the resolved role, the prompt renders all four options.
    for (i, token) in ["student-token", "principal-token"].iter().enumerate() {
        let sid = open_session(&mut stdin, &mut reader, Some(token));
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("o{}", i),
            "portal.open",
            json!({ "sessionId": sid }),
        );
        let school = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "portal.choose",
            json!({ "sessionId": sid, "portal": "school" }),
        );
        assert_eq!(
            school.get("state").and_then(|v| v.as_str()),
            Some("school_role_choice")
        );
        assert_eq!(school.get("schoolRoleVisible"), Some(&json!(true)));
        assert_eq!(school.get("portalChoiceVisible"), Some(&json!(false)));
        let options = school
            .get("options")
            .and_then(|v| v.as_array())
            .expect("options");
        assert_eq!(options.len(), 4);
        if *token == "principal-token" {
            // Implied role is pre-selected but the prompt still renders.
            assert_eq!(
                school.get("preselected").and_then(|v| v.as_str()),
                Some("principal")
            );
        }
    }

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn school_role_selection_redirects_to_that_deployments_console() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, Some("student-token"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.open",
        json!({ "sessionId": sid }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "p2",
        "portal.choose",
        json!({ "sessionId": sid, "portal": "school" }),
    );
    let redirected = request_ok(
        &mut stdin,
        &mut reader,
        "p3",
        "portal.selectRole",
        json!({ "sessionId": sid, "classId": "9", "role": "admin" }),
    );
    assert_eq!(
        redirected.get("state").and_then(|v| v.as_str()),
        Some("redirected")
    );
    assert_eq!(
        redirected.get("target").and_then(|v| v.as_str()),
        Some("cbse/class-9/consoles/admin.html")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn out_of_order_portal_transitions_are_bad_state() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, Some("student-token"));

    // selectRole without the school prompt open.
    let resp = request(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.selectRole",
        json!({ "sessionId": sid, "classId": "9", "role": "admin" }),
    );
    assert_eq!(resp.get("ok"), Some(&json!(false)));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_state")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn owner_bypasses_portal_choice_entirely() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    seed(&mut stdin, &mut reader);
    let sid = open_session(&mut stdin, &mut reader, Some("owner-token"));

    let portal = request_ok(
        &mut stdin,
        &mut reader,
        "p1",
        "portal.open",
        json!({ "sessionId": sid }),
    );
    assert_eq!(
        portal.get("state").and_then(|v| v.as_str()),
        Some("owner_bypass")
    );
    assert_eq!(portal.get("portalChoiceVisible"), Some(&json!(false)));
    assert_eq!(portal.get("lensRequested"), Some(&json!(true)));

    drop(stdin);
    let _ = child.wait();
}
