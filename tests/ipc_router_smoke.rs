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

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "platform.configure",
        json!({ "ownerEmails": ["owner@ready4exam.com"] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.seed",
        json!({ "sessions": [
            { "token": "s-token", "uid": "s1", "email": "student@school.com", "role": "student" }
        ]}),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "entitlements.seed",
        json!({ "records": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "catalog.seed",
        json!({ "classId": "9", "subject": "Science", "books": [
            { "id": "ncert_science_9", "title": "NCERT Science", "chapters": [
                { "id": "science_motion_9_quiz", "title": "Motion" }
            ]}
        ]}),
    );

    let opened = request(
        &mut stdin,
        &mut reader,
        "6",
        "session.open",
        json!({ "token": "s-token" }),
    );
    let session_id = opened
        .get("result")
        .and_then(|v| v.get("sessionId"))
        .and_then(|v| v.as_str())
        .expect("sessionId")
        .to_string();

    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "session.resolve",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "portal.open",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "lens.status",
        json!({ "sessionId": session_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "guard.run",
        json!({ "sessionId": session_id, "classId": "9" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "curriculum.begin",
        json!({ "sessionId": session_id, "classId": "9", "subject": "Science" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "curriculum.state",
        json!({ "sessionId": session_id, "classId": "9" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "launch.decode",
        json!({ "url": "quiz-engine.html?table=science_motion_9_quiz&difficulty=Medium&book=ncert_science_9" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "demo.dashboard",
        json!({ "sessionId": session_id, "classId": "9" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "session.close",
        json!({ "sessionId": session_id }),
    );

    // Unknown methods still fall through to not_implemented.
    let unknown = send(&mut stdin, &mut reader, "16", "nope.nothing", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
}
