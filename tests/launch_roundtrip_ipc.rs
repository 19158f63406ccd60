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

#[test]
fn term_prep_selection_round_trips_including_chapter_set() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let encoded = request_ok(
        &mut stdin,
        &mut reader,
        "e1",
        "launch.encode",
        json!({ "selection": {
            "mode": "term_prep",
            "book": "ncert_science_9",
            "chapters": ["science_sound_9_quiz", "science_motion_9_quiz"],
            "difficulty": "Medium"
        }}),
    );
    let url = encoded.get("url").and_then(|v| v.as_str()).expect("url");
    assert!(url.contains("mode=term_prep"));

    let decoded = request_ok(
        &mut stdin,
        &mut reader,
        "d1",
        "launch.decode",
        json!({ "url": url }),
    );
    let sel = decoded.get("selection").expect("selection");
    assert_eq!(sel.get("mode").and_then(|v| v.as_str()), Some("term_prep"));
    assert_eq!(sel.get("book").and_then(|v| v.as_str()), Some("ncert_science_9"));
    assert_eq!(sel.get("difficulty").and_then(|v| v.as_str()), Some("Medium"));
    // Chapter set membership survives; ordering is irrelevant and normalized.
    assert_eq!(
        sel.get("chapters"),
        Some(&json!(["science_motion_9_quiz", "science_sound_9_quiz"]))
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn standard_selection_round_trips_without_the_marker() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let encoded = request_ok(
        &mut stdin,
        &mut reader,
        "e1",
        "launch.encode",
        json!({ "selection": {
            "mode": "standard",
            "book": "ncert_science_9",
            "chapters": ["science_motion_9_quiz"],
            "difficulty": "Hard"
        }}),
    );
    let url = encoded.get("url").and_then(|v| v.as_str()).expect("url");
    assert!(!url.contains("mode=term_prep"));
    assert!(url.contains("table="));

    let decoded = request_ok(
        &mut stdin,
        &mut reader,
        "d1",
        "launch.decode",
        json!({ "url": url }),
    );
    assert_eq!(
        decoded.pointer("/selection/mode").and_then(|v| v.as_str()),
        Some("standard")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_urls_are_rejected_with_bad_url() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (i, url) in [
        "quiz-engine.html?difficulty=Medium&book=b1",
        "quiz-engine.html?table=c1&book=b1",
        "quiz-engine.html?table=c1&difficulty=Extreme&book=b1",
        "quiz-engine.html?table=&difficulty=Medium&book=b1",
    ]
    .iter()
    .enumerate()
    {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("d{}", i),
            "launch.decode",
            json!({ "url": url }),
        );
        assert_eq!(resp.get("ok"), Some(&json!(false)), "url: {}", url);
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("bad_url"),
            "url: {}",
            url
        );
    }

    drop(stdin);
    let _ = child.wait();
}
