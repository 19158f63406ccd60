use serde_json::json;
use std::collections::BTreeSet;

use crate::curriculum::{Difficulty, Mode};
use crate::ipc::error::{err, ok, BAD_PARAMS, BAD_URL};
use crate::ipc::types::{AppState, Request};
use crate::launch::{self, Selection};

fn selection_payload(sel: &Selection) -> serde_json::Value {
    let chapters: Vec<&String> = sel.chapters.iter().collect();
    json!({
        "mode": sel.mode.as_str(),
        "book": sel.book,
        "chapters": chapters,
        "difficulty": sel.difficulty.as_str(),
    })
}

fn parse_selection(raw: &serde_json::Value) -> Result<Selection, String> {
    let mode = match raw.get("mode").and_then(|v| v.as_str()) {
        None => Mode::Standard,
        Some(s) => Mode::parse(s).ok_or_else(|| format!("unknown mode: {}", s))?,
    };
    let book = raw
        .get("book")
        .and_then(|v| v.as_str())
        .ok_or("missing selection.book")?
        .to_string();
    let difficulty_raw = raw
        .get("difficulty")
        .and_then(|v| v.as_str())
        .ok_or("missing selection.difficulty")?;
    let difficulty = Difficulty::parse(difficulty_raw)
        .ok_or_else(|| format!("unknown difficulty: {}", difficulty_raw))?;
    let chapters: BTreeSet<String> = raw
        .get("chapters")
        .and_then(|v| v.as_array())
        .ok_or("missing selection.chapters")?
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect();
    if chapters.is_empty() {
        return Err("selection.chapters must be non-empty".to_string());
    }
    Ok(Selection {
        mode,
        book,
        chapters,
        difficulty,
    })
}

fn handle_encode(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("selection") else {
        return err(&req.id, BAD_PARAMS, "missing params.selection", None);
    };
    match parse_selection(raw) {
        Ok(sel) => ok(&req.id, json!({ "url": launch::encode(&sel) })),
        Err(msg) => err(&req.id, BAD_PARAMS, msg, None),
    }
}

fn handle_decode(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(url) = req.params.get("url").and_then(|v| v.as_str()) else {
        return err(&req.id, BAD_PARAMS, "missing params.url", None);
    };
    match launch::decode(url) {
        Ok(sel) => ok(&req.id, json!({ "selection": selection_payload(&sel) })),
        Err(e) => err(&req.id, BAD_URL, format!("{:#}", e), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "launch.encode" => Some(handle_encode(state, req)),
        "launch.decode" => Some(handle_decode(state, req)),
        _ => None,
    }
}
