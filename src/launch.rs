use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;

use crate::curriculum::{Difficulty, Mode};

pub const QUIZ_ENGINE_PAGE: &str = "quiz-engine.html";

/// A finalized curriculum selection, frozen at launch time and discarded once
/// the quiz-engine URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: Mode,
    pub book: String,
    pub chapters: BTreeSet<String>,
    pub difficulty: Difficulty,
}

/// Serializes a selection into the quiz-engine query string. The `table`
/// identifier (comma-joined chapter slugs, sorted) is never omitted, and the
/// `mode=term_prep` marker is emitted only for TermPrep; its absence in
/// Standard mode is part of the contract.
pub fn encode(sel: &Selection) -> String {
    let table = sel.chapters.iter().cloned().collect::<Vec<_>>().join(",");
    let mut url = format!(
        "{}?table={}&difficulty={}&book={}",
        QUIZ_ENGINE_PAGE,
        urlencoding::encode(&table),
        urlencoding::encode(sel.difficulty.as_str()),
        urlencoding::encode(&sel.book),
    );
    if sel.mode == Mode::TermPrep {
        url.push_str("&mode=term_prep");
    }
    url
}

/// Exact inverse of `encode` modulo chapter order. Unknown parameters are
/// ignored; a missing mode marker decodes to Standard.
pub fn decode(url: &str) -> Result<Selection> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or(url);

    let mut table: Option<String> = None;
    let mut difficulty: Option<Difficulty> = None;
    let mut book: Option<String> = None;
    let mut mode = Mode::Standard;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("malformed query pair: {}", pair))?;
        let value = urlencoding::decode(raw)
            .with_context(|| format!("bad percent-encoding in {}", key))?
            .into_owned();
        match key {
            "table" => table = Some(value),
            "difficulty" => {
                difficulty =
                    Some(Difficulty::parse(&value).with_context(|| {
                        format!("unknown difficulty: {}", value)
                    })?)
            }
            "book" => book = Some(value),
            "mode" => {
                if value != "term_prep" {
                    bail!("unknown mode marker: {}", value);
                }
                mode = Mode::TermPrep;
            }
            _ => {}
        }
    }

    let table = table.context("missing table identifier")?;
    let chapters: BTreeSet<String> = table
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if chapters.is_empty() {
        bail!("empty table identifier");
    }

    Ok(Selection {
        mode,
        book: book.context("missing book")?,
        chapters,
        difficulty: difficulty.context("missing difficulty")?,
    })
}
