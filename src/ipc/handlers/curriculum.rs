use serde_json::json;

use crate::curriculum::{Book, Difficulty, Mode, Navigator, SelectError, StartOutcome};
use crate::ipc::error::{
    err, ok, BAD_PARAMS, BAD_STATE, EMPTY_CATALOG, GUARD_REQUIRED, INCOMPLETE_SELECTION,
    UNKNOWN_BOOK, UNKNOWN_CHAPTER, UNKNOWN_SESSION,
};
use crate::ipc::types::{AppState, Request};

fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Full observable navigator state. `selected` mirrors the front-end's
/// `selected` marker class; `canStart` drives the start control.
fn snapshot(nav: &Navigator) -> serde_json::Value {
    let books: Vec<serde_json::Value> = nav
        .books()
        .iter()
        .map(|b| json!({ "id": b.id, "title": b.title }))
        .collect();
    let chapters: Vec<serde_json::Value> = nav
        .current_chapters()
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "title": c.title,
                "selected": nav.chapters.contains(&c.id),
            })
        })
        .collect();
    let selected: Vec<&String> = nav.chapters.iter().collect();
    json!({
        "classId": nav.class_id,
        "subject": nav.subject,
        "stage": nav.stage(),
        "mode": nav.mode.as_str(),
        "books": books,
        "emptyCatalog": nav.empty_catalog(),
        "bookId": nav.book,
        "chapters": chapters,
        "emptyChapters": nav.book.is_some() && nav.current_chapters().is_empty(),
        "selected": selected,
        "difficulty": nav.difficulty.map(|d| d.as_str()),
        "canStart": nav.can_start(),
        "missing": nav.missing(),
    })
}

fn select_error(req: &Request, e: SelectError, nav: &Navigator) -> serde_json::Value {
    match e {
        SelectError::EmptyCatalog => err(
            &req.id,
            EMPTY_CATALOG,
            "no books for this subject",
            Some(json!({ "subject": nav.subject })),
        ),
        SelectError::UnknownBook => err(&req.id, UNKNOWN_BOOK, "no such book", None),
        SelectError::UnknownChapter => err(&req.id, UNKNOWN_CHAPTER, "no such chapter", None),
        SelectError::NoBook => err(&req.id, BAD_STATE, "no book selected", None),
        SelectError::NoChapters => err(
            &req.id,
            INCOMPLETE_SELECTION,
            "selection incomplete",
            Some(json!({ "missing": nav.missing() })),
        ),
        SelectError::BadState => err(&req.id, BAD_STATE, "not available in this stage", None),
    }
}

fn handle_catalog_seed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(class_id) = str_param(req, "classId") else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(subject) = str_param(req, "subject") else {
        return err(&req.id, BAD_PARAMS, "missing params.subject", None);
    };
    let Some(raw) = req.params.get("books") else {
        return err(&req.id, BAD_PARAMS, "missing params.books", None);
    };
    let books: Vec<Book> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, BAD_PARAMS, format!("bad books: {}", e), None),
    };
    let count = books.len();
    state.catalog.seed(class_id, subject, books);
    ok(&req.id, json!({ "seeded": count }))
}

fn handle_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = str_param(req, "sessionId") else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = str_param(req, "classId") else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(subject) = str_param(req, "subject") else {
        return err(&req.id, BAD_PARAMS, "missing params.subject", None);
    };
    let mode = match str_param(req, "mode") {
        None => Mode::Standard,
        Some(raw) => match Mode::parse(raw) {
            Some(m) => m,
            None => return err(&req.id, BAD_PARAMS, format!("unknown mode: {}", raw), None),
        },
    };
    let books = state.catalog.books_for(class_id, subject);
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    // Guard resolution strictly precedes navigator activation.
    if !session.grants.contains_key(class_id) {
        return err(
            &req.id,
            GUARD_REQUIRED,
            "deployment guard has not granted this page",
            None,
        );
    }
    let nav = Navigator::begin(class_id, subject, mode, books);
    let payload = snapshot(&nav);
    session.navigators.insert(class_id.to_string(), nav);
    ok(&req.id, payload)
}

fn with_navigator(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Request, &mut Navigator) -> serde_json::Value,
) -> serde_json::Value {
    let Some(session_id) = str_param(req, "sessionId") else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = str_param(req, "classId") else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let Some(nav) = session.navigators.get_mut(class_id) else {
        return err(
            &req.id,
            BAD_STATE,
            "curriculum navigation has not begun for this deployment",
            None,
        );
    };
    f(req, nav)
}

fn handle_mode(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| {
        let Some(raw) = str_param(req, "mode") else {
            return err(&req.id, BAD_PARAMS, "missing params.mode", None);
        };
        let Some(mode) = Mode::parse(raw) else {
            return err(&req.id, BAD_PARAMS, format!("unknown mode: {}", raw), None);
        };
        match nav.set_mode(mode) {
            Ok(()) => ok(&req.id, snapshot(nav)),
            Err(e) => select_error(req, e, nav),
        }
    })
}

fn handle_books(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| ok(&req.id, snapshot(nav)))
}

fn handle_select_book(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| {
        let Some(book_id) = str_param(req, "bookId") else {
            return err(&req.id, BAD_PARAMS, "missing params.bookId", None);
        };
        match nav.select_book(book_id) {
            Ok(()) => ok(&req.id, snapshot(nav)),
            Err(e) => select_error(req, e, nav),
        }
    })
}

fn handle_back(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| match nav.back_to_books() {
        Ok(()) => ok(&req.id, snapshot(nav)),
        Err(e) => select_error(req, e, nav),
    })
}

fn handle_select_chapter(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| {
        let Some(chapter_id) = str_param(req, "chapterId") else {
            return err(&req.id, BAD_PARAMS, "missing params.chapterId", None);
        };
        match nav.select_chapter(chapter_id) {
            Ok(()) => ok(&req.id, snapshot(nav)),
            Err(e) => select_error(req, e, nav),
        }
    })
}

fn handle_difficulty(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| {
        let Some(raw) = str_param(req, "difficulty") else {
            return err(&req.id, BAD_PARAMS, "missing params.difficulty", None);
        };
        let Some(difficulty) = Difficulty::parse(raw) else {
            return err(
                &req.id,
                BAD_PARAMS,
                format!("unknown difficulty: {}", raw),
                None,
            );
        };
        match nav.select_difficulty(difficulty) {
            Ok(()) => ok(&req.id, snapshot(nav)),
            Err(e) => select_error(req, e, nav),
        }
    })
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_navigator(state, req, |req, nav| ok(&req.id, snapshot(nav)))
}

fn handle_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = str_param(req, "sessionId") else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = str_param(req, "classId") else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let Some(nav) = session.navigators.get_mut(class_id) else {
        return err(
            &req.id,
            BAD_STATE,
            "curriculum navigation has not begun for this deployment",
            None,
        );
    };
    match nav.start() {
        Ok(StartOutcome::Launched { url }) => {
            // The selection is spent once the quiz URL exists.
            session.navigators.remove(class_id);
            ok(&req.id, json!({ "launched": true, "url": url }))
        }
        Ok(StartOutcome::Priming) => ok(
            &req.id,
            json!({ "launched": false, "priming": true, "stage": nav.stage() }),
        ),
        Err(e) => select_error(req, e, nav),
    }
}

fn handle_confirm(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session_id) = str_param(req, "sessionId") else {
        return err(&req.id, BAD_PARAMS, "missing params.sessionId", None);
    };
    let Some(class_id) = str_param(req, "classId") else {
        return err(&req.id, BAD_PARAMS, "missing params.classId", None);
    };
    let Some(session) = state.sessions.get_mut(session_id) else {
        return err(&req.id, UNKNOWN_SESSION, "no such session", None);
    };
    let Some(nav) = session.navigators.get_mut(class_id) else {
        return err(
            &req.id,
            BAD_STATE,
            "curriculum navigation has not begun for this deployment",
            None,
        );
    };
    match nav.confirm() {
        Ok(url) => {
            session.navigators.remove(class_id);
            ok(&req.id, json!({ "launched": true, "url": url }))
        }
        Err(e) => select_error(req, e, nav),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.seed" => Some(handle_catalog_seed(state, req)),
        "curriculum.begin" => Some(handle_begin(state, req)),
        "curriculum.mode" => Some(handle_mode(state, req)),
        "curriculum.books" => Some(handle_books(state, req)),
        "curriculum.selectBook" => Some(handle_select_book(state, req)),
        "curriculum.back" => Some(handle_back(state, req)),
        "curriculum.selectChapter" => Some(handle_select_chapter(state, req)),
        "curriculum.difficulty" => Some(handle_difficulty(state, req)),
        "curriculum.state" => Some(handle_state(state, req)),
        "curriculum.start" => Some(handle_start(state, req)),
        "curriculum.confirm" => Some(handle_confirm(state, req)),
        _ => None,
    }
}
