use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::launch::{self, Selection};

/// Practice mode. TermPrep permits multi-chapter selection and adds a priming
/// step before the quiz engine; Standard launches directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standard,
    TermPrep,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "term_prep" => Some(Self::TermPrep),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::TermPrep => "term_prep",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Simple,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Simple" => Some(Self::Simple),
            "Medium" => Some(Self::Medium),
            "Hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Chapter ids are quiz-table slugs, e.g. `science_gravitation_9_quiz`.
#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// Curriculum catalog keyed by (classId, subject), seeded over IPC.
#[derive(Default)]
pub struct Catalog {
    books: HashMap<(String, String), Vec<Book>>,
}

impl Catalog {
    pub fn seed(&mut self, class_id: &str, subject: &str, books: Vec<Book>) {
        self.books
            .insert((class_id.to_string(), subject.to_string()), books);
    }

    pub fn books_for(&self, class_id: &str, subject: &str) -> Vec<Book> {
        self.books
            .get(&(class_id.to_string(), subject.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum SelectError {
    EmptyCatalog,
    UnknownBook,
    UnknownChapter,
    NoBook,
    NoChapters,
    BadState,
}

#[derive(Debug)]
pub enum StartOutcome {
    /// TermPrep inserts the preparatory screen before the encoder.
    Priming,
    Launched { url: String },
}

/// The book -> chapter(s) -> difficulty selection state machine. Session
/// scoped: created when curriculum navigation begins, discarded once the quiz
/// URL is built (or when a fresh guard run replaces the page).
pub struct Navigator {
    pub class_id: String,
    pub subject: String,
    pub mode: Mode,
    books: Vec<Book>,
    pub book: Option<String>,
    pub chapters: BTreeSet<String>,
    pub difficulty: Option<Difficulty>,
    pub priming: bool,
    pub launched: bool,
    /// Snapshot taken when the start action fires; the priming screen
    /// confirms exactly this set.
    frozen: Option<Selection>,
}

impl Navigator {
    pub fn begin(class_id: &str, subject: &str, mode: Mode, books: Vec<Book>) -> Self {
        Self {
            class_id: class_id.to_string(),
            subject: subject.to_string(),
            mode,
            books,
            book: None,
            chapters: BTreeSet::new(),
            difficulty: None,
            priming: false,
            launched: false,
            frozen: None,
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn empty_catalog(&self) -> bool {
        self.books.is_empty()
    }

    fn current_book(&self) -> Option<&Book> {
        let id = self.book.as_deref()?;
        self.books.iter().find(|b| b.id == id)
    }

    pub fn current_chapters(&self) -> &[Chapter] {
        self.current_book().map(|b| b.chapters.as_slice()).unwrap_or(&[])
    }

    pub fn stage(&self) -> &'static str {
        if self.launched {
            "launched"
        } else if self.priming {
            "priming"
        } else if self.book.is_none() {
            "book_select"
        } else if self.chapters.is_empty() {
            "chapter_select"
        } else if self.difficulty.is_none() {
            "difficulty_select"
        } else {
            "ready"
        }
    }

    /// The selection is immutable once the start action has fired.
    fn sealed(&self) -> bool {
        self.priming || self.launched
    }

    /// Resets any in-progress selection so the other mode's cardinality rules
    /// can never leave stale chapters behind.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        if self.mode != mode {
            self.mode = mode;
            self.book = None;
            self.chapters.clear();
            self.difficulty = None;
        }
        Ok(())
    }

    pub fn select_book(&mut self, book_id: &str) -> Result<(), SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        if self.empty_catalog() {
            return Err(SelectError::EmptyCatalog);
        }
        if !self.books.iter().any(|b| b.id == book_id) {
            return Err(SelectError::UnknownBook);
        }
        // Selecting a book replaces any previously rendered chapter list.
        self.book = Some(book_id.to_string());
        self.chapters.clear();
        self.difficulty = None;
        Ok(())
    }

    /// Dedicated back-to-books control.
    pub fn back_to_books(&mut self) -> Result<(), SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        self.book = None;
        self.chapters.clear();
        self.difficulty = None;
        Ok(())
    }

    pub fn select_chapter(&mut self, chapter_id: &str) -> Result<(), SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        let Some(book) = self.current_book() else {
            return Err(SelectError::NoBook);
        };
        if !book.chapters.iter().any(|c| c.id == chapter_id) {
            return Err(SelectError::UnknownChapter);
        }
        match self.mode {
            Mode::Standard => {
                // Single-chapter cardinality: subsequent clicks replace.
                self.chapters.clear();
                self.chapters.insert(chapter_id.to_string());
            }
            Mode::TermPrep => {
                // Click-to-add, click-again-to-remove.
                if !self.chapters.remove(chapter_id) {
                    self.chapters.insert(chapter_id.to_string());
                }
            }
        }
        Ok(())
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        if self.chapters.is_empty() {
            return Err(SelectError::NoChapters);
        }
        self.difficulty = Some(difficulty);
        Ok(())
    }

    pub fn can_start(&self) -> bool {
        self.book.is_some() && !self.chapters.is_empty() && self.difficulty.is_some()
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.book.is_none() {
            out.push("book");
        }
        if self.chapters.is_empty() {
            out.push("chapters");
        }
        if self.difficulty.is_none() {
            out.push("difficulty");
        }
        out
    }

    fn frozen_selection(&self) -> Option<Selection> {
        Some(Selection {
            mode: self.mode,
            book: self.book.clone()?,
            chapters: self.chapters.clone(),
            difficulty: self.difficulty?,
        })
    }

    pub fn start(&mut self) -> Result<StartOutcome, SelectError> {
        if self.sealed() {
            return Err(SelectError::BadState);
        }
        let Some(selection) = self.frozen_selection().filter(|_| self.can_start()) else {
            return Err(SelectError::NoChapters);
        };
        match self.mode {
            Mode::Standard => {
                self.launched = true;
                Ok(StartOutcome::Launched {
                    url: launch::encode(&selection),
                })
            }
            Mode::TermPrep => {
                self.frozen = Some(selection);
                self.priming = true;
                Ok(StartOutcome::Priming)
            }
        }
    }

    /// The explicit start action on the TermPrep priming screen. Encodes the
    /// snapshot taken at `start`, never the live fields.
    pub fn confirm(&mut self) -> Result<String, SelectError> {
        if !self.priming || self.launched {
            return Err(SelectError::BadState);
        }
        let Some(selection) = self.frozen.take() else {
            return Err(SelectError::BadState);
        };
        self.priming = false;
        self.launched = true;
        Ok(launch::encode(&selection))
    }
}
