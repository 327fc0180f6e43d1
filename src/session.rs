use crate::search::{Candidate, Ranker};
use crate::store::CommandStore;

/// Discrete inputs driving the selection session. The TUI translates key
/// presses into these; tests feed them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Insert(String),
    Backspace,
    DeleteForward,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    SelectUp,
    SelectDown,
    Autocomplete,
    Commit,
    Cancel,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub ghost_text: bool,
    pub suggestion_limit: usize,
}

/// Result of applying one event. Commit is the only transition with a side
/// effect (the usage write); a failed write is reported here as a warning
/// next to the output instead of aborting the interaction.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Active,
    Committed {
        output: Option<String>,
        warning: Option<String>,
    },
    Cancelled,
}

/// Stateful input/selection loop over the ranked candidate list.
///
/// Invariants held after every event: `selected` indexes into `candidates`
/// (or is 0 when there are none) and `cursor` stays within the query's
/// character range. Candidates are recomputed from a fresh store snapshot on
/// every text-affecting event; the ranking is cheap enough that patching it
/// incrementally would only buy stale-candidate bugs.
pub struct Session<S> {
    store: S,
    ranker: Ranker,
    options: SessionOptions,
    query: String,
    cursor: usize,
    candidates: Vec<Candidate>,
    selected: usize,
}

impl<S: CommandStore> Session<S> {
    pub fn new(store: S, ranker: Ranker, options: SessionOptions, initial_query: &str) -> Self {
        let mut session = Self {
            store,
            ranker,
            options,
            query: initial_query.to_string(),
            cursor: initial_query.chars().count(),
            candidates: Vec::new(),
            selected: 0,
        };
        session.recompute();
        session
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Cursor position in characters, 0..=chars(query).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The candidates the UI should render, capped at the suggestion limit.
    pub fn visible_candidates(&self) -> &[Candidate] {
        let visible = self.candidates.len().min(self.options.suggestion_limit);
        &self.candidates[..visible]
    }

    /// Inline completion hint: the selected candidate's text beyond the
    /// typed query. Only offered when the candidate literally starts with
    /// the query (case-sensitive); a fuzzy match that jumps around the text
    /// would render a misleading remainder.
    pub fn ghost(&self) -> &str {
        if !self.options.ghost_text || self.query.is_empty() {
            return "";
        }
        let Some(candidate) = self.candidates.get(self.selected) else {
            return "";
        };
        candidate.record.text.strip_prefix(&self.query).unwrap_or("")
    }

    pub fn apply(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::Insert(text) => {
                let byte = byte_index_for_char(&self.query, self.cursor);
                self.query.insert_str(byte, &text);
                self.cursor += text.chars().count();
                self.selected = 0;
                self.recompute();
                Step::Active
            }
            SessionEvent::Backspace => {
                if self.cursor > 0 && remove_char_at(&mut self.query, self.cursor - 1) {
                    self.cursor -= 1;
                    self.selected = 0;
                    self.recompute();
                }
                Step::Active
            }
            SessionEvent::DeleteForward => {
                if remove_char_at(&mut self.query, self.cursor) {
                    self.selected = 0;
                    self.recompute();
                }
                Step::Active
            }
            SessionEvent::CursorLeft => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                Step::Active
            }
            SessionEvent::CursorRight => {
                if self.cursor < self.query.chars().count() {
                    self.cursor += 1;
                }
                Step::Active
            }
            SessionEvent::CursorHome => {
                self.cursor = 0;
                Step::Active
            }
            SessionEvent::CursorEnd => {
                self.cursor = self.query.chars().count();
                Step::Active
            }
            SessionEvent::SelectUp => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                Step::Active
            }
            SessionEvent::SelectDown => {
                let limit = self.candidates.len().min(self.options.suggestion_limit);
                if self.selected + 1 < limit {
                    self.selected += 1;
                }
                Step::Active
            }
            SessionEvent::Autocomplete => {
                if let Some(candidate) = self.candidates.get(self.selected) {
                    self.query = candidate.record.text.clone();
                    self.cursor = self.query.chars().count();
                    // Selection stays where it was (clamped), so Tab does
                    // not yank the highlight back to the top.
                    self.recompute();
                }
                Step::Active
            }
            SessionEvent::Commit => {
                let output = if let Some(candidate) = self.candidates.get(self.selected) {
                    Some(candidate.record.text.clone())
                } else if !self.query.is_empty() {
                    // Free-form passthrough: the typed text runs even if it
                    // was never recorded before.
                    Some(self.query.clone())
                } else {
                    None
                };

                let warning = output.as_deref().and_then(|text| {
                    self.store
                        .record_usage(text, &[])
                        .err()
                        .map(|err| format!("could not record command usage: {err:#}"))
                });

                Step::Committed { output, warning }
            }
            SessionEvent::Cancel => Step::Cancelled,
        }
    }

    fn recompute(&mut self) {
        self.candidates = self.ranker.rank(&self.query, &self.store.get_all());

        let limit = self.candidates.len().min(self.options.suggestion_limit);
        if limit == 0 {
            self.selected = 0;
        } else if self.selected >= limit {
            self.selected = limit - 1;
        }
    }
}

fn remove_char_at(value: &mut String, char_index: usize) -> bool {
    let start = byte_index_for_char(value, char_index);
    if start >= value.len() {
        return false;
    }
    let end = byte_index_for_char(value, char_index + 1);
    value.replace_range(start..end, "");
    true
}

fn byte_index_for_char(value: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    value
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}
