//! Combobox state machine shared by the global search box and the inline tag pickers.

use crate::catalog::{AutocompleteTag, Tag};

use super::tokenizer::{commit_token, filter_options, submitted_tokens, tokenize};

/// What committing a suggestion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Rewrite the query text, replacing the token being edited.
    #[default]
    Query,
    /// Clear the input and hand the chosen tag to the caller.
    Select,
}

/// Suggestion data as seen by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OptionsState {
    /// Catalog fetch still in flight.
    #[default]
    Loading,
    Ready(Vec<AutocompleteTag>),
    /// Fetch failed; the input keeps working without suggestions.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    OptionsLoaded(Vec<AutocompleteTag>),
    OptionsFailed(String),
    /// A tag created on this surface; appended without refetching.
    OptionAppended(AutocompleteTag),
    TextChanged(String),
    Focus,
    Blur,
    ArrowUp,
    ArrowDown,
    Enter,
    /// Pointer pressed on the suggestion at this index of the filtered list.
    PointerDown(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Enter without a highlighted suggestion: run the query.
    Submit(Vec<String>),
    /// A suggestion was picked in [`CommitMode::Select`].
    Selected(Tag),
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    /// The originating pointer event must not move focus away from the input.
    pub prevent_default: bool,
    pub commit: Option<Commit>,
}

impl Outcome {
    fn commit(commit: Commit) -> Self {
        Self {
            prevent_default: false,
            commit: Some(commit),
        }
    }
}

/// Input text, loaded options and highlight state of one combobox.
///
/// `active == None` means no suggestion is highlighted. Whenever it is
/// `Some(i)`, `i < filtered().len()`.
#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    mode: CommitMode,
    text: String,
    options: OptionsState,
    filtered: Vec<AutocompleteTag>,
    open: bool,
    active: Option<usize>,
    previous_active: Option<usize>,
    blur_suppressed: bool,
}

impl Autocomplete {
    pub fn new(mode: CommitMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &OptionsState {
        &self.options
    }

    pub fn filtered(&self) -> &[AutocompleteTag] {
        &self.filtered
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_option(&self) -> Option<&AutocompleteTag> {
        self.active.and_then(|index| self.filtered.get(index))
    }

    /// Suggestions to render: only while open and non-empty.
    pub fn visible_suggestions(&self) -> &[AutocompleteTag] {
        if self.open { self.filtered.as_slice() } else { &[] }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.options, OptionsState::Loading)
    }

    /// Apply one event, returning the next state and the requested effects.
    pub fn update(mut self, event: InputEvent) -> (Self, Outcome) {
        if !matches!(event, InputEvent::Blur) {
            self.blur_suppressed = false;
        }

        let outcome = match event {
            InputEvent::OptionsLoaded(options) => {
                self.options = OptionsState::Ready(options);
                self.refilter();
                Outcome::default()
            }
            InputEvent::OptionsFailed(message) => {
                self.options = OptionsState::Unavailable(message);
                self.refilter();
                Outcome::default()
            }
            InputEvent::OptionAppended(option) => {
                if let OptionsState::Ready(options) = &mut self.options {
                    options.push(option);
                    self.refilter();
                }
                Outcome::default()
            }
            InputEvent::TextChanged(text) => {
                self.text = text;
                self.refilter();
                Outcome::default()
            }
            InputEvent::Focus => {
                self.open = true;
                let previous = self.previous_active.take();
                self.active = self.clamp(previous);
                Outcome::default()
            }
            InputEvent::Blur => {
                if self.blur_suppressed {
                    self.blur_suppressed = false;
                } else {
                    self.open = false;
                    self.previous_active = self.active.take();
                }
                Outcome::default()
            }
            InputEvent::ArrowUp => {
                self.active = match self.active {
                    None | Some(0) => None,
                    Some(index) => Some(index - 1),
                };
                Outcome::default()
            }
            InputEvent::ArrowDown => {
                self.active = match self.active {
                    _ if self.filtered.is_empty() => None,
                    None => Some(0),
                    Some(index) if index + 1 >= self.filtered.len() => Some(index),
                    Some(index) => Some(index + 1),
                };
                Outcome::default()
            }
            InputEvent::Enter => match self.active {
                Some(index) => self.select(index),
                None => match self.mode {
                    CommitMode::Query => {
                        Outcome::commit(Commit::Submit(submitted_tokens(&tokenize(&self.text))))
                    }
                    CommitMode::Select => Outcome::default(),
                },
            },
            InputEvent::PointerDown(index) => {
                if index < self.filtered.len() {
                    let mut outcome = self.select(index);
                    self.blur_suppressed = true;
                    outcome.prevent_default = true;
                    outcome
                } else {
                    Outcome::default()
                }
            }
        };

        (self, outcome)
    }

    fn select(&mut self, index: usize) -> Outcome {
        let Some(chosen) = self.filtered.get(index).map(|option| option.tag.clone()) else {
            return Outcome::default();
        };
        self.active = None;

        match self.mode {
            CommitMode::Query => {
                self.text = commit_token(&tokenize(&self.text), &chosen);
                self.open = true;
                self.refilter();
                Outcome::default()
            }
            CommitMode::Select => {
                self.text.clear();
                self.refilter();
                Outcome::commit(Commit::Selected(chosen))
            }
        }
    }

    fn refilter(&mut self) {
        let next: Vec<AutocompleteTag> = match &self.options {
            OptionsState::Ready(options) => {
                let tokens = match self.mode {
                    CommitMode::Query => tokenize(&self.text),
                    CommitMode::Select => vec![self.text.trim().to_string()],
                };
                filter_options(&tokens, options)
                    .into_iter()
                    .cloned()
                    .collect()
            }
            OptionsState::Loading | OptionsState::Unavailable(_) => Vec::new(),
        };

        if next != self.filtered {
            self.active = None;
            self.previous_active = None;
        }
        self.filtered = next;
        self.active = self.clamp(self.active);
    }

    fn clamp(&self, index: Option<usize>) -> Option<usize> {
        index.filter(|index| *index < self.filtered.len())
    }
}
