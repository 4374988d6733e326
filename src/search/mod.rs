//! Token-based tag search: query tokenizing, the suggestion state machine and
//! the address-bar bound search box built on top of it.

pub mod autocomplete;
pub mod search_box;
pub mod tokenizer;

pub use autocomplete::{Autocomplete, Commit, CommitMode, InputEvent, OptionsState, Outcome};
pub use search_box::{Location, Navigation, SearchBox, SearchOutcome};
