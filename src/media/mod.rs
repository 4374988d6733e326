pub mod detail;

pub use detail::{DetailState, DetailView, Direction, LoadTicket, Resolution, adjacent};
