//! Media catalog with hierarchical tags and token-based tag search.
//!
//! The [`search`], [`tags`] and [`media`] modules hold the client-side state
//! machines; [`catalog`] is the collaborator they talk to, and [`routes`]
//! serves that catalog over HTTP.

pub mod api;
pub mod catalog;
pub mod config;
pub mod media;
pub mod o11y;
pub mod routes;
pub mod search;
pub mod services;
pub mod tags;
