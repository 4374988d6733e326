//! Global search box bound to the address bar `q` parameter.

use std::mem;

use crate::catalog::{AutocompleteTag, CatalogApi, CatalogError};

use super::{
    autocomplete::{Autocomplete, Commit, CommitMode, InputEvent},
    tokenizer::{query_param, serialize_query},
};

/// Routes without a search context; visiting one clears the box.
pub const RESET_ROUTES: [&str; 3] = ["/", "/tags", "/map"];
pub const QUERY_PARAM: &str = "q";
pub const SEARCH_ROUTE: &str = "/media";

/// Path and raw query string of the current address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    /// Split an href such as `/media?q=cat+dog#top` into path and query.
    pub fn parse(href: &str) -> Self {
        let without_fragment = href.split('#').next().unwrap_or_default();
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        Self {
            path: if path.is_empty() { "/".into() } else { path.into() },
            query: query.into(),
        }
    }

    /// Decoded value of the `q` parameter, if present.
    pub fn q(&self) -> Option<String> {
        query_param(&self.query, QUERY_PARAM)
    }

    /// Pages where the search box starts empty.
    pub fn is_reset_route(&self) -> bool {
        RESET_ROUTES.contains(&self.path.as_str())
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Location the caller should push onto the history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub href: String,
}

impl Navigation {
    pub fn search(tokens: &[String]) -> Self {
        Self {
            href: format!("{SEARCH_ROUTE}?{QUERY_PARAM}={}", serialize_query(tokens)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    pub prevent_default: bool,
    pub navigation: Option<Navigation>,
}

pub struct SearchBox {
    engine: Autocomplete,
    location: Option<Location>,
    mounted: bool,
    fetch_issued: bool,
}

impl SearchBox {
    pub fn new() -> Self {
        Self {
            engine: Autocomplete::new(CommitMode::Query),
            location: None,
            mounted: false,
            fetch_issued: false,
        }
    }

    pub fn engine(&self) -> &Autocomplete {
        &self.engine
    }

    pub fn text(&self) -> &str {
        self.engine.text()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn mount(&mut self, location: Location) {
        self.mounted = true;
        self.fetch_issued = false;
        if location.is_reset_route() {
            self.clear();
        } else {
            self.adopt_query(&location);
        }
        self.location = Some(location);
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    /// Returns true exactly once per mount; the caller then fetches the options.
    pub fn begin_options_fetch(&mut self) -> bool {
        if !self.mounted || self.fetch_issued {
            return false;
        }
        self.fetch_issued = true;
        true
    }

    /// Feed the result of the options fetch. Ignored once unmounted.
    pub fn options_resolved(&mut self, result: Result<Vec<AutocompleteTag>, CatalogError>) {
        if !self.mounted {
            tracing::debug!("search box unmounted, dropping suggestion options");
            return;
        }
        let event = match result {
            Ok(options) => InputEvent::OptionsLoaded(options),
            Err(err) => {
                tracing::warn!(error = %err, "suggestions unavailable");
                InputEvent::OptionsFailed(err.to_string())
            }
        };
        self.apply(event);
    }

    /// Fetch the options from `catalog` unless this mount already did.
    pub async fn load_options<C>(&mut self, catalog: &C)
    where
        C: CatalogApi + ?Sized,
    {
        if self.begin_options_fetch() {
            let result = catalog.fetch_autocomplete_tags().await;
            self.options_resolved(result);
        }
    }

    /// React to a navigation that happened outside the search box.
    pub fn location_changed(&mut self, location: Location) {
        let changed = self.location.as_ref() != Some(&location);
        if changed && location.is_reset_route() {
            self.clear();
        } else {
            self.adopt_query(&location);
        }
        self.location = Some(location);
    }

    pub fn handle(&mut self, event: InputEvent) -> SearchOutcome {
        let outcome = self.apply(event);
        let navigation = match outcome.commit {
            Some(Commit::Submit(tokens)) => {
                self.apply(InputEvent::TextChanged(tokens.join(" ")));
                let navigation = Navigation::search(&tokens);
                tracing::debug!(href = %navigation.href, "search submitted");
                Some(navigation)
            }
            Some(Commit::Selected(_)) | None => None,
        };

        SearchOutcome {
            prevent_default: outcome.prevent_default,
            navigation,
        }
    }

    /// Take over `q` unless it is already shown or the user is mid-edit.
    fn adopt_query(&mut self, location: &Location) {
        let Some(q) = location.q().filter(|q| !q.is_empty()) else {
            return;
        };
        if q != self.engine.text() && !self.engine.is_open() {
            self.apply(InputEvent::TextChanged(q));
        }
    }

    fn clear(&mut self) {
        if !self.engine.text().is_empty() {
            self.apply(InputEvent::TextChanged(String::new()));
        }
    }

    fn apply(&mut self, event: InputEvent) -> super::autocomplete::Outcome {
        let (engine, outcome) = mem::take(&mut self.engine).update(event);
        self.engine = engine;
        outcome
    }
}

impl Default for SearchBox {
    fn default() -> Self {
        Self::new()
    }
}
