mod fetch;
mod location;
mod read;
mod yaml;

pub use fetch::{DefaultFetcher, Fetch, FetchError};
pub use location::{Loader, Location};
pub use read::{read_document, read_json, SyntaxError};
pub use yaml::read_yaml;

use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The location did not resolve to a document through any candidate.
    #[error("document not found: {0}")]
    NotFound(String),
    /// A candidate resolved, but reading it failed.
    #[error("failed to read {resource}")]
    Fetch {
        resource: Url,
        #[source]
        detail: FetchError,
    },
    #[error("invalid location {0:?}")]
    Location(String),
}

impl LoadError {
    /// Express this error as a non-fatal issue.
    pub fn into_issue(self) -> issues::Issue {
        let issue = issues::Issue::new(issues::Level::Syntax, self.to_string());
        match &self {
            LoadError::Fetch { resource, detail } => issue
                .at(resource.clone(), 0, 0)
                .with_cause(detail),
            _ => issue,
        }
    }
}
