use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("resource does not exist")]
    NotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unsupported URL scheme {0:?}")]
    Scheme(String),
}

/// Fetch maps a resolved resource URL to its textual content.
/// Implementations must be shareable across import worker threads.
pub trait Fetch: Send + Sync {
    fn fetch(&self, resource: &Url) -> Result<String, FetchError>;
}

/// The default fetcher reads `file://` URLs from the local filesystem and
/// `http(s)://` URLs over the network with a bounded request timeout.
pub struct DefaultFetcher {
    pub timeout: Duration,
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        DefaultFetcher {
            timeout: Duration::from_secs(10),
        }
    }
}

impl Fetch for DefaultFetcher {
    fn fetch(&self, resource: &Url) -> Result<String, FetchError> {
        match resource.scheme() {
            "file" => {
                let path = resource
                    .to_file_path()
                    .map_err(|()| FetchError::Scheme("file".to_string()))?;
                match std::fs::read_to_string(&path) {
                    Ok(content) => Ok(content),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        Err(FetchError::NotFound)
                    }
                    Err(err) => Err(err.into()),
                }
            }
            "http" | "https" => {
                tracing::debug!(%resource, "fetching remote document");
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .build()?;
                let response = client.get(resource.clone()).send()?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound);
                }
                Ok(response.error_for_status()?.text()?)
            }
            other => Err(FetchError::Scheme(other.to_string())),
        }
    }
}
