use super::{Fetch, FetchError, LoadError};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use url::Url;

/// A user-facing document source, prior to resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// An absolute URL or a path resolved against the origin location and
    /// the loader's search roots.
    Uri(String),
    /// In-memory text, addressable afterwards as `literal:<name>`.
    Literal { name: String, content: String },
}

impl Location {
    pub fn uri(s: impl Into<String>) -> Location {
        Location::Uri(s.into())
    }

    pub fn literal(name: impl Into<String>, content: impl Into<String>) -> Location {
        Location::Literal {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Uri(s) => f.write_str(s),
            Location::Literal { name, .. } => write!(f, "literal:{}", name),
        }
    }
}

fn literal_url(name: &str) -> Result<Url, LoadError> {
    let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC).to_string();
    Url::parse(&format!("literal:{}", encoded))
        .map_err(|_| LoadError::Location(name.to_string()))
}

/// Loader resolves Locations into canonical URLs and content.
///
/// The canonical URL is the identity used for import deduplication: two
/// loads collide exactly when they refer to the same document. File
/// candidates canonicalize their path before reading so that differing
/// spellings of one file share an identity.
pub struct Loader {
    search_paths: Vec<PathBuf>,
    fetcher: Box<dyn Fetch>,
    literals: Mutex<HashMap<Url, String>>,
}

impl Loader {
    pub fn new(search_paths: Vec<PathBuf>, fetcher: Box<dyn Fetch>) -> Loader {
        Loader {
            search_paths,
            fetcher,
            literals: Mutex::new(HashMap::new()),
        }
    }

    /// Make in-memory text addressable as `literal:<name>`, returning its
    /// canonical URL.
    pub fn register_literal(
        &self,
        name: &str,
        content: impl Into<String>,
    ) -> Result<Url, LoadError> {
        let url = literal_url(name)?;
        self.literals
            .lock()
            .unwrap()
            .insert(url.clone(), content.into());
        Ok(url)
    }

    /// Resolve `location` relative to `origin` and read it, returning the
    /// content together with the canonical URL.
    pub fn open(
        &self,
        location: &Location,
        origin: Option<&Url>,
    ) -> Result<(String, Url), LoadError> {
        match location {
            Location::Literal { name, content } => {
                let url = self.register_literal(name, content.clone())?;
                Ok((content.clone(), url))
            }
            Location::Uri(uri) => {
                let candidates = self.candidates(uri, origin)?;
                for candidate in &candidates {
                    match self.try_candidate(candidate) {
                        Ok(Some(hit)) => return Ok(hit),
                        Ok(None) => continue,
                        Err(err) => return Err(err),
                    }
                }
                Err(LoadError::NotFound(uri.clone()))
            }
        }
    }

    // Candidate URLs for a URI, in resolution priority order.
    fn candidates(&self, uri: &str, origin: Option<&Url>) -> Result<Vec<Url>, LoadError> {
        match Url::parse(uri) {
            Ok(url) => Ok(vec![url]),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let mut candidates = Vec::new();
                if let Some(origin) = origin {
                    if let Ok(joined) = origin.join(uri) {
                        candidates.push(joined);
                    }
                }
                for root in &self.search_paths {
                    if let Ok(url) = Url::from_file_path(root.join(uri)) {
                        candidates.push(url);
                    }
                }
                if candidates.is_empty() {
                    if let Ok(cwd) = std::env::current_dir() {
                        if let Ok(url) = Url::from_file_path(cwd.join(uri)) {
                            candidates.push(url);
                        }
                    }
                }
                if candidates.is_empty() {
                    Err(LoadError::Location(uri.to_string()))
                } else {
                    Ok(candidates)
                }
            }
            Err(_) => Err(LoadError::Location(uri.to_string())),
        }
    }

    // Ok(None) means "not here, keep looking".
    fn try_candidate(&self, candidate: &Url) -> Result<Option<(String, Url)>, LoadError> {
        if candidate.scheme() == "literal" {
            let literals = self.literals.lock().unwrap();
            return Ok(literals
                .get(candidate)
                .map(|content| (content.clone(), candidate.clone())));
        }

        let canonical = if candidate.scheme() == "file" {
            match candidate.to_file_path() {
                Ok(path) => match std::fs::canonicalize(&path) {
                    Ok(real) => Url::from_file_path(&real)
                        .map_err(|()| LoadError::Location(real.display().to_string()))?,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                    Err(err) => {
                        return Err(LoadError::Fetch {
                            resource: candidate.clone(),
                            detail: err.into(),
                        })
                    }
                },
                Err(()) => return Ok(None),
            }
        } else {
            candidate.clone()
        };

        match self.fetcher.fetch(&canonical) {
            Ok(content) => {
                tracing::debug!(resource = %canonical, "loaded document");
                Ok(Some((content, canonical)))
            }
            Err(FetchError::NotFound) => Ok(None),
            Err(detail) => Err(LoadError::Fetch {
                resource: canonical,
                detail,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::DefaultFetcher;
    use super::*;
    use std::io::Write;

    fn loader(search_paths: Vec<PathBuf>) -> Loader {
        Loader::new(search_paths, Box::new(DefaultFetcher::default()))
    }

    #[test]
    fn literal_round_trip() {
        let loader = loader(vec![]);
        let location = Location::literal("main", "key: value\n");

        let (content, url) = loader.open(&location, None).unwrap();
        assert_eq!(content, "key: value\n");
        assert_eq!(url.as_str(), "literal:main");

        // Addressable again through its canonical URL.
        let (content, _) = loader.open(&Location::uri("literal:main"), None).unwrap();
        assert_eq!(content, "key: value\n");
    }

    #[test]
    fn search_path_resolution_first_hit_wins() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir_b.path().join("doc.yaml")).unwrap();
        f.write_all(b"from: b\n").unwrap();

        let loader = loader(vec![dir_a.path().to_path_buf(), dir_b.path().to_path_buf()]);
        let (content, url) = loader.open(&Location::uri("doc.yaml"), None).unwrap();
        assert_eq!(content, "from: b\n");
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn origin_relative_resolution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("root.yaml"), "root: here\n").unwrap();
        std::fs::write(dir.path().join("imported.yaml"), "imported: here\n").unwrap();

        let loader = loader(vec![]);
        let origin = Url::from_file_path(dir.path().join("root.yaml")).unwrap();
        let (content, _) = loader
            .open(&Location::uri("imported.yaml"), Some(&origin))
            .unwrap();
        assert_eq!(content, "imported: here\n");
    }

    #[test]
    fn missing_document_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(vec![dir.path().to_path_buf()]);
        match loader.open(&Location::uri("absent.yaml"), None) {
            Err(LoadError::NotFound(uri)) => assert_eq!(uri, "absent.yaml"),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn canonical_identity_collapses_path_spellings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.yaml"), "x: 1\n").unwrap();

        let loader = loader(vec![dir.path().to_path_buf()]);
        let (_, direct) = loader.open(&Location::uri("doc.yaml"), None).unwrap();
        let (_, dotted) = loader.open(&Location::uri("./doc.yaml"), None).unwrap();
        assert_eq!(direct, dotted);
    }
}
