use crate::context::Config;
use issues::{Issue, IssueSink, Level};
use sources::{read_document, DefaultFetcher, Loader, Location};
use std::collections::HashSet;
use std::sync::Mutex;
use tosca::{select_presenter, Presenter, ProfileKind};
use url::Url;

// Shared state of the import fan-out. The visited set admits each
// canonical location at most once; results accumulate unordered and are
// sorted before merging so composition is deterministic.
struct ImportState<'a> {
    loader: &'a Loader,
    issues: &'a IssueSink,
    kind: ProfileKind,
    visited: Mutex<HashSet<Url>>,
    results: Mutex<Vec<(Url, doc::Value, doc::Locator)>>,
}

/// Parse a location into a merged presenter: load and read the root
/// document, select its profile, then resolve imports concurrently on a
/// bounded worker pool and fold them in.
///
/// Failures convert to issues; None means the root itself was unusable.
pub fn parse(location: &Location, config: &Config, issues: &IssueSink) -> Option<Presenter> {
    let loader = Loader::new(
        config.search_paths.clone(),
        Box::new(DefaultFetcher::default()),
    );
    parse_with_loader(location, &loader, config, issues)
}

/// Like [`parse`], with a caller-provided loader (tests register literal
/// documents on it).
pub fn parse_with_loader(
    location: &Location,
    loader: &Loader,
    config: &Config,
    issues: &IssueSink,
) -> Option<Presenter> {
    let (content, root_url) = match loader.open(location, None) {
        Ok(hit) => hit,
        Err(err) => {
            issues.report(err.into_issue());
            return None;
        }
    };
    let (raw, locator) = match read_document(&content, &root_url) {
        Ok(read) => read,
        Err(err) => {
            issues.report(err.into_issue());
            return None;
        }
    };
    let mut presenter = match select_presenter(raw, locator) {
        Ok(presenter) => presenter,
        Err(err) => {
            issues.report(
                Issue::new(Level::Syntax, err.to_string()).at(root_url.clone(), 0, 0),
            );
            return None;
        }
    };

    let imports = presenter.import_locations();
    if !imports.is_empty() {
        let state = ImportState {
            loader,
            issues,
            kind: presenter.kind(),
            visited: Mutex::new(HashSet::from([root_url.clone()])),
            results: Mutex::new(Vec::new()),
        };

        let threads = config.import_threads.max(1);
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.scope(|scope| {
                for import in imports {
                    load_import(scope, import, root_url.clone(), &state);
                }
            }),
            Err(err) => {
                issues.report(Issue::new(
                    Level::Platform,
                    format!("import worker pool unavailable: {}", err),
                ));
                rayon::scope(|scope| {
                    for import in presenter.import_locations() {
                        load_import(scope, import, root_url.clone(), &state);
                    }
                });
            }
        }

        // Merge in canonical-location order: composition is then
        // independent of worker completion order.
        let mut results = state.results.into_inner().unwrap();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        for (resource, raw, locator) in &results {
            tracing::debug!(%resource, "merging import");
            presenter.merge_import(raw, locator);
        }
    }

    Some(presenter)
}

// One import worker: a full load, read, and present cycle, then fan out
// the imports it discovers in turn.
fn load_import<'s>(
    scope: &rayon::Scope<'s>,
    location: Location,
    origin: Url,
    state: &'s ImportState<'s>,
) {
    scope.spawn(move |scope| {
        let (content, canonical) = match state.loader.open(&location, Some(&origin)) {
            Ok(hit) => hit,
            Err(err) => {
                state.issues.report(err.into_issue());
                return;
            }
        };
        if !state.visited.lock().unwrap().insert(canonical.clone()) {
            tracing::debug!(resource = %canonical, "import already admitted");
            return;
        }
        let (raw, locator) = match read_document(&content, &canonical) {
            Ok(read) => read,
            Err(err) => {
                state.issues.report(err.into_issue());
                return;
            }
        };

        // Imported documents inherit the root profile, and may import
        // further documents themselves.
        let child = state.kind.present(raw.clone(), locator.clone());
        for import in child.import_locations() {
            load_import(scope, import, canonical.clone(), state);
        }

        state
            .results
            .lock()
            .unwrap()
            .push((canonical, raw, locator));
    });
}
