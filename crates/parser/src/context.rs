use issues::{IssueSink, Level};
use models::{DeploymentPlan, DeploymentTemplate, Types};
use std::path::PathBuf;
use tosca::Presenter;

/// Pipeline configuration. Everything is explicit; there is no ambient or
/// thread-local state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Roots tried, in order, when a relative location misses its origin.
    pub search_paths: Vec<PathBuf>,
    /// Worker pool size for import resolution.
    pub import_threads: usize,
    /// The run fails when any issue reaches this level.
    pub fail_level: Level,
    /// Values overlaying the template's declared input defaults.
    pub inputs: indexmap::IndexMap<String, doc::Value>,
    /// Restore the historical group-member expansion, which included
    /// contained templates.
    pub legacy_group_members: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            search_paths: Vec::new(),
            import_threads: 10,
            fail_level: Level::Syntax,
            inputs: indexmap::IndexMap::new(),
            legacy_group_members: false,
        }
    }
}

/// The consumption context threaded through every stage: configuration,
/// the shared issue sink, and the artifacts produced so far. A stage that
/// cannot produce its output halts the chain, leaving later artifacts
/// unset.
pub struct Context {
    pub config: Config,
    pub issues: IssueSink,
    pub presentation: Option<Presenter>,
    pub template: Option<DeploymentTemplate>,
    pub types: Option<Types>,
    pub plan: Option<DeploymentPlan>,
    halted: bool,
}

impl Context {
    pub fn new(config: Config) -> Context {
        Context {
            config,
            issues: IssueSink::new(),
            presentation: None,
            template: None,
            types: None,
            plan: None,
            halted: false,
        }
    }

    /// Stop running further consumers of the active chain.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Whether the run accumulated issues at or above the failure level.
    pub fn failed(&self) -> bool {
        self.issues.count_at_or_above(self.config.fail_level) > 0
    }

    /// A one-line run summary: issue counts per level.
    pub fn summary(&self) -> String {
        if self.issues.is_empty() {
            return "no issues".to_string();
        }
        self.issues
            .counts()
            .into_iter()
            .map(|(level, count)| format!("{}: {}", level, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
