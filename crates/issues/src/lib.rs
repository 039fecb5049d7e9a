use doc::Locator;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use url::Url;

/// Severity and phase of an issue. Ordering is significant: a run fails
/// when any issue reaches the configured threshold level.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Implementation or environment fault.
    Platform,
    /// The document could not be read at all.
    Syntax,
    /// A single field holds an unusable value.
    Field,
    /// Two or more fields of one entity disagree.
    BetweenFields,
    /// A cross-entity or cross-type reference is wrong.
    BetweenTypes,
    /// Reported by an external consumer of the pipeline.
    External,
    /// Catch-all; always at or above any threshold.
    All,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Platform => "platform",
            Level::Syntax => "syntax",
            Level::Field => "field",
            Level::BetweenFields => "between-fields",
            Level::BetweenTypes => "between-types",
            Level::External => "external",
            Level::All => "all",
        };
        f.write_str(name)
    }
}

/// A located diagnostic. Issues are the unit of communication between
/// pipeline stages and the caller: stages convert their failures into
/// Issues and keep going wherever they can.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub level: Level,
    pub message: String,
    pub location: Option<Url>,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Issue {
    pub fn new(level: Level, message: impl Into<String>) -> Issue {
        Issue {
            level,
            message: message.into(),
            location: None,
            line: 0,
            column: 0,
            snippet: None,
            cause: None,
        }
    }

    /// Attach the position of a raw-tree locator.
    pub fn at_locator(mut self, locator: &Locator) -> Issue {
        self.location = Some((*locator.source).clone());
        self.line = locator.span.line;
        self.column = locator.span.column;
        self
    }

    pub fn at(mut self, location: Url, line: u32, column: u32) -> Issue {
        self.location = Some(location);
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Issue {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_cause(mut self, cause: &dyn std::error::Error) -> Issue {
        self.cause = Some(cause.to_string());
        self
    }

    // Identity used for deduplication and ordering.
    fn key(&self) -> (Option<&str>, u32, u32, Level, &str) {
        (
            self.location.as_ref().map(Url::as_str),
            self.line,
            self.column,
            self.level,
            &self.message,
        )
    }
}

impl PartialEq for Issue {
    fn eq(&self, other: &Issue) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " @{}", location)?;
            if self.line > 0 {
                write!(f, ":{}:{}", self.line, self.column)?;
            }
        }
        Ok(())
    }
}

/// Append-only, deduplicating sink of Issues, shared by reference across
/// pipeline stages and import workers.
#[derive(Debug, Default)]
pub struct IssueSink {
    issues: Mutex<Vec<Issue>>,
}

impl IssueSink {
    pub fn new() -> IssueSink {
        Default::default()
    }

    /// Record an issue, dropping exact duplicates.
    pub fn report(&self, issue: Issue) {
        let mut issues = self.issues.lock().unwrap();
        if !issues.contains(&issue) {
            issues.push(issue);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.lock().unwrap().len()
    }

    /// Issues ordered for presentation: by location, position, level, and
    /// finally message.
    pub fn sorted(&self) -> Vec<Issue> {
        let mut issues = self.issues.lock().unwrap().clone();
        issues.sort_by(|a, b| {
            let ka = (
                a.location.as_ref().map(Url::to_string),
                a.line,
                a.column,
                a.level,
                a.message.clone(),
            );
            let kb = (
                b.location.as_ref().map(Url::to_string),
                b.line,
                b.column,
                b.level,
                b.message.clone(),
            );
            ka.cmp(&kb)
        });
        issues
    }

    pub fn max_level(&self) -> Option<Level> {
        self.issues.lock().unwrap().iter().map(|i| i.level).max()
    }

    pub fn count_at_or_above(&self, level: Level) -> usize {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.level >= level)
            .count()
    }

    /// Count of issues per level, in level order, for the run summary.
    pub fn counts(&self) -> Vec<(Level, usize)> {
        let issues = self.issues.lock().unwrap();
        let mut counts: Vec<(Level, usize)> = Vec::new();
        for issue in issues.iter() {
            match counts.iter_mut().find(|(l, _)| *l == issue.level) {
                Some((_, n)) => *n += 1,
                None => counts.push((issue.level, 1)),
            }
        }
        counts.sort_by_key(|(l, _)| *l);
        counts
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sink_dedupes_on_identity() {
        let sink = IssueSink::new();
        let url = Url::parse("literal:doc").unwrap();

        sink.report(Issue::new(Level::Field, "bad value").at(url.clone(), 3, 1));
        sink.report(Issue::new(Level::Field, "bad value").at(url.clone(), 3, 1));
        sink.report(Issue::new(Level::Field, "bad value").at(url, 4, 1));

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn sorted_orders_by_position_then_level() {
        let sink = IssueSink::new();
        let url = Url::parse("literal:doc").unwrap();

        sink.report(Issue::new(Level::BetweenTypes, "late").at(url.clone(), 9, 1));
        sink.report(Issue::new(Level::Field, "early").at(url.clone(), 2, 1));
        sink.report(Issue::new(Level::Syntax, "also line two").at(url, 2, 2));

        let sorted = sink.sorted();
        assert_eq!(sorted[0].message, "early");
        assert_eq!(sorted[1].message, "also line two");
        assert_eq!(sorted[2].message, "late");
    }

    #[test]
    fn threshold_counting() {
        let sink = IssueSink::new();
        sink.report(Issue::new(Level::Platform, "low"));
        sink.report(Issue::new(Level::BetweenTypes, "high"));

        assert_eq!(sink.count_at_or_above(Level::Syntax), 1);
        assert_eq!(sink.max_level(), Some(Level::BetweenTypes));
        assert_eq!(
            sink.counts(),
            vec![(Level::Platform, 1), (Level::BetweenTypes, 1)]
        );
    }
}
