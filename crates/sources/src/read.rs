use doc::{Locator, Value};
use url::Url;

/// A document that could not be parsed at all.
#[derive(thiserror::Error, Debug)]
#[error("{message} @{location}:{line}:{column}")]
pub struct SyntaxError {
    pub message: String,
    pub location: Url,
    pub line: u32,
    pub column: u32,
    pub snippet: Option<String>,
}

impl SyntaxError {
    pub fn into_issue(self) -> issues::Issue {
        let mut issue = issues::Issue::new(issues::Level::Syntax, self.message).at(
            self.location,
            self.line,
            self.column,
        );
        if let Some(snippet) = self.snippet {
            issue = issue.with_snippet(snippet);
        }
        issue
    }
}

/// Extract the source line at a 1-based position, for error snippets.
pub(crate) fn snippet_at(content: &str, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    content
        .lines()
        .nth(line as usize - 1)
        .map(|l| l.trim_end().to_string())
}

/// Read a JSON document. JSON carries no per-node positions, so the locator
/// is coarse: every node inherits the document location.
pub fn read_json(content: &str, source: &Url) -> Result<(Value, Locator), SyntaxError> {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(dom) => Ok((
            Value::from(dom),
            Locator::whole_document(std::sync::Arc::new(source.clone())),
        )),
        Err(err) => Err(SyntaxError {
            message: format!("JSON: {}", err),
            location: source.clone(),
            line: err.line() as u32,
            column: err.column() as u32,
            snippet: snippet_at(content, err.line() as u32),
        }),
    }
}

/// Read a document, selecting the reader from the resource's extension.
/// Everything that is not `.json` parses as YAML, of which JSON is mostly a
/// subset anyway.
pub fn read_document(content: &str, source: &Url) -> Result<(Value, Locator), SyntaxError> {
    if source.path().ends_with(".json") {
        read_json(content, source)
    } else {
        super::read_yaml(content, source)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json_reader_shares_the_output_contract() {
        let source = Url::parse("literal:doc.json").unwrap();
        let (value, locator) = read_json(r#"{"b": 1, "a": [true, null]}"#, &source).unwrap();

        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(locator.source.as_str(), "literal:doc.json");
    }

    #[test]
    fn json_syntax_error_carries_position() {
        let source = Url::parse("literal:doc.json").unwrap();
        let err = read_json("{\"a\": \n nope}", &source).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.snippet.is_some());
    }
}
