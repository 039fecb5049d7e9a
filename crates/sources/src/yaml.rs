use super::read::{snippet_at, SyntaxError};
use doc::{Locator, Map, Span, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Read a YAML document into a raw value plus an isomorphic locator tree.
///
/// Mapping insertion order is preserved, every node is annotated with its
/// 1-based (line, column), anchors and aliases are resolved, and `<<` merge
/// keys are flattened into the containing mapping with explicit keys
/// winning.
pub fn read_yaml(content: &str, source: &Url) -> Result<(Value, Locator), SyntaxError> {
    let source = Arc::new(source.clone());
    let mut builder = Builder {
        source: source.clone(),
        stack: Vec::new(),
        root: None,
        anchors: HashMap::new(),
        error: None,
    };

    let mut parser = Parser::new(content.chars());
    if let Err(scan) = parser.load(&mut builder, false) {
        let marker = *scan.marker();
        return Err(SyntaxError {
            message: format!("YAML: {}", scan),
            location: (*source).clone(),
            line: marker.line() as u32,
            column: marker.col() as u32 + 1,
            snippet: snippet_at(content, marker.line() as u32),
        });
    }

    if let Some((message, marker)) = builder.error {
        return Err(SyntaxError {
            message,
            location: (*source).clone(),
            line: marker.line() as u32,
            column: marker.col() as u32 + 1,
            snippet: snippet_at(content, marker.line() as u32),
        });
    }

    Ok(builder.root.unwrap_or_else(|| {
        // An empty document reads as an empty mapping.
        (
            Value::Map(Map::new()),
            Locator::whole_document(source),
        )
    }))
}

enum PendingKey {
    Plain(String),
    Merge,
}

enum Frame {
    Seq {
        anchor: usize,
        span: Span,
        values: Vec<Value>,
        locators: Vec<Locator>,
    },
    Map {
        anchor: usize,
        span: Span,
        entries: Map,
        locators: IndexMap<String, Locator>,
        pending_key: Option<PendingKey>,
        merges: Vec<(Value, Locator)>,
    },
}

struct Builder {
    source: Arc<Url>,
    stack: Vec<Frame>,
    root: Option<(Value, Locator)>,
    anchors: HashMap<usize, (Value, Locator)>,
    error: Option<(String, Marker)>,
}

impl Builder {
    fn span(&self, mark: Marker) -> Span {
        Span::new(mark.line() as u32, mark.col() as u32 + 1)
    }

    fn fail(&mut self, message: impl Into<String>, mark: Marker) {
        if self.error.is_none() {
            self.error = Some((message.into(), mark));
        }
    }

    // True when the next node fills a mapping key slot.
    fn expects_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Map {
                pending_key: None,
                ..
            })
        )
    }

    fn complete(&mut self, value: Value, locator: Locator, anchor: usize) {
        if anchor > 0 {
            self.anchors
                .insert(anchor, (value.clone(), locator.clone()));
        }
        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some((value, locator));
                }
            }
            Some(Frame::Seq {
                values, locators, ..
            }) => {
                values.push(value);
                locators.push(locator);
            }
            Some(Frame::Map {
                entries,
                locators,
                pending_key,
                merges,
                ..
            }) => match pending_key.take() {
                Some(PendingKey::Plain(key)) => {
                    entries.insert(key.clone(), value);
                    locators.insert(key, locator);
                }
                Some(PendingKey::Merge) => merges.push((value, locator)),
                // Key slots are filled by on_key, never by complete.
                None => unreachable!("value completed into a key slot"),
            },
        }
    }

    fn on_key(&mut self, text: String, is_merge: bool, mark: Marker) {
        match self.stack.last_mut() {
            Some(Frame::Map { pending_key, .. }) => {
                *pending_key = Some(if is_merge {
                    PendingKey::Merge
                } else {
                    PendingKey::Plain(text)
                });
            }
            _ => self.fail("internal: key outside of mapping", mark),
        }
    }

    fn apply_merges(
        &mut self,
        entries: &mut Map,
        locators: &mut IndexMap<String, Locator>,
        merges: Vec<(Value, Locator)>,
        mark: Marker,
    ) {
        for (merge_value, merge_locator) in merges {
            match &merge_value {
                Value::Map(spread) => {
                    spread_entries(entries, locators, spread, &merge_locator);
                }
                Value::Seq(items) => {
                    for (index, item) in items.iter().enumerate() {
                        match item.as_map() {
                            Some(spread) => spread_entries(
                                entries,
                                locators,
                                spread,
                                merge_locator.index(index),
                            ),
                            None => {
                                self.fail(
                                    "YAML: merge key value must be a mapping or a list of mappings",
                                    mark,
                                );
                                return;
                            }
                        }
                    }
                }
                _ => {
                    self.fail(
                        "YAML: merge key value must be a mapping or a list of mappings",
                        mark,
                    );
                    return;
                }
            }
        }
    }
}

// Spread merged entries into a mapping; keys already present win.
fn spread_entries(
    entries: &mut Map,
    locators: &mut IndexMap<String, Locator>,
    spread: &Map,
    spread_locator: &Locator,
) {
    for (key, value) in spread {
        if !entries.contains_key(key) {
            entries.insert(key.clone(), value.clone());
            locators.insert(key.clone(), spread_locator.get(key).clone());
        }
    }
}

impl MarkedEventReceiver for Builder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(text, style, anchor, tag) => {
                if self.expects_key() {
                    let plain = matches!(style, TScalarStyle::Plain);
                    let is_merge = (plain && tag.is_none() && text == "<<")
                        || matches!(&tag, Some(t) if t.suffix == "merge");
                    self.on_key(text, is_merge, mark);
                    return;
                }
                let locator = Locator::leaf(self.source.clone(), self.span(mark));
                match resolve_scalar(text, style, tag.as_ref()) {
                    Ok(value) => self.complete(value, locator, anchor),
                    Err(message) => self.fail(message, mark),
                }
            }
            Event::SequenceStart(anchor, _) => {
                if self.expects_key() {
                    self.fail("YAML: mapping keys must be scalars", mark);
                    return;
                }
                self.stack.push(Frame::Seq {
                    anchor,
                    span: self.span(mark),
                    values: Vec::new(),
                    locators: Vec::new(),
                });
            }
            Event::SequenceEnd => {
                match self.stack.pop() {
                    Some(Frame::Seq {
                        anchor,
                        span,
                        values,
                        locators,
                    }) => {
                        let locator = Locator::seq(self.source.clone(), span, locators);
                        self.complete(Value::Seq(values), locator, anchor);
                    }
                    _ => self.fail("internal: unbalanced sequence end", mark),
                }
            }
            Event::MappingStart(anchor, _) => {
                if self.expects_key() {
                    self.fail("YAML: mapping keys must be scalars", mark);
                    return;
                }
                self.stack.push(Frame::Map {
                    anchor,
                    span: self.span(mark),
                    entries: Map::new(),
                    locators: IndexMap::new(),
                    pending_key: None,
                    merges: Vec::new(),
                });
            }
            Event::MappingEnd => {
                match self.stack.pop() {
                    Some(Frame::Map {
                        anchor,
                        span,
                        mut entries,
                        mut locators,
                        merges,
                        ..
                    }) => {
                        self.apply_merges(&mut entries, &mut locators, merges, mark);
                        if self.error.is_some() {
                            return;
                        }
                        let locator = Locator::map(self.source.clone(), span, locators);
                        self.complete(Value::Map(entries), locator, anchor);
                    }
                    _ => self.fail("internal: unbalanced mapping end", mark),
                }
            }
            Event::Alias(anchor) => {
                let resolved = self.anchors.get(&anchor).cloned();
                match resolved {
                    None => self.fail("YAML: alias refers to an unknown anchor", mark),
                    Some((value, locator)) => {
                        if self.expects_key() {
                            match value.as_str() {
                                Some(key) => self.on_key(key.to_string(), false, mark),
                                None => {
                                    self.fail("YAML: mapping keys must be scalars", mark)
                                }
                            }
                        } else {
                            self.complete(value, locator, 0);
                        }
                    }
                }
            }
            _ => (),
        }
    }
}

// Core-schema scalar resolution, with explicit tags taking precedence.
fn resolve_scalar(
    text: String,
    style: TScalarStyle,
    tag: Option<&Tag>,
) -> Result<Value, String> {
    if let Some(tag) = tag {
        return match tag.suffix.as_str() {
            "str" => Ok(Value::Str(text)),
            "null" => Ok(Value::Null),
            "bool" => parse_bool(&text)
                .ok_or_else(|| format!("YAML: {:?} is not a boolean", text)),
            "int" => parse_int(&text)
                .ok_or_else(|| format!("YAML: {:?} is not an integer", text)),
            "float" => parse_float(&text)
                .ok_or_else(|| format!("YAML: {:?} is not a float", text)),
            // Unknown application tags keep their natural parse.
            _ => Ok(resolve_plain(text, style)),
        };
    }
    Ok(resolve_plain(text, style))
}

fn resolve_plain(text: String, style: TScalarStyle) -> Value {
    if !matches!(style, TScalarStyle::Plain) {
        return Value::Str(text);
    }
    match text.as_str() {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        _ => (),
    }
    if let Some(b) = parse_bool(&text) {
        return b;
    }
    if let Some(i) = parse_int(&text) {
        return i;
    }
    if let Some(f) = parse_float(&text) {
        return f;
    }
    Value::Str(text)
}

fn parse_bool(text: &str) -> Option<Value> {
    match text {
        "true" | "True" | "TRUE" => Some(Value::Bool(true)),
        "false" | "False" | "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = body.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse::<i64>().ok()?
    };
    Some(Value::Int(sign * magnitude))
}

fn parse_float(text: &str) -> Option<Value> {
    match text {
        ".inf" | "+.inf" | ".Inf" | "+.Inf" => return Some(Value::Float(f64::INFINITY)),
        "-.inf" | "-.Inf" => return Some(Value::Float(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => return Some(Value::Float(f64::NAN)),
        _ => (),
    }
    // Reject forms the float grammar shares with other types ("1", "0x2").
    if !text.contains(|c| c == '.' || c == 'e' || c == 'E') {
        return None;
    }
    text.parse::<f64>().ok().map(Value::Float)
}

#[cfg(test)]
mod test {
    use super::*;

    fn read(content: &str) -> (Value, Locator) {
        let source = Url::parse("literal:doc").unwrap();
        read_yaml(content, &source).unwrap()
    }

    #[test]
    fn mapping_order_and_scalar_typing() {
        let (value, _) = read(
            "zulu: 1\nalpha: true\nmike: 2.5\nnul: ~\ntext: 'quoted 3'\nplain: hello\n",
        );
        let map = value.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike", "nul", "text", "plain"]);

        assert_eq!(map.get("zulu").unwrap(), &Value::Int(1));
        assert_eq!(map.get("alpha").unwrap(), &Value::Bool(true));
        assert_eq!(map.get("mike").unwrap(), &Value::Float(2.5));
        assert_eq!(map.get("nul").unwrap(), &Value::Null);
        assert_eq!(map.get("text").unwrap(), &Value::Str("quoted 3".into()));
        assert_eq!(map.get("plain").unwrap(), &Value::Str("hello".into()));
    }

    #[test]
    fn locators_point_at_values() {
        let (_, locator) = read("a: 1\nnested:\n  deep: x\nlist:\n  - one\n  - two\n");

        assert_eq!(locator.get("a").span, Span::new(1, 4));
        assert_eq!(locator.descend(&["nested", "deep"]).span, Span::new(3, 9));
        assert_eq!(locator.get("list").index(1).span, Span::new(6, 5));
        // Misses inherit the nearest ancestor.
        assert_eq!(locator.get("absent").span, locator.span);
    }

    #[test]
    fn anchors_and_aliases_resolve() {
        let (value, _) = read("base: &b\n  x: 1\nother: *b\n");
        assert_eq!(
            value.get("other").unwrap().get("x").unwrap(),
            &Value::Int(1)
        );
    }

    #[test]
    fn merge_keys_flatten_with_explicit_keys_winning() {
        let (value, locator) = read(
            "defaults: &d\n  retries: 3\n  timeout: 60\njob:\n  <<: *d\n  timeout: 10\n",
        );
        let job = value.get("job").unwrap().as_map().unwrap();
        assert_eq!(job.get("timeout").unwrap(), &Value::Int(10));
        assert_eq!(job.get("retries").unwrap(), &Value::Int(3));
        // Flattened children exist in the locator too.
        assert_eq!(locator.get("job").get("retries").span, Span::new(2, 12));

        let keys: Vec<&str> = job.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["timeout", "retries"]);
    }

    #[test]
    fn syntax_errors_carry_position_and_snippet() {
        let source = Url::parse("literal:doc").unwrap();
        let err = read_yaml("ok: 1\n  bad indent: [\n", &source).unwrap_err();
        assert!(err.message.starts_with("YAML:"));
        assert!(err.line >= 2);
        assert!(err.snippet.is_some());
    }

    #[test]
    fn empty_document_reads_as_empty_mapping() {
        let (value, _) = read("");
        assert_eq!(value, Value::Map(Map::new()));
    }

    #[test]
    fn numeric_keys_stay_textual() {
        let (value, _) = read("1: one\n2: two\n");
        let map = value.as_map().unwrap();
        assert_eq!(map.get("1").unwrap(), &Value::Str("one".into()));
    }
}
