use doc::{Locator, Value};
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};
use std::cmp::Ordering;

/// The built-in primitive types shared by both profiles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Null,
    Version,
    Range,
    List,
    Map,
    ScalarUnitSize,
    ScalarUnitTime,
    ScalarUnitFrequency,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        Some(match name {
            "string" => PrimitiveType::String,
            "integer" => PrimitiveType::Integer,
            "float" => PrimitiveType::Float,
            "boolean" => PrimitiveType::Boolean,
            "timestamp" => PrimitiveType::Timestamp,
            "null" => PrimitiveType::Null,
            "version" => PrimitiveType::Version,
            "range" => PrimitiveType::Range,
            "list" => PrimitiveType::List,
            "map" => PrimitiveType::Map,
            "scalar-unit.size" => PrimitiveType::ScalarUnitSize,
            "scalar-unit.time" => PrimitiveType::ScalarUnitTime,
            "scalar-unit.frequency" => PrimitiveType::ScalarUnitFrequency,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Timestamp => "timestamp",
            PrimitiveType::Null => "null",
            PrimitiveType::Version => "version",
            PrimitiveType::Range => "range",
            PrimitiveType::List => "list",
            PrimitiveType::Map => "map",
            PrimitiveType::ScalarUnitSize => "scalar-unit.size",
            PrimitiveType::ScalarUnitTime => "scalar-unit.time",
            PrimitiveType::ScalarUnitFrequency => "scalar-unit.frequency",
        }
    }
}

/// A declared constraint clause, arguments still raw; they coerce to the
/// constrained type at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equal(Value),
    GreaterThan(Value),
    GreaterOrEqual(Value),
    LessThan(Value),
    LessOrEqual(Value),
    InRange(Value, Value),
    ValidValues(Vec<Value>),
    Length(i64),
    MinLength(i64),
    MaxLength(i64),
    Pattern(String),
}

impl Constraint {
    /// Parse one `{operator: argument}` clause. Unknown operators and
    /// malformed arguments return None; the caller reports.
    pub fn from_clause(operator: &str, argument: &Value) -> Option<Constraint> {
        Some(match operator {
            "equal" => Constraint::Equal(argument.clone()),
            "greater_than" => Constraint::GreaterThan(argument.clone()),
            "greater_or_equal" => Constraint::GreaterOrEqual(argument.clone()),
            "less_than" => Constraint::LessThan(argument.clone()),
            "less_or_equal" => Constraint::LessOrEqual(argument.clone()),
            "in_range" => {
                let items = argument.as_seq()?;
                if items.len() != 2 {
                    return None;
                }
                Constraint::InRange(items[0].clone(), items[1].clone())
            }
            "valid_values" => Constraint::ValidValues(argument.as_seq()?.to_vec()),
            "length" => Constraint::Length(argument.as_int()?),
            "min_length" => Constraint::MinLength(argument.as_int()?),
            "max_length" => Constraint::MaxLength(argument.as_int()?),
            "pattern" => Constraint::Pattern(argument.as_str()?.to_string()),
            _ => return None,
        })
    }
}

/// A property declared by a complex data type.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub type_name: String,
    pub required: bool,
    pub default: Option<Value>,
    pub entry_schema: Option<String>,
    pub constraints: Vec<Constraint>,
}

/// A complex data type, flattened from its presentation.
#[derive(Debug, Clone, Default)]
pub struct DataTypeInfo {
    pub parent: Option<String>,
    pub properties: IndexMap<String, PropertyInfo>,
    pub constraints: Vec<Constraint>,
}

/// Everything value coercion needs: the issue sink and the catalog of
/// declared complex data types.
pub struct CoercionEnv<'a> {
    pub issues: &'a IssueSink,
    pub data_types: &'a IndexMap<String, DataTypeInfo>,
}

impl<'a> CoercionEnv<'a> {
    fn report(&self, message: String, locator: &Locator) {
        self.issues
            .report(Issue::new(Level::Field, message).at_locator(locator));
    }

    /// The nearest primitive ancestor of a complex type, if any.
    pub fn primitive_ancestor(&self, type_name: &str) -> Option<PrimitiveType> {
        let mut cursor = type_name;
        let mut hops = 0;
        loop {
            if let Some(primitive) = PrimitiveType::from_name(cursor) {
                return Some(primitive);
            }
            let info = self.data_types.get(cursor)?;
            cursor = info.parent.as_deref()?;
            hops += 1;
            if hops > self.data_types.len() + 1 {
                return None;
            }
        }
    }

    // Declared properties across the type hierarchy, nearest ancestor
    // definition winning.
    fn merged_properties(&self, type_name: &str) -> IndexMap<String, PropertyInfo> {
        let mut chain: Vec<&DataTypeInfo> = Vec::new();
        let mut cursor = self.data_types.get(type_name);
        while let Some(info) = cursor {
            if chain.iter().any(|c| std::ptr::eq(*c, info)) {
                break;
            }
            chain.push(info);
            cursor = info.parent.as_deref().and_then(|p| self.data_types.get(p));
        }
        let mut merged: IndexMap<String, PropertyInfo> = IndexMap::new();
        for info in chain.iter().rev() {
            for (name, property) in &info.properties {
                merged.insert(name.clone(), property.clone());
            }
        }
        merged
    }

    fn inherited_constraints(&self, type_name: &str) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        let mut cursor = self.data_types.get(type_name);
        let mut hops = 0;
        while let Some(info) = cursor {
            constraints.extend(info.constraints.iter().cloned());
            cursor = info.parent.as_deref().and_then(|p| self.data_types.get(p));
            hops += 1;
            if hops > self.data_types.len() + 1 {
                break;
            }
        }
        constraints
    }
}

/// Coerce a raw value to a declared type, applying constraints, and
/// reporting failures as issues. Intrinsic-function shapes pass through
/// untouched; they resolve during plan coercion.
///
/// Returns the (possibly normalized) value, or None when it is unusable.
pub fn coerce_value(
    env: &CoercionEnv,
    type_name: &str,
    entry_schema: Option<&str>,
    constraints: &[Constraint],
    raw: &Value,
    locator: &Locator,
    context: &str,
) -> Option<Value> {
    if is_function_shape(raw) {
        return Some(raw.clone());
    }

    let coerced = if let Some(primitive) = PrimitiveType::from_name(type_name) {
        coerce_primitive(env, primitive, entry_schema, raw, locator, context)?
    } else if env.data_types.contains_key(type_name) {
        match env.primitive_ancestor(type_name) {
            Some(primitive) => coerce_primitive(env, primitive, entry_schema, raw, locator, context)?,
            None => coerce_record(env, type_name, raw, locator, context)?,
        }
    } else {
        env.report(
            format!("unknown data type {:?} in {}", type_name, context),
            locator,
        );
        return None;
    };

    let mut all = env.inherited_constraints(type_name);
    all.extend(constraints.iter().cloned());
    let mut ok = true;
    for constraint in &all {
        if !evaluate_constraint(env, type_name, constraint, &coerced, locator, context) {
            ok = false;
        }
    }
    ok.then(|| coerced)
}

fn is_function_shape(raw: &Value) -> bool {
    matches!(models::Value::parse(raw), models::Value::Function(_))
}

fn coerce_primitive(
    env: &CoercionEnv,
    primitive: PrimitiveType,
    entry_schema: Option<&str>,
    raw: &Value,
    locator: &Locator,
    context: &str,
) -> Option<Value> {
    let fail = |what: &str| {
        env.report(
            format!(
                "{} is not a valid {} in {}: got {}",
                what,
                primitive.name(),
                context,
                raw.type_name()
            ),
            locator,
        );
    };

    match primitive {
        PrimitiveType::String => match raw.scalar_to_string() {
            Some(s) => Some(Value::Str(s)),
            None => {
                fail("value");
                None
            }
        },
        PrimitiveType::Integer => match raw {
            Value::Int(_) => Some(raw.clone()),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Some(Value::Int(i)),
                Err(_) => {
                    fail("value");
                    None
                }
            },
            _ => {
                fail("value");
                None
            }
        },
        PrimitiveType::Float => match raw.as_float() {
            Some(f) => Some(Value::Float(f)),
            None => match raw.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                Some(f) => Some(Value::Float(f)),
                None => {
                    fail("value");
                    None
                }
            },
        },
        PrimitiveType::Boolean => match raw {
            Value::Bool(_) => Some(raw.clone()),
            Value::Str(s) if s == "true" => Some(Value::Bool(true)),
            Value::Str(s) if s == "false" => Some(Value::Bool(false)),
            _ => {
                fail("value");
                None
            }
        },
        PrimitiveType::Null => match raw {
            Value::Null => Some(Value::Null),
            _ => {
                fail("value");
                None
            }
        },
        PrimitiveType::Timestamp => match raw.as_str() {
            Some(s) if parse_timestamp(s).is_some() => Some(raw.clone()),
            _ => {
                fail("timestamp");
                None
            }
        },
        PrimitiveType::Version => match raw.scalar_to_string() {
            Some(s) if parse_version(&s).is_some() => Some(Value::Str(s)),
            _ => {
                fail("version");
                None
            }
        },
        PrimitiveType::Range => {
            let well_formed = raw
                .as_seq()
                .map(|items| {
                    items.len() == 2
                        && items[0].as_int().is_some()
                        && (items[1].as_int().is_some()
                            || items[1].as_str() == Some("UNBOUNDED"))
                })
                .unwrap_or(false);
            if well_formed {
                Some(raw.clone())
            } else {
                fail("range");
                None
            }
        }
        PrimitiveType::List => match raw.as_seq() {
            Some(items) => {
                let coerced = coerce_entries(
                    env,
                    entry_schema,
                    items.iter().enumerate().map(|(i, v)| (i.to_string(), v)),
                    locator,
                    context,
                )?;
                Some(Value::Seq(coerced.into_iter().map(|(_, v)| v).collect()))
            }
            None => {
                fail("value");
                None
            }
        },
        PrimitiveType::Map => match raw.as_map() {
            Some(entries) => {
                let coerced = coerce_entries(
                    env,
                    entry_schema,
                    entries.iter().map(|(k, v)| (k.clone(), v)),
                    locator,
                    context,
                )?;
                Some(Value::Map(coerced.into_iter().collect()))
            }
            None => {
                fail("value");
                None
            }
        },
        PrimitiveType::ScalarUnitSize
        | PrimitiveType::ScalarUnitTime
        | PrimitiveType::ScalarUnitFrequency => match raw.as_str() {
            Some(s) if parse_scalar_unit(primitive, s).is_some() => Some(raw.clone()),
            _ => {
                fail("scalar unit");
                None
            }
        },
    }
}

// Coerce list/map entries against an entry schema, when declared.
fn coerce_entries<'v>(
    env: &CoercionEnv,
    entry_schema: Option<&str>,
    entries: impl Iterator<Item = (String, &'v Value)>,
    locator: &Locator,
    context: &str,
) -> Option<Vec<(String, Value)>> {
    let mut out = Vec::new();
    for (key, value) in entries {
        let coerced = match entry_schema {
            None => value.clone(),
            Some(entry_type) => coerce_value(
                env,
                entry_type,
                None,
                &[],
                value,
                locator.get(&key),
                &format!("entry {:?} of {}", key, context),
            )?,
        };
        out.push((key, coerced));
    }
    Some(out)
}

// A record data type: named typed properties, no primitive ancestor.
fn coerce_record(
    env: &CoercionEnv,
    type_name: &str,
    raw: &Value,
    locator: &Locator,
    context: &str,
) -> Option<Value> {
    let entries = match raw.as_map() {
        Some(m) => m,
        None => {
            env.report(
                format!(
                    "value of data type {:?} must be a mapping in {}: got {}",
                    type_name,
                    context,
                    raw.type_name()
                ),
                locator,
            );
            return None;
        }
    };
    let declared = env.merged_properties(type_name);

    let mut out = doc::Map::new();
    let mut ok = true;
    for (name, property) in &declared {
        let value = entries.get(name).cloned().or_else(|| property.default.clone());
        match value {
            None if property.required => {
                env.report(
                    format!(
                        "required property {:?} of data type {:?} has no value in {}",
                        name, type_name, context
                    ),
                    locator,
                );
                ok = false;
            }
            None => (),
            Some(value) => {
                match coerce_value(
                    env,
                    &property.type_name,
                    property.entry_schema.as_deref(),
                    &property.constraints,
                    &value,
                    locator.get(name),
                    &format!("property {:?} of {}", name, context),
                ) {
                    Some(coerced) => {
                        out.insert(name.clone(), coerced);
                    }
                    None => ok = false,
                }
            }
        }
    }
    for name in entries.keys() {
        if !declared.contains_key(name) {
            env.report(
                format!(
                    "unknown property {:?} of data type {:?} in {}",
                    name, type_name, context
                ),
                locator.get(name),
            );
            ok = false;
        }
    }
    ok.then(|| Value::Map(out))
}

fn evaluate_constraint(
    env: &CoercionEnv,
    type_name: &str,
    constraint: &Constraint,
    value: &Value,
    locator: &Locator,
    context: &str,
) -> bool {
    let violated = |env: &CoercionEnv, what: &str| {
        env.report(
            format!("value violates the {} constraint in {}", what, context),
            locator,
        );
        false
    };

    match constraint {
        Constraint::Equal(arg) => match compare(env, type_name, value, arg) {
            Some(Ordering::Equal) => true,
            _ => violated(env, "equal"),
        },
        Constraint::GreaterThan(arg) => match compare(env, type_name, value, arg) {
            Some(Ordering::Greater) => true,
            _ => violated(env, "greater_than"),
        },
        Constraint::GreaterOrEqual(arg) => match compare(env, type_name, value, arg) {
            Some(Ordering::Greater) | Some(Ordering::Equal) => true,
            _ => violated(env, "greater_or_equal"),
        },
        Constraint::LessThan(arg) => match compare(env, type_name, value, arg) {
            Some(Ordering::Less) => true,
            _ => violated(env, "less_than"),
        },
        Constraint::LessOrEqual(arg) => match compare(env, type_name, value, arg) {
            Some(Ordering::Less) | Some(Ordering::Equal) => true,
            _ => violated(env, "less_or_equal"),
        },
        Constraint::InRange(lower, upper) => {
            let above = matches!(
                compare(env, type_name, value, lower),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            );
            let below = upper.as_str() == Some("UNBOUNDED")
                || matches!(
                    compare(env, type_name, value, upper),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                );
            if above && below {
                true
            } else {
                violated(env, "in_range")
            }
        }
        Constraint::ValidValues(values) => {
            if values
                .iter()
                .any(|v| compare(env, type_name, value, v) == Some(Ordering::Equal))
            {
                true
            } else {
                violated(env, "valid_values")
            }
        }
        Constraint::Length(expected) => match value_length(value) {
            Some(len) if len == *expected => true,
            _ => violated(env, "length"),
        },
        Constraint::MinLength(min) => match value_length(value) {
            Some(len) if len >= *min => true,
            _ => violated(env, "min_length"),
        },
        Constraint::MaxLength(max) => match value_length(value) {
            Some(len) if len <= *max => true,
            _ => violated(env, "max_length"),
        },
        Constraint::Pattern(pattern) => match regex::Regex::new(pattern) {
            Ok(re) => {
                let text = value.scalar_to_string().unwrap_or_default();
                if re.is_match(&text) {
                    true
                } else {
                    violated(env, "pattern")
                }
            }
            // A non-compiling pattern was already reported during
            // presentation validation.
            Err(_) => true,
        },
    }
}

fn value_length(value: &Value) -> Option<i64> {
    match value {
        Value::Str(s) => Some(s.chars().count() as i64),
        Value::Seq(items) => Some(items.len() as i64),
        Value::Map(entries) => Some(entries.len() as i64),
        _ => None,
    }
}

/// Compare two values under the semantics of the given type: scalar units
/// and versions compare by parsed magnitude, numbers numerically, and
/// everything else by natural value.
fn compare(env: &CoercionEnv, type_name: &str, left: &Value, right: &Value) -> Option<Ordering> {
    let primitive = PrimitiveType::from_name(type_name).or_else(|| env.primitive_ancestor(type_name));

    match primitive {
        Some(
            unit @ (PrimitiveType::ScalarUnitSize
            | PrimitiveType::ScalarUnitTime
            | PrimitiveType::ScalarUnitFrequency),
        ) => {
            let l = parse_scalar_unit(unit, left.as_str()?)?;
            let r = parse_scalar_unit(unit, right.as_str()?)?;
            l.partial_cmp(&r)
        }
        Some(PrimitiveType::Version) => {
            let l = parse_version(&left.scalar_to_string()?)?;
            let r = parse_version(&right.scalar_to_string()?)?;
            Some(l.cmp(&r))
        }
        Some(PrimitiveType::Timestamp) => {
            let l = parse_timestamp(left.as_str()?)?;
            let r = parse_timestamp(right.as_str()?)?;
            Some(l.cmp(&r))
        }
        _ => match (left, right) {
            (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
            (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
            _ => {
                let (l, r) = (left.as_float(), right.as_float());
                match (l, r) {
                    (Some(l), Some(r)) => l.partial_cmp(&r),
                    _ => {
                        if left == right {
                            Some(Ordering::Equal)
                        } else {
                            None
                        }
                    }
                }
            }
        },
    }
}

/// Parse `<number> <unit>` into a magnitude in the type's base unit.
pub fn parse_scalar_unit(primitive: PrimitiveType, text: &str) -> Option<f64> {
    let text = text.trim();
    let split = text
        .find(|c: char| c.is_ascii_alphabetic())
        .filter(|&i| i > 0)?;
    let (number, unit) = text.split_at(split);
    let number: f64 = number.trim().parse().ok()?;

    let multiplier = match primitive {
        PrimitiveType::ScalarUnitSize => match unit.trim() {
            "B" => 1.0,
            "kB" => 1_000.0,
            "KiB" => 1_024.0,
            "MB" => 1_000_000.0,
            "MiB" => 1_048_576.0,
            "GB" => 1e9,
            "GiB" => 1_073_741_824.0,
            "TB" => 1e12,
            "TiB" => 1_099_511_627_776.0,
            _ => return None,
        },
        PrimitiveType::ScalarUnitTime => match unit.trim() {
            "d" => 86_400.0,
            "h" => 3_600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" => 1e-6,
            "ns" => 1e-9,
            _ => return None,
        },
        PrimitiveType::ScalarUnitFrequency => match unit.trim() {
            "Hz" => 1.0,
            "kHz" => 1_000.0,
            "MHz" => 1_000_000.0,
            "GHz" => 1e9,
            _ => return None,
        },
        _ => return None,
    };
    Some(number * multiplier)
}

/// TOSCA version: `major.minor[.fix[.qualifier[-build]]]`.
pub fn parse_version(text: &str) -> Option<(u64, u64, u64, String, u64)> {
    let text = text.trim();
    let (numbers, qualifier) = {
        let mut parts = text.splitn(4, '.');
        let major: u64 = parts.next()?.parse().ok()?;
        let minor: u64 = parts.next()?.parse().ok()?;
        let fix: u64 = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        ((major, minor, fix), parts.next().unwrap_or(""))
    };
    let (qualifier, build) = match qualifier.rsplit_once('-') {
        Some((q, b)) => match b.parse::<u64>() {
            Ok(build) => (q.to_string(), build),
            Err(_) => (qualifier.to_string(), 0),
        },
        None => (qualifier.to_string(), 0),
    };
    Some((numbers.0, numbers.1, numbers.2, qualifier, build))
}

pub fn parse_timestamp(text: &str) -> Option<chrono::NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    fn env_fixture() -> (IssueSink, IndexMap<String, DataTypeInfo>) {
        let mut data_types = IndexMap::new();

        // A constrained string.
        data_types.insert(
            "test.Port".to_string(),
            DataTypeInfo {
                parent: Some("integer".to_string()),
                properties: IndexMap::new(),
                constraints: vec![Constraint::InRange(Value::Int(1), Value::Int(65_535))],
            },
        );

        // A record.
        let mut properties = IndexMap::new();
        properties.insert(
            "host".to_string(),
            PropertyInfo {
                type_name: "string".to_string(),
                required: true,
                default: None,
                entry_schema: None,
                constraints: vec![],
            },
        );
        properties.insert(
            "port".to_string(),
            PropertyInfo {
                type_name: "test.Port".to_string(),
                required: false,
                default: Some(Value::Int(80)),
                entry_schema: None,
                constraints: vec![],
            },
        );
        data_types.insert(
            "test.Endpoint".to_string(),
            DataTypeInfo {
                parent: None,
                properties,
                constraints: vec![],
            },
        );

        (IssueSink::new(), data_types)
    }

    fn locator() -> Locator {
        Locator::whole_document(Arc::new(url::Url::parse("literal:test").unwrap()))
    }

    #[test]
    fn primitive_coercion_with_derived_constraints() {
        let (sink, data_types) = env_fixture();
        let env = CoercionEnv {
            issues: &sink,
            data_types: &data_types,
        };

        let ok = coerce_value(&env, "test.Port", None, &[], &Value::Str("8080".into()), &locator(), "t");
        assert_eq!(ok, Some(Value::Int(8080)));
        assert!(sink.is_empty());

        let bad = coerce_value(&env, "test.Port", None, &[], &Value::Int(70_000), &locator(), "t");
        assert_eq!(bad, None);
        assert_eq!(sink.len(), 1);
        assert!(sink.sorted()[0].message.contains("in_range"));
    }

    #[test]
    fn record_coercion_applies_defaults_and_rejects_unknowns() {
        let (sink, data_types) = env_fixture();
        let env = CoercionEnv {
            issues: &sink,
            data_types: &data_types,
        };

        let mut raw = doc::Map::new();
        raw.insert("host".to_string(), Value::Str("example".into()));
        let coerced = coerce_value(
            &env,
            "test.Endpoint",
            None,
            &[],
            &Value::Map(raw),
            &locator(),
            "t",
        )
        .unwrap();
        assert_eq!(coerced.get("port"), Some(&Value::Int(80)));

        let mut raw = doc::Map::new();
        raw.insert("host".to_string(), Value::Str("example".into()));
        raw.insert("bogus".to_string(), Value::Null);
        assert!(coerce_value(
            &env,
            "test.Endpoint",
            None,
            &[],
            &Value::Map(raw),
            &locator(),
            "t"
        )
        .is_none());
        assert!(sink.sorted().iter().any(|i| i.message.contains("unknown property")));
    }

    #[test]
    fn list_entry_schema() {
        let (sink, data_types) = env_fixture();
        let env = CoercionEnv {
            issues: &sink,
            data_types: &data_types,
        };
        let coerced = coerce_value(
            &env,
            "list",
            Some("integer"),
            &[],
            &Value::Seq(vec![Value::Str("1".into()), Value::Int(2)]),
            &locator(),
            "t",
        );
        assert_eq!(
            coerced,
            Some(Value::Seq(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn scalar_units_and_versions_compare_by_magnitude() {
        assert!(
            parse_scalar_unit(PrimitiveType::ScalarUnitSize, "2 MB").unwrap()
                > parse_scalar_unit(PrimitiveType::ScalarUnitSize, "1999 kB").unwrap()
        );
        assert!(parse_scalar_unit(PrimitiveType::ScalarUnitTime, "500 ms").unwrap() < 1.0);
        assert!(parse_version("1.10.0").unwrap() > parse_version("1.9.9").unwrap());
        assert!(parse_version("2.0").is_some());
        assert!(parse_version("not-a-version").is_none());
    }

    #[test]
    fn functions_pass_through_untouched() {
        let (sink, data_types) = env_fixture();
        let env = CoercionEnv {
            issues: &sink,
            data_types: &data_types,
        };
        let mut raw = doc::Map::new();
        raw.insert("get_input".to_string(), Value::Str("port".into()));
        let function = Value::Map(raw);
        let coerced = coerce_value(&env, "test.Port", None, &[], &function, &locator(), "t");
        assert_eq!(coerced, Some(function));
        assert!(sink.is_empty());
    }
}
