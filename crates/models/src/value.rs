use super::plan::DeploymentPlan;
use super::template::DeploymentTemplate;
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};

// Functions deeper than this are assumed to be self-referential.
const MAX_COERCE_DEPTH: u32 = 16;

/// A template or instance value: either literal raw data, or an intrinsic
/// function resolved later against the plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(doc::Value),
    Function(Function),
}

/// The intrinsic functions. One case per intrinsic; resolution is a match,
/// not dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// `{get_input: name}` — reads the plan's inputs.
    GetInput(String),
    /// `{get_property: [entity, name, ...]}` — reads template properties.
    GetProperty(Vec<String>),
    /// `{get_attribute: [entity, name, ...]}` — reads instance state.
    GetAttribute(Vec<String>),
    /// `{concat: [values...]}` — stringifies and joins its arguments.
    Concat(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Literal(doc::Value::Null)
    }
}

impl Value {
    /// Recognize intrinsic-function shapes in raw data. A mapping with a
    /// single well-known key parses as a Function; everything else stays
    /// literal (nested functions inside containers resolve during
    /// coercion).
    pub fn parse(raw: &doc::Value) -> Value {
        if let Some(map) = raw.as_map() {
            if map.len() == 1 {
                let (key, arg) = map.iter().next().unwrap();
                match key.as_str() {
                    "get_input" => {
                        if let Some(name) = single_string(arg) {
                            return Value::Function(Function::GetInput(name));
                        }
                    }
                    "get_property" => {
                        if let Some(path) = string_list(arg) {
                            return Value::Function(Function::GetProperty(path));
                        }
                    }
                    "get_attribute" => {
                        if let Some(path) = string_list(arg) {
                            return Value::Function(Function::GetAttribute(path));
                        }
                    }
                    "concat" => {
                        if let Some(args) = arg.as_seq() {
                            return Value::Function(Function::Concat(
                                args.iter().map(Value::parse).collect(),
                            ));
                        }
                    }
                    _ => (),
                }
            }
        }
        Value::Literal(raw.clone())
    }

    pub fn literal(raw: doc::Value) -> Value {
        Value::Literal(raw)
    }

    pub fn as_literal(&self) -> Option<&doc::Value> {
        match self {
            Value::Literal(raw) => Some(raw),
            Value::Function(_) => None,
        }
    }

    /// Render back to raw data, functions in their document shape.
    pub fn as_raw(&self) -> doc::Value {
        match self {
            Value::Literal(raw) => raw.clone(),
            Value::Function(function) => function.as_raw(),
        }
    }
}

impl Function {
    pub fn as_raw(&self) -> doc::Value {
        let mut map = doc::Map::new();
        match self {
            Function::GetInput(name) => {
                map.insert("get_input".to_string(), doc::Value::Str(name.clone()));
            }
            Function::GetProperty(path) => {
                map.insert(
                    "get_property".to_string(),
                    doc::Value::Seq(path.iter().cloned().map(doc::Value::Str).collect()),
                );
            }
            Function::GetAttribute(path) => {
                map.insert(
                    "get_attribute".to_string(),
                    doc::Value::Seq(path.iter().cloned().map(doc::Value::Str).collect()),
                );
            }
            Function::Concat(args) => {
                map.insert(
                    "concat".to_string(),
                    doc::Value::Seq(args.iter().map(Value::as_raw).collect()),
                );
            }
        }
        doc::Value::Map(map)
    }
}

fn single_string(arg: &doc::Value) -> Option<String> {
    match arg {
        doc::Value::Seq(items) if items.len() == 1 => items[0].scalar_to_string(),
        other => other.scalar_to_string(),
    }
}

fn string_list(arg: &doc::Value) -> Option<Vec<String>> {
    let items = arg.as_seq()?;
    let path: Vec<String> = items.iter().filter_map(doc::Value::scalar_to_string).collect();
    if path.len() == items.len() && !path.is_empty() {
        Some(path)
    } else {
        None
    }
}

/// The resolution context for value coercion: the owning plan and
/// template, and the identity of the node the value sits on.
pub struct CoerceCx<'a> {
    pub template: &'a DeploymentTemplate,
    pub plan: &'a DeploymentPlan,
    pub self_node_id: Option<&'a str>,
    pub issues: &'a IssueSink,
}

impl<'a> CoerceCx<'a> {
    fn report(&self, message: String) {
        self.issues.report(Issue::new(Level::Field, message));
    }
}

/// Resolve `value` as far as the context allows, returning its replacement.
/// Idempotent: a fully-literal value returns unchanged, and an unresolvable
/// `get_attribute` keeps its function form for a later pass.
pub fn coerce(value: &Value, cx: &CoerceCx) -> Value {
    coerce_inner(value, cx, 0)
}

fn coerce_inner(value: &Value, cx: &CoerceCx, depth: u32) -> Value {
    if depth > MAX_COERCE_DEPTH {
        cx.report("intrinsic function nesting is too deep (is it self-referential?)".to_string());
        return Value::Literal(doc::Value::Null);
    }
    match value {
        Value::Literal(raw) => Value::Literal(coerce_raw(raw, cx, depth)),
        Value::Function(function) => eval(function, cx, depth),
    }
}

// Resolve function shapes nested inside literal containers.
fn coerce_raw(raw: &doc::Value, cx: &CoerceCx, depth: u32) -> doc::Value {
    match raw {
        doc::Value::Seq(items) => doc::Value::Seq(
            items
                .iter()
                .map(|item| coerce_raw(item, cx, depth + 1))
                .collect(),
        ),
        doc::Value::Map(_) => match Value::parse(raw) {
            Value::Function(function) => eval(&function, cx, depth + 1).as_raw(),
            Value::Literal(doc::Value::Map(entries)) => doc::Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), coerce_raw(v, cx, depth + 1)))
                    .collect(),
            ),
            Value::Literal(other) => other,
        },
        other => other.clone(),
    }
}

fn eval(function: &Function, cx: &CoerceCx, depth: u32) -> Value {
    match function {
        Function::GetInput(name) => match cx.plan.inputs.get(name) {
            Some(parameter) => coerce_inner(&parameter.value, cx, depth + 1),
            None => {
                cx.report(format!("get_input refers to an unknown input: {:?}", name));
                Value::Literal(doc::Value::Null)
            }
        },
        Function::GetProperty(path) => eval_get_property(path, cx, depth),
        // Attributes are runtime state; resolve them against instance
        // properties when possible and otherwise stay symbolic.
        Function::GetAttribute(path) => match lookup_instance_value(path, cx) {
            Some(value) => coerce_inner(&value, cx, depth + 1),
            None => Value::Function(function.clone()),
        },
        Function::Concat(args) => {
            let mut joined = String::new();
            for arg in args {
                match coerce_inner(arg, cx, depth + 1) {
                    Value::Literal(raw) => match raw.scalar_to_string() {
                        Some(text) => joined.push_str(&text),
                        None => {
                            cx.report(
                                "concat argument does not stringify to a scalar".to_string(),
                            );
                        }
                    },
                    // An unresolved argument keeps the whole concat symbolic.
                    Value::Function(_) => return Value::Function(function.clone()),
                }
            }
            Value::Literal(doc::Value::Str(joined))
        }
    }
}

fn eval_get_property(path: &[String], cx: &CoerceCx, depth: u32) -> Value {
    let (entity, rest) = match path.split_first() {
        Some(split) => split,
        None => return Value::Literal(doc::Value::Null),
    };
    let template_name = match resolve_entity_template(entity, cx) {
        Some(name) => name,
        None => {
            cx.report(format!(
                "get_property refers to an unknown modelable entity: {:?}",
                entity
            ));
            return Value::Literal(doc::Value::Null);
        }
    };
    let node_template = match cx.template.node_templates.get(&template_name) {
        Some(t) => t,
        None => {
            cx.report(format!(
                "get_property refers to an unknown node template: {:?}",
                template_name
            ));
            return Value::Literal(doc::Value::Null);
        }
    };
    let (property, nested) = match rest.split_first() {
        Some(split) => split,
        None => return Value::Literal(doc::Value::Null),
    };
    match node_template.properties.get(property) {
        Some(parameter) => {
            let resolved = coerce_inner(&parameter.value, cx, depth + 1);
            descend_raw(resolved, nested, cx)
        }
        None => {
            cx.report(format!(
                "get_property refers to an unknown property {:?} of {:?}",
                property, template_name
            ));
            Value::Literal(doc::Value::Null)
        }
    }
}

// SELF resolves through the coercion context; anything else names a
// template (for properties) or instance id (for attributes).
fn resolve_entity_template(entity: &str, cx: &CoerceCx) -> Option<String> {
    if entity == "SELF" {
        let id = cx.self_node_id?;
        if let Some(node) = cx.plan.nodes.get(id) {
            return Some(node.template_name.clone());
        }
        // During template coercion SELF is already a template name.
        return Some(id.to_string());
    }
    if cx.template.node_templates.contains_key(entity) {
        return Some(entity.to_string());
    }
    None
}

fn lookup_instance_value(path: &[String], cx: &CoerceCx) -> Option<Value> {
    let (entity, rest) = path.split_first()?;
    let node = if entity == "SELF" {
        cx.plan.nodes.get(cx.self_node_id?)?
    } else {
        // Accept an instance id, or fall back on a template's first instance.
        match cx.plan.nodes.get(entity) {
            Some(node) => node,
            None => cx
                .plan
                .nodes
                .values()
                .find(|n| &n.template_name == entity)?,
        }
    };
    let (attribute, nested) = rest.split_first()?;
    let parameter = node.properties.get(attribute)?;
    match descend_raw(parameter.value.clone(), nested, cx) {
        Value::Literal(raw) => Some(Value::Literal(raw)),
        function => Some(function),
    }
}

// Walk nested path segments into a resolved literal.
fn descend_raw(value: Value, nested: &[String], cx: &CoerceCx) -> Value {
    if nested.is_empty() {
        return value;
    }
    let mut cursor = match value {
        Value::Literal(raw) => raw,
        function => return function,
    };
    for segment in nested {
        let next = match &cursor {
            doc::Value::Map(map) => map.get(segment).cloned(),
            doc::Value::Seq(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned()),
            _ => None,
        };
        match next {
            Some(value) => cursor = value,
            None => {
                cx.report(format!(
                    "nested lookup {:?} does not exist in the referenced value",
                    segment
                ));
                return Value::Literal(doc::Value::Null);
            }
        }
    }
    Value::Literal(cursor)
}

/// Values keyed by name; the shape of every property and input table.
pub type ValueMap = IndexMap<String, Value>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_function_shapes() {
        let mut map = doc::Map::new();
        map.insert("get_input".to_string(), doc::Value::Str("port".into()));
        let parsed = Value::parse(&doc::Value::Map(map));
        assert_eq!(
            parsed,
            Value::Function(Function::GetInput("port".to_string()))
        );

        // Two keys is not a function shape.
        let mut map = doc::Map::new();
        map.insert("get_input".to_string(), doc::Value::Str("port".into()));
        map.insert("other".to_string(), doc::Value::Null);
        assert!(matches!(Value::parse(&doc::Value::Map(map)), Value::Literal(_)));
    }

    #[test]
    fn function_round_trips_to_raw() {
        let function = Function::Concat(vec![
            Value::Literal(doc::Value::Str("a".into())),
            Value::Function(Function::GetInput("x".to_string())),
        ]);
        let raw = function.as_raw();
        assert_eq!(Value::parse(&raw), Value::Function(function));
    }
}
