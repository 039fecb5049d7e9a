use super::validate::ValidateCx;
use doc::{Children, Locator, Map, Value};
use indexmap::IndexMap;

/// Scalar kinds a primitive field may declare.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Str,
    Int,
    Float,
    Bool,
    /// Accepts any raw value, containers included.
    Any,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Str => "string",
            PrimitiveKind::Int => "integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Any => "value",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::Str => coerce_str(value).is_some(),
            PrimitiveKind::Int => coerce_int(value).is_some(),
            PrimitiveKind::Float => coerce_float(value).is_some(),
            PrimitiveKind::Bool => coerce_bool(value).is_some(),
            PrimitiveKind::Any => true,
        }
    }
}

/// How a field parses its raw child.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    PrimitiveList(PrimitiveKind),
    Object,
    ObjectList,
    ObjectDict,
    /// An ordered list of single-entry mappings: `- name: {..}`.
    ObjectSequencedList,
    /// Every key not claimed by another descriptor parses as a child object.
    UnknownFieldsDict,
}

/// Type-erased operations over a child presentation class.
#[derive(Copy, Clone)]
pub struct ChildOps {
    pub class_name: &'static str,
    pub validate: fn(core: Core, cx: &mut ValidateCx),
}

impl std::fmt::Debug for ChildOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildOps")
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// A reference check attached to a field descriptor, run during validation
/// after the structural pass accepted the field's value.
#[derive(Copy, Clone)]
pub enum FieldCheck {
    /// The string value must name a type of the category.
    TypeExists(super::TypeCategory),
    /// The string value must name a type of one of the categories.
    TypeExistsOneOf(&'static [super::TypeCategory]),
    /// Each string element must name a type of the category.
    EachTypeExists(super::TypeCategory),
    /// Each string element must name a type of one of the categories.
    EachTypeExistsOneOf(&'static [super::TypeCategory]),
    /// The string value must name a parent type of the category, and the
    /// resulting ancestry must be acyclic.
    DerivedFrom(super::TypeCategory),
    /// A profile-supplied check.
    Custom(fn(&Core, &FieldDescriptor, &Value, &Locator, &mut ValidateCx)),
}

/// One row of a presentation class's schema table.
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub child: Option<ChildOps>,
    pub required: bool,
    pub check: Option<FieldCheck>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind, child: Option<ChildOps>) -> Self {
        FieldDescriptor {
            name,
            kind,
            child,
            required: false,
            check: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn check(mut self, check: FieldCheck) -> Self {
        self.check = Some(check);
        self
    }
}

/// The static schema of a presentation class.
pub struct ClassSchema {
    pub name: &'static str,
    /// When declared and the raw is not a mapping, the raw wraps into
    /// `{short_form: raw}` at construction.
    pub short_form: Option<&'static str>,
    /// Accept keys that no descriptor claims.
    pub allow_unknown: bool,
    pub fields: &'static [FieldDescriptor],
}

impl ClassSchema {
    pub fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.name == key)
    }

    pub fn unknown_dict(&self) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::UnknownFieldsDict))
    }
}

/// The state every presentation instance carries: its canonical name, the
/// path of its containers (for messages), and the raw subtree with its
/// locator. Presentations never mutate the raw they were given.
#[derive(Debug, Clone)]
pub struct Core {
    pub name: String,
    pub container: String,
    pub raw: Value,
    pub locator: Locator,
}

impl Core {
    pub fn root(raw: Value, locator: Locator) -> Core {
        Core {
            name: String::new(),
            container: String::new(),
            raw,
            locator,
        }
    }

    pub fn child(parent: &Core, name: &str, raw: Value, locator: Locator) -> Core {
        Core {
            name: name.to_string(),
            container: parent.fullname(),
            raw,
            locator,
        }
    }

    /// Dotted path naming this presentation in diagnostics.
    pub fn fullname(&self) -> String {
        match (self.container.is_empty(), self.name.is_empty()) {
            (_, true) => self.container.clone(),
            (true, false) => self.name.clone(),
            (false, false) => format!("{}.{}", self.container, self.name),
        }
    }

    /// Expand a declared short form: any non-mapping raw becomes
    /// `{key: raw}`, with the locator following it down.
    pub fn normalize_short_form(&mut self, key: &str) {
        if self.raw.as_map().is_some() {
            return;
        }
        let value = std::mem::take(&mut self.raw);
        let mut entries = Map::new();
        entries.insert(key.to_string(), value);
        self.raw = Value::Map(entries);

        let mut children = IndexMap::new();
        children.insert(
            key.to_string(),
            Locator {
                source: self.locator.source.clone(),
                span: self.locator.span,
                children: Children::None,
            },
        );
        self.locator = Locator::map(self.locator.source.clone(), self.locator.span, children);
    }
}

/// A presentation class: a typed overlay described by a static schema.
pub trait Presented: Sized {
    fn schema() -> &'static ClassSchema;
    /// Wrap a Core, applying short-form normalization.
    fn from_core(core: Core) -> Self;
    fn core(&self) -> &Core;

    fn validate(&self, cx: &mut ValidateCx) {
        super::validate_fields(self, cx);
    }
}

/// Construct a child presentation over a raw subtree.
pub fn present_child<P: Presented>(
    parent: &Core,
    name: &str,
    raw: &Value,
    locator: &Locator,
) -> P {
    P::from_core(Core::child(parent, name, raw.clone(), locator.clone()))
}

/// An as-is presentation: wraps any raw value without a schema. Used where
/// a profile accepts arbitrary values (e.g. property assignments).
pub struct AsIs {
    core: Core,
}

static AS_IS_SCHEMA: ClassSchema = ClassSchema {
    name: "AsIs",
    short_form: None,
    allow_unknown: true,
    fields: &[],
};

impl Presented for AsIs {
    fn schema() -> &'static ClassSchema {
        &AS_IS_SCHEMA
    }
    fn from_core(core: Core) -> Self {
        AsIs { core }
    }
    fn core(&self) -> &Core {
        &self.core
    }
    fn validate(&self, _cx: &mut ValidateCx) {}
}

impl AsIs {
    pub fn value(&self) -> &Value {
        &self.core.raw
    }
    pub fn locator(&self) -> &Locator {
        &self.core.locator
    }
}

// Primitive coercions. Scalars cross-coerce where a document author would
// expect them to ("5" as an integer, 5 as a string); containers never do.

pub fn coerce_str(value: &Value) -> Option<String> {
    value.scalar_to_string()
}

pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Str(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
