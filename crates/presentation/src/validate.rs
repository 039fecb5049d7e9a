use super::core::{ChildOps, Core, FieldCheck, FieldDescriptor, FieldKind, Presented};
use super::{TypeCatalog, TypeCategory};
use doc::{Locator, Value};
use issues::{Issue, IssueSink, Level};

/// Everything the validation walk needs: the shared issue sink and the
/// read-only catalog of declared type names.
pub struct ValidateCx<'a> {
    pub issues: &'a IssueSink,
    pub catalog: &'a TypeCatalog,
}

impl<'a> ValidateCx<'a> {
    pub fn new(issues: &'a IssueSink, catalog: &'a TypeCatalog) -> ValidateCx<'a> {
        ValidateCx { issues, catalog }
    }

    pub fn report(&mut self, level: Level, message: String, locator: &Locator) {
        self.issues.report(Issue::new(level, message).at_locator(locator));
    }
}

/// Validate a presentation of an erased class; the entry point stored in
/// field descriptors for child recursion.
pub fn validate_erased<P: Presented>(core: Core, cx: &mut ValidateCx) {
    P::from_core(core).validate(cx);
}

/// The structural pass driven by the class's schema table: required
/// fields, kind compatibility, unknown-field rejection, per-field checks,
/// and recursion into object-kind children.
pub fn validate_fields<P: Presented>(presentation: &P, cx: &mut ValidateCx) {
    let core = presentation.core();
    let schema = P::schema();

    let raw_map = match core.raw.as_map() {
        Some(m) => m,
        None => {
            if schema.fields.is_empty() && schema.allow_unknown {
                return;
            }
            cx.report(
                Level::Field,
                format!(
                    "{:?} must be a mapping, not {}",
                    core.fullname(),
                    core.raw.type_name()
                ),
                &core.locator,
            );
            return;
        }
    };

    for field in schema.fields {
        let locator = core.locator.get(field.name);
        let value = raw_map.get(field.name);

        match value {
            None => {
                if field.required {
                    cx.report(
                        Level::Field,
                        format!(
                            "required field {:?} is missing in {:?}",
                            field.name,
                            core.fullname()
                        ),
                        &core.locator,
                    );
                }
                continue;
            }
            Some(value) => {
                validate_kind(core, field, value, locator, cx);
                if let Some(check) = &field.check {
                    run_check(check, core, field, value, locator, cx);
                }
            }
        }
    }

    // Keys claimed by no descriptor are rejected unless the class opted in
    // or routes them through an unknown-fields dict.
    if !schema.allow_unknown && schema.unknown_dict().is_none() {
        for key in raw_map.keys() {
            if !schema.declares(key) {
                cx.report(
                    Level::Field,
                    format!("unknown field {:?} in {:?}", key, core.fullname()),
                    core.locator.get(key),
                );
            }
        }
    }

    if let Some(field) = schema.unknown_dict() {
        let ops = field.child.as_ref().expect("unknown dict declares a child");
        for (key, value) in raw_map {
            if schema.declares(key) {
                continue;
            }
            recurse(core, ops, key, value, core.locator.get(key), cx);
        }
    }
}

fn validate_kind(
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let report_kind = |cx: &mut ValidateCx, expected: &'static str| {
        let err = crate::InvalidValueError {
            holder: core.fullname(),
            field: field.name.to_string(),
            expected,
            actual: value.type_name(),
        };
        cx.issues.report(err.into_issue(locator));
    };

    match field.kind {
        FieldKind::Primitive(kind) => {
            if !kind.accepts(value) {
                report_kind(cx, kind.name());
            }
        }
        FieldKind::PrimitiveList(kind) => match value.as_seq() {
            None => report_kind(cx, "list"),
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !kind.accepts(item) {
                        cx.report(
                            Level::Field,
                            format!(
                                "element {} of field {:?} of {:?} is not a valid {}: got {}",
                                index,
                                field.name,
                                core.fullname(),
                                kind.name(),
                                item.type_name()
                            ),
                            locator.index(index),
                        );
                    }
                }
            }
        },
        FieldKind::Object => {
            let ops = field.child.as_ref().expect("object field declares a child");
            recurse(core, ops, field.name, value, locator, cx);
        }
        FieldKind::ObjectList => match value.as_seq() {
            None => report_kind(cx, "list"),
            Some(items) => {
                let ops = field.child.as_ref().expect("object field declares a child");
                for (index, item) in items.iter().enumerate() {
                    recurse(
                        core,
                        ops,
                        &index.to_string(),
                        item,
                        locator.index(index),
                        cx,
                    );
                }
            }
        },
        FieldKind::ObjectDict => match value.as_map() {
            None => report_kind(cx, "map"),
            Some(entries) => {
                let ops = field.child.as_ref().expect("object field declares a child");
                for (key, item) in entries {
                    recurse(core, ops, key, item, locator.get(key), cx);
                }
            }
        },
        FieldKind::ObjectSequencedList => match value.as_seq() {
            None => report_kind(cx, "list"),
            Some(items) => {
                let ops = field.child.as_ref().expect("object field declares a child");
                for (index, item) in items.iter().enumerate() {
                    let entry = item.as_map().filter(|m| m.len() == 1);
                    match entry {
                        None => {
                            cx.report(
                                Level::Field,
                                format!(
                                    "element {} of field {:?} of {:?} must be a single-entry mapping",
                                    index,
                                    field.name,
                                    core.fullname()
                                ),
                                locator.index(index),
                            );
                        }
                        Some(entry) => {
                            let (key, item) = entry.iter().next().unwrap();
                            recurse(
                                core,
                                ops,
                                key,
                                item,
                                locator.index(index).get(key),
                                cx,
                            );
                        }
                    }
                }
            }
        },
        // Handled by the unknown-fields sweep of validate_fields.
        FieldKind::UnknownFieldsDict => (),
    }
}

fn recurse(
    parent: &Core,
    ops: &ChildOps,
    name: &str,
    raw: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let child = Core::child(parent, name, raw.clone(), locator.clone());
    (ops.validate)(child, cx);
}

fn run_check(
    check: &FieldCheck,
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    match check {
        FieldCheck::TypeExists(category) => {
            if let Some(name) = value.as_str() {
                check_type_exists(&[*category], name, core, field, locator, cx);
            }
        }
        FieldCheck::TypeExistsOneOf(categories) => {
            if let Some(name) = value.as_str() {
                check_type_exists(categories, name, core, field, locator, cx);
            }
        }
        FieldCheck::EachTypeExists(category) => {
            if let Some(items) = value.as_seq() {
                for (index, item) in items.iter().enumerate() {
                    if let Some(name) = item.as_str() {
                        check_type_exists(
                            &[*category],
                            name,
                            core,
                            field,
                            locator.index(index),
                            cx,
                        );
                    }
                }
            }
        }
        FieldCheck::EachTypeExistsOneOf(categories) => {
            if let Some(items) = value.as_seq() {
                for (index, item) in items.iter().enumerate() {
                    if let Some(name) = item.as_str() {
                        check_type_exists(categories, name, core, field, locator.index(index), cx);
                    }
                }
            }
        }
        FieldCheck::DerivedFrom(category) => {
            let parent = match value.as_str() {
                Some(p) => p,
                None => return,
            };
            if !cx.catalog.contains(*category, parent) {
                check_type_exists(&[*category], parent, core, field, locator, cx);
                return;
            }
            if cx.catalog.is_cyclic(*category, &core.name) {
                cx.report(
                    Level::BetweenTypes,
                    format!(
                        "{:?} of {} type {:?} creates a circular type hierarchy",
                        field.name,
                        category,
                        core.fullname()
                    ),
                    locator,
                );
            }
        }
        FieldCheck::Custom(check) => check(core, field, value, locator, cx),
    }
}

fn check_type_exists(
    categories: &[TypeCategory],
    name: &str,
    core: &Core,
    field: &FieldDescriptor,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    if categories.iter().any(|c| cx.catalog.contains(*c, name)) {
        return;
    }
    let expected = categories
        .iter()
        .map(TypeCategory::name)
        .collect::<Vec<_>>()
        .join(" or ");
    cx.report(
        Level::BetweenTypes,
        format!(
            "field {:?} of {:?} refers to an unknown {}: {:?}",
            field.name,
            core.fullname(),
            expected,
            name
        ),
        locator,
    );
}
