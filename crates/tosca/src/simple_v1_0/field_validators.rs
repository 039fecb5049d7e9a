//! Field checks specific to this profile, attached to descriptors as
//! [`FieldCheck::Custom`] entries.

use crate::data_types::PrimitiveType;
use doc::{Locator, Value};
use issues::Level;
use presentation::{Core, FieldDescriptor, TypeCategory, ValidateCx};

/// The field must name a data type: complex (declared) or primitive.
pub fn data_type_exists(
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let name = match value.as_str() {
        Some(name) => name,
        None => return,
    };
    if PrimitiveType::from_name(name).is_some() {
        return;
    }
    if !cx.catalog.contains(TypeCategory::Data, name) {
        cx.report(
            Level::BetweenTypes,
            format!(
                "field {:?} of {:?} refers to an unknown data type: {:?}",
                field.name,
                core.fullname(),
                name
            ),
            locator,
        );
    }
}

/// `derived_from` of a data type: a declared complex type or a primitive.
/// Primitives have no further derivation hierarchy, so cycle checking only
/// applies to the complex case.
pub fn data_type_derived_from(
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let name = match value.as_str() {
        Some(name) => name,
        None => return,
    };
    if PrimitiveType::from_name(name).is_some() {
        return;
    }
    data_type_exists(core, field, value, locator, cx);
    if cx.catalog.contains(TypeCategory::Data, name)
        && cx.catalog.is_cyclic(TypeCategory::Data, &core.name)
    {
        cx.report(
            Level::BetweenTypes,
            format!(
                "\"derived_from\" of data type {:?} creates a circular type hierarchy",
                core.fullname()
            ),
            locator,
        );
    }
}

/// `in_range` arguments: exactly two elements, and when both are plain
/// numbers the lower bound must be below the upper (or UNBOUNDED).
pub fn in_range_shape(
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let report = |cx: &mut ValidateCx, detail: &str| {
        cx.report(
            Level::Field,
            format!(
                "constraint {:?} of {:?} {}",
                field.name,
                core.fullname(),
                detail
            ),
            locator,
        );
    };
    let items = match value.as_seq() {
        Some(items) if items.len() == 2 => items,
        _ => {
            report(cx, "is not a list of exactly 2 elements");
            return;
        }
    };
    if items[1].as_str() == Some("UNBOUNDED") {
        return;
    }
    if let (Some(lower), Some(upper)) = (items[0].as_float(), items[1].as_float()) {
        if lower >= upper {
            report(cx, "has an upper bound not greater than the lower bound");
        }
    }
}

/// The `pattern` argument must compile as a regular expression.
pub fn pattern_compiles(
    core: &Core,
    field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    let pattern = match value.as_str() {
        Some(p) => p,
        None => return,
    };
    if let Err(err) = regex::Regex::new(pattern) {
        cx.report(
            Level::Field,
            format!(
                "constraint {:?} of {:?} is not a valid regular expression: {}",
                field.name,
                core.fullname(),
                err
            ),
            locator,
        );
    }
}

/// A constraint clause holds exactly one operator.
pub fn constraint_clause_operators(clause: &super::misc::ConstraintClause, cx: &mut ValidateCx) {
    let operators = clause.raw().as_map().map(|m| m.len()).unwrap_or(0);
    if operators != 1 {
        cx.report(
            Level::Field,
            format!(
                "constraint clause {:?} must hold exactly one operator, found {}",
                clause.fullname(),
                operators
            ),
            clause.locator(),
        );
    }
}

/// `copy:` may not name the declaring template itself. Resolution against
/// the sibling table happens during derivation.
pub fn copy_not_self(
    core: &Core,
    _field: &FieldDescriptor,
    value: &Value,
    locator: &Locator,
    cx: &mut ValidateCx,
) {
    if value.as_str() == Some(core.name.as_str()) {
        cx.report(
            Level::BetweenFields,
            format!("template {:?} copies itself", core.fullname()),
            locator,
        );
    }
}
