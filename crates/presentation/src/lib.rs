//! Typed overlays for raw document trees.
//!
//! A presentation class declares a static schema table of field
//! descriptors; instances wrap a raw mapping (plus its locator) and parse
//! fields on access. Validation walks the descriptor tables recursively,
//! reporting structural problems and reference checks as issues without
//! short-circuiting.

mod catalog;
mod core;
mod macros;
#[cfg(test)]
mod tests;
mod validate;

// Crates the generated code leans on; re-exported so that `$crate::` paths
// in the macro expansions resolve for downstream users.
pub use doc;
pub use indexmap;

pub use catalog::{TypeCatalog, TypeCategory};
pub use self::core::{
    coerce_bool, coerce_float, coerce_int, coerce_str, present_child, AsIs, ChildOps,
    ClassSchema, Core, FieldCheck, FieldDescriptor, FieldKind, Presented, PrimitiveKind,
};
pub use validate::{validate_erased, validate_fields, ValidateCx};

/// No presentation class accepts the root document.
#[derive(thiserror::Error, Debug)]
#[error("no presenter accepts this document; is the version field missing or unknown?")]
pub struct PresenterNotFound;

/// A field value that cannot be coerced to its declared kind.
#[derive(thiserror::Error, Debug)]
#[error("field {field:?} of {holder:?} is not a valid {expected}: got {actual}")]
pub struct InvalidValueError {
    pub holder: String,
    pub field: String,
    pub expected: &'static str,
    pub actual: &'static str,
}

impl InvalidValueError {
    pub fn into_issue(self, locator: &doc::Locator) -> issues::Issue {
        issues::Issue::new(issues::Level::Field, self.to_string()).at_locator(locator)
    }
}
