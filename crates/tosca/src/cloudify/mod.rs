//! The Cloudify DSL profile: blueprint presentations, validation, and
//! derivation into the deployment model.

pub mod modeling;
pub mod templates;

pub use modeling::{build_types, derive};
pub use templates::{parse_dsl_version, Blueprint};

use issues::IssueSink;
use presentation::{Presented, TypeCatalog, TypeCategory, ValidateCx};

/// Register built-in and declared names for the reference validators.
pub fn build_catalog(blueprint: &Blueprint) -> TypeCatalog {
    let mut catalog = TypeCatalog::new();

    let types = modeling::build_types(blueprint, &IssueSink::new());
    for name in types.node.iter_descendants() {
        catalog.insert(TypeCategory::Node, name, types.node.get_parent(name));
    }
    for name in types.relationship.iter_descendants() {
        catalog.insert(
            TypeCategory::Relationship,
            name,
            types.relationship.get_parent(name),
        );
    }
    for name in types.policy.iter_descendants() {
        catalog.insert(TypeCategory::Policy, name, types.policy.get_parent(name));
    }

    for (name, parent) in crate::simple_v1_0::modeling::BUILTIN_DATA_TYPES {
        catalog.insert(TypeCategory::Data, name, *parent);
    }
    for (name, data_type) in blueprint.data_types() {
        catalog.insert(TypeCategory::Data, &name, data_type.derived_from().as_deref());
    }

    let node_templates = blueprint.node_templates();
    for name in node_templates.keys() {
        catalog.insert(TypeCategory::NodeTemplate, name, None);
    }
    let groups = blueprint.groups();
    for name in groups.keys() {
        catalog.insert(TypeCategory::GroupTemplate, name, None);
    }

    catalog
}

/// Validate a presented blueprint: the generic schema-table walk plus
/// this profile's cross-checks (which live in the field checks).
pub fn validate(blueprint: &Blueprint, issues: &IssueSink) {
    let catalog = build_catalog(blueprint);
    let mut cx = ValidateCx::new(issues, &catalog);
    blueprint.validate(&mut cx);
}
