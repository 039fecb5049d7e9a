//! The TOSCA Simple Profile v1.0: presentation classes, profile
//! validation, and derivation into the deployment model.

pub mod definitions;
pub mod field_validators;
pub mod misc;
pub mod modeling;
pub mod templates;
pub mod types;

pub use modeling::{build_types, derive};
pub use templates::{ServiceTemplate, DSL_VERSION};

use indexmap::IndexMap;
use issues::{IssueSink, Level};
use presentation::{Presented, TypeCatalog, TypeCategory, ValidateCx};

/// Register built-in and declared type names (and template names) for the
/// reference validators.
pub fn build_catalog(service: &ServiceTemplate) -> TypeCatalog {
    let mut catalog = TypeCatalog::new();

    let types = modeling::build_types(service, &IssueSink::new());
    let register = |catalog: &mut TypeCatalog, category, index: &models::TypeIndex| {
        for name in index.iter_descendants() {
            catalog.insert(category, name, index.get_parent(name));
        }
    };
    register(&mut catalog, TypeCategory::Node, &types.node);
    register(&mut catalog, TypeCategory::Relationship, &types.relationship);
    register(&mut catalog, TypeCategory::Capability, &types.capability);
    register(&mut catalog, TypeCategory::Artifact, &types.artifact);
    register(&mut catalog, TypeCategory::Group, &types.group);
    register(&mut catalog, TypeCategory::Policy, &types.policy);

    for (name, parent) in modeling::BUILTIN_DATA_TYPES {
        catalog.insert(TypeCategory::Data, name, *parent);
    }
    for (name, data_type) in service.data_types() {
        catalog.insert(TypeCategory::Data, &name, data_type.derived_from().as_deref());
    }
    for (name, parent) in modeling::BUILTIN_INTERFACE_TYPES {
        catalog.insert(TypeCategory::Interface, name, *parent);
    }
    for (name, interface_type) in service.interface_types() {
        catalog.insert(
            TypeCategory::Interface,
            &name,
            interface_type.derived_from().as_deref(),
        );
    }

    if let Some(topology) = service.topology_template() {
        let node_templates = topology.node_templates();
        for name in node_templates.keys() {
            catalog.insert(TypeCategory::NodeTemplate, name, None);
        }
        let relationship_templates = topology.relationship_templates();
        for name in relationship_templates.keys() {
            catalog.insert(TypeCategory::RelationshipTemplate, name, None);
        }
        let groups = topology.groups();
        for name in groups.keys() {
            catalog.insert(TypeCategory::GroupTemplate, name, None);
        }
    }

    catalog
}

/// Run the full validation of a presented service template: the generic
/// schema-table walk plus this profile's cross-entity checks.
pub fn validate(service: &ServiceTemplate, issues: &IssueSink) {
    let catalog = build_catalog(service);
    let mut cx = ValidateCx::new(issues, &catalog);
    service.validate(&mut cx);
    validate_cross_entity(service, &mut cx);
}

// Checks that relate entities to one another: requirement capability
// agreement, node-filter properties, and policy target types.
fn validate_cross_entity(service: &ServiceTemplate, cx: &mut ValidateCx) {
    let topology = match service.topology_template() {
        Some(t) => t,
        None => return,
    };
    let issues = cx.issues;
    let types = modeling::build_types(service, &IssueSink::new());
    let node_type_presentations = service.node_types();
    let node_templates = topology.node_templates();
    let policy_types = service.policy_types();
    let group_templates = topology.groups();

    for (template_name, template) in &node_templates {
        for (requirement_name, requirement) in template.requirements() {
            let node_ref = requirement.node();
            let names_template = node_ref
                .as_deref()
                .map(|n| node_templates.contains_key(n))
                .unwrap_or(false);

            if let Some(capability) = requirement.capability() {
                let is_capability_type = types.capability.contains(&capability);

                if is_capability_type && node_ref.is_some() {
                    issues.report(
                        issues::Issue::new(
                            Level::BetweenFields,
                            format!(
                                "requirement {:?} of {:?} refers to a capability type even though \"node\" has a value",
                                requirement_name, template_name
                            ),
                        )
                        .at_locator(requirement.locator()),
                    );
                } else if !is_capability_type {
                    // Must then be a capability name on the target
                    // template's type.
                    let known = node_ref
                        .as_deref()
                        .filter(|n| names_template)
                        .and_then(|n| node_templates.get(n))
                        .and_then(|target| target.type_name())
                        .map(|target_type| {
                            modeling::merged_node_type(
                                &node_type_presentations,
                                &types,
                                &target_type,
                            )
                            .capabilities
                            .contains_key(&capability)
                        })
                        .unwrap_or(false);
                    if !known {
                        issues.report(
                            issues::Issue::new(
                                Level::BetweenTypes,
                                format!(
                                    "requirement {:?} of {:?} refers to an unknown capability definition or capability type: {:?}",
                                    requirement_name, template_name, capability
                                ),
                            )
                            .at_locator(requirement.locator()),
                        );
                    }
                }
            }

            // A node filter only makes sense against a node type, and its
            // properties must exist there.
            if let Some(filter) = requirement.node_filter() {
                match node_ref.as_deref().filter(|n| !names_template) {
                    None => issues.report(
                        issues::Issue::new(
                            Level::BetweenFields,
                            format!(
                                "requirement {:?} of {:?} has a node filter even though \"node\" does not refer to a node type",
                                requirement_name, template_name
                            ),
                        )
                        .at_locator(filter.locator()),
                    ),
                    Some(node_type) => {
                        let merged = modeling::merged_node_type(
                            &node_type_presentations,
                            &types,
                            node_type,
                        );
                        for (property, _) in filter.properties() {
                            if !merged.properties.contains_key(&property) {
                                issues.report(
                                    issues::Issue::new(
                                        Level::BetweenTypes,
                                        format!(
                                            "node filter of requirement {:?} of {:?} refers to an unknown property of {:?}: {:?}",
                                            requirement_name, template_name, node_type, property
                                        ),
                                    )
                                    .at_locator(filter.locator()),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    // Policy targets must match the target types the policy type accepts.
    for (policy_name, policy) in topology.policies() {
        let accepted = policy
            .type_name()
            .and_then(|t| find_policy_type_targets(&policy_types, &types, &t));
        let accepted = match accepted {
            Some(a) if !a.is_empty() => a,
            _ => continue,
        };
        for target in policy.targets() {
            let target_type = node_templates
                .get(&target)
                .and_then(|t| t.type_name())
                .map(|t| (t, &types.node))
                .or_else(|| {
                    group_templates
                        .get(&target)
                        .and_then(|g| g.type_name())
                        .map(|t| (t, &types.group))
                });
            let matches = target_type
                .map(|(type_name, index)| {
                    accepted
                        .iter()
                        .any(|a| index.is_descendant(a, &type_name))
                })
                .unwrap_or(true);
            if !matches {
                issues.report(
                    issues::Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "target {:?} of policy {:?} does not match a node type or group type declared by the policy type",
                            target, policy_name
                        ),
                    )
                    .at_locator(policy.locator()),
                );
            }
        }
    }
}

// Target types a policy type accepts, merged across its hierarchy.
fn find_policy_type_targets(
    policy_types: &IndexMap<String, types::PolicyType>,
    types: &models::Types,
    type_name: &str,
) -> Option<Vec<String>> {
    let mut targets = Vec::new();
    for ancestor in types.policy.hierarchy(type_name) {
        if let Some(presentation) = policy_types.get(ancestor) {
            targets.extend(presentation.targets());
        }
    }
    Some(targets)
}
