use super::plan::DeploymentPlan;
use super::template::{DeploymentTemplate, Interface, Operation, Parameter};
use super::types::Types;
use doc::{Map, Value};
use indexmap::IndexMap;

// Builders for the canonical, profile-agnostic output shape. Key order is
// part of the contract: consumers diff serialized plans.

fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<Map>(),
    )
}

fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Str(s.clone()),
        None => Value::Null,
    }
}

fn opt_int(value: Option<i64>) -> Value {
    match value {
        Some(i) => Value::Int(i),
        None => Value::Null,
    }
}

// UNBOUNDED serializes as -1.
fn bound(value: Option<u32>) -> Value {
    match value {
        Some(v) => Value::Int(v as i64),
        None => Value::Int(-1),
    }
}

fn properties_as_raw(properties: &IndexMap<String, Parameter>) -> Value {
    Value::Map(
        properties
            .iter()
            .map(|(name, parameter)| (name.clone(), parameter.value.as_raw()))
            .collect::<Map>(),
    )
}

fn parameters_as_raw(parameters: &IndexMap<String, Parameter>) -> Value {
    Value::Map(
        parameters
            .iter()
            .map(|(name, parameter)| {
                let mut entry = Map::new();
                if let Some(type_name) = &parameter.type_name {
                    entry.insert("type".to_string(), Value::Str(type_name.clone()));
                }
                entry.insert("default".to_string(), parameter.value.as_raw());
                if let Some(description) = &parameter.description {
                    entry.insert("description".to_string(), Value::Str(description.clone()));
                }
                (name.clone(), Value::Map(entry))
            })
            .collect::<Map>(),
    )
}

fn operation_as_raw(operation: &Operation) -> Value {
    let inputs = Value::Map(
        operation
            .inputs
            .iter()
            .map(|(name, value)| (name.clone(), value.as_raw()))
            .collect::<Map>(),
    );
    map(vec![
        ("plugin", opt_str(&operation.plugin)),
        ("operation", opt_str(&operation.operation)),
        ("inputs", inputs),
        ("executor", opt_str(&operation.executor)),
        ("max_retries", opt_int(operation.max_retries)),
        ("retry_interval", opt_int(operation.retry_interval)),
    ])
}

fn interfaces_as_raw(interfaces: &IndexMap<String, Interface>) -> Value {
    Value::Map(
        interfaces
            .iter()
            .map(|(name, interface)| {
                let operations = Value::Map(
                    interface
                        .operations
                        .iter()
                        .map(|(op_name, operation)| {
                            let entry = map(vec![
                                (
                                    "implementation",
                                    opt_str(&operation.implementation),
                                ),
                                (
                                    "inputs",
                                    Value::Map(
                                        operation
                                            .inputs
                                            .iter()
                                            .map(|(n, v)| (n.clone(), v.as_raw()))
                                            .collect::<Map>(),
                                    ),
                                ),
                                ("executor", opt_str(&operation.executor)),
                                ("max_retries", opt_int(operation.max_retries)),
                                ("retry_interval", opt_int(operation.retry_interval)),
                            ]);
                            (op_name.clone(), entry)
                        })
                        .collect::<Map>(),
                );
                (name.clone(), operations)
            })
            .collect::<Map>(),
    )
}

/// Flatten interfaces into the `operations` table: every operation keyed
/// `<interface>.<operation>`, plus the bare operation name when that name
/// is unambiguous.
fn operations_as_raw(interfaces: &IndexMap<String, Interface>) -> Value {
    let mut operations = Map::new();
    let mut duplicates: Vec<String> = Vec::new();

    for (interface_name, interface) in interfaces {
        for (op_name, operation) in &interface.operations {
            let converted = operation_as_raw(operation);
            operations.insert(
                format!("{}.{}", interface_name, op_name),
                converted.clone(),
            );
            if operations.contains_key(op_name.as_str()) {
                if !duplicates.iter().any(|d| d == op_name) {
                    duplicates.push(op_name.clone());
                }
            } else {
                operations.insert(op_name.clone(), converted);
            }
        }
    }
    // A bare name shared by several interfaces identifies none of them.
    for name in duplicates {
        operations.shift_remove(&name);
    }
    Value::Map(operations)
}

fn version_as_raw(template: &DeploymentTemplate) -> Value {
    match &template.version {
        None => Value::Null,
        Some(version) => map(vec![
            ("definitions_name", Value::Str(version.profile.clone())),
            (
                "definitions_version",
                map(vec![(
                    "number",
                    Value::Seq(
                        version
                            .number
                            .iter()
                            .map(|n| Value::Int(*n as i64))
                            .collect(),
                    ),
                )]),
            ),
        ]),
    }
}

/// Serialize an instantiated plan into the canonical ordered mapping any
/// downstream consumer accepts.
pub fn plan_as_raw(plan: &DeploymentPlan, template: &DeploymentTemplate, types: &Types) -> Value {
    let workflows = Value::Map(
        plan.workflows
            .iter()
            .map(|(name, workflow)| {
                let mut entry = operation_as_raw(workflow);
                if let Value::Map(m) = &mut entry {
                    // Workflows name their inputs "parameters".
                    if let Some(inputs) = m.shift_remove("inputs") {
                        m.insert("parameters".to_string(), inputs);
                    }
                }
                (name.clone(), entry)
            })
            .collect::<Map>(),
    );

    let node_instances = Value::Seq(
        plan.nodes
            .values()
            .map(|node| {
                let relationships = Value::Seq(
                    node.relationships
                        .iter()
                        .map(|relationship| {
                            let target_name = plan
                                .nodes
                                .get(&relationship.target_node_id)
                                .map(|n| n.template_name.clone());
                            map(vec![
                                ("type", opt_str(&relationship.type_name)),
                                (
                                    "target_id",
                                    Value::Str(relationship.target_node_id.clone()),
                                ),
                                ("target_name", opt_str(&target_name)),
                            ])
                        })
                        .collect(),
                );
                let scaling_groups = Value::Seq(
                    plan.scaling_groups_of(&node.template_name)
                        .into_iter()
                        .map(|name| map(vec![("name", Value::Str(name.to_string()))]))
                        .collect(),
                );
                map(vec![
                    ("id", Value::Str(node.id.clone())),
                    ("name", Value::Str(node.template_name.clone())),
                    ("host_id", opt_str(&node.host_id)),
                    ("relationships", relationships),
                    ("scaling_groups", scaling_groups),
                ])
            })
            .collect(),
    );

    let nodes = Value::Seq(
        template
            .node_templates
            .values()
            .map(|node_template| {
                let current_instances =
                    plan.instances_of(&node_template.name).len() as i64;
                let host_template = template.host_of(types, &node_template.name);
                let relationships = Value::Seq(
                    node_template
                        .requirements
                        .iter()
                        .filter_map(|requirement| {
                            let relationship = requirement.relationship.as_ref()?;
                            let target = requirement.target_node_template_name.as_ref()?;
                            Some(map(vec![
                                ("type", opt_str(&relationship.type_name)),
                                ("target_id", Value::Str(target.clone())),
                                ("properties", properties_as_raw(&relationship.properties)),
                                (
                                    "source_interfaces",
                                    interfaces_as_raw(&relationship.source_interfaces),
                                ),
                                (
                                    "target_interfaces",
                                    interfaces_as_raw(&relationship.target_interfaces),
                                ),
                                (
                                    "source_operations",
                                    operations_as_raw(&relationship.source_interfaces),
                                ),
                                (
                                    "target_operations",
                                    operations_as_raw(&relationship.target_interfaces),
                                ),
                            ]))
                        })
                        .collect(),
                );

                let mut entry = Map::new();
                entry.insert(
                    "name".to_string(),
                    Value::Str(node_template.name.clone()),
                );
                entry.insert("id".to_string(), Value::Str(node_template.name.clone()));
                entry.insert(
                    "type".to_string(),
                    Value::Str(node_template.type_name.clone()),
                );
                entry.insert(
                    "type_hierarchy".to_string(),
                    Value::Seq(
                        types
                            .node
                            .hierarchy(&node_template.type_name)
                            .into_iter()
                            .map(|t| Value::Str(t.to_string()))
                            .collect(),
                    ),
                );
                if let Some(host) = host_template {
                    entry.insert("host_id".to_string(), Value::Str(host));
                }
                entry.insert(
                    "properties".to_string(),
                    properties_as_raw(&node_template.properties),
                );
                entry.insert(
                    "operations".to_string(),
                    operations_as_raw(&node_template.interfaces),
                );
                entry.insert("relationships".to_string(), relationships);
                entry.insert(
                    "capabilities".to_string(),
                    map(vec![(
                        "scalable",
                        map(vec![(
                            "properties",
                            map(vec![
                                ("current_instances", Value::Int(current_instances)),
                                (
                                    "default_instances",
                                    Value::Int(node_template.scaling.default_instances as i64),
                                ),
                                (
                                    "min_instances",
                                    Value::Int(node_template.scaling.min_instances as i64),
                                ),
                                (
                                    "max_instances",
                                    bound(node_template.scaling.max_instances),
                                ),
                            ]),
                        )]),
                    )]),
                );
                Value::Map(entry)
            })
            .collect(),
    );

    let groups = Value::Map(
        plan.groups
            .iter()
            .map(|(name, group)| {
                let members: Vec<String> = template
                    .group_templates
                    .get(name)
                    .map(|g| g.member_node_template_names.clone())
                    .unwrap_or_default();
                let policies = Value::Map(
                    group
                        .policies
                        .iter()
                        .map(|(policy_name, policy)| {
                            let triggers = Value::Map(
                                policy
                                    .triggers
                                    .iter()
                                    .map(|(trigger_name, trigger)| {
                                        (
                                            trigger_name.clone(),
                                            map(vec![
                                                (
                                                    "type",
                                                    Value::Str(trigger.type_name.clone()),
                                                ),
                                                (
                                                    "parameters",
                                                    properties_as_raw(&trigger.properties),
                                                ),
                                            ]),
                                        )
                                    })
                                    .collect::<Map>(),
                            );
                            (
                                policy_name.clone(),
                                map(vec![
                                    ("type", Value::Str(policy.type_name.clone())),
                                    ("properties", properties_as_raw(&policy.properties)),
                                    ("triggers", triggers),
                                ]),
                            )
                        })
                        .collect::<Map>(),
                );
                (
                    name.clone(),
                    map(vec![
                        (
                            "members",
                            Value::Seq(
                                members.into_iter().map(Value::Str).collect(),
                            ),
                        ),
                        ("policies", policies),
                    ]),
                )
            })
            .collect::<Map>(),
    );

    let scaling_groups = Value::Map(
        plan.scaling_groups
            .iter()
            .map(|(name, group)| {
                (
                    name.clone(),
                    map(vec![
                        (
                            "members",
                            Value::Seq(
                                group.members.iter().cloned().map(Value::Str).collect(),
                            ),
                        ),
                        (
                            "properties",
                            map(vec![
                                (
                                    "current_instances",
                                    Value::Int(group.current_instances as i64),
                                ),
                                (
                                    "default_instances",
                                    Value::Int(group.default_instances as i64),
                                ),
                                (
                                    "min_instances",
                                    Value::Int(group.min_instances as i64),
                                ),
                                ("max_instances", bound(group.max_instances)),
                            ]),
                        ),
                    ]),
                )
            })
            .collect::<Map>(),
    );

    let policies = Value::Map(
        plan.policies
            .iter()
            .map(|(name, policy)| {
                (
                    name.clone(),
                    map(vec![(
                        "properties",
                        properties_as_raw(&policy.properties),
                    )]),
                )
            })
            .collect::<Map>(),
    );

    let policy_types = Value::Map(
        types
            .policy
            .iter_descendants()
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    map(vec![("properties", Value::Map(Map::new()))]),
                )
            })
            .collect::<Map>(),
    );

    let relationships = Value::Map(
        types
            .relationship
            .iter_descendants()
            .into_iter()
            .map(|name| {
                let mut entry = Map::new();
                entry.insert("name".to_string(), Value::Str(name.to_string()));
                if let Some(parent) = types.relationship.get_parent(name) {
                    entry.insert(
                        "derived_from".to_string(),
                        Value::Str(parent.to_string()),
                    );
                }
                entry.insert(
                    "type_hierarchy".to_string(),
                    Value::Seq(
                        types
                            .relationship
                            .hierarchy(name)
                            .into_iter()
                            .map(|t| Value::Str(t.to_string()))
                            .collect(),
                    ),
                );
                (name.to_string(), Value::Map(entry))
            })
            .collect::<Map>(),
    );

    map(vec![
        ("version", version_as_raw(template)),
        ("description", opt_str(&plan.description)),
        ("inputs", properties_as_raw(&plan.inputs)),
        ("outputs", properties_as_raw(&plan.outputs)),
        ("workflows", workflows),
        ("node_instances", node_instances),
        ("nodes", nodes),
        ("groups", groups),
        ("scaling_groups", scaling_groups),
        ("policies", policies),
        ("policy_types", policy_types),
        ("policy_triggers", Value::Map(Map::new())),
        ("relationships", relationships),
    ])
}

/// Serialize a derived template, mostly for inspection and tests.
pub fn template_as_raw(template: &DeploymentTemplate) -> Value {
    let node_templates = Value::Map(
        template
            .node_templates
            .iter()
            .map(|(name, node_template)| {
                (
                    name.clone(),
                    map(vec![
                        ("type", Value::Str(node_template.type_name.clone())),
                        (
                            "properties",
                            properties_as_raw(&node_template.properties),
                        ),
                        (
                            "interfaces",
                            interfaces_as_raw(&node_template.interfaces),
                        ),
                    ]),
                )
            })
            .collect::<Map>(),
    );

    map(vec![
        ("description", opt_str(&template.description)),
        ("inputs", parameters_as_raw(&template.inputs)),
        ("outputs", parameters_as_raw(&template.outputs)),
        ("node_templates", node_templates),
    ])
}
