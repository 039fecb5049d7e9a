use super::templates::{
    parse_dsl_version, Blueprint, CloudifyInterface, CloudifyNodeType, WorkflowDefinition,
    SCALING_POLICY,
};
use crate::data_types::{CoercionEnv, DataTypeInfo};
use crate::simple_v1_0::modeling::BUILTIN_DATA_TYPES;
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};
use models::{
    DeploymentTemplate, GroupPolicy, GroupTemplate, Interface, Operation, Parameter,
    PolicyTemplate, PolicyTrigger, Requirement, ScalingBounds, TemplateVersion, TypeRoles, Types,
    Value,
};

pub const HOST_NODE_TYPE: &str = "cloudify.nodes.Compute";
pub const CONTAINED_IN_RELATIONSHIP: &str = "cloudify.relationships.contained_in";
pub const CENTRAL_DEPLOYMENT_AGENT: &str = "central_deployment_agent";

const BUILTIN_NODE_TYPES: &[(&str, Option<&str>)] = &[
    ("cloudify.nodes.Root", None),
    ("cloudify.nodes.Compute", Some("cloudify.nodes.Root")),
    ("cloudify.nodes.SoftwareComponent", Some("cloudify.nodes.Root")),
    ("cloudify.nodes.WebServer", Some("cloudify.nodes.SoftwareComponent")),
    ("cloudify.nodes.DBMS", Some("cloudify.nodes.SoftwareComponent")),
    ("cloudify.nodes.ApplicationModule", Some("cloudify.nodes.Root")),
];
const BUILTIN_RELATIONSHIP_TYPES: &[(&str, Option<&str>)] = &[
    ("cloudify.relationships.depends_on", None),
    ("cloudify.relationships.contained_in", Some("cloudify.relationships.depends_on")),
    ("cloudify.relationships.connected_to", Some("cloudify.relationships.depends_on")),
];

/// Type indices of a blueprint: built-ins plus declared node types,
/// relationships, and policy types.
pub fn build_types(blueprint: &Blueprint, issues: &IssueSink) -> Types {
    let mut types = Types::new(TypeRoles {
        host_node_type: HOST_NODE_TYPE.to_string(),
        contained_in_relationship: CONTAINED_IN_RELATIONSHIP.to_string(),
        scaling_policy: SCALING_POLICY.to_string(),
    });

    for (name, parent) in BUILTIN_NODE_TYPES {
        types.node.insert(name, *parent);
    }
    for (name, parent) in BUILTIN_RELATIONSHIP_TYPES {
        types.relationship.insert(name, *parent);
    }
    types.policy.insert(SCALING_POLICY, None);

    for (name, node_type) in blueprint.node_types() {
        types.node.insert(&name, node_type.derived_from().as_deref());
    }
    for (name, relationship) in blueprint.relationships() {
        types
            .relationship
            .insert(&name, relationship.derived_from().as_deref());
    }
    let policy_types = blueprint.policy_types();
    for name in policy_types.keys() {
        types.policy.insert(name, None);
    }

    for (category, index) in [("node", &types.node), ("relationship", &types.relationship)] {
        for name in index.cycles() {
            issues.report(Issue::new(
                Level::BetweenTypes,
                format!("{} type {:?} derives from itself", category, name),
            ));
        }
    }

    types
}

/// Derive the deployment template from a validated blueprint.
pub fn derive(blueprint: &Blueprint, issues: &IssueSink) -> (DeploymentTemplate, Types) {
    let types = build_types(blueprint, issues);
    let data_types = build_cloudify_data_types(blueprint, issues);
    let env = CoercionEnv {
        issues,
        data_types: &data_types,
    };
    let node_types = blueprint.node_types();
    let plugins = blueprint.plugins();

    let version = blueprint
        .tosca_definitions_version()
        .as_deref()
        .and_then(parse_dsl_version)
        .unwrap_or_else(|| vec![1, 0]);

    let mut template = DeploymentTemplate {
        description: blueprint.description(),
        version: Some(TemplateVersion {
            profile: "cloudify_dsl".to_string(),
            number: version,
        }),
        ..Default::default()
    };

    for (name, input) in blueprint.inputs() {
        let value = match input.default() {
            Some(raw) => coerce_parameter(&env, &input, raw, &name),
            None => Value::Literal(doc::Value::Null),
        };
        template.inputs.insert(
            name,
            Parameter {
                type_name: input.type_name(),
                value,
                description: input.description(),
                required: input.required().unwrap_or(true),
            },
        );
    }
    for (name, output) in blueprint.outputs() {
        let value = output
            .value()
            .map(Value::parse)
            .unwrap_or(Value::Literal(doc::Value::Null));
        template.outputs.insert(
            name,
            Parameter {
                type_name: None,
                value,
                description: output.description(),
                required: true,
            },
        );
    }

    // Node templates, with `copy:` materialized first.
    let node_templates = blueprint.node_templates();
    for (name, node) in &node_templates {
        let node = materialize_copy(name, node, &node_templates, issues);

        let type_name = node.type_name().unwrap_or_default();
        let merged_properties = merged_type_properties(&node_types, &types, &type_name);
        let mut derived = models::NodeTemplate {
            name: name.clone(),
            type_name: type_name.clone(),
            description: None,
            properties: IndexMap::new(),
            interfaces: IndexMap::new(),
            capabilities: IndexMap::new(),
            requirements: Vec::new(),
            scaling: ScalingBounds::default(),
        };

        // Property merge: declared properties overlaid by assignments.
        let assignments = node.properties();
        for (property_name, info) in &merged_properties {
            let assigned = assignments.get(property_name).map(|a| a.value().clone());
            match assigned.or_else(|| info.default.clone()) {
                None if info.required => issues.report(
                    Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "required property {:?} of node template {:?} has no value",
                            property_name, name
                        ),
                    )
                    .at_locator(node.locator()),
                ),
                None => (),
                Some(raw) => {
                    let parsed = Value::parse(&raw);
                    let value = match &parsed {
                        Value::Literal(literal) => crate::data_types::coerce_value(
                            &env,
                            &info.type_name,
                            info.entry_schema.as_deref(),
                            &info.constraints,
                            literal,
                            node.locator().descend(&["properties", property_name.as_str()]),
                            &format!("property {:?} of node template {:?}", property_name, name),
                        )
                        .map(Value::Literal)
                        .unwrap_or(Value::Literal(doc::Value::Null)),
                        _ => parsed,
                    };
                    derived.properties.insert(
                        property_name.clone(),
                        Parameter {
                            type_name: Some(info.type_name.clone()),
                            value,
                            description: None,
                            required: info.required,
                        },
                    );
                }
            }
        }
        for assigned in assignments.keys() {
            if !merged_properties.contains_key(assigned) {
                issues.report(
                    Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "node template {:?} assigns an undeclared property: {:?}",
                            name, assigned
                        ),
                    )
                    .at_locator(node.locator().descend(&["properties", assigned.as_str()])),
                );
            }
        }

        // Interface merge: type-declared operations overlaid field by
        // field by the template's own, then plugin resolution.
        for ancestor in types.node.hierarchy(&type_name) {
            if let Some(ancestor_type) = node_types.get(ancestor) {
                overlay_interfaces(&mut derived.interfaces, &ancestor_type.interfaces());
            }
        }
        overlay_interfaces(&mut derived.interfaces, &node.interfaces());
        resolve_plugins(&mut derived.interfaces, &plugins, name, issues);

        // Relationships, in declaration order.
        for (index, relationship) in node.relationships().iter().enumerate() {
            let mut derived_relationship = models::RelationshipTemplate {
                type_name: relationship.type_name(),
                ..Default::default()
            };
            for (property, value) in relationship.properties() {
                derived_relationship
                    .properties
                    .insert(property, Parameter::new(Value::parse(value.value())));
            }
            let mut source_interfaces = IndexMap::new();
            overlay_interfaces(&mut source_interfaces, &relationship.source_interfaces());
            resolve_plugins(&mut source_interfaces, &plugins, name, issues);
            let mut target_interfaces = IndexMap::new();
            overlay_interfaces(&mut target_interfaces, &relationship.target_interfaces());
            resolve_plugins(&mut target_interfaces, &plugins, name, issues);
            derived_relationship.source_interfaces = source_interfaces;
            derived_relationship.target_interfaces = target_interfaces;

            derived.requirements.push(Requirement {
                name: relationship
                    .target()
                    .unwrap_or_else(|| index.to_string()),
                target_node_template_name: relationship.target(),
                relationship: Some(derived_relationship),
                required: true,
                ..Default::default()
            });
        }

        derived.scaling = scaling_bounds(&node);
        template.node_templates.insert(name.clone(), derived);
    }

    for (name, group) in blueprint.groups() {
        let mut derived = GroupTemplate {
            name: name.clone(),
            ..Default::default()
        };
        for member in group.members() {
            if template.node_templates.contains_key(&member) {
                derived.member_node_template_names.push(member);
            } else {
                derived.member_group_template_names.push(member);
            }
        }
        for (policy_name, policy) in group.policies() {
            let mut group_policy = GroupPolicy {
                type_name: policy.type_name().unwrap_or_default(),
                ..Default::default()
            };
            for (property, value) in policy.properties() {
                group_policy
                    .properties
                    .insert(property, Parameter::new(Value::parse(value.value())));
            }
            for (trigger_name, trigger) in policy.triggers() {
                let mut derived_trigger = PolicyTrigger {
                    type_name: trigger.type_name().unwrap_or_default(),
                    ..Default::default()
                };
                for (parameter, value) in trigger.parameters() {
                    derived_trigger
                        .properties
                        .insert(parameter, Parameter::new(Value::parse(value.value())));
                }
                group_policy.triggers.insert(trigger_name, derived_trigger);
            }
            derived.policies.insert(policy_name, group_policy);
        }
        template.group_templates.insert(name, derived);
    }

    for (name, policy) in blueprint.policies() {
        let mut derived = PolicyTemplate {
            name: name.clone(),
            type_name: policy.type_name().unwrap_or_default(),
            target_group_template_names: policy.targets(),
            ..Default::default()
        };
        for (property, value) in policy.properties() {
            derived
                .properties
                .insert(property, Parameter::new(Value::parse(value.value())));
        }
        template.policy_templates.insert(name, derived);
    }

    for (name, workflow) in blueprint.workflows() {
        template
            .workflows
            .insert(name.clone(), derive_workflow(&workflow, &plugins, &name, issues));
    }

    (template, types)
}

fn coerce_parameter(
    env: &CoercionEnv,
    input: &super::templates::CloudifyParameter,
    raw: &doc::Value,
    name: &str,
) -> Value {
    let parsed = Value::parse(raw);
    match (&parsed, input.type_name()) {
        (Value::Literal(literal), Some(type_name)) => crate::data_types::coerce_value(
            env,
            &type_name,
            None,
            &[],
            literal,
            input.locator(),
            &format!("input {:?}", name),
        )
        .map(Value::Literal)
        .unwrap_or(Value::Literal(doc::Value::Null)),
        _ => parsed,
    }
}

fn build_cloudify_data_types(
    blueprint: &Blueprint,
    issues: &IssueSink,
) -> IndexMap<String, DataTypeInfo> {
    let mut infos: IndexMap<String, DataTypeInfo> = IndexMap::new();
    for (name, parent) in BUILTIN_DATA_TYPES {
        infos.insert(
            name.to_string(),
            DataTypeInfo {
                parent: parent.map(str::to_string),
                ..Default::default()
            },
        );
    }
    for (name, data_type) in blueprint.data_types() {
        let mut properties = IndexMap::new();
        for (property_name, definition) in data_type.properties() {
            properties.insert(
                property_name,
                crate::data_types::PropertyInfo {
                    type_name: definition
                        .type_name()
                        .unwrap_or_else(|| "string".to_string()),
                    required: definition.required().unwrap_or(true),
                    default: definition.default().cloned(),
                    entry_schema: definition.entry_schema().and_then(|e| e.type_name()),
                    constraints: crate::simple_v1_0::misc::constraints_of(
                        &definition.constraints(),
                        issues,
                    ),
                },
            );
        }
        infos.insert(
            name,
            DataTypeInfo {
                parent: data_type.derived_from(),
                properties,
                constraints: crate::simple_v1_0::misc::constraints_of(
                    &data_type.constraints(),
                    issues,
                ),
            },
        );
    }
    infos
}

// Declared properties across the node-type hierarchy, nearest ancestor
// definition winning.
fn merged_type_properties(
    node_types: &IndexMap<String, CloudifyNodeType>,
    types: &Types,
    type_name: &str,
) -> IndexMap<String, crate::data_types::PropertyInfo> {
    let silent = IssueSink::new();
    let mut merged = IndexMap::new();
    for ancestor in types.node.hierarchy(type_name) {
        if let Some(node_type) = node_types.get(ancestor) {
            for (name, definition) in node_type.properties() {
                merged.insert(
                    name,
                    crate::data_types::PropertyInfo {
                        type_name: definition
                            .type_name()
                            .unwrap_or_else(|| "string".to_string()),
                        required: definition.required().unwrap_or(true),
                        default: definition.default().cloned(),
                        entry_schema: definition.entry_schema().and_then(|e| e.type_name()),
                        constraints: crate::simple_v1_0::misc::constraints_of(
                            &definition.constraints(),
                            &silent,
                        ),
                    },
                );
            }
        }
    }
    merged
}

// Overlay presented interfaces onto the accumulated model interfaces,
// operation by operation and field by field.
fn overlay_interfaces(
    interfaces: &mut IndexMap<String, Interface>,
    presented: &IndexMap<String, CloudifyInterface>,
) {
    for (interface_name, interface) in presented {
        let mut overlay = Interface::default();
        for (operation_name, operation) in interface.operations() {
            let mut derived = Operation {
                implementation: operation.implementation(),
                executor: operation.executor(),
                max_retries: operation.max_retries(),
                retry_interval: operation.retry_interval(),
                ..Default::default()
            };
            for (input_name, input) in operation.inputs() {
                derived.inputs.insert(input_name, Value::parse(input.value()));
            }
            overlay.operations.insert(operation_name, derived);
        }
        match interfaces.get_mut(interface_name) {
            Some(base) => base.merge_from(&overlay),
            None => {
                interfaces.insert(interface_name.clone(), overlay);
            }
        }
    }
}

/// Split `<plugin>.<operation>` implementations and settle the effective
/// executor: the operation's own, else the plugin's, else the central
/// deployment agent.
fn resolve_plugins(
    interfaces: &mut IndexMap<String, Interface>,
    plugins: &IndexMap<String, super::templates::Plugin>,
    holder: &str,
    issues: &IssueSink,
) {
    for interface in interfaces.values_mut() {
        for operation in interface.operations.values_mut() {
            resolve_operation_plugin(operation, plugins, holder, issues);
        }
    }
}

fn resolve_operation_plugin(
    operation: &mut Operation,
    plugins: &IndexMap<String, super::templates::Plugin>,
    holder: &str,
    issues: &IssueSink,
) {
    let implementation = match &operation.implementation {
        Some(i) if !i.is_empty() => i.clone(),
        _ => return,
    };
    let (plugin_name, operation_name) = match implementation.split_once('.') {
        Some(split) => split,
        // Not plugin-shaped; kept verbatim for script runners.
        None => return,
    };

    let plugin = plugins.get(plugin_name);
    if plugin.is_none() {
        issues.report(Issue::new(
            Level::BetweenTypes,
            format!(
                "operation of {:?} refers to an unknown plugin: {:?}",
                holder, plugin_name
            ),
        ));
    }

    operation.plugin = Some(plugin_name.to_string());
    operation.operation = Some(operation_name.to_string());
    if operation.executor.is_none() {
        operation.executor = Some(
            plugin
                .and_then(|p| p.executor())
                .unwrap_or_else(|| CENTRAL_DEPLOYMENT_AGENT.to_string()),
        );
    }
}

fn derive_workflow(
    workflow: &WorkflowDefinition,
    plugins: &IndexMap<String, super::templates::Plugin>,
    name: &str,
    issues: &IssueSink,
) -> Operation {
    let mut operation = Operation {
        implementation: workflow.mapping(),
        ..Default::default()
    };
    for (parameter_name, parameter) in workflow.parameters() {
        if let Some(default) = parameter.default() {
            operation
                .inputs
                .insert(parameter_name, Value::parse(default));
        }
    }
    resolve_operation_plugin(&mut operation, plugins, name, issues);
    operation
}

// Instance counts: the modern scalable capability wins over the legacy
// `instances.deploy`.
fn scaling_bounds(node: &super::templates::CloudifyNodeTemplate) -> ScalingBounds {
    let mut bounds = ScalingBounds::default();

    if let Some(deploy) = node.instances().and_then(|i| i.deploy()) {
        bounds.default_instances = deploy.max(0) as u32;
    }
    let scalable = node.capabilities().and_then(|c| c.scalable());
    if let Some(scalable) = scalable {
        let properties = scalable.properties();
        let int_of = |name: &str| -> Option<i64> {
            properties.get(name).and_then(|v| v.value().as_int())
        };
        if let Some(default) = int_of("default_instances") {
            bounds.default_instances = default.max(0) as u32;
        }
        if let Some(min) = int_of("min_instances") {
            bounds.min_instances = min.max(0) as u32;
        }
        if let Some(max) = int_of("max_instances") {
            bounds.max_instances = (max >= 0).then(|| max as u32);
        }
    }
    bounds
}

// `copy:` materialization, shared semantics with the other profile.
fn materialize_copy(
    name: &str,
    node: &super::templates::CloudifyNodeTemplate,
    siblings: &IndexMap<String, super::templates::CloudifyNodeTemplate>,
    issues: &IssueSink,
) -> super::templates::CloudifyNodeTemplate {
    use presentation::Presented;

    let copied = match node.copy() {
        Some(c) => c,
        None => return super::templates::CloudifyNodeTemplate::from_core(node.core().clone()),
    };
    let fallback = || super::templates::CloudifyNodeTemplate::from_core(node.core().clone());
    let sibling = match siblings.get(&copied) {
        Some(s) if copied != name => s,
        _ => {
            issues.report(
                Issue::new(
                    Level::BetweenFields,
                    format!(
                        "template {:?} copies an unknown sibling template: {:?}",
                        name, copied
                    ),
                )
                .at_locator(node.locator()),
            );
            return fallback();
        }
    };
    if sibling.copy().is_some() {
        issues.report(
            Issue::new(
                Level::BetweenFields,
                format!(
                    "template {:?} copies {:?}, which itself declares copy",
                    name, copied
                ),
            )
            .at_locator(node.locator()),
        );
        return fallback();
    }

    let mut raw = node.raw().clone();
    let mut locator = node.locator().clone();
    doc::merge_with_locators(
        &mut raw,
        sibling.raw(),
        Some(&mut locator),
        Some(sibling.locator()),
    );
    if let doc::Value::Map(m) = &mut raw {
        m.shift_remove("copy");
    }
    super::templates::CloudifyNodeTemplate::from_core(presentation::Core {
        name: name.to_string(),
        container: String::new(),
        raw,
        locator,
    })
}
