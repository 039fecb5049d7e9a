use super::definitions::{
    CapabilityDefinition, InterfaceAssignment, InterfaceDefinitionForType, ParameterDefinition,
    PropertyDefinition, RequirementDefinition,
};
use super::misc::{constraints_of, parse_occurrences};
use super::templates::{
    NodeTemplate, RelationshipAssignment, RequirementAssignment, ServiceTemplate,
};
use super::types::NodeType;
use crate::data_types::{coerce_value, CoercionEnv, DataTypeInfo, PropertyInfo};
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};
use models::{
    Capability, DeploymentTemplate, Interface, Operation, Parameter, Requirement, ScalingBounds,
    TemplateVersion, TypeRoles, Types, Value,
};
use presentation::{Core, Presented};

pub const HOST_NODE_TYPE: &str = "tosca.nodes.Compute";
pub const CONTAINED_IN_RELATIONSHIP: &str = "tosca.relationships.HostedOn";
pub const SCALING_POLICY: &str = "tosca.policies.Scaling";

// Normative types every service template may reference without declaring.
const BUILTIN_NODE_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.nodes.Root", None),
    ("tosca.nodes.Compute", Some("tosca.nodes.Root")),
    ("tosca.nodes.SoftwareComponent", Some("tosca.nodes.Root")),
    ("tosca.nodes.WebServer", Some("tosca.nodes.SoftwareComponent")),
    ("tosca.nodes.WebApplication", Some("tosca.nodes.Root")),
    ("tosca.nodes.DBMS", Some("tosca.nodes.SoftwareComponent")),
    ("tosca.nodes.Database", Some("tosca.nodes.Root")),
    ("tosca.nodes.BlockStorage", Some("tosca.nodes.Root")),
    ("tosca.nodes.LoadBalancer", Some("tosca.nodes.Root")),
];
const BUILTIN_RELATIONSHIP_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.relationships.Root", None),
    ("tosca.relationships.DependsOn", Some("tosca.relationships.Root")),
    ("tosca.relationships.HostedOn", Some("tosca.relationships.Root")),
    ("tosca.relationships.ConnectsTo", Some("tosca.relationships.Root")),
    ("tosca.relationships.AttachesTo", Some("tosca.relationships.Root")),
    ("tosca.relationships.RoutesTo", Some("tosca.relationships.ConnectsTo")),
];
const BUILTIN_CAPABILITY_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.capabilities.Root", None),
    ("tosca.capabilities.Node", Some("tosca.capabilities.Root")),
    ("tosca.capabilities.Compute", Some("tosca.capabilities.Root")),
    ("tosca.capabilities.Container", Some("tosca.capabilities.Compute")),
    ("tosca.capabilities.Endpoint", Some("tosca.capabilities.Root")),
    ("tosca.capabilities.Endpoint.Database", Some("tosca.capabilities.Endpoint")),
    ("tosca.capabilities.Attachment", Some("tosca.capabilities.Root")),
    ("tosca.capabilities.Scalable", Some("tosca.capabilities.Root")),
];
const BUILTIN_ARTIFACT_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.artifacts.Root", None),
    ("tosca.artifacts.File", Some("tosca.artifacts.Root")),
    ("tosca.artifacts.Deployment", Some("tosca.artifacts.Root")),
    ("tosca.artifacts.Deployment.Image", Some("tosca.artifacts.Deployment")),
    ("tosca.artifacts.Implementation", Some("tosca.artifacts.Root")),
    ("tosca.artifacts.Implementation.Bash", Some("tosca.artifacts.Implementation")),
];
const BUILTIN_GROUP_TYPES: &[(&str, Option<&str>)] = &[("tosca.groups.Root", None)];
const BUILTIN_POLICY_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.policies.Root", None),
    ("tosca.policies.Placement", Some("tosca.policies.Root")),
    ("tosca.policies.Scaling", Some("tosca.policies.Root")),
    ("tosca.policies.Update", Some("tosca.policies.Root")),
    ("tosca.policies.Performance", Some("tosca.policies.Root")),
];
pub const BUILTIN_DATA_TYPES: &[(&str, Option<&str>)] = &[("tosca.datatypes.Root", None)];
pub const BUILTIN_INTERFACE_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.interfaces.Root", None),
    ("tosca.interfaces.node.lifecycle.Standard", Some("tosca.interfaces.Root")),
    ("tosca.interfaces.relationship.Configure", Some("tosca.interfaces.Root")),
];

/// Build the per-category type indices: normative built-ins plus every
/// declared type. Hierarchy cycles are reported and the members keep
/// their declaration but lose ancestry.
pub fn build_types(service: &ServiceTemplate, issues: &IssueSink) -> Types {
    let mut types = Types::new(TypeRoles {
        host_node_type: HOST_NODE_TYPE.to_string(),
        contained_in_relationship: CONTAINED_IN_RELATIONSHIP.to_string(),
        scaling_policy: SCALING_POLICY.to_string(),
    });

    let seed = |index: &mut models::TypeIndex, builtin: &[(&str, Option<&str>)]| {
        for (name, parent) in builtin {
            index.insert(name, *parent);
        }
    };
    seed(&mut types.node, BUILTIN_NODE_TYPES);
    seed(&mut types.relationship, BUILTIN_RELATIONSHIP_TYPES);
    seed(&mut types.capability, BUILTIN_CAPABILITY_TYPES);
    seed(&mut types.artifact, BUILTIN_ARTIFACT_TYPES);
    seed(&mut types.group, BUILTIN_GROUP_TYPES);
    seed(&mut types.policy, BUILTIN_POLICY_TYPES);

    for (name, node_type) in service.node_types() {
        types.node.insert(&name, node_type.derived_from().as_deref());
    }
    for (name, t) in service.relationship_types() {
        types.relationship.insert(&name, t.derived_from().as_deref());
    }
    for (name, t) in service.capability_types() {
        types.capability.insert(&name, t.derived_from().as_deref());
    }
    for (name, t) in service.artifact_types() {
        types.artifact.insert(&name, t.derived_from().as_deref());
    }
    for (name, t) in service.group_types() {
        types.group.insert(&name, t.derived_from().as_deref());
    }
    for (name, t) in service.policy_types() {
        types.policy.insert(&name, t.derived_from().as_deref());
    }

    for (category, index) in [
        ("node", &types.node),
        ("relationship", &types.relationship),
        ("capability", &types.capability),
        ("artifact", &types.artifact),
        ("group", &types.group),
        ("policy", &types.policy),
    ] {
        for name in index.cycles() {
            issues.report(Issue::new(
                Level::BetweenTypes,
                format!("{} type {:?} derives from itself", category, name),
            ));
        }
    }

    types
}

/// Flatten declared data types for the coercion engine.
pub fn build_data_type_infos(service: &ServiceTemplate, issues: &IssueSink) -> IndexMap<String, DataTypeInfo> {
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
    for (name, data_type) in service.data_types() {
        let mut properties = IndexMap::new();
        for (property_name, definition) in data_type.properties() {
            properties.insert(property_name, property_info(&definition, issues));
        }
        infos.insert(
            name,
            DataTypeInfo {
                parent: data_type.derived_from(),
                properties,
                constraints: constraints_of(&data_type.constraints(), issues),
            },
        );
    }
    infos
}

fn property_info(definition: &PropertyDefinition, issues: &IssueSink) -> PropertyInfo {
    PropertyInfo {
        type_name: definition.type_name().unwrap_or_else(|| "string".to_string()),
        required: definition.required().unwrap_or(true),
        default: definition.default().cloned(),
        entry_schema: definition.entry_schema().and_then(|e| e.type_name()),
        constraints: constraints_of(&definition.constraints(), issues),
    }
}

/// Node-type facets merged across the hierarchy, nearest ancestor
/// definition winning. Built-in types contribute names to the indices but
/// no facets.
pub struct MergedNodeType {
    pub properties: IndexMap<String, PropertyDefinition>,
    pub capabilities: IndexMap<String, CapabilityDefinition>,
    pub requirements: IndexMap<String, RequirementDefinition>,
    pub interfaces: IndexMap<String, InterfaceDefinitionForType>,
}

pub fn merged_node_type(
    service_node_types: &IndexMap<String, NodeType>,
    types: &Types,
    type_name: &str,
) -> MergedNodeType {
    let mut merged = MergedNodeType {
        properties: IndexMap::new(),
        capabilities: IndexMap::new(),
        requirements: IndexMap::new(),
        interfaces: IndexMap::new(),
    };
    for ancestor in types.node.hierarchy(type_name) {
        let node_type = match service_node_types.get(ancestor) {
            Some(t) => t,
            None => continue,
        };
        for (name, definition) in node_type.properties() {
            merged.properties.insert(name, definition);
        }
        for (name, definition) in node_type.capabilities() {
            merged.capabilities.insert(name, definition);
        }
        for (name, definition) in node_type.requirements() {
            merged.requirements.insert(name, definition);
        }
        for (name, definition) in node_type.interfaces() {
            // Interfaces merge operation-by-operation during derivation;
            // here the nearest declaration wins as the base.
            merged.interfaces.insert(name, definition);
        }
    }
    merged
}

/// Derive the deployment template from a validated presentation.
pub fn derive(service: &ServiceTemplate, issues: &IssueSink) -> (DeploymentTemplate, Types) {
    let types = build_types(service, issues);
    let data_types = build_data_type_infos(service, issues);
    let env = CoercionEnv {
        issues,
        data_types: &data_types,
    };
    let node_type_presentations: IndexMap<String, NodeType> = service.node_types();

    let mut template = DeploymentTemplate {
        description: service.description(),
        version: Some(TemplateVersion {
            profile: "tosca_simple_yaml".to_string(),
            number: vec![1, 0],
        }),
        ..Default::default()
    };

    let topology = match service.topology_template() {
        Some(t) => t,
        None => return (template, types),
    };

    for (name, parameter) in topology.inputs() {
        template
            .inputs
            .insert(name.clone(), derive_parameter(&parameter, &env, &name));
    }
    for (name, parameter) in topology.outputs() {
        template
            .outputs
            .insert(name.clone(), derive_parameter(&parameter, &env, &name));
    }

    // Standalone relationship templates, resolvable from assignments.
    for (name, relationship) in topology.relationship_templates() {
        let mut derived = models::RelationshipTemplate {
            type_name: relationship.type_name(),
            template_name: Some(name.clone()),
            ..Default::default()
        };
        for (property, value) in relationship.properties() {
            derived
                .properties
                .insert(property, Parameter::new(Value::parse(value.value())));
        }
        derived.source_interfaces = derive_interface_assignments(&relationship.interfaces());
        template.relationship_templates.insert(name, derived);
    }

    // Node templates, with `copy:` materialized first.
    let node_templates = topology.node_templates();
    for (name, node) in &node_templates {
        let node = materialize_copy(name, node, &node_templates, issues);
        let derived = derive_node_template(
            name,
            &node,
            service,
            &node_type_presentations,
            &types,
            &template,
            &env,
            issues,
        );
        template.node_templates.insert(name.clone(), derived);
    }

    for (name, group) in topology.groups() {
        let mut derived = models::GroupTemplate {
            name: name.clone(),
            type_name: group.type_name(),
            ..Default::default()
        };
        for (property, value) in group.properties() {
            derived
                .properties
                .insert(property, Parameter::new(Value::parse(value.value())));
        }
        for member in group.members() {
            if template.node_templates.contains_key(&member) {
                derived.member_node_template_names.push(member);
            } else {
                derived.member_group_template_names.push(member);
            }
        }
        derived.interfaces = derive_interface_assignments(&group.interfaces());
        template.group_templates.insert(name, derived);
    }

    for (name, policy) in topology.policies() {
        let mut derived = models::PolicyTemplate {
            name: name.clone(),
            type_name: policy.type_name().unwrap_or_default(),
            ..Default::default()
        };
        for (property, value) in policy.properties() {
            derived
                .properties
                .insert(property, Parameter::new(Value::parse(value.value())));
        }
        for target in policy.targets() {
            if template.group_templates.contains_key(&target) {
                derived.target_group_template_names.push(target);
            } else {
                derived.target_node_template_names.push(target);
            }
        }
        template.policy_templates.insert(name, derived);
    }

    (template, types)
}

fn derive_parameter(definition: &ParameterDefinition, env: &CoercionEnv, name: &str) -> Parameter {
    let type_name = definition.type_name();
    let raw = definition.value().or_else(|| definition.default());
    let value = match raw {
        None => Value::Literal(doc::Value::Null),
        Some(raw) => {
            let parsed = Value::parse(raw);
            match (&parsed, &type_name) {
                (Value::Literal(literal), Some(type_name)) => coerce_value(
                    env,
                    type_name,
                    definition.entry_schema().and_then(|e| e.type_name()).as_deref(),
                    &constraints_of(&definition.constraints(), env.issues),
                    literal,
                    definition.locator(),
                    &format!("parameter {:?}", name),
                )
                .map(Value::Literal)
                .unwrap_or(Value::Literal(doc::Value::Null)),
                _ => parsed,
            }
        }
    };
    Parameter {
        type_name,
        value,
        description: definition.description(),
        required: definition.required().unwrap_or(true),
    }
}

// Apply the `copy:` directive: the sibling's raw becomes the template's
// default raw. Only a direct, same-container, non-chained copy resolves.
fn materialize_copy(
    name: &str,
    node: &NodeTemplate,
    siblings: &IndexMap<String, NodeTemplate>,
    issues: &IssueSink,
) -> NodeTemplate {
    let copied = match node.copy() {
        Some(c) => c,
        None => return clone_presentation(node),
    };
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
            return clone_presentation(node);
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
        return clone_presentation(node);
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
    NodeTemplate::from_core(Core {
        name: name.to_string(),
        container: String::new(),
        raw,
        locator,
    })
}

fn clone_presentation(node: &NodeTemplate) -> NodeTemplate {
    NodeTemplate::from_core(node.core().clone())
}

fn derive_node_template(
    name: &str,
    node: &NodeTemplate,
    service: &ServiceTemplate,
    node_type_presentations: &IndexMap<String, NodeType>,
    types: &Types,
    partial: &DeploymentTemplate,
    env: &CoercionEnv,
    issues: &IssueSink,
) -> models::NodeTemplate {
    let type_name = node.type_name().unwrap_or_default();
    let merged = merged_node_type(node_type_presentations, types, &type_name);

    let mut derived = models::NodeTemplate {
        name: name.to_string(),
        type_name: type_name.clone(),
        description: node.description(),
        properties: IndexMap::new(),
        interfaces: IndexMap::new(),
        capabilities: IndexMap::new(),
        requirements: Vec::new(),
        scaling: ScalingBounds::default(),
    };

    // Property merge: every declared property across the hierarchy,
    // overlaid by the template's assignments.
    let assignments = node.properties();
    for (property_name, definition) in &merged.properties {
        let info = property_info(definition, issues);
        let assigned = assignments.get(property_name).map(|a| a.value().clone());
        let raw = assigned.or_else(|| info.default.clone());
        match raw {
            None => {
                if info.required {
                    issues.report(
                        Issue::new(
                            Level::BetweenTypes,
                            format!(
                                "required property {:?} of node template {:?} has no value",
                                property_name, name
                            ),
                        )
                        .at_locator(node.locator()),
                    );
                }
            }
            Some(raw) => {
                let parsed = Value::parse(&raw);
                let value = match &parsed {
                    Value::Literal(literal) => coerce_value(
                        env,
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
                        description: definition.description(),
                        required: info.required,
                    },
                );
            }
        }
    }
    for assigned in assignments.keys() {
        if !merged.properties.contains_key(assigned) {
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

    // Interface merge: type-declared operations as the base, template
    // assignments overriding field by field.
    for (interface_name, definition) in &merged.interfaces {
        derived
            .interfaces
            .insert(interface_name.clone(), derive_interface_definition(definition));
    }
    let interface_assignments = derive_interface_assignments(&node.interfaces());
    for (interface_name, assignment) in interface_assignments {
        match derived.interfaces.get_mut(&interface_name) {
            Some(base) => base.merge_from(&assignment),
            None => {
                derived.interfaces.insert(interface_name, assignment);
            }
        }
    }

    // Capabilities lifted from the hierarchy, overlaid by assignments.
    let capability_assignments = node.capabilities();
    for (capability_name, definition) in &merged.capabilities {
        let mut properties: IndexMap<String, Parameter> = IndexMap::new();
        for (property_name, property_definition) in definition.properties() {
            if let Some(default) = property_definition.default() {
                properties.insert(
                    property_name,
                    Parameter::new(Value::parse(default)),
                );
            }
        }
        if let Some(assignment) = capability_assignments.get(capability_name) {
            for (property_name, value) in assignment.properties() {
                properties.insert(property_name, Parameter::new(Value::parse(value.value())));
            }
        }
        // An undeclared occurrence range means at least one relationship
        // may form, with no upper bound.
        let (min, max) = definition
            .occurrences()
            .and_then(parse_occurrences)
            .unwrap_or((1, None));
        derived.capabilities.insert(
            capability_name.clone(),
            Capability {
                type_name: definition.type_name().unwrap_or_default(),
                properties,
                min_occurrences: min,
                max_occurrences: max,
                valid_source_types: definition.valid_source_types(),
            },
        );
    }

    derived.scaling = scaling_from_capabilities(&derived.capabilities);

    // Requirements: assignments in declaration order, then unassigned
    // type-declared requirements for the satisfaction pass.
    let requirement_assignments = node.requirements();
    for (requirement_name, assignment) in &requirement_assignments {
        derived.requirements.push(derive_requirement(
            requirement_name,
            Some(assignment),
            merged.requirements.get(requirement_name),
            service,
            partial,
            types,
        ));
    }
    for (requirement_name, definition) in &merged.requirements {
        let assigned = requirement_assignments
            .iter()
            .any(|(n, _)| n == requirement_name);
        if !assigned {
            derived.requirements.push(derive_requirement(
                requirement_name,
                None,
                Some(definition),
                service,
                partial,
                types,
            ));
        }
    }

    derived
}

fn derive_interface_definition(definition: &InterfaceDefinitionForType) -> Interface {
    let mut interface = Interface::default();
    for (input_name, input) in definition.inputs() {
        if let Some(default) = input.default() {
            interface.inputs.insert(input_name, Value::parse(default));
        }
    }
    for (operation_name, operation) in definition.operations() {
        let mut derived = Operation {
            implementation: operation.implementation(),
            ..Default::default()
        };
        for (input_name, input) in operation.inputs() {
            if let Some(default) = input.default() {
                derived.inputs.insert(input_name, Value::parse(default));
            }
        }
        interface.operations.insert(operation_name, derived);
    }
    interface
}

fn derive_interface_assignments(
    assignments: &IndexMap<String, InterfaceAssignment>,
) -> IndexMap<String, Interface> {
    let mut interfaces = IndexMap::new();
    for (interface_name, assignment) in assignments {
        let mut interface = Interface::default();
        for (input_name, input) in assignment.inputs() {
            interface
                .inputs
                .insert(input_name, Value::parse(input.value()));
        }
        for (operation_name, operation) in assignment.operations() {
            let mut derived = Operation {
                implementation: operation.implementation(),
                ..Default::default()
            };
            for (input_name, input) in operation.inputs() {
                derived.inputs.insert(input_name, Value::parse(input.value()));
            }
            interface.operations.insert(operation_name, derived);
        }
        interfaces.insert(interface_name.clone(), interface);
    }
    interfaces
}

fn derive_requirement(
    name: &str,
    assignment: Option<&RequirementAssignment>,
    definition: Option<&RequirementDefinition>,
    service: &ServiceTemplate,
    partial: &DeploymentTemplate,
    types: &Types,
) -> Requirement {
    let mut requirement = Requirement {
        name: name.to_string(),
        ..Default::default()
    };

    // Occurrences on the definition decide requiredness; the default is
    // exactly one.
    requirement.required = definition
        .and_then(|d| d.occurrences())
        .and_then(parse_occurrences)
        .map(|(lower, _)| lower >= 1)
        .unwrap_or(true);

    let node_templates = service
        .topology_template()
        .map(|t| t.node_templates())
        .unwrap_or_default();

    if let Some(target) = assignment.and_then(|a| a.node()) {
        if node_templates.contains_key(&target) {
            requirement.target_node_template_name = Some(target);
        } else if types.node.contains(&target) {
            requirement.target_node_type_name = Some(target);
        }
    } else if let Some(target_type) = definition.and_then(|d| d.node()) {
        requirement.target_node_type_name = Some(target_type);
    }

    requirement.target_capability_name = assignment
        .and_then(|a| a.capability())
        .or_else(|| definition.and_then(|d| d.capability()));

    // The relationship: the assignment's, else the definition's type.
    let assigned_relationship = assignment.and_then(|a| a.relationship());
    requirement.relationship = match assigned_relationship {
        Some(assignment) => Some(derive_relationship_assignment(&assignment, partial, types)),
        None => definition
            .and_then(|d| d.relationship())
            .and_then(|r| r.type_name())
            .map(|type_name| models::RelationshipTemplate {
                type_name: Some(type_name),
                ..Default::default()
            }),
    };

    requirement
}

fn derive_relationship_assignment(
    assignment: &RelationshipAssignment,
    partial: &DeploymentTemplate,
    types: &Types,
) -> models::RelationshipTemplate {
    let mut relationship = models::RelationshipTemplate::default();

    if let Some(reference) = assignment.type_name() {
        if let Some(declared) = partial.relationship_templates.get(&reference) {
            relationship = declared.clone();
        } else if types.relationship.contains(&reference) {
            relationship.type_name = Some(reference);
        } else {
            // Already reported during validation; keep the name so the
            // plan output stays inspectable.
            relationship.type_name = Some(reference);
        }
    }

    for (property, value) in assignment.properties() {
        relationship
            .properties
            .insert(property, Parameter::new(Value::parse(value.value())));
    }
    let interfaces = derive_interface_assignments(&assignment.interfaces());
    if !interfaces.is_empty() {
        relationship.source_interfaces = interfaces;
    }

    relationship
}

/// Scaling bounds from the conventional `scalable` capability.
fn scaling_from_capabilities(capabilities: &IndexMap<String, Capability>) -> ScalingBounds {
    let mut bounds = ScalingBounds::default();
    let scalable = capabilities.iter().find(|(name, capability)| {
        *name == "scalable" || capability.type_name == "tosca.capabilities.Scalable"
    });
    if let Some((_, capability)) = scalable {
        let int_of = |property: &str| -> Option<i64> {
            capability
                .properties
                .get(property)
                .and_then(|p| p.value.as_literal())
                .and_then(doc::Value::as_int)
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
