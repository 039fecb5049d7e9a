use super::value::{Value, ValueMap};
use indexmap::IndexMap;

/// Declared instance-count bounds of a node template or scaling group.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingBounds {
    pub default_instances: u32,
    pub min_instances: u32,
    /// None is UNBOUNDED.
    pub max_instances: Option<u32>,
}

impl Default for ScalingBounds {
    fn default() -> Self {
        ScalingBounds {
            default_instances: 1,
            min_instances: 0,
            max_instances: None,
        }
    }
}

impl ScalingBounds {
    pub fn is_valid(&self) -> bool {
        self.min_instances <= self.default_instances
            && self
                .max_instances
                .map(|max| self.default_instances <= max && self.min_instances <= max)
                .unwrap_or(true)
    }
}

/// A named, typed value with a resolved (possibly symbolic) assignment.
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub type_name: Option<String>,
    pub value: Value,
    pub description: Option<String>,
    pub required: bool,
}

impl Parameter {
    pub fn new(value: Value) -> Parameter {
        Parameter {
            type_name: None,
            value,
            description: None,
            required: false,
        }
    }
}

/// A fully-merged operation of an interface (or a top-level workflow).
#[derive(Debug, Clone, Default)]
pub struct Operation {
    /// The raw implementation string as authored.
    pub implementation: Option<String>,
    /// Parsed `<plugin>.<operation>` split, when the profile uses plugins.
    pub plugin: Option<String>,
    pub operation: Option<String>,
    pub executor: Option<String>,
    pub inputs: ValueMap,
    pub max_retries: Option<i64>,
    pub retry_interval: Option<i64>,
}

impl Operation {
    pub fn is_empty(&self) -> bool {
        self.implementation.is_none() && self.inputs.is_empty()
    }

    /// Merge an overriding operation onto this one, field by field. Fields
    /// the override leaves unset keep their current value.
    pub fn merge_from(&mut self, over: &Operation) {
        if over.implementation.is_some() {
            self.implementation = over.implementation.clone();
            self.plugin = over.plugin.clone();
            self.operation = over.operation.clone();
        }
        if over.executor.is_some() {
            self.executor = over.executor.clone();
        }
        if over.max_retries.is_some() {
            self.max_retries = over.max_retries;
        }
        if over.retry_interval.is_some() {
            self.retry_interval = over.retry_interval;
        }
        for (name, value) in &over.inputs {
            self.inputs.insert(name.clone(), value.clone());
        }
    }
}

/// A named interface: a set of operations plus interface-level inputs.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub type_name: Option<String>,
    pub inputs: ValueMap,
    pub operations: IndexMap<String, Operation>,
}

impl Interface {
    /// Merge an overriding interface onto this one, operation by
    /// operation.
    pub fn merge_from(&mut self, over: &Interface) {
        if over.type_name.is_some() {
            self.type_name = over.type_name.clone();
        }
        for (name, value) in &over.inputs {
            self.inputs.insert(name.clone(), value.clone());
        }
        for (name, operation) in &over.operations {
            match self.operations.get_mut(name) {
                Some(existing) => existing.merge_from(operation),
                None => {
                    self.operations.insert(name.clone(), operation.clone());
                }
            }
        }
    }
}

/// A capability lifted onto a node template from its type hierarchy.
#[derive(Debug, Clone)]
pub struct Capability {
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub min_occurrences: u32,
    /// None is UNBOUNDED.
    pub max_occurrences: Option<u32>,
    pub valid_source_types: Vec<String>,
}

/// The relationship half of a requirement: type, properties, and the
/// interfaces run on either side of the edge.
#[derive(Debug, Clone, Default)]
pub struct RelationshipTemplate {
    pub type_name: Option<String>,
    /// Name of a declared standalone relationship template, when the
    /// assignment referenced one.
    pub template_name: Option<String>,
    pub properties: IndexMap<String, Parameter>,
    pub source_interfaces: IndexMap<String, Interface>,
    pub target_interfaces: IndexMap<String, Interface>,
}

/// A declared dependency of a node template. Targets are held by name and
/// resolved during instantiation and satisfaction.
#[derive(Debug, Clone, Default)]
pub struct Requirement {
    pub name: String,
    pub target_node_template_name: Option<String>,
    pub target_node_type_name: Option<String>,
    pub target_capability_name: Option<String>,
    pub relationship: Option<RelationshipTemplate>,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct NodeTemplate {
    pub name: String,
    pub type_name: String,
    pub description: Option<String>,
    pub properties: IndexMap<String, Parameter>,
    pub interfaces: IndexMap<String, Interface>,
    pub capabilities: IndexMap<String, Capability>,
    pub requirements: Vec<Requirement>,
    pub scaling: ScalingBounds,
}

/// A policy attached to a group, possibly with triggers (profiles that
/// support them).
#[derive(Debug, Clone, Default)]
pub struct GroupPolicy {
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub triggers: IndexMap<String, PolicyTrigger>,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyTrigger {
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupTemplate {
    pub name: String,
    pub type_name: Option<String>,
    pub properties: IndexMap<String, Parameter>,
    pub interfaces: IndexMap<String, Interface>,
    pub member_node_template_names: Vec<String>,
    pub member_group_template_names: Vec<String>,
    pub policies: IndexMap<String, GroupPolicy>,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyTemplate {
    pub name: String,
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub target_node_template_names: Vec<String>,
    pub target_group_template_names: Vec<String>,
}

/// The profile and version of the source document, kept for plan output.
#[derive(Debug, Clone)]
pub struct TemplateVersion {
    pub profile: String,
    pub number: Vec<u32>,
}

/// The type-resolved deployment template: what `derive` produces and
/// `instantiate` consumes. Immutable once derived.
#[derive(Debug, Clone, Default)]
pub struct DeploymentTemplate {
    pub description: Option<String>,
    pub version: Option<TemplateVersion>,
    pub inputs: IndexMap<String, Parameter>,
    pub outputs: IndexMap<String, Parameter>,
    pub node_templates: IndexMap<String, NodeTemplate>,
    pub relationship_templates: IndexMap<String, RelationshipTemplate>,
    pub group_templates: IndexMap<String, GroupTemplate>,
    pub policy_templates: IndexMap<String, PolicyTemplate>,
    pub workflows: IndexMap<String, Operation>,
}

impl DeploymentTemplate {
    /// The template containing `name`, through a containment-role
    /// requirement, if any.
    pub fn container_of(&self, types: &super::Types, name: &str) -> Option<String> {
        let template = self.node_templates.get(name)?;
        for requirement in &template.requirements {
            let relationship = match &requirement.relationship {
                Some(r) => r,
                None => continue,
            };
            let type_name = match &relationship.type_name {
                Some(t) => t,
                None => continue,
            };
            if types.is_containment_relationship(type_name) {
                if let Some(target) = &requirement.target_node_template_name {
                    return Some(target.clone());
                }
            }
        }
        None
    }

    /// The nearest template (inclusive) whose type plays the host role.
    pub fn host_of(&self, types: &super::Types, name: &str) -> Option<String> {
        let mut cursor = name.to_string();
        let mut hops = 0;
        loop {
            let template = self.node_templates.get(&cursor)?;
            if types.is_host_node_type(&template.type_name) {
                return Some(cursor);
            }
            cursor = self.container_of(types, &cursor)?;
            hops += 1;
            if hops > self.node_templates.len() {
                return None;
            }
        }
    }
}
