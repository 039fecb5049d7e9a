use super::template::{GroupPolicy, Interface, Operation, Parameter};
use indexmap::IndexMap;

/// A capability of a node instance, tracking how many relationships
/// target it.
#[derive(Debug, Clone)]
pub struct CapabilityInstance {
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub min_occurrences: u32,
    /// None is UNBOUNDED.
    pub max_occurrences: Option<u32>,
    /// Incoming relationship count, maintained by capability validation.
    pub occurrences: u32,
}

/// A relationship instance: one resolved requirement edge, pointing at a
/// target node instance by id.
#[derive(Debug, Clone, Default)]
pub struct Relationship {
    /// Name of the requirement this edge satisfies.
    pub name: String,
    pub type_name: Option<String>,
    pub template_name: Option<String>,
    pub target_node_id: String,
    pub target_capability_name: Option<String>,
    pub properties: IndexMap<String, Parameter>,
    pub source_interfaces: IndexMap<String, Interface>,
    pub target_interfaces: IndexMap<String, Interface>,
}

/// A node instance.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub template_name: String,
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub interfaces: IndexMap<String, Interface>,
    pub capabilities: IndexMap<String, CapabilityInstance>,
    /// In requirement declaration order on the source.
    pub relationships: Vec<Relationship>,
    /// Nearest host-role ancestor instance id (a host is its own host).
    pub host_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub template_name: String,
    pub member_node_ids: Vec<String>,
    pub properties: IndexMap<String, Parameter>,
    pub policies: IndexMap<String, GroupPolicy>,
}

#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub template_name: String,
    pub type_name: String,
    pub properties: IndexMap<String, Parameter>,
    pub target_node_template_names: Vec<String>,
    pub target_group_template_names: Vec<String>,
}

/// A group expanded by a scaling policy, with materialized counts.
#[derive(Debug, Clone, Default)]
pub struct ScalingGroup {
    pub name: String,
    /// Member node template names.
    pub members: Vec<String>,
    pub properties: IndexMap<String, Parameter>,
    pub current_instances: u32,
    pub default_instances: u32,
    pub min_instances: u32,
    /// None is UNBOUNDED.
    pub max_instances: Option<u32>,
}

/// The executable deployment plan. Built by instantiation, then mutated
/// only by the satisfaction and coercion passes.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    pub description: Option<String>,
    pub inputs: IndexMap<String, Parameter>,
    pub outputs: IndexMap<String, Parameter>,
    /// Node instances by id, containers before contained.
    pub nodes: IndexMap<String, Node>,
    pub groups: IndexMap<String, Group>,
    pub policies: IndexMap<String, Policy>,
    pub scaling_groups: IndexMap<String, ScalingGroup>,
    pub workflows: IndexMap<String, Operation>,
    /// Instance id to containing instance id.
    pub containment: IndexMap<String, String>,
}

impl DeploymentPlan {
    /// Ids of all instances of a node template, in creation order.
    pub fn instances_of(&self, template_name: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.template_name == template_name)
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Scaling groups containing the given template.
    pub fn scaling_groups_of(&self, template_name: &str) -> Vec<&str> {
        self.scaling_groups
            .values()
            .filter(|g| g.members.iter().any(|m| m == template_name))
            .map(|g| g.name.as_str())
            .collect()
    }
}
