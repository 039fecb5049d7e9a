use super::plan::{CapabilityInstance, DeploymentPlan, Group, Node, Policy, Relationship, ScalingGroup};
use super::template::{DeploymentTemplate, NodeTemplate, ScalingBounds};
use super::types::Types;
use super::value::Value;
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};
use std::collections::HashMap;

/// Options of the instantiation pass.
#[derive(Debug, Clone, Default)]
pub struct InstantiateOptions {
    /// Restore the historical behavior where group members include
    /// contained templates rather than only top-level ones.
    pub legacy_group_members: bool,
}

/// Instantiate a derived deployment template into a plan: expand node
/// templates into instances in containment order, wire relationship
/// instances, and materialize groups and scaling groups.
///
/// A containment cycle aborts instantiation, leaving a plan with only
/// inputs and outputs, and reports an issue.
pub fn instantiate(
    template: &DeploymentTemplate,
    types: &Types,
    issues: &IssueSink,
    options: &InstantiateOptions,
) -> DeploymentPlan {
    let mut plan = DeploymentPlan {
        description: template.description.clone(),
        inputs: template.inputs.clone(),
        outputs: template.outputs.clone(),
        workflows: template.workflows.clone(),
        ..Default::default()
    };

    // Scaling policies expand their target groups, and the expansion
    // drives member instance counts.
    let counts = expand_scaling_groups(template, types, issues, &mut plan);

    let order = match containment_order(template, types) {
        Ok(order) => order,
        Err(cycle) => {
            issues.report(Issue::new(
                Level::BetweenTypes,
                format!(
                    "containment relationships form a cycle involving {:?}",
                    cycle
                ),
            ));
            return plan;
        }
    };

    let mut next_suffix = 0u32;
    for name in &order {
        let node_template = &template.node_templates[name.as_str()];
        let count = counts
            .get(name.as_str())
            .copied()
            .unwrap_or(node_template.scaling.default_instances);
        if !node_template.scaling.is_valid() {
            issues.report(Issue::new(
                Level::Field,
                format!(
                    "scaling bounds of node template {:?} are inconsistent: min {} default {} max {}",
                    name,
                    node_template.scaling.min_instances,
                    node_template.scaling.default_instances,
                    node_template
                        .scaling
                        .max_instances
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "UNBOUNDED".to_string()),
                ),
            ));
        }

        let container = template.container_of(types, name);
        let container_instances: Vec<String> = container
            .as_deref()
            .map(|c| {
                plan.instances_of(c)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        for ordinal in 0..count {
            next_suffix += 1;
            let id = format!("{}_{:05}", name, next_suffix);
            tracing::debug!(%id, template = %name, "instantiating node");

            let node = instantiate_node(node_template, &id);
            plan.nodes.insert(id.clone(), node);

            if !container_instances.is_empty() {
                let slot = ordinal as usize % container_instances.len();
                plan.containment
                    .insert(id.clone(), container_instances[slot].clone());
            }
        }
    }

    resolve_hosts(&mut plan, types);
    wire_relationships(template, &mut plan);
    build_groups(template, types, options, &mut plan);
    build_policies(template, &mut plan);

    plan
}

fn instantiate_node(template: &NodeTemplate, id: &str) -> Node {
    let capabilities = template
        .capabilities
        .iter()
        .map(|(name, capability)| {
            (
                name.clone(),
                CapabilityInstance {
                    type_name: capability.type_name.clone(),
                    properties: capability.properties.clone(),
                    min_occurrences: capability.min_occurrences,
                    max_occurrences: capability.max_occurrences,
                    occurrences: 0,
                },
            )
        })
        .collect();

    Node {
        id: id.to_string(),
        template_name: template.name.clone(),
        type_name: template.type_name.clone(),
        properties: template.properties.clone(),
        interfaces: template.interfaces.clone(),
        capabilities,
        relationships: Vec::new(),
        host_id: None,
    }
}

// Containers before contained. Err carries the names of a containment
// cycle.
fn containment_order(
    template: &DeploymentTemplate,
    types: &Types,
) -> Result<Vec<String>, Vec<String>> {
    let containers: IndexMap<&str, Option<String>> = template
        .node_templates
        .keys()
        .map(|name| (name.as_str(), template.container_of(types, name)))
        .collect();

    let mut ordered: Vec<String> = Vec::with_capacity(containers.len());
    let mut remaining: Vec<&str> = containers.keys().copied().collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|name| {
            let ready = match &containers[name] {
                None => true,
                Some(container) => {
                    !template.node_templates.contains_key(container)
                        || ordered.iter().any(|o| o == container)
                }
            };
            if ready {
                ordered.push(name.to_string());
            }
            !ready
        });
        if remaining.len() == before {
            return Err(remaining.into_iter().map(str::to_string).collect());
        }
    }
    Ok(ordered)
}

fn resolve_hosts(plan: &mut DeploymentPlan, types: &Types) {
    let ids: Vec<String> = plan.nodes.keys().cloned().collect();
    for id in ids {
        let mut cursor = id.clone();
        let mut host = None;
        let mut hops = 0;
        loop {
            let node = match plan.nodes.get(&cursor) {
                Some(n) => n,
                None => break,
            };
            if types.is_host_node_type(&node.type_name) {
                host = Some(cursor.clone());
                break;
            }
            match plan.containment.get(&cursor) {
                Some(container) => cursor = container.clone(),
                None => break,
            }
            hops += 1;
            if hops > plan.nodes.len() {
                break;
            }
        }
        plan.nodes.get_mut(&id).unwrap().host_id = host;
    }
}

// Wire requirement edges whose target template is already named. Targets
// resolved only by type wait for the satisfaction pass.
fn wire_relationships(template: &DeploymentTemplate, plan: &mut DeploymentPlan) {
    let mut round_robin: HashMap<(String, String), usize> = HashMap::new();
    let ids: Vec<String> = plan.nodes.keys().cloned().collect();

    for id in ids {
        let template_name = plan.nodes[&id].template_name.clone();
        let node_template = match template.node_templates.get(&template_name) {
            Some(t) => t,
            None => continue,
        };
        for requirement in &node_template.requirements {
            let target_template = match &requirement.target_node_template_name {
                Some(t) => t.clone(),
                None => continue,
            };
            let candidates: Vec<String> = plan
                .instances_of(&target_template)
                .into_iter()
                .map(str::to_string)
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let source_host = plan.nodes[&id].host_id.clone();
            let target_id = select_target(
                &candidates,
                source_host.as_deref(),
                plan,
                &mut round_robin,
                (template_name.clone(), requirement.name.clone()),
            );

            let relationship = make_relationship(requirement, &target_id);
            plan.nodes.get_mut(&id).unwrap().relationships.push(relationship);
        }
    }
}

/// Prefer a target sharing the source's host; otherwise rotate through
/// the candidates so repeated requirements spread across instances.
pub(crate) fn select_target(
    candidates: &[String],
    source_host: Option<&str>,
    plan: &DeploymentPlan,
    round_robin: &mut HashMap<(String, String), usize>,
    key: (String, String),
) -> String {
    if let Some(host) = source_host {
        if let Some(near) = candidates
            .iter()
            .find(|c| plan.nodes[c.as_str()].host_id.as_deref() == Some(host))
        {
            return near.clone();
        }
    }
    let counter = round_robin.entry(key).or_insert(0);
    let chosen = candidates[*counter % candidates.len()].clone();
    *counter += 1;
    chosen
}

pub(crate) fn make_relationship(
    requirement: &super::template::Requirement,
    target_id: &str,
) -> Relationship {
    let mut relationship = Relationship {
        name: requirement.name.clone(),
        target_node_id: target_id.to_string(),
        target_capability_name: requirement.target_capability_name.clone(),
        ..Default::default()
    };
    if let Some(rel) = &requirement.relationship {
        relationship.type_name = rel.type_name.clone();
        relationship.template_name = rel.template_name.clone();
        relationship.properties = rel.properties.clone();
        relationship.source_interfaces = rel.source_interfaces.clone();
        relationship.target_interfaces = rel.target_interfaces.clone();
    }
    relationship
}

fn expand_scaling_groups(
    template: &DeploymentTemplate,
    types: &Types,
    issues: &IssueSink,
    plan: &mut DeploymentPlan,
) -> HashMap<String, u32> {
    let mut counts = HashMap::new();

    for policy in template.policy_templates.values() {
        if !types.is_scaling_policy(&policy.type_name) {
            continue;
        }
        let bounds = scaling_bounds_from_properties(&policy.properties);
        if !bounds.is_valid() {
            issues.report(Issue::new(
                Level::Field,
                format!(
                    "scaling policy {:?} declares inconsistent bounds: min {} default {} max {}",
                    policy.name,
                    bounds.min_instances,
                    bounds.default_instances,
                    bounds
                        .max_instances
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "UNBOUNDED".to_string()),
                ),
            ));
            continue;
        }

        for group_name in &policy.target_group_template_names {
            let group = match template.group_templates.get(group_name) {
                Some(g) => g,
                None => {
                    issues.report(Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "scaling policy {:?} targets an unknown group: {:?}",
                            policy.name, group_name
                        ),
                    ));
                    continue;
                }
            };

            for member in &group.member_node_template_names {
                counts.insert(member.clone(), bounds.default_instances);
            }

            plan.scaling_groups.insert(
                group_name.clone(),
                ScalingGroup {
                    name: group_name.clone(),
                    members: group.member_node_template_names.clone(),
                    properties: policy.properties.clone(),
                    current_instances: bounds.default_instances,
                    default_instances: bounds.default_instances,
                    min_instances: bounds.min_instances,
                    max_instances: bounds.max_instances,
                },
            );
        }
    }

    counts
}

fn scaling_bounds_from_properties(
    properties: &IndexMap<String, super::template::Parameter>,
) -> ScalingBounds {
    let int_of = |name: &str| -> Option<i64> {
        properties.get(name).and_then(|p| match &p.value {
            Value::Literal(raw) => raw.as_int(),
            Value::Function(_) => None,
        })
    };
    let mut bounds = ScalingBounds::default();
    if let Some(default) = int_of("default_instances") {
        bounds.default_instances = default.max(0) as u32;
    }
    if let Some(min) = int_of("min_instances") {
        bounds.min_instances = min.max(0) as u32;
    }
    match int_of("max_instances") {
        // -1 and UNBOUNDED both mean unlimited.
        Some(max) if max >= 0 => bounds.max_instances = Some(max as u32),
        _ => bounds.max_instances = None,
    }
    bounds
}

fn build_groups(
    template: &DeploymentTemplate,
    types: &Types,
    options: &InstantiateOptions,
    plan: &mut DeploymentPlan,
) {
    for (name, group) in &template.group_templates {
        let mut member_templates: Vec<String> = Vec::new();
        let mut push_member = |member: &str| {
            let top_level = template.container_of(types, member).is_none();
            if (options.legacy_group_members || top_level)
                && !member_templates.iter().any(|m| m == member)
            {
                member_templates.push(member.to_string());
            }
        };
        for member in &group.member_node_template_names {
            push_member(member);
        }
        // Nested groups flatten one level.
        for nested in &group.member_group_template_names {
            if let Some(nested_group) = template.group_templates.get(nested) {
                for member in &nested_group.member_node_template_names {
                    push_member(member);
                }
            }
        }

        let member_node_ids: Vec<String> = member_templates
            .iter()
            .flat_map(|member| plan.instances_of(member))
            .map(str::to_string)
            .collect();

        plan.groups.insert(
            name.clone(),
            Group {
                template_name: name.clone(),
                member_node_ids,
                properties: group.properties.clone(),
                policies: group.policies.clone(),
            },
        );
    }
}

fn build_policies(template: &DeploymentTemplate, plan: &mut DeploymentPlan) {
    for (name, policy) in &template.policy_templates {
        plan.policies.insert(
            name.clone(),
            Policy {
                template_name: name.clone(),
                type_name: policy.type_name.clone(),
                properties: policy.properties.clone(),
                target_node_template_names: policy.target_node_template_names.clone(),
                target_group_template_names: policy.target_group_template_names.clone(),
            },
        );
    }
}
