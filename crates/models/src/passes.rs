use super::instantiate::{make_relationship, select_target};
use super::plan::DeploymentPlan;
use super::template::{DeploymentTemplate, Interface, NodeTemplate, Parameter, Requirement};
use super::types::Types;
use super::value::{coerce, CoerceCx};
use indexmap::IndexMap;
use issues::{Issue, IssueSink, Level};
use std::collections::HashMap;

/// Resolve every intrinsic function the plan can currently resolve.
/// Idempotent, and re-run after each mutating pass to flush values that
/// became visible.
pub fn coerce_values(template: &DeploymentTemplate, plan: &mut DeploymentPlan, issues: &IssueSink) {
    // Functions resolve against a stable snapshot while the live plan is
    // rewritten in place.
    let snapshot = plan.clone();
    let mut resolved = 0usize;

    let mut coerce_parameters =
        |parameters: &mut IndexMap<String, Parameter>, self_node: Option<&str>| {
            for parameter in parameters.values_mut() {
                let cx = CoerceCx {
                    template,
                    plan: &snapshot,
                    self_node_id: self_node,
                    issues,
                };
                let next = coerce(&parameter.value, &cx);
                if next != parameter.value {
                    resolved += 1;
                    parameter.value = next;
                }
            }
        };

    coerce_parameters(&mut plan.inputs, None);
    coerce_parameters(&mut plan.outputs, None);
    for group in plan.groups.values_mut() {
        coerce_parameters(&mut group.properties, None);
    }
    for policy in plan.policies.values_mut() {
        coerce_parameters(&mut policy.properties, None);
    }
    for scaling_group in plan.scaling_groups.values_mut() {
        coerce_parameters(&mut scaling_group.properties, None);
    }

    let ids: Vec<String> = plan.nodes.keys().cloned().collect();
    for id in ids {
        let node = plan.nodes.get_mut(&id).unwrap();
        let self_node = Some(id.as_str());

        for parameter in node.properties.values_mut() {
            let cx = CoerceCx {
                template,
                plan: &snapshot,
                self_node_id: self_node,
                issues,
            };
            parameter.value = coerce(&parameter.value, &cx);
        }
        for capability in node.capabilities.values_mut() {
            for parameter in capability.properties.values_mut() {
                let cx = CoerceCx {
                    template,
                    plan: &snapshot,
                    self_node_id: self_node,
                    issues,
                };
                parameter.value = coerce(&parameter.value, &cx);
            }
        }
        coerce_interfaces(&mut node.interfaces, template, &snapshot, self_node, issues);
        for relationship in &mut node.relationships {
            for parameter in relationship.properties.values_mut() {
                let cx = CoerceCx {
                    template,
                    plan: &snapshot,
                    self_node_id: self_node,
                    issues,
                };
                parameter.value = coerce(&parameter.value, &cx);
            }
            coerce_interfaces(
                &mut relationship.source_interfaces,
                template,
                &snapshot,
                self_node,
                issues,
            );
            coerce_interfaces(
                &mut relationship.target_interfaces,
                template,
                &snapshot,
                self_node,
                issues,
            );
        }
    }

    for workflow in plan.workflows.values_mut() {
        for value in workflow.inputs.values_mut() {
            let cx = CoerceCx {
                template,
                plan: &snapshot,
                self_node_id: None,
                issues,
            };
            *value = coerce(value, &cx);
        }
    }

    tracing::debug!(resolved, "coerced plan values");
}

fn coerce_interfaces(
    interfaces: &mut IndexMap<String, Interface>,
    template: &DeploymentTemplate,
    snapshot: &DeploymentPlan,
    self_node: Option<&str>,
    issues: &IssueSink,
) {
    for interface in interfaces.values_mut() {
        for value in interface.inputs.values_mut() {
            let cx = CoerceCx {
                template,
                plan: snapshot,
                self_node_id: self_node,
                issues,
            };
            *value = coerce(value, &cx);
        }
        for operation in interface.operations.values_mut() {
            for value in operation.inputs.values_mut() {
                let cx = CoerceCx {
                    template,
                    plan: snapshot,
                    self_node_id: self_node,
                    issues,
                };
                *value = coerce(value, &cx);
            }
        }
    }
}

/// Match requirements that instantiation could not wire by name: find a
/// target by node type or capability type, preferring targets on the
/// source's host. Required requirements left without a target are issues.
pub fn satisfy_requirements(
    template: &DeploymentTemplate,
    types: &Types,
    plan: &mut DeploymentPlan,
    issues: &IssueSink,
) {
    let snapshot = plan.clone();
    let mut round_robin: HashMap<(String, String), usize> = HashMap::new();
    let ids: Vec<String> = plan.nodes.keys().cloned().collect();

    for id in ids {
        let template_name = plan.nodes[&id].template_name.clone();
        let node_template = match template.node_templates.get(&template_name) {
            Some(t) => t,
            None => continue,
        };

        for requirement in &node_template.requirements {
            let already = plan.nodes[&id]
                .relationships
                .iter()
                .any(|r| r.name == requirement.name);
            if already {
                continue;
            }

            let candidates = candidate_instances(template, types, &snapshot, requirement);
            if candidates.is_empty() {
                if requirement.required {
                    issues.report(Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "requirement {:?} of node {:?} has no valid target",
                            requirement.name, id
                        ),
                    ));
                }
                continue;
            }

            let source_host = plan.nodes[&id].host_id.clone();
            let target_id = select_target(
                &candidates,
                source_host.as_deref(),
                &snapshot,
                &mut round_robin,
                (template_name.clone(), requirement.name.clone()),
            );

            let mut relationship = make_relationship(requirement, &target_id);
            relationship.target_capability_name = resolve_target_capability(
                template,
                types,
                &snapshot.nodes[&target_id].template_name,
                requirement,
            );
            tracing::debug!(
                source = %id,
                target = %target_id,
                requirement = %requirement.name,
                "satisfied requirement"
            );
            plan.nodes.get_mut(&id).unwrap().relationships.push(relationship);
        }
    }
}

// Instances able to satisfy a requirement, in template declaration order.
fn candidate_instances(
    template: &DeploymentTemplate,
    types: &Types,
    plan: &DeploymentPlan,
    requirement: &Requirement,
) -> Vec<String> {
    let mut candidates = Vec::new();
    for (name, node_template) in &template.node_templates {
        if let Some(target) = &requirement.target_node_template_name {
            if target != name {
                continue;
            }
        }
        if let Some(type_name) = &requirement.target_node_type_name {
            if !types.node.is_descendant(type_name, &node_template.type_name) {
                continue;
            }
        }
        if let Some(capability) = &requirement.target_capability_name {
            if resolve_capability_on(types, node_template, capability).is_none() {
                continue;
            }
        }
        if requirement.target_node_template_name.is_none()
            && requirement.target_node_type_name.is_none()
            && requirement.target_capability_name.is_none()
        {
            continue;
        }
        candidates.extend(plan.instances_of(name).into_iter().map(str::to_string));
    }
    candidates
}

// A capability reference names either a capability of the target template
// or a capability type it must offer.
fn resolve_capability_on(
    types: &Types,
    node_template: &NodeTemplate,
    capability: &str,
) -> Option<String> {
    if node_template.capabilities.contains_key(capability) {
        return Some(capability.to_string());
    }
    node_template
        .capabilities
        .iter()
        .find(|(_, c)| types.capability.is_descendant(capability, &c.type_name))
        .map(|(name, _)| name.clone())
}

fn resolve_target_capability(
    template: &DeploymentTemplate,
    types: &Types,
    target_template_name: &str,
    requirement: &Requirement,
) -> Option<String> {
    let capability = requirement.target_capability_name.as_deref()?;
    let node_template = template.node_templates.get(target_template_name)?;
    resolve_capability_on(types, node_template, capability)
}

/// Structural invariants of an instantiated plan: every relationship
/// target and every group member denotes an existing node instance.
pub fn validate_plan(plan: &DeploymentPlan, issues: &IssueSink) {
    for node in plan.nodes.values() {
        for relationship in &node.relationships {
            if !plan.nodes.contains_key(&relationship.target_node_id) {
                issues.report(Issue::new(
                    Level::BetweenTypes,
                    format!(
                        "relationship {:?} of node {:?} points at a nonexistent instance: {:?}",
                        relationship.name, node.id, relationship.target_node_id
                    ),
                ));
            }
        }
    }
    for group in plan.groups.values() {
        for member in &group.member_node_ids {
            if !plan.nodes.contains_key(member) {
                issues.report(Issue::new(
                    Level::BetweenTypes,
                    format!(
                        "group {:?} lists a nonexistent member instance: {:?}",
                        group.template_name, member
                    ),
                ));
            }
        }
    }
    for scaling_group in plan.scaling_groups.values() {
        let in_bounds = scaling_group.min_instances <= scaling_group.current_instances
            && scaling_group
                .max_instances
                .map(|max| scaling_group.current_instances <= max)
                .unwrap_or(true);
        if !in_bounds {
            issues.report(Issue::new(
                Level::Field,
                format!(
                    "scaling group {:?} has {} instances outside its bounds",
                    scaling_group.name, scaling_group.current_instances
                ),
            ));
        }
    }
}

/// Count incoming relationships per capability and enforce the declared
/// occurrence range on every capability instance.
pub fn validate_capabilities(plan: &mut DeploymentPlan, issues: &IssueSink) {
    // Recount from scratch so the pass is idempotent.
    let ids: Vec<String> = plan.nodes.keys().cloned().collect();
    for id in &ids {
        for capability in plan.nodes.get_mut(id).unwrap().capabilities.values_mut() {
            capability.occurrences = 0;
        }
    }

    let mut incoming: Vec<(String, String)> = Vec::new();
    for node in plan.nodes.values() {
        for relationship in &node.relationships {
            if let Some(capability) = &relationship.target_capability_name {
                incoming.push((relationship.target_node_id.clone(), capability.clone()));
            }
        }
    }
    for (target_id, capability) in incoming {
        if let Some(target) = plan.nodes.get_mut(&target_id) {
            if let Some(capability) = target.capabilities.get_mut(&capability) {
                capability.occurrences += 1;
            }
        }
    }

    for node in plan.nodes.values() {
        for (name, capability) in &node.capabilities {
            let ok = capability.occurrences >= capability.min_occurrences
                && capability
                    .max_occurrences
                    .map(|max| capability.occurrences <= max)
                    .unwrap_or(true);
            if !ok {
                issues.report(Issue::new(
                    Level::BetweenTypes,
                    format!(
                        "capability {:?} of node {:?} has {} incoming relationships, outside [{}, {}]",
                        name,
                        node.id,
                        capability.occurrences,
                        capability.min_occurrences,
                        capability
                            .max_occurrences
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "UNBOUNDED".to_string()),
                    ),
                ));
            }
        }
    }
}
