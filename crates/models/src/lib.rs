//! The deployment model: type indices, the derived deployment template,
//! and the instantiated deployment plan with its mutation passes.
//!
//! All cross-references here are relational: templates and instances refer
//! to one another by name or id and resolve through the owning index,
//! never through ownership edges.

mod instantiate;
mod passes;
#[cfg(test)]
mod tests;
mod plan;
mod serialize;
mod template;
mod types;
mod value;

pub use instantiate::{instantiate, InstantiateOptions};
pub use passes::{coerce_values, satisfy_requirements, validate_capabilities, validate_plan};
pub use plan::{
    CapabilityInstance, DeploymentPlan, Group, Node, Policy, Relationship, ScalingGroup,
};
pub use serialize::{plan_as_raw, template_as_raw};
pub use template::{
    Capability, DeploymentTemplate, GroupPolicy, GroupTemplate, Interface, NodeTemplate,
    Operation, Parameter, PolicyTemplate, PolicyTrigger, RelationshipTemplate, Requirement,
    ScalingBounds, TemplateVersion,
};
pub use types::{TypeIndex, TypeRoles, Types};
pub use value::{coerce, CoerceCx, Function, Value};
