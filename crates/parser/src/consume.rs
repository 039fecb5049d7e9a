use crate::context::Context;
use crate::parse;
use issues::{Issue, Level};
use models::{InstantiateOptions, Value};
use sources::Location;

/// One pipeline stage. Stages convert their failures into issues and
/// halt the chain when they cannot produce their output.
pub trait Consumer {
    fn consume(&self, context: &mut Context);
}

/// Runs consumers in order, stopping at the first halt.
pub struct ConsumerChain(Vec<Box<dyn Consumer>>);

impl ConsumerChain {
    pub fn new(consumers: Vec<Box<dyn Consumer>>) -> ConsumerChain {
        ConsumerChain(consumers)
    }

    pub fn consume(&self, context: &mut Context) {
        for consumer in &self.0 {
            if context.halted() {
                return;
            }
            consumer.consume(context);
        }
    }
}

impl Consumer for ConsumerChain {
    fn consume(&self, context: &mut Context) {
        ConsumerChain::consume(self, context)
    }
}

/// Parse the configured location into a merged presentation.
pub struct Read {
    pub location: Location,
}

impl Consumer for Read {
    fn consume(&self, context: &mut Context) {
        context.presentation =
            parse::parse(&self.location, &context.config, &context.issues);
        if context.presentation.is_none() {
            context.halt();
        }
    }
}

/// Run the presentation's validation.
pub struct Validate;

impl Consumer for Validate {
    fn consume(&self, context: &mut Context) {
        match &context.presentation {
            Some(presentation) => presentation.validate(&context.issues),
            None => {
                context
                    .issues
                    .report(Issue::new(Level::Platform, "validate: missing presentation"));
                context.halt();
            }
        }
    }
}

/// Derive the deployment template from the presentation.
pub struct Derive;

impl Consumer for Derive {
    fn consume(&self, context: &mut Context) {
        match &context.presentation {
            Some(presentation) => {
                let (template, types) = presentation.derive(&context.issues);
                context.template = Some(template);
                context.types = Some(types);
            }
            None => {
                context
                    .issues
                    .report(Issue::new(Level::Platform, "derive: missing presentation"));
                context.halt();
            }
        }
    }
}

/// Re-check structural invariants of the derived template.
pub struct ValidateTemplate;

impl Consumer for ValidateTemplate {
    fn consume(&self, context: &mut Context) {
        let template = match &context.template {
            Some(t) => t,
            None => return,
        };
        for node_template in template.node_templates.values() {
            for requirement in &node_template.requirements {
                let aimless = requirement.target_node_template_name.is_none()
                    && requirement.target_node_type_name.is_none()
                    && requirement.target_capability_name.is_none();
                if requirement.required && aimless {
                    context.issues.report(Issue::new(
                        Level::BetweenTypes,
                        format!(
                            "requirement {:?} of node template {:?} names no target, node type, or capability",
                            requirement.name, node_template.name
                        ),
                    ));
                }
            }
        }
    }
}

/// Instantiate the plan, overlaying configured input values first.
pub struct Instantiate;

impl Consumer for Instantiate {
    fn consume(&self, context: &mut Context) {
        let types = context.types.take();
        let (template, types) = match (context.template.as_mut(), types) {
            (Some(template), Some(types)) => (template, types),
            (template, types) => {
                context.types = types;
                if template.is_none() {
                    context.issues.report(Issue::new(
                        Level::Platform,
                        "instantiate: missing deployment template",
                    ));
                    context.halt();
                }
                return;
            }
        };

        // Caller-provided inputs overlay the declared defaults.
        for (name, value) in &context.config.inputs {
            match template.inputs.get_mut(name) {
                Some(parameter) => parameter.value = Value::parse(value),
                None => context.issues.report(Issue::new(
                    Level::Field,
                    format!("an input was provided for undeclared parameter {:?}", name),
                )),
            }
        }

        let options = InstantiateOptions {
            legacy_group_members: context.config.legacy_group_members,
        };
        let plan = models::instantiate(template, &types, &context.issues, &options);
        context.plan = Some(plan);
        context.types = Some(types);
    }
}

/// Resolve intrinsic functions against the current plan.
pub struct CoerceValues;

impl Consumer for CoerceValues {
    fn consume(&self, context: &mut Context) {
        if let (Some(template), Some(plan)) = (&context.template, context.plan.as_mut()) {
            models::coerce_values(template, plan, &context.issues);
        }
    }
}

/// Check plan invariants: relationship targets and group members exist.
pub struct ValidatePlan;

impl Consumer for ValidatePlan {
    fn consume(&self, context: &mut Context) {
        if let Some(plan) = &context.plan {
            models::validate_plan(plan, &context.issues);
        }
    }
}

/// Match requirements that instantiation left unwired.
pub struct SatisfyRequirements;

impl Consumer for SatisfyRequirements {
    fn consume(&self, context: &mut Context) {
        if let (Some(template), Some(types), Some(plan)) = (
            &context.template,
            &context.types,
            context.plan.as_mut(),
        ) {
            models::satisfy_requirements(template, types, plan, &context.issues);
        }
    }
}

/// Enforce capability occurrence bounds.
pub struct ValidateCapabilities;

impl Consumer for ValidateCapabilities {
    fn consume(&self, context: &mut Context) {
        if let Some(plan) = context.plan.as_mut() {
            models::validate_capabilities(plan, &context.issues);
        }
    }
}

/// The template chain: derivation followed by template validation.
pub fn template_chain() -> ConsumerChain {
    ConsumerChain::new(vec![Box::new(Derive), Box::new(ValidateTemplate)])
}

/// The plan chain. Coercion is idempotent and re-runs after every
/// mutating pass to flush newly visible values.
pub fn plan_chain() -> ConsumerChain {
    ConsumerChain::new(vec![
        Box::new(Instantiate),
        Box::new(CoerceValues),
        Box::new(ValidatePlan),
        Box::new(CoerceValues),
        Box::new(SatisfyRequirements),
        Box::new(CoerceValues),
        Box::new(ValidateCapabilities),
        Box::new(CoerceValues),
    ])
}
