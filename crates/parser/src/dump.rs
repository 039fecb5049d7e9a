use crate::context::Context;
use doc::Value;

/// The canonical plan output of a completed run, or None when the
/// pipeline stopped earlier.
pub fn plan_as_raw(context: &Context) -> Option<Value> {
    let plan = context.plan.as_ref()?;
    let template = context.template.as_ref()?;
    let types = context.types.as_ref()?;
    Some(models::plan_as_raw(plan, template, types))
}

/// The derived template in its raw output shape.
pub fn template_as_raw(context: &Context) -> Option<Value> {
    context.template.as_ref().map(models::template_as_raw)
}

pub fn to_yaml(value: &Value) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// JSON with a configurable indent width.
pub fn to_json(value: &Value, indent: usize) -> anyhow::Result<String> {
    let indent = b" ".repeat(indent);
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(value, &mut serializer)?;
    Ok(String::from_utf8(out)?)
}
