use crate::simple_v1_0::definitions::PropertyDefinition;
use crate::simple_v1_0::field_validators::{copy_not_self, data_type_exists};
use crate::simple_v1_0::misc::Import;
use crate::simple_v1_0::types::DataType;
use doc::Value;
use issues::Level;
use presentation::{presentation, AsIs, Core, FieldCheck, TypeCategory, ValidateCx};

/// The built-in scaling policy type, usable without declaration.
pub const SCALING_POLICY: &str = "cloudify.policies.scaling";

presentation! {
    /// An operation mapping of an interface; a plain string is the short
    /// form of `implementation`.
    pub struct CloudifyOperation (short_form "implementation") {
        implementation "implementation": prim(Str);
        inputs "inputs": obj_dict(AsIs);
        executor "executor": prim(Str) [check(FieldCheck::Custom(executor_is_known))];
        max_retries "max_retries": prim(Int);
        retry_interval "retry_interval": prim(Int);
    }
}

fn executor_is_known(
    core: &Core,
    field: &presentation::FieldDescriptor,
    value: &Value,
    locator: &doc::Locator,
    cx: &mut ValidateCx,
) {
    match value.as_str() {
        Some("central_deployment_agent") | Some("host_agent") | None => (),
        Some(other) => cx.report(
            Level::Field,
            format!(
                "field {:?} of {:?} must be central_deployment_agent or host_agent: got {:?}",
                field.name,
                core.fullname(),
                other
            ),
            locator,
        ),
    }
}

presentation! {
    /// An interface: one entry per operation, mapped to plugin tasks.
    pub struct CloudifyInterface {
        operations "": unknown_dict(CloudifyOperation);
    }
}

presentation! {
    pub struct CloudifyNodeType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Node))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        interfaces "interfaces": obj_dict(CloudifyInterface);
    }
}

presentation! {
    pub struct CloudifyRelationshipType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Relationship))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        source_interfaces "source_interfaces": obj_dict(CloudifyInterface);
        target_interfaces "target_interfaces": obj_dict(CloudifyInterface);
    }
}

presentation! {
    /// A plugin executing operations, by agent placement.
    pub struct Plugin {
        executor "executor": prim(Str) [check(FieldCheck::Custom(executor_is_known))];
        source "source": prim(Str);
        install "install": prim(Bool);
        install_arguments "install_arguments": prim(Str);
        package_name "package_name": prim(Str);
        package_version "package_version": prim(Str);
        supported_platform "supported_platform": prim(Str);
        distribution "distribution": prim(Str);
        distribution_version "distribution_version": prim(Str);
        distribution_release "distribution_release": prim(Str);
    }
}

presentation! {
    /// A relationship of a node template to another template.
    pub struct CloudifyRelationshipAssignment {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Relationship))];
        target "target": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::NodeTemplate))];
        properties "properties": obj_dict(AsIs);
        source_interfaces "source_interfaces": obj_dict(CloudifyInterface);
        target_interfaces "target_interfaces": obj_dict(CloudifyInterface);
    }
}

presentation! {
    pub struct CloudifyScalable {
        properties "properties": obj_dict(AsIs);
    }
}

presentation! {
    pub struct CloudifyNodeCapabilities {
        scalable "scalable": obj(CloudifyScalable);
    }
}

presentation! {
    pub struct CloudifyInstances {
        deploy "deploy": prim(Int);
    }
}

presentation! {
    pub struct CloudifyNodeTemplate {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Node))];
        properties "properties": obj_dict(AsIs);
        interfaces "interfaces": obj_dict(CloudifyInterface);
        relationships "relationships": obj_list(CloudifyRelationshipAssignment);
        instances "instances": obj(CloudifyInstances);
        capabilities "capabilities": obj(CloudifyNodeCapabilities);
        copy "copy": prim(Str) [check(FieldCheck::Custom(copy_not_self))];
    }
}

presentation! {
    /// A policy attached to a group, with optional triggers.
    pub struct GroupPolicyTrigger {
        type_name "type": prim(Str) [required];
        parameters "parameters": obj_dict(AsIs);
    }
}

presentation! {
    pub struct GroupPolicyAssignment {
        type_name "type": prim(Str) [required];
        properties "properties": obj_dict(AsIs);
        triggers "triggers": obj_dict(GroupPolicyTrigger);
    }
}

presentation! {
    pub struct CloudifyGroup {
        members "members": prim_list(Str) [required, check(FieldCheck::EachTypeExistsOneOf(&[TypeCategory::NodeTemplate, TypeCategory::GroupTemplate]))];
        policies "policies": obj_dict(GroupPolicyAssignment);
    }
}

presentation! {
    /// A top-level policy; scaling policies expand their target groups.
    pub struct CloudifyPolicy {
        type_name "type": prim(Str) [required, check(FieldCheck::Custom(policy_type_or_builtin))];
        properties "properties": obj_dict(AsIs);
        targets "targets": prim_list(Str) [required, check(FieldCheck::EachTypeExists(TypeCategory::GroupTemplate))];
    }
}

/// The built-in scaling policy needs no declaration; everything else must
/// be a declared policy type.
fn policy_type_or_builtin(
    core: &Core,
    field: &presentation::FieldDescriptor,
    value: &Value,
    locator: &doc::Locator,
    cx: &mut ValidateCx,
) {
    let name = match value.as_str() {
        Some(name) => name,
        None => return,
    };
    if name == SCALING_POLICY {
        return;
    }
    if !cx.catalog.contains(TypeCategory::Policy, name) {
        cx.report(
            Level::BetweenTypes,
            format!(
                "field {:?} of {:?} refers to an unknown policy type: {:?}",
                field.name,
                core.fullname(),
                name
            ),
            locator,
        );
    }
}

presentation! {
    pub struct CloudifyPolicyType {
        properties "properties": obj_dict(PropertyDefinition);
        source "source": prim(Str);
    }
}

presentation! {
    pub struct CloudifyPolicyTriggerType {
        parameters "parameters": obj_dict(PropertyDefinition);
        source "source": prim(Str);
    }
}

presentation! {
    /// A named workflow; a plain string is the short form of `mapping`.
    pub struct WorkflowDefinition (short_form "mapping") {
        mapping "mapping": prim(Str) [required];
        parameters "parameters": obj_dict(CloudifyParameter);
    }
}

presentation! {
    pub struct CloudifyParameter {
        type_name "type": prim(Str) [check(FieldCheck::Custom(data_type_exists))];
        description "description": prim(Str);
        default "default": prim(Any);
        required "required": prim(Bool);
    }
}

presentation! {
    pub struct CloudifyOutput {
        description "description": prim(Str);
        value "value": prim(Any) [required];
    }
}

presentation! {
    /// The root presenter of a Cloudify DSL blueprint.
    pub struct Blueprint {
        tosca_definitions_version "tosca_definitions_version": prim(Str) [required];
        description "description": prim(Str);
        imports "imports": obj_list(Import);
        inputs "inputs": obj_dict(CloudifyParameter);
        data_types "data_types": obj_dict(DataType);
        node_types "node_types": obj_dict(CloudifyNodeType);
        relationships "relationships": obj_dict(CloudifyRelationshipType);
        plugins "plugins": obj_dict(Plugin);
        node_templates "node_templates": obj_dict(CloudifyNodeTemplate);
        groups "groups": obj_dict(CloudifyGroup);
        policies "policies": obj_dict(CloudifyPolicy);
        policy_types "policy_types": obj_dict(CloudifyPolicyType);
        policy_triggers "policy_triggers": obj_dict(CloudifyPolicyTriggerType);
        workflows "workflows": obj_dict(WorkflowDefinition);
        outputs "outputs": obj_dict(CloudifyOutput);
    }
}

impl Blueprint {
    /// Accepts `cloudify_dsl_1_0` through `cloudify_dsl_1_3`.
    pub fn can_present(raw: &Value) -> bool {
        raw.get("tosca_definitions_version")
            .and_then(Value::as_str)
            .map(|v| parse_dsl_version(v).is_some())
            .unwrap_or(false)
    }

    pub fn import_locations(&self) -> Vec<sources::Location> {
        self.imports()
            .iter()
            .filter_map(Import::file)
            .map(sources::Location::Uri)
            .collect()
    }
}

/// `cloudify_dsl_<major>_<minor>` to a version number.
pub fn parse_dsl_version(version: &str) -> Option<Vec<u32>> {
    let suffix = version.strip_prefix("cloudify_dsl_")?;
    let numbers: Vec<u32> = suffix
        .split('_')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    (numbers.len() == 2 && numbers[0] == 1 && numbers[1] <= 3).then(|| numbers)
}
