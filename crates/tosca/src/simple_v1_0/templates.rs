use super::definitions::{ArtifactDefinition, CapabilityDefinition, InterfaceAssignment};
use super::field_validators::copy_not_self;
use super::misc::Import;
use super::types::{
    ArtifactType, CapabilityType, DataType, GroupType, InterfaceType, NodeType, PolicyType,
    RelationshipType,
};
use presentation::{presentation, AsIs, FieldCheck, TypeCategory};

presentation! {
    /// The relationship half of a requirement assignment; a plain string
    /// is the short form of `type` and may name a relationship template or
    /// a relationship type.
    pub struct RelationshipAssignment (short_form "type") {
        type_name "type": prim(Str) [check(FieldCheck::TypeExistsOneOf(&[TypeCategory::RelationshipTemplate, TypeCategory::Relationship]))];
        properties "properties": obj_dict(AsIs);
        interfaces "interfaces": obj_dict(InterfaceAssignment);
    }
}

presentation! {
    /// Constraints a requirement places on candidate target nodes.
    pub struct NodeFilterCapability {
        properties "properties": obj_seq(AsIs);
    }
}

presentation! {
    pub struct NodeFilter {
        properties "properties": obj_seq(AsIs);
        capabilities "capabilities": obj_seq(NodeFilterCapability);
    }
}

presentation! {
    /// A requirement assignment of a node template; a plain string is the
    /// short form of `node`.
    pub struct RequirementAssignment (short_form "node") {
        capability "capability": prim(Str);
        node "node": prim(Str) [check(FieldCheck::TypeExistsOneOf(&[TypeCategory::NodeTemplate, TypeCategory::Node]))];
        relationship "relationship": obj(RelationshipAssignment);
        node_filter "node_filter": obj(NodeFilter);
        occurrences "occurrences": prim(Any);
    }
}

presentation! {
    pub struct CapabilityAssignment {
        properties "properties": obj_dict(AsIs);
        attributes "attributes": obj_dict(AsIs);
    }
}

presentation! {
    pub struct NodeTemplate {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Node))];
        description "description": prim(Str);
        directives "directives": prim_list(Str);
        properties "properties": obj_dict(AsIs);
        attributes "attributes": obj_dict(AsIs);
        requirements "requirements": obj_seq(RequirementAssignment);
        capabilities "capabilities": obj_dict(CapabilityAssignment);
        interfaces "interfaces": obj_dict(InterfaceAssignment);
        artifacts "artifacts": obj_dict(ArtifactDefinition);
        node_filter "node_filter": obj(NodeFilter);
        copy "copy": prim(Str) [check(FieldCheck::Custom(copy_not_self))];
    }
}

presentation! {
    /// A standalone relationship template, referenced by requirement
    /// assignments.
    pub struct RelationshipTemplate {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Relationship))];
        description "description": prim(Str);
        properties "properties": obj_dict(AsIs);
        attributes "attributes": obj_dict(AsIs);
        interfaces "interfaces": obj_dict(InterfaceAssignment);
        copy "copy": prim(Str) [check(FieldCheck::Custom(copy_not_self))];
    }
}

presentation! {
    pub struct GroupDefinition {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Group))];
        description "description": prim(Str);
        properties "properties": obj_dict(AsIs);
        members "members": prim_list(Str) [check(FieldCheck::EachTypeExistsOneOf(&[TypeCategory::NodeTemplate, TypeCategory::GroupTemplate]))];
        interfaces "interfaces": obj_dict(InterfaceAssignment);
    }
}

presentation! {
    pub struct PolicyDefinition {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Policy))];
        description "description": prim(Str);
        properties "properties": obj_dict(AsIs);
        targets "targets": prim_list(Str) [check(FieldCheck::EachTypeExistsOneOf(&[TypeCategory::NodeTemplate, TypeCategory::GroupTemplate]))];
    }
}

presentation! {
    pub struct TopologyTemplate {
        description "description": prim(Str);
        inputs "inputs": obj_dict(super::definitions::ParameterDefinition);
        node_templates "node_templates": obj_dict(NodeTemplate);
        relationship_templates "relationship_templates": obj_dict(RelationshipTemplate);
        groups "groups": obj_dict(GroupDefinition);
        policies "policies": obj_seq(PolicyDefinition);
        outputs "outputs": obj_dict(super::definitions::ParameterDefinition);
    }
}

presentation! {
    /// The root presenter of a TOSCA Simple Profile v1.0 service template.
    pub struct ServiceTemplate {
        tosca_definitions_version "tosca_definitions_version": prim(Str) [required];
        metadata "metadata": prim(Any);
        description "description": prim(Str);
        imports "imports": obj_list(Import);
        artifact_types "artifact_types": obj_dict(ArtifactType);
        data_types "data_types": obj_dict(DataType);
        capability_types "capability_types": obj_dict(CapabilityType);
        interface_types "interface_types": obj_dict(InterfaceType);
        relationship_types "relationship_types": obj_dict(RelationshipType);
        node_types "node_types": obj_dict(NodeType);
        group_types "group_types": obj_dict(GroupType);
        policy_types "policy_types": obj_dict(PolicyType);
        topology_template "topology_template": obj(TopologyTemplate);
    }
}

/// The discriminator value this profile accepts.
pub const DSL_VERSION: &str = "tosca_simple_yaml_1_0";

impl ServiceTemplate {
    pub fn can_present(raw: &doc::Value) -> bool {
        raw.get("tosca_definitions_version")
            .and_then(doc::Value::as_str)
            == Some(DSL_VERSION)
    }

    /// Locations of documents this one imports.
    pub fn import_locations(&self) -> Vec<sources::Location> {
        self.imports()
            .iter()
            .filter_map(Import::file)
            .map(sources::Location::Uri)
            .collect()
    }
}
