use super::definitions::{
    ArtifactDefinition, AttributeDefinition, CapabilityDefinition, InterfaceDefinitionForType,
    OperationDefinition, PropertyDefinition, RequirementDefinition,
};
use super::field_validators::data_type_derived_from;
use super::misc::ConstraintClause;
use crate::data_types::PrimitiveType;
use issues::Level;
use presentation::{presentation, FieldCheck, TypeCategory, ValidateCx};

presentation! {
    pub struct NodeType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Node))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        attributes "attributes": obj_dict(AttributeDefinition);
        interfaces "interfaces": obj_dict(InterfaceDefinitionForType);
        requirements "requirements": obj_seq(RequirementDefinition);
        capabilities "capabilities": obj_dict(CapabilityDefinition);
        artifacts "artifacts": obj_dict(ArtifactDefinition);
    }
}

presentation! {
    pub struct RelationshipType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Relationship))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        attributes "attributes": obj_dict(AttributeDefinition);
        interfaces "interfaces": obj_dict(InterfaceDefinitionForType);
        valid_target_types "valid_target_types": prim_list(Str) [check(FieldCheck::EachTypeExists(TypeCategory::Capability))];
    }
}

presentation! {
    pub struct CapabilityType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Capability))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        attributes "attributes": obj_dict(AttributeDefinition);
        valid_source_types "valid_source_types": prim_list(Str) [check(FieldCheck::EachTypeExists(TypeCategory::Node))];
    }
}

presentation! {
    /// A data type derives from a primitive (inheriting its parse rules)
    /// or from nothing (becoming a record of named properties).
    pub struct DataType (extra_validate data_type_shape) {
        derived_from "derived_from": prim(Str) [check(FieldCheck::Custom(data_type_derived_from))];
        description "description": prim(Str);
        constraints "constraints": obj_list(ConstraintClause);
        properties "properties": obj_dict(PropertyDefinition);
    }
}

/// Records may not declare constraints; primitive-derived types may not
/// declare properties.
fn data_type_shape(data_type: &DataType, cx: &mut ValidateCx) {
    let primitive_parent = data_type
        .derived_from()
        .map(|parent| {
            PrimitiveType::from_name(&parent).is_some() || derives_primitive(&parent, cx)
        })
        .unwrap_or(false);

    if !primitive_parent && data_type.raw().get("constraints").is_some() {
        cx.report(
            Level::BetweenTypes,
            format!(
                "data type {:?} declares constraints but has no primitive ancestor",
                data_type.fullname()
            ),
            data_type.locator().get("constraints"),
        );
    }
    if primitive_parent && data_type.raw().get("properties").is_some() {
        cx.report(
            Level::BetweenTypes,
            format!(
                "data type {:?} declares properties even though it has a primitive ancestor",
                data_type.fullname()
            ),
            data_type.locator().get("properties"),
        );
    }
}

// Walk declared parents in the catalog looking for a primitive name.
fn derives_primitive(name: &str, cx: &ValidateCx) -> bool {
    let mut cursor = Some(name);
    let mut hops = 0;
    while let Some(current) = cursor {
        if PrimitiveType::from_name(current).is_some() {
            return true;
        }
        cursor = cx.catalog.parent(TypeCategory::Data, current);
        hops += 1;
        if hops > 64 {
            return false;
        }
    }
    false
}

presentation! {
    pub struct ArtifactType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Artifact))];
        description "description": prim(Str);
        mime_type "mime_type": prim(Str);
        file_ext "file_ext": prim_list(Str);
        properties "properties": obj_dict(PropertyDefinition);
    }
}

presentation! {
    pub struct InterfaceType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Interface))];
        description "description": prim(Str);
        inputs "inputs": obj_dict(PropertyDefinition);
        operations "": unknown_dict(OperationDefinition);
    }
}

presentation! {
    pub struct GroupType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Group))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        members "members": prim_list(Str) [check(FieldCheck::EachTypeExists(TypeCategory::Node))];
        interfaces "interfaces": obj_dict(InterfaceDefinitionForType);
    }
}

presentation! {
    pub struct PolicyType {
        derived_from "derived_from": prim(Str) [check(FieldCheck::DerivedFrom(TypeCategory::Policy))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        targets "targets": prim_list(Str) [check(FieldCheck::EachTypeExistsOneOf(&[TypeCategory::Node, TypeCategory::Group]))];
    }
}
