use super::field_validators::data_type_exists;
use super::misc::{occurrences_shape, ConstraintClause, EntrySchema};
use presentation::{presentation, AsIs, FieldCheck, TypeCategory};

presentation! {
    /// A named, typed value that an entity declares and a template later
    /// assigns.
    pub struct PropertyDefinition {
        type_name "type": prim(Str) [required, check(FieldCheck::Custom(data_type_exists))];
        description "description": prim(Str);
        required "required": prim(Bool);
        default "default": prim(Any);
        status "status": prim(Str);
        constraints "constraints": obj_list(ConstraintClause);
        entry_schema "entry_schema": obj(EntrySchema);
    }
}

presentation! {
    /// Exposes a piece of "actual state" an orchestrator sets after
    /// deployment.
    pub struct AttributeDefinition {
        type_name "type": prim(Str) [required, check(FieldCheck::Custom(data_type_exists))];
        description "description": prim(Str);
        default "default": prim(Any);
        status "status": prim(Str);
        entry_schema "entry_schema": obj(EntrySchema);
    }
}

presentation! {
    /// A topology input or output: a property definition that can also
    /// carry an assigned value.
    pub struct ParameterDefinition {
        type_name "type": prim(Str) [check(FieldCheck::Custom(data_type_exists))];
        description "description": prim(Str);
        required "required": prim(Bool);
        default "default": prim(Any);
        value "value": prim(Any);
        constraints "constraints": obj_list(ConstraintClause);
        entry_schema "entry_schema": obj(EntrySchema);
    }
}

presentation! {
    /// An operation declared by a type; a plain string is the short form
    /// of `implementation`.
    pub struct OperationDefinition (short_form "implementation") {
        description "description": prim(Str);
        implementation "implementation": prim(Str);
        inputs "inputs": obj_dict(PropertyDefinition);
    }
}

presentation! {
    /// An interface declared by a type: interface-level inputs plus one
    /// entry per operation.
    pub struct InterfaceDefinitionForType {
        inputs "inputs": obj_dict(PropertyDefinition);
        operations "": unknown_dict(OperationDefinition);
    }
}

presentation! {
    /// An operation assigned by a template.
    pub struct OperationAssignment (short_form "implementation") {
        implementation "implementation": prim(Str);
        inputs "inputs": obj_dict(AsIs);
    }
}

presentation! {
    /// An interface assigned by a template.
    pub struct InterfaceAssignment {
        inputs "inputs": obj_dict(AsIs);
        operations "": unknown_dict(OperationAssignment);
    }
}

presentation! {
    /// The relationship half of a requirement definition; a plain string
    /// is the short form of `type`.
    pub struct RequirementDefinitionRelationship (short_form "type") {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Relationship))];
        interfaces "interfaces": obj_dict(InterfaceDefinitionForType);
    }
}

presentation! {
    /// A dependency a node type declares; fulfilled by a matching
    /// capability on another node.
    pub struct RequirementDefinition (short_form "capability") {
        capability "capability": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Capability))];
        node "node": prim(Str) [check(FieldCheck::TypeExists(TypeCategory::Node))];
        relationship "relationship": obj(RequirementDefinitionRelationship);
        occurrences "occurrences": prim(Any) [check(FieldCheck::Custom(occurrences_shape))];
    }
}

presentation! {
    /// A typed feature a node type offers to requirements; a plain string
    /// is the short form of `type`.
    pub struct CapabilityDefinition (short_form "type") {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Capability))];
        description "description": prim(Str);
        properties "properties": obj_dict(PropertyDefinition);
        attributes "attributes": obj_dict(AttributeDefinition);
        valid_source_types "valid_source_types": prim_list(Str) [check(FieldCheck::EachTypeExists(TypeCategory::Node))];
        occurrences "occurrences": prim(Any) [check(FieldCheck::Custom(occurrences_shape))];
    }
}

presentation! {
    /// A named, typed file used to implement operations or deploy the
    /// node; a plain string is the short form of `file`.
    pub struct ArtifactDefinition (short_form "file") {
        type_name "type": prim(Str) [check(FieldCheck::TypeExists(TypeCategory::Artifact))];
        file "file": prim(Str) [required];
        repository "repository": prim(Str);
        description "description": prim(Str);
        deploy_path "deploy_path": prim(Str);
    }
}
