//! The two supported profiles: TOSCA Simple Profile v1.0 and the Cloudify
//! DSL. Each profile contributes presentation classes over the raw
//! document, profile validation, and derivation into the deployment
//! model. The presenter source inspects the root document's version
//! discriminator and picks the profile.

pub mod cloudify;
mod data_types;
mod presenter;
pub mod simple_v1_0;
#[cfg(test)]
mod tests;

pub use data_types::{
    coerce_value, parse_scalar_unit, parse_timestamp, parse_version, Constraint, CoercionEnv,
    DataTypeInfo, PrimitiveType, PropertyInfo,
};
pub use presenter::{select_presenter, Presenter, ProfileKind};
