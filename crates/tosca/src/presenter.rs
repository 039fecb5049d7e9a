use crate::{cloudify, simple_v1_0};
use doc::{Locator, Value};
use issues::IssueSink;
use models::{DeploymentTemplate, Types};
use presentation::{Core, Presented, PresenterNotFound};

/// A selected profile presenter over a root document.
pub enum Presenter {
    Tosca(simple_v1_0::ServiceTemplate),
    Cloudify(cloudify::Blueprint),
}

/// The profile of a selected presenter. Imported documents inherit the
/// root's profile rather than re-running selection, since type libraries
/// routinely omit the version discriminator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Tosca,
    Cloudify,
}

impl ProfileKind {
    /// Wrap a document in this profile's presenter, without inspecting
    /// the discriminator.
    pub fn present(self, raw: Value, locator: Locator) -> Presenter {
        match self {
            ProfileKind::Tosca => Presenter::Tosca(simple_v1_0::ServiceTemplate::from_core(
                Core::root(raw, locator),
            )),
            ProfileKind::Cloudify => Presenter::Cloudify(cloudify::Blueprint::from_core(
                Core::root(raw, locator),
            )),
        }
    }
}

/// Inspect the root discriminator field and wrap the document in the
/// accepting profile's presenter.
pub fn select_presenter(raw: Value, locator: Locator) -> Result<Presenter, PresenterNotFound> {
    if simple_v1_0::ServiceTemplate::can_present(&raw) {
        tracing::debug!("selected the TOSCA Simple Profile presenter");
        return Ok(Presenter::Tosca(simple_v1_0::ServiceTemplate::from_core(
            Core::root(raw, locator),
        )));
    }
    if cloudify::Blueprint::can_present(&raw) {
        tracing::debug!("selected the Cloudify DSL presenter");
        return Ok(Presenter::Cloudify(cloudify::Blueprint::from_core(
            Core::root(raw, locator),
        )));
    }
    Err(PresenterNotFound)
}

impl Presenter {
    pub fn kind(&self) -> ProfileKind {
        match self {
            Presenter::Tosca(_) => ProfileKind::Tosca,
            Presenter::Cloudify(_) => ProfileKind::Cloudify,
        }
    }

    pub fn raw(&self) -> &Value {
        match self {
            Presenter::Tosca(p) => p.raw(),
            Presenter::Cloudify(p) => p.raw(),
        }
    }

    pub fn locator(&self) -> &Locator {
        match self {
            Presenter::Tosca(p) => p.locator(),
            Presenter::Cloudify(p) => p.locator(),
        }
    }

    /// Locations of documents this presentation imports.
    pub fn import_locations(&self) -> Vec<sources::Location> {
        match self {
            Presenter::Tosca(p) => p.import_locations(),
            Presenter::Cloudify(p) => p.import_locations(),
        }
    }

    /// Fold an imported document into this presentation: mappings
    /// union-merge with this document overriding, and lists concatenate.
    /// Repeated application is order-independent for deduplicated
    /// imports.
    pub fn merge_import(&mut self, imported_raw: &Value, imported_locator: &Locator) {
        let (mut raw, mut locator) = (self.raw().clone(), self.locator().clone());
        doc::merge_with_locators(
            &mut raw,
            imported_raw,
            Some(&mut locator),
            Some(imported_locator),
        );
        *self = self.kind().present(raw, locator);
    }

    /// Run the profile's full validation.
    pub fn validate(&self, issues: &IssueSink) {
        match self {
            Presenter::Tosca(p) => simple_v1_0::validate(p, issues),
            Presenter::Cloudify(p) => cloudify::validate(p, issues),
        }
    }

    /// Derive the deployment template and its type indices.
    pub fn derive(&self, issues: &IssueSink) -> (DeploymentTemplate, Types) {
        match self {
            Presenter::Tosca(p) => simple_v1_0::derive(p, issues),
            Presenter::Cloudify(p) => cloudify::derive(p, issues),
        }
    }
}
