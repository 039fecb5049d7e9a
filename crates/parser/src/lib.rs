//! The pipeline driver: a consumption context threaded through a chain
//! of consumers, from reading a location through instantiating and
//! checking the deployment plan.

pub mod consume;
mod context;
mod dump;
mod parse;

pub use context::{Config, Context};
pub use dump::{plan_as_raw, template_as_raw, to_json, to_yaml};
pub use parse::{parse, parse_with_loader};

use consume::{plan_chain, template_chain, Consumer, ConsumerChain, Read, Validate};
use sources::{Loader, Location};

/// Parse and validate, stopping before derivation.
pub fn parse_and_validate(location: &Location, config: Config) -> Context {
    let mut context = Context::new(config);
    let chain = ConsumerChain::new(vec![
        Box::new(Read {
            location: location.clone(),
        }),
        Box::new(Validate),
    ]);
    chain.consume(&mut context);
    context
}

/// The whole pipeline: read, validate, derive, and instantiate, leaving
/// every produced artifact on the returned context.
pub fn run(location: &Location, config: Config) -> Context {
    let loader = default_loader(&config);
    run_with_loader(location, &loader, config)
}

/// Like [`run`], with a caller-provided loader; tests register literal
/// documents on it.
pub fn run_with_loader(location: &Location, loader: &Loader, config: Config) -> Context {
    let mut context = Context::new(config);
    read_and_validate(location, loader, &mut context);
    if !context.halted() {
        template_chain().consume(&mut context);
    }
    if !context.halted() {
        plan_chain().consume(&mut context);
    }
    tracing::debug!(summary = %context.summary(), "pipeline finished");
    context
}

fn default_loader(config: &Config) -> Loader {
    Loader::new(
        config.search_paths.clone(),
        Box::new(sources::DefaultFetcher::default()),
    )
}

fn read_and_validate(location: &Location, loader: &Loader, context: &mut Context) {
    context.presentation =
        parse::parse_with_loader(location, loader, &context.config, &context.issues);
    if context.presentation.is_none() {
        context.halt();
        return;
    }
    Validate.consume(context);
}
