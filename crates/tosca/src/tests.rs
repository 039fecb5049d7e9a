use super::*;
use issues::IssueSink;
use std::sync::Arc;
use url::Url;

fn read(content: &str) -> (doc::Value, doc::Locator) {
    let source = Url::parse("literal:test").unwrap();
    sources::read_yaml(content, &source).unwrap()
}

fn present(content: &str) -> Presenter {
    let (raw, locator) = read(content);
    select_presenter(raw, locator).unwrap()
}

#[test]
fn presenter_selection_by_discriminator() {
    let (raw, locator) = read("tosca_definitions_version: tosca_simple_yaml_1_0\n");
    assert!(matches!(
        select_presenter(raw, locator),
        Ok(Presenter::Tosca(_))
    ));

    let (raw, locator) = read("tosca_definitions_version: cloudify_dsl_1_3\n");
    assert!(matches!(
        select_presenter(raw, locator),
        Ok(Presenter::Cloudify(_))
    ));

    let (raw, locator) = read("something: else\n");
    assert!(select_presenter(raw, locator).is_err());
}

#[test]
fn tosca_trivial_template_derives_cleanly() {
    let presenter = present(
        "tosca_definitions_version: tosca_simple_yaml_1_0\n\
         topology_template:\n\
         \x20 node_templates:\n\
         \x20   MyNode: {type: tosca.nodes.Compute}\n",
    );
    let issues = IssueSink::new();
    presenter.validate(&issues);
    assert!(issues.is_empty(), "issues: {:?}", issues.sorted());

    let (template, types) = presenter.derive(&issues);
    assert!(issues.is_empty(), "issues: {:?}", issues.sorted());
    assert!(template.node_templates.contains_key("MyNode"));
    assert!(types.is_host_node_type("tosca.nodes.Compute"));
}

#[test]
fn tosca_unknown_node_type_is_between_types() {
    let presenter = present(
        "tosca_definitions_version: tosca_simple_yaml_1_0\n\
         topology_template:\n\
         \x20 node_templates:\n\
         \x20   MyNode: {type: does.not.exist}\n",
    );
    let issues = IssueSink::new();
    presenter.validate(&issues);

    let sorted = issues.sorted();
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].level, issues::Level::BetweenTypes);
    assert!(sorted[0].message.contains("does.not.exist"));
    assert!(sorted[0].line > 0, "issue carries a position");
}

#[test]
fn tosca_property_inheritance_and_coercion() {
    let presenter = present(
        "tosca_definitions_version: tosca_simple_yaml_1_0\n\
         node_types:\n\
         \x20 test.Base:\n\
         \x20   properties:\n\
         \x20     port: {type: integer, default: 80}\n\
         \x20     name: {type: string}\n\
         \x20 test.Web:\n\
         \x20   derived_from: test.Base\n\
         \x20   properties:\n\
         \x20     port: {type: integer, default: 8080}\n\
         topology_template:\n\
         \x20 node_templates:\n\
         \x20   web:\n\
         \x20     type: test.Web\n\
         \x20     properties:\n\
         \x20       name: site\n",
    );
    let issues = IssueSink::new();
    let (template, _) = presenter.derive(&issues);
    assert!(issues.is_empty(), "issues: {:?}", issues.sorted());

    let web = &template.node_templates["web"];
    // Nearest ancestor definition wins for the default.
    assert_eq!(
        web.properties["port"].value,
        models::Value::Literal(doc::Value::Int(8080))
    );
    assert_eq!(
        web.properties["name"].value,
        models::Value::Literal(doc::Value::Str("site".into()))
    );
}

#[test]
fn tosca_missing_required_property_is_reported() {
    let presenter = present(
        "tosca_definitions_version: tosca_simple_yaml_1_0\n\
         node_types:\n\
         \x20 test.Thing:\n\
         \x20   properties:\n\
         \x20     must: {type: string, required: true}\n\
         topology_template:\n\
         \x20 node_templates:\n\
         \x20   thing: {type: test.Thing}\n",
    );
    let issues = IssueSink::new();
    let (_, _) = presenter.derive(&issues);
    assert!(issues
        .sorted()
        .iter()
        .any(|i| i.message.contains("required property \"must\"")));
}

#[test]
fn cloudify_interface_override_and_plugin_resolution() {
    let presenter = present(
        "tosca_definitions_version: cloudify_dsl_1_3\n\
         plugins:\n\
         \x20 mock:\n\
         \x20   executor: central_deployment_agent\n\
         node_types:\n\
         \x20 test.Type:\n\
         \x20   interfaces:\n\
         \x20     interface1:\n\
         \x20       start: mock.tasks.start\n\
         node_templates:\n\
         \x20 node1:\n\
         \x20   type: test.Type\n\
         \x20   interfaces:\n\
         \x20     interface1:\n\
         \x20       start: mock.tasks.start-overridden\n",
    );
    let issues = IssueSink::new();
    presenter.validate(&issues);
    let (template, _) = presenter.derive(&issues);
    assert!(issues.is_empty(), "issues: {:?}", issues.sorted());

    let node = &template.node_templates["node1"];
    let start = &node.interfaces["interface1"].operations["start"];
    assert_eq!(start.plugin.as_deref(), Some("mock"));
    assert_eq!(start.operation.as_deref(), Some("tasks.start-overridden"));
    assert_eq!(start.executor.as_deref(), Some("central_deployment_agent"));
}

#[test]
fn cloudify_unknown_plugin_is_reported() {
    let presenter = present(
        "tosca_definitions_version: cloudify_dsl_1_3\n\
         node_types:\n\
         \x20 test.Type:\n\
         \x20   interfaces:\n\
         \x20     lifecycle:\n\
         \x20       create: ghost.tasks.create\n\
         node_templates:\n\
         \x20 node1: {type: test.Type}\n",
    );
    let issues = IssueSink::new();
    let (_, _) = presenter.derive(&issues);
    assert!(issues
        .sorted()
        .iter()
        .any(|i| i.message.contains("unknown plugin")));
}
