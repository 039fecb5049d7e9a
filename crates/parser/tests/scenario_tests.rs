use parser::{plan_as_raw, run_with_loader, Config, Context};
use sources::{DefaultFetcher, Loader, Location};

fn loader() -> Loader {
    Loader::new(Vec::new(), Box::new(DefaultFetcher::default()))
}

fn run_literal(content: &str) -> Context {
    run_literal_with(content, Config::default(), &loader())
}

fn run_literal_with(content: &str, config: Config, loader: &Loader) -> Context {
    run_with_loader(&Location::literal("main", content), loader, config)
}

#[test]
fn trivial_template_yields_one_self_hosted_instance() {
    let context = run_literal(
        "tosca_definitions_version: tosca_simple_yaml_1_0
topology_template:
  node_templates:
    MyNode: {type: tosca.nodes.Compute}
",
    );

    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());
    assert!(!context.failed());

    let plan = context.plan.as_ref().unwrap();
    assert_eq!(plan.nodes.len(), 1);
    let node = plan.nodes.values().next().unwrap();
    assert!(node.id.starts_with("MyNode_"));
    assert_eq!(node.host_id.as_deref(), Some(node.id.as_str()));
    assert!(node.relationships.is_empty());

    // The canonical output shape agrees.
    let raw = plan_as_raw(&context).unwrap();
    let instances = raw.get("node_instances").unwrap().as_seq().unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(
        instances[0].get("host_id").unwrap(),
        instances[0].get("id").unwrap()
    );
    assert_eq!(
        instances[0].get("relationships").unwrap(),
        &doc::Value::Seq(vec![])
    );
}

#[test]
fn unknown_node_type_is_a_single_located_issue() {
    let context = run_literal(
        "tosca_definitions_version: tosca_simple_yaml_1_0
topology_template:
  node_templates:
    MyNode: {type: does.not.exist}
",
    );

    let sorted = context.issues.sorted();
    assert_eq!(sorted.len(), 1, "issues: {:?}", sorted);
    assert_eq!(sorted[0].level, issues::Level::BetweenTypes);
    assert!(sorted[0].message.contains("does.not.exist"));
    assert_eq!(
        sorted[0].location.as_ref().map(|l| l.as_str()),
        Some("literal:main")
    );
    assert_eq!(sorted[0].line, 4);
    assert!(context.failed());
}

#[test]
fn cloudify_interface_override_reaches_the_plan_operations() {
    let context = run_literal(
        "tosca_definitions_version: cloudify_dsl_1_3
plugins:
  mock:
    executor: central_deployment_agent
node_types:
  test.Type:
    interfaces:
      interface1:
        start: mock.tasks.start
node_templates:
  node1:
    type: test.Type
    interfaces:
      interface1:
        start: mock.tasks.start-overridden
",
    );
    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());

    let raw = plan_as_raw(&context).unwrap();
    let nodes = raw.get("nodes").unwrap().as_seq().unwrap();
    let node1 = nodes
        .iter()
        .find(|n| n.get("name").unwrap().as_str() == Some("node1"))
        .unwrap();
    let operations = node1.get("operations").unwrap();
    let start = operations.get("interface1.start").unwrap();

    assert_eq!(start.get("plugin").unwrap().as_str(), Some("mock"));
    assert_eq!(
        start.get("operation").unwrap().as_str(),
        Some("tasks.start-overridden")
    );
    assert_eq!(
        start.get("executor").unwrap().as_str(),
        Some("central_deployment_agent")
    );
    // The bare name is unambiguous here, so it is also published.
    assert_eq!(operations.get("start").unwrap(), start);
}

#[test]
fn type_based_requirements_satisfy_deterministically() {
    let context = run_literal(
        "tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  test.App:
    derived_from: tosca.nodes.SoftwareComponent
topology_template:
  node_templates:
    A: {type: tosca.nodes.Compute}
    B: {type: tosca.nodes.Compute}
    web1:
      type: test.App
      requirements:
        - host: {node: A, relationship: tosca.relationships.HostedOn}
    web2:
      type: test.App
      requirements:
        - host: {node: B, relationship: tosca.relationships.HostedOn}
    db:
      type: test.App
      requirements:
        - host: {node: tosca.nodes.Compute}
",
    );
    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());

    let plan = context.plan.as_ref().unwrap();
    let db = plan
        .nodes
        .values()
        .find(|n| n.template_name == "db")
        .unwrap();
    assert_eq!(db.relationships.len(), 1);

    // No host to pin db anywhere, so round-robin picks the first
    // candidate in declaration order.
    let target = &plan.nodes[&db.relationships[0].target_node_id];
    assert_eq!(target.template_name, "A");

    // Containment wired web1 and web2 to their declared hosts.
    for (web, host) in [("web1", "A"), ("web2", "B")] {
        let node = plan
            .nodes
            .values()
            .find(|n| n.template_name == web)
            .unwrap();
        let host_instance = &plan.nodes[node.host_id.as_deref().unwrap()];
        assert_eq!(host_instance.template_name, host);
    }
}

#[test]
fn scaling_policy_expands_group_members() {
    let context = run_literal(
        "tosca_definitions_version: cloudify_dsl_1_3
node_types:
  test.Worker: {}
node_templates:
  worker: {type: test.Worker}
groups:
  g:
    members: [worker]
policies:
  p:
    type: cloudify.policies.scaling
    properties:
      default_instances: 3
    targets: [g]
",
    );
    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());

    let plan = context.plan.as_ref().unwrap();
    assert_eq!(plan.instances_of("worker").len(), 3);

    let scaling_group = &plan.scaling_groups["g"];
    assert_eq!(scaling_group.current_instances, 3);
    assert_eq!(scaling_group.default_instances, 3);

    let raw = plan_as_raw(&context).unwrap();
    let sg = raw.get("scaling_groups").unwrap().get("g").unwrap();
    assert_eq!(
        sg.get("properties").unwrap().get("current_instances").unwrap(),
        &doc::Value::Int(3)
    );
    for instance in raw.get("node_instances").unwrap().as_seq().unwrap() {
        assert_eq!(
            instance.get("scaling_groups").unwrap().as_seq().unwrap()[0]
                .get("name")
                .unwrap()
                .as_str(),
            Some("g")
        );
    }
}

#[test]
fn import_cycle_between_registered_literals() {
    let loader = loader();
    loader
        .register_literal(
            "A",
            "tosca_definitions_version: tosca_simple_yaml_1_0
imports: ['literal:B']
node_types:
  test.FromA: {}
topology_template:
  node_templates:
    a: {type: test.FromA}
    b: {type: test.FromB}
",
        )
        .unwrap();
    loader
        .register_literal(
            "B",
            "tosca_definitions_version: tosca_simple_yaml_1_0
imports: ['literal:A']
node_types:
  test.FromB: {}
",
        )
        .unwrap();

    let context = run_with_loader(
        &Location::uri("literal:A"),
        &loader,
        Config::default(),
    );

    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());
    let plan = context.plan.as_ref().unwrap();
    assert_eq!(plan.nodes.len(), 2);
}

#[test]
fn file_imports_resolve_relative_to_their_origin() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("types.yaml"),
        "tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  test.Imported:
    derived_from: tosca.nodes.Compute
",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("main.yaml"),
        "tosca_definitions_version: tosca_simple_yaml_1_0
imports:
  - types.yaml
topology_template:
  node_templates:
    box: {type: test.Imported}
",
    )
    .unwrap();

    let context = parser::run(
        &Location::uri(dir.path().join("main.yaml").to_str().unwrap()),
        Config::default(),
    );

    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());
    let plan = context.plan.as_ref().unwrap();
    let node = plan.nodes.values().next().unwrap();
    // The imported type derives from Compute, so the instance self-hosts.
    assert_eq!(node.host_id.as_deref(), Some(node.id.as_str()));
}

#[test]
fn inputs_overlay_defaults_and_functions_resolve() {
    let mut config = Config::default();
    config
        .inputs
        .insert("port".to_string(), doc::Value::Int(9090));

    let context = run_literal_with(
        "tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  test.Server:
    derived_from: tosca.nodes.Compute
    properties:
      port: {type: integer}
      banner: {type: string, required: false}
topology_template:
  inputs:
    port: {type: integer, default: 8080}
  node_templates:
    server:
      type: test.Server
      properties:
        port: {get_input: port}
        banner: {concat: ['listening on ', {get_input: port}]}
",
        config,
        &loader(),
    );
    assert!(context.issues.is_empty(), "issues: {:?}", context.issues.sorted());

    let plan = context.plan.as_ref().unwrap();
    let server = plan.nodes.values().next().unwrap();
    assert_eq!(
        server.properties["port"].value,
        models::Value::Literal(doc::Value::Int(9090))
    );
    assert_eq!(
        server.properties["banner"].value,
        models::Value::Literal(doc::Value::Str("listening on 9090".into()))
    );
}

#[test]
fn yaml_round_trips_through_the_dumper() {
    let content = "b: 1\na:\n  nested: [true, ~, 2.5]\nz: text\n";
    let source = url::Url::parse("literal:round-trip").unwrap();

    let (value, _) = sources::read_yaml(content, &source).unwrap();
    let dumped = parser::to_yaml(&value).unwrap();
    let (again, _) = sources::read_yaml(&dumped, &source).unwrap();

    assert_eq!(value, again);
    // Equality of ordered maps ignores order; check it separately.
    let keys: Vec<&str> = again.as_map().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "a", "z"]);
}

#[test]
fn plan_output_holds_the_canonical_key_order() {
    let context = run_literal(
        "tosca_definitions_version: tosca_simple_yaml_1_0
topology_template:
  node_templates:
    MyNode: {type: tosca.nodes.Compute}
",
    );
    let raw = plan_as_raw(&context).unwrap();
    let keys: Vec<&str> = raw.as_map().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "version",
            "description",
            "inputs",
            "outputs",
            "workflows",
            "node_instances",
            "nodes",
            "groups",
            "scaling_groups",
            "policies",
            "policy_types",
            "policy_triggers",
            "relationships",
        ]
    );

    // And it serializes: YAML and JSON with a chosen indent.
    let yaml = parser::to_yaml(&raw).unwrap();
    assert!(yaml.contains("node_instances"));
    let json = parser::to_json(&raw, 4).unwrap();
    assert!(json.contains("\"node_instances\""));
}
