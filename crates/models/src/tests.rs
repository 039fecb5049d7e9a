use super::*;
use indexmap::IndexMap;
use issues::IssueSink;

fn types() -> Types {
    let mut types = Types::new(TypeRoles {
        host_node_type: "test.nodes.Compute".to_string(),
        contained_in_relationship: "test.relationships.contained_in".to_string(),
        scaling_policy: "test.policies.scaling".to_string(),
    });
    types.node.insert("test.nodes.Root", None);
    types.node.insert("test.nodes.Compute", Some("test.nodes.Root"));
    types.node.insert("test.nodes.App", Some("test.nodes.Root"));
    types
        .relationship
        .insert("test.relationships.depends_on", None);
    types.relationship.insert(
        "test.relationships.contained_in",
        Some("test.relationships.depends_on"),
    );
    types.policy.insert("test.policies.scaling", None);
    types
}

fn node_template(name: &str, type_name: &str) -> NodeTemplate {
    NodeTemplate {
        name: name.to_string(),
        type_name: type_name.to_string(),
        description: None,
        properties: IndexMap::new(),
        interfaces: IndexMap::new(),
        capabilities: IndexMap::new(),
        requirements: Vec::new(),
        scaling: ScalingBounds::default(),
    }
}

fn contained_in(target: &str) -> Requirement {
    Requirement {
        name: "host".to_string(),
        target_node_template_name: Some(target.to_string()),
        relationship: Some(RelationshipTemplate {
            type_name: Some("test.relationships.contained_in".to_string()),
            ..Default::default()
        }),
        required: true,
        ..Default::default()
    }
}

#[test]
fn single_compute_is_its_own_host() {
    let mut template = DeploymentTemplate::default();
    template.node_templates.insert(
        "MyNode".to_string(),
        node_template("MyNode", "test.nodes.Compute"),
    );

    let types = types();
    let sink = IssueSink::new();
    let plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());

    assert!(sink.is_empty());
    assert_eq!(plan.nodes.len(), 1);
    let node = plan.nodes.values().next().unwrap();
    assert!(node.id.starts_with("MyNode_"));
    assert_eq!(node.host_id.as_deref(), Some(node.id.as_str()));
    assert!(node.relationships.is_empty());
}

#[test]
fn containment_orders_and_assigns_hosts() {
    let mut template = DeploymentTemplate::default();
    // Declared contained-first to prove ordering is computed, not read.
    let mut web = node_template("web", "test.nodes.App");
    web.requirements.push(contained_in("vm"));
    template.node_templates.insert("web".to_string(), web);
    template.node_templates.insert(
        "vm".to_string(),
        node_template("vm", "test.nodes.Compute"),
    );

    let types = types();
    let sink = IssueSink::new();
    let plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());

    assert!(sink.is_empty());
    let ids: Vec<&String> = plan.nodes.keys().collect();
    assert!(ids[0].starts_with("vm_"), "container instantiates first");

    let web = plan.nodes.values().find(|n| n.template_name == "web").unwrap();
    let vm = plan.nodes.values().find(|n| n.template_name == "vm").unwrap();
    assert_eq!(web.host_id.as_deref(), Some(vm.id.as_str()));
    assert_eq!(web.relationships.len(), 1);
    assert_eq!(web.relationships[0].target_node_id, vm.id);
}

#[test]
fn containment_cycle_aborts_instantiation() {
    let mut template = DeploymentTemplate::default();
    let mut a = node_template("a", "test.nodes.App");
    a.requirements.push(contained_in("b"));
    let mut b = node_template("b", "test.nodes.App");
    b.requirements.push(contained_in("a"));
    template.node_templates.insert("a".to_string(), a);
    template.node_templates.insert("b".to_string(), b);

    let types = types();
    let sink = IssueSink::new();
    let plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());

    assert!(plan.nodes.is_empty());
    assert_eq!(sink.len(), 1);
    assert!(sink.sorted()[0].message.contains("cycle"));
}

#[test]
fn scaling_policy_expands_target_group_members() {
    let mut template = DeploymentTemplate::default();
    template
        .node_templates
        .insert("worker".to_string(), node_template("worker", "test.nodes.App"));
    template.group_templates.insert(
        "g".to_string(),
        GroupTemplate {
            name: "g".to_string(),
            member_node_template_names: vec!["worker".to_string()],
            ..Default::default()
        },
    );
    let mut properties = IndexMap::new();
    properties.insert(
        "default_instances".to_string(),
        Parameter::new(Value::Literal(doc::Value::Int(3))),
    );
    template.policy_templates.insert(
        "p".to_string(),
        PolicyTemplate {
            name: "p".to_string(),
            type_name: "test.policies.scaling".to_string(),
            properties,
            target_group_template_names: vec!["g".to_string()],
            ..Default::default()
        },
    );

    let types = types();
    let sink = IssueSink::new();
    let plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());

    assert!(sink.is_empty());
    assert_eq!(plan.instances_of("worker").len(), 3);
    let group = &plan.scaling_groups["g"];
    assert_eq!(group.current_instances, 3);
    assert_eq!(group.default_instances, 3);
    assert_eq!(plan.groups["g"].member_node_ids.len(), 3);
}

#[test]
fn requirement_satisfaction_prefers_same_host_then_round_robins() {
    let mut template = DeploymentTemplate::default();
    template
        .node_templates
        .insert("A".to_string(), node_template("A", "test.nodes.Compute"));
    template
        .node_templates
        .insert("B".to_string(), node_template("B", "test.nodes.Compute"));
    let mut web1 = node_template("web1", "test.nodes.App");
    web1.requirements.push(contained_in("A"));
    let mut web2 = node_template("web2", "test.nodes.App");
    web2.requirements.push(contained_in("B"));
    template.node_templates.insert("web1".to_string(), web1);
    template.node_templates.insert("web2".to_string(), web2);

    let mut db = node_template("db", "test.nodes.App");
    db.requirements.push(Requirement {
        name: "host".to_string(),
        target_node_type_name: Some("test.nodes.Compute".to_string()),
        required: true,
        ..Default::default()
    });
    template.node_templates.insert("db".to_string(), db);

    let types = types();
    let sink = IssueSink::new();
    let mut plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());
    satisfy_requirements(&template, &types, &mut plan, &sink);

    assert!(sink.is_empty(), "issues: {:?}", sink.sorted());
    let db = plan.nodes.values().find(|n| n.template_name == "db").unwrap();
    assert_eq!(db.relationships.len(), 1);
    let target = &plan.nodes[&db.relationships[0].target_node_id];
    assert!(target.template_name == "A" || target.template_name == "B");
}

#[test]
fn unsatisfied_required_requirement_is_reported() {
    let mut template = DeploymentTemplate::default();
    let mut lonely = node_template("lonely", "test.nodes.App");
    lonely.requirements.push(Requirement {
        name: "needs".to_string(),
        target_node_type_name: Some("test.nodes.Compute".to_string()),
        required: true,
        ..Default::default()
    });
    template.node_templates.insert("lonely".to_string(), lonely);

    let types = types();
    let sink = IssueSink::new();
    let mut plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());
    satisfy_requirements(&template, &types, &mut plan, &sink);

    assert_eq!(sink.len(), 1);
    assert!(sink.sorted()[0].message.contains("no valid target"));
}

#[test]
fn coercion_resolves_inputs_properties_and_concat() {
    let mut template = DeploymentTemplate::default();
    let mut node = node_template("server", "test.nodes.Compute");
    node.properties.insert(
        "port".to_string(),
        Parameter::new(Value::Function(Function::GetInput("port".to_string()))),
    );
    node.properties.insert(
        "endpoint".to_string(),
        Parameter::new(Value::Function(Function::Concat(vec![
            Value::Literal(doc::Value::Str("host:".into())),
            Value::Function(Function::GetInput("port".to_string())),
        ]))),
    );
    template.node_templates.insert("server".to_string(), node);
    template.inputs.insert(
        "port".to_string(),
        Parameter::new(Value::Literal(doc::Value::Int(8080))),
    );

    let types = types();
    let sink = IssueSink::new();
    let mut plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());
    coerce_values(&template, &mut plan, &sink);
    // Idempotent: a second run changes nothing further.
    coerce_values(&template, &mut plan, &sink);

    assert!(sink.is_empty());
    let node = plan.nodes.values().next().unwrap();
    assert_eq!(
        node.properties["port"].value,
        Value::Literal(doc::Value::Int(8080))
    );
    assert_eq!(
        node.properties["endpoint"].value,
        Value::Literal(doc::Value::Str("host:8080".into()))
    );
}

#[test]
fn capability_occurrences_are_validated() {
    let mut template = DeploymentTemplate::default();
    let mut server = node_template("server", "test.nodes.Compute");
    server.capabilities.insert(
        "feature".to_string(),
        Capability {
            type_name: "test.capabilities.Feature".to_string(),
            properties: IndexMap::new(),
            min_occurrences: 2,
            max_occurrences: Some(2),
            valid_source_types: Vec::new(),
        },
    );
    template.node_templates.insert("server".to_string(), server);

    let mut client = node_template("client", "test.nodes.App");
    client.requirements.push(Requirement {
        name: "uses".to_string(),
        target_node_template_name: Some("server".to_string()),
        target_capability_name: Some("feature".to_string()),
        required: true,
        ..Default::default()
    });
    template.node_templates.insert("client".to_string(), client);

    let types = types();
    let sink = IssueSink::new();
    let mut plan = instantiate(&template, &types, &sink, &InstantiateOptions::default());
    validate_capabilities(&mut plan, &sink);

    // One incoming relationship, lower bound two.
    assert_eq!(sink.len(), 1);
    assert!(sink.sorted()[0].message.contains("outside [2, 2]"));
}
