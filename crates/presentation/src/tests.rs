use super::*;
use doc::{Locator, Map, Value};
use std::sync::Arc;
use url::Url;

crate::presentation! {
    /// Relationship attachment of a requirement, `type` in short form.
    pub struct TestRelationship (short_form "type") {
        type_name "type": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Relationship))];
        strength "strength": prim(Int);
    }
}

crate::presentation! {
    /// A named dependency declared by a toy node.
    pub struct TestRequirement {
        capability "capability": prim(Str) [required];
        relationship "relationship": obj(TestRelationship);
        tags "tags": prim_list(Str);
    }
}

crate::presentation! {
    pub struct TestNode {
        kind "kind": prim(Str) [required];
        requirements "requirements": obj_dict(TestRequirement);
    }
}

fn raw_map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<Map>(),
    )
}

fn present<P: Presented>(raw: Value) -> P {
    let source = Arc::new(Url::parse("literal:test").unwrap());
    P::from_core(Core::root(raw, Locator::whole_document(source)))
}

fn validate<P: Presented>(raw: Value, catalog: &TypeCatalog) -> Vec<issues::Issue> {
    let sink = issues::IssueSink::new();
    let presented: P = present(raw);
    presented.validate(&mut ValidateCx::new(&sink, catalog));
    sink.sorted()
}

#[test]
fn short_form_wraps_scalars() {
    let rel: TestRelationship = present(Value::Str("connects.to".into()));
    assert_eq!(rel.type_name().as_deref(), Some("connects.to"));

    let rel: TestRelationship = present(raw_map(vec![
        ("type", Value::Str("connects.to".into())),
        ("strength", Value::Int(3)),
    ]));
    assert_eq!(rel.type_name().as_deref(), Some("connects.to"));
    assert_eq!(rel.strength(), Some(3));
}

#[test]
fn primitive_coercion_and_lists() {
    let req: TestRequirement = present(raw_map(vec![
        ("capability", Value::Int(7)),
        (
            "tags",
            Value::Seq(vec![Value::Str("a".into()), Value::Int(2)]),
        ),
    ]));
    assert_eq!(req.capability().as_deref(), Some("7"));
    assert_eq!(req.tags(), vec!["a".to_string(), "2".to_string()]);
}

#[test]
fn required_and_unknown_fields_are_reported() {
    let catalog = TypeCatalog::new();
    let issues = validate::<TestNode>(
        raw_map(vec![("mystery", Value::Null)]),
        &catalog,
    );

    let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("required field \"kind\"")));
    assert!(messages.iter().any(|m| m.contains("unknown field \"mystery\"")));
}

#[test]
fn object_dict_recursion_reports_nested_references() {
    let mut catalog = TypeCatalog::new();
    catalog.insert(TypeCategory::Relationship, "connects.to", None);

    let node = raw_map(vec![
        ("kind", Value::Str("toy".into())),
        (
            "requirements",
            raw_map(vec![(
                "uses",
                raw_map(vec![
                    ("capability", Value::Str("cap".into())),
                    ("relationship", Value::Str("no.such.type".into())),
                ]),
            )]),
        ),
    ]);

    let issues = validate::<TestNode>(node, &catalog);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].level, issues::Level::BetweenTypes);
    assert!(issues[0].message.contains("no.such.type"));

    // The same document with a known relationship type is clean.
    let node = raw_map(vec![
        ("kind", Value::Str("toy".into())),
        (
            "requirements",
            raw_map(vec![(
                "uses",
                raw_map(vec![
                    ("capability", Value::Str("cap".into())),
                    ("relationship", Value::Str("connects.to".into())),
                ]),
            )]),
        ),
    ]);
    assert!(validate::<TestNode>(node, &catalog).is_empty());
}

#[test]
fn validation_is_idempotent() {
    let catalog = TypeCatalog::new();
    let sink = issues::IssueSink::new();
    let node: TestNode = present(raw_map(vec![("mystery", Value::Null)]));

    node.validate(&mut ValidateCx::new(&sink, &catalog));
    let first = sink.sorted();
    node.validate(&mut ValidateCx::new(&sink, &catalog));
    let second = sink.sorted();

    assert_eq!(first.len(), second.len());
}

#[test]
fn kind_mismatches_are_field_level() {
    let catalog = TypeCatalog::new();
    let issues = validate::<TestNode>(
        raw_map(vec![
            ("kind", Value::Str("toy".into())),
            ("requirements", Value::Seq(vec![])),
        ]),
        &catalog,
    );
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].level, issues::Level::Field);
    assert!(issues[0].message.contains("not a valid map"));
}
