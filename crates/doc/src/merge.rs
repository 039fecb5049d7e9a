use super::{Children, Locator, Value};

/// Union-merge `src` into `dst`. Mapping entries present only in `src` are
/// appended; entries present in both recurse when both sides are mappings
/// and otherwise keep `dst`. Sequences concatenate with `dst` elements
/// first. Scalar conflicts keep `dst`.
///
/// This is the import-composition rule: the importing document wins over
/// what it imports, and repeated application in any import order yields the
/// same tree.
pub fn merge(dst: &mut Value, src: &Value) {
    merge_with_locators(dst, src, None, None);
}

/// Like [`merge`], also folding `src_locator` into `dst_locator` so that
/// positions keep pointing at whichever document contributed each value.
pub fn merge_with_locators(
    dst: &mut Value,
    src: &Value,
    dst_locator: Option<&mut Locator>,
    src_locator: Option<&Locator>,
) {
    match (dst, src) {
        (Value::Map(dst_map), Value::Map(src_map)) => {
            let dst_children = dst_locator.map(|l| {
                if !matches!(l.children, Children::Map(_)) {
                    l.children = Children::Map(Default::default());
                }
                match &mut l.children {
                    Children::Map(m) => m,
                    _ => unreachable!(),
                }
            });
            let mut dst_children = dst_children;

            for (key, src_value) in src_map {
                let src_child_locator = src_locator.map(|l| l.get(key));

                if let Some(dst_value) = dst_map.get_mut(key) {
                    let dst_child_locator = dst_children
                        .as_deref_mut()
                        .and_then(|m| m.get_mut(key.as_str()));
                    merge_with_locators(
                        dst_value,
                        src_value,
                        dst_child_locator,
                        src_child_locator,
                    );
                } else {
                    dst_map.insert(key.clone(), src_value.clone());
                    if let (Some(m), Some(l)) = (dst_children.as_deref_mut(), src_child_locator) {
                        m.insert(key.clone(), l.clone());
                    }
                }
            }
        }
        (Value::Seq(dst_seq), Value::Seq(src_seq)) => {
            dst_seq.extend(src_seq.iter().cloned());
            if let (Some(dst_loc), Some(src_loc)) = (dst_locator, src_locator) {
                if let (Children::Seq(dst_items), Children::Seq(src_items)) =
                    (&mut dst_loc.children, &src_loc.children)
                {
                    dst_items.extend(src_items.iter().cloned());
                }
            }
        }
        // Anything else: the destination wins.
        _ => (),
    }
}

#[cfg(test)]
mod test {
    use super::super::Map;
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Map>(),
        )
    }

    #[test]
    fn destination_wins_and_imports_append() {
        let mut dst = map(vec![
            ("shared", Value::Str("mine".into())),
            (
                "nested",
                map(vec![("a", Value::Int(1)), ("b", Value::Int(2))]),
            ),
        ]);
        let src = map(vec![
            ("shared", Value::Str("theirs".into())),
            (
                "nested",
                map(vec![("b", Value::Int(20)), ("c", Value::Int(30))]),
            ),
            ("new", Value::Bool(true)),
        ]);

        merge(&mut dst, &src);

        assert_eq!(dst.get("shared").unwrap(), &Value::Str("mine".into()));
        let nested = dst.get("nested").unwrap();
        assert_eq!(nested.get("a").unwrap(), &Value::Int(1));
        assert_eq!(nested.get("b").unwrap(), &Value::Int(2));
        assert_eq!(nested.get("c").unwrap(), &Value::Int(30));
        assert_eq!(dst.get("new").unwrap(), &Value::Bool(true));
    }

    #[test]
    fn sequences_concatenate_in_order() {
        let mut dst = Value::Seq(vec![Value::Int(1), Value::Int(2)]);
        let src = Value::Seq(vec![Value::Int(3)]);
        merge(&mut dst, &src);
        assert_eq!(
            dst,
            Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn merge_is_order_independent_for_disjoint_imports() {
        let base = map(vec![("root", Value::Int(0))]);
        let import_a = map(vec![("a", Value::Int(1))]);
        let import_b = map(vec![("b", Value::Int(2))]);

        let mut left = base.clone();
        merge(&mut left, &import_a);
        merge(&mut left, &import_b);

        let mut right = base;
        merge(&mut right, &import_b);
        merge(&mut right, &import_a);

        // Entry order may differ between the two, but contents agree.
        for key in ["root", "a", "b"] {
            assert_eq!(left.get(key), right.get(key));
        }
    }
}
