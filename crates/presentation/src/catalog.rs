use indexmap::IndexMap;

/// The name spaces a profile registers in the catalog: its type
/// hierarchies, plus template names so reference validators can check
/// fields that accept either.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Node,
    Relationship,
    Capability,
    Data,
    Artifact,
    Group,
    Policy,
    Interface,
    NodeTemplate,
    RelationshipTemplate,
    GroupTemplate,
}

impl TypeCategory {
    pub fn name(&self) -> &'static str {
        match self {
            TypeCategory::Node => "node type",
            TypeCategory::Relationship => "relationship type",
            TypeCategory::Capability => "capability type",
            TypeCategory::Data => "data type",
            TypeCategory::Artifact => "artifact type",
            TypeCategory::Group => "group type",
            TypeCategory::Policy => "policy type",
            TypeCategory::Interface => "interface type",
            TypeCategory::NodeTemplate => "node template",
            TypeCategory::RelationshipTemplate => "relationship template",
            TypeCategory::GroupTemplate => "group",
        }
    }
}

impl std::fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name and parent of every declared type, per category. The catalog is
/// built from the merged presentation before validation, and is read-only
/// thereafter. Reference validators resolve against it; derivation later
/// rebuilds full indices with payloads in the model layer.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    categories: IndexMap<TypeCategory, IndexMap<String, Option<String>>>,
}

impl TypeCatalog {
    pub fn new() -> TypeCatalog {
        Default::default()
    }

    pub fn insert(&mut self, category: TypeCategory, name: &str, parent: Option<&str>) {
        self.categories
            .entry(category)
            .or_insert_with(IndexMap::new)
            .insert(name.to_string(), parent.map(str::to_string));
    }

    pub fn contains(&self, category: TypeCategory, name: &str) -> bool {
        self.categories
            .get(&category)
            .map(|types| types.contains_key(name))
            .unwrap_or(false)
    }

    pub fn parent(&self, category: TypeCategory, name: &str) -> Option<&str> {
        self.categories
            .get(&category)?
            .get(name)?
            .as_deref()
    }

    pub fn names(&self, category: TypeCategory) -> impl Iterator<Item = &str> {
        self.categories
            .get(&category)
            .into_iter()
            .flat_map(|types| types.keys().map(String::as_str))
    }

    /// Whether following `derived_from` edges upward from `name` revisits
    /// `name`.
    pub fn is_cyclic(&self, category: TypeCategory, name: &str) -> bool {
        let mut seen = vec![name];
        let mut cursor = name;
        while let Some(parent) = self.parent(category, cursor) {
            if seen.contains(&parent) {
                return true;
            }
            seen.push(parent);
            cursor = parent;
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cycle_detection_walks_parents() {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeCategory::Node, "a", None);
        catalog.insert(TypeCategory::Node, "b", Some("a"));
        catalog.insert(TypeCategory::Node, "c", Some("b"));
        assert!(!catalog.is_cyclic(TypeCategory::Node, "c"));

        catalog.insert(TypeCategory::Node, "a", Some("c"));
        assert!(catalog.is_cyclic(TypeCategory::Node, "c"));
        assert!(catalog.is_cyclic(TypeCategory::Node, "a"));
    }
}
