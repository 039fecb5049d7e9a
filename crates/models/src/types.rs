use indexmap::IndexMap;

/// An ordered name-to-parent index for one category of types. The graph is
/// a forest rooted at types without a parent; `derived_from` edges point
/// upward.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    entries: IndexMap<String, Option<String>>,
}

impl TypeIndex {
    pub fn new() -> TypeIndex {
        Default::default()
    }

    pub fn insert(&mut self, name: &str, parent: Option<&str>) {
        self.entries
            .insert(name.to_string(), parent.map(str::to_string));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The declared type name, or None when unknown. The plural of `get`
    /// across a hierarchy is [`TypeIndex::hierarchy`].
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get_full(name).map(|(_, k, _)| k.as_str())
    }

    pub fn get_parent(&self, name: &str) -> Option<&str> {
        self.entries.get(name)?.as_deref()
    }

    /// Find a declared type anywhere in the forest by name; used by
    /// consumers which hold a name of unknown category membership.
    pub fn get_descendant(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    /// True when `name` is `ancestor` or transitively derives from it.
    pub fn is_descendant(&self, ancestor: &str, name: &str) -> bool {
        let mut cursor = Some(name);
        let mut hops = 0;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get_parent(current);
            hops += 1;
            if hops > self.entries.len() {
                // Cyclic hierarchy; cycles are reported at build time.
                return false;
            }
        }
        false
    }

    /// The root-to-leaf chain of `name`, inclusive. Empty when unknown or
    /// cyclic.
    pub fn hierarchy(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut cursor = self.get(name);
        while let Some(current) = cursor {
            if chain.contains(&current) {
                return Vec::new();
            }
            chain.push(current);
            cursor = self.get_parent(current);
        }
        chain.reverse();
        chain
    }

    /// All type names, parents before children, insertion-stable within a
    /// generation.
    pub fn iter_descendants(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = Vec::with_capacity(self.entries.len());
        let mut remaining: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|name| {
                let ready = match self.get_parent(name) {
                    None => true,
                    Some(parent) => !self.contains(parent) || ordered.contains(&parent),
                };
                if ready {
                    ordered.push(name);
                }
                !ready
            });
            if remaining.len() == before {
                // Cycle: emit the remainder in declaration order.
                ordered.extend(remaining.drain(..));
            }
        }
        ordered
    }

    /// Names participating in a `derived_from` cycle.
    pub fn cycles(&self) -> Vec<&str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|name| {
                let mut cursor = self.get_parent(name);
                let mut hops = 0;
                while let Some(current) = cursor {
                    if current == *name {
                        return true;
                    }
                    cursor = self.get_parent(current);
                    hops += 1;
                    if hops > self.entries.len() {
                        return false;
                    }
                }
                false
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Well-known type names a profile binds its hierarchies to. The model
/// layer only ever compares against these roles, never against literal
/// profile names.
#[derive(Debug, Clone)]
pub struct TypeRoles {
    /// Node type whose descendants host other nodes.
    pub host_node_type: String,
    /// Relationship type whose descendants express containment.
    pub contained_in_relationship: String,
    /// Policy type whose descendants expand groups into scaling groups.
    pub scaling_policy: String,
}

/// Every per-category index of the derived template, read-only after
/// derivation.
#[derive(Debug, Clone)]
pub struct Types {
    pub node: TypeIndex,
    pub relationship: TypeIndex,
    pub capability: TypeIndex,
    pub data: TypeIndex,
    pub artifact: TypeIndex,
    pub group: TypeIndex,
    pub policy: TypeIndex,
    pub roles: TypeRoles,
}

impl Types {
    pub fn new(roles: TypeRoles) -> Types {
        Types {
            node: TypeIndex::new(),
            relationship: TypeIndex::new(),
            capability: TypeIndex::new(),
            data: TypeIndex::new(),
            artifact: TypeIndex::new(),
            group: TypeIndex::new(),
            policy: TypeIndex::new(),
            roles,
        }
    }

    pub fn is_host_node_type(&self, type_name: &str) -> bool {
        self.node.is_descendant(&self.roles.host_node_type, type_name)
    }

    pub fn is_containment_relationship(&self, type_name: &str) -> bool {
        self.relationship
            .is_descendant(&self.roles.contained_in_relationship, type_name)
    }

    pub fn is_scaling_policy(&self, type_name: &str) -> bool {
        type_name == self.roles.scaling_policy
            || self.policy.is_descendant(&self.roles.scaling_policy, type_name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn index() -> TypeIndex {
        let mut index = TypeIndex::new();
        index.insert("root", None);
        index.insert("compute", Some("root"));
        index.insert("vm", Some("compute"));
        index.insert("db", Some("root"));
        index
    }

    #[test]
    fn descendant_and_hierarchy() {
        let index = index();
        assert!(index.is_descendant("root", "vm"));
        assert!(index.is_descendant("compute", "vm"));
        assert!(!index.is_descendant("db", "vm"));
        assert_eq!(index.hierarchy("vm"), vec!["root", "compute", "vm"]);
    }

    #[test]
    fn topological_iteration_parents_first() {
        let mut index = TypeIndex::new();
        // Child declared before its parent.
        index.insert("vm", Some("compute"));
        index.insert("compute", Some("root"));
        index.insert("root", None);

        let order = index.iter_descendants();
        let pos = |n: &str| order.iter().position(|o| *o == n).unwrap();
        assert!(pos("root") < pos("compute"));
        assert!(pos("compute") < pos("vm"));
    }

    #[test]
    fn cycles_are_detected_and_bounded() {
        let mut index = TypeIndex::new();
        index.insert("a", Some("b"));
        index.insert("b", Some("a"));
        index.insert("ok", None);

        let mut cyclic = index.cycles();
        cyclic.sort();
        assert_eq!(cyclic, vec!["a", "b"]);
        assert!(index.hierarchy("a").is_empty());
        assert!(!index.is_descendant("ok", "a"));
    }
}
