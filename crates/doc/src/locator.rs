use std::sync::Arc;
use url::Url;

/// A 1-based position within a source document. Line 0 means the position
/// is unknown and stands for the document as a whole.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Span {
        Span { line, column }
    }
}

/// Children of a Locator, mirroring the container kind of the raw node
/// the Locator annotates.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    None,
    Seq(Vec<Locator>),
    Map(indexmap::IndexMap<String, Locator>),
}

/// Locator is a tree isomorphic to a raw document which maps every
/// container and leaf to its source position. A lookup that misses returns
/// the queried node itself, so locations degrade to the nearest ancestor
/// rather than disappearing.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    pub source: Arc<Url>,
    pub span: Span,
    pub children: Children,
}

impl Locator {
    pub fn leaf(source: Arc<Url>, span: Span) -> Locator {
        Locator {
            source,
            span,
            children: Children::None,
        }
    }

    pub fn seq(source: Arc<Url>, span: Span, children: Vec<Locator>) -> Locator {
        Locator {
            source,
            span,
            children: Children::Seq(children),
        }
    }

    pub fn map(
        source: Arc<Url>,
        span: Span,
        children: indexmap::IndexMap<String, Locator>,
    ) -> Locator {
        Locator {
            source,
            span,
            children: Children::Map(children),
        }
    }

    /// A locator standing for an entire document, with no finer positions.
    pub fn whole_document(source: Arc<Url>) -> Locator {
        Locator::leaf(source, Span::default())
    }

    /// The locator of the named child, or this locator when the child is
    /// unknown.
    pub fn get(&self, key: &str) -> &Locator {
        match &self.children {
            Children::Map(m) => m.get(key).unwrap_or(self),
            _ => self,
        }
    }

    /// The locator of the indexed child, or this locator when the child is
    /// unknown.
    pub fn index(&self, index: usize) -> &Locator {
        match &self.children {
            Children::Seq(s) => s.get(index).unwrap_or(self),
            _ => self,
        }
    }

    /// Walk a path of mapping keys, inheriting the nearest ancestor at each
    /// miss.
    pub fn descend(&self, path: &[&str]) -> &Locator {
        let mut cur = self;
        for key in path {
            cur = cur.get(key);
        }
        cur
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn source() -> Arc<Url> {
        Arc::new(Url::parse("literal:test").unwrap())
    }

    #[test]
    fn lookup_falls_back_to_nearest_ancestor() {
        let mut children = indexmap::IndexMap::new();
        children.insert(
            "present".to_string(),
            Locator::leaf(source(), Span::new(3, 5)),
        );
        let root = Locator::map(source(), Span::new(1, 1), children);

        assert_eq!(root.get("present").span, Span::new(3, 5));
        assert_eq!(root.get("absent").span, Span::new(1, 1));
        assert_eq!(root.descend(&["present", "deeper"]).span, Span::new(3, 5));
        assert_eq!(root.index(7).span, Span::new(1, 1));
    }
}
