use std::collections::BTreeMap;

use crate::plan::RenderPlan;

/// Opaque handle for an internal link destination.
///
/// Allocated once per conversion, bound to a page position while drawing and
/// referenced by any number of clickable regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkTarget(u32);

impl LinkTarget {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A component schema as rendered inside one tag section.
///
/// The same schema under two tags is two keys: each tag section renders its
/// own copy, so links stay inside the section they start from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    pub tag: String,
    pub schema: String,
}

impl ComponentKey {
    pub fn new(tag: &str, schema: &str) -> Self {
        ComponentKey {
            tag: tag.to_string(),
            schema: schema.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LinkRegistry {
    next: u32,
    components: BTreeMap<ComponentKey, LinkTarget>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic; identifiers are never reused within one registry.
    pub fn new_link(&mut self) -> LinkTarget {
        let target = LinkTarget(self.next);
        self.next += 1;
        target
    }

    pub fn allocated(&self) -> usize {
        self.next as usize
    }

    /// Pre-allocate one target per `(tag, component)` in plan order.
    pub fn register_components(&mut self, plan: &RenderPlan<'_>) {
        for tag in &plan.tags {
            for name in &tag.components {
                let target = self.new_link();
                self.components.insert(ComponentKey::new(&tag.name, name), target);
            }
        }
    }

    pub fn component(&self, tag: &str, schema: &str) -> Option<LinkTarget> {
        self.components.get(&ComponentKey::new(tag, schema)).copied()
    }

    pub fn components(&self) -> impl Iterator<Item = (&ComponentKey, LinkTarget)> {
        self.components.iter().map(|(k, &t)| (k, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_monotonic() {
        let mut links = LinkRegistry::new();
        let a = links.new_link();
        let b = links.new_link();
        assert!(a < b);
        assert_eq!(links.allocated(), 2);
        assert_eq!(b.index(), 1);
    }
}
