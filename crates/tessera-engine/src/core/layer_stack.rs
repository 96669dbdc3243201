use std::rc::Rc;

use super::layer::{LayerId, LayerRef};

/// Ordered layers followed by overlays.
///
/// Storage only: attach and detach hooks are the caller's job.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<LayerRef>,
    /// Index of the first overlay.
    insert: usize,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after the last normal layer, below every overlay.
    pub fn push_layer(&mut self, layer: LayerRef) {
        self.layers.insert(self.insert, layer);
        self.insert += 1;
    }

    pub fn push_overlay(&mut self, overlay: LayerRef) {
        self.layers.push(overlay);
    }

    /// Removes `layer` wherever it sits. The overlay boundary only moves
    /// when the entry was below it.
    pub fn remove_layer(&mut self, layer: &LayerRef) -> Option<LayerRef> {
        let index = self.position(layer)?;
        Some(self.remove_at(index))
    }

    /// Same lookup as [`remove_layer`](Self::remove_layer).
    pub fn remove_overlay(&mut self, overlay: &LayerRef) -> Option<LayerRef> {
        let index = self.position(overlay)?;
        Some(self.remove_at(index))
    }

    pub fn remove_by_id(&mut self, id: LayerId) -> Option<LayerRef> {
        let index = self.layers.iter().position(|l| l.borrow().id() == id)?;
        Some(self.remove_at(index))
    }

    /// Removes the first entry with `name`.
    pub fn remove_by_name(&mut self, name: &str) -> Option<LayerRef> {
        let index = self.layers.iter().position(|l| l.borrow().name() == name)?;
        Some(self.remove_at(index))
    }

    fn position(&self, layer: &LayerRef) -> Option<usize> {
        self.layers.iter().position(|l| Rc::ptr_eq(l, layer))
    }

    fn remove_at(&mut self, index: usize) -> LayerRef {
        if index < self.insert {
            self.insert -= 1;
        }
        self.layers.remove(index)
    }

    pub fn find_by_id(&self, id: LayerId) -> Option<LayerRef> {
        self.layers.iter().find(|l| l.borrow().id() == id).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<LayerRef> {
        self.layers.iter().find(|l| l.borrow().name() == name).cloned()
    }

    /// Drops every entry without calling any hook.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.insert = 0;
    }

    /// Normal layers then overlays, both in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LayerRef> {
        self.layers.iter()
    }

    /// Overlays first, topmost first.
    pub fn iter_rev(&self) -> std::iter::Rev<std::slice::Iter<'_, LayerRef>> {
        self.layers.iter().rev()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of normal layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.insert
    }

    #[inline]
    pub fn overlay_count(&self) -> usize {
        self.layers.len() - self.insert
    }
}

impl<'a> IntoIterator for &'a LayerStack {
    type Item = &'a LayerRef;
    type IntoIter = std::slice::Iter<'a, LayerRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layer::{Layer, LayerInfo, layer_ref};

    struct Plain(LayerInfo);

    impl Layer for Plain {
        fn info(&self) -> &LayerInfo {
            &self.0
        }

        fn info_mut(&mut self) -> &mut LayerInfo {
            &mut self.0
        }
    }

    fn named(name: &str) -> LayerRef {
        layer_ref(Plain(LayerInfo::new(name, 0)))
    }

    fn names(stack: &LayerStack) -> Vec<String> {
        stack.iter().map(|l| l.borrow().name().to_string()).collect()
    }

    #[test]
    fn layers_stay_below_overlays() {
        let mut stack = LayerStack::new();
        stack.push_overlay(named("o1"));
        stack.push_layer(named("l1"));
        stack.push_overlay(named("o2"));
        stack.push_layer(named("l2"));

        assert_eq!(names(&stack), ["l1", "l2", "o1", "o2"]);
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.overlay_count(), 2);

        let reversed: Vec<_> = stack.iter_rev().map(|l| l.borrow().name().to_string()).collect();
        assert_eq!(reversed, ["o2", "o1", "l2", "l1"]);
    }

    #[test]
    fn removing_a_layer_moves_the_boundary() {
        let mut stack = LayerStack::new();
        let l1 = named("l1");
        let o1 = named("o1");
        stack.push_layer(l1.clone());
        stack.push_layer(named("l2"));
        stack.push_overlay(o1.clone());

        assert!(stack.remove_layer(&l1).is_some());
        assert_eq!(stack.layer_count(), 1);

        assert!(stack.remove_overlay(&o1).is_some());
        assert_eq!(stack.layer_count(), 1);
        assert_eq!(names(&stack), ["l2"]);

        stack.push_layer(named("l3"));
        assert_eq!(names(&stack), ["l2", "l3"]);
    }

    #[test]
    fn removal_by_reference_matches_either_region() {
        let mut stack = LayerStack::new();
        let a = named("a");
        let o = named("o");
        stack.push_layer(a.clone());
        stack.push_overlay(o.clone());

        assert!(stack.remove_layer(&o).is_some());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.layer_count(), 1);
        assert_eq!(stack.overlay_count(), 0);

        assert!(stack.remove_overlay(&a).is_some());
        assert!(stack.is_empty());
        assert_eq!(stack.layer_count(), 0);

        // Boundary stays put, so later pushes still land below overlays.
        stack.push_overlay(named("top"));
        stack.push_layer(named("base"));
        assert_eq!(names(&stack), ["base", "top"]);
    }

    #[test]
    fn remove_by_id_and_name() {
        let mut stack = LayerStack::new();
        let a = named("a");
        let id = a.borrow().id();
        stack.push_layer(a);
        stack.push_layer(named("b"));
        stack.push_overlay(named("c"));

        assert!(stack.find_by_name("b").is_some());
        assert!(stack.remove_by_id(id).is_some());
        assert!(stack.find_by_id(id).is_none());
        assert_eq!(stack.layer_count(), 1);

        assert!(stack.remove_by_name("c").is_some());
        assert_eq!(stack.layer_count(), 1);
        assert!(stack.remove_by_name("missing").is_none());
    }

    #[test]
    fn clear_resets_boundary() {
        let mut stack = LayerStack::new();
        stack.push_layer(named("a"));
        stack.push_overlay(named("b"));
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.layer_count(), 0);
        stack.push_overlay(named("c"));
        stack.push_layer(named("d"));
        assert_eq!(names(&stack), ["d", "c"]);
    }
}
