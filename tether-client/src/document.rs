//! The slice of the DOM the page side touches.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// Class list mutation over every element carrying a marker class.
pub trait Document: Send + Sync {
    /// Adds (`present == true`) or removes `class` on every element that has
    /// `marker`. Returns how many elements matched.
    fn toggle_class(&self, marker: &str, class: &str, present: bool) -> usize;
}

/// Element handle into a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

/// In-memory document: a flat list of elements and their class lists.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: Mutex<Vec<BTreeSet<String>>>,
}

impl MemoryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element with the given classes.
    pub fn add_element(&self, classes: &[&str]) -> ElementId {
        let mut elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.push(classes.iter().map(|class| (*class).to_owned()).collect());
        ElementId(elements.len() - 1)
    }

    /// Whether `element` currently has `class`.
    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(element.0)
            .is_some_and(|classes| classes.contains(class))
    }

    /// Class list of `element`, sorted.
    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(element.0)
            .map(|classes| classes.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Document for MemoryDocument {
    fn toggle_class(&self, marker: &str, class: &str, present: bool) -> usize {
        let mut elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        let mut matched = 0;
        for classes in elements.iter_mut().filter(|classes| classes.contains(marker)) {
            if present {
                classes.insert(class.to_owned());
            } else {
                classes.remove(class);
            }
            matched += 1;
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_only_marked_elements() {
        let doc = MemoryDocument::new();
        let banner = doc.add_element(&["offline", "banner"]);
        let footer = doc.add_element(&["footer"]);

        assert_eq!(doc.toggle_class("offline", "offline_visible", true), 1);
        assert!(doc.has_class(banner, "offline_visible"));
        assert!(!doc.has_class(footer, "offline_visible"));

        assert_eq!(doc.toggle_class("offline", "offline_visible", false), 1);
        assert_eq!(doc.classes(banner), vec!["banner", "offline"]);
    }
}
