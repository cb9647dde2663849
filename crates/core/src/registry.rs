//! Registry of slide type descriptors

use crate::slide_type::SlideType;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-keyed table of slide type descriptors
///
/// Built once at startup and handed to the scheduler. There is no global
/// instance; tests build their own with fake descriptors.
#[derive(Clone, Default)]
pub struct SlideTypeRegistry {
    types: HashMap<String, Arc<dyn SlideType>>,
}

impl SlideTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own type name, replacing any previous one
    pub fn register(&mut self, slide_type: Arc<dyn SlideType>) {
        self.types.insert(slide_type.type_name().to_string(), slide_type);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, slide_type: Arc<dyn SlideType>) -> Self {
        self.register(slide_type);
        self
    }

    /// Look up a descriptor. Unknown names are expected and yield `None`.
    pub fn lookup(&self, type_name: &str) -> Option<Arc<dyn SlideType>> {
        self.types.get(type_name).cloned()
    }

    /// Sorted list of registered type names
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
