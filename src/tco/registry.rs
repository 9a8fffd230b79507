use std::collections::HashSet;

/// Membership set of tail-call-optimized functions.
///
/// Owned by the interpreter rather than living in process-global state, and
/// append-only: a function is registered the moment its transformation
/// succeeds, before it can be called, so mutual recursion between decorated
/// functions is detected correctly regardless of definition order. There is
/// no removal; membership lasts for the interpreter's lifetime.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    names: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
