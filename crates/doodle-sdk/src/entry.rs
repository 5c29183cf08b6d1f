//! Entry screen state: capturing the display name.

use tracing::warn;

use crate::identity::IdentityStore;

/// Name field of the entry screen.
///
/// Every edit is written to the identity store as typed, so the chat view
/// and the next launch see the same value.
pub struct EntryForm<S> {
    identity: S,
    name: String,
}

impl<S: IdentityStore> EntryForm<S> {
    /// Form pre-filled with the previously saved name, if any.
    pub fn new(identity: S) -> Self {
        let name = identity.get().unwrap_or_default();
        Self { identity, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the field content and persist it.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if let Err(e) = self.identity.set(&self.name) {
            warn!(error = %e, "failed to persist display name");
        }
    }

    pub fn can_proceed(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// The trimmed name when the user may enter the chat.
    pub fn proceed(&self) -> Option<&str> {
        self.can_proceed().then(|| self.name.trim())
    }

    /// The store the form writes to.
    pub fn identity(&self) -> &S {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::identity::MemoryIdentityStore;

    #[test]
    fn prefills_from_store() {
        let form = EntryForm::new(MemoryIdentityStore::with_author("Alice"));
        assert_eq!(form.name(), "Alice");
        assert!(form.can_proceed());
    }

    #[test]
    fn every_edit_is_persisted_as_typed() {
        let store = Arc::new(MemoryIdentityStore::default());
        let mut form = EntryForm::new(Arc::clone(&store));

        form.set_name("A");
        assert_eq!(store.get().as_deref(), Some("A"));
        form.set_name(" Al ");
        assert_eq!(store.get().as_deref(), Some(" Al "));
    }

    #[test]
    fn blank_name_cannot_proceed() {
        let mut form = EntryForm::new(MemoryIdentityStore::default());
        assert_eq!(form.proceed(), None);
        form.set_name("   ");
        assert!(!form.can_proceed());
        form.set_name("  Bob ");
        assert_eq!(form.proceed(), Some("Bob"));
    }
}
