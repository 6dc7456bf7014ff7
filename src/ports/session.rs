//! Session store port: the key/value slots that live as long as one session.
//!
//! The access gate keeps its obfuscated credential here. Values are always
//! read and written whole, so there are no partial-update races.

/// Session-scoped key/value storage.
///
/// Nothing stored here is ever sent to the persistence collaborator.
pub trait SessionStore: Send + Sync {
    /// Read a slot. `None` if unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: String);

    /// Remove a single slot.
    fn remove(&self, key: &str);
}
