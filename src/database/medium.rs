//! Key-value media that the card state store persists into.

use crate::error::MediumError;
use std::collections::HashMap;
use std::sync::Mutex;

/// A durable byte store addressed by string keys. Values are opaque blobs.
pub trait KeyValueMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError>;
    fn set(&self, key: &str, value: &str) -> Result<(), MediumError>;
    fn delete(&self, key: &str) -> Result<(), MediumError>;
}

/// In-process medium. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        let entries = self.entries.lock().map_err(|_| MediumError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let mut entries = self.entries.lock().map_err(|_| MediumError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), MediumError> {
        let mut entries = self.entries.lock().map_err(|_| MediumError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

impl<M: KeyValueMedium + ?Sized> KeyValueMedium for &M {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), MediumError> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_medium_get_set_delete() {
        let medium = MemoryMedium::new();
        assert_eq!(medium.get("k").unwrap(), None);

        medium.set("k", "v1").unwrap();
        medium.set("k", "v2").unwrap();
        assert_eq!(medium.get("k").unwrap().as_deref(), Some("v2"));

        medium.delete("k").unwrap();
        assert_eq!(medium.get("k").unwrap(), None);
        // deleting a missing key is fine
        medium.delete("k").unwrap();
    }
}
