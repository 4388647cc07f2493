use super::error::StepError;
use crate::core::store::{RecordStore, StoreError};
use serde::Serialize;
use tracing::{debug, warn};

/// Writes staged by a step, applied together only when the step succeeds.
///
/// `commit` snapshots the current value of every staged key first. If any
/// write fails, keys already written are restored from the snapshot.
pub struct RecordTransaction<'a> {
    store: &'a dyn RecordStore,
    staged: Vec<(String, Vec<u8>)>,
}

impl<'a> RecordTransaction<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self {
            store,
            staged: Vec::new(),
        }
    }

    /// Reads go to the underlying store; staged values are not visible.
    pub fn store(&self) -> &'a dyn RecordStore {
        self.store
    }

    /// A later stage of the same key replaces the earlier one.
    pub fn stage(&mut self, key: impl Into<String>, value: Vec<u8>) {
        let key = key.into();
        self.staged.retain(|(k, _)| *k != key);
        self.staged.push((key, value));
    }

    pub fn stage_json<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StoreError> {
        let key = key.into();
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Json {
            key: key.clone(),
            source: e,
        })?;
        self.stage(key, bytes);
        Ok(())
    }

    pub fn staged_keys(&self) -> impl Iterator<Item = &str> {
        self.staged.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Returns the number of keys written.
    pub fn commit(self) -> Result<usize, StoreError> {
        let mut originals = Vec::with_capacity(self.staged.len());
        for (key, _) in &self.staged {
            originals.push((key.as_str(), self.store.get(key)?));
        }

        for (written, (key, value)) in self.staged.iter().enumerate() {
            if let Err(e) = self.store.put(key, value) {
                warn!(key = %key, error = %e, "Write failed, restoring {} key(s)", written);
                self.restore(&originals[..written]);
                return Err(e);
            }
        }
        debug!(count = self.staged.len(), "Transaction committed");
        Ok(self.staged.len())
    }

    fn restore(&self, originals: &[(&str, Option<Vec<u8>>)]) {
        for (key, original) in originals {
            let result = match original {
                Some(bytes) => self.store.put(key, bytes),
                None => self.store.delete(key),
            };
            if let Err(e) = result {
                warn!(key = %key, error = %e, "Failed to restore key after aborted commit");
            }
        }
    }
}

/// Runs `action` against a fresh transaction and commits its writes only if
/// it returns `Ok`.
pub fn run<'a, F, R>(store: &'a dyn RecordStore, action: F) -> Result<R, StepError>
where
    F: FnOnce(&mut RecordTransaction<'a>) -> Result<R, StepError>,
{
    // 1. Stage every write.
    let mut transaction = RecordTransaction::new(store);
    let result = action(&mut transaction)?;

    // 2. Apply them together.
    transaction.commit()?;
    Ok(result)
}
