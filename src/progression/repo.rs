//! Sheet-backed repositories for progression entries and inventory
//!
//! Both repositories follow the same read-modify-write contract as the
//! store beneath them: read a whole value, mutate it in memory, write
//! it back. Entry paths are `progression.<track>.<key>`; inventory is a
//! single array under `inventory`.

use serde_json::{json, Value};

use crate::core::{ActorId, DuskError, ItemId, Result};
use crate::progression::tracks::{ProgressAward, ProgressEntry, ProgressTrack};
use crate::services::ActorStore;

/// Read and update `{level, rank, progress}` entries on actor sheets
pub struct ProgressionRepo<'a> {
    store: &'a dyn ActorStore,
}

impl<'a> ProgressionRepo<'a> {
    pub fn new(store: &'a dyn ActorStore) -> Self {
        Self { store }
    }

    fn entry_path(track: ProgressTrack, key: &str) -> String {
        format!("progression.{}.{}", track.key(), key)
    }

    /// Read an entry, defaulting to all-zero when the sheet has none
    pub async fn entry(
        &self,
        actor: ActorId,
        track: ProgressTrack,
        key: &str,
    ) -> Result<ProgressEntry> {
        let path = Self::entry_path(track, key);
        match self.store.read_field(actor, &path).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|err| DuskError::InvalidField {
                    path,
                    reason: err.to_string(),
                })
            }
            None => Ok(ProgressEntry::default()),
        }
    }

    /// Read, mutate, and write back one entry, returning the new state
    pub async fn with_entry<F>(
        &self,
        actor: ActorId,
        track: ProgressTrack,
        key: &str,
        mutate: F,
    ) -> Result<ProgressEntry>
    where
        F: FnOnce(&mut ProgressEntry),
    {
        let mut entry = self.entry(actor, track, key).await?;
        mutate(&mut entry);
        let path = Self::entry_path(track, key);
        self.store
            .write_fields(actor, vec![(path, serde_json::to_value(entry)?)])
            .await?;
        Ok(entry)
    }

    /// Bank an award's progress, taking any rank-ups it pays for
    pub async fn apply(&self, award: &ProgressAward) -> Result<ProgressEntry> {
        let amount = award.amount;
        let entry = self
            .with_entry(award.actor, award.track, &award.key, |entry| {
                entry.bank(amount);
            })
            .await?;
        tracing::debug!(
            "Progress banked: actor={} track={} key={} rank={} progress={}",
            award.actor,
            award.track.key(),
            award.key,
            entry.rank,
            entry.progress
        );
        Ok(entry)
    }
}

/// Read and update the item array on actor sheets
///
/// Items are free-form JSON records carrying at least an `id`; the
/// combat pipeline also looks for `damage_formula`, `material_bonus`,
/// `quality_modifier`, and a `uses` counter.
pub struct InventoryRepo<'a> {
    store: &'a dyn ActorStore,
}

impl<'a> InventoryRepo<'a> {
    pub fn new(store: &'a dyn ActorStore) -> Self {
        Self { store }
    }

    /// Read the whole inventory array, empty when the sheet has none
    pub async fn items(&self, actor: ActorId) -> Result<Vec<Value>> {
        match self.store.read_field(actor, "inventory").await? {
            Some(Value::Array(items)) => Ok(items),
            Some(_) | None => Ok(Vec::new()),
        }
    }

    /// Find one item by id
    pub async fn find(&self, actor: ActorId, item: ItemId) -> Result<Option<Value>> {
        let id = item.to_string();
        Ok(self
            .items(actor)
            .await?
            .into_iter()
            .find(|record| record.get("id").and_then(Value::as_str) == Some(id.as_str())))
    }

    /// Read, mutate, and write back one item inside the array
    ///
    /// The whole array is written back in one store call, keeping the
    /// store's last-write-wins contract at array granularity.
    pub async fn with_item<F>(&self, actor: ActorId, item: ItemId, mutate: F) -> Result<Value>
    where
        F: FnOnce(&mut Value),
    {
        let id = item.to_string();
        let mut items = self.items(actor).await?;
        let record = items
            .iter_mut()
            .find(|record| record.get("id").and_then(Value::as_str) == Some(id.as_str()))
            .ok_or(DuskError::MissingItem(item))?;
        mutate(record);
        let updated = record.clone();
        self.store
            .write_fields(actor, vec![("inventory".to_string(), Value::Array(items))])
            .await?;
        Ok(updated)
    }

    /// Decrement an item's `uses` counter
    ///
    /// `Ok(None)` when the item carries no counter (unlimited use). An
    /// exhausted counter reports `Some(0)` and is not driven negative.
    pub async fn spend_use(&self, actor: ActorId, item: ItemId) -> Result<Option<i64>> {
        let mut remaining = None;
        self.with_item(actor, item, |record| {
            if let Some(uses) = record.get("uses").and_then(Value::as_i64) {
                let next = (uses - 1).max(0);
                record["uses"] = json!(next);
                remaining = Some(next);
            }
        })
        .await?;
        Ok(remaining)
    }
}
