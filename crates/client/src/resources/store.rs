//! Generic backend-synced resource list.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use hr_feedback_core::{AdminId, ResourceId};

use super::{LoadPhase, Resource, ResourceBackend, StoreError, SyncReport, SyncStatus, WritePolicy};
use crate::storage::{Decoded, KeyValueStore, admin_key, read_json};

struct State<R> {
    owner: Option<AdminId>,
    /// Bumped on every owner change; responses tagged with an older epoch
    /// are dropped.
    epoch: u64,
    records: Vec<R>,
    /// Backend-known records whose last local change was not accepted.
    /// Mirrored to local storage next to the records.
    unsynced: HashSet<ResourceId>,
    loading: bool,
    loaded: bool,
}

impl<R: Resource> State<R> {
    fn find(&self, id: &ResourceId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    fn find_mut(&mut self, id: &ResourceId) -> Option<&mut R> {
        self.records.iter_mut().find(|r| r.id() == Some(id))
    }

    fn upsert(&mut self, record: R) {
        let slot = match record.id() {
            Some(id) => self.records.iter_mut().find(|r| r.id() == Some(id)),
            None => None,
        };
        match slot {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    fn reset(&mut self) {
        self.records.clear();
        self.unsynced.clear();
        self.loading = false;
        self.loaded = false;
    }
}

/// An in-memory list of one admin's records, mirrored to local storage.
///
/// All methods take `&self`; the list is guarded by a mutex that is never
/// held across a backend call.
pub struct ResourceStore<R: Resource> {
    backend: Arc<dyn ResourceBackend<R>>,
    local: Arc<dyn KeyValueStore>,
    policy: WritePolicy,
    state: Mutex<State<R>>,
}

impl<R: Resource> std::fmt::Debug for ResourceStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ResourceStore")
            .field("kind", &R::KIND)
            .field("policy", &self.policy)
            .field("owner", &state.owner)
            .field("records", &state.records.len())
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceStore<R> {
    /// Create an empty store with no owner.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ResourceBackend<R>>,
        local: Arc<dyn KeyValueStore>,
        policy: WritePolicy,
    ) -> Self {
        Self {
            backend,
            local,
            policy,
            state: Mutex::new(State {
                owner: None,
                epoch: 0,
                records: Vec::new(),
                unsynced: HashSet::new(),
                loading: false,
                loaded: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn policy(&self) -> WritePolicy {
        self.policy
    }

    #[must_use]
    pub fn owner(&self) -> Option<AdminId> {
        self.lock().owner.clone()
    }

    /// Point the store at a different admin (or none).
    ///
    /// Clears the in-memory list and invalidates in-flight requests. Returns
    /// `false` if the owner is unchanged.
    pub fn set_owner(&self, owner: Option<AdminId>) -> bool {
        let mut state = self.lock();
        if state.owner == owner {
            return false;
        }
        debug!(kind = R::KIND, from = ?state.owner, to = ?owner, "Owner changed");
        state.owner = owner;
        state.epoch += 1;
        state.reset();
        true
    }

    /// Fetch the owner's records from the backend.
    ///
    /// At most one load runs at a time; a call made while another is in
    /// flight returns immediately. If the backend fails, the cached copy is
    /// used instead. With no owner the list is simply emptied.
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn load_from_backend(&self) {
        let (owner, epoch) = {
            let mut state = self.lock();
            if state.loading {
                debug!("Load already in flight");
                return;
            }
            let Some(owner) = state.owner.clone() else {
                state.records.clear();
                state.unsynced.clear();
                state.loaded = true;
                return;
            };
            state.loading = true;
            (owner, state.epoch)
        };

        let result = self.backend.list(&owner).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!(owner = %owner, "Discarding load for previous owner");
            return;
        }
        state.loading = false;

        match result {
            Ok(fetched) => {
                let (local_only, edits): (Vec<R>, Vec<R>) = if state.loaded {
                    state
                        .records
                        .iter()
                        .filter(|r| {
                            is_local_only(*r) || r.id().is_some_and(|id| state.unsynced.contains(id))
                        })
                        .cloned()
                        .partition(|r| is_local_only(r))
                } else {
                    let (cached, marked) = self.read_cache(&owner);
                    cached
                        .into_iter()
                        .filter(|r| is_local_only(r) || r.id().is_some_and(|id| marked.contains(id)))
                        .partition(|r| is_local_only(r))
                };
                state.records = dedupe(fetched);
                state.unsynced.clear();
                // Unpushed edits win over the backend copy until they sync.
                for edit in edits {
                    let Some(id) = edit.id().cloned() else {
                        continue;
                    };
                    match state.find_mut(&id) {
                        Some(slot) => {
                            *slot = edit;
                            state.unsynced.insert(id);
                        }
                        None => debug!(id = %id, "Dropping change to a record the backend no longer has"),
                    }
                }
                for record in local_only {
                    state.upsert(record);
                }
                state.loaded = true;
                info!(count = state.records.len(), "Loaded from backend");
                self.write_cache(&state);
            }
            Err(e) => {
                warn!(error = %e, "Backend unavailable, using cached copy");
                self.restore_cached(&mut state, &owner);
            }
        }
    }

    /// Replace the in-memory list with the cached copy for the current owner.
    ///
    /// A missing or corrupt cache yields an empty list.
    pub fn load_from_local_storage(&self) {
        let mut state = self.lock();
        match state.owner.clone() {
            Some(owner) => self.restore_cached(&mut state, &owner),
            None => {
                state.records.clear();
                state.unsynced.clear();
                state.loaded = true;
            }
        }
    }

    fn restore_cached(&self, state: &mut State<R>, owner: &AdminId) {
        let (records, marked) = self.read_cache(owner);
        state.unsynced = records
            .iter()
            .filter_map(|r| r.id().filter(|id| marked.contains(*id)).cloned())
            .collect();
        state.records = records;
        state.loaded = true;
    }

    /// The cached records and the IDs among them still waiting to be pushed.
    fn read_cache(&self, owner: &AdminId) -> (Vec<R>, HashSet<ResourceId>) {
        let key = admin_key(R::STORAGE_KEY, owner);
        let records = match read_json::<Vec<R>>(self.local.as_ref(), &key) {
            Decoded::Value(records) => dedupe(records),
            Decoded::Missing => Vec::new(),
            Decoded::Corrupt(reason) => {
                warn!(kind = R::KIND, key = %key, reason = %reason, "Discarding corrupt cache");
                Vec::new()
            }
        };
        let marker = unsynced_key(&key);
        let marked = match read_json::<Vec<ResourceId>>(self.local.as_ref(), &marker) {
            Decoded::Value(ids) => ids.into_iter().collect(),
            Decoded::Missing => HashSet::new(),
            Decoded::Corrupt(reason) => {
                warn!(kind = R::KIND, key = %marker, reason = %reason, "Discarding corrupt unsynced list");
                HashSet::new()
            }
        };
        (records, marked)
    }

    fn write_cache(&self, state: &State<R>) {
        let Some(owner) = &state.owner else {
            return;
        };
        let key = admin_key(R::STORAGE_KEY, owner);
        let mut unsynced: Vec<&ResourceId> = state.unsynced.iter().collect();
        unsynced.sort();
        let entries = match (
            serde_json::to_string(&state.records),
            serde_json::to_string(&unsynced),
        ) {
            (Ok(records), Ok(unsynced)) => [(unsynced_key(&key), unsynced), (key, records)],
            (Err(e), _) | (_, Err(e)) => {
                warn!(kind = R::KIND, key = %key, error = %e, "Failed to encode cache");
                return;
            }
        };
        if let Err(e) = self.local.set_many(&entries) {
            warn!(kind = R::KIND, error = %e, "Failed to write cache");
        }
    }

    fn snapshot(&self) -> Result<(AdminId, u64), StoreError> {
        let state = self.lock();
        state
            .owner
            .clone()
            .map(|owner| (owner, state.epoch))
            .ok_or(StoreError::NotAuthenticated)
    }

    /// Create a record for the current owner.
    ///
    /// If the backend cannot be reached the record is kept locally under a
    /// temporary ID and reported as [`SyncStatus::LocalOnly`].
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if there is no owner
    /// - `OwnerChanged` if the owner changed before the backend answered
    #[instrument(skip_all, fields(kind = R::KIND))]
    pub async fn create(&self, mut record: R) -> Result<R, StoreError> {
        let (owner, epoch) = self.snapshot()?;
        record.assign_owner(&owner);

        let result = self.backend.create(&owner, &record).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            warn!(owner = %owner, "Owner changed during create, dropping result");
            return Err(StoreError::OwnerChanged { kind: R::KIND });
        }
        match result {
            Ok(id) => {
                debug!(id = %id, "Created");
                record.set_id(id);
            }
            Err(e) => {
                let id = temporary_id::<R>(&state);
                warn!(error = %e, id = %id, "Backend create failed, keeping local copy");
                record.set_id(id);
            }
        }
        state.upsert(record.clone());
        self.write_cache(&state);
        Ok(record)
    }

    /// Replace a record by ID.
    ///
    /// Unknown IDs are ignored. Records with a temporary ID are only changed
    /// locally. Otherwise the store's [`WritePolicy`] decides what a backend
    /// failure does.
    ///
    /// # Errors
    ///
    /// - `MissingId` if the record has never been saved
    /// - `NotAuthenticated` if there is no owner
    /// - `OwnerChanged` or `Backend` under the strict policy
    #[instrument(skip_all, fields(kind = R::KIND))]
    pub async fn update(&self, record: R) -> Result<(), StoreError> {
        let id = record
            .id()
            .cloned()
            .ok_or(StoreError::MissingId { kind: R::KIND })?;
        let (_, epoch) = self.snapshot()?;

        {
            let mut state = self.lock();
            if state.find(&id).is_none() {
                debug!(id = %id, "Update for unknown id ignored");
                return Ok(());
            }
            if id.is_temporary() || self.policy == WritePolicy::Optimistic {
                state.upsert(record.clone());
                self.write_cache(&state);
            }
            if id.is_temporary() {
                debug!(id = %id, "Updated local-only record");
                return Ok(());
            }
        }

        let result = self.backend.update(&record).await;

        match (self.policy, result) {
            (WritePolicy::Optimistic, Ok(())) => {
                let mut state = self.lock();
                if state.epoch == epoch && state.unsynced.remove(&id) {
                    self.write_cache(&state);
                }
                Ok(())
            }
            (WritePolicy::Optimistic, Err(e)) => {
                warn!(id = %id, error = %e, "Backend update failed, keeping local change");
                let mut state = self.lock();
                if state.epoch == epoch && state.find(&id).is_some() {
                    state.unsynced.insert(id);
                    self.write_cache(&state);
                }
                Ok(())
            }
            (WritePolicy::Strict, Ok(())) => {
                let mut state = self.lock();
                if state.epoch != epoch {
                    return Err(StoreError::OwnerChanged { kind: R::KIND });
                }
                state.unsynced.remove(&id);
                match state.find_mut(&id) {
                    Some(slot) => *slot = record,
                    None => debug!(id = %id, "Record deleted while the update was in flight"),
                }
                self.write_cache(&state);
                Ok(())
            }
            (WritePolicy::Strict, Err(e)) => {
                warn!(id = %id, error = %e, "Backend update failed, resyncing");
                self.resync(epoch).await;
                Err(StoreError::Backend {
                    kind: R::KIND,
                    source: e,
                })
            }
        }
    }

    /// Remove a record by ID.
    ///
    /// The record is removed locally first; deleting an ID that is not
    /// present does nothing. Records with a temporary ID never reach the
    /// backend. If the backend refuses, the list is reloaded from it.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if there is no owner
    /// - `Backend` if the backend delete fails under the strict policy
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn delete(&self, id: &ResourceId) -> Result<(), StoreError> {
        let epoch = {
            let mut state = self.lock();
            if state.owner.is_none() {
                return Err(StoreError::NotAuthenticated);
            }
            let before = state.records.len();
            state.records.retain(|r| r.id() != Some(id));
            if state.records.len() == before {
                debug!("Delete for unknown id ignored");
                return Ok(());
            }
            state.unsynced.remove(id);
            self.write_cache(&state);
            state.epoch
        };

        if id.is_temporary() {
            debug!("Deleted local-only record");
            return Ok(());
        }

        match self.backend.delete(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Backend delete failed, resyncing");
                self.resync(epoch).await;
                match self.policy {
                    WritePolicy::Optimistic => Ok(()),
                    WritePolicy::Strict => Err(StoreError::Backend {
                        kind: R::KIND,
                        source: e,
                    }),
                }
            }
        }
    }

    async fn resync(&self, epoch: u64) {
        if self.lock().epoch == epoch {
            self.load_from_backend().await;
        }
    }

    /// Push local-only and unsynced records to the backend.
    ///
    /// Local-only records are created and take the backend's ID; unsynced
    /// records are updated. Records that fail again stay pending. A record
    /// deleted while its create was in flight is deleted on the backend too.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if there is no owner
    /// - `OwnerChanged` if the owner changed while syncing
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn sync_pending(&self) -> Result<SyncReport, StoreError> {
        let (owner, epoch) = self.snapshot()?;
        let (local_only, unsynced): (Vec<R>, Vec<R>) = {
            let state = self.lock();
            let local_only = state.records.iter().filter(|r| is_local_only(*r)).cloned();
            let unsynced = state
                .records
                .iter()
                .filter(|r| r.id().is_some_and(|id| state.unsynced.contains(id)));
            (local_only.collect(), unsynced.cloned().collect())
        };

        let mut report = SyncReport::default();

        for record in local_only {
            let Some(temp_id) = record.id().cloned() else {
                continue;
            };
            match self.backend.create(&owner, &record).await {
                Ok(id) => {
                    let still_present = {
                        let mut state = self.lock();
                        if state.epoch != epoch {
                            return Err(StoreError::OwnerChanged { kind: R::KIND });
                        }
                        let found = match state.find_mut(&temp_id) {
                            Some(record) => {
                                record.set_id(id.clone());
                                true
                            }
                            None => false,
                        };
                        if found {
                            self.write_cache(&state);
                        }
                        found
                    };
                    if still_present {
                        debug!(temp = %temp_id, id = %id, "Local record synced");
                        report.synced += 1;
                        report.replaced.push((temp_id, id));
                    } else {
                        warn!(temp = %temp_id, id = %id, "Record deleted during sync, removing backend copy");
                        if let Err(e) = self.backend.delete(&id).await {
                            warn!(id = %id, error = %e, "Failed to remove backend copy");
                        }
                    }
                }
                Err(e) => {
                    warn!(temp = %temp_id, error = %e, "Local record still pending");
                    report.failed += 1;
                }
            }
        }

        for record in unsynced {
            let Some(id) = record.id().cloned() else {
                continue;
            };
            match self.backend.update(&record).await {
                Ok(()) => {
                    let mut state = self.lock();
                    if state.epoch != epoch {
                        return Err(StoreError::OwnerChanged { kind: R::KIND });
                    }
                    if state.unsynced.remove(&id) {
                        self.write_cache(&state);
                    }
                    report.synced += 1;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Change still pending");
                    report.failed += 1;
                }
            }
        }

        info!(synced = report.synced, failed = report.failed, "Sync finished");
        Ok(report)
    }

    /// Apply `edit` to every record in the list.
    ///
    /// Backend-known records for which `edit` returns `true` are marked
    /// unsynced so the change reaches the backend on the next sync. Returns
    /// the number of records changed.
    pub(crate) fn rewrite_local(&self, mut edit: impl FnMut(&mut R) -> bool) -> usize {
        let mut state = self.lock();
        let mut changed = Vec::new();
        for record in &mut state.records {
            if edit(record) {
                changed.push(record.id().cloned());
            }
        }
        if changed.is_empty() {
            return 0;
        }
        for id in changed.iter().flatten() {
            if !id.is_temporary() {
                state.unsynced.insert(id.clone());
            }
        }
        self.write_cache(&state);
        changed.len()
    }

    /// Snapshot of the current list, in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<R> {
        self.lock().records.clone()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &ResourceId) -> Option<R> {
        self.lock().find(id).cloned()
    }

    /// Sync status of a cached record, or `None` if it is not cached.
    #[must_use]
    pub fn sync_status(&self, id: &ResourceId) -> Option<SyncStatus> {
        let state = self.lock();
        state.find(id)?;
        Some(if id.is_temporary() {
            SyncStatus::LocalOnly
        } else if state.unsynced.contains(id) {
            SyncStatus::Unsynced
        } else {
            SyncStatus::Synced
        })
    }

    /// Number of records waiting for [`sync_pending`](Self::sync_pending).
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let state = self.lock();
        state.records.iter().filter(|r| is_local_only(*r)).count() + state.unsynced.len()
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        let state = self.lock();
        if state.loading {
            LoadPhase::Loading
        } else if state.loaded {
            LoadPhase::Loaded
        } else {
            LoadPhase::Uninitialized
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }
}

fn is_local_only<R: Resource>(record: &R) -> bool {
    record.id().is_some_and(ResourceId::is_temporary)
}

/// Key of the unsynced-ID list stored next to the cache under `key`.
fn unsynced_key(key: &str) -> String {
    format!("{key}_unsynced")
}

/// Keep the first record for each ID.
fn dedupe<R: Resource>(records: Vec<R>) -> Vec<R> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.id().is_none_or(|id| seen.insert(id.clone())))
        .collect()
}

/// A fresh temporary ID that does not collide with a cached record.
fn temporary_id<R: Resource>(state: &State<R>) -> ResourceId {
    let millis = Utc::now().timestamp_millis();
    let base = ResourceId::temporary(R::TEMP_PREFIX, millis);
    if state.find(&base).is_none() {
        return base;
    }
    let mut n = 1_u32;
    loop {
        let candidate = ResourceId::new(format!("{base}_{n}"));
        if state.find(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}
