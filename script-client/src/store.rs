//! Canonical in-memory script collection.
//!
//! All backend mutations go through [`ScriptStore`]; it reconciles the local
//! collection afterwards and posts every outcome to its [`NoticeBoard`].
//!
//! Reconciliation policy per operation:
//! - `add`: pessimistic. Create, then refresh the whole list.
//! - `edit`: pessimistic. Replace the local record with the server response.
//! - `remove`: optimistic. Drop locally first, restore on failure.
//!
//! The state lock is a plain `std::sync::RwLock` and is never held across an
//! `.await`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use shared_types::{ImportedFields, NewScript, Script, ScriptId, ScriptPatch};

use crate::api::ScriptApi;
use crate::config::ClientConfig;
use crate::error::{ErrorKind, ScriptError};
use crate::filter::filter;
use crate::notify::NoticeBoard;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub page_size: u32,
    pub notice_ttl: Duration,
    pub notice_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for StoreOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            notice_ttl: config.notice_ttl,
            notice_limit: config.notice_limit,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    scripts: Vec<Script>,
    last_error: Option<ScriptError>,
    /// Ids removed locally whose delete call has not settled yet. A refresh
    /// landing in between must not bring them back.
    pending_deletes: HashSet<ScriptId>,
}

pub struct ScriptStore {
    api: Arc<dyn ScriptApi>,
    page_size: u32,
    state: RwLock<StoreState>,
    /// Bumped by every refresh start and every local mutation. A refresh
    /// applies its result only if the value is still the one it took.
    generation: AtomicU64,
    in_flight: AtomicUsize,
    notices: NoticeBoard,
}

/// Keeps `loading()` true for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptStore {
    pub fn new(api: Arc<dyn ScriptApi>, options: StoreOptions) -> Self {
        Self {
            api,
            page_size: options.page_size.max(1),
            state: RwLock::new(StoreState::default()),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            notices: NoticeBoard::new(options.notice_ttl, options.notice_limit),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Snapshot of the collection in backend order.
    pub fn scripts(&self) -> Vec<Script> {
        self.read().scripts.clone()
    }

    pub fn script(&self, id: ScriptId) -> Option<Script> {
        self.read().scripts.iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().scripts.is_empty()
    }

    /// The collection as narrowed by a search query.
    pub fn visible(&self, query: &str) -> Vec<Script> {
        let state = self.read();
        filter(query, &state.scripts).into_iter().cloned().collect()
    }

    pub fn loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn last_error(&self) -> Option<ScriptError> {
        self.read().last_error.clone()
    }

    pub fn last_error_kind(&self) -> Option<ErrorKind> {
        self.read().last_error.as_ref().map(ScriptError::kind)
    }

    pub fn clear_error(&self) {
        self.write().last_error = None;
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Replace the collection with the backend's full list.
    ///
    /// On failure the collection is left as it was. A result that arrives
    /// after a newer refresh (or a local mutation) started is discarded.
    pub async fn refresh(&self) -> Result<(), ScriptError> {
        let _busy = InFlight::enter(&self.in_flight);
        match self.reload().await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.report("refresh", e)),
        }
    }

    /// Create a script, then refresh.
    pub async fn add(&self, fields: NewScript) -> Result<Script, ScriptError> {
        let _busy = InFlight::enter(&self.in_flight);
        if let Err(e) = fields.validate() {
            return Err(self.report("add", e.into()));
        }

        let created = match self.api.create(&fields).await {
            Ok(created) => created,
            Err(e) => return Err(self.report("add", e)),
        };
        tracing::info!(id = %created.id, title = %created.title, "Script created");

        match self.reload().await {
            Ok(true) => {}
            Ok(false) => self.merge(created.clone()),
            Err(e) => {
                // The create went through; keep what the backend returned.
                self.merge(created.clone());
                self.report("refresh", e);
            }
        }
        self.notices.success(format!("Added \"{}\"", created.title));
        Ok(created)
    }

    /// Partially update a script. Fields absent from `patch` are untouched.
    pub async fn edit(&self, id: ScriptId, patch: ScriptPatch) -> Result<Script, ScriptError> {
        let _busy = InFlight::enter(&self.in_flight);
        if let Err(e) = patch.validate() {
            return Err(self.report("edit", e.into()));
        }

        let updated = match self.api.update(id, &patch).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.report("edit", e)),
        };
        tracing::info!(id = %id, "Script updated");

        {
            let mut state = self.write();
            match state.scripts.iter().position(|s| s.id == id) {
                Some(index) => state.scripts[index] = updated.clone(),
                None => state.scripts.push(updated.clone()),
            }
            state.last_error = None;
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.notices.success(format!("Saved \"{}\"", updated.title));
        Ok(updated)
    }

    /// Delete a script, dropping it locally before the backend confirms.
    ///
    /// If the backend call fails the record is put back where it was, except
    /// on `NotFound`: the backend no longer has it either.
    pub async fn remove(&self, id: ScriptId) -> Result<(), ScriptError> {
        let _busy = InFlight::enter(&self.in_flight);
        let removed = {
            let mut state = self.write();
            let index = state.scripts.iter().position(|s| s.id == id);
            let removed = index.map(|index| (index, state.scripts.remove(index)));
            state.pending_deletes.insert(id);
            self.generation.fetch_add(1, Ordering::SeqCst);
            removed
        };

        match self.api.delete(id).await {
            Ok(()) => {
                tracing::info!(id = %id, "Script deleted");
                self.settle_delete(id, None);
                self.write().last_error = None;
                let label = removed
                    .map(|(_, script)| format!("Deleted \"{}\"", script.title))
                    .unwrap_or_else(|| format!("Deleted script {id}"));
                self.notices.success(label);
                Ok(())
            }
            Err(e @ ScriptError::NotFound(_)) => {
                self.settle_delete(id, None);
                Err(self.report("remove", e))
            }
            Err(e) => {
                self.settle_delete(id, removed);
                Err(self.report("remove", e))
            }
        }
    }

    /// Fetch form fields scraped from a song page.
    pub async fn import_from_url(&self, url: &str) -> Result<ImportedFields, ScriptError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(self.report("import", ScriptError::Import("URL is required".to_string())));
        }

        let _busy = InFlight::enter(&self.in_flight);
        match self.api.import_from_url(url).await {
            Ok(fields) => {
                tracing::info!(url = %url, "Imported fields from URL");
                self.write().last_error = None;
                self.notices.info("Imported fields from URL");
                Ok(fields)
            }
            Err(e) => Err(self.report("import", e.into_import())),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Record a failure as user-visible state and hand it back.
    pub(crate) fn report(&self, operation: &str, error: ScriptError) -> ScriptError {
        tracing::warn!(operation, kind = ?error.kind(), error = %error, "Script operation failed");
        self.write().last_error = Some(error.clone());
        self.notices.error(error.to_string());
        error
    }

    /// Fetch every page and swap the collection in. `Ok(false)` means the
    /// result was stale and dropped.
    async fn reload(&self) -> Result<bool, ScriptError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.fetch_all().await;

        let mut state = self.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding stale refresh result");
            // A failed fetch still belongs to its caller.
            return fetched.map(|_| false);
        }
        let mut scripts = fetched?;
        scripts.retain(|s| !state.pending_deletes.contains(&s.id));
        tracing::debug!(count = scripts.len(), "Script list refreshed");
        state.scripts = scripts;
        state.last_error = None;
        Ok(true)
    }

    async fn fetch_all(&self) -> Result<Vec<Script>, ScriptError> {
        let mut scripts = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0u32;
        // The backend may cap `limit` below our page size, so only an empty
        // page ends the walk.
        loop {
            let page = self.api.list(offset, self.page_size).await?;
            if page.is_empty() {
                return Ok(scripts);
            }
            let step = u32::try_from(page.len()).unwrap_or(u32::MAX);
            let before = scripts.len();
            // Rows can shift between pages if the backend changes mid-walk.
            scripts.extend(page.into_iter().filter(|s| seen.insert(s.id)));
            if scripts.len() == before {
                tracing::warn!(offset, "List page repeated earlier rows; stopping");
                return Ok(scripts);
            }
            offset = offset.saturating_add(step);
        }
    }

    fn merge(&self, script: Script) {
        let mut state = self.write();
        if !state.scripts.iter().any(|s| s.id == script.id) {
            state.scripts.push(script);
        }
    }

    /// Close out a delete. `restore` carries the record to put back when the
    /// backend refused it; otherwise the id is dropped for good.
    fn settle_delete(&self, id: ScriptId, restore: Option<(usize, Script)>) {
        let mut state = self.write();
        state.pending_deletes.remove(&id);
        match restore {
            Some((index, script)) => {
                if !state.scripts.iter().any(|s| s.id == script.id) {
                    tracing::debug!(id = %id, index, "Restoring script after failed delete");
                    let index = index.min(state.scripts.len());
                    state.scripts.insert(index, script);
                }
            }
            None => state.scripts.retain(|s| s.id != id),
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
