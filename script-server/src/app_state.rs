use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use shared_types::{NewScript, Script, ScriptId, ScriptPatch, ValidationError};
use tokio::sync::RwLock;

use crate::import::UrlImporter;

#[derive(Debug, thiserror::Error)]
pub enum ScriptTableError {
    #[error("Script not found")]
    NotFound(ScriptId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    scripts: RwLock<ScriptTable>,
    importer: Arc<dyn UrlImporter>,
}

/// In-memory script table. Ids start at 1 and are never reused.
#[derive(Default)]
struct ScriptTable {
    rows: BTreeMap<ScriptId, Script>,
    last_id: i64,
}

impl ScriptTable {
    fn allocate_id(&mut self) -> ScriptId {
        self.last_id += 1;
        ScriptId(self.last_id)
    }
}

impl AppState {
    pub fn new(importer: Arc<dyn UrlImporter>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                scripts: RwLock::new(ScriptTable::default()),
                importer,
            }),
        }
    }

    pub fn importer(&self) -> Arc<dyn UrlImporter> {
        self.inner.importer.clone()
    }

    /// One page of scripts ordered by id.
    pub async fn list_scripts(&self, offset: u32, limit: u32) -> Vec<Script> {
        let table = self.inner.scripts.read().await;
        table
            .rows
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect()
    }

    pub async fn get_script(&self, id: ScriptId) -> Result<Script, ScriptTableError> {
        let table = self.inner.scripts.read().await;
        table
            .rows
            .get(&id)
            .cloned()
            .ok_or(ScriptTableError::NotFound(id))
    }

    pub async fn create_script(&self, new: NewScript) -> Result<Script, ScriptTableError> {
        new.validate()?;
        let mut table = self.inner.scripts.write().await;
        let id = table.allocate_id();
        let script = new.into_script(id, Utc::now());
        table.rows.insert(id, script.clone());
        tracing::debug!(id = %id, title = %script.title, "Script created");
        Ok(script)
    }

    pub async fn update_script(
        &self,
        id: ScriptId,
        patch: &ScriptPatch,
    ) -> Result<Script, ScriptTableError> {
        patch.validate()?;
        let mut table = self.inner.scripts.write().await;
        let script = table
            .rows
            .get_mut(&id)
            .ok_or(ScriptTableError::NotFound(id))?;
        script.apply(patch);
        tracing::debug!(id = %id, "Script updated");
        Ok(script.clone())
    }

    pub async fn delete_script(&self, id: ScriptId) -> Result<(), ScriptTableError> {
        let mut table = self.inner.scripts.write().await;
        if table.rows.remove(&id).is_none() {
            return Err(ScriptTableError::NotFound(id));
        }
        tracing::debug!(id = %id, "Script deleted");
        Ok(())
    }

    pub async fn script_count(&self) -> usize {
        self.inner.scripts.read().await.rows.len()
    }
}
