//! In-memory [`ScriptApi`] with call recording and failure injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{ImportedFields, NewScript, Script, ScriptId, ScriptPatch};
use tokio::sync::oneshot;

use crate::api::ScriptApi;
use crate::error::ScriptError;

pub(crate) enum Call {
    List { offset: u32, limit: u32 },
    Get(ScriptId),
    Create(NewScript),
    Update(ScriptId, ScriptPatch),
    Delete(ScriptId),
    Import(String),
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Get(_) => "get",
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
            Self::Import(_) => "import",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::List { offset, limit } => format!("list offset={offset} limit={limit}"),
            Self::Get(id) => format!("get {id}"),
            Self::Create(script) => format!("create {:?}", script.title),
            Self::Update(id, patch) => format!("update {id} {patch:?}"),
            Self::Delete(id) => format!("delete {id}"),
            Self::Import(url) => format!("import {url}"),
        }
    }
}

struct Hold {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct FakeState {
    scripts: BTreeMap<ScriptId, Script>,
    next_id: i64,
    calls: Vec<Call>,
    failures: HashMap<&'static str, ScriptError>,
    list_failures: HashMap<u32, ScriptError>,
    limit_cap: Option<u32>,
    holds: HashMap<&'static str, Hold>,
    import: Option<Result<ImportedFields, ScriptError>>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_titles(titles: &[&str]) -> Arc<Self> {
        let api = Self::new();
        for title in titles {
            api.insert(title);
        }
        api
    }

    /// Add a record on the "server" without going through the API.
    pub fn insert(&self, title: &str) -> ScriptId {
        self.insert_script(NewScript::new(title, format!("lyrics of {title}")))
    }

    pub fn insert_script(&self, script: NewScript) -> ScriptId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = ScriptId(state.next_id);
        state.scripts.insert(id, script.into_script(id, Utc::now()));
        id
    }

    pub fn remove_behind_the_scenes(&self, id: ScriptId) {
        self.lock().scripts.remove(&id);
    }

    /// The next call of `op` fails with `error`.
    pub fn fail_next(&self, op: &'static str, error: ScriptError) {
        self.lock().failures.insert(op, error);
    }

    /// The next list call at `offset` fails with `error`.
    pub fn fail_next_list_at(&self, offset: u32, error: ScriptError) {
        self.lock().list_failures.insert(offset, error);
    }

    /// Serve at most `cap` rows per list call, whatever the caller asks for.
    pub fn cap_limit(&self, cap: u32) {
        self.lock().limit_cap = Some(cap);
    }

    pub fn set_import(&self, result: Result<ImportedFields, ScriptError>) {
        self.lock().import = Some(result);
    }

    /// Park the next call of `op`. The first receiver fires once the call is
    /// parked; sending on the returned sender lets it continue. A list call
    /// parks after taking its snapshot, a delete before touching the table.
    pub fn hold_next(&self, op: &'static str) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.lock().holds.insert(
            op,
            Hold {
                started: started_tx,
                release: release_rx,
            },
        );
        (started_rx, release_tx)
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().map(Call::describe).collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::List { offset, limit } => Some((*offset, *limit)),
                _ => None,
            })
            .collect()
    }

    pub fn last_update(&self) -> Option<(ScriptId, ScriptPatch)> {
        self.lock().calls.iter().rev().find_map(|c| match c {
            Call::Update(id, patch) => Some((*id, patch.clone())),
            _ => None,
        })
    }

    pub fn stored(&self, id: ScriptId) -> Option<Script> {
        self.lock().scripts.get(&id).cloned()
    }

    /// Record the call and pop any failure queued for it.
    fn begin(&self, call: Call) -> Result<MutexGuard<'_, FakeState>, ScriptError> {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        match state.failures.remove(op) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    async fn pause(&self, op: &'static str) {
        let hold = self.lock().holds.remove(op);
        if let Some(hold) = hold {
            let _ = hold.started.send(());
            let _ = hold.release.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl ScriptApi for FakeApi {
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Script>, ScriptError> {
        let result = self.begin(Call::List { offset, limit }).map(|mut state| {
            if let Some(error) = state.list_failures.remove(&offset) {
                return Err(error);
            }
            let limit = state.limit_cap.map_or(limit, |cap| cap.min(limit));
            Ok(state
                .scripts
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect::<Vec<_>>())
        });
        self.pause("list").await;
        result?
    }

    async fn get(&self, id: ScriptId) -> Result<Script, ScriptError> {
        let state = self.begin(Call::Get(id))?;
        state
            .scripts
            .get(&id)
            .cloned()
            .ok_or(ScriptError::NotFound(id))
    }

    async fn create(&self, script: &NewScript) -> Result<Script, ScriptError> {
        let state = self.begin(Call::Create(script.clone()))?;
        drop(state);
        let id = self.insert_script(script.clone());
        self.stored(id).ok_or(ScriptError::NotFound(id))
    }

    async fn update(&self, id: ScriptId, patch: &ScriptPatch) -> Result<Script, ScriptError> {
        let mut state = self.begin(Call::Update(id, patch.clone()))?;
        let script = state
            .scripts
            .get_mut(&id)
            .ok_or(ScriptError::NotFound(id))?;
        script.apply(patch);
        Ok(script.clone())
    }

    async fn delete(&self, id: ScriptId) -> Result<(), ScriptError> {
        self.pause("delete").await;
        let mut state = self.begin(Call::Delete(id))?;
        state
            .scripts
            .remove(&id)
            .map(|_| ())
            .ok_or(ScriptError::NotFound(id))
    }

    async fn import_from_url(&self, url: &str) -> Result<ImportedFields, ScriptError> {
        let state = self.begin(Call::Import(url.to_string()))?;
        state
            .import
            .clone()
            .unwrap_or_else(|| Err(ScriptError::Import("no import configured".to_string())))
    }
}
