//! Script manager client
//!
//! Client-side data layer for the script backend: a REST client, the
//! canonical in-memory store, local search, and the create/edit session
//! that stages form input.
//!
//! ```no_run
//! use std::sync::Arc;
//! use script_client::{ClientConfig, HttpScriptApi, ScriptStore, StoreOptions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let api = HttpScriptApi::new(&config)?;
//! let store = ScriptStore::new(Arc::new(api), StoreOptions::from(&config));
//! store.refresh().await?;
//! for script in store.visible("jazz") {
//!     println!("{} {}", script.id, script.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod notify;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{HttpScriptApi, ScriptApi};
pub use config::ClientConfig;
pub use error::{ErrorKind, ScriptError};
pub use filter::filter;
pub use notify::{Notice, NoticeBoard, NoticeLevel};
pub use session::{Draft, EditSession, SessionMode, SubmitOutcome};
pub use store::{ScriptStore, StoreOptions};
