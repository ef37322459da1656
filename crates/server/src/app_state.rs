use std::sync::Arc;

use anyhow::Context;
use shared::domain::IsolationId;
use storage::{MemoryStore, SessionStore, Storage};
use tracing::{error, info};
use wizard::{load_manifest, StepSet, WizardController};

use crate::{
    config::{prepare_database_url, Settings},
    signup::{default_steps, SignupWizard},
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) wizard: Arc<WizardController>,
    pub(crate) store: Arc<dyn SessionStore>,
    /// Present when sessions live in SQLite; used by the health check.
    pub(crate) storage: Option<Storage>,
    pub(crate) session_cookie: String,
}

impl AppState {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let steps = match &settings.manifest_path {
            Some(path) => load_manifest(path)?,
            None => StepSet::new(default_steps()).context("built-in signup steps are invalid")?,
        };
        info!(steps = steps.len(), "wizard steps loaded");

        let mut wizard = WizardController::from_step_set(steps, Arc::new(SignupWizard));
        if let Some(key) = &settings.isolation_key {
            wizard = wizard.with_isolation_id(IsolationId::new(key.clone()));
        }

        let (store, storage): (Arc<dyn SessionStore>, Option<Storage>) =
            if settings.uses_memory_store() {
                (Arc::new(MemoryStore::new()), None)
            } else {
                let database_url = prepare_database_url(&settings.database_url)?;
                let storage = Storage::new(&database_url).await.map_err(|error| {
                    error!(
                        %database_url,
                        %error,
                        "failed to open SQLite session database; verify parent directory exists and permissions are correct"
                    );
                    error
                })?;
                (Arc::new(storage.clone()), Some(storage))
            };

        Ok(Self::new(wizard, store, storage, settings.session_cookie.clone()))
    }

    pub(crate) fn new(
        wizard: WizardController,
        store: Arc<dyn SessionStore>,
        storage: Option<Storage>,
        session_cookie: String,
    ) -> Self {
        Self {
            wizard: Arc::new(wizard),
            store,
            storage,
            session_cookie,
        }
    }
}
