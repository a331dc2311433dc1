use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use notebook_review_lib::config::{BackendMode, Config};
use notebook_review_lib::local::LocalStore;
use notebook_review_lib::remote::{
    ApiClient, CachingSource, ReviewLogSource, ReviewOutcomeGateway, ReviewStateCache,
    SnapshotSource,
};
use notebook_review_lib::review::{
    FileStore, ItemType, NotebookCounts, SessionKey, SessionProgressStore, Snapshot,
};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub source: Arc<dyn SnapshotSource>,
    pub gateway: Arc<dyn ReviewOutcomeGateway>,
    pub logs: Arc<dyn ReviewLogSource>,
    pub cache: Arc<ReviewStateCache>,
    pub progress: Arc<SessionProgressStore>,
    /// Present only in local mode
    pub local: Option<Arc<LocalStore>>,
}

impl App {
    /// Load config and wire up the configured backend
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path().context("Failed to get config directory")?,
        };
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        let data_dir = config
            .data_dir()
            .context("Failed to get data directory")?;
        let progress = Arc::new(SessionProgressStore::new(Box::new(
            FileStore::new(data_dir.join("progress"))
                .context("Failed to initialize progress storage")?,
        )));
        let cache = Arc::new(ReviewStateCache::new());

        let app = match config.backend.mode {
            BackendMode::Local => {
                let store = Arc::new(LocalStore::new(data_dir.join("local")));
                store.init().context("Failed to initialize local storage")?;
                let caching = Arc::new(CachingSource::new(
                    Arc::clone(&store),
                    Arc::clone(&cache),
                    config.user_id.clone(),
                ));
                Self {
                    source: caching.clone(),
                    gateway: caching,
                    logs: store.clone(),
                    cache,
                    progress,
                    local: Some(store),
                    config,
                }
            }
            BackendMode::Remote => {
                let token = config.backend.token();
                if token.is_none() {
                    log::warn!(
                        "No API token in ${}, requests will be anonymous",
                        config.backend.token_env
                    );
                }
                let client = Arc::new(
                    ApiClient::new(
                        config.backend.api_base.clone(),
                        token,
                        config.backend.timeout_secs,
                    )
                    .context("Failed to create API client")?,
                );
                let caching = Arc::new(CachingSource::new(
                    Arc::clone(&client),
                    Arc::clone(&cache),
                    config.user_id.clone(),
                ));
                Self {
                    source: caching.clone(),
                    gateway: caching,
                    logs: client,
                    cache,
                    progress,
                    local: None,
                    config,
                }
            }
        };

        Ok(app)
    }

    /// All notebooks with their counts
    pub async fn list_notebooks(&self) -> Result<Vec<NotebookCounts>> {
        self.source
            .notebooks()
            .await
            .context("Failed to load notebooks")
    }

    /// Find a notebook by id or name (case-insensitive prefix match)
    pub async fn find_notebook(&self, name: &str) -> Result<NotebookCounts> {
        let notebooks = self.list_notebooks().await?;
        resolve_notebook(notebooks, name)
    }

    /// Fetch one notebook's items and states in a single read
    pub async fn snapshot(&self, notebook_id: &str, item_type: ItemType) -> Result<Snapshot> {
        self.source
            .notebook_snapshot(notebook_id, item_type)
            .await
            .with_context(|| format!("Failed to load {} items of notebook {}", item_type, notebook_id))
    }

    pub fn session_key(&self, notebook_id: &str, item_type: ItemType) -> SessionKey {
        SessionKey::new(self.config.user_id.clone(), notebook_id, item_type)
    }

    pub fn cap_for(&self, item_type: ItemType) -> usize {
        self.config.session.for_type(item_type)
    }

    pub fn local_store(&self) -> Result<&Arc<LocalStore>> {
        match &self.local {
            Some(store) => Ok(store),
            None => bail!("This command only works with the local backend (backend.mode = \"local\")"),
        }
    }
}

fn resolve_notebook(notebooks: Vec<NotebookCounts>, name: &str) -> Result<NotebookCounts> {
    if let Some(nb) = notebooks.iter().find(|n| n.id == name) {
        return Ok(nb.clone());
    }

    let name_lower = name.to_lowercase();

    // Exact match first
    if let Some(nb) = notebooks.iter().find(|n| n.name.to_lowercase() == name_lower) {
        return Ok(nb.clone());
    }

    // Prefix match
    let matches: Vec<&NotebookCounts> = notebooks
        .iter()
        .filter(|n| n.name.to_lowercase().starts_with(&name_lower))
        .collect();

    match matches.len() {
        0 => bail!(
            "No notebook matching '{}'. Available notebooks:\n{}",
            name,
            notebooks
                .iter()
                .map(|n| format!("  - {}", n.name))
                .collect::<Vec<_>>()
                .join("\n")
        ),
        1 => Ok(matches[0].clone()),
        _ => bail!(
            "Ambiguous notebook name '{}'. Matches:\n{}",
            name,
            matches
                .iter()
                .map(|n| format!("  - {}", n.name))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}
