use std::sync::Arc;

use crate::completion::{Completion, OpenAiCompletion, UnconfiguredCompletion};
use crate::config::{Config, StoreKind};
use crate::store::{DisconnectedStore, MemoryStore, MySqlStore, Store};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub completion: Arc<dyn Completion>,
}

impl AppContext {
    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        completion: Arc<dyn Completion>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            completion,
        }
    }
}

impl bb_app::ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        let store = open_store(&config).await;
        let completion = open_completion(&config);

        Self::with_parts(config, store, completion)
    }
}

/// Connection problems are logged and leave the server running with a store
/// that fails every call.
async fn open_store(config: &Config) -> Arc<dyn Store> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store, data will not persist");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Mysql => {
            let store = match MySqlStore::connect(
                config.database_url.expose_secret(),
                config.database_max_connections,
                config.database_connect_timeout(),
            )
            .await
            {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("Error connecting to MySQL: {e}");
                    return Arc::new(DisconnectedStore);
                }
            };

            if config.run_migrations {
                if let Err(e) = store.run_migrations().await {
                    tracing::error!("failed to run migrations: {e}");
                }
            }

            Arc::new(store)
        }
    }
}

fn open_completion(config: &Config) -> Arc<dyn Completion> {
    match &config.openai_api_key {
        Some(api_key) => Arc::new(OpenAiCompletion::new(
            api_key.expose_secret().clone(),
            config.openai_model.clone(),
            config.openai_instructions.clone(),
        )),
        None => {
            tracing::warn!(
                "OPENAI_API_KEY not set, /generate will respond with errors"
            );
            Arc::new(UnconfiguredCompletion)
        }
    }
}
