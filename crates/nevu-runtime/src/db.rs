use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use nevu_core::config::StoredFeatureFlags;
use nevu_core::error::NevuError;
use nevu_core::storage::{ClientIdentity, LocalStorage, SessionStorage};

/// Cloneable handle to the storage actor.
///
/// The SQLite connection is not `Sync`, so it lives on a dedicated thread and
/// every access is a message with a oneshot reply.
#[derive(Clone)]
pub struct StorageHandle {
    tx: mpsc::UnboundedSender<StorageCommand>,
}

enum StorageCommand {
    Get {
        key: String,
        reply: oneshot::Sender<Result<Option<String>, NevuError>>,
    },
    Set {
        key: String,
        value: String,
        reply: oneshot::Sender<Result<(), NevuError>>,
    },
    Remove {
        key: String,
        reply: oneshot::Sender<Result<(), NevuError>>,
    },
    FeatureFlags {
        reply: oneshot::Sender<Result<StoredFeatureFlags, NevuError>>,
    },
    EnsureIdentity {
        reply: oneshot::Sender<Result<ClientIdentity, NevuError>>,
    },
    SessionGet {
        key: String,
        reply: oneshot::Sender<Option<String>>,
    },
}

impl StorageHandle {
    pub fn open(path: &Path) -> Option<Self> {
        let storage = LocalStorage::open(path)
            .map_err(|e| tracing::error!("Failed to open local storage: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    /// In-memory storage that is discarded with the handle.
    pub fn open_memory() -> Option<Self> {
        let storage = LocalStorage::open_memory()
            .map_err(|e| tracing::error!("Failed to open in-memory storage: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    fn spawn(storage: LocalStorage) -> Option<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("storage-actor".into())
            .spawn(move || actor_loop(storage, rx))
            .map_err(|e| tracing::error!("Failed to spawn storage thread: {e}"))
            .ok()?;
        Some(Self { tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, NevuError>>) -> StorageCommand,
    ) -> Result<T, NevuError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(make(reply));
        rx.await
            .unwrap_or_else(|_| Err(NevuError::Config("storage actor closed".into())))
    }

    pub async fn get(&self, key: impl Into<String>) -> Result<Option<String>, NevuError> {
        let key = key.into();
        self.request(|reply| StorageCommand::Get { key, reply }).await
    }

    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), NevuError> {
        let (key, value) = (key.into(), value.into());
        self.request(|reply| StorageCommand::Set { key, value, reply })
            .await
    }

    pub async fn remove(&self, key: impl Into<String>) -> Result<(), NevuError> {
        let key = key.into();
        self.request(|reply| StorageCommand::Remove { key, reply })
            .await
    }

    pub async fn feature_flags(&self) -> Result<StoredFeatureFlags, NevuError> {
        self.request(|reply| StorageCommand::FeatureFlags { reply })
            .await
    }

    /// Client id (persisted) and a fresh session id for this process.
    pub async fn ensure_identity(&self) -> Result<ClientIdentity, NevuError> {
        self.request(|reply| StorageCommand::EnsureIdentity { reply })
            .await
    }

    /// Read from the per-process session scope.
    pub async fn session_get(&self, key: impl Into<String>) -> Option<String> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StorageCommand::SessionGet {
            key: key.into(),
            reply,
        });
        rx.await.ok().flatten()
    }
}

fn actor_loop(storage: LocalStorage, mut rx: mpsc::UnboundedReceiver<StorageCommand>) {
    if let Err(e) = storage.ensure_defaults() {
        tracing::warn!("Failed to write storage defaults: {e}");
    }
    let mut session = SessionStorage::new();

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            StorageCommand::Get { key, reply } => {
                let _ = reply.send(storage.get(&key));
            }
            StorageCommand::Set { key, value, reply } => {
                let _ = reply.send(storage.set(&key, &value));
            }
            StorageCommand::Remove { key, reply } => {
                let _ = reply.send(storage.remove(&key));
            }
            StorageCommand::FeatureFlags { reply } => {
                let _ = reply.send(storage.feature_flags());
            }
            StorageCommand::EnsureIdentity { reply } => {
                let _ = reply.send(ClientIdentity::ensure(&storage, &mut session));
            }
            StorageCommand::SessionGet { key, reply } => {
                let _ = reply.send(session.get(&key).map(str::to_string));
            }
        }
    }
    tracing::debug!("storage actor stopped");
}
