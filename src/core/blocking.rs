//! Blocking facade over [`SettingsClient`]
//!
//! Each call spawns the async pipeline on a runtime owned by the facade and
//! parks the calling thread on a `std::sync::mpsc` channel of capacity one.
//! The spawned task sends exactly once, whatever the result, so an empty but
//! valid payload (`{}`) resolves the wait like any other value.
//!
//! Any thread outside the facade's own runtime may call it: plain threads,
//! `spawn_blocking` threads, and threads of other runtimes. Threads of the
//! facade's own runtime are refused with
//! [`SettingsError::BlockingOnOwnRuntime`], since parking its single worker
//! would stall the pipeline being waited on.
//!
//! The wait has no timeout of its own. The pipeline bounds it at
//! `endpoints × (connect timeout + operation timeout)`.

use serde::Serialize;
use serde_json::Value;
use std::cell::Cell;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use tokio::runtime::{Builder, Runtime};
use tracing::error;

use super::error::SettingsError;
use super::{Loaded, SettingsClient, Stored};
use crate::locator::Locator;
use crate::session::SessionFactory;
use crate::settings::WriteSettings;

static NEXT_RUNTIME_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    // Id of the facade runtime that started this thread, 0 elsewhere
    static OWNING_RUNTIME: Cell<usize> = const { Cell::new(0) };
}

pub struct BlockingSettingsClient<F> {
    client: SettingsClient<F>,
    runtime: Runtime,
    runtime_id: usize,
}

impl<F: SessionFactory> BlockingSettingsClient<F> {
    /// Wrap `client`, starting a single-worker runtime to drive it
    pub fn new(client: SettingsClient<F>) -> std::io::Result<Self> {
        let runtime_id = NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("zk-settings")
            .on_thread_start(move || OWNING_RUNTIME.with(|id| id.set(runtime_id)))
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            runtime_id,
        })
    }

    pub fn client(&self) -> &SettingsClient<F> {
        &self.client
    }

    /// Load settings, logging and returning `None` on any failure
    pub fn load_from_locator_blocking(&self, locator: &str) -> Option<Value> {
        match self.try_load_blocking(locator) {
            Ok(loaded) => Some(loaded.settings),
            Err(err) => {
                error!(locator = %locator, error = %err, "Zookeeper client error");
                None
            }
        }
    }

    /// Store settings, logging and returning `None` on any failure
    pub fn store_to_locator_blocking<T>(&self, locator: &str, settings: &T) -> Option<Stored>
    where
        T: Serialize + ?Sized,
    {
        match self.try_store_blocking(locator, settings) {
            Ok(stored) => Some(stored),
            Err(err) => {
                error!(locator = %locator, error = %err, "Zookeeper client error");
                None
            }
        }
    }

    /// Load settings, returning the error instead of logging it
    pub fn try_load_blocking(&self, locator: &str) -> Result<Loaded, SettingsError> {
        let locator = Locator::parse(locator)?;
        let client = self.client.clone();
        self.wait_for(async move { client.load(&locator).await })
    }

    /// Store settings, returning the error instead of logging it
    pub fn try_store_blocking<T>(&self, locator: &str, settings: &T) -> Result<Stored, SettingsError>
    where
        T: Serialize + ?Sized,
    {
        let locator = Locator::parse(locator)?;
        let write = WriteSettings::encode(settings)?;
        let client = self.client.clone();
        self.wait_for(async move { client.store_encoded(&locator, write).await })
    }

    fn wait_for<T, Fut>(&self, operation: Fut) -> Result<T, SettingsError>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, SettingsError>> + Send + 'static,
    {
        if OWNING_RUNTIME.with(Cell::get) == self.runtime_id {
            return Err(SettingsError::BlockingOnOwnRuntime);
        }

        let (done, completion) = mpsc::sync_channel(1);
        self.runtime.spawn(async move {
            let _ = done.send(operation.await);
        });

        completion.recv().unwrap_or(Err(SettingsError::Interrupted))
    }
}
