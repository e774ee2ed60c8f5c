pub mod blocking;
pub mod error;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::SettingsConfig;
use crate::ensemble::{BoundedConnector, FailoverDriver, Served};
use crate::locator::{Endpoint, Locator};
use crate::session::SessionFactory;
use crate::settings::{ReadSettings, WriteSettings};
use error::SettingsError;

/// Settings decoded from the first endpoint that could serve them
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T = Value> {
    pub endpoint: Endpoint,
    pub settings: T,
}

/// Acknowledgment of a stored settings payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub endpoint: Endpoint,
    pub path: String,
    pub bytes: usize,
}

/// Async settings accessor
///
/// Each call parses its locator, then walks the endpoints in order with a
/// fresh session per attempt. Nothing is cached or shared between calls.
/// Clones share the session factory.
pub struct SettingsClient<F> {
    factory: Arc<F>,
    driver: FailoverDriver,
}

impl<F> Clone for SettingsClient<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            driver: self.driver,
        }
    }
}

impl<F: SessionFactory> SettingsClient<F> {
    /// Client with the default 1500 ms connect deadline
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            driver: FailoverDriver::default(),
        }
    }

    pub fn with_config(factory: F, config: &SettingsConfig) -> Self {
        Self::with_driver(
            factory,
            FailoverDriver::new(
                BoundedConnector::new(config.connect_timeout()),
                config.operation_timeout(),
            ),
        )
    }

    pub fn with_driver(factory: F, driver: FailoverDriver) -> Self {
        Self {
            factory: Arc::new(factory),
            driver,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn driver(&self) -> &FailoverDriver {
        &self.driver
    }

    /// Load the JSON settings a locator points at
    pub async fn load_from_locator(&self, locator: &str) -> Result<Loaded, SettingsError> {
        self.load(&Locator::parse(locator)?).await
    }

    /// Load and deserialize into `T`
    pub async fn load_typed_from_locator<T>(&self, locator: &str) -> Result<Loaded<T>, SettingsError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.load_typed(&Locator::parse(locator)?).await
    }

    /// Store settings at the locator's path, creating the path as needed
    pub async fn store_to_locator<T>(&self, locator: &str, settings: &T) -> Result<Stored, SettingsError>
    where
        T: Serialize + ?Sized,
    {
        let locator = Locator::parse(locator)?;
        self.store_encoded(&locator, WriteSettings::encode(settings)?).await
    }

    pub async fn load(&self, locator: &Locator) -> Result<Loaded, SettingsError> {
        self.load_typed(locator).await
    }

    pub async fn load_typed<T>(&self, locator: &Locator) -> Result<Loaded<T>, SettingsError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Served { endpoint, value } = self
            .driver
            .run(self.factory.as_ref(), locator, &ReadSettings::<T>::new())
            .await?;

        Ok(Loaded {
            endpoint,
            settings: value,
        })
    }

    pub async fn store<T>(&self, locator: &Locator, settings: &T) -> Result<Stored, SettingsError>
    where
        T: Serialize + ?Sized,
    {
        self.store_encoded(locator, WriteSettings::encode(settings)?).await
    }

    async fn store_encoded(&self, locator: &Locator, write: WriteSettings) -> Result<Stored, SettingsError> {
        let Served { endpoint, value } = self
            .driver
            .run(self.factory.as_ref(), locator, &write)
            .await?;

        Ok(Stored {
            endpoint,
            path: locator.path().to_string(),
            bytes: value,
        })
    }
}
