//! zk-settings - JSON settings stored in a ZooKeeper ensemble
//!
//! A locator such as `zk://10.20.30.10:2181,10.20.30.11:2181/testdemo` names
//! the ensemble members in priority order and the node holding the settings.
//! Every load or store walks those members one at a time: connect within a
//! fixed deadline, run the read or write, close the session, and stop at the
//! first success. When every member fails, the last member's error is
//! reported.
//!
//! ```rust,no_run
//! use zk_settings::{BlockingSettingsClient, SettingsClient};
//! use zk_settings::session::{Member, MemoryEnsemble, MemoryStore};
//!
//! # fn example() -> std::io::Result<()> {
//! let store = MemoryStore::new();
//! let ensemble = MemoryEnsemble::new().with_member("10.20.30.10:2181", Member::up(store));
//! let client = BlockingSettingsClient::new(SettingsClient::new(ensemble))?;
//!
//! let settings = client.load_from_locator_blocking("zk://10.20.30.10:2181/testdemo");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod ensemble;
pub mod locator;
pub mod session;
pub mod settings;

pub use crate::core::blocking::BlockingSettingsClient;
pub use crate::core::error::{ErrorKind, SettingsError};
pub use crate::core::{Loaded, SettingsClient, Stored};
pub use config::SettingsConfig;
pub use locator::{Endpoint, Locator};
