//! Connection and failover across the members of an ensemble
//!
//! - [`connector`]: one session to one endpoint, bounded by a deadline
//! - [`failover`]: ordered walk over endpoints, first success wins

pub mod connector;
pub mod failover;

pub use connector::{BoundedConnector, DEFAULT_CONNECT_TIMEOUT};
pub use failover::{FailoverDriver, Operation, Served, DEFAULT_OPERATION_TIMEOUT};
