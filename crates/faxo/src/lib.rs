pub mod analysis;
pub mod broadcast;
pub mod config;
pub mod countries;
pub mod db;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod notification;
pub mod service;
pub mod storage;

pub use broadcast::{FaxEvent, FaxEventBroadcaster};
pub use config::{load_config, DeliveryConfig};
pub use db::Database;
pub use error::{ConfigError, FaxoError, Result, TransmissionError};
pub use identity::{IdentityProvider, StaticIdentityProvider, UserAccount};
pub use lifecycle::{Direction, FaxStatus, SubmitFax, TransmissionEngine};
pub use service::{FaxRecord, FaxService, NumberAssignment, OwnerOverview};
pub use storage::{DocumentStore, FileDocumentStore};
