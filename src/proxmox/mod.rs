pub mod agent;
pub mod client;
pub mod cluster;
pub mod error;
pub mod guest;
pub mod models;
pub mod node;
pub mod snapshot;
pub mod storage;

pub use client::{ProxmoxClient, Ticket};
pub use error::ProxmoxError;
pub use guest::GuestKind;
pub use models::VmId;
