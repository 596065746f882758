//! Ports for slashing protection

pub mod inbound;
pub mod outbound;

pub use inbound::Protector;
pub use outbound::{RemoteConnector, RemoteProtector, RemoteVerdict};
