//! # Ports Module
//!
//! - `inbound`: database API (driving ports)
//! - `outbound`: key-value backend and record serialization (driven ports)

pub mod inbound;
pub mod outbound;

pub use inbound::{
    AttestationHistoryApi, HighWaterMarkApi, MarkKind, MigrationApi, ProposalHistoryApi,
};
pub use outbound::{BatchOperation, KeyValueStore, LegacyRecordSerializer, ScanResult};
