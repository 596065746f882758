//! # Slashing Protection (qc-19)
//!
//! Guarantees a validator key never signs two conflicting attestations or
//! blocks. Every signing request is checked against the validator's recorded
//! history before the signature is produced.
//!
//! ## Slashing Rules
//!
//! | Kind | Refused when |
//! |------|--------------|
//! | `SourceAfterTarget` | source > target |
//! | `TargetOutsideHistory` | target at least one weak-subjectivity period behind the highest signed target |
//! | `DoubleVote` | same target, different signing root |
//! | `SurroundingVote` | new vote surrounds a recorded one |
//! | `SurroundedVote` | a recorded vote surrounds the new one |
//! | `DoubleProposal` | same slot, different block |
//! | `RemoteRefusal` | the remote protector says no |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - pure attestation and proposal rules
//! - `ports/` - `Protector` (inbound), `RemoteProtector`/`RemoteConnector` (outbound)
//! - `service/` - `ProtectionService`, per-key locking and the remote retry loop
//! - `config` - TOML and environment configuration
//!
//! ## Usage
//!
//! ```ignore
//! use qc_19_slashing_protection::{Protector, ProtectionService};
//! use qc_18_validator_db::ValidatorDb;
//!
//! let service = ProtectionService::local_only(Arc::new(ValidatorDb::in_memory()));
//! service.start();
//! service.is_slashable_attestation(&indexed_att, pubkey, &domain).await?;
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::{ConfigError, ProtectionConfig, RemoteProtectorConfig};
pub use domain::{check_attestation, check_proposal, AttestationCheck, ProposalCheck};
pub use error::{
    ProtectionError, ProtectionResult, RemoteError, SlashingDetected, SlashingKind,
};
pub use ports::{Protector, RemoteConnector, RemoteProtector, RemoteVerdict};
pub use service::{Protection, ProtectionDb, ProtectionService};
