//! Domain layer for slashing protection
//!
//! Pure decision rules; no storage or I/O.

pub mod attestation_rules;
pub mod proposal_rules;

pub use attestation_rules::{check_attestation, AttestationCheck};
pub use proposal_rules::{check_proposal, ProposalCheck};
