//! Local block proposal slashing rule.

use crate::error::SlashingKind;
use shared_types::Root;

/// Outcome of a passing proposal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalCheck {
    Safe,
    /// The same block was already signed for this slot.
    Repeat,
}

/// Decide whether a block with `signing_root` may be signed, given what was
/// recorded for its slot.
pub fn check_proposal(recorded: Option<&Root>, signing_root: &Root) -> Result<ProposalCheck, SlashingKind> {
    match recorded {
        None => Ok(ProposalCheck::Safe),
        Some(root) if root == signing_root => Ok(ProposalCheck::Repeat),
        Some(_) => Err(SlashingKind::DoubleProposal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_rules() {
        assert_eq!(check_proposal(None, &[1; 32]), Ok(ProposalCheck::Safe));
        assert_eq!(
            check_proposal(Some(&[1; 32]), &[1; 32]),
            Ok(ProposalCheck::Repeat)
        );
        assert_eq!(
            check_proposal(Some(&[1; 32]), &[2; 32]),
            Err(SlashingKind::DoubleProposal)
        );
    }
}
