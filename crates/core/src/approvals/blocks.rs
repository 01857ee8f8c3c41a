//! Ten-million block rules for cases Credit has already approved once.
//!
//! Exposure is bucketed into half-open blocks `[10M·n, 10M·(n+1))`. From the
//! 20M block upwards, moving into a higher block sends the case back to Credit,
//! while changes that stay within the already approved territory may be granted
//! locally under supplementary authority.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::exposure::ExposureFigures;
use crate::domain::policy::PolicyFlags;

pub const BLOCK_SIZE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);
/// Index of the first block (20M) where the block rules apply.
pub const FIRST_ESCALATED_BLOCK: u64 = 2;
const MILLIONS_PER_BLOCK: u64 = 10;

/// Which boundary to report when one change skips several blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingBoundary {
    /// Lowest boundary passed, e.g. 30 for 28M -> 41M.
    #[default]
    First,
    /// Highest boundary passed, e.g. 40 for 28M -> 41M.
    Last,
}

impl CrossingBoundary {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockPosition {
    pub previous: u64,
    pub new: u64,
}

impl BlockPosition {
    pub fn of(exposure: &ExposureFigures) -> Self {
        Self {
            previous: block_index(exposure.previous_total),
            new: block_index(exposure.new_total),
        }
    }
}

/// Saturates at `u64::MAX` for totals beyond the `u64` range of blocks.
pub fn block_index(total: Decimal) -> u64 {
    let block = (total / BLOCK_SIZE).floor();
    if block.is_sign_negative() {
        return 0;
    }
    block.to_u64().unwrap_or(u64::MAX)
}

/// Boundary in millions that the new total crossed, if the case was approved
/// by Credit before and the crossing reaches 20M or more.
pub fn detect_crossing(
    position: BlockPosition,
    flags: &PolicyFlags,
    boundary: CrossingBoundary,
) -> Option<u64> {
    if !flags.approved_by_credit_before {
        return None;
    }

    if position.new <= position.previous || position.new < FIRST_ESCALATED_BLOCK {
        return None;
    }

    let block = match boundary {
        CrossingBoundary::First => {
            position.previous.saturating_add(1).max(FIRST_ESCALATED_BLOCK)
        }
        CrossingBoundary::Last => position.new,
    };

    Some(block.saturating_mul(MILLIONS_PER_BLOCK))
}

/// Supplementary authority covers a case whose previous total already sat in an
/// escalated block and whose new total does not climb into a higher block.
///
/// Only the previous block has to be at 20M or above. A reduction from 21M to
/// 15M stays eligible, so the approver never drops as the new total rises.
pub fn within_supplementary_authority(position: BlockPosition, flags: &PolicyFlags) -> bool {
    flags.approved_by_credit_before
        && position.previous >= FIRST_ESCALATED_BLOCK
        && position.new <= position.previous
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        block_index, detect_crossing, within_supplementary_authority, BlockPosition,
        CrossingBoundary,
    };
    use crate::domain::exposure::ExposureFigures;
    use crate::domain::policy::PolicyFlags;

    fn position(previous_millions: i64, new_millions: i64) -> BlockPosition {
        BlockPosition::of(&ExposureFigures::from_totals(
            Decimal::new(previous_millions * 1_000_000, 0),
            Decimal::new(new_millions * 1_000_000, 0),
        ))
    }

    fn escalated() -> PolicyFlags {
        PolicyFlags { approved_by_credit_before: true, ..PolicyFlags::default() }
    }

    #[test]
    fn block_index_is_floor_of_ten_millions() {
        assert_eq!(block_index(Decimal::ZERO), 0);
        assert_eq!(block_index(Decimal::new(19_999_999, 0)), 1);
        assert_eq!(block_index(Decimal::new(20_000_000, 0)), 2);
        assert_eq!(block_index(Decimal::new(315, 1) * Decimal::new(1_000_000, 0)), 3);
    }

    #[test]
    fn crossing_thirty_million_is_detected() {
        let crossing = detect_crossing(position(28, 31), &escalated(), CrossingBoundary::First);
        assert_eq!(crossing, Some(30));
    }

    #[test]
    fn landing_exactly_on_a_boundary_counts_as_crossing() {
        let crossing = detect_crossing(position(15, 20), &escalated(), CrossingBoundary::First);
        assert_eq!(crossing, Some(20));
    }

    #[test]
    fn no_crossing_below_twenty_million() {
        assert_eq!(detect_crossing(position(5, 15), &escalated(), CrossingBoundary::First), None);
    }

    #[test]
    fn no_crossing_without_prior_credit_approval() {
        assert_eq!(
            detect_crossing(position(28, 31), &PolicyFlags::default(), CrossingBoundary::First),
            None
        );
    }

    #[test]
    fn multi_block_jump_reports_configured_boundary() {
        let jump = position(8, 45);
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::First), Some(20));
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::Last), Some(40));

        let jump = position(28, 41);
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::First), Some(30));
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::Last), Some(40));
    }

    #[test]
    fn supplementary_authority_within_same_escalated_block() {
        assert!(within_supplementary_authority(position(21, 25), &escalated()));
        assert!(within_supplementary_authority(position(35, 24), &escalated()));
        assert!(!within_supplementary_authority(position(21, 31), &escalated()));
        assert!(!within_supplementary_authority(position(12, 15), &escalated()));
        assert!(!within_supplementary_authority(position(21, 25), &PolicyFlags::default()));
    }

    #[test]
    fn huge_totals_saturate_instead_of_wrapping() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        assert_eq!(block_index(huge), u64::MAX);

        let jump = BlockPosition::of(&ExposureFigures::from_totals(
            Decimal::new(25_000_000, 0),
            huge,
        ));
        assert!(!within_supplementary_authority(jump, &escalated()));
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::First), Some(30));
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::Last), Some(u64::MAX));

        let jump = BlockPosition::of(&ExposureFigures::from_totals(
            Decimal::ZERO,
            Decimal::from_i128_with_scale(2 * 10_i128.pow(25), 0),
        ));
        assert_eq!(detect_crossing(jump, &escalated(), CrossingBoundary::Last), Some(u64::MAX));
    }
}
