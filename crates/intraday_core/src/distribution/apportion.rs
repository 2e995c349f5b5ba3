//! Exact-sum integer apportionment.
//!
//! Each share is rounded on its own (ties away from zero) and the
//! rounding slack is then moved, in one piece, onto the largest share.
//! The first largest share in slice order wins ties.

/// Allocates `total` across `shares` so the result sums to exactly `total`.
///
/// `shares` are fractions of `total` (a curve, not necessarily summing
/// to 1). Callers guarantee every share is finite and non-negative and
/// that at least one is positive.
///
/// When the correction is negative and larger than the peak allocation
/// (only possible when the shares add up to well over 1) the remaining
/// deficit is taken from the next-largest shares in turn, so no
/// allocation ever goes below zero.
pub(crate) fn apportion(shares: &[f64], total: u64) -> Vec<u64> {
    if shares.is_empty() {
        return Vec::new();
    }

    let mut allocated: Vec<u64> = shares
        .iter()
        .map(|share| ((share * total as f64).round().max(0.0) as u64).min(total))
        .collect();

    // each allocation is at most `total`, so the sum fits in u128
    let assigned: u128 = allocated.iter().map(|&a| u128::from(a)).sum();
    let order = by_share_descending(shares);

    if assigned <= u128::from(total) {
        let slack = total - assigned as u64;
        allocated[order[0]] += slack;
        return allocated;
    }

    let mut deficit = assigned - u128::from(total);
    for index in order {
        let taken = deficit.min(u128::from(allocated[index])) as u64;
        allocated[index] -= taken;
        deficit -= u128::from(taken);
        if deficit == 0 {
            break;
        }
    }
    allocated
}

/// Indices sorted by share, largest first; equal shares keep slice order.
fn by_share_descending(shares: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| shares[b].total_cmp(&shares[a]));
    order
}

/// Index of the first largest share.
pub(crate) fn peak_index(shares: &[f64]) -> Option<usize> {
    by_share_descending(shares).first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_shares_need_no_correction() {
        assert_eq!(apportion(&[0.25, 0.25, 0.5], 100), vec![25, 25, 50]);
    }

    #[test]
    fn test_half_ties_correct_the_first_bucket() {
        // 1.5 / 1.5 round to 2 / 2, the first bucket gives one back
        assert_eq!(apportion(&[0.5, 0.5], 3), vec![1, 2]);
        assert_eq!(apportion(&[0.5, 0.5], 3), apportion(&[0.5, 0.5], 3));
    }

    #[test]
    fn test_slack_goes_to_peak() {
        // thirds of 100 round to 33 each, 1 left over
        let shares = [0.3, 0.4, 0.3];
        let result = apportion(&shares, 101);
        assert_eq!(result.iter().sum::<u64>(), 101);
        assert_eq!(result, vec![30, 41, 30]);
    }

    #[test]
    fn test_unnormalised_curve_is_corrected_onto_peak() {
        // curve sums to 0.9: rounding gives 90, peak absorbs the other 10
        let result = apportion(&[0.3, 0.6], 100);
        assert_eq!(result, vec![30, 70]);
    }

    #[test]
    fn test_oversized_deficit_spills_without_going_negative() {
        // shares sum to 3, peak alone cannot absorb the -20 correction
        let result = apportion(&[1.0, 1.0, 1.0], 10);
        assert_eq!(result.iter().sum::<u64>(), 10);
        assert_eq!(result, vec![0, 0, 10]);
    }

    #[test]
    fn test_total_near_u64_max_keeps_exact_sum() {
        // each half rounds up to 2^63, one over the total between them
        let result = apportion(&[0.5, 0.5], u64::MAX);
        assert_eq!(result, vec![(1u64 << 63) - 1, 1u64 << 63]);
        assert_eq!(result.iter().map(|&v| u128::from(v)).sum::<u128>(), u128::from(u64::MAX));

        let result = apportion(&[1.0, 1.0], u64::MAX);
        assert_eq!(result, vec![0, u64::MAX]);
    }

    #[test]
    fn test_zero_total() {
        assert_eq!(apportion(&[0.2, 0.8], 0), vec![0, 0]);
    }

    #[test]
    fn test_empty_shares() {
        assert!(apportion(&[], 10).is_empty());
        assert_eq!(peak_index(&[]), None);
    }

    #[test]
    fn test_peak_index_prefers_first_on_ties() {
        assert_eq!(peak_index(&[0.1, 0.45, 0.45]), Some(1));
    }
}
