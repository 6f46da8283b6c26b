//! Largest-remainder allocation of a revenue pool.

use edulife_models::ids::UserId;

/// Splits `pool_amount` (in minor units) across teachers proportionally
/// to their weights, using the largest-remainder method so the shares
/// always sum to exactly `pool_amount`.
///
/// Leftover units go to the largest fractional remainders first; equal
/// remainders break ties by ascending teacher id, so the split is
/// deterministic. Teachers with non-positive weight get nothing.
pub fn distribute_pool(pool_amount: i64, weights: &[(UserId, i64)]) -> Vec<(UserId, i64)> {
    let positive: Vec<(UserId, i64)> = weights
        .iter()
        .filter(|(_, w)| *w > 0)
        .copied()
        .collect();
    let total_weight: i128 = positive.iter().map(|(_, w)| *w as i128).sum();
    if pool_amount <= 0 || total_weight == 0 {
        return Vec::new();
    }

    let pool = pool_amount as i128;
    let mut shares: Vec<(UserId, i64, i128)> = positive
        .iter()
        .map(|(teacher_id, weight)| {
            let scaled = pool * *weight as i128;
            let base = (scaled / total_weight) as i64;
            let remainder = scaled % total_weight;
            (*teacher_id, base, remainder)
        })
        .collect();

    let assigned: i64 = shares.iter().map(|(_, base, _)| base).sum();
    let mut leftover = pool_amount - assigned;

    shares.sort_by(|a, b| b.2.cmp(&a.2).then(a.0 .0.cmp(&b.0 .0)));
    for share in shares.iter_mut() {
        if leftover == 0 {
            break;
        }
        share.1 += 1;
        leftover -= 1;
    }

    shares.sort_by_key(|(teacher_id, _, _)| teacher_id.0);
    shares
        .into_iter()
        .map(|(teacher_id, amount, _)| (teacher_id, amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn teacher(n: u8) -> UserId {
        UserId::from_uuid(Uuid::from_bytes([n; 16]))
    }

    #[test]
    fn shares_sum_to_pool() {
        let weights = vec![(teacher(1), 7), (teacher(2), 11), (teacher(3), 3)];
        let shares = distribute_pool(10_000, &weights);
        assert_eq!(shares.iter().map(|(_, a)| a).sum::<i64>(), 10_000);
    }

    #[test]
    fn proportional_split() {
        let weights = vec![(teacher(1), 3), (teacher(2), 1)];
        let shares = distribute_pool(1_000, &weights);
        assert_eq!(shares, vec![(teacher(1), 750), (teacher(2), 250)]);
    }

    #[test]
    fn remainder_goes_to_largest_fraction() {
        // 100 over weights 1/1/1: one teacher gets the extra unit.
        let weights = vec![(teacher(1), 1), (teacher(2), 1), (teacher(3), 1)];
        let shares = distribute_pool(100, &weights);
        assert_eq!(shares.iter().map(|(_, a)| a).sum::<i64>(), 100);
        let amounts: Vec<i64> = shares.iter().map(|(_, a)| *a).collect();
        assert_eq!(amounts.iter().filter(|&&a| a == 34).count(), 1);
        assert_eq!(amounts.iter().filter(|&&a| a == 33).count(), 2);
    }

    #[test]
    fn equal_remainders_break_ties_by_teacher_id() {
        let weights = vec![(teacher(2), 1), (teacher(1), 1)];
        let shares = distribute_pool(101, &weights);
        // Both remainders are equal; the lower id wins the extra unit.
        assert_eq!(shares, vec![(teacher(1), 51), (teacher(2), 50)]);
    }

    #[test]
    fn zero_weights_get_nothing() {
        let weights = vec![(teacher(1), 0), (teacher(2), 5)];
        let shares = distribute_pool(100, &weights);
        assert_eq!(shares, vec![(teacher(2), 100)]);
    }

    #[test]
    fn empty_when_no_weight() {
        assert!(distribute_pool(100, &[]).is_empty());
        assert!(distribute_pool(100, &[(teacher(1), 0)]).is_empty());
        assert!(distribute_pool(0, &[(teacher(1), 1)]).is_empty());
    }
}
