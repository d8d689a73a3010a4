mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

pub use crate::config::*;

/// Allocates `total_limit` across the given units, in proportion to each
/// unit's signup count, using the largest-remainder (Hamilton) method.
///
/// The returned rows are ordered like the input. The caller's units are
/// never mutated: every invocation produces a fresh result from scratch,
/// and identical inputs produce identical results.
///
/// Three mutually exclusive cases, in priority order:
/// 1. no demand or no capacity (`total_signup == 0` or `total_limit <= 0`):
///    nothing is allocated;
/// 2. capacity sufficient (`total_signup <= total_limit`): every unit is
///    fully granted;
/// 3. over-subscribed: exact shares are floored, then the leftover spots go
///    one each to the largest fractional remainders. Remainder ties keep
///    the original input order.
///
/// This function does not fail for any input in its documented domain.
/// Negative counts cannot be expressed; a zero or negative limit falls
/// under case 1.
pub fn run_allocation(units: &[Unit], total_limit: i64) -> CalculationResult {
    info!(
        "run_allocation: processing {:?} units, total_limit: {:?}",
        units.len(),
        total_limit
    );

    let total_signup: u64 = units.iter().map(|u| u.count).sum();

    // No demand or no capacity. Note the flag: a positive signup total with
    // no capacity is an over-subscription, while 0 signups against a
    // nonpositive limit is not.
    if total_signup == 0 || total_limit <= 0 {
        return CalculationResult {
            data: units
                .iter()
                .map(|u| AllocationRow {
                    unit: u.clone(),
                    exact_share: 0.0,
                    base_allocated: 0,
                    remainder: 0.0,
                    allocated: 0,
                    reduction: u.count,
                })
                .collect(),
            total_signup,
            total_allocated: 0,
            excess: total_signup,
            is_over: total_signup > 0,
        };
    }

    let limit = total_limit as u64;

    // Everyone fits under the limit.
    if total_signup <= limit {
        return CalculationResult {
            data: units
                .iter()
                .map(|u| AllocationRow {
                    unit: u.clone(),
                    exact_share: u.count as f64,
                    base_allocated: u.count,
                    remainder: 0.0,
                    allocated: u.count,
                    reduction: 0,
                })
                .collect(),
            total_signup,
            total_allocated: total_signup,
            excess: 0,
            is_over: false,
        };
    }

    // Over-subscribed. Step 1: floor the exact proportional shares.
    let ratio = limit as f64 / total_signup as f64;
    let mut rows: Vec<AllocationRow> = units
        .iter()
        .map(|u| {
            let exact_share = u.count as f64 * ratio;
            let base_allocated = exact_share.floor() as u64;
            let remainder = exact_share - base_allocated as f64;
            AllocationRow {
                unit: u.clone(),
                exact_share,
                base_allocated,
                remainder,
                allocated: base_allocated,
                reduction: 0,
            }
        })
        .collect();

    let floor_total: u64 = rows.iter().map(|r| r.base_allocated).sum();

    // Step 2: distribute what the floors left over, one spot per unit, to
    // the largest remainders. Each remainder is < 1 so there are fewer
    // leftover spots than units.
    let remaining_spots = (limit - floor_total) as usize;
    debug!(
        "run_allocation: floor_total: {:?} remaining_spots: {:?}",
        floor_total, remaining_spots
    );

    // The ordering is only used for selection, never for output. The sort
    // must be stable so that remainder ties resolve in input order and the
    // outcome is reproducible.
    let mut by_remainder: Vec<usize> = (0..rows.len()).collect();
    by_remainder.sort_by(|&a, &b| rows[b].remainder.total_cmp(&rows[a].remainder));

    for &idx in by_remainder.iter().take(remaining_spots) {
        debug!(
            "run_allocation: extra spot granted to unit {:?} (remainder {:?})",
            rows[idx].unit.id, rows[idx].remainder
        );
        rows[idx].allocated += 1;
    }

    for row in rows.iter_mut() {
        row.reduction = row.unit.count - row.allocated;
    }

    // floor_total + remaining_spots reconciles to the limit exactly.
    CalculationResult {
        data: rows,
        total_signup,
        total_allocated: limit,
        excess: total_signup - limit,
        is_over: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, name: &str, count: u64) -> Unit {
        Unit {
            id: id.to_string(),
            name: name.to_string(),
            count,
        }
    }

    fn check_invariants(units: &[Unit], total_limit: i64) -> CalculationResult {
        let res = run_allocation(units, total_limit);
        let total_signup: u64 = units.iter().map(|u| u.count).sum();
        assert_eq!(res.total_signup, total_signup);
        assert_eq!(res.data.len(), units.len());
        let allocated_sum: u64 = res.data.iter().map(|r| r.allocated).sum();
        assert_eq!(allocated_sum, res.total_allocated);
        if total_signup > 0 && total_limit > 0 {
            assert_eq!(allocated_sum, total_signup.min(total_limit as u64));
        } else {
            assert_eq!(allocated_sum, 0);
        }
        for (u, r) in units.iter().zip(res.data.iter()) {
            // Output order matches input order and bounds hold per unit.
            assert_eq!(r.unit, *u);
            assert!(r.allocated <= u.count);
            assert_eq!(r.reduction, u.count - r.allocated);
        }
        res
    }

    #[test]
    fn over_subscribed_reference_scenario() {
        let units = vec![unit("1", "A", 45), unit("2", "B", 82), unit("3", "C", 30)];
        let res = check_invariants(&units, 100);
        assert_eq!(res.total_signup, 157);
        assert_eq!(res.total_allocated, 100);
        assert_eq!(res.excess, 57);
        assert!(res.is_over);
        // Floors are 28/52/19; A holds the largest remainder and takes the
        // single leftover spot.
        let allocated: Vec<u64> = res.data.iter().map(|r| r.allocated).collect();
        assert_eq!(allocated, vec![29, 52, 19]);
        let bases: Vec<u64> = res.data.iter().map(|r| r.base_allocated).collect();
        assert_eq!(bases, vec![28, 52, 19]);
        let reductions: Vec<u64> = res.data.iter().map(|r| r.reduction).collect();
        assert_eq!(reductions, vec![16, 30, 11]);
    }

    #[test]
    fn zero_limit_is_over() {
        let units = vec![unit("1", "A", 10)];
        let res = check_invariants(&units, 0);
        assert_eq!(res.data[0].allocated, 0);
        assert_eq!(res.data[0].reduction, 10);
        assert_eq!(res.excess, 10);
        assert!(res.is_over);
    }

    #[test]
    fn negative_limit_behaves_like_zero() {
        let units = vec![unit("1", "A", 3), unit("2", "B", 4)];
        let res = check_invariants(&units, -5);
        assert_eq!(res.total_allocated, 0);
        assert_eq!(res.excess, 7);
        assert!(res.is_over);
    }

    #[test]
    fn empty_units() {
        let res = check_invariants(&[], 50);
        assert!(res.data.is_empty());
        assert_eq!(res.total_allocated, 0);
        assert_eq!(res.excess, 0);
        assert!(!res.is_over);
    }

    #[test]
    fn no_signups_and_no_capacity_is_not_over() {
        // Both totals nonpositive: the no-demand case wins and the flag
        // stays false.
        let units = vec![unit("1", "A", 0)];
        let res = check_invariants(&units, 0);
        assert!(!res.is_over);
        assert_eq!(res.excess, 0);
    }

    #[test]
    fn within_limit_fully_granted() {
        let units = vec![unit("1", "A", 5), unit("2", "B", 5)];
        let res = check_invariants(&units, 20);
        for row in res.data.iter() {
            assert_eq!(row.allocated, row.unit.count);
            assert_eq!(row.exact_share, row.unit.count as f64);
            assert_eq!(row.reduction, 0);
        }
        assert_eq!(res.total_allocated, 10);
        assert_eq!(res.excess, 0);
        assert!(!res.is_over);
    }

    #[test]
    fn exact_fit_fully_granted() {
        let units = vec![unit("1", "A", 7), unit("2", "B", 3)];
        let res = check_invariants(&units, 10);
        assert_eq!(res.total_allocated, 10);
        assert!(!res.is_over);
    }

    #[test]
    fn remainder_ties_resolve_in_input_order() {
        // Four identical units competing for 2 spots: identical remainders,
        // so the earliest units in the list take the extras.
        let units = vec![
            unit("1", "A", 5),
            unit("2", "B", 5),
            unit("3", "C", 5),
            unit("4", "D", 5),
        ];
        let res = check_invariants(&units, 10);
        let allocated: Vec<u64> = res.data.iter().map(|r| r.allocated).collect();
        assert_eq!(allocated, vec![3, 3, 2, 2]);
    }

    #[test]
    fn zero_count_unit_gets_nothing() {
        let units = vec![unit("1", "A", 0), unit("2", "B", 9)];
        let res = check_invariants(&units, 4);
        assert_eq!(res.data[0].allocated, 0);
        assert_eq!(res.data[0].exact_share, 0.0);
        assert_eq!(res.data[1].allocated, 4);
    }

    #[test]
    fn single_unit_takes_whole_limit() {
        let units = vec![unit("1", "A", 1000)];
        let res = check_invariants(&units, 37);
        assert_eq!(res.data[0].allocated, 37);
        assert_eq!(res.data[0].reduction, 963);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let units = vec![unit("1", "A", 45), unit("2", "B", 82), unit("3", "C", 30)];
        let first = run_allocation(&units, 100);
        let second = run_allocation(&units, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn sum_matches_limit_across_inputs() {
        // A spread of over-subscribed inputs, exercising the reconciliation
        // across different floor/remainder splits.
        let cases: Vec<(Vec<u64>, i64)> = vec![
            (vec![1, 1, 1], 2),
            (vec![3, 3, 3, 1], 7),
            (vec![10, 20, 30, 40], 33),
            (vec![99, 1], 50),
            (vec![7, 7, 7, 7, 7, 7, 7], 11),
            (vec![1000000, 3, 2], 999),
        ];
        for (counts, limit) in cases {
            let units: Vec<Unit> = counts
                .iter()
                .enumerate()
                .map(|(idx, &c)| unit(&format!("{}", idx + 1), "unit", c))
                .collect();
            check_invariants(&units, limit);
        }
    }
}
