// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A named unit competing for a share of the total quota.
///
/// In most cases, it is enough to use the higher-level builder API.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Unit {
    /// Identifier, unique within a single allocation call and stable
    /// across recalculations.
    pub id: String,
    /// Display name. Carries no meaning for the algorithm.
    pub name: String,
    /// The number of signups recorded for this unit.
    pub count: u64,
}

// ******** Output data structures *********

/// The outcome for a single unit. Derived from the input unit, which is
/// copied rather than mutated in place.
#[derive(PartialEq, Debug, Clone)]
pub struct AllocationRow {
    pub unit: Unit,
    /// The theoretical (fractional) fair allocation:
    /// count scaled by limit / total signups.
    pub exact_share: f64,
    /// floor(exact_share).
    pub base_allocated: u64,
    /// Fractional part of the exact share, in [0, 1).
    pub remainder: f64,
    /// The final granted amount.
    pub allocated: u64,
    /// count - allocated. The gap between request and grant.
    pub reduction: u64,
}

/// Aggregate outcome of one allocation pass.
///
/// `data` is ordered like the input unit list.
#[derive(PartialEq, Debug, Clone)]
pub struct CalculationResult {
    pub data: Vec<AllocationRow>,
    pub total_signup: u64,
    /// Always reconcilable: 0 in the degenerate case, total_signup when
    /// capacity is sufficient, exactly the limit when over-subscribed.
    pub total_allocated: u64,
    pub excess: u64,
    pub is_over: bool,
}

/// Errors raised while assembling the input. The allocation itself is a
/// total function over its domain and never fails.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AllocationErrors {
    DuplicateUnitId(String),
}

impl Error for AllocationErrors {}

impl Display for AllocationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationErrors::DuplicateUnitId(id) => {
                write!(f, "AllocationError: duplicate unit id {:?}", id)
            }
        }
    }
}
