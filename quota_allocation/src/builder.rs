pub use crate::config::*;
use crate::run_allocation;

/// A builder for assembling units before running an allocation.
///
/// ```
/// use quota_allocation::builder::Builder;
/// # use quota_allocation::AllocationErrors;
///
/// let mut builder = Builder::new(100);
/// builder.add_unit("Administration", 45)?;
/// builder.add_unit("Engineering", 82)?;
/// builder.add_unit("Quality", 30)?;
///
/// let result = builder.allocate();
/// assert_eq!(result.total_allocated, 100);
///
/// # Ok::<(), AllocationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _total_limit: i64,
    pub(crate) _units: Vec<Unit>,
}

impl Builder {
    pub fn new(total_limit: i64) -> Builder {
        Builder {
            _total_limit: total_limit,
            _units: Vec::new(),
        }
    }

    /// Adds a unit, assigning it an identifier from its position in the
    /// insertion order.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_unit(&mut self, name: &str, count: u64) -> Result<(), AllocationErrors> {
        let id = format!("{}", self._units.len() + 1);
        self.add_unit_with_id(id.as_str(), name, count)
    }

    /// Adds a unit with an explicit identifier.
    ///
    /// Identifiers must be unique across the builder. Names carry no
    /// meaning and do not need to be distinct.
    pub fn add_unit_with_id(
        &mut self,
        id: &str,
        name: &str,
        count: u64,
    ) -> Result<(), AllocationErrors> {
        if self._units.iter().any(|u| u.id == id) {
            return Err(AllocationErrors::DuplicateUnitId(id.to_string()));
        }
        self._units.push(Unit {
            id: id.to_string(),
            name: name.to_string(),
            count,
        });
        Ok(())
    }

    /// Runs the allocation over the accumulated units. The builder can be
    /// reused afterwards; the units are not consumed.
    pub fn allocate(&self) -> CalculationResult {
        run_allocation(&self._units, self._total_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_ids() {
        let mut builder = Builder::new(10);
        builder.add_unit_with_id("a", "first", 1).unwrap();
        let res = builder.add_unit_with_id("a", "second", 2);
        assert_eq!(res, Err(AllocationErrors::DuplicateUnitId("a".to_string())));
    }

    #[test]
    fn assigns_positional_ids() {
        let mut builder = Builder::new(10);
        builder.add_unit("x", 1).unwrap();
        builder.add_unit("y", 2).unwrap();
        let res = builder.allocate();
        assert_eq!(res.data[0].unit.id, "1");
        assert_eq!(res.data[1].unit.id, "2");
        assert_eq!(res.total_allocated, 3);
    }
}
