//! Hard-label oracles and per-run query accounting.
use crate::config::QueryBudget;
use crate::error::SearchError;
use crate::OptFloat;
use log::trace;
use ndarray::ArrayView1;
use std::cell::Cell;
use std::fmt::Debug;
use std::time::Instant;

/// A classifier exposed only through its predicted label.
///
/// Implementations must be deterministic: the boundary searches assume that
/// querying the same input twice yields the same label.
pub trait Oracle {
    type Label: PartialEq + Clone + Debug;

    fn predict(&self, input: ArrayView1<OptFloat>) -> Self::Label;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    type Label = O::Label;

    fn predict(&self, input: ArrayView1<OptFloat>) -> Self::Label {
        (**self).predict(input)
    }
}

/// Adapts a closure into an [`Oracle`].
#[derive(Clone, Debug)]
pub struct FnOracle<F> {
    func: F,
}

impl<F> FnOracle<F> {
    pub fn new<L>(func: F) -> Self
    where
        F: Fn(ArrayView1<OptFloat>) -> L,
    {
        Self { func }
    }
}

impl<F, L> Oracle for FnOracle<F>
where
    F: Fn(ArrayView1<OptFloat>) -> L,
    L: PartialEq + Clone + Debug,
{
    type Label = L;

    fn predict(&self, input: ArrayView1<OptFloat>) -> L {
        (self.func)(input)
    }
}

/// Counts the queries of one attack run and enforces its budget.
///
/// The budget is checked before every call, so an exhausted run issues no
/// further queries.
pub struct CountingOracle<'a, O: Oracle> {
    oracle: &'a O,
    queries: Cell<usize>,
    max_queries: Option<usize>,
    deadline: Option<Instant>,
}

impl<'a, O: Oracle> CountingOracle<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            queries: Cell::new(0),
            max_queries: None,
            deadline: None,
        }
    }

    /// Budget clock starts now.
    pub fn with_budget(mut self, budget: &QueryBudget) -> Self {
        self.max_queries = budget.max_queries;
        self.deadline = budget.time_limit.map(|limit| Instant::now() + limit);
        self
    }

    /// # Errors
    /// `SearchError::BudgetExhausted` once the query or time budget is spent
    pub fn query(&self, input: ArrayView1<OptFloat>) -> Result<O::Label, SearchError> {
        let queries = self.queries.get();
        if self.is_exhausted() {
            trace!("budget exhausted at {} queries", queries);
            return Err(SearchError::BudgetExhausted { queries });
        }
        self.queries.set(queries + 1);
        Ok(self.oracle.predict(input))
    }

    pub fn is_exhausted(&self) -> bool {
        let over_count = self
            .max_queries
            .map_or(false, |max| self.queries.get() >= max);
        let over_time = self
            .deadline
            .map_or(false, |deadline| Instant::now() >= deadline);
        over_count || over_time
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::time::Duration;

    fn sign_oracle() -> FnOracle<impl Fn(ArrayView1<OptFloat>) -> bool> {
        FnOracle::new(|x: ArrayView1<OptFloat>| x[0] >= 0.)
    }

    #[test]
    fn test_counts_every_query() {
        let oracle = sign_oracle();
        let counting = CountingOracle::new(&oracle);
        let x = array![1., 0.];
        for _ in 0..5 {
            assert_eq!(counting.query(x.view()), Ok(true));
        }
        assert_eq!(counting.queries(), 5);
    }

    #[test]
    fn test_query_budget_is_enforced() {
        let oracle = sign_oracle();
        let budget = QueryBudget {
            max_queries: Some(3),
            time_limit: None,
        };
        let counting = CountingOracle::new(&oracle).with_budget(&budget);
        let x = array![-1., 0.];
        for _ in 0..3 {
            assert_eq!(counting.query(x.view()), Ok(false));
        }
        assert_eq!(
            counting.query(x.view()),
            Err(SearchError::BudgetExhausted { queries: 3 })
        );
        assert_eq!(counting.queries(), 3);
    }

    #[test]
    fn test_zero_time_limit_blocks_queries() {
        let oracle = sign_oracle();
        let budget = QueryBudget {
            max_queries: None,
            time_limit: Some(Duration::from_secs(0)),
        };
        let counting = CountingOracle::new(&oracle).with_budget(&budget);
        assert!(counting.query(array![1.].view()).is_err());
        assert_eq!(counting.queries(), 0);
    }
}
