//! Iteration over budget-bounded partitions of a subarray.
//!
//! The partitioner advances through the flattened ND ranges of its
//! subarray, expanding an interval until the estimated result no
//! longer fits the caller's budgets, calibrating the interval to the
//! layout's slab structure, and splitting ranges which are too large
//! on their own. All work happens on the caller's thread; the
//! estimator fans out across the injected compute pool and joins
//! before any state transition.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use tiledb_common::array::Layout;

use crate::config::Config;
use crate::error::{BudgetError, Error, Result};
use crate::estimator::{EstimateSet, SizeEstimator};
use crate::metadata::ArrayMetadata;
use crate::split::{self, MultiRangeSplit};
use crate::subarray::Subarray;

/// Result budget (in bytes) for an attribute or dimension used for
/// partitioning.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResultBudget {
    /// Size for fixed-sized fields or offsets of var-sized fields.
    pub size_fixed: u64,
    /// Size of values for var-sized fields.
    pub size_var: u64,
    /// Size of validity vectors for nullable fields.
    pub size_validity: u64,
}

/// The current partition, with the interval of flattened range
/// indices of the original subarray it was constructed from. The
/// interval supports further splitting of the partition when the
/// consumer discovers the estimate was optimistic.
#[derive(Clone, Debug)]
pub struct PartitionInfo {
    pub partition: Subarray,
    /// The first flattened range index of the originating interval.
    pub start: u64,
    /// The last flattened range index of the originating interval,
    /// inclusive.
    pub end: u64,
    /// `true` if the partition came from splitting a multi-range
    /// slab held in the multi-range work list.
    pub split_multi_range: bool,
}

/// The remaining work: the next interval of flattened ranges to
/// attempt, plus the subarrays produced by splitting which must be
/// drained first. At most one of the two work lists is non-empty at
/// any moment; the single-range and multi-range code paths are
/// disjoint.
#[derive(Clone, Debug, Default)]
pub struct State {
    pub start: u64,
    pub end: u64,
    /// LIFO of single-range subarrays awaiting finer splitting.
    pub single_range: Vec<Subarray>,
    /// LIFO of multi-range slabs awaiting finer splitting.
    pub multi_range: Vec<Subarray>,
}

/// Iterates over partitions of a subarray such that the results
/// produced if each partition was submitted for a read query can
/// (approximately) fit the caller's budgets.
pub struct SubarrayPartitioner {
    subarray: Subarray,
    budget: HashMap<String, ResultBudget>,
    current: Option<PartitionInfo>,
    state: State,
    /// The interval of the original subarray the current partition
    /// (and any pending splits of it) derives from.
    cur_start: u64,
    cur_end: u64,
    memory_budget: u64,
    memory_budget_var: u64,
    memory_budget_validity: u64,
    skip_split_on_est_size: bool,
    skip_unary_partitioning_budget_check: bool,
    estimator: SizeEstimator,
}

impl SubarrayPartitioner {
    /// Creates a partitioner over `subarray` with explicit memory
    /// budgets for fixed-sized data, var-sized data, and validity
    /// vectors.
    pub fn new(
        config: &Config,
        subarray: Subarray,
        memory_budget: u64,
        memory_budget_var: u64,
        memory_budget_validity: u64,
        metadata: Arc<dyn ArrayMetadata>,
        compute_pool: Arc<rayon::ThreadPool>,
    ) -> Result<Self> {
        let skip_split_on_est_size = config.skip_est_size_partitioning()?;
        let skip_unary_partitioning_budget_check =
            config.skip_unary_partitioning_budget_check()?;

        let state = State {
            start: 0,
            end: subarray.range_num() - 1,
            single_range: Vec::new(),
            multi_range: Vec::new(),
        };
        debug!(
            "partitioning {} ranges under layout {}",
            subarray.range_num(),
            subarray.layout()
        );

        Ok(SubarrayPartitioner {
            subarray,
            budget: HashMap::new(),
            current: None,
            state,
            cur_start: 0,
            cur_end: 0,
            memory_budget,
            memory_budget_var,
            memory_budget_validity,
            skip_split_on_est_size,
            skip_unary_partitioning_budget_check,
            estimator: SizeEstimator::new(metadata, compute_pool),
        })
    }

    /// Creates a partitioner with the memory budgets the config
    /// declares (or their defaults).
    pub fn with_default_budgets(
        config: &Config,
        subarray: Subarray,
        metadata: Arc<dyn ArrayMetadata>,
        compute_pool: Arc<rayon::ThreadPool>,
    ) -> Result<Self> {
        let memory_budget = config.memory_budget()?;
        let memory_budget_var = config.memory_budget_var()?;
        Self::new(
            config,
            subarray,
            memory_budget,
            memory_budget_var,
            memory_budget,
            metadata,
            compute_pool,
        )
    }

    /// Returns the current partition.
    ///
    /// # Panics
    ///
    /// Panics if no partition has been produced yet.
    pub fn current(&self) -> &Subarray {
        &self
            .current
            .as_ref()
            .expect("no current partition; call `next` first")
            .partition
    }

    /// Returns the current partition info, if a partition has been
    /// produced.
    pub fn current_partition_info(&self) -> Option<&PartitionInfo> {
        self.current.as_ref()
    }

    /// Returns `true` if there are no more partitions.
    pub fn done(&self) -> bool {
        self.state.start > self.state.end
            && self.state.single_range.is_empty()
            && self.state.multi_range.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn subarray(&self) -> &Subarray {
        &self.subarray
    }

    /// Returns all result budgets that have been set.
    pub fn budgets(&self) -> &HashMap<String, ResultBudget> {
        &self.budget
    }

    /// Sets the result budget for a fixed-sized, non-nullable field.
    pub fn set_result_budget(
        &mut self,
        name: &str,
        budget: u64,
    ) -> Result<()> {
        self.check_field(name, false, false)?;
        debug!("result budget for '{}': {} bytes", name, budget);
        self.budget.insert(
            name.to_owned(),
            ResultBudget {
                size_fixed: budget,
                ..Default::default()
            },
        );
        Ok(())
    }

    /// Sets the result budget for a var-sized, non-nullable field.
    pub fn set_result_budget_var(
        &mut self,
        name: &str,
        budget_off: u64,
        budget_val: u64,
    ) -> Result<()> {
        self.check_field(name, true, false)?;
        debug!(
            "result budget for '{}': {} offset bytes, {} value bytes",
            name, budget_off, budget_val
        );
        self.budget.insert(
            name.to_owned(),
            ResultBudget {
                size_fixed: budget_off,
                size_var: budget_val,
                size_validity: 0,
            },
        );
        Ok(())
    }

    /// Sets the result budget for a fixed-sized, nullable field.
    pub fn set_result_budget_nullable(
        &mut self,
        name: &str,
        budget: u64,
        budget_validity: u64,
    ) -> Result<()> {
        self.check_field(name, false, true)?;
        self.budget.insert(
            name.to_owned(),
            ResultBudget {
                size_fixed: budget,
                size_var: 0,
                size_validity: budget_validity,
            },
        );
        Ok(())
    }

    /// Sets the result budget for a var-sized, nullable field.
    pub fn set_result_budget_var_nullable(
        &mut self,
        name: &str,
        budget_off: u64,
        budget_val: u64,
        budget_validity: u64,
    ) -> Result<()> {
        self.check_field(name, true, true)?;
        self.budget.insert(
            name.to_owned(),
            ResultBudget {
                size_fixed: budget_off,
                size_var: budget_val,
                size_validity: budget_validity,
            },
        );
        Ok(())
    }

    /// Gets the result budget of a fixed-sized, non-nullable field.
    pub fn get_result_budget(&self, name: &str) -> Result<u64> {
        self.check_field(name, false, false)?;
        let budget = self.lookup_budget(name)?;
        Ok(budget.size_fixed)
    }

    /// Gets the result budget of a var-sized, non-nullable field.
    pub fn get_result_budget_var(&self, name: &str) -> Result<(u64, u64)> {
        self.check_field(name, true, false)?;
        let budget = self.lookup_budget(name)?;
        Ok((budget.size_fixed, budget.size_var))
    }

    /// Gets the result budget of a fixed-sized, nullable field.
    pub fn get_result_budget_nullable(
        &self,
        name: &str,
    ) -> Result<(u64, u64)> {
        self.check_field(name, false, true)?;
        let budget = self.lookup_budget(name)?;
        Ok((budget.size_fixed, budget.size_validity))
    }

    /// Gets the result budget of a var-sized, nullable field.
    pub fn get_result_budget_var_nullable(
        &self,
        name: &str,
    ) -> Result<(u64, u64, u64)> {
        self.check_field(name, true, true)?;
        let budget = self.lookup_budget(name)?;
        Ok((budget.size_fixed, budget.size_var, budget.size_validity))
    }

    pub fn set_memory_budget(
        &mut self,
        budget: u64,
        budget_var: u64,
        budget_validity: u64,
    ) {
        debug!(
            "memory budget: {} fixed, {} var, {} validity",
            budget, budget_var, budget_validity
        );
        self.memory_budget = budget;
        self.memory_budget_var = budget_var;
        self.memory_budget_validity = budget_validity;
    }

    pub fn get_memory_budget(&self) -> (u64, u64, u64) {
        (
            self.memory_budget,
            self.memory_budget_var,
            self.memory_budget_validity,
        )
    }

    /// Advances to the next partition.
    ///
    /// Returns `true` when the produced partition exceeds the budget
    /// but cannot be split further; the caller typically raises its
    /// budgets and retries, or consumes the oversized partition in
    /// multiple passes. Returns `Ok(false)` without a new partition
    /// when the iteration is [done](SubarrayPartitioner::done).
    pub fn next(&mut self) -> Result<bool> {
        if self.done() {
            return Ok(false);
        }

        // drain pending splits first
        if !self.state.single_range.is_empty() {
            return self.next_from_single_range();
        }
        if !self.state.multi_range.is_empty() {
            return self.next_from_multi_range();
        }

        let found = self.compute_current_start_end()?;

        // A single over-budget range under a free-form layout splits
        // directly; ordered layouts must first calibrate to slabs.
        if !found
            && matches!(
                self.subarray.layout(),
                Layout::Unordered | Layout::GlobalOrder
            )
        {
            return self.next_from_single_range();
        }

        let must_split_slab = self.calibrate_current_start_end()?;

        if found && !must_split_slab {
            let partition =
                self.subarray.get_subarray(self.cur_start, self.cur_end)?;
            trace!(
                "partition [{}, {}] fits whole",
                self.cur_start,
                self.cur_end
            );
            self.current = Some(PartitionInfo {
                partition,
                start: self.cur_start,
                end: self.cur_end,
                split_multi_range: false,
            });
            self.state.start = self.cur_end + 1;
            return Ok(false);
        }

        self.next_from_multi_range()
    }

    /// Splits the current partition and produces a new current
    /// partition from its pieces. Typically called by the consumer
    /// when the current partition was estimated to fit but did not.
    ///
    /// # Panics
    ///
    /// Panics if no partition has been produced yet.
    pub fn split_current(&mut self) -> Result<bool> {
        let current = self
            .current
            .take()
            .expect("no current partition; call `next` first");
        trace!(
            "splitting current partition [{}, {}]",
            current.start,
            current.end
        );

        self.cur_start = current.start;
        self.cur_end = current.end;
        let multi = current.split_multi_range
            || current.end > current.start;

        // The consumer found the estimate optimistic, so the split is
        // unconditional; the drain loop alone would accept the
        // partition again.
        let mut unsplittable = false;
        if multi {
            self.state.multi_range.push(current.partition);
            self.split_top_multi_range(&mut unsplittable)?;
        } else {
            self.state.single_range.push(current.partition);
            self.split_top_single_range(&mut unsplittable)?;
        }

        if unsplittable {
            // put the partition back in the caller's hands unchanged
            let lifo = if multi {
                &mut self.state.multi_range
            } else {
                &mut self.state.single_range
            };
            let partition = lifo.pop().unwrap();
            let emptied = lifo.is_empty();
            self.current = Some(PartitionInfo {
                partition,
                start: self.cur_start,
                end: self.cur_end,
                split_multi_range: current.split_multi_range,
            });
            if emptied {
                self.state.start = self.cur_end + 1;
            }
            return Ok(true);
        }

        if multi {
            self.next_from_multi_range()
        } else {
            self.next_from_single_range()
        }
    }

    fn field(&self, name: &str) -> Result<tiledb_pod::FieldData> {
        self.subarray
            .schema()
            .field(name)
            .ok_or_else(|| {
                Error::InvalidBudget(BudgetError::UnknownField(
                    name.to_owned(),
                ))
            })
    }

    fn check_field(
        &self,
        name: &str,
        expect_var: bool,
        expect_nullable: bool,
    ) -> Result<()> {
        let field = self.field(name)?;
        match (field.is_var_sized(), expect_var) {
            (true, false) => {
                return Err(Error::InvalidBudget(
                    BudgetError::ExpectedVarSize(name.to_owned()),
                ));
            }
            (false, true) => {
                return Err(Error::InvalidBudget(
                    BudgetError::ExpectedFixedSize(name.to_owned()),
                ));
            }
            _ => {}
        }
        match (field.is_nullable(), expect_nullable) {
            (true, false) => {
                return Err(Error::InvalidBudget(
                    BudgetError::ExpectedNonNullable(name.to_owned()),
                ));
            }
            (false, true) => {
                return Err(Error::InvalidBudget(
                    BudgetError::ExpectedNullable(name.to_owned()),
                ));
            }
            _ => {}
        }
        Ok(())
    }

    fn lookup_budget(&self, name: &str) -> Result<&ResultBudget> {
        self.budget
            .get(name)
            .ok_or_else(|| Error::BudgetNotSet(name.to_owned()))
    }

    /// Expands `[state.start, cur_end]` as far as the budgets allow,
    /// doubling the growth increment while the interval fits and
    /// halving it on overflow. Returns `false` when even the single
    /// range at `state.start` does not fit.
    fn compute_current_start_end(&mut self) -> Result<bool> {
        self.cur_start = self.state.start;
        self.cur_end = self.cur_start;

        if !self.interval_fits(self.cur_start, self.cur_start)? {
            // a unary overflow may be configured away; splitting could
            // never help it anyway
            let skip_unary = self.skip_unary_partitioning_budget_check
                && self
                    .subarray
                    .nd_range(self.cur_start)?
                    .iter()
                    .all(|r| r.is_unary());
            if !skip_unary {
                trace!(
                    "range {} alone exceeds the budget",
                    self.cur_start
                );
                return Ok(false);
            }
        }

        let mut incr: u64 = 1;
        while self.cur_end < self.state.end && incr > 0 {
            let candidate = std::cmp::min(
                self.cur_end.saturating_add(incr),
                self.state.end,
            );
            if self.interval_fits(self.cur_start, candidate)? {
                self.cur_end = candidate;
                incr = incr.saturating_mul(2);
            } else {
                incr /= 2;
            }
        }
        trace!(
            "interval [{}, {}] fits the budget",
            self.cur_start,
            self.cur_end
        );
        Ok(true)
    }

    /// Calibrates `[cur_start, cur_end]` so that it covers whole
    /// slabs of the layout's fastest-varying dimension: the largest
    /// complete blocks which fit within the interval. Returns `true`
    /// when a row- or column-major interval is smaller than one slab;
    /// the interval is then widened to exactly that slab, which the
    /// multi-range path must split. An unordered interval may instead
    /// stay a single partial slab, which is still a valid ND box.
    fn calibrate_current_start_end(&mut self) -> Result<bool> {
        if self.subarray.layout() == Layout::GlobalOrder {
            // a single ND range per dimension; nothing to align
            return Ok(false);
        }
        let order = self.subarray.layout_dim_order();
        let n = order.len();
        if n == 1 {
            return Ok(false);
        }

        // range counts and start coordinates, slowest dimension first
        let counts = order
            .iter()
            .map(|&d| self.subarray.effective_range_num(d))
            .collect::<Vec<_>>();
        let coords = self.subarray.range_coords(self.cur_start)?;
        let cs = order.iter().map(|&d| coords[d]).collect::<Vec<_>>();
        let len = self.cur_end - self.cur_start + 1;

        // the number of trailing dimensions at whose base the
        // interval starts; blocks of that many dimensions can be
        // covered whole
        let mut base = 0usize;
        for i in (1..n).rev() {
            if cs[i] == 0 {
                base += 1;
            } else {
                break;
            }
        }

        let mut t = base;
        while t >= 1 {
            let block = counts[n - t..].iter().product::<u64>();
            let avail = counts[n - t - 1] - cs[n - t - 1];
            let m = std::cmp::min(len / block, avail);
            if m >= 1 {
                self.cur_end = self.cur_start + m * block - 1;
                trace!(
                    "calibrated to {} block(s) of {} ranges",
                    m,
                    block
                );
                return Ok(false);
            }
            t -= 1;
        }

        let line = counts[n - 1];
        let line_end = self.cur_start + (line - cs[n - 1]) - 1;

        if self.subarray.layout() == Layout::Unordered {
            // a single partial slab is acceptable without order
            self.cur_end = std::cmp::min(self.cur_end, line_end);
            trace!(
                "partial slab [{}, {}] under unordered layout",
                self.cur_start,
                self.cur_end
            );
            return Ok(false);
        }

        // the interval cannot cover one whole slab of the fastest
        // dimension: widen to the slab containing the start
        self.cur_end = line_end;
        trace!(
            "interval smaller than one slab; widened to [{}, {}]",
            self.cur_start,
            self.cur_end
        );
        Ok(true)
    }

    fn interval_fits(&self, start: u64, end: u64) -> Result<bool> {
        let sums =
            self.estimator
                .interval_estimate(&self.subarray, start, end)?;
        Ok(self.budgets_fit(&sums))
    }

    fn budgets_fit(&self, sums: &EstimateSet) -> bool {
        for (name, budget) in self.budget.iter() {
            let Some(estimate) = sums.get(name) else {
                continue;
            };
            if !self.skip_split_on_est_size {
                if estimate.result.size_fixed.ceil() as u64
                    > budget.size_fixed
                    || estimate.result.size_var.ceil() as u64
                        > budget.size_var
                    || estimate.result.size_validity.ceil() as u64
                        > budget.size_validity
                {
                    return false;
                }
            }
            if estimate.memory.size_fixed > self.memory_budget
                || estimate.memory.size_var > self.memory_budget_var
                || estimate.memory.size_validity
                    > self.memory_budget_validity
            {
                return false;
            }
        }
        true
    }

    /// Returns whether `partition` exceeds some budget and must be
    /// split further.
    fn must_split(&self, partition: &Subarray) -> Result<bool> {
        if self.skip_unary_partitioning_budget_check
            && partition.is_unary()
        {
            return Ok(false);
        }
        let sums = self.estimator.subarray_estimate(partition)?;
        Ok(!self.budgets_fit(&sums))
    }

    /// Produces the next partition from the single-range work list,
    /// seeding it from the current interval when empty.
    fn next_from_single_range(&mut self) -> Result<bool> {
        let mut unsplittable = false;

        if self.state.single_range.is_empty() {
            self.cur_end = self.cur_start;
            let seed = self
                .subarray
                .get_subarray(self.cur_start, self.cur_start)?;
            self.state.single_range.push(seed);
            self.split_top_single_range(&mut unsplittable)?;
        }

        loop {
            if unsplittable {
                break;
            }
            let top = self
                .state
                .single_range
                .last()
                .expect("single-range list is non-empty");
            if !self.must_split(top)? {
                break;
            }
            self.split_top_single_range(&mut unsplittable)?;
        }

        let partition = self.state.single_range.pop().unwrap();
        self.current = Some(PartitionInfo {
            partition,
            start: self.cur_start,
            end: self.cur_end,
            split_multi_range: false,
        });
        if self.state.single_range.is_empty() {
            self.state.start = self.cur_end + 1;
        }
        Ok(unsplittable)
    }

    /// Produces the next partition from the multi-range work list,
    /// seeding it from the current interval when empty.
    fn next_from_multi_range(&mut self) -> Result<bool> {
        let mut unsplittable = false;

        if self.state.multi_range.is_empty() {
            let seed = self
                .subarray
                .get_subarray(self.cur_start, self.cur_end)?;
            self.state.multi_range.push(seed);
            self.split_top_multi_range(&mut unsplittable)?;
        }

        loop {
            if unsplittable {
                break;
            }
            let top = self
                .state
                .multi_range
                .last()
                .expect("multi-range list is non-empty");
            if !self.must_split(top)? {
                break;
            }
            self.split_top_multi_range(&mut unsplittable)?;
        }

        let partition = self.state.multi_range.pop().unwrap();
        self.current = Some(PartitionInfo {
            partition,
            start: self.cur_start,
            end: self.cur_end,
            split_multi_range: true,
        });
        if self.state.multi_range.is_empty() {
            self.state.start = self.cur_end + 1;
        }
        Ok(unsplittable)
    }

    /// Splits the top of the single-range work list, or reports it
    /// unsplittable.
    fn split_top_single_range(
        &mut self,
        unsplittable: &mut bool,
    ) -> Result<()> {
        let top = self
            .state
            .single_range
            .last()
            .expect("single-range list is non-empty");

        if top.is_unary() {
            *unsplittable = true;
            return Ok(());
        }
        let Some(point) = split::single_range_splitting_point(top) else {
            *unsplittable = true;
            return Ok(());
        };

        let (r1, r2) = top.split_single(point.dim, &point.value)?;
        trace!(
            "split single range on dimension {} ({})",
            point.dim,
            if point.normal_order {
                "normal order"
            } else {
                "reverse order"
            }
        );

        self.state.single_range.pop();
        if point.normal_order {
            self.state.single_range.push(r2);
            self.state.single_range.push(r1);
        } else {
            self.state.single_range.push(r1);
            self.state.single_range.push(r2);
        }
        Ok(())
    }

    /// Splits the top of the multi-range work list, or reports it
    /// unsplittable.
    fn split_top_multi_range(
        &mut self,
        unsplittable: &mut bool,
    ) -> Result<()> {
        let top = self
            .state
            .multi_range
            .last()
            .expect("multi-range list is non-empty");

        if top.is_unary() {
            *unsplittable = true;
            return Ok(());
        }
        let Some(choice) = split::multi_range_splitting_point(top) else {
            *unsplittable = true;
            return Ok(());
        };

        let (r1, r2, normal_order) = match choice {
            MultiRangeSplit::Ranges { dim, idx } => {
                trace!(
                    "split slab after range {} of dimension {}",
                    idx,
                    dim
                );
                let (r1, r2) = top.split_multi(dim, idx)?;
                (r1, r2, true)
            }
            MultiRangeSplit::Value(point) => {
                trace!("split slab by value on dimension {}", point.dim);
                let (r1, r2) =
                    top.split_single(point.dim, &point.value)?;
                (r1, r2, point.normal_order)
            }
        };

        self.state.multi_range.pop();
        if normal_order {
            self.state.multi_range.push(r2);
            self.state.multi_range.push(r1);
        } else {
            self.state.multi_range.push(r1);
            self.state.multi_range.push(r2);
        }
        Ok(())
    }
}
