use std::sync::atomic::{AtomicU64, Ordering};

/// Request units charged per KiB of serialized document.
const UNITS_PER_KIB: u64 = 1;

/// Budget settings applied to every trigger invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BudgetPolicy {
    /// Request units available to one invocation.
    pub request_units: u64,
    /// Fixed units charged for every document create.
    pub create_base_charge: u64,
}

impl BudgetPolicy {
    pub const fn new(request_units: u64, create_base_charge: u64) -> Self {
        Self {
            request_units,
            create_base_charge,
        }
    }

    /// A fresh budget for one invocation.
    pub fn budget(&self) -> RequestBudget {
        RequestBudget::new(self.request_units, self.create_base_charge)
    }
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self::new(1_000, 5)
    }
}

/// Request-unit budget of a single trigger invocation (admission control).
///
/// A write that the remaining units cannot cover is not admitted; nothing is
/// charged for it.
#[derive(Debug)]
pub struct RequestBudget {
    limit: u64,
    remaining: AtomicU64,
    create_base_charge: u64,
}

impl RequestBudget {
    pub fn new(limit: u64, create_base_charge: u64) -> Self {
        Self {
            limit,
            remaining: AtomicU64::new(limit),
            create_base_charge,
        }
    }

    /// Units a create of `bytes` serialized bytes costs.
    pub fn create_charge(&self, bytes: usize) -> u64 {
        let kib = (bytes as u64).div_ceil(1024);
        self.create_base_charge
            .saturating_add(kib.saturating_mul(UNITS_PER_KIB))
    }

    /// Take `units` from the budget if they are all available.
    pub fn try_charge(&self, units: u64) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(units))
            .is_ok()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn consumed(&self) -> u64 {
        self.limit - self.remaining()
    }
}
