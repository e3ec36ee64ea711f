//! Counter domain - the fast, TTL-bounded store shared by rate limiting and
//! usage metering

mod store;

pub use store::{CounterStore, WindowOutcome};

#[cfg(test)]
pub use store::MockCounterStore;
