// Squad engine: state, constraint checks, builder, lineup, chips,
// transfers, result reconciliation and scoring.

pub mod builder;
pub mod chips;
pub mod context;
pub mod lineup;
pub mod position;
pub mod reconcile;
pub mod rules;
pub mod scoring;
pub mod state;
pub mod transfers;

#[cfg(test)]
pub(crate) mod test_support;
