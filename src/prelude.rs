pub use crate::aggregator::RunAggregator;
pub use crate::config::Config;
pub use crate::report::Report;
pub use crate::transaction::{
    selections_scenario, selections_transaction, settings_transaction, SelectionsCheck,
};
pub use crate::validator::{validate, Failure, SelectionsField, Verdict};
pub use crate::SelectionsError;
