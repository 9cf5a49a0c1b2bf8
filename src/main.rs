//! Load test a JSON endpoint, confirming each response carries non-empty selections.
//!
//! Settings specific to this load test come from the environment (see the library
//! documentation), all Goose options from the command line:
//!
//! ```bash
//! TARGET_PATH=/api/selections cargo run --release -- --host http://localhost:8080 -u 10 -t 1m
//! ```

use goose::prelude::*;
use goose_selections::prelude::*;
use std::io;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), SelectionsError> {
    let config = Config::from_env()?;
    let aggregator = Arc::new(RunAggregator::new(&config.target_path));

    GooseAttack::initialize()?
        .register_scenario(selections_scenario(&config, &aggregator)?)
        .test_start(settings_transaction(&config))
        .execute()
        .await?;

    // All users have stopped, the counters no longer change.
    let report = aggregator.finalize_report_with_threshold(config.min_selection_rate);
    report.publish(&config, &mut io::stdout()).await;

    report.check_threshold()
}
