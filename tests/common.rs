use gumdrop::Options;
use httpmock::MockServer;
use std::sync::Arc;

use goose::config::GooseConfiguration;
use goose::metrics::GooseMetrics;
use goose::GooseAttack;
use goose_selections::prelude::*;

/// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
/// compiler warnings during testing.

/// The following options are configured by default, if not set to a custom value:
///  --host <mock-server>
///  --users 1
///  --hatch-rate 1
///  --run-time 1 (only if --iterations isn't set)
#[allow(dead_code)]
pub fn build_configuration(server: &MockServer, custom: Vec<&str>) -> GooseConfiguration {
    // Start with an empty configuration.
    let mut configuration: Vec<&str> = vec![];
    // Declare server_url here no matter what, so its lifetime is sufficient when needed.
    let server_url = server.base_url();

    // Merge in all custom options first.
    configuration.extend_from_slice(&custom);

    // Default to using mock server if not otherwise configured.
    if !configuration.contains(&"--host") {
        configuration.extend_from_slice(&["--host", &server_url]);
    }

    // Default to testing with 1 user if not otherwise configured.
    if !configuration.contains(&"--users") {
        configuration.extend_from_slice(&["--users", "1"]);
    }

    // Default to hatch 1 user per second if not otherwise configured.
    if !configuration.contains(&"--hatch-rate") {
        configuration.extend_from_slice(&["--hatch-rate", "1"]);
    }

    // Default to running for 1 second if neither a run time nor iterations are configured.
    if !configuration.contains(&"--run-time") && !configuration.contains(&"--iterations") {
        configuration.extend_from_slice(&["--run-time", "1"]);
    }

    // Parse these options to generate a GooseConfiguration.
    GooseConfiguration::parse_args_default(&configuration)
        .expect("failed to parse options and generate a configuration")
}

/// Create a GooseAttack running the selections scenario, recording into `aggregator`.
/// The settings are logged when the load test starts, as the binary does.
#[allow(dead_code)]
pub fn build_load_test(
    configuration: GooseConfiguration,
    config: &Config,
    aggregator: &Arc<RunAggregator>,
) -> GooseAttack {
    GooseAttack::initialize_with_config(configuration)
        .unwrap()
        .register_scenario(selections_scenario(config, aggregator).unwrap())
        .test_start(settings_transaction(config))
}

/// Run the actual load test, returning the GooseMetrics.
#[allow(dead_code)]
pub async fn run_load_test(goose_attack: GooseAttack) -> GooseMetrics {
    goose_attack.execute().await.unwrap()
}

/// Helper to delete test artifacts, if existing.
#[allow(dead_code)]
pub fn cleanup_files(files: Vec<&str>) {
    for file in files {
        if std::path::Path::new(file).exists() {
            std::fs::remove_file(file).expect("failed to remove file");
        }
    }
}
