//! The Goose [`Scenario`] and [`Transaction`] driving the load test.
//!
//! Goose decides when each [`GooseUser`] runs the transaction; every run makes one
//! request, validates the response, and records the outcome in the shared
//! [`RunAggregator`]. Responses that aren't a success are also flagged as failures in
//! Goose's own metrics through
//! [`GooseUser::set_failure`](goose::goose::GooseUser::set_failure).

use goose::prelude::*;
use log::{debug, info};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregator::RunAggregator;
use crate::config::Config;
use crate::validator::{validate, Verdict};
use crate::SelectionsError;

/// The name of the scenario, as shown in Goose metrics.
pub const SCENARIO_NAME: &str = "SelectionsUser";

/// Everything one transaction run needs, shared by all users.
#[derive(Debug)]
pub struct SelectionsCheck {
    path: String,
    headers: HeaderMap,
    timeout: Duration,
    aggregator: Arc<RunAggregator>,
}

impl SelectionsCheck {
    pub fn new(
        config: &Config,
        aggregator: &Arc<RunAggregator>,
    ) -> Result<SelectionsCheck, SelectionsError> {
        Ok(SelectionsCheck {
            path: config.target_path.clone(),
            headers: config.request_headers()?,
            timeout: config.request_timeout,
            aggregator: Arc::clone(aggregator),
        })
    }

    /// Make one request and validate the response.
    ///
    /// Requests that never produce a response (connection errors, timeouts, or a body
    /// that can't be read) are left to Goose and aren't recorded in the aggregator.
    pub async fn run(&self, user: &mut GooseUser) -> TransactionResult {
        let request_builder = user
            .get_request_builder(&GooseMethod::Get, &self.path)?
            .headers(self.headers.clone())
            .timeout(self.timeout);
        let goose_request = GooseRequest::builder()
            .set_request_builder(request_builder)
            .build();

        let started = Instant::now();
        let mut goose = user.request(goose_request).await?;

        let response = match goose.response {
            Ok(response) => response,
            Err(e) => {
                return user.set_failure(
                    &format!("{}: no response from server: {}", goose.request.raw.url, e),
                    &mut goose.request,
                    None,
                    None,
                );
            }
        };

        let status_code = response.status().as_u16();
        // Copy the headers so we have them for logging if there are errors.
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return user.set_failure(
                    &format!("{}: failed to read response body: {}", goose.request.raw.url, e),
                    &mut goose.request,
                    Some(&headers),
                    None,
                );
            }
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;

        let verdict = validate(status_code, &body);
        self.aggregator.record_request(latency_ms, &verdict);

        match verdict {
            Verdict::Success => Ok(()),
            Verdict::Failure(failure) => {
                debug!(
                    "unexpected response: status={} duration={:.2}ms reason={}",
                    status_code, latency_ms, failure
                );
                user.set_failure(
                    &failure.to_string(),
                    &mut goose.request,
                    Some(&headers),
                    Some(&body),
                )
            }
        }
    }
}

/// Build the load test's only transaction. It's named after the requested path, which
/// Goose also uses to name the request in its metrics, for example `GET /api/selections`.
pub fn selections_transaction(check: Arc<SelectionsCheck>) -> Transaction {
    let name = check.path.clone();
    let closure: TransactionFunction = Arc::new(move |user| {
        let check = Arc::clone(&check);
        Box::pin(async move { check.run(user).await })
    });

    Transaction::new(closure).set_name(&name)
}

/// Build a transaction that logs the load test's settings, for
/// [`GooseAttack::test_start`]. Goose only sets up logging once the load test starts, so
/// anything logged while loading the configuration would be lost.
pub fn settings_transaction(config: &Config) -> Transaction {
    let settings = Arc::new(config.settings());
    let closure: TransactionFunction = Arc::new(move |_user| {
        let settings = Arc::clone(&settings);
        Box::pin(async move {
            for (name, value) in settings.iter() {
                info!("{} = {}", name, value);
            }
            Ok(())
        })
    });

    Transaction::new(closure).set_name("settings")
}

/// Build the scenario every [`GooseUser`] runs: the selections transaction, repeated
/// with a fixed pause of `config.wait_time` between iterations.
pub fn selections_scenario(
    config: &Config,
    aggregator: &Arc<RunAggregator>,
) -> Result<Scenario, SelectionsError> {
    let check = Arc::new(SelectionsCheck::new(config, aggregator)?);
    let mut scenario = scenario!(SCENARIO_NAME);
    if !config.wait_time.is_zero() {
        scenario = scenario.set_wait_time(config.wait_time, config.wait_time)?;
    }

    Ok(scenario.register_transaction(selections_transaction(check)))
}
