//! # Goose Selections
//!
//! A [Goose](https://docs.rs/goose/) load test that requests a single JSON endpoint over
//! and over, confirming each response carries a non-empty `selections` list, and writes
//! a small custom report when the load test ends.
//!
//! Goose owns everything about generating load: launching users, hatch rate, run time,
//! the HTTP client and its own request metrics. This crate adds the pieces Goose can't
//! know about:
//!
//!  - [`config`]: environment driven settings and the headers sent with each request.
//!  - [`validator`]: decides whether one response is a success, and why not.
//!  - [`aggregator`]: counters shared by every [`GooseUser`](goose::goose::GooseUser).
//!  - [`report`]: the JSON report and Markdown summary written at the end of the run.
//!  - [`transaction`]: the Goose [`Scenario`](goose::goose::Scenario) tying it together.
//!
//! ## Running the load test
//!
//! Settings specific to this load test are read from the environment, while all
//! Goose run-time options are passed on the command line as usual:
//!
//! ```bash
//! $ TARGET_PATH=/api/selections AUTH_HEADER="Bearer abc" WAIT_S=0.5 \
//!     cargo run --release -- --host https://staging.example.com -u 20 -r 5 -t 2m -v
//! ```
//!
//! | Variable | Meaning | Default |
//! | -------- | ------- | ------- |
//! | `TARGET_PATH` | path to request | `/` |
//! | `REQUEST_TIMEOUT_S` | per-request timeout in seconds | `30` |
//! | `AUTH_HEADER` | value of the `Authorization` header | not sent |
//! | `WAIT_S` | fixed pause between iterations of each user, in seconds | `0` |
//! | `REPORT_PATH` | where to write the JSON report | `locust-custom-report.json` |
//! | `REPORT_MD_PATH` | where to write a Markdown summary | not written |
//! | `MIN_SELECTION_RATE` | fail the run if the selection rate ends up below this fraction | no threshold |
//!
//! ## Using the library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use goose::prelude::*;
//! use goose_selections::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SelectionsError> {
//!     let config = Config::from_env()?;
//!     let aggregator = Arc::new(RunAggregator::new(&config.target_path));
//!
//!     GooseAttack::initialize()?
//!         .register_scenario(selections_scenario(&config, &aggregator)?)
//!         .test_start(settings_transaction(&config))
//!         .execute()
//!         .await?;
//!
//!     let report = aggregator.finalize_report_with_threshold(config.min_selection_rate);
//!     report.publish(&config, &mut std::io::stdout()).await;
//!     report.check_threshold()
//! }
//! ```
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! <http://www.apache.org/licenses/LICENSE-2.0>
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

pub mod aggregator;
pub mod config;
pub mod prelude;
pub mod report;
pub mod transaction;
pub mod validator;

use goose::GooseError;
use std::{error, fmt, io};

/// An enumeration of all errors a load test built from this crate can return.
#[derive(Debug)]
pub enum SelectionsError {
    /// Wraps a [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    Io(io::Error),
    /// Wraps a [`serde_json::Error`](https://docs.rs/serde_json/*/serde_json/struct.Error.html).
    Json(serde_json::Error),
    /// Wraps a [`GooseError`](https://docs.rs/goose/*/goose/enum.GooseError.html).
    Goose(GooseError),
    /// Invalid environment option or value specified.
    InvalidOption {
        /// The environment variable that caused this error.
        option: String,
        /// The invalid value that caused this error.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// The load test finished with a selection rate below the configured minimum.
    ThresholdNotMet {
        /// The configured minimum selection rate.
        expected: f64,
        /// The selection rate actually observed.
        observed: f64,
    },
}

/// Implement a helper to provide a text description of all possible types of errors.
impl SelectionsError {
    fn describe(&self) -> &str {
        match *self {
            SelectionsError::Io(_) => "io::Error",
            SelectionsError::Json(_) => "serde_json::Error",
            SelectionsError::Goose(_) => "goose::GooseError",
            SelectionsError::InvalidOption { .. } => "invalid option or value specified",
            SelectionsError::ThresholdNotMet { .. } => "selection rate threshold not met",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for SelectionsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SelectionsError::Io(ref source) => {
                write!(f, "SelectionsError: {} ({})", self.describe(), source)
            }
            SelectionsError::Json(ref source) => {
                write!(f, "SelectionsError: {} ({})", self.describe(), source)
            }
            SelectionsError::Goose(ref source) => {
                write!(f, "SelectionsError: {} ({})", self.describe(), source)
            }
            SelectionsError::InvalidOption {
                ref option,
                ref value,
                ref detail,
            } => write!(
                f,
                "SelectionsError: {} ({}={:?}): {}",
                self.describe(),
                option,
                value,
                detail
            ),
            SelectionsError::ThresholdNotMet { expected, observed } => write!(
                f,
                "SelectionsError: {} (expected >= {:.4}, observed {:.4})",
                self.describe(),
                expected,
                observed
            ),
        }
    }
}

// Define the lower level source of this error, if any.
impl error::Error for SelectionsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            SelectionsError::Io(ref source) => Some(source),
            SelectionsError::Json(ref source) => Some(source),
            SelectionsError::Goose(ref source) => Some(source),
            _ => None,
        }
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for SelectionsError {
    fn from(err: io::Error) -> SelectionsError {
        SelectionsError::Io(err)
    }
}

/// Auto-convert serde_json errors.
impl From<serde_json::Error> for SelectionsError {
    fn from(err: serde_json::Error) -> SelectionsError {
        SelectionsError::Json(err)
    }
}

/// Auto-convert Goose errors.
impl From<GooseError> for SelectionsError {
    fn from(err: GooseError) -> SelectionsError {
        SelectionsError::Goose(err)
    }
}
