// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fwrs-engine: the Launchpad (the only component permitted to write
//! task/launch/workflow state), the Rocket worker-loop, the Rapidfire
//! driver, and the dynamic-dispatch task registry.

pub mod config;
pub mod error;
pub mod launchpad;
pub mod rapidfire;
pub mod registry;
pub mod rocket;

pub use config::LaunchpadConfig;
pub use error::{LaunchpadError, RocketError, TaskError};
pub use launchpad::{Launchpad, LostRunsReport, MaintenanceReport};
pub use rapidfire::{Rapidfire, RapidfireConfig, RapidfireReport, INFINITE, UNTIL_EMPTY};
pub use registry::{TaskContext, TaskHandler, TaskRegistry};
pub use rocket::{Rocket, RocketOutcome};
