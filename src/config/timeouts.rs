// ABOUTME: Timeout settings for remote operations.
// ABOUTME: Durations are written as humantime strings such as "10s" or "1m".

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect", with = "humantime_serde")]
    pub connect: Duration,

    #[serde(default = "default_call", with = "humantime_serde")]
    pub call: Duration,
}

fn default_connect() -> Duration {
    Duration::from_secs(10)
}

fn default_call() -> Duration {
    Duration::from_secs(30)
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            connect: default_connect(),
            call: default_call(),
        }
    }
}
