//! Shared constants for the engine

use std::time::Duration;

/// How long a collector's cached payload is served without re-fetching
pub const COLLECTOR_CACHE_TTL: Duration = Duration::from_secs(5);

/// Upper bound on a single upstream fetch, enforced around every collector call
pub const COLLECTOR_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of fetch attempts remembered per collector for diagnostics
pub const FETCH_LOG_CAPACITY: usize = 50;

/// Granularity of the hold loop; bounds how long a stop request waits
pub const SCHEDULER_TICK: Duration = Duration::from_millis(100);

/// Pause before retrying when the slide list is empty
pub const EMPTY_CONFIG_BACKOFF: Duration = Duration::from_secs(5);

/// Pause before retrying after a pass-level failure
pub const PASS_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Pause after a pass in which no slide was shown, to avoid spinning
pub const IDLE_PASS_BACKOFF: Duration = Duration::from_secs(1);

/// How often the snapshot timestamp is touched while a slide is held
pub const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

/// Default output resolution of the physical display
pub const DISPLAY_WIDTH: u32 = 320;
pub const DISPLAY_HEIGHT: u32 = 280;
