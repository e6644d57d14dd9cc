/// Polling defaults and rendering constants
///
/// Intervals reflect how expensive each collection call is: CPU sampling
/// is near-instant, container listing goes through the Docker socket.

use std::time::Duration;

/// Default poll interval per metric class
pub const CPU_INTERVAL: Duration = Duration::from_millis(800);
pub const MEMORY_INTERVAL: Duration = Duration::from_secs(2);
pub const SWAP_INTERVAL: Duration = Duration::from_secs(5);
pub const DISK_INTERVAL: Duration = Duration::from_secs(30);
pub const CONTAINERS_INTERVAL: Duration = Duration::from_secs(10);
pub const CONTAINER_STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Deadlines for calls that go through the Docker socket
pub const CONTAINERS_TIMEOUT: Duration = Duration::from_secs(5);
pub const CONTAINER_STATS_TIMEOUT: Duration = Duration::from_secs(5);

/// sysinfo needs two CPU refreshes at least this far apart to report usage
pub const CPU_BASELINE_DELAY: Duration = Duration::from_millis(500);

/// Bar gauge width in segments (excluding the brackets)
pub const GAUGE_WIDTH: usize = 20;

/// Metric row label column width
pub const LABEL_WIDTH: usize = 6;

/// Percentage column width, right aligned
pub const PERCENT_WIDTH: usize = 8;

/// Below this content width the byte totals column is dropped
pub const DETAIL_MIN_WIDTH: u16 = 60;

/// Container table limits
pub const SHORT_ID_LEN: usize = 10;
pub const IMAGE_MAX_LEN: usize = 18;

/// Gauge color thresholds (percent)
pub const WARN_PERCENT: f64 = 60.0;
pub const ALERT_PERCENT: f64 = 80.0;

/// Mount point sampled for disk usage when none is configured
pub const DEFAULT_DISK_PATH: &str = "/";

/// Name used for config and log directories
pub const APP_NAME: &str = "hostwatch";
