/// Helper utilities for formatting dashboard values

use ratatui::style::Color;

/// Format bytes to human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Whole gibibytes, rounded down
pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / 1024 / 1024 / 1024
}

/// Truncate string with ellipsis, counting characters rather than bytes
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// First `len` characters of a container id
pub fn short_id(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}

/// Clamp a percentage into [0, 100], mapping NaN to 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Percent of `part` in `total`, 0 when total is 0
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        clamp_percent(part as f64 / total as f64 * 100.0)
    }
}

/// Parse Docker container state to simplified state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    Paused,
    Restarting,
    Dead,
    Unknown,
}

impl From<&str> for ContainerState {
    fn from(status: &str) -> Self {
        let status_lower = status.to_lowercase();
        if status_lower.contains("up") || status_lower.contains("running") {
            ContainerState::Running
        } else if status_lower.contains("paused") {
            ContainerState::Paused
        } else if status_lower.contains("restarting") {
            ContainerState::Restarting
        } else if status_lower.contains("dead") || status_lower.contains("removing") {
            ContainerState::Dead
        } else if status_lower.contains("exited") || status_lower.contains("stopped") || status_lower.contains("created") {
            ContainerState::Stopped
        } else {
            ContainerState::Unknown
        }
    }
}

impl ContainerState {
    /// Get color for terminal display
    pub fn color(&self) -> Color {
        match self {
            ContainerState::Running => Color::Green,
            ContainerState::Stopped => Color::Gray,
            ContainerState::Paused => Color::Yellow,
            ContainerState::Restarting => Color::Cyan,
            ContainerState::Dead => Color::Red,
            ContainerState::Unknown => Color::White,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(16 * 1024 * 1024 * 1024 + 5), 16);
        assert_eq!(bytes_to_gb(1023), 0);
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("nginx:latest", 18), "nginx:latest");
        assert_eq!(truncate_string("exactly-eighteen-c", 18), "exactly-eighteen-c");
        assert_eq!(
            truncate_string("ghcr.io/example/very-long-image:1.2.3", 18),
            "ghcr.io/example..."
        );
        assert_eq!(truncate_string("ééééééééééééééééééééé", 18).chars().count(), 18);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef", 10), "0123456789");
        assert_eq!(short_id("abc", 10), "abc");
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(clamp_percent(120.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(percent_of(1, 4), 25.0);
        assert_eq!(percent_of(5, 0), 0.0);
    }

    #[test]
    fn test_container_state() {
        assert_eq!(ContainerState::from("running"), ContainerState::Running);
        assert_eq!(ContainerState::from("exited"), ContainerState::Stopped);
        assert_eq!(ContainerState::from("created"), ContainerState::Stopped);
        assert_eq!(ContainerState::from("paused"), ContainerState::Paused);
        assert_eq!(ContainerState::from("removing"), ContainerState::Dead);
        assert_eq!(ContainerState::Running.color(), Color::Green);
    }
}
