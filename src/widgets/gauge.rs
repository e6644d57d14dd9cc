/// Fixed-width bar gauge
///
/// `[█████████           ]` for 45% at width 20: filled segments are
/// `floor(p/100 * width)` clamped to the width, the rest are blank.

use ratatui::style::Color;

use crate::utils::clamp_percent;
use crate::utils::constants::{ALERT_PERCENT, WARN_PERCENT};

const FILLED: char = '█';
const BLANK: char = ' ';

/// Number of filled segments for `percent` on a gauge `width` wide
pub fn filled_segments(percent: f64, width: usize) -> usize {
    let percent = clamp_percent(percent);
    // multiply first so whole percentages land on exact segment boundaries
    let filled = (percent * width as f64 / 100.0).floor() as usize;
    filled.min(width)
}

/// Gauge text including brackets, always `width + 2` characters
pub fn bar_gauge(percent: f64, width: usize) -> String {
    let filled = filled_segments(percent, width);
    let mut gauge = String::with_capacity(width * FILLED.len_utf8() + 2);
    gauge.push('[');
    gauge.extend(std::iter::repeat(FILLED).take(filled));
    gauge.extend(std::iter::repeat(BLANK).take(width - filled));
    gauge.push(']');
    gauge
}

/// Color-coded by usage (>80% red, >60% yellow)
pub fn gauge_color(percent: f64) -> Color {
    if percent > ALERT_PERCENT {
        Color::Red
    } else if percent > WARN_PERCENT {
        Color::Yellow
    } else {
        Color::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(gauge: &str, c: char) -> usize {
        gauge.chars().filter(|&ch| ch == c).count()
    }

    #[test]
    fn test_forty_five_percent_on_twenty() {
        let gauge = bar_gauge(45.0, 20);
        assert_eq!(gauge, format!("[{}{}]", "█".repeat(9), " ".repeat(11)));
        assert_eq!(count(&gauge, FILLED), 9);
        assert_eq!(count(&gauge, BLANK), 11);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bar_gauge(0.0, 20), format!("[{}]", " ".repeat(20)));
        assert_eq!(bar_gauge(100.0, 20), format!("[{}]", "█".repeat(20)));
        assert_eq!(filled_segments(250.0, 20), 20);
        assert_eq!(filled_segments(-5.0, 20), 0);
        assert_eq!(filled_segments(f64::NAN, 20), 0);
    }

    #[test]
    fn test_length_count_and_monotonicity() {
        let width = 20;
        let mut previous = 0;
        for tenth in 0..=1000usize {
            let percent = tenth as f64 / 10.0;
            let gauge = bar_gauge(percent, width);

            assert_eq!(gauge.chars().count(), width + 2, "length at {}", percent);

            let filled = count(&gauge, FILLED);
            assert_eq!(filled, tenth * width / 1000, "fill at {}", percent);
            assert!(filled >= previous, "not monotonic at {}", percent);
            previous = filled;
        }
    }

    #[test]
    fn test_whole_percentages_hit_exact_boundaries() {
        for percent in (0..=100).step_by(5) {
            assert_eq!(filled_segments(percent as f64, 20), percent as usize / 5);
        }
    }

    #[test]
    fn test_gauge_color() {
        assert_eq!(gauge_color(10.0), Color::Green);
        assert_eq!(gauge_color(65.0), Color::Yellow);
        assert_eq!(gauge_color(95.0), Color::Red);
    }
}
