// Widgets shared by the sub-displays
//
// Rows are plain ratatui `Line`s so each sub-display can be rendered into
// any block width and inspected as text in tests.
pub mod gauge;

pub use gauge::{bar_gauge, filled_segments, gauge_color};
