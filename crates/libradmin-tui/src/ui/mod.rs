//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, navigation and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `views`: Per-route content rendering

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
