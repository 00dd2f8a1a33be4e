//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering and layout
//! - `input`: Keyboard event handling
//! - `select`: Generic dropdown used for the employee filter
//! - `styles`: Color schemes and text styling

pub mod input;
pub mod render;
pub mod select;
pub mod styles;
