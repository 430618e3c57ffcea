//! Camera Module
//!
//! Camera state and cursor unprojection for terrain picking.
//! Window-system agnostic: only camera matrices and viewport math.

pub mod raycast;

pub use raycast::{Camera, Viewport, cursor_ray, unproject};
