//! Image processing operators for the preprocessing pipeline.
//!
//! The enhancement engine lives here: color-space conversions, contrast
//! correction (global histogram equalization and CLAHE), white-balance
//! correction, and the [`enhance`] entry point that runs the stages in order.

pub mod colorspace;
pub mod contrast;
pub mod enhance;
pub mod white_balance;

pub use contrast::{equalize_histogram, Clahe};
pub use enhance::enhance;
pub use white_balance::correct_white_balance;
