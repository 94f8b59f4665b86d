pub mod fft;
pub mod matrix;
pub mod stats;
pub mod window;

pub use fft::FftHelper;
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
pub use window::{apply_window, create_window};
