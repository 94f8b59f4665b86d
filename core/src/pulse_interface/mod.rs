pub mod ops;
pub mod pulse;
pub mod source;

pub use ops::{Calibration, ChannelCalib, OpsInfo};
pub use pulse::{Pulse, ScanMode};
pub use source::{write_pulse_stream, JsonLinesPulseSource, PulseSource, VecPulseSource};
