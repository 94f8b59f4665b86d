pub mod deinterleave;
pub mod gate_data;

pub use deinterleave::GateDeinterleaver;
pub use gate_data::{ChannelSeries, GateData, GateStore};
