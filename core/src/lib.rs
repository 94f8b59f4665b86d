//! Beam assembly and spectral moments for polarimetric radar time series.
//!
//! Pulses flow from a `PulseSource` through the `BeamReader`, which detects
//! the polarization pattern and fires beams on indexed angles. Each beam is
//! split into per-gate series by the `GateDeinterleaver` and handed to the
//! `SpectralMomentEngine`.

pub mod beam;
pub mod gate;
pub mod math;
pub mod prelude;
pub mod pulse_interface;
pub mod spectra;
pub mod telemetry;

pub use beam::{Beam, BeamReader};
pub use gate::GateDeinterleaver;
pub use prelude::{BeamConfig, BeamError, BeamResult};
pub use spectra::SpectralMomentEngine;
