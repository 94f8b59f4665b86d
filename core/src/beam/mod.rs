//! Pulse queue to beam pipeline: scan-type tracking, polarization and
//! staggered-PRT detection, indexed beam triggering and beam assembly.

pub mod assembler;
pub mod beam_data;
pub mod polarization;
pub mod queue;
pub mod reader;
pub mod scan;
pub mod trigger;

pub use assembler::BeamAssembler;
pub use beam_data::Beam;
pub use polarization::{ModeDetection, PolarizationMode, PolarizationModeDetector, StaggeredPrt};
pub use queue::{Eviction, PulseQueue};
pub use reader::BeamReader;
pub use scan::ScanModeDetector;
pub use trigger::{condition_az, condition_el, BeamTrigger, TriggerCandidate};
