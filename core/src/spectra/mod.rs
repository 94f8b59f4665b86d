pub mod dsp;
pub mod engine;
pub mod moments;
pub mod record;
pub mod staggered;

pub use dsp::{DspBackend, FilterResult, FilterSettings, FilterSummary, RegressionResult, RustFftBackend};
pub use engine::{BeamSpectra, ChannelSpectra, GateSpectra, SpectralMomentEngine};
pub use moments::{GateMoments, MomentsContext, StaggeredContext};
pub use record::{Region, SpectraRecord};
