use crate::prelude::Channel;
use num_complex::Complex32;

/// Time series for one logical channel at one gate.
#[derive(Debug, Clone, Default)]
pub struct ChannelSeries {
    pub full: Vec<Complex32>,
    /// Short-PRT samples; empty unless the beam is staggered.
    pub prt_short: Vec<Complex32>,
    /// Long-PRT samples; empty unless the beam is staggered.
    pub prt_long: Vec<Complex32>,
}

impl ChannelSeries {
    fn reset(&mut self, len: usize, split_len: usize) {
        for (series, target) in [
            (&mut self.full, len),
            (&mut self.prt_short, split_len),
            (&mut self.prt_long, split_len),
        ] {
            series.clear();
            series.resize(target, Complex32::default());
        }
    }

    pub fn is_zero(&self) -> bool {
        self.full
            .iter()
            .chain(&self.prt_short)
            .chain(&self.prt_long)
            .all(|sample| sample.re == 0.0 && sample.im == 0.0)
    }
}

/// De-interleaved series for every channel at one gate.
#[derive(Debug, Clone, Default)]
pub struct GateData {
    pub hc: ChannelSeries,
    pub vc: ChannelSeries,
    pub hx: ChannelSeries,
    pub vx: ChannelSeries,
}

impl GateData {
    pub fn channel(&self, channel: Channel) -> &ChannelSeries {
        match channel {
            Channel::Hc => &self.hc,
            Channel::Vc => &self.vc,
            Channel::Hx => &self.hx,
            Channel::Vx => &self.vx,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSeries {
        match channel {
            Channel::Hc => &mut self.hc,
            Channel::Vc => &mut self.vc,
            Channel::Hx => &mut self.hx,
            Channel::Vx => &mut self.vx,
        }
    }

    fn reset(&mut self, len: usize, split_len: usize) {
        self.hc.reset(len, split_len);
        self.vc.reset(len, split_len);
        self.hx.reset(len, split_len);
        self.vx.reset(len, split_len);
    }
}

/// Gate buffers reused from beam to beam. Grows to the largest gate count
/// seen and never shrinks.
#[derive(Debug, Default)]
pub struct GateStore {
    gates: Vec<GateData>,
    active: usize,
}

impl GateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroed buffers for `n_gates` gates with series of `len` samples and,
    /// for staggered beams, short/long series of `split_len` samples.
    pub fn prepare(&mut self, n_gates: usize, len: usize, split_len: usize) -> &mut [GateData] {
        if self.gates.len() < n_gates {
            self.gates.resize_with(n_gates, GateData::default);
        }
        for gate in &mut self.gates[..n_gates] {
            gate.reset(len, split_len);
        }
        self.active = n_gates;
        &mut self.gates[..n_gates]
    }

    pub fn gates(&self) -> &[GateData] {
        &self.gates[..self.active]
    }

    /// Allocated gates, including those beyond the current beam.
    pub fn capacity(&self) -> usize {
        self.gates.len()
    }
}
