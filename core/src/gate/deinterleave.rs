use crate::beam::Beam;
use crate::gate::gate_data::{GateData, GateStore};
use crate::prelude::{Channel, XmitRcvMode};
use num_complex::Complex32;

/// Logical channels that receive channel 0 and channel 1 of pulse `index`.
fn routing(mode: XmitRcvMode, index: usize) -> [Option<Channel>; 2] {
    let even = index % 2 == 0;
    match mode {
        XmitRcvMode::SinglePol => [Some(Channel::Hc), None],
        XmitRcvMode::AltHvCoOnly => {
            if even {
                [Some(Channel::Hc), None]
            } else {
                [Some(Channel::Vc), None]
            }
        }
        XmitRcvMode::AltHvCoCross => {
            if even {
                [Some(Channel::Hc), Some(Channel::Vx)]
            } else {
                [Some(Channel::Vc), Some(Channel::Hx)]
            }
        }
        XmitRcvMode::AltHvFixedHv => {
            if even {
                [Some(Channel::Hc), Some(Channel::Hx)]
            } else {
                [Some(Channel::Vx), Some(Channel::Vc)]
            }
        }
        XmitRcvMode::SimHvFixedHv => [Some(Channel::Hc), Some(Channel::Vc)],
        XmitRcvMode::SimHvSwitchedHv => {
            if even {
                [Some(Channel::Hc), Some(Channel::Vc)]
            } else {
                [Some(Channel::Vc), Some(Channel::Hc)]
            }
        }
        XmitRcvMode::HOnlyFixedHv => [Some(Channel::Hc), Some(Channel::Vx)],
        XmitRcvMode::VOnlyFixedHv => [Some(Channel::Hx), Some(Channel::Vc)],
    }
}

fn sample(chan: &[Complex32], gate: usize) -> Complex32 {
    chan.get(gate).copied().unwrap_or_default()
}

/// Splits a beam's raw per-pulse channels into per-gate series for each
/// logical polarization channel.
pub struct GateDeinterleaver {
    mode: XmitRcvMode,
    store: GateStore,
}

impl GateDeinterleaver {
    pub fn new(mode: XmitRcvMode) -> Self {
        Self {
            mode,
            store: GateStore::new(),
        }
    }

    pub fn mode(&self) -> XmitRcvMode {
        self.mode
    }

    /// Mode actually applied to the beam.
    pub fn effective_mode(&self, beam: &Beam) -> XmitRcvMode {
        if beam.staggered().is_some() {
            self.mode.staggered_equivalent()
        } else {
            self.mode
        }
    }

    pub fn gates(&self) -> &[GateData] {
        self.store.gates()
    }

    /// Fills the gate buffers from the beam. Channels with no source
    /// data are left zero.
    pub fn load(&mut self, beam: &Beam) -> &[GateData] {
        let mode = self.effective_mode(beam);
        let n_samples = beam.n_samples();
        let chan0 = beam.chan0();
        let chan1 = beam.chan1();

        match beam.staggered() {
            Some(stag) => {
                let n_gates_short = stag.n_gates_short;
                let n_gates_long = stag.n_gates_long;
                let gates = self.store.prepare(beam.n_gates, n_samples, n_samples / 2);
                for (gate_index, gate) in gates.iter_mut().enumerate() {
                    let in_short = gate_index < n_gates_short;
                    let in_long = gate_index < n_gates_long;
                    for index in 0..n_samples {
                        let values = [
                            Some(sample(chan0[index], gate_index)),
                            chan1.as_ref().map(|chan| sample(chan[index], gate_index)),
                        ];
                        for (target, value) in routing(mode, index).iter().zip(values) {
                            let (channel, value) = match (target, value) {
                                (Some(channel), Some(value)) => (*channel, value),
                                _ => continue,
                            };
                            let series = gate.channel_mut(channel);
                            if in_short {
                                series.full[index] = value;
                                if index % 2 == 0 {
                                    series.prt_short[index / 2] = value;
                                }
                            }
                            if in_long && index % 2 == 1 {
                                series.prt_long[index / 2] = value;
                            }
                        }
                    }
                }
            }
            None => {
                let alternating = mode.is_alternating();
                let gates = self
                    .store
                    .prepare(beam.n_gates, mode.series_len(n_samples), 0);
                for (gate_index, gate) in gates.iter_mut().enumerate() {
                    for index in 0..n_samples {
                        let values = [
                            Some(sample(chan0[index], gate_index)),
                            chan1.as_ref().map(|chan| sample(chan[index], gate_index)),
                        ];
                        let slot = if alternating { index / 2 } else { index };
                        for (target, value) in routing(mode, index).iter().zip(values) {
                            if let (Some(channel), Some(value)) = (target, value) {
                                if let Some(entry) = gate.channel_mut(*channel).full.get_mut(slot) {
                                    *entry = value;
                                }
                            }
                        }
                    }
                }
            }
        }
        self.store.gates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beam::{PolarizationMode, StaggeredPrt};
    use crate::prelude::ScanType;
    use crate::pulse_interface::{OpsInfo, Pulse};
    use std::sync::Arc;

    /// Sample value encodes pulse index, gate and channel.
    fn value(index: usize, gate: usize, chan: usize) -> Complex32 {
        Complex32::new(index as f32 + 1.0, (gate + 100 * chan) as f32)
    }

    fn pulses(n_samples: usize, n_channels: usize, gates_for: impl Fn(usize) -> usize) -> Vec<Arc<Pulse>> {
        (0..n_samples)
            .map(|index| {
                let n_gates = gates_for(index);
                let channels = (0..n_channels)
                    .map(|chan| (0..n_gates).map(|gate| value(index, gate, chan)).collect())
                    .collect();
                Arc::new(Pulse::new(
                    index as u64,
                    index as f64,
                    0.0,
                    0.0,
                    0.001,
                    index % 2 == 0,
                    channels,
                ))
            })
            .collect()
    }

    fn beam(pulses: Vec<Arc<Pulse>>, mode: PolarizationMode, n_gates: usize) -> Beam {
        Beam::new(
            pulses,
            Arc::new(OpsInfo::default()),
            ScanType::Ppi,
            0.0,
            0.0,
            mode,
            0.001,
            n_gates,
            26.75,
            true,
            false,
        )
    }

    #[test]
    fn single_pol_reproduces_channel_zero() {
        let beam = beam(pulses(8, 1, |_| 5), PolarizationMode::SinglePol, 5);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::SinglePol);
        let gates = deinterleaver.load(&beam);
        assert_eq!(gates.len(), 5);
        for (gate_index, gate) in gates.iter().enumerate() {
            let expected: Vec<Complex32> = (0..8).map(|index| value(index, gate_index, 0)).collect();
            assert_eq!(gate.hc.full, expected);
            assert!(gate.vc.is_zero());
        }
    }

    #[test]
    fn missing_chan1_leaves_cross_channels_zero() {
        let beam = beam(pulses(8, 1, |_| 3), PolarizationMode::AlternatingHv, 3);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::AltHvCoCross);
        let gates = deinterleaver.load(&beam);
        assert_eq!(gates[1].hc.full.len(), 4);
        assert_eq!(gates[1].hc.full[2], value(4, 1, 0));
        assert_eq!(gates[1].vc.full[2], value(5, 1, 0));
        assert!(gates[1].hx.is_zero());
        assert!(gates[1].vx.is_zero());
    }

    #[test]
    fn alternating_co_cross_routes_receivers() {
        let beam = beam(pulses(8, 2, |_| 2), PolarizationMode::AlternatingHv, 2);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::AltHvCoCross);
        let gate = &deinterleaver.load(&beam)[0];
        for k in 0..4 {
            assert_eq!(gate.hc.full[k], value(2 * k, 0, 0));
            assert_eq!(gate.vx.full[k], value(2 * k, 0, 1));
            assert_eq!(gate.vc.full[k], value(2 * k + 1, 0, 0));
            assert_eq!(gate.hx.full[k], value(2 * k + 1, 0, 1));
        }
    }

    #[test]
    fn alternating_fixed_receivers() {
        let beam = beam(pulses(4, 2, |_| 1), PolarizationMode::AlternatingHv, 1);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::AltHvFixedHv);
        let gate = &deinterleaver.load(&beam)[0];
        assert_eq!(gate.hc.full, vec![value(0, 0, 0), value(2, 0, 0)]);
        assert_eq!(gate.hx.full, vec![value(0, 0, 1), value(2, 0, 1)]);
        assert_eq!(gate.vx.full, vec![value(1, 0, 0), value(3, 0, 0)]);
        assert_eq!(gate.vc.full, vec![value(1, 0, 1), value(3, 0, 1)]);
    }

    #[test]
    fn switched_receivers_swap_on_odd_pulses() {
        let beam = beam(pulses(4, 2, |_| 1), PolarizationMode::SinglePol, 1);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::SimHvSwitchedHv);
        let gate = &deinterleaver.load(&beam)[0];
        assert_eq!(gate.hc.full[0], value(0, 0, 0));
        assert_eq!(gate.vc.full[0], value(0, 0, 1));
        assert_eq!(gate.vc.full[1], value(1, 0, 0));
        assert_eq!(gate.hc.full[1], value(1, 0, 1));
    }

    #[test]
    fn v_only_fills_hx_and_vc() {
        let beam = beam(pulses(4, 2, |_| 1), PolarizationMode::SinglePol, 1);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::VOnlyFixedHv);
        let gate = &deinterleaver.load(&beam)[0];
        assert_eq!(gate.hx.full[3], value(3, 0, 0));
        assert_eq!(gate.vc.full[3], value(3, 0, 1));
        assert!(gate.hc.is_zero());
    }

    #[test]
    fn staggered_split_respects_gate_limits() {
        // even pulses are short-PRT with 3 gates, odd pulses long-PRT with 5
        let stag = StaggeredPrt {
            m: 2,
            n: 3,
            prt_short: 0.001,
            prt_long: 0.0015,
            n_gates_short: 3,
            n_gates_long: 5,
        };
        let beam = beam(
            pulses(8, 2, |index| if index % 2 == 0 { 3 } else { 5 }),
            PolarizationMode::StaggeredPrt(stag),
            5,
        );
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::HOnlyFixedHv);
        let gates = deinterleaver.load(&beam);
        assert_eq!(gates.len(), 5);

        let near = &gates[1];
        assert_eq!(near.hc.full.len(), 8);
        assert_eq!(near.hc.full[5], value(5, 1, 0));
        assert_eq!(near.hc.prt_short, (0..4).map(|k| value(2 * k, 1, 0)).collect::<Vec<_>>());
        assert_eq!(near.vx.prt_long, (0..4).map(|k| value(2 * k + 1, 1, 1)).collect::<Vec<_>>());

        let far = &gates[4];
        assert!(far.hc.full.iter().all(|s| *s == Complex32::default()));
        assert!(far.hc.prt_short.iter().all(|s| *s == Complex32::default()));
        assert_eq!(far.hc.prt_long[2], value(5, 4, 0));
    }

    #[test]
    fn staggered_alternating_mode_falls_back_to_single_pol() {
        let stag = StaggeredPrt {
            m: 2,
            n: 3,
            prt_short: 0.001,
            prt_long: 0.0015,
            n_gates_short: 2,
            n_gates_long: 2,
        };
        let beam = beam(pulses(4, 2, |_| 2), PolarizationMode::StaggeredPrt(stag), 2);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::AltHvCoCross);
        assert_eq!(deinterleaver.effective_mode(&beam), XmitRcvMode::SinglePol);
        let gate = &deinterleaver.load(&beam)[0];
        assert_eq!(gate.hc.full.len(), 4);
        assert!(gate.vc.is_zero());
        assert!(gate.vx.is_zero());
    }

    #[test]
    fn buffers_are_cleared_between_beams() {
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::SimHvFixedHv);
        let dual = beam(pulses(4, 2, |_| 2), PolarizationMode::SinglePol, 2);
        assert!(!deinterleaver.load(&dual)[0].vc.is_zero());
        let single = beam(pulses(4, 1, |_| 2), PolarizationMode::SinglePol, 2);
        assert!(deinterleaver.load(&single)[0].vc.is_zero());
    }

    #[test]
    fn gates_beyond_pulse_samples_stay_zero() {
        let beam = beam(pulses(4, 1, |index| if index == 2 { 1 } else { 3 }), PolarizationMode::SinglePol, 3);
        let mut deinterleaver = GateDeinterleaver::new(XmitRcvMode::SinglePol);
        let gates = deinterleaver.load(&beam);
        assert_eq!(gates[2].hc.full[2], Complex32::default());
        assert_eq!(gates[2].hc.full[3], value(3, 2, 0));
    }
}
