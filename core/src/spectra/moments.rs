use crate::math::StatsHelper;
use crate::pulse_interface::ChannelCalib;
use num_complex::Complex32;
use serde::Serialize;
use std::f64::consts::PI;

const MIN_SNR: f64 = 1.0e-13;
const MIN_POWER: f64 = 1.0e-30;

/// Moments estimated from one gate series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GateMoments {
    /// Lag-0 power in IQ units.
    pub lag0: f64,
    pub dbm: f64,
    pub snr: f64,
    pub dbz: f64,
    pub vel: f64,
    pub width: f64,
    pub ncp: f64,
}

/// Calibration and geometry for one channel at one gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentsContext {
    pub nyquist: f64,
    pub noise_power: f64,
    pub receiver_gain_db: f64,
    pub base_dbz_1km: f64,
    pub range_km: f64,
}

impl MomentsContext {
    pub fn new(calib: &ChannelCalib, nyquist: f64, range_km: f64) -> Self {
        Self {
            nyquist,
            noise_power: 10f64.powf(calib.noise_dbm / 10.0),
            receiver_gain_db: calib.receiver_gain_db,
            base_dbz_1km: calib.base_dbz_1km,
            range_km,
        }
    }
}

/// Staggered-PRT context. `base.nyquist` is the extended nyquist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggeredContext {
    pub base: MomentsContext,
    pub nyquist_short: f64,
    pub nyquist_long: f64,
    pub m: u32,
    pub n: u32,
    /// Gate lies beyond the short-PRT range; only power is estimated.
    pub long_only: bool,
}

fn phase(value: Complex32) -> f64 {
    (value.im as f64).atan2(value.re as f64)
}

fn power_moments(lag0: f64, ctx: &MomentsContext) -> GateMoments {
    let snr_linear = if ctx.noise_power > 0.0 {
        ((lag0 - ctx.noise_power) / ctx.noise_power).max(MIN_SNR)
    } else {
        MIN_SNR
    };
    let snr = StatsHelper::to_db(snr_linear);
    let range_correction = if ctx.range_km > 0.0 {
        20.0 * ctx.range_km.log10()
    } else {
        0.0
    };
    GateMoments {
        lag0,
        dbm: StatsHelper::to_db(lag0.max(MIN_POWER)) - ctx.receiver_gain_db,
        snr,
        dbz: snr + ctx.base_dbz_1km + range_correction,
        ..Default::default()
    }
}

/// Pulse-pair moments of a uniformly sampled series.
pub fn compute_moments(iq: &[Complex32], ctx: &MomentsContext) -> GateMoments {
    let lag0 = StatsHelper::mean_power(iq);
    let mut moments = power_moments(lag0, ctx);
    if lag0 <= 0.0 {
        return moments;
    }
    let r1 = StatsHelper::lag1(iq);
    let r1_mag = r1.norm() as f64;
    moments.vel = -(phase(r1) / PI) * ctx.nyquist;
    moments.width = if r1_mag > 0.0 {
        let ratio = lag0 / r1_mag;
        if ratio > 1.0 {
            ((2.0 * ratio.ln()).sqrt() / PI).clamp(0.0, 1.0) * ctx.nyquist
        } else {
            0.0
        }
    } else {
        ctx.nyquist
    };
    moments.ncp = (r1_mag / lag0).min(1.0);
    moments
}

/// Moments from interleaved short/long series, with the velocity
/// unfolded over the extended nyquist interval.
pub fn compute_moments_staggered(
    short: &[Complex32],
    long: &[Complex32],
    ctx: &StaggeredContext,
) -> GateMoments {
    let lag0 = if ctx.long_only || short.is_empty() {
        StatsHelper::mean_power(long)
    } else {
        (StatsHelper::mean_power(short) + StatsHelper::mean_power(long)) / 2.0
    };
    let mut moments = power_moments(lag0, &ctx.base);
    if ctx.long_only || lag0 <= 0.0 {
        return moments;
    }

    let r_short_to_long = StatsHelper::lag_between(short, long, 0);
    let r_long_to_short = StatsHelper::lag_between(long, short, 1);
    let vel_short = -(phase(r_short_to_long) / PI) * ctx.nyquist_short;
    let vel_long = -(phase(r_long_to_short) / PI) * ctx.nyquist_long;
    moments.vel = unfold_velocity(vel_short, vel_long, ctx);

    let nyquist = ctx.base.nyquist;
    let rm = r_short_to_long.norm() as f64;
    moments.width = if rm > 0.0 {
        let m = ctx.m as f64;
        let factor = 1.0 / (PI * (m * m / 2.0).sqrt());
        ((lag0 / rm).ln().max(0.0).sqrt() * factor * nyquist).clamp(0.0, nyquist)
    } else {
        nyquist
    };
    moments.ncp = (rm / lag0).min(1.0);
    moments
}

/// Finds the folds of the short and long velocities that agree best
/// within the extended interval.
pub fn unfold_velocity(vel_short: f64, vel_long: f64, ctx: &StaggeredContext) -> f64 {
    let limit = ctx.base.nyquist + 1.0e-9;
    let m = ctx.m as i32;
    let n = ctx.n as i32;
    let mut best_diff = f64::MAX;
    let mut best = vel_short;
    for k in -m..=m {
        let cand_short = vel_short + 2.0 * k as f64 * ctx.nyquist_short;
        if cand_short.abs() > limit {
            continue;
        }
        for j in -n..=n {
            let cand_long = vel_long + 2.0 * j as f64 * ctx.nyquist_long;
            let diff = (cand_short - cand_long).abs();
            if diff < best_diff {
                best_diff = diff;
                best = (cand_short + cand_long) / 2.0;
            }
        }
    }
    best
}
