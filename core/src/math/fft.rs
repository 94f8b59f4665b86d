use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps a forward/inverse `rustfft` plan pair for reuse.
pub struct FftHelper {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            forward,
            inverse,
            scratch: vec![Complex32::zero(); scratch_len],
            size,
        }
    }

    /// Forward transform; input is zero-padded or truncated to the plan size.
    pub fn forward(&mut self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer = self.load(input);
        self.forward
            .process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Inverse transform, scaled by 1/N so that it undoes `forward`.
    pub fn inverse(&mut self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer = self.load(input);
        self.inverse
            .process_with_scratch(&mut buffer, &mut self.scratch);
        let scale = 1.0 / self.size.max(1) as f32;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
        buffer
    }

    fn load(&self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Complex32::zero());
        buffer
    }
}
