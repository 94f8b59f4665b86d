use num_complex::Complex32;

/// Splits an interleaved staggered series into its short-PRT (even) and
/// long-PRT (odd) samples.
pub fn separate(iq: &[Complex32]) -> (Vec<Complex32>, Vec<Complex32>) {
    let short = iq.iter().step_by(2).copied().collect();
    let long = iq.iter().skip(1).step_by(2).copied().collect();
    (short, long)
}

/// Length of the expanded series for `n_samples` staggered pulses.
pub fn n_expanded(n_samples: usize, m: u32, n: u32) -> usize {
    (n_samples / 2) * (m + n) as usize
}

/// Places the staggered samples on a uniform grid of the PRT unit,
/// with zeros between pulses: M units after a short-PRT pulse and N after
/// a long-PRT one.
pub fn expand(iq: &[Complex32], m: u32, n: u32) -> Vec<Complex32> {
    let mut expanded = vec![Complex32::default(); n_expanded(iq.len(), m, n)];
    let mut slot = 0usize;
    for (index, sample) in iq.iter().enumerate() {
        match expanded.get_mut(slot) {
            Some(entry) => *entry = *sample,
            None => break,
        }
        let step = if index % 2 == 0 { m } else { n };
        slot += step as usize;
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<Complex32> {
        (0..n).map(|k| Complex32::new(k as f32 + 1.0, 0.0)).collect()
    }

    #[test]
    fn separate_splits_by_parity() {
        let (short, long) = separate(&series(6));
        assert_eq!(short.iter().map(|c| c.re).collect::<Vec<_>>(), vec![1.0, 3.0, 5.0]);
        assert_eq!(long.iter().map(|c| c.re).collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn expand_places_samples_on_stagger_grid() {
        let expanded = expand(&series(8), 2, 3);
        assert_eq!(expanded.len(), 20);
        let filled: Vec<usize> = expanded
            .iter()
            .enumerate()
            .filter(|(_, c)| c.re != 0.0)
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(filled, vec![0, 2, 5, 7, 10, 12, 15, 17]);
        assert_eq!(expanded[17].re, 8.0);
    }
}
