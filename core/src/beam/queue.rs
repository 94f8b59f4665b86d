use crate::pulse_interface::Pulse;
use log::warn;
use std::collections::VecDeque;
use std::sync::Arc;

/// What happened to the tail entry when a push overflowed the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    None,
    /// Tail dropped and freed; carries its sequence number.
    Freed(u64),
    /// Tail dropped from the queue but still held by a live beam.
    Released(u64),
}

/// Bounded queue of the most recent pulses, newest at index 0.
pub struct PulseQueue {
    pulses: VecDeque<Arc<Pulse>>,
    max_len: usize,
}

impl PulseQueue {
    pub fn with_capacity(max_len: usize) -> Self {
        Self {
            pulses: VecDeque::with_capacity(max_len + 1),
            max_len: max_len.max(1),
        }
    }

    /// Prepends the pulse, dropping the oldest entry once the bound is exceeded.
    pub fn push(&mut self, pulse: Arc<Pulse>) -> Eviction {
        self.pulses.push_front(pulse);
        if self.pulses.len() <= self.max_len {
            return Eviction::None;
        }
        match self.pulses.pop_back() {
            Some(tail) => {
                let seq_num = tail.seq_num;
                if Arc::strong_count(&tail) == 1 {
                    Eviction::Freed(seq_num)
                } else {
                    Eviction::Released(seq_num)
                }
            }
            None => Eviction::None,
        }
    }

    /// Compares the next pulse with the newest queued one. Returns the
    /// sequence gap when it is larger than 1; diagnostic only.
    pub fn sequence_gap_check(&self, next: &Pulse) -> Option<u64> {
        let prev = self.pulses.front()?;
        let gap = next.seq_num.wrapping_sub(prev.seq_num);
        if gap > 1 {
            warn!(
                "pulse sequence gap: prev {} next {} (missing {})",
                prev.seq_num,
                next.seq_num,
                gap - 1
            );
            Some(gap)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Pulse>> {
        self.pulses.get(index)
    }

    /// Holders of the entry at `index`, the queue included.
    pub fn client_count(&self, index: usize) -> Option<usize> {
        self.pulses.get(index).map(Arc::strong_count)
    }

    /// `n` consecutive pulses starting `offset` entries back from the
    /// newest, returned oldest first.
    pub fn window(&self, offset: usize, n: usize) -> Option<Vec<Arc<Pulse>>> {
        if offset + n > self.pulses.len() {
            return None;
        }
        Some(
            (offset..offset + n)
                .rev()
                .map(|index| Arc::clone(&self.pulses[index]))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pulse>> {
        self.pulses.iter()
    }

    pub fn clear(&mut self) {
        self.pulses.clear();
    }
}
