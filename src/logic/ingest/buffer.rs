//! Sample Buffer - bounded window of the most recent samples
//!
//! Shared by every connection handler (writers) and the analysis loop
//! (single reader). One mutex guards the ring; readers copy `Arc`s out
//! before the guard drops so no scoring ever happens under the lock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use super::sample::Sample;

// ============================================================================
// STATE
// ============================================================================

struct Ring {
    samples: VecDeque<Arc<Sample>>,
    /// Monotonic push counter; the newest sample has sequence `pushed`
    pushed: u64,
    evicted: u64,
}

pub struct SampleBuffer {
    ring: Mutex<Ring>,
    capacity: usize,
    on_push: Notify,
}

/// Buffer status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferStatus {
    pub current_size: usize,
    pub capacity: usize,
    pub total_pushed: u64,
    pub evicted: u64,
    pub fill_percent: f32,
}

// ============================================================================
// BUFFER OPERATIONS
// ============================================================================

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            log::warn!("Sample buffer capacity 0 is not usable, using 1");
            1
        } else {
            capacity
        };

        Self {
            ring: Mutex::new(Ring {
                samples: VecDeque::with_capacity(capacity),
                pushed: 0,
                evicted: 0,
            }),
            capacity,
            on_push: Notify::new(),
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&self, sample: impl Into<Arc<Sample>>) {
        let sample = sample.into();
        {
            let mut ring = self.ring.lock();
            if ring.samples.len() == self.capacity {
                ring.samples.pop_front();
                ring.evicted += 1;
            }
            ring.samples.push_back(sample);
            ring.pushed += 1;
        }
        self.on_push.notify_one();
    }

    /// Most recently pushed sample, `None` while nothing has arrived
    pub fn latest(&self) -> Option<Arc<Sample>> {
        self.ring.lock().samples.back().cloned()
    }

    /// Latest sample with its sequence number, only if pushed after `seq`
    pub fn latest_since(&self, seq: u64) -> Option<(u64, Arc<Sample>)> {
        let ring = self.ring.lock();
        if ring.pushed <= seq {
            return None;
        }
        ring.samples.back().map(|s| (ring.pushed, Arc::clone(s)))
    }

    /// Copy of the current window, oldest first
    pub fn snapshot(&self) -> Vec<Arc<Sample>> {
        self.ring.lock().samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_pushed(&self) -> u64 {
        self.ring.lock().pushed
    }

    pub fn evicted(&self) -> u64 {
        self.ring.lock().evicted
    }

    /// Wait until a push happens or `timeout` elapses. Returns `true` on push.
    ///
    /// Meant for the single reader: a push with nobody waiting leaves one
    /// wake-up pending, so a push racing the call is never missed.
    pub async fn wait_for_push(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.on_push.notified())
            .await
            .is_ok()
    }

    pub fn status(&self) -> BufferStatus {
        let ring = self.ring.lock();
        BufferStatus {
            current_size: ring.samples.len(),
            capacity: self.capacity,
            total_pushed: ring.pushed,
            evicted: ring.evicted,
            fill_percent: (ring.samples.len() as f32 / self.capacity as f32 * 100.0).min(100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample(tag: f32) -> Sample {
        Sample::from_values(vec![tag])
    }

    fn tags(buffer: &SampleBuffer) -> Vec<f32> {
        buffer.snapshot().iter().map(|s| s.values[0]).collect()
    }

    #[test]
    fn test_latest_on_empty_buffer() {
        let buffer = SampleBuffer::new(4);
        assert!(buffer.latest().is_none());
        assert!(buffer.latest_since(0).is_none());
        assert!(buffer.is_empty());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_below_capacity_keeps_all_in_order() {
        for capacity in 1..=8 {
            let buffer = SampleBuffer::new(capacity);
            for i in 0..capacity {
                buffer.push(sample(i as f32));
            }
            let expected: Vec<f32> = (0..capacity).map(|i| i as f32).collect();
            assert_eq!(tags(&buffer), expected);
        }
    }

    #[test]
    fn test_overflow_keeps_last_capacity_samples() {
        let buffer = SampleBuffer::new(5);
        for i in 0..12 {
            buffer.push(sample(i as f32));
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(tags(&buffer), vec![7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(buffer.total_pushed(), 12);
        assert_eq!(buffer.evicted(), 7);
        assert_eq!(buffer.latest().unwrap().values[0], 11.0);
    }

    #[test]
    fn test_capacity_two_evicts_oldest() {
        let buffer = SampleBuffer::new(2);
        let a = sample(1.0);
        let b = sample(2.0);
        let c = sample(3.0);
        let (b_id, c_id) = (b.id, c.id);

        buffer.push(a);
        buffer.push(b);
        buffer.push(c);

        let ids: Vec<_> = buffer.snapshot().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b_id, c_id]);
    }

    #[test]
    fn test_latest_since_tracks_sequence() {
        let buffer = SampleBuffer::new(3);
        buffer.push(sample(1.0));

        let (seq, latest) = buffer.latest_since(0).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(latest.values[0], 1.0);
        assert!(buffer.latest_since(seq).is_none());

        buffer.push(sample(2.0));
        let (seq, latest) = buffer.latest_since(seq).unwrap();
        assert_eq!(seq, 2);
        assert_eq!(latest.values[0], 2.0);
    }

    #[test]
    fn test_zero_capacity_is_coerced() {
        let buffer = SampleBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(sample(1.0));
        buffer.push(sample(2.0));
        assert_eq!(tags(&buffer), vec![2.0]);
    }

    #[test]
    fn test_concurrent_writers() {
        for (capacity, writers, per_writer) in [(1000, 4, 50), (16, 8, 25)] {
            let buffer = Arc::new(SampleBuffer::new(capacity));

            let handles: Vec<_> = (0..writers)
                .map(|w| {
                    let buffer = Arc::clone(&buffer);
                    thread::spawn(move || {
                        for i in 0..per_writer {
                            buffer.push(Sample::from_values(vec![w as f32, i as f32, -1.0]));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(buffer.len(), (writers * per_writer).min(capacity));
            assert_eq!(buffer.total_pushed(), (writers * per_writer) as u64);
            for s in buffer.snapshot() {
                assert_eq!(s.values.len(), 3);
                assert_eq!(s.values[2], -1.0);
            }

            // Per-writer order survives interleaving
            let snapshot = buffer.snapshot();
            for w in 0..writers {
                let seen: Vec<f32> = snapshot
                    .iter()
                    .filter(|s| s.values[0] == w as f32)
                    .map(|s| s.values[1])
                    .collect();
                assert!(seen.windows(2).all(|p| p[0] < p[1]));
            }
        }
    }

    #[tokio::test]
    async fn test_wait_for_push() {
        let buffer = Arc::new(SampleBuffer::new(2));
        assert!(!buffer.wait_for_push(Duration::from_millis(20)).await);

        let writer = Arc::clone(&buffer);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.push(sample(1.0));
        });
        assert!(buffer.wait_for_push(Duration::from_secs(5)).await);

        // A push with no waiter leaves a pending wake-up
        buffer.push(sample(2.0));
        assert!(buffer.wait_for_push(Duration::from_millis(20)).await);
    }
}
