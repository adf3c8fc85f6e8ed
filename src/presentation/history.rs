//! Bounded history for the live view

use crate::domain::models::{Sample, Vector3};
use crate::presentation::render::{NamedSeries, PlotFrame};
use std::collections::VecDeque;

/// Fixed-capacity buffer that drops the oldest value when full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// A capacity of zero is bumped to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Recent accel and gyro readings of one device
#[derive(Debug, Clone)]
pub struct LiveHistory {
    accel: RingBuffer<Vector3>,
    gyro: RingBuffer<Vector3>,
}

impl LiveHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            accel: RingBuffer::new(capacity),
            gyro: RingBuffer::new(capacity),
        }
    }

    pub fn push(&mut self, sample: &Sample) {
        self.accel.push(sample.accel);
        self.gyro.push(sample.gyro);
    }

    pub fn len(&self) -> usize {
        self.accel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accel.is_empty()
    }

    pub fn latest_gyro(&self) -> Option<&Vector3> {
        self.gyro.latest()
    }

    /// Six raw traces against sample position, oldest first
    pub fn frame(&self, id: &str, title: &str) -> PlotFrame {
        let positions: Vec<f64> = (0..self.len()).map(|i| i as f64).collect();
        let column = |buf: &RingBuffer<Vector3>, pick: fn(&Vector3) -> f64| -> Vec<f64> {
            buf.iter().map(pick).collect()
        };

        PlotFrame {
            id: id.to_string(),
            title: title.to_string(),
            x_label: "Sample".to_string(),
            x: positions,
            series: vec![
                NamedSeries::new("Accel X", column(&self.accel, |v| v.x)),
                NamedSeries::new("Accel Y", column(&self.accel, |v| v.y)),
                NamedSeries::new("Accel Z", column(&self.accel, |v| v.z)),
                NamedSeries::new("Gyro X", column(&self.gyro, |v| v.x)),
                NamedSeries::new("Gyro Y", column(&self.gyro, |v| v.y)),
                NamedSeries::new("Gyro Z", column(&self.gyro, |v| v.z)),
            ],
            markers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DeviceId, MotionReading};

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut buf = RingBuffer::new(3);
        for i in 0..5 {
            buf.push(i);
        }
        assert!(buf.is_full());
        assert_eq!(buf.to_vec(), vec![2, 3, 4]);
        assert_eq!(buf.latest(), Some(&4));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut buf = RingBuffer::new(0);
        buf.push('a');
        buf.push('b');
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.to_vec(), vec!['b']);
    }

    #[test]
    fn test_live_frame_keeps_newest_points() {
        let mut history = LiveHistory::new(2);
        for i in 0..4 {
            let motion = MotionReading {
                accel: Vector3::new(i as f64, 0.0, 0.0),
                gyro: Vector3::new(0.0, 0.0, -(i as f64)),
            };
            history.push(&Sample::new(i, DeviceId::Right, motion));
        }
        let frame = history.frame("right_live", "Right Joy-Con");
        assert_eq!(frame.x, vec![0.0, 1.0]);
        assert_eq!(frame.series[0].values, vec![2.0, 3.0]);
        assert_eq!(frame.series[5].values, vec![-2.0, -3.0]);
        assert_eq!(history.latest_gyro().unwrap().z, -3.0);
    }
}
