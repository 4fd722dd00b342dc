//! Running statistics over a bounded history.

use std::collections::VecDeque;

/// Moving-window mean and standard deviation plus an exponential average.
///
/// The window keeps the last `capacity` values. The exponential average
/// follows `avg = x * factor + avg * (1 - factor)` over every value pushed;
/// a factor of 0 keeps it at its initial value of 0.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    history: VecDeque<f64>,
    capacity: usize,
    exp_factor: f64,
    exp_average: f64,
    sum: f64,
    sum_squares: f64,
    last: Option<f64>,
    max: Option<f64>,
    count: u64,
}

impl MovingAverage {
    /// Creates an averager over the last `capacity` values (at least 1).
    pub fn new(capacity: usize, exp_factor: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            exp_factor: exp_factor.clamp(0.0, 1.0),
            exp_average: 0.0,
            sum: 0.0,
            sum_squares: 0.0,
            last: None,
            max: None,
            count: 0,
        }
    }

    /// Adds a value, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.history.len() == self.capacity {
            if let Some(old) = self.history.pop_front() {
                self.sum -= old;
                self.sum_squares -= old * old;
            }
        }
        self.history.push_back(value);
        self.sum += value;
        self.sum_squares += value * value;

        self.exp_average = value * self.exp_factor + self.exp_average * (1.0 - self.exp_factor);
        self.last = Some(value);
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.count += 1;
    }

    /// Mean of the values in the window, or `None` if empty.
    pub fn mean(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.sum / self.history.len() as f64)
    }

    /// Sample standard deviation of the window, or `None` with fewer than two values.
    pub fn std_dev(&self) -> Option<f64> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }
        let mean = self.sum / n as f64;
        let variance = (self.sum_squares - n as f64 * mean * mean) / (n - 1) as f64;
        Some(variance.max(0.0).sqrt())
    }

    /// Exponential average over all values pushed.
    pub fn exp_average(&self) -> f64 {
        self.exp_average
    }

    /// Most recent value.
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Largest value ever pushed.
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Values currently in the window.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Total values pushed, including evicted ones.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Forgets all values.
    pub fn clear(&mut self) {
        *self = Self::new(self.capacity, self.exp_factor);
    }
}
