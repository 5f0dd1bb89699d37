//! Fixed-capacity history of recent center of pressure points.

/// Default number of points kept for the COP trail.
pub const TRAIL_LEN: usize = 20;

/// Ring buffer of `(x, y)` points with FIFO eviction
///
/// Generic const parameter `N` sets the capacity. Once full, every push overwrites the oldest
/// point.
#[derive(Debug, Clone)]
pub struct Trail<const N: usize = TRAIL_LEN> {
    points: [(f64, f64); N],
    head: usize, // Write position (next slot to fill)
    len: usize,
}

impl<const N: usize> Trail<N> {
    pub const fn new() -> Self {
        Self {
            points: [(0.0, 0.0); N],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, point: (f64, f64)) {
        if N == 0 {
            return;
        }
        self.points[self.head] = point;
        self.head = (self.head + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let tail = (self.head + N - self.len) % N.max(1);
        (0..self.len).map(move |i| self.points[(tail + i) % N])
    }

    /// Most recently pushed point.
    pub fn latest(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            None
        } else {
            Some(self.points[(self.head + N - 1) % N])
        }
    }

    /// X coordinates, oldest first.
    pub fn xs(&self) -> Vec<f64> {
        self.iter().map(|(x, _)| x).collect()
    }

    /// Y coordinates, oldest first.
    pub fn ys(&self) -> Vec<f64> {
        self.iter().map(|(_, y)| y).collect()
    }
}

impl<const N: usize> Default for Trail<N> {
    fn default() -> Self {
        Self::new()
    }
}
