/// Horizontal displacement, in CSS pixels, a swipe must travel before it
/// counts as a navigation gesture.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Viewer state over a fixed collection. Navigation is bounded at both
/// edges; there is no wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    len: usize,
    current: Option<usize>,
}

impl Lightbox {
    pub fn new(len: usize) -> Self {
        Self { len, current: None }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Open the viewer at an index. Out-of-range indices leave it closed.
    pub fn open_at(&mut self, index: usize) -> bool {
        if index < self.len {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn next(&mut self) {
        if let Some(index) = self.current
            && index + 1 < self.len
        {
            self.current = Some(index + 1);
        }
    }

    pub fn prev(&mut self) {
        if let Some(index) = self.current
            && index > 0
        {
            self.current = Some(index - 1);
        }
    }

    /// A completed drag gesture: positive displacement swipes back,
    /// negative forward, anything under the threshold does nothing.
    pub fn swipe(&mut self, dx: f64) {
        if dx <= -SWIPE_THRESHOLD {
            self.next();
        } else if dx >= SWIPE_THRESHOLD {
            self.prev();
        }
    }
}
