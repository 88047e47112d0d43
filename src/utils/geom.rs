//! Integer rectangles.

/// Half-open rectangle `[xmin, xmax) x [ymin, ymax)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl Rect {
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    pub fn is_empty(&self) -> bool {
        self.xmin >= self.xmax || self.ymin >= self.ymax
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.xmin >= self.xmin
            && other.ymin >= self.ymin
            && other.xmax <= self.xmax
            && other.ymax <= self.ymax
    }

    pub fn inflate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.xmin - dx, self.ymin - dy, self.xmax + dx, self.ymax + dy)
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::new(
            self.xmin.max(other.xmin),
            self.ymin.max(other.ymin),
            self.xmax.min(other.xmax),
            self.ymax.min(other.ymax),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_then_intersect_clips() {
        let r = Rect::new(2, 2, 4, 4).inflate(3, 3).intersect(&Rect::from_size(10, 5));
        assert_eq!(r, Rect::new(0, 0, 7, 5));
        assert!(!r.is_empty());
        assert!(Rect::new(3, 3, 3, 8).is_empty());
    }
}
