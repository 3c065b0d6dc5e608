use geo_types::{Coord, Rect};

/// Maps slicer coordinates onto pixel space: uniform scale, centered,
/// with +y pointing up in the final image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    min: Coord<f64>,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: f64,
}

impl Viewport {
    pub fn fit(bounds: Rect<i64>, width: u32, height: u32, margin: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let m = margin as f64;
        let avail_w = (w - 2.0 * m).max(1.0);
        let avail_h = (h - 2.0 * m).max(1.0);

        // A single point or a straight line has no extent on one axis.
        // Extents are taken in f64: the full i64 range does not fit in an i64.
        let span_x = bounds.max().x as f64 - bounds.min().x as f64;
        let span_y = bounds.max().y as f64 - bounds.min().y as f64;
        let extent = |d: f64| if d > 0.0 { d } else { 1.0 };

        let scale = (avail_w / extent(span_x)).min(avail_h / extent(span_y));
        let used_w = span_x * scale;
        let used_h = span_y * scale;

        Self {
            min: Coord { x: bounds.min().x as f64, y: bounds.min().y as f64 },
            scale,
            offset_x: (w - used_w) / 2.0,
            offset_y: (h - used_h) / 2.0,
            height: h,
        }
    }

    /// Pixels per slicer unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_pixel(&self, c: Coord<i64>) -> (f64, f64) {
        let x = self.offset_x + (c.x as f64 - self.min.x) * self.scale;
        let y = self.height - (self.offset_y + (c.y as f64 - self.min.y) * self.scale);
        (x, y)
    }
}
