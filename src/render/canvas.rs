use crate::error::{Result, TraceError};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::Path;

/// Liang-Barsky clip of a segment against `(min_x, min_y, max_x, max_y)`.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            // Parallel to this edge and outside it.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

/// A pixel buffer with the handful of primitives the renderers need.
/// Every primitive clips to the image.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TraceError::InvalidCanvas { width, height });
        }
        Ok(Self { image: RgbImage::from_pixel(width, height, background) })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64 {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fills the area enclosed by `rings` using the even-odd rule, sampled
    /// at pixel centers. Nested rings therefore punch holes.
    /// Rings are implicitly closed; rings with fewer than three points are
    /// ignored.
    ///
    /// `imageproc::drawing::draw_polygon_mut` takes a single ring and has
    /// no hole support, so the scanline is done here.
    pub fn fill_rings(&mut self, rings: &[Vec<(f64, f64)>], color: Rgb<u8>) {
        let rings: Vec<&Vec<(f64, f64)>> = rings.iter().filter(|r| r.len() >= 3).collect();
        if rings.is_empty() {
            return;
        }

        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(_, y) in rings.iter().flat_map(|r| r.iter()) {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        let h = self.height() as i64;
        let row_start = ((min_y - 0.5).floor() as i64).max(0);
        let row_end = ((max_y - 0.5).ceil() as i64).min(h - 1);

        let mut crossings: Vec<f64> = Vec::new();
        for row in row_start..=row_end {
            let sy = row as f64 + 0.5;
            crossings.clear();

            for ring in &rings {
                let n = ring.len();
                for i in 0..n {
                    let (ax, ay) = ring[i];
                    let (bx, by) = ring[(i + 1) % n];
                    // Half-open test so a vertex on the scanline counts once.
                    if (ay <= sy) != (by <= sy) {
                        crossings.push(ax + (sy - ay) * (bx - ax) / (by - ay));
                    }
                }
            }

            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                // Pixel centers i + 0.5 within [x0, x1).
                let first = (span[0] - 0.5).ceil() as i64;
                let last = (span[1] - 0.5).ceil() as i64 - 1;
                let first = first.max(0);
                let last = last.min(self.width() as i64 - 1);
                for col in first..=last {
                    self.put(col, row, color);
                }
            }
        }
    }

    /// Line between the pixels containing `from` and `to`.
    ///
    /// The segment is clipped to the canvas first, so far-off endpoints
    /// cost no more than the visible part.
    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        // One pixel of slack keeps the edge pixels on the original line.
        let window = (-1.0, -1.0, self.width() as f64 + 1.0, self.height() as f64 + 1.0);
        let Some((a, b)) = clip_segment(from, to, window) else {
            return;
        };
        draw_line_segment_mut(
            &mut self.image,
            (a.0.floor() as f32, a.1.floor() as f32),
            (b.0.floor() as f32, b.1.floor() as f32),
            color,
        );
    }

    /// Closed polyline through `points`. One point becomes a dot.
    pub fn draw_ring(&mut self, points: &[(f64, f64)], color: Rgb<u8>) {
        match points.len() {
            0 => {}
            1 => self.draw_dot(points[0], 0, color),
            n => {
                for i in 0..n {
                    self.draw_line(points[i], points[(i + 1) % n], color);
                }
            }
        }
    }

    /// Filled square of side `2 * radius + 1` centered on the pixel
    /// containing `at`.
    pub fn draw_dot(&mut self, at: (f64, f64), radius: u32, color: Rgb<u8>) {
        let (cx, cy) = (at.0.floor() as i64, at.1.floor() as i64);
        let r = radius as i64;
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                self.put(x, y, color);
            }
        }
    }

    /// Writes the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}
