//! Turning a parsed [`SliceTrace`] into pictures.
//!
//! Raster output goes through [`Canvas`]; vector output lives in [`svg`].

pub mod canvas;
pub mod svg;
pub mod viewport;

pub use canvas::Canvas;
pub use viewport::Viewport;

use crate::error::{Result, TraceError};
use crate::trace::{Layer, SliceTrace};
use crate::utils::parallel::map_collect;
use image::Rgb;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Colors cycled per layer when several layers share one image.
pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Every point as a dot.
    Scatter,
    /// Each polygon boundary as a closed line loop.
    Outline,
    /// Polygons filled with the even-odd rule, then outlined.
    #[default]
    Fill,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scatter" => Ok(RenderMode::Scatter),
            "outline" => Ok(RenderMode::Outline),
            "fill" => Ok(RenderMode::Fill),
            other => Err(format!("unknown render mode {other:?}")),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenderMode::Scatter => "scatter",
            RenderMode::Outline => "outline",
            RenderMode::Fill => "fill",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub mode: RenderMode,
    pub dot_radius: u32,
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
    /// Boundary color in `Fill` mode.
    pub stroke: Rgb<u8>,
    /// Fit every layer image to the bounds of the whole trace so that
    /// consecutive layers line up. Otherwise each layer is fitted alone.
    pub shared_viewport: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            margin: 16,
            mode: RenderMode::default(),
            dot_radius: 1,
            background: Rgb([255, 255, 255]),
            foreground: Rgb([160, 190, 230]),
            stroke: Rgb([20, 40, 90]),
            shared_viewport: true,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_shared_viewport(mut self, shared: bool) -> Self {
        self.shared_viewport = shared;
        self
    }
}

/// Outcome of [`render_layers_to_dir`]. Both lists are in layer order.
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(i64, TraceError)>,
}

fn draw_layer(canvas: &mut Canvas, layer: &Layer, viewport: &Viewport, opts: &RenderOptions, color: Rgb<u8>) {
    let to_pixels = |ls: &geo_types::LineString<i64>| -> Vec<(f64, f64)> {
        ls.0.iter().map(|&c| viewport.to_pixel(c)).collect()
    };

    match opts.mode {
        RenderMode::Scatter => {
            for p in layer.points() {
                canvas.draw_dot(viewport.to_pixel(p), opts.dot_radius, color);
            }
        }
        RenderMode::Outline => {
            for poly in &layer.polygons {
                canvas.draw_ring(&to_pixels(poly), color);
            }
        }
        RenderMode::Fill => {
            let rings: Vec<Vec<(f64, f64)>> = layer.polygons.iter().map(to_pixels).collect();
            // All boundaries of a layer are filled together so inner ones cut holes.
            canvas.fill_rings(&rings, color);
            for ring in &rings {
                canvas.draw_ring(ring, opts.stroke);
            }
        }
    }
}

/// Renders a single layer into a new canvas.
pub fn render_layer(layer: &Layer, viewport: &Viewport, opts: &RenderOptions) -> Result<Canvas> {
    if layer.is_empty() {
        return Err(TraceError::EmptyLayer(layer.index));
    }
    let mut canvas = Canvas::new(opts.width, opts.height, opts.background)?;
    draw_layer(&mut canvas, layer, viewport, opts, opts.foreground);
    Ok(canvas)
}

/// All layers overlaid in one image, colored from [`PALETTE`].
pub fn render_overview(trace: &SliceTrace, opts: &RenderOptions) -> Result<Canvas> {
    let bounds = trace.bounds().ok_or(TraceError::EmptyTrace)?;
    let viewport = Viewport::fit(bounds, opts.width, opts.height, opts.margin);
    let mut canvas = Canvas::new(opts.width, opts.height, opts.background)?;

    for (i, layer) in trace.layers.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        draw_layer(&mut canvas, layer, &viewport, opts, color);
    }
    Ok(canvas)
}

pub fn layer_file_name(index: i64) -> String {
    format!("layer_{index}.png")
}

fn render_layer_to_file(
    layer: &Layer,
    shared: Option<&Viewport>,
    dir: &Path,
    opts: &RenderOptions,
) -> Result<PathBuf> {
    let viewport = match shared {
        Some(vp) => *vp,
        None => {
            let bounds = layer.bounds().ok_or(TraceError::EmptyLayer(layer.index))?;
            Viewport::fit(bounds, opts.width, opts.height, opts.margin)
        }
    };
    let canvas = render_layer(layer, &viewport, opts)?;
    let path = dir.join(layer_file_name(layer.index));
    canvas.save(&path)?;
    Ok(path)
}

/// Writes one image per layer into `dir`.
///
/// A layer that fails to render is logged and recorded in the summary;
/// the remaining layers are still rendered. Only an empty trace or an
/// unusable output directory aborts the whole batch.
pub fn render_layers_to_dir(trace: &SliceTrace, dir: impl AsRef<Path>, opts: &RenderOptions) -> Result<RenderSummary> {
    let dir = dir.as_ref();
    let bounds = trace.bounds().ok_or(TraceError::EmptyTrace)?;
    std::fs::create_dir_all(dir)?;

    let shared = opts
        .shared_viewport
        .then(|| Viewport::fit(bounds, opts.width, opts.height, opts.margin));

    log::info!("Rendering {} layers into {}", trace.layers.len(), dir.display());
    let results = map_collect(&trace.layers, |layer| {
        (layer.index, render_layer_to_file(layer, shared.as_ref(), dir, opts))
    });

    let mut summary = RenderSummary::default();
    for (index, result) in results {
        match result {
            Ok(path) => {
                log::debug!("Layer {} -> {}", index, path.display());
                summary.written.push(path);
            }
            Err(e) => {
                log::error!("Failed to render layer {}: {}", index, e);
                summary.failed.push((index, e));
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const BG: Rgb<u8> = Rgb([255, 255, 255]);

    fn opts(mode: RenderMode) -> RenderOptions {
        RenderOptions::new().with_size(64, 64).with_margin(4).with_mode(mode)
    }

    fn painted(canvas: &Canvas) -> usize {
        canvas.image().pixels().filter(|p| **p != BG).count()
    }

    #[test]
    fn test_render_mode_from_str() {
        assert_eq!("Scatter".parse::<RenderMode>(), Ok(RenderMode::Scatter));
        assert_eq!("fill".parse::<RenderMode>(), Ok(RenderMode::Fill));
        assert!("plot".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::Outline.to_string(), "outline");
    }

    #[test]
    fn test_modes_paint_increasing_area() {
        let trace = parse("layer 0\n0 0\n1000 0\n1000 1000\n0 1000\n");
        let layer = &trace.layers[0];
        let vp = Viewport::fit(layer.bounds().unwrap(), 64, 64, 4);

        let scatter = painted(&render_layer(layer, &vp, &opts(RenderMode::Scatter)).unwrap());
        let outline = painted(&render_layer(layer, &vp, &opts(RenderMode::Outline)).unwrap());
        let fill = painted(&render_layer(layer, &vp, &opts(RenderMode::Fill)).unwrap());

        assert!(scatter > 0);
        assert!(outline > scatter, "outline {outline} <= scatter {scatter}");
        assert!(fill > outline, "fill {fill} <= outline {outline}");
    }

    #[test]
    fn test_fill_leaves_hole_unpainted() {
        let trace = parse("layer 0\n0 0\n1000 0\n1000 1000\n0 1000\n\n400 400\n400 600\n600 600\n600 400\n");
        let layer = &trace.layers[0];
        let o = opts(RenderMode::Fill);
        let vp = Viewport::fit(layer.bounds().unwrap(), o.width, o.height, o.margin);
        let canvas = render_layer(layer, &vp, &o).unwrap();

        // Center of the hole stays background, a point between the rings is filled.
        assert_eq!(canvas.pixel(32, 32), Some(BG));
        assert_eq!(canvas.pixel(15, 32), Some(o.foreground));
    }

    #[test]
    fn test_empty_layer_and_trace_errors() {
        let trace = parse("layer 3\n");
        let vp = Viewport::fit(geo_types::Rect::new((0, 0), (1, 1)), 8, 8, 0);
        assert!(matches!(render_layer(&trace.layers[0], &vp, &opts(RenderMode::Fill)), Err(TraceError::EmptyLayer(3))));
        assert!(matches!(render_overview(&trace, &opts(RenderMode::Fill)), Err(TraceError::EmptyTrace)));
    }

    #[test]
    fn test_overview_uses_palette() {
        let trace = parse("layer 0\n0 0\n10 0\nlayer 1\n0 10\n10 10\n");
        let canvas = render_overview(&trace, &opts(RenderMode::Outline)).unwrap();
        let img = canvas.image();
        assert!(img.pixels().any(|p| *p == PALETTE[0]));
        assert!(img.pixels().any(|p| *p == PALETTE[1]));
    }
}
