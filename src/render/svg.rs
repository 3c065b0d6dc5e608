//! Vector output. One `<g>` per layer, in slicer units, flipped so +y is up.

use super::{RenderMode, RenderOptions, PALETTE};
use crate::error::Result;
use crate::trace::SliceTrace;
use ::svg::node::element::{path::Data, Circle, Group, Path};
use ::svg::Document;
use geo_types::{Coord, LineString, Rect};
use image::Rgb;

fn hex(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn path_data(ls: &LineString<i64>, close: bool) -> Data {
    // `svg` path parameters are f32.
    let coords: Vec<f32> = ls.0.iter().flat_map(|c| [c.x as f32, c.y as f32]).collect();
    let data = Data::new().move_to(coords);
    if close { data.close() } else { data }
}

pub fn to_svg_document(trace: &SliceTrace, opts: &RenderOptions) -> Document {
    let bounds = trace
        .bounds()
        .unwrap_or(Rect::new(Coord { x: 0, y: 0 }, Coord { x: 1, y: 1 }));
    // Rect::width would overflow on i64 for very wide traces.
    let width = (bounds.max().x as f64 - bounds.min().x as f64).max(1.0);
    let height = (bounds.max().y as f64 - bounds.min().y as f64).max(1.0);
    let dot = (width.max(height) / 400.0).max(1.0);

    // Flipping y maps [min.y, max.y] onto [-max.y, -min.y].
    let mut root = Group::new().set("transform", "scale(1,-1)");

    for (i, layer) in trace.layers.iter().enumerate() {
        let color = hex(PALETTE[i % PALETTE.len()]);
        let mut g = Group::new().set("data-layer", layer.index.to_string());

        for poly in layer.polygons.iter().filter(|p| !p.0.is_empty()) {
            match opts.mode {
                RenderMode::Scatter => {
                    for c in &poly.0 {
                        g = g.add(
                            Circle::new()
                                .set("cx", c.x as f64)
                                .set("cy", c.y as f64)
                                .set("r", dot)
                                .set("fill", color.as_str()),
                        );
                    }
                }
                RenderMode::Outline => {
                    g = g.add(
                        Path::new()
                            .set("fill", "none")
                            .set("stroke", color.as_str())
                            .set("stroke-width", 1)
                            .set("vector-effect", "non-scaling-stroke")
                            .set("d", path_data(poly, true)),
                    );
                }
                RenderMode::Fill => {
                    let closed = poly.0.len() >= 3;
                    g = g.add(
                        Path::new()
                            .set("fill", if closed { color.as_str() } else { "none" })
                            .set("fill-opacity", 0.5)
                            .set("fill-rule", "evenodd")
                            .set("stroke", hex(opts.stroke))
                            .set("stroke-width", 1)
                            .set("vector-effect", "non-scaling-stroke")
                            .set("d", path_data(poly, closed)),
                    );
                }
            }
        }
        root = root.add(g);
    }

    Document::new()
        .set(
            "viewBox",
            (
                bounds.min().x as f64,
                -(bounds.max().y as f64),
                width,
                height,
            ),
        )
        .set("style", format!("background:{}", hex(opts.background)))
        .add(root)
}

pub fn write_svg(trace: &SliceTrace, path: impl AsRef<std::path::Path>, opts: &RenderOptions) -> Result<()> {
    let doc = to_svg_document(trace, opts);
    ::svg::save(path, &doc)?;
    log::info!("Wrote SVG with {} layers", trace.layers.len());
    Ok(())
}
