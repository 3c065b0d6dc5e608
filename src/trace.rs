use geo::{Area, BoundingRect, MapCoords};
use geo_types::{Coord, LineString, Polygon, Rect};

/// One layer of slicer output: a list of polygon boundaries in integer
/// slicer units (microns).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    pub index: i64,
    /// Boundaries as printed by the slicer. Not explicitly closed.
    pub polygons: Vec<LineString<i64>>,
}

impl Layer {
    pub fn new(index: i64) -> Self {
        Self { index, polygons: Vec::new() }
    }

    pub fn point_count(&self) -> usize {
        self.polygons.iter().map(|p| p.0.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    pub fn points(&self) -> impl Iterator<Item = Coord<i64>> + '_ {
        self.polygons.iter().flat_map(|p| p.0.iter().copied())
    }

    pub fn bounds(&self) -> Option<Rect<i64>> {
        self.polygons
            .iter()
            .filter_map(|p| p.bounding_rect())
            .reduce(union_rect)
    }

    /// Sum of the unsigned areas of every boundary with at least three
    /// points, in square slicer units.
    pub fn enclosed_area(&self) -> f64 {
        self.polygons
            .iter()
            .filter(|p| p.0.len() >= 3)
            .map(|p| {
                let ring: LineString<f64> = p.map_coords(|c| Coord { x: c.x as f64, y: c.y as f64 });
                // Polygon::new closes the ring for us.
                Polygon::new(ring, vec![]).unsigned_area()
            })
            .sum()
    }
}

/// Per-layer statistics, as printed by `slice-trace summary`.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSummary {
    pub index: i64,
    pub polygons: usize,
    pub points: usize,
    pub bounds: Option<Rect<i64>>,
    pub area: f64,
}

/// Everything parsed out of one slicer run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceTrace {
    /// In order of first appearance in the output.
    pub layers: Vec<Layer>,
}

impl SliceTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, index: i64) -> Option<&Layer> {
        self.layers.iter().find(|l| l.index == index)
    }

    pub fn point_count(&self) -> usize {
        self.layers.iter().map(Layer::point_count).sum()
    }

    pub fn polygon_count(&self) -> usize {
        self.layers.iter().map(|l| l.polygons.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    pub fn bounds(&self) -> Option<Rect<i64>> {
        self.layers.iter().filter_map(Layer::bounds).reduce(union_rect)
    }

    pub fn summary(&self) -> Vec<LayerSummary> {
        self.layers
            .iter()
            .map(|l| LayerSummary {
                index: l.index,
                polygons: l.polygons.len(),
                points: l.point_count(),
                bounds: l.bounds(),
                area: l.enclosed_area(),
            })
            .collect()
    }
}

fn union_rect(a: Rect<i64>, b: Rect<i64>) -> Rect<i64> {
    Rect::new(
        Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}
