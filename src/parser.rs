use crate::error::{Result, TraceError};
use crate::trace::{Layer, SliceTrace};
use geo_types::{Coord, LineString};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    /// Fail on the first malformed coordinate line instead of skipping it.
    pub strict: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ParseReport {
    pub trace: SliceTrace,
    pub coordinate_lines: usize,
    pub malformed_lines: usize,
}

/// How a single line of slicer output is interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
enum LineKind {
    Layer(i64),
    Point(Coord<i64>),
    Malformed,
    Other,
}

fn classify(line: &str) -> LineKind {
    let line = line.trim();
    if let Some(index) = layer_marker(line) {
        return LineKind::Layer(index);
    }
    if !starts_numeric(line) {
        return LineKind::Other;
    }
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(x), Some(y), None) => match (x.parse::<i64>(), y.parse::<i64>()) {
            (Ok(x), Ok(y)) => LineKind::Point(Coord { x, y }),
            _ => LineKind::Malformed,
        },
        _ => LineKind::Malformed,
    }
}

fn starts_numeric(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => chars.next().map_or(false, |c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Recognises `layer 3`, `Layer: 3`, `LAYER:3`, `layer_nr 3` and similar.
fn layer_marker(line: &str) -> Option<i64> {
    let head = line.get(..5)?;
    if !head.eq_ignore_ascii_case("layer") {
        return None;
    }
    let mut rest = &line[5..];
    if rest.get(..3).map_or(false, |s| s.eq_ignore_ascii_case("_nr")) {
        rest = &rest[3..];
    }
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '=' | '#'));
    let end = rest
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(rest.len(), |(i, _)| i);
    rest[..end].parse().ok()
}

/// Accumulates polygons into layers while the text is scanned.
struct TraceBuilder {
    layers: Vec<Layer>,
    positions: HashMap<i64, usize>,
    current_layer: Option<usize>,
    current_polygon: Vec<Coord<i64>>,
}

impl TraceBuilder {
    fn new() -> Self {
        Self {
            layers: Vec::new(),
            positions: HashMap::new(),
            current_layer: None,
            current_polygon: Vec::new(),
        }
    }

    fn layer_slot(&mut self, index: i64) -> usize {
        if let Some(&pos) = self.positions.get(&index) {
            return pos;
        }
        self.layers.push(Layer::new(index));
        let pos = self.layers.len() - 1;
        self.positions.insert(index, pos);
        pos
    }

    fn start_layer(&mut self, index: i64) {
        self.close_polygon();
        self.current_layer = Some(self.layer_slot(index));
    }

    fn push_point(&mut self, c: Coord<i64>) {
        self.current_polygon.push(c);
    }

    fn close_polygon(&mut self) {
        if self.current_polygon.is_empty() {
            return;
        }
        let slot = match self.current_layer {
            Some(slot) => slot,
            None => {
                // Points before any marker belong to layer 0.
                let slot = self.layer_slot(0);
                self.current_layer = Some(slot);
                slot
            }
        };
        let points = std::mem::take(&mut self.current_polygon);
        self.layers[slot].polygons.push(LineString::new(points));
    }

    fn finish(mut self) -> SliceTrace {
        self.close_polygon();
        SliceTrace { layers: self.layers }
    }
}

/// Parses slicer debug text, skipping malformed coordinate lines.
pub fn parse(text: &str) -> SliceTrace {
    // Lenient parsing has no failure path.
    parse_with(text, &ParseOptions::default())
        .map(|report| report.trace)
        .unwrap_or_default()
}

/// Parses slicer debug text and reports what was seen.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<ParseReport> {
    let mut builder = TraceBuilder::new();
    let mut coordinate_lines = 0;
    let mut malformed_lines = 0;

    for (line_no, line) in text.lines().enumerate() {
        match classify(line) {
            LineKind::Layer(index) => {
                log::trace!("Layer marker {} on line {}", index, line_no + 1);
                builder.start_layer(index);
            }
            LineKind::Point(c) => {
                coordinate_lines += 1;
                builder.push_point(c);
            }
            LineKind::Malformed if options.strict => {
                return Err(TraceError::Parse { line: line_no + 1, content: line.to_string() });
            }
            LineKind::Malformed => {
                malformed_lines += 1;
                log::warn!("Skipping malformed coordinate line {}: {:?}", line_no + 1, line);
            }
            LineKind::Other => builder.close_polygon(),
        }
    }

    let trace = builder.finish();
    log::debug!(
        "Parsed {} layers, {} polygons from {} coordinate lines ({} malformed)",
        trace.layers.len(),
        trace.polygon_count(),
        coordinate_lines,
        malformed_lines
    );

    Ok(ParseReport { trace, coordinate_lines, malformed_lines })
}

/// Every coordinate in the text as one flat list, ignoring layer and
/// polygon structure.
pub fn parse_points(text: &str) -> Vec<Coord<i64>> {
    text.lines()
        .filter_map(|line| match classify(line) {
            LineKind::Point(c) => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
