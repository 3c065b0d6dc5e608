pub mod error;
pub mod export;
pub mod parser;
pub mod render;
pub mod slicer;
pub mod trace;
pub mod utils;

pub use error::{Result, TraceError};
pub use parser::{parse, parse_with, ParseOptions, ParseReport};
pub use render::{RenderMode, RenderOptions, RenderSummary};
pub use slicer::{Capture, Setting, SlicerCommand, SlicerOutput};
pub use trace::{Layer, LayerSummary, SliceTrace};
