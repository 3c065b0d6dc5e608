use clap::{Args, Parser, Subcommand, ValueEnum};
use slice_trace::render::{self, svg, RenderMode, RenderOptions};
use slice_trace::{export, parse_with, Capture, ParseOptions, Setting, SliceTrace, SlicerCommand, TraceError};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the slicer and render the polygons it prints
    Slice(SliceArgs),

    /// Render a previously saved slicer log
    Render {
        /// Saved slicer output
        log: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print per-layer statistics for a saved slicer log
    Summary {
        /// Saved slicer output
        log: PathBuf,

        /// Fail on malformed coordinate lines
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CaptureArg {
    Stdout,
    Stderr,
    Both,
}

impl From<CaptureArg> for Capture {
    fn from(c: CaptureArg) -> Self {
        match c {
            CaptureArg::Stdout => Capture::Stdout,
            CaptureArg::Stderr => Capture::Stderr,
            CaptureArg::Both => Capture::Both,
        }
    }
}

#[derive(Args, Debug)]
struct SliceArgs {
    /// Slicer executable
    #[arg(long, default_value = "./build/Release/CuraEngine")]
    slicer: PathBuf,

    /// Machine definition file (-j)
    #[arg(short = 'j', long = "definition", required = true)]
    definitions: Vec<PathBuf>,

    /// Setting override as key=value (-s), may be repeated
    #[arg(short = 's', long = "setting", value_parser = parse_setting)]
    settings: Vec<Setting>,

    /// Model file (-l), may be repeated
    #[arg(short = 'l', long = "model", required = true)]
    models: Vec<PathBuf>,

    /// Which slicer output stream carries the debug coordinates
    #[arg(long, value_enum, default_value_t = CaptureArg::Stdout)]
    capture: CaptureArg,

    /// Keep the raw slicer output for `render` / `summary`
    #[arg(long)]
    save_log: Option<PathBuf>,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Directory for the per-layer images
    #[arg(short, long, default_value = "slice-trace-out")]
    output: PathBuf,

    #[arg(long, default_value_t = RenderMode::Fill)]
    mode: RenderMode,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Fit each layer to its own bounds instead of the whole part
    #[arg(long, default_value_t = false)]
    fit_each_layer: bool,

    /// Also write all layers overlaid into one image
    #[arg(long)]
    overview: Option<PathBuf>,

    /// Also write an SVG of all layers
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Also write the parsed polygons as GeoJSON
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Fail on malformed coordinate lines
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn parse_setting(s: &str) -> Result<Setting, String> {
    s.parse::<Setting>().map_err(|e| e.to_string())
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = format!("slice_trace={level}");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

fn load(text: &str, strict: bool) -> Result<SliceTrace, TraceError> {
    let report = parse_with(text, &ParseOptions::new().strict(strict))?;
    if report.malformed_lines > 0 {
        log::warn!("Skipped {} malformed coordinate lines", report.malformed_lines);
    }
    if report.trace.is_empty() {
        return Err(TraceError::EmptyTrace);
    }
    Ok(report.trace)
}

fn render_all(text: &str, args: &RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let trace = load(text, args.strict)?;
    println!(
        "Parsed {} layers, {} polygons, {} points.",
        trace.layers.len(),
        trace.polygon_count(),
        trace.point_count()
    );

    let opts = RenderOptions::new()
        .with_size(args.width, args.height)
        .with_mode(args.mode)
        .with_shared_viewport(!args.fit_each_layer);

    let summary = render::render_layers_to_dir(&trace, &args.output, &opts)?;
    println!(
        "Wrote {} layer images to {:?} ({} failed).",
        summary.written.len(),
        args.output,
        summary.failed.len()
    );

    if let Some(path) = &args.overview {
        render::render_overview(&trace, &opts)?.save(path)?;
        println!("Wrote overview to {:?}", path);
    }
    if let Some(path) = &args.svg {
        svg::write_svg(&trace, path, &opts)?;
        println!("Wrote SVG to {:?}", path);
    }
    if let Some(path) = &args.geojson {
        export::write_geojson(&trace, path)?;
        println!("Wrote GeoJSON to {:?}", path);
    }
    Ok(())
}

fn print_summary(trace: &SliceTrace) {
    for s in trace.summary() {
        let bounds = match s.bounds {
            Some(b) => format!("[{}, {}]-[{}, {}]", b.min().x, b.min().y, b.max().x, b.max().y),
            None => "-".to_string(),
        };
        // Slicer units are microns.
        println!(
            "layer {:>5}  polygons {:>5}  points {:>7}  bounds {}  area {:.3} mm2",
            s.index,
            s.polygons,
            s.points,
            bounds,
            s.area / 1.0e6
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Command::Slice(args) => {
            let mut cmd = SlicerCommand::new(&args.slicer).with_capture(args.capture.into());
            cmd.definitions = args.definitions;
            cmd.settings = args.settings;
            cmd.models = args.models;

            let output = cmd.run()?;
            if let Some(path) = &args.save_log {
                fs::write(path, &output.text)?;
                println!("Saved slicer output to {:?}", path);
            }
            render_all(&output.text, &args.render)?;
        }
        Command::Render { log, render } => {
            let text = fs::read_to_string(&log)?;
            render_all(&text, &render)?;
        }
        Command::Summary { log, strict } => {
            let text = fs::read_to_string(&log)?;
            let trace = load(&text, strict)?;
            print_summary(&trace);
        }
    }

    Ok(())
}
