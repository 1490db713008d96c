use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Headless play mode runner: plays a route of story nodes through the
/// play mode controller and prints the session trace as JSON.
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Story node IDs to visit, in order
    #[arg(value_name = "NODE")]
    pub route: Vec<String>,

    /// Scene the editor has open when play starts
    #[arg(short = 's', long = "scene", value_name = "SCENE")]
    pub scene: Option<String>,

    /// Override start scene for the session
    #[arg(long = "start-scene", value_name = "SCENE")]
    pub start_scene: Option<String>,

    /// Rewind the timeline before playing instead of starting at the playhead
    #[arg(long = "from-start")]
    pub from_start: bool,

    /// Add a breakpoint on a node (can be specified multiple times)
    #[arg(short = 'b', long = "break", value_name = "NODE")]
    pub breakpoints: Vec<String>,

    /// Add a one-shot breakpoint on a node
    #[arg(long = "break-once", value_name = "NODE")]
    pub break_once: Vec<String>,

    /// Ignore all breakpoints for this run
    #[arg(long = "no-breakpoints")]
    pub no_breakpoints: bool,

    /// Set a runtime variable (NAME=VALUE)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub variables: Vec<String>,

    /// Report a script error when reaching a node (NODE:MESSAGE)
    #[arg(long = "error", value_name = "NODE:MESSAGE")]
    pub errors: Vec<String>,

    /// Frames spent on each node
    #[arg(long = "frames-per-node", value_name = "N", default_value = "30")]
    pub frames_per_node: u32,

    /// Simulated editor frame rate
    #[arg(long = "fps", value_name = "FPS", default_value = "60")]
    pub fps: f64,

    /// Time scale (0..10)
    #[arg(short = 't', long = "time-scale", value_name = "SCALE")]
    pub time_scale: Option<f64>,

    /// Write the session report here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Persist breakpoints given on the command line to settings
    #[arg(long = "save-breakpoints")]
    pub save_breakpoints: bool,

    /// Enable debug logging to file (default: novelplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

/// Split `NAME=VALUE`
pub fn parse_assignment(s: &str) -> Option<(&str, &str)> {
    let (name, value) = s.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Split `NODE:MESSAGE`
pub fn parse_error_spec(s: &str) -> Option<(&str, &str)> {
    let (node, message) = s.split_once(':')?;
    let node = node.trim();
    if node.is_empty() {
        return None;
    }
    Some((node, message.trim()))
}
