use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the browser-triage tool.
///
/// The normal run needs a profile folder and a not-yet-existing output
/// folder; the list modes only inspect the registered plugin catalog and
/// exit.
#[derive(Parser, Debug)]
#[clap(
    name = "browser-triage",
    about = "Plugin-driven parsing of website/webapp artifacts in browser profile data"
)]
pub struct Args {
    /// Path to the browser profile folder
    #[clap(
        short = 'p',
        long,
        required_unless_present_any = ["list_plugins", "table_list_plugins"]
    )]
    pub profile_folder: Option<PathBuf>,

    /// Output folder for processed data - should not already exist
    #[clap(
        short = 'o',
        long,
        required_unless_present_any = ["list_plugins", "table_list_plugins"]
    )]
    pub output_folder: Option<PathBuf>,

    /// Optional path to the cache folder, if it is not found directly
    /// within the profile folder (e.g., as is the case on Android)
    #[clap(short = 'c', long)]
    pub cache_folder: Option<PathBuf>,

    /// Path to a YAML run configuration (artifact include/exclude lists)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Run only the named artifact
    #[clap(short = 'a', long)]
    pub artifact: Option<String>,

    /// List plugins and quit
    #[clap(short = 'l', long)]
    pub list_plugins: bool,

    /// List plugins as a markdown table and quit
    #[clap(short = 't', long)]
    pub table_list_plugins: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}
