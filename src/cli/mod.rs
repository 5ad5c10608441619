use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iprompt")]
#[command(author, version, about = "Multi-engine prompt translator with automatic failover", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate one or more texts, switching engines on failure
    Translate(TranslateArgs),

    /// Detect the language of a text
    Detect(DetectArgs),

    /// Inspect and health-check translation engines
    Engines(EnginesArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Texts to translate (several texts run as a batch)
    pub texts: Vec<String>,

    /// Read texts from a file, one per line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Target language (e.g., en, zh, ja)
    #[arg(short = 't', long = "to")]
    pub target: Option<String>,

    /// Source language, or "auto" to detect
    #[arg(short = 'f', long = "from")]
    pub source: Option<String>,

    /// Start with this engine even if it is marked unavailable
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Text to classify
    #[arg(required = true)]
    pub text: String,
}

#[derive(Parser, Debug)]
pub struct EnginesArgs {
    #[command(subcommand)]
    pub action: EnginesAction,
}

#[derive(Subcommand, Debug)]
pub enum EnginesAction {
    /// List registered engines by priority
    List {
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Probe engines and show the status report
    Status {
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run a health check on one engine or all of them
    Check {
        /// Engine key (e.g., zhipu, google, alibaba, baidu)
        engine: Option<String>,
    },

    /// Keep running periodic health checks until interrupted
    Watch {
        /// Seconds between checks (defaults to health.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// List supported languages
    Languages,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., zhipu.api_key, engines.baidu.priority)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}
