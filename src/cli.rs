use std::path::PathBuf;

use clap::Parser;

use crate::models::Ecosystem;

#[derive(Parser, Debug)]
#[command(
    name = "depscan",
    about = "Discover project dependencies across ecosystems",
    version
)]
pub struct Cli {
    /// Project path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Extra directory name to skip during the walk (repeatable)
    #[arg(short, long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Config file [default: <path>/.depscan.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "purl", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Only report this ecosystem (repeatable)
    #[arg(long = "lang", value_name = "LANG")]
    pub lang: Vec<EcosystemArg>,

    /// Log per-file discovery details to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Purl,
    Plain,
    Json,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum EcosystemArg {
    Go,
    Java,
    Node,
    Python,
    Ruby,
    Rust,
}

impl From<&EcosystemArg> for Ecosystem {
    fn from(arg: &EcosystemArg) -> Self {
        match arg {
            EcosystemArg::Go => Ecosystem::Go,
            EcosystemArg::Java => Ecosystem::Java,
            EcosystemArg::Node => Ecosystem::Node,
            EcosystemArg::Python => Ecosystem::Python,
            EcosystemArg::Ruby => Ecosystem::Ruby,
            EcosystemArg::Rust => Ecosystem::Rust,
        }
    }
}
