use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::option::RawFlags;

/// Webpack build, dev server and archive tool
#[derive(Parser, Debug)]
#[command(name = "easyweb", author, version, about)]
pub struct Cli {
    /// Show debug logs
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command that assembles a bundler configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildFlags {
    /// Bundler config file path (JSON or TOML)
    #[arg(short = 'f', long = "filename")]
    pub filename: Option<PathBuf>,

    /// Dev server port
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Build type: client, server, web, weex
    #[arg(short = 't', long = "type")]
    pub build_type: Option<String>,

    /// Watch and hot-update
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Hash js/css/image file names
    #[arg(short = 'm', long = "md5")]
    pub hash: bool,

    /// Compress js/css/image
    #[arg(short = 'c', long)]
    pub compress: bool,

    /// Combined flags: w(watch), m(hash), c(compress), e.g. wm/wc/mc/wmc
    #[arg(short = 'b', long = "build")]
    pub shorthand: Option<String>,

    /// Bundle size report: analyzer or stats (default analyzer)
    #[arg(short = 's', long, num_args = 0..=1, default_missing_value = "analyzer")]
    pub size: Option<String>,

    /// Only the dll config
    #[arg(long)]
    pub dll: bool,

    /// Only web-side configs
    #[arg(long)]
    pub web: bool,

    /// Only node-side configs
    #[arg(long)]
    pub node: bool,

    /// Bundler devtool setting
    #[arg(long)]
    pub devtool: Option<String>,

    /// Fail instead of falling back to a client build when no target is found
    #[arg(long)]
    pub strict: bool,
}

impl From<&BuildFlags> for RawFlags {
    fn from(flags: &BuildFlags) -> Self {
        RawFlags {
            build_type: flags.build_type.clone(),
            watch: flags.watch.then_some(true),
            hash: flags.hash.then_some(true),
            compress: flags.compress.then_some(true),
            shorthand: flags.shorthand.clone(),
            port: flags.port.clone(),
            devtool: flags.devtool.clone(),
            size: flags.size.clone(),
            only_dll: flags.dll,
            only_web: flags.web,
            only_node: flags.node,
            strict: flags.strict,
            install_mode: None,
        }
    }
}

/// Options of the `zip` and `tar` commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ArchiveArgs {
    /// Archive file name
    #[arg(long)]
    pub filename: Option<String>,

    /// Root directory to archive (default: project root)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Directory the archive is written to (default: dist)
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Install production dependencies into node_modules first
    #[arg(long)]
    pub deps: bool,

    /// Package manager: npm, cnpm, tnpm, yarn and so on
    #[arg(long)]
    pub mode: Option<String>,

    /// Registry url used for dependency installation
    #[arg(long)]
    pub registry: Option<String>,

    /// Install node into node_modules
    #[arg(long, visible_alias = "node", conflicts_with = "alinode")]
    pub nodejs: bool,

    /// Install alinode into node_modules
    #[arg(long)]
    pub alinode: bool,
}

/// All supported subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a webpack project
    Init {
        /// Project directory (default: current directory)
        name: Option<String>,

        /// npm registry written to .npmrc
        #[arg(short, long)]
        registry: Option<String>,
    },

    /// Install dependencies missing from node_modules
    Install {
        /// Package manager: npm, cnpm, tnpm, yarn and so on
        #[arg(long)]
        mode: Option<String>,

        #[command(flatten)]
        flags: BuildFlags,
    },

    /// Upgrade project dependencies
    Upgrade {
        /// Package manager: npm, cnpm, tnpm, yarn and so on
        #[arg(long)]
        mode: Option<String>,
    },

    /// Print the assembled config, optionally a single node of it
    Print {
        /// Environment name: dev, test, prod and so on
        env: Option<String>,

        /// Config node key path, e.g. module/rules or plugins
        #[arg(short = 'n', long = "node-path", visible_alias = "key")]
        node_path: Option<String>,

        #[command(flatten)]
        flags: BuildFlags,
    },

    /// Build the dll (vendor) bundle
    Dll {
        env: Option<String>,

        #[command(flatten)]
        flags: BuildFlags,
    },

    /// Build the assembled bundler configurations
    Build {
        env: Option<String>,

        #[command(flatten)]
        flags: BuildFlags,
    },

    /// Build and start the dev server
    #[command(visible_alias = "start")]
    Server {
        env: Option<String>,

        #[command(flatten)]
        flags: BuildFlags,
    },

    /// Archive files into a zip file
    Zip(ArchiveArgs),

    /// Archive files into a gzip-compressed tar file
    Tar(ArchiveArgs),

    /// Upload files to the deploy space
    Deploy,

    /// Clean the compile cache; "all" also removes manifests and build output
    Clean { dir: Option<String> },

    /// Open the compile cache directory
    Open { dir: Option<PathBuf> },

    /// Kill processes listening on ports (default 7001,9000,9001)
    Kill { port: Option<String> },
}
