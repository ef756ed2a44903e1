//! jnibridge command-line interface.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jnibridge::{Generator, GeneratorConfig, MarkerSelector, NamingScheme, Scanner};

#[derive(Parser)]
#[command(name = "jnibridge")]
#[command(about = "Generate C++/JNI glue from JVM class files", long_about = None)]
#[command(version)]
struct Cli {
    /// More output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate stubs and the registration unit
    Generate {
        #[command(flatten)]
        input: InputArgs,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Entry-point naming: jni, jni-long or indexed
        #[arg(long)]
        naming: Option<NamingScheme>,
        /// Fail on the first unsupported type
        #[arg(long)]
        strict: bool,
        /// Write the JSON report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List discovered targets and methods without generating
    Scan {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Classpath entries (directories, .jar or .zip); replace the configured ones
    #[arg(long = "classpath", value_name = "PATH")]
    classpath: Vec<PathBuf>,
    /// Marker: annotation:NAME, interface:NAME or native-methods
    #[arg(long)]
    marker: Option<MarkerSelector>,
}

impl InputArgs {
    fn load(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GeneratorConfig::default(),
        };
        if !self.classpath.is_empty() {
            config.classpath = self.classpath.clone();
        }
        if let Some(marker) = &self.marker {
            config.marker = marker.clone();
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            output,
            naming,
            strict,
            report,
        } => {
            let mut config = input.load()?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(naming) = naming {
                config.naming = naming;
            }
            config.strict |= strict;
            if report.is_some() {
                config.report = report;
            }

            let report = Generator::new(config)?.run()?;
            println!("{report}");
        }
        Commands::Scan { input } => {
            let config = input.load()?;
            config.validate()?;
            let scan = Scanner::new(&config).scan()?;
            for target in &scan.targets {
                println!("{} ({:?}, {} methods)", target.name, target.kind, target.methods.len());
                for method in &target.methods {
                    let kind = if method.is_static() { "static" } else { "instance" };
                    println!(
                        "    {}{} [{kind}] -> {}",
                        method.name,
                        method.descriptor.encode(),
                        method.native_name
                    );
                }
            }
            println!(
                "{} targets, {} methods, {} classes scanned",
                scan.targets.len(),
                scan.method_count(),
                scan.classes_scanned
            );
        }
    }
    Ok(())
}
