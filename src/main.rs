// cinspect: static reflection tables for annotated C structs

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use cinspect::config::{Config, ConfigError, OutputFormat};
use cinspect::frontend::CFrontend;
use cinspect::header::{CINSPECT_H, STRUCT_REFLECT_H};
use cinspect::pipeline::{self, Job};
use cinspect::reflect::render::Outline;
use cinspect::reflect::ReflectError;

#[derive(Parser, Debug)]
#[command(name = "cinspect")]
#[command(version)]
#[command(about = "Generates static reflection descriptor tables for annotated C structs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write descriptor tables for each input
    Generate(GenerateArgs),
    /// Print the descriptors found in one input
    Dump(DumpArgs),
    /// Print the runtime header the generated tables include
    Header {
        /// Print `cinspect.h`, which defines the marker macro, instead
        #[arg(long)]
        marker: bool,

        /// Write the header to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON config file; flags given here override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore the marker macro; only explicit annotate attributes count
    #[arg(long)]
    no_analyze: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file, or directory for several inputs; `-` writes to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Symbol prefix (default: input file stem followed by `_`)
    #[arg(long)]
    prefix: Option<String>,

    /// Header path used in the generated `#include`
    #[arg(long)]
    include: Option<String>,

    /// Do not emit the NULL-terminated registry of all descriptors
    #[arg(long)]
    no_registry: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct DumpArgs {
    input: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Some(LevelFilter::Error),
        (false, 0) => None,
        (false, 1) => Some(LevelFilter::Debug),
        (false, _) => Some(LevelFilter::Trace),
    };

    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(level);
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.format_timestamp(None).init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(reflect) = err.downcast_ref::<ReflectError>() {
        reflect.exit_code()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        64
    } else {
        1
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Generate(args) => generate(args),
        Command::Dump(args) => dump(args),
        Command::Header { marker, output } => {
            let text = if marker { CINSPECT_H } else { STRUCT_REFLECT_H };
            match output {
                Some(path) => pipeline::commit(&path, text)?,
                None => print!("{}", text),
            }
            Ok(())
        }
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, ConfigError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(if args.no_analyze {
        config.with_analysis_mode(false)
    } else {
        config
    })
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(format) = args.format {
        config = config.with_format(format);
    }
    if let Some(prefix) = args.prefix {
        config = config.with_symbol_prefix(prefix);
    }
    if let Some(include) = args.include {
        config = config.with_header_include(include);
    }
    if args.no_registry {
        config = config.with_registry(false);
    }
    config.validate()?;

    let frontend = CFrontend::with_marker_macro(config.marker_macro.as_str());
    let single = args.inputs.len() == 1;

    if args.output.as_deref() == Some(Path::new("-")) {
        for input in &args.inputs {
            let job = Job {
                input: input.clone(),
                output: PathBuf::from("-"),
            };
            let rendered = pipeline::render_unit(&frontend, &config, &job)?;
            print!("{}", rendered.contents);
        }
        return Ok(());
    }

    if let Some(dir) = args.output.as_deref().filter(|_| !single) {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }

    let jobs: Vec<Job> = args
        .inputs
        .iter()
        .map(|input| Job {
            input: input.clone(),
            output: pipeline::output_path(input, args.output.as_deref(), config.format, single),
        })
        .collect();

    pipeline::generate_all(&frontend, &config, &jobs)?;
    for job in &jobs {
        println!("{}", job.output.display());
    }
    Ok(())
}

fn dump(args: DumpArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let frontend = CFrontend::with_marker_macro(config.marker_macro.as_str());
    let graph = pipeline::analyze(&frontend, &config, &args.input)?;
    print!("{}", Outline(&graph));
    Ok(())
}
