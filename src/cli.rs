use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use log::error;

use crate::{
    config::{parse_config, parse_config_from_file, Config},
    jobs::{run_queue, Action, JobOptions},
};

pub enum CliRes {
    Ok,
    Err,
    NoCli,
}

#[derive(Debug, Parser)]
#[command(version, about = "Fortune Summoners sprite resource unpacker", long_about = None)]
struct FsUnpackCli {
    /// Config file to use instead of the one next to the binary
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Logs what every file decodes to
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Converts sprite resources to .bmp
    Unpack {
        /// Resource files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Writes into this folder instead of next to each resource
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Replaces existing files
        #[arg(short = 'x', long)]
        overwrite: bool,
        /// Skips the additional palette checks
        #[arg(long)]
        lenient: bool,
        /// Also writes a .png preview of every frame
        #[arg(long)]
        preview: bool,
        /// Keeps the palette slot of 24 bit resources as the bitmap's color table
        #[arg(long)]
        keep_palette: bool,
    },
    /// Packs edited .bmp back over the resources they came from
    ///
    /// Without --output-dir the packed resource replaces its reference, which needs --overwrite
    Pack {
        /// Edited bitmaps
        #[arg(required = true)]
        bitmaps: Vec<PathBuf>,
        /// Folder holding the original resources. Defaults to each bitmap's folder
        #[arg(short, long)]
        reference_dir: Option<PathBuf>,
        /// Writes into this folder instead of over the reference next to each bitmap
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Replaces existing files, the reference included
        #[arg(short = 'x', long)]
        overwrite: bool,
        /// Skips the additional palette checks on the reference
        #[arg(long)]
        lenient: bool,
    },
    /// Checks that resources re-encode to the exact same bytes
    Verify {
        /// Resource files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Skips the additional palette checks
        #[arg(long)]
        lenient: bool,
    },
}

pub fn print_help() {
    if let Err(err) = FsUnpackCli::command().print_help() {
        eprintln!("{}", err);
    }
}

fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Flags given on the command line win over the config file.
fn job_options(command: &Commands, config: Config) -> (Action, Vec<PathBuf>, JobOptions) {
    match command {
        Commands::Unpack {
            files,
            output_dir,
            overwrite,
            lenient,
            preview,
            keep_palette,
        } => (
            Action::Unpack,
            files.clone(),
            JobOptions {
                strict: config.strict && !lenient,
                overwrite: config.overwrite || *overwrite,
                output_dir: output_dir.clone().or(config.output_dir),
                preview: config.preview || *preview,
                keep_palette: *keep_palette,
                reference_dir: None,
            },
        ),
        Commands::Pack {
            bitmaps,
            reference_dir,
            output_dir,
            overwrite,
            lenient,
        } => (
            Action::Pack,
            bitmaps.clone(),
            JobOptions {
                strict: config.strict && !lenient,
                overwrite: config.overwrite || *overwrite,
                output_dir: output_dir.clone().or(config.output_dir),
                preview: false,
                keep_palette: false,
                reference_dir: reference_dir.clone(),
            },
        ),
        Commands::Verify { files, lenient } => (
            Action::Verify,
            files.clone(),
            JobOptions {
                strict: config.strict && !lenient,
                ..Default::default()
            },
        ),
    }
}

/// Runs command-line options
pub fn cli() -> CliRes {
    // No arguments
    if std::env::args().len() <= 1 {
        return CliRes::NoCli;
    }

    let cli = FsUnpackCli::parse();

    // logger is not up yet
    let config = match &cli.config {
        Some(path) => parse_config_from_file(path),
        None => parse_config(),
    };

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error parsing config: {}", err);
            return CliRes::Err;
        }
    };

    init_logger(cli.verbose);

    let (action, inputs, options) = job_options(&cli.command, config);

    if let Some(output_dir) = &options.output_dir {
        if let Err(err) = std::fs::create_dir_all(output_dir) {
            error!("Cannot create {}: {}", output_dir.display(), err);
            return CliRes::Err;
        }
    }

    let summary = run_queue(action, &inputs, &options);

    if summary.nothing_succeeded() {
        CliRes::Err
    } else {
        CliRes::Ok
    }
}
