// Licensed under the Apache-2.0 license

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod hal_gen;

#[derive(Parser)]
#[command(author, version, about = "Register HAL build tasks", long_about = None)]
struct Xtask {
    /// More log output; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the register definitions into one generated artifact.
    ///
    /// The artifact is chosen by the file name of DEST: lwhal_addr_ids.h,
    /// lwhal_field_ids.h, lwhal_value_ids.h, lwhal_bindings.py,
    /// lwhal_table_<device>.c or lwhal_table_<device>.d.
    HalGen {
        /// Register definition file
        dsl: PathBuf,

        /// Devices manifest (TOML)
        devices: PathBuf,

        /// Root of the drivers tree holding the hardware headers
        drivers_root: PathBuf,

        /// Output file
        dest: PathBuf,

        /// Also write a dependency manifest for a table source
        #[arg(long, value_name = "PATH")]
        dependencies_file: Option<PathBuf>,

        /// Allow-list for the bindings (default: allowlist.txt next to DSL)
        #[arg(long, value_name = "PATH")]
        allow_list: Option<PathBuf>,

        /// Compiler configuration (TOML)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Xtask::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logging: {err}");
    }

    let result = match &cli.xtask {
        Commands::HalGen {
            dsl,
            devices,
            drivers_root,
            dest,
            dependencies_file,
            allow_list,
            config,
        } => hal_gen::generate(
            dsl,
            devices,
            drivers_root,
            dest,
            dependencies_file.as_deref(),
            allow_list.as_deref(),
            config.as_deref(),
        ),
    };
    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
