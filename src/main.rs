//! droidpack - Android packaging descriptor tool
//!
//! Entry point: parses the command line, loads the descriptor and runs
//! the selected command. Exit status is 0 on success and 1 on any error.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use droidpack::commands::{
    self, BuildCommand, CheckUpgradeCommand, PlanArgs, PlanCommand, ResolveCommand, ShowCommand,
    VariantsCommand,
};

#[derive(Parser, Debug)]
#[command(name = "droidpack", version, about = "Load Android packaging descriptors and build signed variants")]
struct Cli {
    /// Descriptor file (default: droidpack.toml found from the current directory upwards)
    #[arg(short = 'f', long = "file", global = true)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the application descriptor
    Show {
        #[arg(long)]
        json: bool,
    },
    /// List declared build variants
    Variants,
    /// Resolve a build variant and bind its signing profile
    Resolve {
        variant: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the Gradle build plan for a variant
    Plan {
        variant: String,
        /// Plan an App Bundle instead of an APK
        #[arg(long)]
        bundle: bool,
        /// Gradle module holding the application
        #[arg(long, default_value = "app")]
        module: String,
        #[arg(long)]
        json: bool,
    },
    /// Build a signed artifact with Gradle
    Build {
        variant: String,
        #[arg(long)]
        bundle: bool,
        #[arg(long, default_value = "app")]
        module: String,
        /// JDK used by Gradle (sets JAVA_HOME)
        #[arg(long)]
        java_home: Option<PathBuf>,
        /// Android SDK used by Gradle (sets ANDROID_HOME and ANDROID_SDK_ROOT)
        #[arg(long)]
        android_home: Option<PathBuf>,
    },
    /// Verify this descriptor is a valid successor of a published one
    CheckUpgrade {
        /// Descriptor of the previously published release
        previous: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    droidpack::init_logging(cli.verbose);
    debug!("droidpack v{}", droidpack::VERSION);

    let status = report(run(cli), &mut std::io::stderr());
    ExitCode::from(status)
}

/// Print the diagnostic for a failed run and pick the exit status
fn report(result: Result<()>, err_out: &mut dyn Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(err_out, "error: {:#}", err);
            1
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = commands::locate_descriptor(cli.file.as_deref(), &cwd)?;
    let descriptor = commands::load_descriptor(&path)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Show { json } => ShowCommand { json }.execute(&descriptor, &mut out),
        Command::Variants => VariantsCommand.execute(&descriptor, &mut out),
        Command::Resolve { variant, json } => ResolveCommand { variant, json }.execute(&descriptor, &mut out),
        Command::Plan {
            variant,
            bundle,
            module,
            json,
        } => PlanCommand {
            args: PlanArgs { variant, bundle, module },
            json,
        }
        .execute(&descriptor, &mut out),
        Command::Build {
            variant,
            bundle,
            module,
            java_home,
            android_home,
        } => BuildCommand {
            args: PlanArgs { variant, bundle, module },
            java_home,
            android_home,
        }
        .execute(&descriptor, &mut out)
        .map(|_| ()),
        Command::CheckUpgrade { previous } => CheckUpgradeCommand { previous }.execute(&descriptor, &mut out),
    }
}
