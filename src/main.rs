use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{check, config, credential, notify, release, templates};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "xlrelease")]
#[command(version = VERSION)]
#[command(about = "Create and start XL Release releases from CI builds")]
struct Cli {
    /// Settings file (default: ~/.config/xlrelease/settings.json or $XLRELEASE_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage global server defaults
    Config(config::ConfigArgs),
    /// Manage named XL Release credentials
    #[command(visible_alias = "credentials")]
    Credential(credential::CredentialArgs),
    /// Check that the XL Release server is reachable
    Check(check::CheckArgs),
    /// Search release templates by title
    Templates(templates::TemplatesArgs),
    /// Create or start a single release
    Release(release::ReleaseArgs),
    /// Run the build step: create a release from a template and start it
    Notify(notify::NotifyArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
