use clap::Args;

use xlrelease::utils::template;
use xlrelease::{Notifier, NotifyOutcome};

use super::{parse_vars, CmdResult, GlobalArgs, Session};

#[derive(Args)]
pub struct NotifyArgs {
    /// Template title filter; `${NAME}` build variables are expanded
    #[arg(long)]
    template: String,
    /// Release version; `${NAME}` build variables are expanded
    #[arg(long)]
    version: String,
    /// Release variable as KEY=VALUE (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
    /// Create the release without starting it
    #[arg(long)]
    no_start: bool,
    /// Log candidate templates
    #[arg(long)]
    verbose: bool,
    /// Credential name (defaults to the first configured credential)
    #[arg(long)]
    credential: Option<String>,
}

pub fn run(args: NotifyArgs, global: &GlobalArgs) -> CmdResult<NotifyOutcome> {
    let session = Session::open(global)?;

    let notifier = Notifier {
        credential: args.credential,
        template: args.template,
        version: args.version,
        variables: parse_vars(&args.vars)?,
        start: !args.no_start,
        verbose: args.verbose,
    };

    let (_, registry) = session.registry_for(notifier.credential.as_deref())?;
    let outcome = notifier.run(
        &registry,
        &template::environment(),
        Some(session.settings.timeout()),
    )?;

    Ok((outcome, 0))
}
