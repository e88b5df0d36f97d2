use clap::Args;
use serde::Serialize;

use xlrelease::ReleaseServer;

use super::{CmdResult, GlobalArgs, Session};

#[derive(Args)]
pub struct CheckArgs {
    /// Credential name (defaults to the first configured credential)
    #[arg(long)]
    credential: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutput {
    credential: String,
    server_url: String,
    diagnostic: String,
}

pub fn run(args: CheckArgs, global: &GlobalArgs) -> CmdResult<CheckOutput> {
    let session = Session::open(global)?;
    let (credential, server) = session.connect(args.credential.as_deref())?;
    let diagnostic = server.check_connectivity()?;

    Ok((
        CheckOutput {
            credential,
            server_url: server.base_url().to_string(),
            diagnostic,
        },
        0,
    ))
}
