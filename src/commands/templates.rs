use clap::Args;
use serde::Serialize;

use xlrelease::{ReleaseServer, ReleaseTemplateView};

use super::{CmdResult, GlobalArgs, Session};

#[derive(Args)]
pub struct TemplatesArgs {
    /// Case-sensitive substring of the template title (empty lists all)
    #[arg(default_value = "")]
    filter: String,

    /// Credential name (defaults to the first configured credential)
    #[arg(long)]
    credential: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesOutput {
    credential: String,
    filter: String,
    templates: Vec<ReleaseTemplateView>,
}

pub fn run(args: TemplatesArgs, global: &GlobalArgs) -> CmdResult<TemplatesOutput> {
    let session = Session::open(global)?;
    let (credential, server) = session.connect(args.credential.as_deref())?;
    let templates = server.search_templates(&args.filter)?;

    Ok((
        TemplatesOutput {
            credential,
            filter: args.filter,
            templates,
        },
        0,
    ))
}
