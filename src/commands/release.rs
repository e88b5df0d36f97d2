use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use xlrelease::utils::validation;
use xlrelease::{ReleaseOptions, ReleaseServer, ReleaseView};

use super::{parse_vars, CmdResult, GlobalArgs, Session};

#[derive(Args)]
pub struct ReleaseArgs {
    #[command(subcommand)]
    command: ReleaseCommand,
}

#[derive(Subcommand)]
enum ReleaseCommand {
    /// Create a release from a template
    Create {
        /// Template id as returned by `templates`
        #[arg(long)]
        template_id: String,
        /// Version the release is created for
        #[arg(long)]
        version: String,
        /// Release title (server default when omitted)
        #[arg(long)]
        title: Option<String>,
        /// Release variable as KEY=VALUE (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Scheduled start date (RFC 3339)
        #[arg(long)]
        scheduled_start: Option<DateTime<Utc>>,
        /// Credential name (defaults to the first configured credential)
        #[arg(long)]
        credential: Option<String>,
    },
    /// Start a created release
    Start {
        /// Release id
        release_id: String,
        /// Credential name (defaults to the first configured credential)
        #[arg(long)]
        credential: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOutput {
    command: String,
    credential: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    release: Option<ReleaseView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started: Option<String>,
}

pub fn run(args: ReleaseArgs, global: &GlobalArgs) -> CmdResult<ReleaseOutput> {
    let session = Session::open(global)?;

    match args.command {
        ReleaseCommand::Create {
            template_id,
            version,
            title,
            vars,
            scheduled_start,
            credential,
        } => {
            let template_id =
                validation::require_non_empty(&template_id, "templateId", "Template id cannot be empty")?;
            let version = validation::require_non_empty(&version, "version", "Version cannot be empty")?;
            let options = ReleaseOptions {
                title,
                variables: parse_vars(&vars)?,
                scheduled_start_date: scheduled_start,
            };

            let (credential, server) = session.connect(credential.as_deref())?;
            let release = server.create_release(template_id, version, &options)?;

            Ok((
                ReleaseOutput {
                    command: "release.create".to_string(),
                    credential,
                    release: Some(release),
                    started: None,
                },
                0,
            ))
        }

        ReleaseCommand::Start {
            release_id,
            credential,
        } => {
            let release_id =
                validation::require_non_empty(&release_id, "releaseId", "Release id cannot be empty")?;
            let (credential, server) = session.connect(credential.as_deref())?;
            server.start_release(release_id)?;

            Ok((
                ReleaseOutput {
                    command: "release.start".to_string(),
                    credential,
                    release: None,
                    started: Some(release_id.to_string()),
                },
                0,
            ))
        }
    }
}
