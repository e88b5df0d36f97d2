use clap::{Args, Subcommand};
use serde::Serialize;

use super::{CmdResult, CredentialSummary, GlobalArgs, Session};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display global settings
    Show,
    /// Change global defaults (an empty value clears a URL)
    Set {
        /// Default XL Release server URL
        #[arg(long)]
        server_url: Option<String>,
        /// Default proxy URL
        #[arg(long)]
        proxy_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    command: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_url: Option<String>,
    timeout_secs: u64,
    credentials: Vec<CredentialSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    updated: Vec<String>,
}

fn blank_to_none(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let mut session = Session::open(global)?;
    let mut updated = Vec::new();

    let command = match args.command {
        ConfigCommand::Show => "config.show",
        ConfigCommand::Set {
            server_url,
            proxy_url,
            timeout_secs,
        } => {
            if server_url.is_none() && proxy_url.is_none() && timeout_secs.is_none() {
                return Err(xlrelease::Error::validation_missing_argument(vec![
                    "--server-url".to_string(),
                    "--proxy-url".to_string(),
                    "--timeout-secs".to_string(),
                ]));
            }

            if let Some(url) = server_url {
                session.settings.server_url = blank_to_none(url);
                updated.push("serverUrl".to_string());
            }
            if let Some(url) = proxy_url {
                session.settings.proxy_url = blank_to_none(url);
                updated.push("proxyUrl".to_string());
            }
            if let Some(secs) = timeout_secs {
                if secs == 0 {
                    return Err(xlrelease::Error::validation_invalid_argument(
                        "timeoutSecs",
                        "Timeout must be at least one second",
                        None,
                    ));
                }
                session.settings.timeout_secs = secs;
                updated.push("timeoutSecs".to_string());
            }

            session.save()?;
            "config.set"
        }
    };

    let settings = &session.settings;
    Ok((
        ConfigOutput {
            command: command.to_string(),
            path: session.store.path().to_string_lossy().to_string(),
            server_url: settings.server_url.clone(),
            proxy_url: settings.proxy_url.clone(),
            timeout_secs: settings.timeout_secs,
            credentials: settings
                .credentials
                .iter()
                .map(|c| CredentialSummary::from_credential(c, settings))
                .collect(),
            updated,
        },
        0,
    ))
}
