//! The build step: find a template, create a release from it, start it.

use crate::error::{Error, Result};
use crate::registry::CredentialRegistry;
use crate::release::{ReleaseOptions, ReleaseTemplateView, ReleaseView};
use crate::server::{ReleaseServer, XlReleaseServer, DEFAULT_TIMEOUT};
use crate::utils::template;
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

fn default_start() -> bool {
    true
}

/// Build-step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifier {
    /// Credential name; `None` uses the first configured credential.
    #[serde(default)]
    pub credential: Option<String>,
    /// Substring of the template title to create the release from.
    pub template: String,
    pub version: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default = "default_start")]
    pub start: bool,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOutcome {
    pub credential: String,
    pub template: ReleaseTemplateView,
    pub version: String,
    pub release: ReleaseView,
    pub started: bool,
}

impl Notifier {
    pub fn new(template: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            credential: None,
            template: template.into(),
            version: version.into(),
            variables: BTreeMap::new(),
            start: true,
            verbose: false,
        }
    }

    /// Resolves the credential against one registry snapshot, connects and
    /// performs the build step.
    pub fn run(
        &self,
        registry: &CredentialRegistry,
        env: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<NotifyOutcome> {
        let snapshot = registry.snapshot();
        let credential = snapshot.resolve_name(self.credential.as_deref())?;
        let connection = snapshot.lookup(&credential)?;
        let server =
            XlReleaseServer::with_timeout(&connection, timeout.unwrap_or(DEFAULT_TIMEOUT))?;

        self.perform(&credential, &server, env)
    }

    /// Runs the build step against an already connected server. Any failure
    /// stops the remaining steps; a created release is never rolled back.
    pub fn perform<S: ReleaseServer + ?Sized>(
        &self,
        credential: &str,
        server: &S,
        env: &HashMap<String, String>,
    ) -> Result<NotifyOutcome> {
        let filter = template::expand(&self.template, env);
        let version = template::expand(&self.version, env);
        validation::require_non_empty(&filter, "template", "Template filter cannot be empty")?;
        let version =
            validation::require_non_empty(&version, "version", "Version cannot be empty")?
                .to_string();

        let templates = server.search_templates(&filter)?;
        if self.verbose {
            for t in &templates {
                crate::log_status!("notify", "Candidate template {} ({})", t.title, t.id);
            }
        }
        let selected = select_template(&filter, templates)?;

        let options = ReleaseOptions {
            title: Some(format!("{} {}", selected.title, version)),
            variables: self
                .variables
                .iter()
                .map(|(k, v)| (k.clone(), template::expand(v, env)))
                .collect(),
            scheduled_start_date: None,
        };

        crate::log_status!(
            "notify",
            "Creating release '{}' from template {}",
            options.title.as_deref().unwrap_or_default(),
            selected.id
        );
        let release = server.create_release(&selected.id, &version, &options)?;

        if self.start {
            crate::log_status!("notify", "Starting release {}", release.id);
            server.start_release(&release.id)?;
        }

        Ok(NotifyOutcome {
            credential: credential.to_string(),
            template: selected,
            version,
            release,
            started: self.start,
        })
    }
}

/// Exact title match first, otherwise the first template the server listed.
fn select_template(
    filter: &str,
    templates: Vec<ReleaseTemplateView>,
) -> Result<ReleaseTemplateView> {
    let searched = templates.len();
    let mut exact = None;
    let mut first = None;

    for template in templates {
        if template.title == filter {
            exact = Some(template);
            break;
        }
        if first.is_none() {
            first = Some(template);
        }
    }

    if exact.is_none() && searched > 1 {
        crate::log_status!(
            "notify",
            "{} templates match '{}', using the first one",
            searched,
            filter
        );
    }

    exact
        .or(first)
        .ok_or_else(|| Error::template_not_found(filter, searched))
}
