//! Views of templates and releases as returned by the XL Release REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state reported by the server for a release or template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    Template,
    Planned,
    InProgress,
    Paused,
    Failing,
    Failed,
    Completed,
    Aborted,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseTemplateView {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReleaseStatus>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 strings or epoch milliseconds; anything else reads as no date.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        serde_json::Value::String(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseView {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReleaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// Caller-supplied part of a release creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start_date: Option<DateTime<Utc>>,
}

/// Wire body for `POST /releases`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateReleaseBody<'a> {
    pub template_id: &'a str,
    pub version: &'a str,
    #[serde(flatten)]
    pub options: &'a ReleaseOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_tolerates_sparse_and_extra_fields() {
        let json = r#"[
            {"id": "Applications/Release1", "title": "Release A", "status": "TEMPLATE", "owner": "admin"},
            {"id": "Applications/Release2", "title": "Other"}
        ]"#;

        let templates: Vec<ReleaseTemplateView> = serde_json::from_str(json).unwrap();

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].status, Some(ReleaseStatus::Template));
        assert!(templates[1].tags.is_empty());
        assert!(templates[1].description.is_none());
    }

    #[test]
    fn descriptive_fields_never_fail_a_listing() {
        let json = r#"[
            {"id": "a", "title": "Release A", "tags": null, "dueDate": 1427972400000},
            {"id": "b", "title": "Release B", "scheduledStartDate": "soon", "dueDate": {"at": 1}},
            {"id": "c", "title": "Release C", "tags": ["web"], "dueDate": "2015-04-02T11:00:00+0200"}
        ]"#;

        let templates: Vec<ReleaseTemplateView> = serde_json::from_str(json).unwrap();

        assert!(templates[0].tags.is_empty());
        assert_eq!(
            templates[0].due_date.unwrap().to_rfc3339(),
            "2015-04-02T11:00:00+00:00"
        );
        assert!(templates[1].scheduled_start_date.is_none());
        assert!(templates[1].due_date.is_none());
        assert_eq!(templates[2].tags, vec!["web".to_string()]);
        assert_eq!(
            templates[2].due_date.unwrap().to_rfc3339(),
            "2015-04-02T09:00:00+00:00"
        );
    }

    #[test]
    fn unknown_status_does_not_fail_parsing() {
        let view: ReleaseView =
            serde_json::from_str(r#"{"id": "Release7", "status": "ARCHIVED"}"#).unwrap();
        assert_eq!(view.status, Some(ReleaseStatus::Unknown));
    }

    #[test]
    fn release_without_id_is_rejected() {
        let parsed: Result<ReleaseView, _> = serde_json::from_str(r#"{"title": "nope"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn create_body_embeds_template_and_version() {
        let mut options = ReleaseOptions {
            title: Some("Shop 1.4.0".to_string()),
            ..Default::default()
        };
        options
            .variables
            .insert("environment".to_string(), "staging".to_string());

        let body = CreateReleaseBody {
            template_id: "Applications/Release1",
            version: "1.4.0",
            options: &options,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["templateId"], "Applications/Release1");
        assert_eq!(json["version"], "1.4.0");
        assert_eq!(json["title"], "Shop 1.4.0");
        assert_eq!(json["variables"]["environment"], "staging");
        assert!(json.get("scheduledStartDate").is_none());
    }
}
