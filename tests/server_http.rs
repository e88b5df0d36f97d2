use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use xlrelease::{
    ErrorCode, Notifier, ReleaseOptions, ReleaseServer, Secret, ServerConnection, XlReleaseServer,
};

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: String,
}

/// Serves the canned `(status, body)` responses in order, one per connection.
fn stub_server(responses: Vec<(u16, &'static str)>) -> (String, Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let recorded = handle(stream, status, body);
            if tx.send(recorded).is_err() {
                return;
            }
        }
    });

    (url, rx)
}

fn handle(stream: TcpStream, status: u16, body: &str) -> Recorded {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut request_body = vec![0u8; length];
    reader.read_exact(&mut request_body).unwrap();

    let mut stream = stream;
    let response = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();

    Recorded {
        method,
        path,
        headers,
        body: String::from_utf8(request_body).unwrap(),
    }
}

fn connect(url: &str) -> XlReleaseServer {
    let connection = ServerConnection::new(url, "", "admin", Secret::new("s3cret"));
    XlReleaseServer::with_timeout(&connection, Duration::from_secs(5)).unwrap()
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

const TEMPLATES: &str = r#"[
    {"id": "Applications/Release1", "title": "Release A"},
    {"id": "Applications/Release2", "title": "Other"},
    {"id": "Applications/Release3", "title": "Bug Release"}
]"#;

#[test]
fn search_filters_by_title_substring_in_server_order() {
    let (url, rx) = stub_server(vec![(200, TEMPLATES)]);
    let server = connect(&url);

    let templates = server.search_templates("Rel").unwrap();

    let titles: Vec<&str> = templates.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Release A", "Bug Release"]);

    let request = rx.recv().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/releases/templates");
    // admin:s3cret
    assert_eq!(request.headers["authorization"], "Basic YWRtaW46czNjcmV0");
    assert_eq!(request.headers["accept"], "application/json");
}

#[test]
fn search_is_case_sensitive() {
    let (url, _rx) = stub_server(vec![(200, TEMPLATES)]);
    let server = connect(&url);

    assert!(server.search_templates("rel").unwrap().is_empty());
}

#[test]
fn create_posts_template_and_version() {
    let (url, rx) = stub_server(vec![(200, r#"{"id": "Applications/Release9", "status": "PLANNED"}"#)]);
    let server = connect(&url);

    let mut options = ReleaseOptions::default();
    options
        .variables
        .insert("environment".to_string(), "staging".to_string());
    let release = server
        .create_release("Applications/Release1", "2.3.0", &options)
        .unwrap();

    assert_eq!(release.id, "Applications/Release9");

    let request = rx.recv().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/releases");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["templateId"], "Applications/Release1");
    assert_eq!(body["version"], "2.3.0");
    assert_eq!(body["variables"]["environment"], "staging");
}

#[test]
fn start_posts_to_release_path() {
    let (url, rx) = stub_server(vec![(200, "")]);
    let server = connect(&format!("{}/", url));

    server.start_release("Release9").unwrap();

    let request = rx.recv().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/releases/Release9/start");
}

#[test]
fn check_connectivity_describes_response() {
    let (url, rx) = stub_server(vec![(200, "[]")]);
    let server = connect(&url);

    let diagnostic = server.check_connectivity().unwrap();

    assert!(diagnostic.starts_with(&format!("GET {}/releases", url)));
    assert!(diagnostic.contains("200"));
    assert_eq!(rx.recv().unwrap().path, "/releases");
}

#[test]
fn error_status_surfaces_as_remote_status() {
    let (url, _rx) = stub_server(vec![(500, r#"{"error": "boom"}"#)]);
    let server = connect(&url);

    let err = server
        .create_release("T1", "1.0", &ReleaseOptions::default())
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteStatus);
    assert_eq!(err.details["status"], 500);
    assert!(err.details["body"].as_str().unwrap().contains("boom"));
}

#[test]
fn check_connectivity_fails_on_error_status() {
    let (url, _rx) = stub_server(vec![(500, "")]);
    let server = connect(&url);

    let err = server.check_connectivity().unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteStatus);
    assert_eq!(err.details["status"], 500);
    assert!(!err.code.is_connectivity());
}

#[test]
fn search_rejected_by_server_is_remote_status() {
    let (url, _rx) = stub_server(vec![(403, r#"{"error": "forbidden"}"#)]);
    let server = connect(&url);

    let err = server.search_templates("Rel").unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteStatus);
    assert_eq!(err.details["status"], 403);
    assert!(!err.hints.is_empty());
}

#[test]
fn search_tolerates_odd_descriptive_fields() {
    let (url, _rx) = stub_server(vec![(
        200,
        r#"[
            {"id": "Applications/Release1", "title": "Release A", "tags": null, "dueDate": 1427972400000},
            {"id": "Applications/Release2", "title": "Release B", "scheduledStartDate": false}
        ]"#,
    )]);
    let server = connect(&url);

    let templates = server.search_templates("Release").unwrap();

    assert_eq!(templates.len(), 2);
    assert!(templates[0].tags.is_empty());
    assert!(templates[0].due_date.is_some());
    assert!(templates[1].scheduled_start_date.is_none());
}

#[test]
fn start_escapes_release_id() {
    let (url, rx) = stub_server(vec![(200, "")]);
    let server = connect(&url);

    server.start_release("Applications/Release 9?x").unwrap();

    assert_eq!(
        rx.recv().unwrap().path,
        "/releases/Applications/Release%209%3Fx/start"
    );
}

#[test]
fn rejected_start_is_an_error() {
    let (url, _rx) = stub_server(vec![(404, "")]);
    let server = connect(&url);

    let err = server.start_release("Missing").unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteStatus);
}

#[test]
fn malformed_json_is_invalid_response() {
    let (url, _rx) = stub_server(vec![(200, r#"{"not": "an array"}"#)]);
    let server = connect(&url);

    let err = server.search_templates("").unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteInvalidResponse);
}

#[test]
fn refused_connection_is_connectivity_error_for_every_operation() {
    let server = connect(&closed_port_url());

    let errors = vec![
        server.check_connectivity().unwrap_err(),
        server.search_templates("x").unwrap_err(),
        server
            .create_release("T1", "1.0", &ReleaseOptions::default())
            .unwrap_err(),
        server.start_release("R1").unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.code, ErrorCode::RemoteConnectFailed, "{:?}", err);
        assert!(err.code.is_connectivity());
    }
}

#[test]
fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let holder = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(2));
        drop(stream);
    });

    let connection = ServerConnection::new(&url, "", "admin", Secret::new("pw"));
    let server = XlReleaseServer::with_timeout(&connection, Duration::from_millis(300)).unwrap();

    let err = server.search_templates("x").unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteTimeout);
    assert_eq!(err.retryable, Some(true));

    holder.join().unwrap();
}

#[test]
fn notifier_runs_full_flow_over_http() {
    let (url, rx) = stub_server(vec![
        (200, TEMPLATES),
        (200, r#"{"id": "Applications/Release42"}"#),
        (200, ""),
    ]);
    let server = connect(&url);
    let env = HashMap::from([("BUILD_NUMBER".to_string(), "7".to_string())]);

    let outcome = Notifier::new("Bug Release", "1.0.${BUILD_NUMBER}")
        .perform("ci", &server, &env)
        .unwrap();

    assert_eq!(outcome.template.id, "Applications/Release3");
    assert_eq!(outcome.release.id, "Applications/Release42");
    assert!(outcome.started);

    let paths: Vec<String> = rx.iter().take(3).map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/releases/templates",
            "/releases",
            "/releases/Applications/Release42/start"
        ]
    );
}
