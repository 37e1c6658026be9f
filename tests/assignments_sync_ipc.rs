use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Routes = Vec<((&'static str, &'static str), &'static str)>;
type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim().to_ascii_lowercase();
            let v = v.trim().to_string();
            if k == "content-length" {
                content_length = v.parse().unwrap_or(0);
            }
            headers.push((k, v));
        }
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    }
    Some(RecordedRequest {
        method,
        path,
        headers,
    })
}

fn write_response(mut stream: &TcpStream, status: u16, body: &str) {
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let resp = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(resp.as_bytes());
    let _ = stream.flush();
}

fn spawn_school_server(routes: Routes) -> (String, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
    let addr = listener.local_addr().expect("server addr");
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let accept_log = Arc::clone(&log);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let log = Arc::clone(&accept_log);
            let routes = routes.clone();
            thread::spawn(move || {
                let Some(req) = read_request(&stream) else {
                    return;
                };
                log.lock().expect("log lock").push(req.clone());
                let found = routes
                    .iter()
                    .find(|((m, p), _)| *m == req.method && *p == req.path);
                match found {
                    Some((_, body)) => write_response(&stream, 200, body),
                    None => write_response(&stream, 404, ""),
                }
            });
        }
    });

    (format!("http://{}/", addr), log)
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_edutrackd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn edutrackd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn read_event(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read event line");
    assert!(!line.trim().is_empty(), "empty event line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse event json");
    assert!(value.get("event").is_some(), "expected event, got {}", value);
    value
}

#[test]
fn assign_and_remove_round_trip_updates_containers() {
    let (base_url, log) = spawn_school_server(vec![
        (("POST", "/school/assign-subject/7/3/"), "<li>Math</li>"),
        (
            ("POST", "/school/assign-class/7/12/"),
            "<li>8D</li><script>steal()</script>",
        ),
        (("POST", "/school/remove-subject/7/3/"), ""),
    ]);

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.open",
        json!({
            "baseUrl": base_url,
            "csrfToken": "tok-123",
            "teacherIds": ["7"]
        }),
    );
    let containers = opened["containers"]
        .as_array()
        .expect("containers")
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect::<Vec<_>>();
    assert!(containers.contains(&"assigned-subjects-7".to_string()));
    assert!(containers.contains(&"assigned-classes-7".to_string()));
    assert!(containers.contains(&"dynamic-content".to_string()));

    // Assign a subject; the reply is immediate, the fragment arrives as an
    // event once the server responds.
    let issued = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.assignSubject",
        json!({ "teacherId": "7", "subjectId": "3" }),
    );
    assert_eq!(issued["issued"], json!(true));
    assert_eq!(issued["container"], json!("assigned-subjects-7"));

    let updated = read_event(&mut reader);
    assert_eq!(updated["event"], json!("container.updated"));
    assert_eq!(updated["container"], json!("assigned-subjects-7"));
    assert_eq!(updated["html"], json!("<li>Math</li>"));
    assert_eq!(updated["jobId"], issued["jobId"]);

    let snap = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "containers.get",
        json!({ "container": "assigned-subjects-7" }),
    );
    assert_eq!(snap["content"], json!("<li>Math</li>"));
    assert!(snap["error"].is_null());

    // Exactly one POST so far, carrying the page's anti-forgery token.
    {
        let recorded = log.lock().expect("log lock");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "POST");
        assert_eq!(recorded[0].path, "/school/assign-subject/7/3/");
        assert_eq!(recorded[0].header("x-csrftoken"), Some("tok-123"));
    }

    // A cleared <select> issues nothing.
    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.assignSubject",
        json!({ "teacherId": "7", "subjectId": "" }),
    );
    assert_eq!(cleared["issued"], json!(false));

    // Script content is scrubbed before the fragment is applied.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.assignClass",
        json!({ "teacherId": "7", "classId": "12" }),
    );
    let class_event = read_event(&mut reader);
    assert_eq!(class_event["event"], json!("container.updated"));
    assert_eq!(class_event["container"], json!("assigned-classes-7"));
    assert_eq!(class_event["html"], json!("<li>8D</li>"));

    // Removal flows through the same pipeline; an empty fragment is a valid
    // full replacement.
    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.removeSubject",
        json!({ "teacherId": "7", "subjectId": "3" }),
    );
    assert_eq!(removed["issued"], json!(true));
    let remove_event = read_event(&mut reader);
    assert_eq!(remove_event["event"], json!("container.updated"));
    assert_eq!(remove_event["html"], json!(""));

    // The cleared select never reached the server.
    {
        let recorded = log.lock().expect("log lock");
        let paths = recorded.iter().map(|r| r.path.as_str()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                "/school/assign-subject/7/3/",
                "/school/assign-class/7/12/",
                "/school/remove-subject/7/3/",
            ]
        );
    }

    // Operations against a teacher that was never bound fail fast, before
    // any request is issued.
    writeln!(
        stdin,
        "{}",
        json!({
            "id": "7",
            "method": "assignments.assignSubject",
            "params": { "teacherId": "9", "subjectId": "3" }
        })
    )
    .expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let resp: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(resp["error"]["code"], json!("unknown_container"));

    drop(stdin);
    let _ = child.wait();
}
