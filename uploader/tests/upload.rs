use assert_cmd::Command;
use predicates::prelude::*;
use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

#[derive(Debug)]
struct Request {
    line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// answer one request per connection with the given (status, body) pairs
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();

        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut line = String::new();
            reader.read_line(&mut line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                let (key, value) = header.split_once(':').unwrap();
                headers.push((key.trim().to_owned(), value.trim().to_owned()));
            }

            let length = headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
                .map(|(_, value)| value.parse::<usize>().unwrap())
                .unwrap_or(0);
            let mut request_body = vec![0; length];
            reader.read_exact(&mut request_body).unwrap();

            write!(
                stream,
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();

            requests.push(Request {
                line: line.trim_end().to_owned(),
                headers,
                body: request_body,
            });
        }

        requests
    });

    (address, handle)
}

fn upload() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_benchflux-upload"));
    cmd.env_remove("BENCHFLUX_REPOSITORY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_upload_creates_release_and_asset() {
    let dir = tempfile::tempdir().unwrap();
    let asset = dir.path().join("graph-algorithms-3.4.0.jar");
    fs::write(&asset, b"PK\x03\x04jar bytes").unwrap();

    let (address, server) = serve(vec![(201, "{\"id\": 17, \"tag_name\": \"3.4.0\"}"), (201, "{}")]);

    upload()
        .env("GITHUB_TOKEN", "secret")
        .args(["--repository", "owner/repo", "--api-url", &address, "--upload-url", &address])
        .args(["--content-type", "application/java-archive"])
        .arg("3.4.0")
        .arg(&asset)
        .assert()
        .success()
        .stdout("17\n");

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].line, "POST /repos/owner/repo/releases HTTP/1.1");
    assert_eq!(requests[0].header("authorization"), Some("token secret"));
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["tag_name"], "3.4.0");
    assert_eq!(payload["name"], "3.4.0");

    assert_eq!(
        requests[1].line,
        "POST /repos/owner/repo/releases/17/assets?name=graph-algorithms-3.4.0.jar HTTP/1.1"
    );
    assert_eq!(requests[1].header("content-type"), Some("application/java-archive"));
    assert_eq!(requests[1].header("authorization"), Some("token secret"));
    assert_eq!(requests[1].body, b"PK\x03\x04jar bytes");
}

#[test]
fn test_upload_fails_on_rejected_release() {
    let dir = tempfile::tempdir().unwrap();
    let asset = dir.path().join("a.jar");
    fs::write(&asset, b"bytes").unwrap();

    let (address, server) = serve(vec![(422, "{\"message\": \"Validation Failed\"}")]);

    upload()
        .env("GITHUB_TOKEN", "secret")
        .args(["--repository", "owner/repo", "--api-url", &address])
        .arg("3.4.0")
        .arg(&asset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("422"));

    assert_eq!(server.join().unwrap().len(), 1);
}

#[test]
fn test_upload_fails_without_release_id() {
    let dir = tempfile::tempdir().unwrap();
    let asset = dir.path().join("a.jar");
    fs::write(&asset, b"bytes").unwrap();

    let (address, server) = serve(vec![(201, "{\"tag_name\": \"3.4.0\"}")]);

    upload()
        .env("GITHUB_TOKEN", "secret")
        .args(["--repository", "owner/repo", "--api-url", &address])
        .arg("3.4.0")
        .arg(&asset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("id"));

    assert_eq!(server.join().unwrap().len(), 1);
}

#[test]
fn test_upload_requires_token() {
    upload()
        .env_remove("GITHUB_TOKEN")
        .args(["--repository", "owner/repo", "3.4.0", "a.jar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn test_upload_usage_exits_with_one() {
    upload()
        .args(["--repository", "owner/repo", "3.4.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));

    upload()
        .args(["--repository", "owner/repo", "3.4.0", "a.jar", "extra"])
        .assert()
        .code(1);
}
