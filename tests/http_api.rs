use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use decathlon_terminal::api::{HttpStandingsApi, ScoreSubmission, StandingsService};
use decathlon_terminal::binder::{RefreshOutcome, RenderPhase, StandingsTable};
use decathlon_terminal::error::StandingsError;
use decathlon_terminal::schema::CompetitionMode;
use decathlon_terminal::standings::PresentationOrdering;

/// Serves the canned `(status line, body)` replies in order, one per
/// connection, and hands back the request heads it saw.
fn serve(replies: Vec<(&'static str, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().expect("accept");
            seen.push(read_request(&mut stream));
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).expect("write reply");
        }
        seen
    });
    (base, handle)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn api(base: &str) -> HttpStandingsApi {
    HttpStandingsApi::new(base, Duration::from_secs(5)).expect("client")
}

#[test]
fn server_error_keeps_table_and_reports_error() {
    let (base, server) = serve(vec![
        (
            "200 OK",
            r#"[{"name":"A","scores":{"100m":900},"total":7000},{"name":"B","total":8000}]"#,
        ),
        ("500 Internal Server Error", "boom"),
    ]);
    let api = api(&base);
    let mut table = StandingsTable::new(CompetitionMode::Decathlon);

    let outcome = table.refresh(&api, CompetitionMode::Decathlon, PresentationOrdering::Ranked);
    assert_eq!(outcome, RefreshOutcome::Rendered { rows: 2 });
    let before = table.body().clone();
    assert_eq!(before.rows[0][0], "B");

    let outcome = table.refresh(&api, CompetitionMode::Decathlon, PresentationOrdering::Ranked);
    match outcome {
        RefreshOutcome::Failed(StandingsError::RemoteRejection { status, .. }) => {
            assert_eq!(status, 500)
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(table.phase(), RenderPhase::Error);
    assert_eq!(table.body(), &before);

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /api/standings?mode=DEC "));
}

#[test]
fn writes_carry_mode_code_and_surface_rejections() {
    let (base, server) = serve(vec![
        ("409 Conflict", "Competitor Kevin already exists"),
        ("200 OK", r#"{"points": 873}"#),
    ]);
    let api = api(&base);

    let err = api
        .add_competitor(CompetitionMode::Heptathlon, "Kevin")
        .unwrap_err();
    assert_eq!(err.remote_message(), Some("Competitor Kevin already exists"));

    let points = api
        .submit_score(&ScoreSubmission {
            name: "Kevin".to_string(),
            event: "800m".to_string(),
            raw: 128.4,
            mode: CompetitionMode::Heptathlon,
        })
        .unwrap();
    assert_eq!(points, 873.0);

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("POST /api/competitors?mode=HEP "));
    assert!(requests[0].contains(r#"{"name":"Kevin"}"#));
    assert!(requests[1].starts_with("POST /api/score "));
    assert!(requests[1].contains(r#""mode":"HEP""#));
}

#[test]
fn unreachable_service_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = api(&base)
        .fetch_standings(CompetitionMode::Decathlon)
        .unwrap_err();
    assert!(matches!(err, StandingsError::Network(_)));
}
