//! Remote graph retrieval
//!
//! Remote sources are downloaded once, before any session exists, into a
//! named temporary file. The file keeps the extension of the URL path so the
//! extension rules still classify it.

use super::{SourceError, SourceResult};
use std::io::Write;
use std::time::Duration;
use tempfile::TempPath;
use tracing::{debug, info};

/// Whether a location names a remote (HTTP) source
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Extension to give the downloaded copy, taken from the URL path.
/// `.gz` keeps the extension in front of it (`.graphml.gz`).
pub fn remote_suffix(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    // Path part only; a bare host has no extension
    let Some((_, path)) = after_scheme.split_once('/') else {
        return String::new();
    };
    let file_name = path.rsplit('/').next().unwrap_or("");
    let parts: Vec<&str> = file_name.split('.').collect();
    match parts.len() {
        0 | 1 => String::new(),
        2 => format!(".{}", parts[1]),
        n if parts[n - 1].eq_ignore_ascii_case("gz") => {
            format!(".{}.{}", parts[n - 2], parts[n - 1])
        }
        n => format!(".{}", parts[n - 1]),
    }
}

fn unreachable(url: &str, err: impl std::fmt::Display) -> SourceError {
    SourceError::Unreachable {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Download `url` into a temporary file that is removed when the returned
/// path is dropped.
pub fn fetch_to_temp(url: &str, timeout: Duration) -> SourceResult<TempPath> {
    info!(%url, ?timeout, "fetching remote graph");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| unreachable(url, e))?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| unreachable(url, e))?;
    let body = response.bytes().map_err(|e| unreachable(url, e))?;

    let mut file = tempfile::Builder::new()
        .prefix("grandlite-")
        .suffix(&remote_suffix(url))
        .tempfile()?;
    file.write_all(&body)?;
    file.flush()?;
    debug!(bytes = body.len(), path = %file.path().display(), "remote graph downloaded");
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Resolver;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    const GRAPHML: &str = r#"<graphml><graph edgedefault="directed">
<node id="a"/><node id="b"/><edge source="a" target="b"/>
</graph></graphml>"#;

    /// Answer a single HTTP request on a loopback port; returns the base URL
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // request line and headers end with an empty line
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        });
        (base, handle)
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.org/g.gml"));
        assert!(is_remote("https://example.org/g.gml"));
        assert!(!is_remote("edgelist://g.txt"));
        assert!(!is_remote("/tmp/http.gml"));
    }

    #[test]
    fn test_remote_suffix() {
        assert_eq!(remote_suffix("https://host/data/graph.graphml"), ".graphml");
        assert_eq!(remote_suffix("https://host/data/graph.gml.gz?raw=1"), ".gml.gz");
        assert_eq!(remote_suffix("https://host/v1.2/edges"), "");
        assert_eq!(remote_suffix("https://host"), "");
        assert_eq!(remote_suffix("http://host/a.b.csv#frag"), ".csv");
    }

    #[test]
    fn test_unreachable_host_is_reported() {
        // Nothing listens on port 1 of the loopback interface
        let err = fetch_to_temp("http://127.0.0.1:1/graph.gml", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unreachable { .. }));
    }

    #[test]
    fn test_download_keeps_extension() {
        let (base, server) = serve_once("200 OK", GRAPHML);
        let path = fetch_to_temp(&format!("{}/data/small.graphml", base), Duration::from_secs(5))
            .unwrap();
        server.join().unwrap();

        assert!(path.to_string_lossy().ends_with(".graphml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), GRAPHML);
    }

    #[test]
    fn test_remote_graph_resolves() {
        let (base, server) = serve_once("200 OK", GRAPHML);
        let store = Resolver::default()
            .resolve(&format!("{}/small.graphml?raw=1", base))
            .unwrap();
        server.join().unwrap();

        assert!(store.is_directed());
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_error_status_is_unreachable() {
        let (base, server) = serve_once("404 Not Found", "missing");
        let err = fetch_to_temp(&format!("{}/gone.gml", base), Duration::from_secs(5)).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, SourceError::Unreachable { .. }));
    }
}
