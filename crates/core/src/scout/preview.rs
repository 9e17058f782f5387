//! Preview extraction from scraper output.
//!
//! A dry-run scraper announces the event it extracted by printing a line
//! containing [`PREVIEW_MARKER`] followed by a JSON object. Everything else
//! it prints is free-form log text.

use serde_json::{Map, Value};

/// Literal marker preceding the preview JSON on a line.
pub const PREVIEW_MARKER: &str = "PREVIEW_JSON:";

/// Incremental preview extractor fed one line at a time.
///
/// Only the first marker line is considered. If its JSON does not parse to
/// an object the scanner settles on "no preview" and ignores later markers.
#[derive(Debug, Default)]
pub struct PreviewScanner {
    settled: bool,
    preview: Option<Map<String, Value>>,
}

impl PreviewScanner {
    /// Create an empty scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one output line (without its trailing newline).
    pub fn observe(&mut self, line: &str) {
        if self.settled {
            return;
        }
        if let Some(idx) = line.find(PREVIEW_MARKER) {
            self.settled = true;
            let payload = line[idx + PREVIEW_MARKER.len()..].trim();
            self.preview = match serde_json::from_str::<Value>(payload) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) => {
                    tracing::debug!("Preview marker carried a non-object JSON value");
                    None
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Preview marker carried malformed JSON");
                    None
                }
            };
        }
    }

    /// Whether a marker line has been seen (well-formed or not).
    pub fn marker_seen(&self) -> bool {
        self.settled
    }

    /// Consume the scanner and return the preview, if any.
    pub fn finish(self) -> Option<Map<String, Value>> {
        self.preview
    }
}

/// Extract the preview object from an accumulated output buffer.
pub fn extract_preview(buffer: &str) -> Option<Map<String, Value>> {
    let mut scanner = PreviewScanner::new();
    for line in buffer.lines() {
        scanner.observe(line);
        if scanner.marker_seen() {
            break;
        }
    }
    scanner.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn single_marker_decodes_object() {
        let buffer = "Launching browser\n\
                      Navigating to https://example.com/events\n\
                      PREVIEW_JSON:{\"title\":\"Jazz Night\",\"venue\":\"Blue Note\"}\n\
                      Done\n";
        let preview = extract_preview(buffer).expect("preview");
        assert_eq!(
            Value::Object(preview),
            json!({"title": "Jazz Night", "venue": "Blue Note"})
        );
    }

    #[test]
    fn marker_may_follow_a_log_prefix() {
        let buffer = "[scout] 12:00:01 PREVIEW_JSON: {\"title\":\"Open Mic\"}  ";
        let preview = extract_preview(buffer).expect("preview");
        assert_eq!(preview["title"], "Open Mic");
    }

    #[test]
    fn malformed_json_yields_nothing() {
        let buffer = "PREVIEW_JSON:{\"title\": \"Broken\"\nmore output\n";
        assert!(extract_preview(buffer).is_none());
    }

    #[test]
    fn non_object_json_yields_nothing() {
        assert!(extract_preview("PREVIEW_JSON:[1,2,3]").is_none());
        assert!(extract_preview("PREVIEW_JSON:\"title\"").is_none());
    }

    #[test]
    fn first_marker_wins() {
        let buffer = "PREVIEW_JSON:{\"title\":\"First\"}\nPREVIEW_JSON:{\"title\":\"Second\"}\n";
        let preview = extract_preview(buffer).expect("preview");
        assert_eq!(preview["title"], "First");
    }

    #[test]
    fn malformed_first_marker_is_decisive() {
        let buffer = "PREVIEW_JSON:{oops\nPREVIEW_JSON:{\"title\":\"Second\"}\n";
        assert!(extract_preview(buffer).is_none());
    }

    #[test]
    fn no_marker_yields_nothing() {
        assert!(extract_preview("").is_none());
        assert!(extract_preview("just logs\nmore logs").is_none());
    }

    #[test]
    fn scanner_ignores_lines_after_settling() {
        let mut scanner = PreviewScanner::new();
        scanner.observe("warming up");
        assert!(!scanner.marker_seen());
        scanner.observe("PREVIEW_JSON:{\"venue\":\"Blue Note\"}");
        assert!(scanner.marker_seen());
        scanner.observe("PREVIEW_JSON:{\"venue\":\"Elsewhere\"}");
        assert_eq!(scanner.finish().unwrap()["venue"], "Blue Note");
    }
}
