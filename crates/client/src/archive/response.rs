//! Snapshot-availability response types.

use serde::Deserialize;

/// Raw response from the snapshot-availability endpoint.
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub archived_snapshots: ArchivedSnapshots,
}

/// Container for the closest archived snapshot, when one exists.
#[derive(Debug, Default, Deserialize)]
pub struct ArchivedSnapshots {
    #[serde(default)]
    pub closest: Option<ClosestSnapshot>,
}

/// The closest archived snapshot of a URL.
#[derive(Debug, Deserialize)]
pub struct ClosestSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl AvailabilityResponse {
    /// The snapshot URL to fetch, when the archive reported a resolvable one.
    pub fn snapshot_url(&self) -> Option<&str> {
        self.archived_snapshots
            .closest
            .as_ref()
            .map(|c| c.url.as_str())
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_JSON: &str = r#"{
        "url": "http://example.com/",
        "archived_snapshots": {
            "closest": {
                "status": "200",
                "available": true,
                "url": "http://web.archive.org/web/20240101000000/http://example.com/",
                "timestamp": "20240101000000"
            }
        }
    }"#;

    #[test]
    fn test_deserialize_closest_snapshot() {
        let response: AvailabilityResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        assert_eq!(
            response.snapshot_url(),
            Some("http://web.archive.org/web/20240101000000/http://example.com/")
        );

        let closest = response.archived_snapshots.closest.unwrap();
        assert!(closest.available);
        assert_eq!(closest.timestamp.as_deref(), Some("20240101000000"));
        assert_eq!(closest.status.as_deref(), Some("200"));
    }

    #[test]
    fn test_no_snapshots_reported() {
        let json = r#"{"url": "http://example.com/", "archived_snapshots": {}}"#;
        let response: AvailabilityResponse = serde_json::from_str(json).unwrap();
        assert!(response.snapshot_url().is_none());
    }

    #[test]
    fn test_empty_snapshot_url_is_none() {
        let json = r#"{"archived_snapshots": {"closest": {"url": "", "available": false}}}"#;
        let response: AvailabilityResponse = serde_json::from_str(json).unwrap();
        assert!(response.snapshot_url().is_none());
    }

    #[test]
    fn test_missing_container_defaults_empty() {
        let json = r#"{"url": "http://example.com/"}"#;
        let response: AvailabilityResponse = serde_json::from_str(json).unwrap();
        assert!(response.snapshot_url().is_none());
    }
}
