use axum::body::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::Config;
use crate::error::AudioError;
use crate::models::Department;

static CALL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

pub fn validate_call_id(call_id: &str) -> Result<(), AudioError> {
    if CALL_ID.is_match(call_id) {
        Ok(())
    } else {
        Err(AudioError::InvalidCallId(call_id.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Recording {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Relays call recordings from the per-department roleplay servers.
pub struct AudioProxy {
    client: reqwest::Client,
    d1_base_url: String,
    r1_base_url: String,
}

impl AudioProxy {
    pub fn new(client: reqwest::Client, d1_base_url: impl Into<String>, r1_base_url: impl Into<String>) -> Self {
        Self {
            client,
            d1_base_url: d1_base_url.into(),
            r1_base_url: r1_base_url.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(client, config.d1_api_url.clone(), config.r1_api_url.clone())
    }

    /// State clients record on the D1 server, everyone else on R1.
    pub fn base_url(&self, department: Department) -> &str {
        match department {
            Department::B2g => &self.d1_base_url,
            Department::B2b => &self.r1_base_url,
        }
    }

    pub fn recording_url(&self, call_id: &str, department: Department) -> String {
        format!(
            "{}/api/recording/{}",
            self.base_url(department).trim_end_matches('/'),
            call_id
        )
    }

    /// Downloads one recording. The id is checked before anything goes on
    /// the wire.
    pub async fn fetch_recording(&self, call_id: &str, department: Department) -> Result<Recording, AudioError> {
        validate_call_id(call_id)?;

        let url = self.recording_url(call_id, department);
        tracing::debug!(%url, "fetching recording");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "audio/webm, audio/*")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AudioError::NotFound);
        }
        if !status.is_success() {
            return Err(AudioError::Upstream {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?;

        Ok(Recording { content_type, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_recording_server, FOUND_ID, MISSING_ID};
    use std::sync::atomic::Ordering;

    #[test]
    fn accepts_only_canonical_uuids() {
        assert!(validate_call_id("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2").is_ok());
        assert!(validate_call_id("3D7F5D6F-24F7-4E8E-8B4B-3E7E44B4A7B2").is_ok());

        for bad in [
            "not-a-uuid",
            "",
            "3d7f5d6f24f74e8e8b4b3e7e44b4a7b2",
            "{3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2}",
            "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2x",
            "../../etc/passwd",
        ] {
            assert!(
                matches!(validate_call_id(bad), Err(AudioError::InvalidCallId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn departments_map_to_their_servers() {
        let proxy = AudioProxy::new(reqwest::Client::new(), "https://d1.example/", "https://r1.example");
        assert_eq!(
            proxy.recording_url(FOUND_ID, Department::B2g),
            format!("https://d1.example/api/recording/{FOUND_ID}")
        );
        assert_eq!(
            proxy.recording_url(FOUND_ID, Department::from_query(Some("b2b"))),
            format!("https://r1.example/api/recording/{FOUND_ID}")
        );
        assert_eq!(proxy.base_url(Department::from_query(Some("other"))), "https://r1.example");
    }

    #[tokio::test]
    async fn relays_body_and_content_type() {
        let upstream = spawn_recording_server().await;
        let proxy = AudioProxy::new(reqwest::Client::new(), &upstream.base_url, "http://127.0.0.1:9");

        let recording = proxy.fetch_recording(FOUND_ID, Department::B2g).await.unwrap();
        assert_eq!(recording.content_type, "audio/ogg");
        assert_eq!(&recording.bytes[..], b"OggS-fake-audio");
    }

    #[tokio::test]
    async fn upstream_statuses_are_classified() {
        let upstream = spawn_recording_server().await;
        let proxy = AudioProxy::new(reqwest::Client::new(), "http://127.0.0.1:9", &upstream.base_url);

        assert!(matches!(
            proxy.fetch_recording(MISSING_ID, Department::B2b).await,
            Err(AudioError::NotFound)
        ));
        assert!(matches!(
            proxy.fetch_recording("11111111-2222-4333-8444-555555555555", Department::B2b).await,
            Err(AudioError::Upstream { status: 503 })
        ));
    }

    #[tokio::test]
    async fn invalid_id_never_reaches_upstream() {
        let upstream = spawn_recording_server().await;
        let proxy = AudioProxy::new(reqwest::Client::new(), &upstream.base_url, &upstream.base_url);

        let result = proxy.fetch_recording("not-a-uuid", Department::B2g).await;
        assert!(matches!(result, Err(AudioError::InvalidCallId(_))));
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
    }
}
