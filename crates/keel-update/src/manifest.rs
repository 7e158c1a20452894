//! Release manifests and per-platform build selection

use keel_core::Platform;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

/// Release descriptor published per channel at `/<channel>/manifest.json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Channel the manifest was published for
    #[serde(rename = "Channel")]
    pub channel: String,

    /// Released version
    #[serde(rename = "Version")]
    pub version: String,

    /// Builds keyed by OS name, then architecture name
    #[serde(rename = "Builds")]
    pub builds: HashMap<String, HashMap<String, Build>>,
}

/// One downloadable artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Build {
    /// Artifact location, without the `.gz` suffix
    #[serde(rename = "URL")]
    pub url: String,

    /// Lowercase hex SHA1 of the decompressed artifact
    #[serde(rename = "Sha1")]
    pub sha1: String,
}

impl Build {
    /// A zero build carries neither URL nor digest
    pub fn is_empty(&self) -> bool {
        self.url.is_empty() || self.sha1.is_empty()
    }
}

impl Manifest {
    /// Parse a manifest from a JSON body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| UpdateError::Decode {
            what: "manifest",
            message: e.to_string(),
        })
    }

    /// Look up the build for a platform
    ///
    /// Missing OS or architecture keys yield an empty build, never an error.
    pub fn build_for(&self, platform: &Platform) -> Build {
        self.builds
            .get(&platform.os)
            .and_then(|arches| arches.get(&platform.arch))
            .cloned()
            .unwrap_or_default()
    }

    /// Look up the build for a platform, rejecting empty entries
    pub fn select_build(&self, platform: &Platform) -> Result<Build> {
        let build = self.build_for(platform);
        if build.is_empty() {
            return Err(UpdateError::UnsupportedPlatform {
                platform: platform.to_string(),
                channel: self.channel.clone(),
                available: self.platforms(),
            });
        }
        debug!("Selected build for {}: {}", platform, build.url);
        Ok(build)
    }

    /// Platforms with a usable build, sorted
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self
            .builds
            .iter()
            .flat_map(|(os, arches)| {
                arches
                    .iter()
                    .filter(|(_, build)| !build.is_empty())
                    .map(move |(arch, _)| format!("{}/{}", os, arch))
            })
            .collect();
        platforms.sort();
        platforms
    }
}

/// Fetches manifests from the release host
pub struct ManifestClient {
    client: reqwest::Client,
    host: String,
}

impl ManifestClient {
    pub fn new(client: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    /// URL of the manifest for a channel
    pub fn manifest_url(&self, channel: &str) -> String {
        format!(
            "{}/{}/manifest.json",
            self.host.trim_end_matches('/'),
            channel
        )
    }

    /// Fetch and decode the manifest for a channel
    pub async fn fetch(&self, channel: &str) -> Result<Manifest> {
        let url = self.manifest_url(channel);
        debug!("Fetching manifest from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| UpdateError::Network {
                context: format!("fetching {}", url),
                source,
            })?;

        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus {
                url,
                status: response.status(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| UpdateError::Network {
                context: format!("reading {}", url),
                source,
            })?;

        let manifest = Manifest::from_slice(&body)?;
        info!(
            "Channel {} is at version {}",
            manifest.channel, manifest.version
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_JSON: &str = r#"{
        "Channel": "stable",
        "Version": "2.0.0",
        "Builds": {
            "linux": {
                "amd64": {"URL": "http://x/y", "Sha1": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b"},
                "arm64": {"URL": "http://x/y-arm", "Sha1": "aa"}
            },
            "darwin": {
                "arm64": {"URL": "http://x/mac", "Sha1": "bb"}
            }
        }
    }"#;

    #[test]
    fn test_decode_manifest() {
        let manifest = Manifest::from_slice(MANIFEST_JSON.as_bytes()).unwrap();
        assert_eq!(manifest.channel, "stable");
        assert_eq!(manifest.version, "2.0.0");
        assert_eq!(
            manifest.build_for(&Platform::new("linux", "amd64")),
            Build {
                url: "http://x/y".to_string(),
                sha1: "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_platform_is_zero_build() {
        let manifest = Manifest::from_slice(MANIFEST_JSON.as_bytes()).unwrap();

        let unknown_os = manifest.build_for(&Platform::new("plan9", "amd64"));
        assert_eq!(unknown_os, Build::default());

        let unknown_arch = manifest.build_for(&Platform::new("darwin", "amd64"));
        assert!(unknown_arch.is_empty());
    }

    #[test]
    fn test_select_build_rejects_unsupported_platform() {
        let manifest = Manifest::from_slice(MANIFEST_JSON.as_bytes()).unwrap();
        let err = manifest
            .select_build(&Platform::new("windows", "amd64"))
            .unwrap_err();

        assert!(matches!(err, UpdateError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("windows/amd64"));
        assert!(err
            .to_string()
            .contains("available: darwin/arm64, linux/amd64, linux/arm64"));
    }

    #[test]
    fn test_platforms() {
        let manifest = Manifest::from_slice(MANIFEST_JSON.as_bytes()).unwrap();
        assert_eq!(
            manifest.platforms(),
            vec!["darwin/arm64", "linux/amd64", "linux/arm64"]
        );
    }

    #[test]
    fn test_malformed_manifest() {
        let err = Manifest::from_slice(b"<html>not json</html>").unwrap_err();
        assert!(matches!(err, UpdateError::Decode { what: "manifest", .. }));
    }

    #[test]
    fn test_manifest_url() {
        let client = ManifestClient::new(reqwest::Client::new(), "https://releases.keel.sh/");
        assert_eq!(
            client.manifest_url("beta"),
            "https://releases.keel.sh/beta/manifest.json"
        );
    }
}
