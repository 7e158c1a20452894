//! Builders for manifests and compressed artifacts

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use std::io::Write;

/// Independent SHA1 oracle for test payloads
pub fn sha1_of(content: &[u8]) -> String {
    hex::encode(Sha1::digest(content))
}

/// Gzip a payload the way release artifacts are published
pub fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// Fluent builder for manifest JSON bodies
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    channel: String,
    version: String,
    builds: Map<String, Value>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            channel: super::CHANNEL_STABLE.to_string(),
            version: super::VERSION_2_0_0.to_string(),
            builds: Map::new(),
        }
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.channel = channel.to_string();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn build(mut self, os: &str, arch: &str, url: &str, sha1: &str) -> Self {
        let arches = self
            .builds
            .entry(os.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(arches) = arches {
            arches.insert(arch.to_string(), json!({ "URL": url, "Sha1": sha1 }));
        }
        self
    }

    /// Build entry for the default test platform
    pub fn linux_amd64(self, url: &str, sha1: &str) -> Self {
        self.build(super::OS_LINUX, super::ARCH_AMD64, url, sha1)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "Channel": self.channel,
            "Version": self.version,
            "Builds": Value::Object(self.builds.clone()),
        })
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
