//! Shared constants for test infrastructure

// Versions
pub const VERSION_1_0_0: &str = "1.0.0";
pub const VERSION_2_0_0: &str = "2.0.0";

// Channels
pub const CHANNEL_STABLE: &str = "stable";
pub const CHANNEL_BETA: &str = "beta";

// Manifest platform keys
pub const OS_LINUX: &str = "linux";
pub const ARCH_AMD64: &str = "amd64";

// Binary content for testing
pub const ORIGINAL_CONTENT: &[u8] = b"#!/bin/sh\necho keel 1.0.0\n";
pub const NEW_CONTENT: &[u8] = b"#!/bin/sh\necho keel 2.0.0\n";
pub const TAMPERED_CONTENT: &[u8] = b"#!/bin/sh\necho pwned\n";

// Checksum constants
pub const WRONG_SHA1: &str = "0000000000000000000000000000000000000000";
