//! Bucket and object name validation.
//!
//! Names are checked before any network call so malformed identifiers fail
//! fast instead of surfacing as confusing backend errors. The bucket rules
//! follow the S3 naming constraints, which are the strictest of the
//! supported providers; object rules additionally reject path traversal so
//! the local filesystem backend cannot be steered outside its root.

use std::fmt;

use thiserror::Error;

/// A bucket or object name that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} name {name:?}: {reason}")]
pub struct InvalidName {
    kind: NameKind,
    name: String,
    reason: &'static str,
}

impl InvalidName {
    fn bucket(name: &str, reason: &'static str) -> Self {
        Self {
            kind: NameKind::Bucket,
            name: name.to_string(),
            reason,
        }
    }

    fn object(name: &str, reason: &'static str) -> Self {
        Self {
            kind: NameKind::Object,
            name: name.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Bucket,
    Object,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket => f.write_str("bucket"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// Maximum object name length accepted by the supported backends.
const MAX_OBJECT_NAME_LEN: usize = 1024;

/// Validate a bucket name against the common S3 rules.
///
/// # Errors
///
/// Returns [`InvalidName`] describing the first violated rule.
pub fn validate_bucket_name(name: &str) -> Result<(), InvalidName> {
    if name.len() < 3 || name.len() > 63 {
        return Err(InvalidName::bucket(
            name,
            "must be between 3 and 63 characters long",
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(InvalidName::bucket(
            name,
            "may only contain lowercase letters, digits, hyphens, and dots",
        ));
    }
    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(InvalidName::bucket(
            name,
            "must start and end with a letter or digit",
        ));
    }
    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(InvalidName::bucket(
            name,
            "must not contain adjacent dots or dot-hyphen sequences",
        ));
    }
    if looks_like_ip_address(name) {
        return Err(InvalidName::bucket(
            name,
            "must not be formatted as an IP address",
        ));
    }
    Ok(())
}

/// Validate an object name.
///
/// # Errors
///
/// Returns [`InvalidName`] describing the first violated rule.
pub fn validate_object_name(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::object(name, "must not be empty"));
    }
    if name.len() > MAX_OBJECT_NAME_LEN {
        return Err(InvalidName::object(name, "exceeds 1024 bytes"));
    }
    if name.starts_with('/') {
        return Err(InvalidName::object(name, "must not start with a separator"));
    }
    if name.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(InvalidName::object(
            name,
            "must not contain '.' or '..' path segments",
        ));
    }
    Ok(())
}

fn looks_like_ip_address(name: &str) -> bool {
    let groups: Vec<&str> = name.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()))
}
