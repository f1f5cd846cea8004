//! Read permissions checked before every file read and HTTP request.

use std::fmt;
use std::path::{Path, PathBuf};

/// A permission required by module resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    FsRead(PathBuf),
    HttpRead(String),
}

impl Permission {
    pub fn fs_read(path: impl Into<PathBuf>) -> Self {
        Permission::FsRead(path.into())
    }

    pub fn http_read(url: impl Into<String>) -> Self {
        Permission::HttpRead(url.into())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::FsRead(path) => write!(f, "read {}", path.display()),
            Permission::HttpRead(url) => write!(f, "read {}", url),
        }
    }
}

/// Decides whether a permission is granted.
pub trait PermissionChecker: Send + Sync + fmt::Debug {
    fn is_granted(&self, permission: &Permission) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn is_granted(&self, _permission: &Permission) -> bool {
        true
    }
}

/// An explicit list of granted reads.
///
/// A pattern ending with `/...` grants everything below the prefix; any
/// other pattern grants exactly one path or URL.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    fs_read: Vec<String>,
    http_read: Vec<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_fs_read(mut self, pattern: impl Into<String>) -> Self {
        self.fs_read.push(pattern.into());
        self
    }

    pub fn allow_http_read(mut self, pattern: impl Into<String>) -> Self {
        self.http_read.push(pattern.into());
        self
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix("...") {
        Some(prefix) if prefix.ends_with('/') => value.starts_with(prefix),
        _ => pattern == value,
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl PermissionChecker for PermissionSet {
    fn is_granted(&self, permission: &Permission) -> bool {
        match permission {
            Permission::FsRead(path) => {
                let path = path_str(path);
                self.fs_read.iter().any(|p| pattern_matches(p, &path))
            }
            Permission::HttpRead(url) => self.http_read.iter().any(|p| pattern_matches(p, url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set() {
        let perms = PermissionSet::new()
            .allow_fs_read("/main.ix")
            .allow_fs_read("/lib/...")
            .allow_http_read("https://example.com/...");

        assert!(perms.is_granted(&Permission::fs_read("/main.ix")));
        assert!(perms.is_granted(&Permission::fs_read("/lib/a/b.ix")));
        assert!(!perms.is_granted(&Permission::fs_read("/other.ix")));
        assert!(perms.is_granted(&Permission::http_read("https://example.com/a.ix")));
        assert!(!perms.is_granted(&Permission::http_read("https://evil.com/a.ix")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Permission::fs_read("/a.ix").to_string(), "read /a.ix");
    }
}
