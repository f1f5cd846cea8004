//! Resource names: the identity of a module or included file.

use std::fmt;
use std::hash::{Hash, Hasher};

use inox_syntax::{Node, NodeKind};

/// Extension of Inox source files.
pub const INOX_FILE_EXTENSION: &str = ".ix";

/// Suffix of spec modules.
pub const INOX_SPEC_FILE_SUFFIX: &str = ".spec.ix";

/// A filesystem path or a URL.
///
/// Two names are equal when their canonical strings are equal.
#[derive(Debug, Clone)]
pub enum ResourceName {
    Path(String),
    Url(String),
}

impl ResourceName {
    /// Classifies `s` as a URL when it has a scheme, as a path otherwise.
    pub fn parse(s: &str) -> Self {
        if s.contains("://") {
            ResourceName::Url(s.to_string())
        } else {
            ResourceName::Path(s.to_string())
        }
    }

    /// Builds a resource name from a path or URL literal.
    pub fn from_literal(node: &Node) -> Option<Self> {
        match &node.kind {
            NodeKind::AbsPath(path) | NodeKind::RelPath(path) => Some(ResourceName::Path(path.clone())),
            NodeKind::Url(url) => Some(ResourceName::Url(url.clone())),
            _ => None,
        }
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceName::Path(s) | ResourceName::Url(s) => s,
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, ResourceName::Path(_))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, ResourceName::Url(_))
    }

    /// A path starting with `/`, or any URL.
    pub fn is_absolute(&self) -> bool {
        match self {
            ResourceName::Path(p) => p.starts_with('/'),
            ResourceName::Url(_) => true,
        }
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    pub fn is_dir(&self) -> bool {
        self.as_str().ends_with('/')
    }

    pub fn has_inox_extension(&self) -> bool {
        match self {
            ResourceName::Path(p) => p.ends_with(INOX_FILE_EXTENSION),
            ResourceName::Url(_) => self.url_path().is_some_and(|p| p.ends_with(INOX_FILE_EXTENSION)),
        }
    }

    pub fn is_spec_file(&self) -> bool {
        self.as_str().ends_with(INOX_SPEC_FILE_SUFFIX)
    }

    /// `scheme://host` of a URL.
    pub fn url_origin(&self) -> Option<&str> {
        let ResourceName::Url(url) = self else {
            return None;
        };
        let after_scheme = url.find("://")? + 3;
        let end = url[after_scheme..]
            .find(['/', '?', '#'])
            .map_or(url.len(), |i| after_scheme + i);
        Some(&url[..end])
    }

    /// Path component of a URL, without query or fragment. Empty when the URL has no path.
    pub fn url_path(&self) -> Option<&str> {
        let origin_len = self.url_origin()?.len();
        let rest = &self.as_str()[origin_len..];
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Directory containing the resource, with a trailing slash.
    ///
    /// For a URL this is the URL of its parent directory; `None` if the URL has no path.
    pub fn dir(&self) -> Option<ResourceName> {
        match self {
            ResourceName::Path(p) => {
                let i = p.rfind('/')?;
                Some(ResourceName::Path(p[..=i].to_string()))
            }
            ResourceName::Url(_) => {
                let origin = self.url_origin()?;
                let path = self.url_path()?;
                let i = path.rfind('/')?;
                Some(ResourceName::Url(format!("{}{}", origin, &path[..=i])))
            }
        }
    }

    /// Resolves a relative path against this directory name.
    pub fn join_relative(&self, relative: &str) -> ResourceName {
        match self {
            ResourceName::Path(dir) => ResourceName::Path(clean_path(&format!("{}/{}", dir, relative))),
            ResourceName::Url(_) => {
                let origin = self.url_origin().unwrap_or_default();
                let dir = self.url_path().unwrap_or("/");
                let path = clean_path(&format!("{}/{}", dir, relative));
                ResourceName::Url(format!("{}{}", origin, path))
            }
        }
    }
}

impl PartialEq for ResourceName {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ResourceName {}

impl Hash for ResourceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexically resolves `.`, `..` and repeated separators in an absolute path.
///
/// A trailing slash is kept.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = String::from("/");
    out.push_str(&segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let path = ResourceName::parse("/a/b.ix");
        assert!(path.is_path());
        assert!(path.is_absolute());
        assert!(ResourceName::parse("./b.ix").is_relative());

        let url = ResourceName::parse("https://example.com/lib/mod.ix");
        assert!(url.is_url());
        assert_eq!(url.url_origin(), Some("https://example.com"));
        assert_eq!(url.url_path(), Some("/lib/mod.ix"));
        assert!(url.has_inox_extension());
    }

    #[test]
    fn test_equality_by_canonical_string() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ResourceName::Path("/a.ix".into()));
        assert!(set.contains(&ResourceName::parse("/a.ix")));
    }

    #[test]
    fn test_dir_and_join() {
        let path = ResourceName::parse("/dir/mod.ix");
        let dir = path.dir().unwrap();
        assert_eq!(dir.as_str(), "/dir/");
        assert_eq!(dir.join_relative("./lib/x.ix").as_str(), "/dir/lib/x.ix");
        assert_eq!(dir.join_relative("../x.ix").as_str(), "/x.ix");

        let url = ResourceName::parse("https://example.com/lib/mod.ix");
        let dir = url.dir().unwrap();
        assert_eq!(dir.as_str(), "https://example.com/lib/");
        assert_eq!(dir.join_relative("./dep.ix").as_str(), "https://example.com/lib/dep.ix");

        assert!(ResourceName::parse("https://example.com").dir().is_none());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/a/./b//c/../d"), "/a/b/d");
        assert_eq!(clean_path("/a/b/"), "/a/b/");
        assert_eq!(clean_path("/.."), "/");
    }
}
