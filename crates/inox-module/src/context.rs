//! Resolution context: filesystem, permissions and cooperative cancellation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use inox_common::{FileSystem, RealFs};

use crate::error::{ModuleError, ModuleResult};
use crate::permission::{AllowAll, Permission, PermissionChecker};

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    parent: Option<CancelToken>,
    deadline: Option<Instant>,
}

/// A cancellation flag shared between tasks.
///
/// A token is cancelled when it was cancelled explicitly, when its deadline
/// has passed or when its parent is cancelled. Cancelling a child never
/// affects the parent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                deadline: None,
            }),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                deadline: Some(Instant::now() + timeout),
            }),
        }
    }

    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
                deadline: None,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.inner.parent.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// `Err(Cancelled)` once the token is cancelled.
    pub fn check(&self) -> ModuleResult<()> {
        if self.is_cancelled() {
            Err(ModuleError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What module resolution may touch.
#[derive(Debug, Clone)]
pub struct Context {
    fs: Arc<dyn FileSystem>,
    permissions: Arc<dyn PermissionChecker>,
    cancel: CancelToken,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Arc::new(RealFs))
    }
}

impl Context {
    /// A context over `fs` that grants every permission.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            permissions: Arc::new(AllowAll),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl PermissionChecker + 'static) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// A context sharing filesystem and permissions, cancelled with `self`
    /// and cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            permissions: self.permissions.clone(),
            cancel: self.cancel.child(),
        }
    }

    pub fn check_permission(&self, permission: &Permission) -> ModuleResult<()> {
        if self.permissions.is_granted(permission) {
            Ok(())
        } else {
            Err(ModuleError::PermissionDenied(permission.to_string()))
        }
    }

    pub fn check_fs_read(&self, path: &Path) -> ModuleResult<()> {
        self.check_permission(&Permission::fs_read(path))
    }

    pub fn check_cancelled(&self) -> ModuleResult<()> {
        self.cancel.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionSet;
    use inox_common::MemoryFs;

    #[test]
    fn test_child_token() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_expired_deadline() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        assert!(matches!(token.check(), Err(ModuleError::Cancelled)));
    }

    #[test]
    fn test_permission_check() {
        let ctx = Context::new(Arc::new(MemoryFs::new()))
            .with_permissions(PermissionSet::new().allow_fs_read("/a.ix"));
        assert!(ctx.check_fs_read(Path::new("/a.ix")).is_ok());
        let err = ctx.check_fs_read(Path::new("/b.ix")).unwrap_err();
        assert_eq!(err.to_string(), "permission denied: read /b.ix");
    }
}
