//! Thread-scoped diagnostic context.
//!
//! Long-running operations (such as building a proxy recipe) record what they
//! are doing in the current thread's [`ErrorContext`]. When something fails,
//! the context is attached to the log entry so the report says which activity
//! and which object were involved. The context must be cleared afterwards,
//! otherwise a later, unrelated failure on the same thread would be reported
//! with stale details; [`ErrorContextGuard`] does that on every exit path.

use std::cell::RefCell;
use std::fmt;

thread_local! {
    static CURRENT: RefCell<ErrorContext> = RefCell::new(ErrorContext::default());
}

/// Diagnostic details for the operation currently running on this thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    resource: Option<String>,
    activity: Option<String>,
    object: Option<String>,
    message: Option<String>,
    cause: Option<String>,
}

impl ErrorContext {
    /// Runs `f` against the current thread's context.
    ///
    /// ```ignore
    /// ErrorContext::with_current(|ctx| {
    ///     ctx.activity("building mapper recipe").object("app::UserMapper");
    /// });
    /// ```
    pub fn with_current<R>(f: impl FnOnce(&mut ErrorContext) -> R) -> R {
        CURRENT.with(|ctx| f(&mut ctx.borrow_mut()))
    }

    /// Returns a copy of the current thread's context.
    pub fn snapshot() -> ErrorContext {
        CURRENT.with(|ctx| ctx.borrow().clone())
    }

    /// Clears the current thread's context.
    pub fn reset() {
        CURRENT.with(|ctx| *ctx.borrow_mut() = ErrorContext::default());
    }

    pub fn resource(&mut self, resource: impl Into<String>) -> &mut Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn activity(&mut self, activity: impl Into<String>) -> &mut Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn object(&mut self, object: impl Into<String>) -> &mut Self {
        self.object = Some(object.into());
        self
    }

    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    pub fn cause(&mut self, cause: impl Into<String>) -> &mut Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn resource_ref(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn message_ref(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn activity_ref(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    pub fn object_ref(&self) -> Option<&str> {
        self.object.as_deref()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        *self == ErrorContext::default()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            writeln!(f, "### {}", message)?;
        }
        if let Some(resource) = &self.resource {
            writeln!(f, "### The error may exist in {}", resource)?;
        }
        if let Some(object) = &self.object {
            writeln!(f, "### The error may involve {}", object)?;
        }
        if let Some(activity) = &self.activity {
            writeln!(f, "### The error occurred while {}", activity)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "### Cause: {}", cause)?;
        }
        Ok(())
    }
}

/// Clears the current thread's [`ErrorContext`] when dropped.
#[must_use = "the context is reset when the guard is dropped"]
#[derive(Debug)]
pub struct ErrorContextGuard {
    _private: (),
}

impl ErrorContextGuard {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for ErrorContextGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ErrorContextGuard {
    fn drop(&mut self) {
        ErrorContext::reset();
    }
}
