//! Notification hooks for foreign dispatch restoration.
//!
//! After a [`DispatchSnapshot`](crate::DispatchSnapshot) has been restored
//! onto an error, an embedding runtime usually wants to know — typically to
//! mark its thread state so the upcoming re-raise is treated as a foreign
//! one rather than a fresh throw. Hooks registered here run at the tail of
//! every successful restore, outside all locks. Their return values are not
//! consumed; they are side effects only.
//!
//! # Examples
//!
//! ```
//! use redispatch::hooks::register_foreign_restore_hook;
//!
//! register_foreign_restore_hook(|error: &redispatch::RaisedError| {
//!     eprintln!("foreign dispatch restored: {error}");
//! });
//! ```

use crate::{RaisedError, hook_lock::HookLock};

/// A hook invoked after dispatch state has been restored onto an error.
///
/// Automatically implemented for any `Fn(&RaisedError)` closure that is
/// `Send + Sync + 'static`.
pub trait ForeignRestoreHook: 'static + Send + Sync {
    /// Called once per successful restore, with the freshly restored error.
    ///
    /// Hooks run outside the restore lock and should be fast; they are on
    /// the path of every deferred re-raise.
    fn on_foreign_restore(&self, error: &RaisedError);
}

impl<F> ForeignRestoreHook for F
where
    F: 'static + Send + Sync + Fn(&RaisedError),
{
    fn on_foreign_restore(&self, error: &RaisedError) {
        (self)(error);
    }
}

type HookSet = Vec<Box<dyn ForeignRestoreHook>>;

static HOOKS: HookLock<HookSet> = HookLock::new();

/// Registers a hook to be notified of every foreign dispatch restoration.
///
/// Hooks are called in registration order and remain installed for the
/// lifetime of the process.
pub fn register_foreign_restore_hook<H>(hook: H)
where
    H: ForeignRestoreHook,
{
    HOOKS
        .write()
        .get()
        .get_or_insert_with(Vec::new)
        .push(Box::new(hook));
}

pub(crate) fn notify_foreign_restore(error: &RaisedError) {
    if let Some(hooks) = HOOKS.read().get() {
        for hook in hooks {
            hook.on_foreign_restore(error);
        }
    }
}
