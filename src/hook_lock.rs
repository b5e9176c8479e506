use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry slot for globally installed hooks (renderer override, restore
/// notification hooks). Starts out empty.
#[repr(transparent)]
pub(crate) struct HookLock<T: 'static + Send + Sync>(RwLock<Option<T>>);

#[repr(transparent)]
pub(crate) struct HookLockReadGuard<T: 'static + Send + Sync>(
    RwLockReadGuard<'static, Option<T>>,
);

#[repr(transparent)]
pub(crate) struct HookLockWriteGuard<T: 'static + Send + Sync>(
    RwLockWriteGuard<'static, Option<T>>,
);

impl<T: 'static + Send + Sync> HookLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(RwLock::new(None))
    }

    #[inline]
    pub(crate) fn read(&'static self) -> HookLockReadGuard<T> {
        let guard = self.0.read().expect("Unable to acquire hook lock");
        HookLockReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&'static self) -> HookLockWriteGuard<T> {
        let guard = self.0.write().expect("Unable to acquire hook lock");
        HookLockWriteGuard(guard)
    }
}

impl<T: 'static + Send + Sync> HookLockReadGuard<T> {
    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: 'static + Send + Sync> HookLockWriteGuard<T> {
    #[inline]
    pub(crate) fn get(&mut self) -> &mut Option<T> {
        &mut self.0
    }
}

/// Guards the dispatch fields of a single raised error.
///
/// Readers (rendering, capture) take shared guards and may overlap freely.
/// Mutations take an exclusive guard, so an observer always sees either the
/// full pre-mutation or the full post-mutation field set, never a mix.
#[repr(transparent)]
pub(crate) struct StateLock<T>(RwLock<T>);

impl<T> StateLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().expect("Unable to acquire dispatch state lock")
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().expect("Unable to acquire dispatch state lock")
    }
}
