//! Scoped acquisition guards.
//!
//! Every guard in this module pairs one acquisition with exactly one release:
//! the constructor acquires, `Drop` releases, and the release runs no matter
//! how the owning scope is left (normal flow, early return, or panic unwind).
//! A failed acquisition returns `Err` before any guard exists, so nothing is
//! ever released twice or released for a resource that was never obtained.

pub mod build_lock;
pub mod staged;

use std::ops::{Deref, DerefMut};

pub use build_lock::BuildLock;
pub use staged::StagedWrite;

/// 在離開作用域時執行 `$e`，不持有任何值
#[macro_export]
macro_rules! defer {
    ($e:expr) => {
        let _guard = $crate::scope::guard((), |_| $e);
    };
}

/// A guard owning a value whose cleanup closure runs when the guard drops.
///
/// The value stays usable inside the scope through `Deref`/`DerefMut`; the
/// only way to skip the cleanup is to consume the guard via [`ScopeGuard::dismiss`]
/// or [`ScopeGuard::into_inner`], so there is no path on which the release
/// could run twice.
pub struct ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    dropfn: Option<F>,
    value: T,
}

/// Create a new [`ScopeGuard`] owning `value`, running `dropfn` at scope exit.
pub fn guard<T, F>(value: T, dropfn: F) -> ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    ScopeGuard {
        dropfn: Some(dropfn),
        value,
    }
}

impl<T, F> ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    /// 解除清理動作（提交路徑）。guard 在此被消耗，值隨之當場析構；
    /// 要保留值改用 [`ScopeGuard::into_inner`]
    pub fn dismiss(mut self) {
        self.dropfn = None;
    }

    /// Defuse the cleanup and hand the protected value back to the caller.
    pub fn into_inner(self) -> T {
        // ManuallyDrop 擋住 Drop，值用 ptr::read 取出，閉包原地析構
        let mut this = std::mem::ManuallyDrop::new(self);
        unsafe {
            let value = std::ptr::read(&this.value);
            std::ptr::drop_in_place(&mut this.dropfn);
            value
        }
    }
}

impl<T, F> Deref for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, F> DerefMut for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, F> Drop for ScopeGuard<T, F>
where
    F: FnMut(&mut T),
{
    fn drop(&mut self) {
        if let Some(mut dropfn) = self.dropfn.take() {
            dropfn(&mut self.value);
        }
    }
}
