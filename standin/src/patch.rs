// vim: tw=80
//! Replaceable values with scoped, self-restoring overrides.
//!
//! A [`Slot`] holds the current implementation of something that tests may
//! want to replace, typically a boxed function.  [`Slot::patch`] installs a
//! replacement and returns a [`Patch`] guard; when the guard is dropped its
//! replacement is removed, whether the scope ended normally, returned early
//! or unwound from a panic.

use std::{
    fmt,
    sync::{
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicU64, Ordering}
    }
};
use tracing::debug;

/// The unpatched value plus one layer per live patch, oldest first.  The
/// visible value is the newest layer, or the base when there is none.
struct Layers<T> {
    base: T,
    patches: Vec<(u64, T)>
}

impl<T> Layers<T> {
    fn top(&self) -> &T {
        self.patches.last().map_or(&self.base, |(_, v)| v)
    }

    fn top_mut(&mut self) -> &mut T {
        match self.patches.last_mut() {
            Some((_, v)) => v,
            None => &mut self.base
        }
    }
}

/// A named, replaceable value.
pub struct Slot<T> {
    name: String,
    layers: Mutex<Layers<T>>,
    next_id: AtomicU64
}

impl<T> Slot<T> {
    fn lock(&self) -> MutexGuard<'_, Layers<T>> {
        // The value must stay reachable even if a patched implementation
        // panicked while we were reading it.
        self.layers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live patches.
    fn depth(&self) -> usize {
        self.lock().patches.len()
    }
}

impl<T: Clone> Slot<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Slot {
            name: name.into(),
            layers: Mutex::new(Layers{base: value, patches: Vec::new()}),
            next_id: AtomicU64::new(0)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.lock().top().clone()
    }

    /// Overwrite the current value, returning the previous one.
    ///
    /// Outside of any patch the change is permanent.  Under a patch it
    /// overwrites the patched value, and is undone along with that patch.
    pub fn replace(&self, value: T) -> T {
        debug!(slot = %self.name, "replaced");
        std::mem::replace(self.lock().top_mut(), value)
    }

    /// Install `value` until the returned guard is dropped.
    ///
    /// Patches may nest, and their guards may be dropped in any order.  The
    /// slot shows the value of the newest patch still alive, or the
    /// unpatched value once every guard is gone.
    #[must_use = "the patch is removed as soon as the guard is dropped"]
    pub fn patch(&self, value: T) -> Patch<'_, T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut layers = self.lock();
        layers.patches.push((id, value));
        debug!(slot = %self.name, depth = layers.patches.len(), "patched");
        Patch{slot: self, id}
    }

    /// Run `f` with `value` installed, then restore the previous value.
    pub fn scoped<R, F>(&self, value: T, f: F) -> R
        where F: FnOnce() -> R
    {
        let _patch = self.patch(value);
        f()
    }

    /// Is any patch currently installed?
    pub fn is_patched(&self) -> bool {
        self.depth() > 0
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("depth", &self.depth())
            .finish()
    }
}

/// Guard returned by [`Slot::patch`].  Removes its patch when dropped.
pub struct Patch<'a, T: Clone> {
    slot: &'a Slot<T>,
    id: u64
}

impl<'a, T: Clone> Patch<'a, T> {
    pub fn slot(&self) -> &'a Slot<T> {
        self.slot
    }

    /// Remove the patch now rather than at the end of the scope.
    pub fn restore(self) {}
}

impl<T: Clone> Drop for Patch<'_, T> {
    fn drop(&mut self) {
        let mut layers = self.slot.lock();
        if let Some(i) = layers.patches.iter().position(|(id, _)| *id == self.id)
        {
            let top = i + 1 == layers.patches.len();
            layers.patches.remove(i);
            debug!(slot = %self.slot.name, depth = layers.patches.len(), top,
                   "restored");
        }
    }
}

trait Installed {}
impl<T: Clone> Installed for Patch<'_, T> {}

/// Several patches, installed up front and removed together.
///
/// Patches are installed in the order they are added and restored in the
/// reverse order.  Each one is named by its slot, so there is no positional
/// contract between the patches and the code that uses them.
///
/// # Examples
/// ```
/// # use standin::*;
/// let width = Slot::new("width", 1u32);
/// let height = Slot::new("height", 2u32);
/// PatchSet::new()
///     .patch(&width, 10)
///     .patch(&height, 20)
///     .run(|| assert_eq!(width.get() * height.get(), 200));
/// assert_eq!(width.get() * height.get(), 2);
/// ```
#[derive(Default)]
#[must_use = "the patches are removed as soon as the set is dropped"]
pub struct PatchSet<'a> {
    patches: Vec<Box<dyn Installed + 'a>>
}

impl<'a> PatchSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `value` in `slot` for the lifetime of the set.
    pub fn patch<T: Clone + 'a>(mut self, slot: &'a Slot<T>, value: T)
        -> Self
    {
        self.patches.push(Box::new(slot.patch(value)));
        self
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Run `f` with every patch installed, then remove them all.
    pub fn run<R, F>(self, f: F) -> R
        where F: FnOnce() -> R
    {
        let _set = self;
        f()
    }
}

impl Drop for PatchSet<'_> {
    fn drop(&mut self) {
        while let Some(patch) = self.patches.pop() {
            drop(patch);
        }
    }
}
