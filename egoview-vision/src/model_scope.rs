use std::ops::{Deref, DerefMut};

use anyhow::Result;

/// Explicit load/unload control for a model holding device memory.
pub trait ModelLifecycle {
    fn load(&mut self) -> Result<()>;
    /// Release device memory. A wrapper that keeps its weights resident may
    /// treat this as a no-op.
    fn unload(&mut self);
    fn is_loaded(&self) -> bool;
}

/// A loaded model, unloaded again when the scope is dropped.
///
/// Release happens on every exit path, including early returns through `?`
/// and panics while the scope is alive.
pub struct ModelScope<'a, M: ModelLifecycle + ?Sized> {
    model: &'a mut M,
}

impl<'a, M: ModelLifecycle + ?Sized> ModelScope<'a, M> {
    pub fn acquire(model: &'a mut M) -> Result<Self> {
        if !model.is_loaded() {
            if let Err(err) = model.load() {
                // partially materialized weights
                model.unload();
                return Err(err);
            }
        }
        Ok(Self { model })
    }
}

impl<M: ModelLifecycle + ?Sized> Deref for ModelScope<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.model
    }
}

impl<M: ModelLifecycle + ?Sized> DerefMut for ModelScope<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.model
    }
}

impl<M: ModelLifecycle + ?Sized> Drop for ModelScope<'_, M> {
    fn drop(&mut self) {
        self.model.unload();
    }
}
