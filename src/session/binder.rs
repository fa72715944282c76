use std::borrow::Cow;

use crate::model::profile::ViewerProfile;
use crate::session::store::SessionStore;
use crate::session::surface::InteractionSurface;

/// What a producer sees: the interaction surface plus read access to values
/// produced earlier in the cycle.
pub struct BindCtx<'a> {
    pub surface: &'a mut dyn InteractionSurface,
    pub store: &'a SessionStore,
    pub profile: &'a ViewerProfile,
}

/// A producer bound to a store key. Every call recomputes and overwrites.
#[derive(Debug, Clone)]
pub struct Bound<F> {
    key: Cow<'static, str>,
    producer: F,
}

pub fn bind<F>(key: impl Into<Cow<'static, str>>, producer: F) -> Bound<F> {
    Bound {
        key: key.into(),
        producer,
    }
}

/// Binds a named function under its own name, e.g. `view_n_topmost`.
pub fn bind_fn<F>(producer: F) -> Bound<F> {
    let key = producer_key(std::any::type_name::<F>());
    Bound {
        key: Cow::Owned(key),
        producer,
    }
}

fn producer_key(type_name: &str) -> String {
    type_name.rsplit("::").next().unwrap_or(type_name).to_string()
}

impl<F> Bound<F> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn call<T>(
        &self,
        surface: &mut dyn InteractionSurface,
        store: &mut SessionStore,
        profile: &ViewerProfile,
    ) -> T
    where
        F: Fn(&mut BindCtx<'_>) -> T,
        T: Clone + 'static,
    {
        let value = {
            let mut ctx = BindCtx {
                surface,
                store: &*store,
                profile,
            };
            (self.producer)(&mut ctx)
        };
        store.set(self.key(), value.clone());
        value
    }

    /// For fallible producers: stores the value on success, leaves the key
    /// untouched on error.
    pub fn try_call<T, E>(
        &self,
        surface: &mut dyn InteractionSurface,
        store: &mut SessionStore,
        profile: &ViewerProfile,
    ) -> Result<T, E>
    where
        F: Fn(&mut BindCtx<'_>) -> Result<T, E>,
        T: Clone + 'static,
    {
        let value = {
            let mut ctx = BindCtx {
                surface,
                store: &*store,
                profile,
            };
            (self.producer)(&mut ctx)?
        };
        store.set(self.key(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/session/binder.rs"]
mod tests;
