use alloc::{borrow::Cow, collections::BTreeMap, sync::Arc};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

/// Unordered string-keyed values attached to a registration.
#[derive(Clone, Default)]
pub struct Metadata {
    map: BTreeMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>,
}

impl Metadata {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn insert<V: Send + Sync + 'static>(&mut self, key: impl Into<Cow<'static, str>>, value: V) {
        self.map.insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if it was stored as a `V`.
    #[inline]
    #[must_use]
    pub fn get<V: 'static>(&self, key: &str) -> Option<&V> {
        self.map.get(key).and_then(|value| value.downcast_ref())
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(AsRef::as_ref)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Debug for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}
