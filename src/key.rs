use alloc::{borrow::Cow, sync::Arc};
use core::{
    any::Any,
    fmt::{self, Debug, Display, Formatter},
};

use crate::any::TypeInfo;

/// Arbitrary value used to key a registration.
///
/// Any `Eq + Debug` value can act as a key; two keys are equal only if they have the same type and compare equal.
#[derive(Clone)]
pub struct AnyKey {
    type_info: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
    eq: fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool,
    fmt: fn(&(dyn Any + Send + Sync), &mut Formatter<'_>) -> fmt::Result,
}

impl AnyKey {
    #[must_use]
    pub fn new<K>(key: K) -> Self
    where
        K: Eq + Debug + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<K>(),
            value: Arc::new(key),
            eq: |lhs, rhs| match (lhs.downcast_ref::<K>(), rhs.downcast_ref::<K>()) {
                (Some(lhs), Some(rhs)) => lhs == rhs,
                _ => false,
            },
            fmt: |value, f| match value.downcast_ref::<K>() {
                Some(value) => Debug::fmt(value, f),
                None => f.write_str("<?>"),
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.value.downcast_ref()
    }
}

impl PartialEq for AnyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_info == other.type_info && (self.eq)(&*self.value, &*other.value)
    }
}

impl Eq for AnyKey {}

impl Debug for AnyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        (self.fmt)(&*self.value, f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Qualifier {
    #[default]
    None,
    Named(Cow<'static, str>),
    Keyed(AnyKey),
}

/// Identifies a requested contract: the service type plus an optional name or key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceKey {
    pub type_info: TypeInfo,
    pub qualifier: Qualifier,
}

impl ServiceKey {
    #[inline]
    #[must_use]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<S>(),
            qualifier: Qualifier::None,
        }
    }

    #[inline]
    #[must_use]
    pub fn named<S: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_info: TypeInfo::of::<S>(),
            qualifier: Qualifier::Named(name.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn keyed<S, K>(key: K) -> Self
    where
        S: ?Sized + 'static,
        K: Eq + Debug + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<S>(),
            qualifier: Qualifier::Keyed(AnyKey::new(key)),
        }
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::None => write!(f, "{}", self.type_info),
            Qualifier::Named(name) => write!(f, "{} (named {name:?})", self.type_info),
            Qualifier::Keyed(key) => write!(f, "{} (keyed {key:?})", self.type_info),
        }
    }
}
