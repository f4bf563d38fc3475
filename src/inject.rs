use alloc::{sync::Arc, vec::Vec};
use core::ops::Deref;

use crate::{
    context::ComponentContext, dependency_resolver::DependencyResolver, metadata::Metadata, parameter, ResolveErrorKind,
};

/// Required dependency. A matching [`crate::Parameter`] takes precedence over the registry.
pub struct Inject<S: ?Sized>(pub Arc<S>);

impl<S: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<S> {
    type Error = ResolveErrorKind;

    fn resolve(context: &ComponentContext, position: usize) -> Result<Self, Self::Error> {
        if let Some(value) = parameter::find::<S>(context.parameters(), position) {
            return Ok(Self(value));
        }
        context.resolve().map(Self)
    }
}

/// Every registration of `S`, in registration order.
pub struct InjectAll<S: ?Sized>(pub Vec<Arc<S>>);

impl<S: ?Sized + Send + Sync + 'static> DependencyResolver for InjectAll<S> {
    type Error = ResolveErrorKind;

    fn resolve(context: &ComponentContext, _position: usize) -> Result<Self, Self::Error> {
        context.resolve_all().map(Self)
    }
}

/// Dependency that is `None` when `S` isn't registered.
pub struct InjectOpt<S: ?Sized>(pub Option<Arc<S>>);

impl<S: ?Sized + Send + Sync + 'static> DependencyResolver for InjectOpt<S> {
    type Error = ResolveErrorKind;

    fn resolve(context: &ComponentContext, position: usize) -> Result<Self, Self::Error> {
        if let Some(value) = parameter::find::<S>(context.parameters(), position) {
            return Ok(Self(Some(value)));
        }
        context.try_resolve().map(Self)
    }
}

/// Dependency together with the metadata of the registration that produced it.
pub struct Meta<S: ?Sized> {
    pub value: Arc<S>,
    pub metadata: Arc<Metadata>,
}

impl<S: ?Sized> Deref for Meta<S> {
    type Target = S;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<S: ?Sized> Clone for Meta<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<S: ?Sized + Send + Sync + 'static> DependencyResolver for Meta<S> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(context: &ComponentContext, _position: usize) -> Result<Self, Self::Error> {
        context.resolve_with_metadata()
    }
}
