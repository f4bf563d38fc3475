use alloc::{borrow::Cow, sync::Arc, vec::Vec};
use core::fmt::Debug;
use parking_lot::Mutex;

use crate::{
    any::TypeInfo,
    errors::{DependencyResolutionErrorKind, ResolveErrorKind},
    inject::Meta,
    key::ServiceKey,
    parameter::Parameter,
    registration::{Registration, RegistrationId},
    scope::LifetimeScope,
};

/// Deepest activation chain a single resolve call may build.
pub(crate) const MAX_RESOLVE_DEPTH: usize = 64;

/// State shared by every activation of a single top-level resolve call.
#[derive(Default)]
pub(crate) struct ResolveOperation {
    stack: Mutex<Vec<(RegistrationId, TypeInfo)>>,
}

impl ResolveOperation {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn check_cycle(&self, registration: &Registration) -> Result<(), DependencyResolutionErrorKind> {
        let stack = self.stack.lock();
        match stack.iter().position(|(id, _)| *id == registration.id) {
            Some(start) => Err(DependencyResolutionErrorKind::CircularDependency {
                chain: stack[start..]
                    .iter()
                    .map(|(_, type_info)| *type_info)
                    .chain([registration.limit_type])
                    .collect(),
            }),
            None => Ok(()),
        }
    }

    /// Pushes `registration` on the activation stack until the returned guard is dropped.
    pub(crate) fn enter<'a>(&'a self, registration: &Registration) -> Result<ActivationGuard<'a>, DependencyResolutionErrorKind> {
        self.check_cycle(registration)?;

        let mut stack = self.stack.lock();
        if stack.len() >= MAX_RESOLVE_DEPTH {
            return Err(DependencyResolutionErrorKind::MaxDepthExceeded {
                service: registration.limit_type,
                depth: MAX_RESOLVE_DEPTH,
            });
        }
        stack.push((registration.id, registration.limit_type));

        Ok(ActivationGuard { operation: self })
    }

    /// Whether an activation of this operation is in progress.
    #[inline]
    #[must_use]
    pub(crate) fn is_active(&self) -> bool {
        !self.stack.lock().is_empty()
    }
}

pub(crate) struct ActivationGuard<'a> {
    operation: &'a ResolveOperation,
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        self.operation.stack.lock().pop();
    }
}

/// Context passed to instantiators and hooks while a component is being activated.
///
/// Dependencies resolved through the context take part in the same resolve operation,
/// so circular dependencies are detected. It can be requested as an instantiator argument.
#[derive(Clone)]
pub struct ComponentContext {
    pub(crate) scope: LifetimeScope,
    pub(crate) operation: Arc<ResolveOperation>,
    pub(crate) parameters: Arc<[Parameter]>,
}

impl ComponentContext {
    /// Scope the component is activated in.
    ///
    /// Resolving through it while the activation is in progress takes part in the same resolve operation.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &LifetimeScope {
        &self.scope
    }

    /// Parameters for the component being activated.
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn named_parameter<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Option<Arc<S>> {
        self.parameters
            .iter()
            .rev()
            .filter(|parameter| parameter.type_info == TypeInfo::of::<S>())
            .find(|parameter| parameter.name() == Some(name))
            .and_then(|parameter| parameter.value::<S>())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ResolveErrorKind> {
        self.resolve_key(&ServiceKey::of::<S>())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_named<S: ?Sized + Send + Sync + 'static>(&self, name: impl Into<Cow<'static, str>>) -> Result<Arc<S>, ResolveErrorKind> {
        self.resolve_key(&ServiceKey::named::<S>(name))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_keyed<S, K>(&self, key: K) -> Result<Arc<S>, ResolveErrorKind>
    where
        S: ?Sized + Send + Sync + 'static,
        K: Eq + Debug + Send + Sync + 'static,
    {
        self.resolve_key(&ServiceKey::keyed::<S, K>(key))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_key<S: ?Sized + Send + Sync + 'static>(&self, key: &ServiceKey) -> Result<Arc<S>, ResolveErrorKind> {
        self.scope.resolve_in(key, &[], &self.operation)
    }

    /// Returns `Ok(None)` if `S` isn't registered, other failures are still returned.
    #[allow(clippy::missing_errors_doc)]
    pub fn try_resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, ResolveErrorKind> {
        match self.resolve::<S>() {
            Ok(instance) => Ok(Some(instance)),
            Err(err) if err.is_not_registered() => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_all<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<S>>, ResolveErrorKind> {
        self.scope.resolve_all_in(&ServiceKey::of::<S>(), &self.operation)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_with_metadata<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Meta<S>, ResolveErrorKind> {
        self.scope.resolve_with_metadata_in(&ServiceKey::of::<S>(), &self.operation)
    }

    #[inline]
    #[must_use]
    pub fn is_registered<S: ?Sized + 'static>(&self) -> bool {
        self.scope.is_registered::<S>()
    }
}

#[cfg(test)]
mod tests {
    use super::{ResolveOperation, MAX_RESOLVE_DEPTH};
    use crate::{
        any::TypeInfo,
        errors::DependencyResolutionErrorKind,
        instantiator::boxed_instance,
        registration::{LayerId, PendingRegistration, Registration},
    };

    use alloc::{sync::Arc, vec::Vec};

    struct Left;
    struct Right;

    fn registration<T: Send + Sync + 'static>(instance: T) -> Registration {
        PendingRegistration::new::<T>(boxed_instance(Arc::new(instance))).into_registration(LayerId::next())
    }

    #[test]
    fn test_cycle_chain() {
        let operation = ResolveOperation::new();
        let left = registration(Left);
        let right = registration(Right);

        let _left = operation.enter(&left).unwrap();
        let _right = operation.enter(&right).unwrap();

        match operation.enter(&left) {
            Err(DependencyResolutionErrorKind::CircularDependency { chain }) => assert_eq!(
                &*chain,
                [TypeInfo::of::<Left>(), TypeInfo::of::<Right>(), TypeInfo::of::<Left>()]
            ),
            _ => panic!("expected circular dependency"),
        };
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let operation = ResolveOperation::new();
        let left = registration(Left);

        drop(operation.enter(&left).unwrap());

        assert!(operation.enter(&left).is_ok());
        assert!(operation.check_cycle(&registration(Right)).is_ok());
    }

    #[test]
    fn test_max_depth() {
        let operation = ResolveOperation::new();
        let registrations: Vec<_> = (0..=MAX_RESOLVE_DEPTH).map(|_| registration(Left)).collect();

        let guards: Vec<_> = registrations[..MAX_RESOLVE_DEPTH]
            .iter()
            .map(|registration| operation.enter(registration).unwrap())
            .collect();
        assert!(operation.is_active());

        match operation.enter(&registrations[MAX_RESOLVE_DEPTH]) {
            Err(DependencyResolutionErrorKind::MaxDepthExceeded { depth, .. }) => assert_eq!(depth, MAX_RESOLVE_DEPTH),
            _ => panic!("expected max depth exceeded"),
        }

        drop(guards);
        assert!(!operation.is_active());
    }
}
