use alloc::{borrow::Cow, boxed::Box, sync::Arc, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    any::{AnyArc, BoxedService, TypeInfo},
    builder::ContainerBuilder,
    cache::{Cache, Owned},
    config::{Ownership, Sharing},
    context::{ComponentContext, ResolveOperation},
    errors::{
        DependencyResolutionErrorKind, InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind, ScopeErrorKind,
    },
    inject::Meta,
    key::{Qualifier, ServiceKey},
    lock::SlotLocks,
    parameter::Parameter,
    registration::Registration,
    registry::Registry,
    tag::Tag,
};

/// Node of the scope tree. Resolves components and owns the instances it activates.
///
/// Handles are cheap to clone. The scope is disposed by [`LifetimeScope::dispose`] or when the last handle is dropped.
/// A child keeps its parent alive, but disposing the parent does not dispose the child.
#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
    // Operation of the activation this handle was handed to, joined while it is in progress
    operation: Option<Arc<ResolveOperation>>,
}

struct ScopeInner {
    tag: Option<Tag>,
    registry: Arc<Registry>,
    parent: Option<LifetimeScope>,
    cache: Mutex<Cache>,
    locks: SlotLocks,
    disposed: AtomicBool,
}

impl LifetimeScope {
    #[must_use]
    pub(crate) fn new(tag: Option<Tag>, registry: Arc<Registry>, parent: Option<LifetimeScope>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                tag,
                registry,
                parent,
                cache: Mutex::new(Cache::default()),
                locks: SlotLocks::default(),
                disposed: AtomicBool::new(false),
            }),
            operation: None,
        }
    }

    /// Handle to the same scope whose resolve calls join `operation` while it is active.
    #[must_use]
    pub(crate) fn joined(&self, operation: &Arc<ResolveOperation>) -> Self {
        Self {
            inner: self.inner.clone(),
            operation: Some(operation.clone()),
        }
    }

    fn detached(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            operation: None,
        }
    }

    fn operation(&self) -> Arc<ResolveOperation> {
        match &self.operation {
            Some(operation) if operation.is_active() => operation.clone(),
            _ => ResolveOperation::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        self.inner.tag.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Registry visible from this scope, including the overlays of configured ancestors.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&LifetimeScope> {
        self.inner.parent.as_ref()
    }

    fn name(&self) -> &str {
        self.inner.tag.as_ref().map_or("<untagged>", Tag::as_str)
    }

    /// Resolves the most recently registered component exposing `S`.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NotRegistered`] if nothing exposes `S`
    /// - Returns [`ResolveErrorKind::Disposed`] if the scope is disposed
    /// - Returns [`ResolveErrorKind::DependencyResolution`] if the component or one of its dependencies can't be activated
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
        self.resolve_in(key, &[], &self.operation())
    }

    /// Resolves `S`, supplying `parameters` to the activation of the component itself.
    /// Its dependencies are resolved without them.
    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_with_parameters<S: ?Sized + Send + Sync + 'static>(
        &self,
        parameters: &[Parameter],
    ) -> Result<Arc<S>, ResolveErrorKind> {
        self.resolve_in(&ServiceKey::of::<S>(), parameters, &self.operation())
    }

    /// Returns `Ok(None)` if `S` isn't registered, other failures are still returned.
    #[allow(clippy::missing_errors_doc)]
    pub fn try_resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, ResolveErrorKind> {
        not_registered_as_none(self.resolve())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn try_resolve_named<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<Option<Arc<S>>, ResolveErrorKind> {
        not_registered_as_none(self.resolve_named(name))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn try_resolve_keyed<S, K>(&self, key: K) -> Result<Option<Arc<S>>, ResolveErrorKind>
    where
        S: ?Sized + Send + Sync + 'static,
        K: Eq + Debug + Send + Sync + 'static,
    {
        not_registered_as_none(self.resolve_keyed(key))
    }

    /// Resolves every component exposing `S`, in registration order. Empty if there is none.
    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_all<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<S>>, ResolveErrorKind> {
        self.resolve_all_in(&ServiceKey::of::<S>(), &self.operation())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn resolve_with_metadata<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Meta<S>, ResolveErrorKind> {
        self.resolve_with_metadata_in(&ServiceKey::of::<S>(), &self.operation())
    }

    #[inline]
    #[must_use]
    pub fn is_registered<S: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.is_registered(&ServiceKey::of::<S>())
    }

    #[inline]
    #[must_use]
    pub fn is_registered_named<S: ?Sized + 'static>(&self, name: impl Into<Cow<'static, str>>) -> bool {
        self.inner.registry.is_registered(&ServiceKey::named::<S>(name))
    }

    #[inline]
    #[must_use]
    pub fn is_registered_keyed<S, K>(&self, key: K) -> bool
    where
        S: ?Sized + 'static,
        K: Eq + Debug + Send + Sync + 'static,
    {
        self.inner.registry.is_registered(&ServiceKey::keyed::<S, K>(key))
    }

    /// Starts building a child scope
    #[inline]
    #[must_use]
    pub fn enter(&self) -> ChildScopeBuilder {
        ChildScopeBuilder {
            parent: self.clone(),
            tag: None,
            configuration: None,
        }
    }

    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn begin_lifetime_scope(&self) -> Result<LifetimeScope, ScopeErrorKind> {
        self.enter().build()
    }

    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn begin_lifetime_scope_tagged(&self, tag: impl Into<Tag>) -> Result<LifetimeScope, ScopeErrorKind> {
        self.enter().with_tag(tag).build()
    }

    /// Begins a child scope with extra registrations, visible only to it and its descendants.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn begin_lifetime_scope_with<F>(&self, configure: F) -> Result<LifetimeScope, ScopeErrorKind>
    where
        F: FnOnce(&mut ContainerBuilder),
    {
        self.enter().with_configuration(configure).build()
    }

    /// Releases the owned instances in reverse activation order and drops the cached ones.
    /// Calling it again has no effect.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> ComponentContext {
        self.context_with(&[])
    }

    #[cfg(test)]
    pub(crate) fn context_with(&self, parameters: &[Parameter]) -> ComponentContext {
        ComponentContext {
            scope: self.clone(),
            operation: ResolveOperation::new(),
            parameters: parameters.into(),
        }
    }
}

impl LifetimeScope {
    fn ensure_active(&self) -> Result<(), ResolveErrorKind> {
        if self.is_disposed() {
            let err = ResolveErrorKind::Disposed {
                tag: self.inner.tag.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    fn find_registration(&self, key: &ServiceKey) -> Result<Arc<Registration>, ResolveErrorKind> {
        match self.inner.registry.try_get_registration(key) {
            Some(registration) => Ok(registration),
            None => {
                let err = ResolveErrorKind::NotRegistered { key: key.clone() };
                error!("{}", err);
                Err(err)
            }
        }
    }

    pub(crate) fn resolve_in<S: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey,
        parameters: &[Parameter],
        operation: &Arc<ResolveOperation>,
    ) -> Result<Arc<S>, ResolveErrorKind> {
        let span = info_span!("resolve", service = %key, scope = self.name());
        let _guard = span.enter();

        self.ensure_active()?;

        if key.qualifier == Qualifier::None
            && key.type_info == TypeInfo::of::<LifetimeScope>()
            && self.inner.registry.exposes_lifetime_scope()
        {
            debug!("Resolved current lifetime scope");
            let boxed: BoxedService = Box::new(Arc::new(self.joined(operation)));
            return downcast_service(boxed, key);
        }

        let registration = self.find_registration(key)?;
        let instance = self.resolve_registration(&registration, parameters, operation)?;
        cast(&registration, key, instance)
    }

    pub(crate) fn resolve_all_in<S: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey,
        operation: &Arc<ResolveOperation>,
    ) -> Result<Vec<Arc<S>>, ResolveErrorKind> {
        let span = info_span!("resolve_all", service = %key, scope = self.name());
        let _guard = span.enter();

        self.ensure_active()?;

        let registrations = self.inner.registry.registrations_for(key);
        debug!(count = registrations.len(), "Found registrations");

        registrations
            .iter()
            .map(|registration| {
                let instance = self.resolve_registration(registration, &[], operation)?;
                cast(registration, key, instance)
            })
            .collect()
    }

    pub(crate) fn resolve_with_metadata_in<S: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey,
        operation: &Arc<ResolveOperation>,
    ) -> Result<Meta<S>, ResolveErrorKind> {
        let span = info_span!("resolve_with_metadata", service = %key, scope = self.name());
        let _guard = span.enter();

        self.ensure_active()?;

        let registration = self.find_registration(key)?;
        let instance = self.resolve_registration(&registration, &[], operation)?;
        Ok(Meta {
            value: cast(&registration, key, instance)?,
            metadata: registration.metadata.clone(),
        })
    }

    fn resolve_registration(
        &self,
        registration: &Arc<Registration>,
        parameters: &[Parameter],
        operation: &Arc<ResolveOperation>,
    ) -> Result<AnyArc, ResolveErrorKind> {
        match registration.sharing() {
            Sharing::PerDependency => self.activate(registration, parameters, operation),
            Sharing::PerLifetimeScope => self.resolve_shared(registration, parameters, operation),
            Sharing::SingleInstance => self.home_scope(registration).resolve_shared(registration, parameters, operation),
            Sharing::PerMatchingLifetimeScope(tag) => match self.find_tagged(tag) {
                Some(scope) => scope.resolve_shared(registration, parameters, operation),
                None => {
                    let err = ResolveErrorKind::from(DependencyResolutionErrorKind::NoMatchingScope {
                        tag: tag.clone(),
                        service: registration.limit_type,
                    });
                    error!("{}", err);
                    Err(err)
                }
            },
        }
    }

    /// Outermost scope that still sees the registry layer of `registration`.
    fn home_scope(&self, registration: &Registration) -> &LifetimeScope {
        let mut scope = self;
        while let Some(parent) = &scope.inner.parent {
            if !parent.inner.registry.contains_layer(registration.layer) {
                break;
            }
            scope = parent;
        }
        scope
    }

    fn find_tagged(&self, tag: &Tag) -> Option<&LifetimeScope> {
        let mut scope = self;
        loop {
            if scope.inner.tag.as_ref() == Some(tag) {
                return Some(scope);
            }
            scope = scope.inner.parent.as_ref()?;
        }
    }

    fn resolve_shared(
        &self,
        registration: &Arc<Registration>,
        parameters: &[Parameter],
        operation: &Arc<ResolveOperation>,
    ) -> Result<AnyArc, ResolveErrorKind> {
        self.ensure_active()?;

        let cached = self.inner.cache.lock().get(registration.id);
        if let Some(instance) = cached {
            debug!("Found in cache");
            return Ok(instance);
        }
        debug!("Not found in cache");

        // Checked before taking the slot, it's already held by this operation in case of a cycle
        if let Err(err) = operation.check_cycle(registration) {
            let err = ResolveErrorKind::from(err);
            error!("{}", err);
            return Err(err);
        }

        let slot = self.inner.locks.get(registration.id);
        let _slot_guard = slot.lock();

        let cached = self.inner.cache.lock().get(registration.id);
        if let Some(instance) = cached {
            debug!("Found in cache after waiting for activation");
            return Ok(instance);
        }

        let instance = self.activate(registration, parameters, operation)?;

        let mut cache = self.inner.cache.lock();
        // Checked under the cache lock, disposal takes the shared instances under the same lock
        if self.is_disposed() {
            drop(cache);

            let err = ResolveErrorKind::Disposed {
                tag: self.inner.tag.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        cache.insert(registration.id, instance.clone());
        debug!("Cached");

        Ok(instance)
    }

    fn activate(
        &self,
        registration: &Arc<Registration>,
        parameters: &[Parameter],
        operation: &Arc<ResolveOperation>,
    ) -> Result<AnyArc, ResolveErrorKind> {
        let _activation = match operation.enter(registration) {
            Ok(activation) => activation,
            Err(err) => {
                let err = ResolveErrorKind::from(err);
                error!("{}", err);
                return Err(err);
            }
        };

        let parameters: Arc<[Parameter]> = if registration.hooks.has_preparing() {
            let mut parameters = parameters.to_vec();
            registration.hooks.run_preparing(registration, &mut parameters);
            parameters.into()
        } else {
            parameters.into()
        };

        let context = ComponentContext {
            scope: self.joined(operation),
            operation: operation.clone(),
            parameters,
        };

        let service = registration.limit_type;
        let instance = match registration.activator.call_cloned(context.clone()) {
            Ok(instance) => instance,
            Err(InstantiatorErrorKind::Deps(err)) => {
                let err = ResolveErrorKind::from(DependencyResolutionErrorKind::Dependency {
                    service,
                    source: Box::new(err),
                });
                error!("{}", err);
                return Err(err);
            }
            Err(InstantiatorErrorKind::Factory(InstantiateErrorKind::Resolve(err))) => {
                let err = ResolveErrorKind::from(DependencyResolutionErrorKind::Dependency { service, source: err });
                error!("{}", err);
                return Err(err);
            }
            Err(InstantiatorErrorKind::Factory(err)) => {
                let err = ResolveErrorKind::from(DependencyResolutionErrorKind::Activation { service, source: err });
                error!("{}", err);
                return Err(err);
            }
        };
        debug!(%service, "Activated");

        let instance = registration.hooks.run_activating(instance, &context);

        if registration.ownership() == Ownership::OwnedByScope {
            if let Some(disposer) = &registration.disposer {
                self.track_owned(Owned {
                    type_info: service,
                    instance: instance.clone(),
                    disposer: disposer.clone(),
                })?;
            }
        }

        registration.hooks.run_activated(&instance, &context);

        Ok(instance)
    }

    fn track_owned(&self, owned: Owned) -> Result<(), ResolveErrorKind> {
        let mut cache = self.inner.cache.lock();
        // Checked under the cache lock, so either disposal sees the instance or the instance sees disposal
        if self.is_disposed() {
            drop(cache);

            let Owned { instance, disposer, .. } = owned;
            let _ = disposer.call_cloned(instance);

            let err = ResolveErrorKind::Disposed {
                tag: self.inner.tag.clone(),
            };
            error!("{}", err);
            return Err(err);
        }
        cache.push_owned(owned);
        debug!("Pushed to owned set");

        Ok(())
    }
}

impl ScopeInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let (mut owned, shared) = {
            let mut cache = self.cache.lock();
            (cache.take_owned(), cache.take_shared())
        };
        while let Some(Owned {
            type_info,
            instance,
            disposer,
        }) = owned.0.pop_back()
        {
            let _ = disposer.call_cloned(instance);
            debug!(%type_info, "Released");
        }
        drop(shared);

        debug!(scope = self.tag.as_ref().map_or("<untagged>", Tag::as_str), "Lifetime scope disposed");
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::Acquire) {
            self.dispose();
            debug!("Lifetime scope disposed on drop");
        }
    }
}

impl Debug for LifetimeScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeScope")
            .field("tag", &self.inner.tag)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Builder of a child scope, see [`LifetimeScope::enter`]
pub struct ChildScopeBuilder {
    parent: LifetimeScope,
    tag: Option<Tag>,
    configuration: Option<ContainerBuilder>,
}

impl ChildScopeBuilder {
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds registrations to an overlay registry of the child.
    /// Can be called several times, the registrations accumulate.
    #[inline]
    #[must_use]
    pub fn with_configuration<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut ContainerBuilder),
    {
        configure(self.configuration.get_or_insert_with(ContainerBuilder::new));
        self
    }

    /// Creates the child scope
    ///
    /// # Errors
    /// - Returns [`ScopeErrorKind::Disposed`] if the parent is disposed
    /// - Returns [`ScopeErrorKind::Build`] if a module of the configuration fails to load
    pub fn build(self) -> Result<LifetimeScope, ScopeErrorKind> {
        let span = info_span!("begin_lifetime_scope", parent = self.parent.name());
        let _guard = span.enter();

        if self.parent.is_disposed() {
            let err = ScopeErrorKind::Disposed;
            error!("{}", err);
            return Err(err);
        }

        let registry = match self.configuration {
            Some(mut builder) => match builder.compile(Some(self.parent.inner.registry.clone())) {
                Ok(registry) => Arc::new(registry),
                Err(err) => {
                    error!("{}", err);
                    return Err(err.into());
                }
            },
            None => self.parent.inner.registry.clone(),
        };

        debug!(tag = self.tag.as_ref().map(Tag::as_str), "Lifetime scope begun");

        // A scope begun during an activation keeps taking part in its resolve operation
        let mut scope = LifetimeScope::new(self.tag, registry, Some(self.parent.detached()));
        scope.operation = self.parent.operation;

        Ok(scope)
    }
}

fn not_registered_as_none<S: ?Sized>(result: Result<Arc<S>, ResolveErrorKind>) -> Result<Option<Arc<S>>, ResolveErrorKind> {
    match result {
        Ok(instance) => Ok(Some(instance)),
        Err(err) if err.is_not_registered() => Ok(None),
        Err(err) => Err(err),
    }
}

fn cast<S: ?Sized + Send + Sync + 'static>(
    registration: &Registration,
    key: &ServiceKey,
    instance: AnyArc,
) -> Result<Arc<S>, ResolveErrorKind> {
    match registration.service(key).and_then(|service| service.cast(instance)) {
        Some(boxed) => downcast_service(boxed, key),
        None => {
            let err = ResolveErrorKind::from(DependencyResolutionErrorKind::IncorrectType {
                expected: key.type_info,
                actual: registration.limit_type,
            });
            error!("{}", err);
            Err(err)
        }
    }
}

fn downcast_service<S: ?Sized + Send + Sync + 'static>(boxed: BoxedService, key: &ServiceKey) -> Result<Arc<S>, ResolveErrorKind> {
    match boxed.downcast::<Arc<S>>() {
        Ok(instance) => Ok(*instance),
        Err(_) => {
            let err = ResolveErrorKind::from(DependencyResolutionErrorKind::IncorrectType {
                expected: TypeInfo::of::<S>(),
                actual: key.type_info,
            });
            error!("{}", err);
            Err(err)
        }
    }
}
