use alloc::{borrow::Cow, boxed::Box, sync::Arc, vec, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    any::{AnyArc, BoxedService, TypeInfo},
    config::{Config, Ownership, Sharing},
    disposer::{boxed_disposer, BoxedCloneDisposer, Disposable, Disposer},
    hooks::{ActivatedEvent, ActivatingEvent, Hooks, PreparingEvent},
    instantiator::BoxedCloneInstantiator,
    key::{Qualifier, ServiceKey},
    metadata::Metadata,
    tag::Tag,
};

static NEXT_REGISTRATION_ID: AtomicUsize = AtomicUsize::new(0);
static NEXT_LAYER_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-wide unique identity of a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(usize);

impl RegistrationId {
    #[inline]
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a registry layer: the root registry of a container or the overlay of a configured child scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct LayerId(usize);

impl LayerId {
    #[inline]
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Converts an activated `Arc<T>` of the limit type into a boxed `Arc<S>` of the exposed service.
type Caster = Arc<dyn Fn(AnyArc) -> Option<BoxedService> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct ExposedService {
    pub(crate) key: ServiceKey,
    caster: Caster,
}

impl ExposedService {
    fn new<T, S, F>(key: ServiceKey, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        Self {
            key,
            caster: Arc::new(move |instance: AnyArc| {
                instance
                    .downcast::<T>()
                    .ok()
                    .map(|instance| Box::new(cast(instance)) as BoxedService)
            }),
        }
    }

    fn of_self<T: Send + Sync + 'static>(qualifier: Qualifier) -> Self {
        Self::new::<T, T, _>(
            ServiceKey {
                type_info: TypeInfo::of::<T>(),
                qualifier,
            },
            |instance| instance,
        )
    }

    #[inline]
    pub(crate) fn cast(&self, instance: AnyArc) -> Option<BoxedService> {
        (self.caster)(instance)
    }
}

/// Compiled registration: an activator, the type it produces, the services it is exposed as, and its policies.
pub struct Registration {
    pub(crate) id: RegistrationId,
    pub(crate) layer: LayerId,
    pub(crate) limit_type: TypeInfo,
    pub(crate) services: Vec<ExposedService>,
    pub(crate) activator: BoxedCloneInstantiator,
    pub(crate) config: Config,
    pub(crate) metadata: Arc<Metadata>,
    pub(crate) disposer: Option<BoxedCloneDisposer>,
    pub(crate) hooks: Hooks,
}

impl Registration {
    #[inline]
    #[must_use]
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// Concrete type produced by the activator.
    #[inline]
    #[must_use]
    pub fn limit_type(&self) -> TypeInfo {
        self.limit_type
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceKey> {
        self.services.iter().map(|service| &service.key)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn sharing(&self) -> &Sharing {
        &self.config.sharing
    }

    #[inline]
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.config.ownership
    }

    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn service(&self, key: &ServiceKey) -> Option<&ExposedService> {
        self.services.iter().find(|service| service.key == *key)
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("limit_type", &self.limit_type.name)
            .field("services", &self.services.iter().map(|service| &service.key).collect::<Vec<_>>())
            .field("config", &self.config)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Registration being configured in a [`crate::ContainerBuilder`].
pub(crate) struct PendingRegistration {
    limit_type: TypeInfo,
    self_service: ExposedService,
    services: Vec<ExposedService>,
    activator: BoxedCloneInstantiator,
    config: Config,
    metadata: Metadata,
    disposer: Option<BoxedCloneDisposer>,
    hooks: Hooks,
}

impl PendingRegistration {
    pub(crate) fn new<T: Send + Sync + 'static>(activator: BoxedCloneInstantiator) -> Self {
        Self {
            limit_type: TypeInfo::of::<T>(),
            self_service: ExposedService::of_self::<T>(Qualifier::None),
            services: Vec::new(),
            activator,
            config: Config::default(),
            metadata: Metadata::new(),
            disposer: None,
            hooks: Hooks::default(),
        }
    }

    #[must_use]
    pub(crate) fn into_registration(self, layer: LayerId) -> Registration {
        let services = if self.services.is_empty() {
            vec![self.self_service]
        } else {
            self.services
        };

        Registration {
            id: RegistrationId::next(),
            layer,
            limit_type: self.limit_type,
            services,
            activator: self.activator,
            config: self.config,
            metadata: Arc::new(self.metadata),
            disposer: self.disposer,
            hooks: self.hooks,
        }
    }
}

/// Fluent handle returned by the `register*` methods of [`crate::ContainerBuilder`].
///
/// If none of `as_*`, `named*` or `keyed*` is called, the registration is exposed as `T` itself.
pub struct RegistrationBuilder<'a, T> {
    registration: &'a mut PendingRegistration,
    _limit: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> RegistrationBuilder<'a, T> {
    #[inline]
    pub(crate) fn new(registration: &'a mut PendingRegistration) -> Self {
        Self {
            registration,
            _limit: PhantomData,
        }
    }

    fn expose(self, service: ExposedService) -> Self {
        self.registration.services.push(service);
        self
    }

    /// Exposes the registration as its own type `T`.
    pub fn as_self(self) -> Self {
        self.expose(ExposedService::of_self::<T>(Qualifier::None))
    }

    /// Exposes the registration as `S`, usually a trait object:
    /// ```rust
    /// use std::sync::Arc;
    /// use arbor::ContainerBuilder;
    ///
    /// trait Writer: Send + Sync {}
    /// struct Console;
    /// impl Writer for Console {}
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register(|| Ok(Console)).as_service(|console| console as Arc<dyn Writer>);
    /// ```
    pub fn as_service<S, F>(self, cast: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        self.expose(ExposedService::new::<T, S, F>(ServiceKey::of::<S>(), cast))
    }

    pub fn named(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.expose(ExposedService::of_self::<T>(Qualifier::Named(name.into())))
    }

    pub fn named_as<S, F>(self, name: impl Into<Cow<'static, str>>, cast: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        self.expose(ExposedService::new::<T, S, F>(ServiceKey::named::<S>(name), cast))
    }

    pub fn keyed<K>(self, key: K) -> Self
    where
        K: Eq + Debug + Send + Sync + 'static,
    {
        self.expose(ExposedService::of_self::<T>(ServiceKey::keyed::<T, K>(key).qualifier))
    }

    pub fn keyed_as<S, K, F>(self, key: K, cast: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        K: Eq + Debug + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        self.expose(ExposedService::new::<T, S, F>(ServiceKey::keyed::<S, K>(key), cast))
    }

    pub fn with_metadata<V: Send + Sync + 'static>(self, key: impl Into<Cow<'static, str>>, value: V) -> Self {
        self.registration.metadata.insert(key, value);
        self
    }

    pub fn with_config(self, config: Config) -> Self {
        self.registration.config = config;
        self
    }

    pub fn single_instance(self) -> Self {
        self.registration.config.sharing = Sharing::SingleInstance;
        self
    }

    pub fn instance_per_lifetime_scope(self) -> Self {
        self.registration.config.sharing = Sharing::PerLifetimeScope;
        self
    }

    /// One instance per nearest enclosing scope tagged `tag`.
    /// Resolving outside such a scope fails with [`crate::DependencyResolutionErrorKind::NoMatchingScope`].
    pub fn instance_per_matching_lifetime_scope(self, tag: impl Into<Tag>) -> Self {
        self.registration.config.sharing = Sharing::PerMatchingLifetimeScope(tag.into());
        self
    }

    pub fn instance_per_dependency(self) -> Self {
        self.registration.config.sharing = Sharing::PerDependency;
        self
    }

    pub fn externally_owned(self) -> Self {
        self.registration.config.ownership = Ownership::ExternallyOwned;
        self
    }

    pub fn owned_by_lifetime_scope(self) -> Self {
        self.registration.config.ownership = Ownership::OwnedByScope;
        self
    }

    pub fn on_preparing<F>(self, hook: F) -> Self
    where
        F: Fn(&mut PreparingEvent<'_>) + Send + Sync + 'static,
    {
        self.registration.hooks.push_preparing(hook);
        self
    }

    pub fn on_activating<F>(self, hook: F) -> Self
    where
        F: Fn(&mut ActivatingEvent<'_, T>) + Send + Sync + 'static,
    {
        self.registration.hooks.push_activating(hook);
        self
    }

    pub fn on_activated<F>(self, hook: F) -> Self
    where
        F: Fn(&ActivatedEvent<'_, T>) + Send + Sync + 'static,
    {
        self.registration.hooks.push_activated(hook);
        self
    }

    /// Sets the release operation, called when the scope owning the instance is disposed.
    /// Has no effect on externally owned instances.
    pub fn on_release<D>(self, disposer: D) -> Self
    where
        D: Disposer<T> + Send + Sync,
    {
        self.registration.disposer = Some(boxed_disposer(disposer));
        self
    }
}

impl<T: Disposable + Send + Sync + 'static> RegistrationBuilder<'_, T> {
    /// Releases instances with [`Disposable::dispose`].
    pub fn disposable(self) -> Self {
        self.on_release(|instance: Arc<T>| instance.dispose())
    }
}
