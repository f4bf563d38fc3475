use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::mem;
use tracing::{debug, error, info_span};

use crate::{
    container::Container,
    dependency_resolver::DependencyResolver,
    discovery::ModuleCatalog,
    errors::{BuildErrorKind, InstantiateErrorKind, ResolveErrorKind},
    instantiator::{boxed_instance, boxed_instantiator, Injectable, Instantiator},
    module::Module,
    registration::{PendingRegistration, RegistrationBuilder},
    registry::Registry,
};

/// Collects registrations and modules, then builds the [`Container`] once.
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: Vec<PendingRegistration>,
    // Module and the number of registrations added before it
    modules: Vec<(usize, Box<dyn Module>)>,
    exposes_lifetime_scope: bool,
    built: bool,
}

impl ContainerBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push<T: Send + Sync + 'static>(&mut self, registration: PendingRegistration) -> RegistrationBuilder<'_, T> {
        self.registrations.push(registration);
        let index = self.registrations.len() - 1;
        RegistrationBuilder::new(&mut self.registrations[index])
    }

    /// Registers a component created by `instantiator`, whose arguments are resolved from the container.
    pub fn register<Inst, Deps>(&mut self, instantiator: Inst) -> RegistrationBuilder<'_, Inst::Provides>
    where
        Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
        Inst::Provides: Send + Sync,
        Deps: DependencyResolver<Error = ResolveErrorKind>,
    {
        self.push(PendingRegistration::new::<Inst::Provides>(boxed_instantiator(instantiator)))
    }

    /// Registers `T` built by [`Injectable::inject`].
    pub fn register_type<T: Injectable>(&mut self) -> RegistrationBuilder<'_, T> {
        self.register(|dependencies: T::Dependencies| T::inject(dependencies))
    }

    pub fn register_default<T: Default + Send + Sync + 'static>(&mut self) -> RegistrationBuilder<'_, T> {
        self.register(|| Ok(T::default()))
    }

    /// Registers a pre-built value. It is shared and externally owned unless the returned handle says otherwise.
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, instance: T) -> RegistrationBuilder<'_, T> {
        self.push(PendingRegistration::new::<T>(boxed_instance(Arc::new(instance))))
            .single_instance()
            .externally_owned()
    }

    /// Defers `module` until [`Self::build`]. Its registrations take the place of the module in registration order.
    pub fn register_module<M: Module + 'static>(&mut self, module: M) -> &mut Self {
        self.modules.push((self.registrations.len(), Box::new(module)));
        self
    }

    /// Registers every module of `bundle` found by `catalog`, in the order it returns them.
    pub fn register_bundle_modules<C>(&mut self, catalog: &C, bundle: &str) -> &mut Self
    where
        C: ModuleCatalog + ?Sized,
    {
        for descriptor in catalog.discover(bundle) {
            debug!(module = descriptor.name, bundle, "Module discovered");
            self.modules.push((self.registrations.len(), descriptor.instantiate()));
        }
        self
    }

    /// Like [`Self::register_bundle_modules`], keeping only modules declared with the `Base` marker.
    pub fn register_bundle_modules_of<Base, C>(&mut self, catalog: &C, bundle: &str) -> &mut Self
    where
        Base: ?Sized + 'static,
        C: ModuleCatalog + ?Sized,
    {
        for descriptor in catalog
            .discover(bundle)
            .into_iter()
            .filter(|descriptor| descriptor.is_subtype_of::<Base>())
        {
            debug!(module = descriptor.name, bundle, "Module discovered");
            self.modules.push((self.registrations.len(), descriptor.instantiate()));
        }
        self
    }

    /// Makes [`crate::LifetimeScope`] resolvable, returning the scope the request is made from.
    pub fn expose_lifetime_scope(&mut self) -> &mut Self {
        self.exposes_lifetime_scope = true;
        self
    }

    /// Loads the modules and creates the container
    ///
    /// # Errors
    /// - Returns [`BuildErrorKind::AlreadyBuilt`] if the builder was already built
    /// - Returns [`BuildErrorKind::Module`] if a module fails to load
    pub fn build(&mut self) -> Result<Container, BuildErrorKind> {
        let span = info_span!("build");
        let _guard = span.enter();

        let registry = self.compile(None)?;
        debug!(registrations = registry.registrations().count(), "Container built");

        Ok(Container::new(registry))
    }

    pub(crate) fn compile(&mut self, parent: Option<Arc<Registry>>) -> Result<Registry, BuildErrorKind> {
        if self.built {
            let err = BuildErrorKind::AlreadyBuilt;
            error!("{}", err);
            return Err(err);
        }
        self.built = true;

        let mut exposes_lifetime_scope = self.exposes_lifetime_scope;
        let registrations = flatten(
            mem::take(&mut self.registrations),
            mem::take(&mut self.modules),
            &mut exposes_lifetime_scope,
        )?;

        Ok(Registry::new(registrations, parent, exposes_lifetime_scope))
    }
}

fn flatten(
    registrations: Vec<PendingRegistration>,
    modules: Vec<(usize, Box<dyn Module>)>,
    exposes_lifetime_scope: &mut bool,
) -> Result<Vec<PendingRegistration>, BuildErrorKind> {
    let mut flattened = Vec::with_capacity(registrations.len());
    let mut modules = modules.into_iter().peekable();

    for (position, registration) in registrations.into_iter().enumerate() {
        while let Some((_, module)) = modules.next_if(|(at, _)| *at <= position) {
            flattened.extend(load(&*module, exposes_lifetime_scope)?);
        }
        flattened.push(registration);
    }
    for (_, module) in modules {
        flattened.extend(load(&*module, exposes_lifetime_scope)?);
    }

    Ok(flattened)
}

fn load(module: &dyn Module, exposes_lifetime_scope: &mut bool) -> Result<Vec<PendingRegistration>, BuildErrorKind> {
    let name = module.name();
    let span = info_span!("load", module = name);
    let _guard = span.enter();

    let mut builder = ContainerBuilder::new();
    if let Err(source) = module.load(&mut builder) {
        let err = BuildErrorKind::Module { name, source };
        error!("{}", err);
        return Err(err);
    }
    debug!(registrations = builder.registrations.len(), modules = builder.modules.len(), "Module loaded");

    *exposes_lifetime_scope |= builder.exposes_lifetime_scope;
    flatten(builder.registrations, builder.modules, exposes_lifetime_scope)
}
