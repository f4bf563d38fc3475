use alloc::sync::Arc;
use tracing::debug;

use crate::{
    any::AnyArc,
    context::ComponentContext,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, InstantiatorResult, ResolveErrorKind},
    service::{service_fn, BoxCloneService},
};

/// Produces a component from its resolved dependencies.
///
/// Implemented for every `Clone` closure whose arguments implement [`DependencyResolver`]:
/// ```rust
/// use arbor::{ContainerBuilder, Inject};
///
/// struct Writer;
/// struct Notifier(std::sync::Arc<Writer>);
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(|| Ok(Writer));
/// builder.register(|Inject(writer): Inject<Writer>| Ok(Notifier(writer)));
/// ```
pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

/// Component that knows how to build itself from its dependencies.
/// Registered with [`crate::ContainerBuilder::register_type`].
pub trait Injectable: Sized + Send + Sync + 'static {
    type Dependencies: DependencyResolver<Error = ResolveErrorKind>;

    #[allow(clippy::missing_errors_doc)]
    fn inject(dependencies: Self::Dependencies) -> InstantiatorResult<Self>;
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<ComponentContext, AnyArc, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    BoxCloneService::new(service_fn({
        move |context: ComponentContext| -> Result<AnyArc, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>> {
            let dependencies = match Deps::resolve(&context, 0) {
                Ok(dependencies) => dependencies,
                Err(err) => return Err(InstantiatorErrorKind::Deps(err)),
            };
            let instance = match instantiator.clone().instantiate(dependencies) {
                Ok(instance) => instance,
                Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
            };

            debug!("Instantiated");

            Ok(Arc::new(instance) as AnyArc)
        }
    }))
}

/// Activator of a value created outside the container.
#[must_use]
pub(crate) fn boxed_instance<T: Send + Sync + 'static>(instance: Arc<T>) -> BoxedCloneInstantiator {
    BoxCloneService::new(service_fn(move |_: ComponentContext| {
        Ok::<_, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>(instance.clone() as AnyArc)
    }))
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);
