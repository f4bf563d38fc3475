use crate::{context::ComponentContext, errors::ResolveErrorKind};

/// Argument of an instantiator, resolved from the [`ComponentContext`] of the activation.
///
/// `position` is the index of the argument, used to match positional parameters.
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    #[allow(clippy::missing_errors_doc)]
    fn resolve(context: &ComponentContext, position: usize) -> Result<Self, Self::Error>;
}

impl DependencyResolver for ComponentContext {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(context: &ComponentContext, _position: usize) -> Result<Self, Self::Error> {
        Ok(context.clone())
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_variables, unused_mut, unused_assignments)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            fn resolve(context: &ComponentContext, position: usize) -> Result<Self, Self::Error> {
                let mut position = position;
                $(
                    let $ty = $ty::resolve(context, position).map_err(Into::into)?;
                    position += 1;
                )*
                Ok(($($ty,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::DependencyResolver;
    use crate::{
        inject::{Inject, InjectOpt},
        ComponentContext, ContainerBuilder, Parameter,
    };

    use alloc::sync::Arc;
    #[allow(unused_imports)]
    use alloc::{
        format,
        string::{String, ToString as _},
    };
    use tracing_test::traced_test;

    struct Port(u16);
    struct Host(&'static str);

    #[test]
    #[traced_test]
    fn test_tuple_positions() {
        let mut builder = ContainerBuilder::new();
        builder.register(|| Ok(Port(80)));
        let container = builder.build().unwrap();

        let context = container.context_with(&[Parameter::positional(1, Arc::new(Port(8080)))]);
        let (Inject(first), Inject(second)) = <(Inject<Port>, Inject<Port>)>::resolve(&context, 0).unwrap();

        assert_eq!(first.0, 80);
        assert_eq!(second.0, 8080);
    }

    #[test]
    #[traced_test]
    fn test_context_and_optional() {
        let container = ContainerBuilder::new().build().unwrap();

        let (_, InjectOpt(host)) = <(ComponentContext, InjectOpt<Host>)>::resolve(&container.context(), 0).unwrap();

        assert!(host.is_none());
        assert!(<(Inject<Host>,)>::resolve(&container.context(), 0).is_err());
    }
}
