use alloc::sync::Arc;
use core::ops::Deref;

use crate::{builder::ContainerBuilder, registry::Registry, scope::LifetimeScope, tag::Tag};

/// Root lifetime scope, tagged [`crate::ROOT_TAG`]. Single instances of builder registrations live here.
#[derive(Clone, Debug)]
pub struct Container {
    scope: LifetimeScope,
}

impl Container {
    #[inline]
    #[must_use]
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            scope: LifetimeScope::new(Some(Tag::root()), Arc::new(registry), None),
        }
    }

    #[inline]
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> &LifetimeScope {
        &self.scope
    }
}

impl Deref for Container {
    type Target = LifetimeScope;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}

impl From<Container> for LifetimeScope {
    #[inline]
    fn from(container: Container) -> Self {
        container.scope
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Container;
    use crate::{LifetimeScope, Tag, ROOT_TAG};

    #[allow(unused_imports)]
    use alloc::{
        format,
        string::{String, ToString as _},
    };
    use tracing_test::traced_test;

    #[test]
    fn test_thread_safe() {
        fn impl_bounds<T: Send + Sync + 'static>() {}

        impl_bounds::<(Container, LifetimeScope)>();
    }

    #[test]
    #[traced_test]
    fn test_root_tag() {
        let container = Container::builder().build().unwrap();

        assert_eq!(container.tag(), Some(&Tag::new(ROOT_TAG)));
        assert!(container.parent().is_none());
    }

    #[test]
    #[traced_test]
    fn test_handles_keep_scope_alive() {
        let container = Container::builder().build().unwrap();
        let scope = LifetimeScope::from(container.clone());

        drop(container);
        assert!(!scope.is_disposed());

        let observer = scope.begin_lifetime_scope().unwrap();
        drop(scope);
        // The child keeps the root alive
        assert!(!observer.parent().unwrap().is_disposed());
    }
}
