use alloc::{boxed::Box, sync::Arc};
use core::any::type_name;

use crate::builder::ContainerBuilder;

/// Group of related registrations, loaded into the builder when it is built.
///
/// ```rust
/// use arbor::{ContainerBuilder, Module};
///
/// struct Clock(u64);
/// struct TimeModule;
///
/// impl Module for TimeModule {
///     fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
///         builder.register(|| Ok(Clock(0))).single_instance();
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_module(TimeModule);
/// let container = builder.build().unwrap();
/// assert!(container.is_registered::<Clock>());
/// ```
pub trait Module {
    /// Adds the registrations of the module.
    ///
    /// # Errors
    /// An error aborts the build, see [`crate::BuildErrorKind::Module`]
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()>;

    #[must_use]
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<M: Module + ?Sized> Module for Arc<M> {
    #[inline]
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        (**self).load(builder)
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<M: Module + ?Sized> Module for Box<M> {
    #[inline]
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        (**self).load(builder)
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Module backed by a closure, see [`module_fn`]
#[derive(Clone)]
pub struct FnModule<F> {
    name: &'static str,
    load: F,
}

impl<F> Module for FnModule<F>
where
    F: Fn(&mut ContainerBuilder) -> anyhow::Result<()>,
{
    #[inline]
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        (self.load)(builder)
    }

    #[inline]
    fn name(&self) -> &'static str {
        self.name
    }
}

#[inline]
#[must_use]
pub const fn module_fn<F>(name: &'static str, load: F) -> FnModule<F>
where
    F: Fn(&mut ContainerBuilder) -> anyhow::Result<()>,
{
    FnModule { name, load }
}
