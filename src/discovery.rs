use alloc::{boxed::Box, vec::Vec};
use linkme::distributed_slice;

use crate::{any::TypeInfo, module::Module};

/// Link-time declaration of a module, collected in [`MODULES`].
///
/// ```rust,ignore
/// use arbor::{linkme::distributed_slice, ModuleDescriptor, MODULES};
///
/// #[distributed_slice(MODULES)]
/// static BILLING: ModuleDescriptor = ModuleDescriptor::new("billing", "app", || Box::new(BillingModule));
/// ```
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub bundle: &'static str,
    base: Option<fn() -> TypeInfo>,
    factory: fn() -> Box<dyn Module>,
}

impl ModuleDescriptor {
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, bundle: &'static str, factory: fn() -> Box<dyn Module>) -> Self {
        Self {
            name,
            bundle,
            base: None,
            factory,
        }
    }

    /// Marks the module as a kind of `base`, used by [`crate::ContainerBuilder::register_bundle_modules_of`].
    /// `base` is usually `TypeInfo::of::<Marker>`.
    #[inline]
    #[must_use]
    pub const fn with_base(mut self, base: fn() -> TypeInfo) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn is_subtype_of<Base: ?Sized + 'static>(&self) -> bool {
        self.base.is_some_and(|base| base() == TypeInfo::of::<Base>())
    }

    #[inline]
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Module> {
        (self.factory)()
    }
}

#[distributed_slice]
pub static MODULES: [ModuleDescriptor];

/// Source of the modules of a bundle.
pub trait ModuleCatalog {
    #[must_use]
    fn discover(&self, bundle: &str) -> Vec<&ModuleDescriptor>;
}

/// Catalog of the modules declared in [`MODULES`] by every crate linked into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkedModules;

impl ModuleCatalog for LinkedModules {
    fn discover(&self, bundle: &str) -> Vec<&ModuleDescriptor> {
        MODULES.discover(bundle)
    }
}

impl ModuleCatalog for [ModuleDescriptor] {
    fn discover(&self, bundle: &str) -> Vec<&ModuleDescriptor> {
        self.iter().filter(|descriptor| descriptor.bundle == bundle).collect()
    }
}
