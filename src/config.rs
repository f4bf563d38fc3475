use crate::tag::Tag;

/// Whether and where an activated instance is reused.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Sharing {
    /// New instance on every request.
    #[default]
    PerDependency,
    /// One instance for the container, cached by the scope that owns the registration.
    SingleInstance,
    /// One instance per lifetime scope that requests it.
    PerLifetimeScope,
    /// One instance per nearest enclosing scope with the given tag.
    PerMatchingLifetimeScope(Tag),
}

/// Who releases an activated instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ownership {
    /// The scope that activated the instance releases it when disposed.
    #[default]
    OwnedByScope,
    /// The container never releases the instance.
    ExternallyOwned,
}

/// Config for a registration
/// ## Fields
/// - `sharing`:
///   Controls caching of the instance produced by the registration.
///
///   This does **not** affect the dependencies of the instance,
///   they follow their own registrations.
/// - `ownership`:
///   If [`Ownership::OwnedByScope`], the release operation of the registration (if any) is called on scope disposal.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Config {
    pub sharing: Sharing,
    pub ownership: Ownership,
}

impl Config {
    #[inline]
    #[must_use]
    pub fn single_instance() -> Self {
        Self {
            sharing: Sharing::SingleInstance,
            ownership: Ownership::OwnedByScope,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        !matches!(self.sharing, Sharing::PerDependency)
    }
}
