mod container;
mod dependency_resolver;
mod instantiate;
mod instantiator;

pub use container::{BuildErrorKind, ScopeErrorKind};
pub use dependency_resolver::{DependencyResolutionErrorKind, ResolveErrorKind};
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;

/// Result returned by instantiators and activating hooks.
pub type InstantiatorResult<T> = Result<T, InstantiateErrorKind>;
