use alloc::boxed::Box;

use super::dependency_resolver::ResolveErrorKind;

/// Failure of a user-provided instantiator or hook.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    /// A dependency requested manually through [`crate::ComponentContext`] could not be resolved.
    #[error(transparent)]
    Resolve(Box<ResolveErrorKind>),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl From<ResolveErrorKind> for InstantiateErrorKind {
    #[inline]
    fn from(err: ResolveErrorKind) -> Self {
        Self::Resolve(Box::new(err))
    }
}
