use alloc::boxed::Box;
use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;
use crate::{any::TypeInfo, key::ServiceKey, tag::Tag};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Component not registered: {key}")]
    NotRegistered { key: ServiceKey },
    #[error("Lifetime scope `{}` is disposed", scope_name(.tag))]
    Disposed { tag: Option<Tag> },
    #[error(transparent)]
    DependencyResolution(#[from] DependencyResolutionErrorKind),
}

impl ResolveErrorKind {
    #[inline]
    #[must_use]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DependencyResolutionErrorKind {
    #[error("{}", CycleDisplay(.chain))]
    CircularDependency { chain: Box<[TypeInfo]> },
    #[error(
        "\
        No scope with tag `{tag}` is visible from the scope in which `{service}` was requested. \
        Begin a lifetime scope tagged `{tag}` and resolve from it or from its descendants\
        "
    )]
    NoMatchingScope { tag: Tag, service: TypeInfo },
    #[error("Activation of `{service}` exceeded the maximum resolve depth of {depth}, the dependency graph is likely recursive")]
    MaxDepthExceeded { service: TypeInfo, depth: usize },
    #[error("Activator for `{service}` failed: {source}")]
    Activation {
        service: TypeInfo,
        #[source]
        source: InstantiateErrorKind,
    },
    #[error("Unable to resolve a dependency of `{service}`: {source}")]
    Dependency {
        service: TypeInfo,
        #[source]
        source: Box<ResolveErrorKind>,
    },
    #[error("Incorrect activated type. Actual: {actual}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeInfo },
}

fn scope_name(tag: &Option<Tag>) -> &str {
    tag.as_ref().map_or("<untagged>", Tag::as_str)
}

struct CycleDisplay<'a>(&'a [TypeInfo]);

impl Display for CycleDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Circular component dependency detected: ")?;
        for (index, type_info) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{type_info}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyResolutionErrorKind, ResolveErrorKind};
    use crate::{any::TypeInfo, key::ServiceKey};

    use alloc::{string::ToString as _, vec};

    struct Left;
    struct Right;

    #[test]
    fn test_cycle_display() {
        let err = DependencyResolutionErrorKind::CircularDependency {
            chain: vec![TypeInfo::of::<Left>(), TypeInfo::of::<Right>(), TypeInfo::of::<Left>()].into_boxed_slice(),
        };
        let message = err.to_string();

        assert!(message.starts_with("Circular component dependency detected: "));
        assert_eq!(message.matches(" -> ").count(), 2);
    }

    #[test]
    fn test_disposed_untagged() {
        let err = ResolveErrorKind::Disposed { tag: None };

        assert_eq!(err.to_string(), "Lifetime scope `<untagged>` is disposed");
        assert!(!err.is_not_registered());
        assert!(ResolveErrorKind::NotRegistered {
            key: ServiceKey::of::<Left>()
        }
        .is_not_registered());
    }
}
