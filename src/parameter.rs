use alloc::{borrow::Cow, sync::Arc};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

use crate::any::TypeInfo;

/// Value supplied at resolve time (or by a preparing hook) that overrides auto-resolution of a dependency.
#[derive(Clone)]
pub struct Parameter {
    pub(crate) selector: Selector,
    pub(crate) type_info: TypeInfo,
    // Always an `Arc<S>` of the service type of `type_info`
    value: Arc<dyn Any + Send + Sync>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Selector {
    Positional(usize),
    Named(Cow<'static, str>),
    Typed,
}

impl Parameter {
    /// Supplies the argument at `position` of the instantiator.
    #[must_use]
    pub fn positional<S: ?Sized + Send + Sync + 'static>(position: usize, value: Arc<S>) -> Self {
        Self::with_selector(Selector::Positional(position), value)
    }

    /// Supplies every argument whose service type is `S`.
    #[must_use]
    pub fn typed<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> Self {
        Self::with_selector(Selector::Typed, value)
    }

    /// Supplies a value read by name through [`crate::ComponentContext::named_parameter`].
    #[must_use]
    pub fn named<S: ?Sized + Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: Arc<S>) -> Self {
        Self::with_selector(Selector::Named(name.into()), value)
    }

    fn with_selector<S: ?Sized + Send + Sync + 'static>(selector: Selector, value: Arc<S>) -> Self {
        Self {
            selector,
            type_info: TypeInfo::of::<S>(),
            value: Arc::new(value),
        }
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.selector {
            Selector::Named(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn value<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.value.downcast_ref::<Arc<S>>().cloned()
    }

    pub(crate) fn matches<S: ?Sized + 'static>(&self, position: usize) -> bool {
        if self.type_info != TypeInfo::of::<S>() {
            return false;
        }
        match self.selector {
            Selector::Positional(expected) => expected == position,
            Selector::Typed => true,
            Selector::Named(_) => false,
        }
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("selector", &self.selector)
            .field("type", &self.type_info.name)
            .finish_non_exhaustive()
    }
}

/// Finds the value for the argument at `position` with service type `S`.
/// Later parameters win, so preparing hooks can override values supplied by the caller.
pub(crate) fn find<S: ?Sized + Send + Sync + 'static>(parameters: &[Parameter], position: usize) -> Option<Arc<S>> {
    parameters
        .iter()
        .rev()
        .find(|parameter| parameter.matches::<S>(position))
        .and_then(|parameter| parameter.value::<S>())
}

#[cfg(test)]
mod tests {
    use super::{find, Parameter};

    use alloc::{sync::Arc, vec};

    trait Writer: Send + Sync {
        fn id(&self) -> u8;
    }

    struct Console(u8);

    impl Writer for Console {
        fn id(&self) -> u8 {
            self.0
        }
    }

    #[test]
    fn test_find_positional_and_typed() {
        let parameters = vec![
            Parameter::typed(Arc::new(Console(1)) as Arc<dyn Writer>),
            Parameter::positional(2, Arc::new(Console(2)) as Arc<dyn Writer>),
        ];

        assert_eq!(find::<dyn Writer>(&parameters, 2).unwrap().id(), 2);
        assert_eq!(find::<dyn Writer>(&parameters, 0).unwrap().id(), 1);
        assert!(find::<Console>(&parameters, 0).is_none());
    }

    #[test]
    fn test_named_is_not_matched_by_position() {
        let parameters = vec![Parameter::named("out", Arc::new(7u32))];

        assert!(find::<u32>(&parameters, 0).is_none());
        assert_eq!(parameters[0].name(), Some("out"));
    }

    #[test]
    fn test_later_parameter_wins() {
        let parameters = vec![Parameter::typed(Arc::new(1u32)), Parameter::typed(Arc::new(2u32))];

        assert_eq!(*find::<u32>(&parameters, 0).unwrap(), 2);
    }
}
