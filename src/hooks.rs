use alloc::{sync::Arc, vec::Vec};
use tracing::error;

use crate::{
    any::{AnyArc, TypeInfo},
    context::ComponentContext,
    parameter::Parameter,
    registration::Registration,
};

/// Raised before a component is activated. Handlers may edit the parameters of the activation.
pub struct PreparingEvent<'a> {
    registration: &'a Registration,
    parameters: &'a mut Vec<Parameter>,
}

impl PreparingEvent<'_> {
    #[inline]
    #[must_use]
    pub fn registration(&self) -> &Registration {
        self.registration
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.as_slice()
    }

    #[inline]
    pub fn parameters_mut(&mut self) -> &mut Vec<Parameter> {
        &mut *self.parameters
    }

    #[inline]
    pub fn push_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }
}

/// Raised after the activator produced an instance, before it is cached or tracked.
pub struct ActivatingEvent<'a, T> {
    context: &'a ComponentContext,
    instance: Arc<T>,
}

impl<T> ActivatingEvent<'_, T> {
    #[inline]
    #[must_use]
    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    /// Substitutes the instance returned to the requester.
    #[inline]
    pub fn replace_instance(&mut self, instance: Arc<T>) {
        self.instance = instance;
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &ComponentContext {
        self.context
    }
}

/// Raised once activation is complete.
pub struct ActivatedEvent<'a, T> {
    context: &'a ComponentContext,
    instance: &'a Arc<T>,
}

impl<T> ActivatedEvent<'_, T> {
    #[inline]
    #[must_use]
    pub fn instance(&self) -> &Arc<T> {
        self.instance
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &ComponentContext {
        self.context
    }
}

type PreparingHook = Arc<dyn Fn(&mut PreparingEvent<'_>) + Send + Sync>;
type ActivatingHook = Arc<dyn Fn(AnyArc, &ComponentContext) -> AnyArc + Send + Sync>;
type ActivatedHook = Arc<dyn Fn(&AnyArc, &ComponentContext) + Send + Sync>;

/// Handlers of a registration, run in the order they were added.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    preparing: Vec<PreparingHook>,
    activating: Vec<ActivatingHook>,
    activated: Vec<ActivatedHook>,
}

impl Hooks {
    pub(crate) fn push_preparing<F>(&mut self, hook: F)
    where
        F: Fn(&mut PreparingEvent<'_>) + Send + Sync + 'static,
    {
        self.preparing.push(Arc::new(hook));
    }

    pub(crate) fn push_activating<T, F>(&mut self, hook: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&mut ActivatingEvent<'_, T>) + Send + Sync + 'static,
    {
        self.activating.push(Arc::new(move |instance: AnyArc, context: &ComponentContext| {
            match instance.clone().downcast::<T>() {
                Ok(instance) => {
                    let mut event = ActivatingEvent { context, instance };
                    hook(&mut event);
                    event.instance as AnyArc
                }
                Err(_) => {
                    error!(expected = %TypeInfo::of::<T>(), "Activating instance has an unexpected type");
                    instance
                }
            }
        }));
    }

    pub(crate) fn push_activated<T, F>(&mut self, hook: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&ActivatedEvent<'_, T>) + Send + Sync + 'static,
    {
        self.activated.push(Arc::new(move |instance: &AnyArc, context: &ComponentContext| {
            match instance.clone().downcast::<T>() {
                Ok(instance) => hook(&ActivatedEvent {
                    context,
                    instance: &instance,
                }),
                Err(_) => error!(expected = %TypeInfo::of::<T>(), "Activated instance has an unexpected type"),
            }
        }));
    }

    #[inline]
    #[must_use]
    pub(crate) fn has_preparing(&self) -> bool {
        !self.preparing.is_empty()
    }

    pub(crate) fn run_preparing(&self, registration: &Registration, parameters: &mut Vec<Parameter>) {
        let mut event = PreparingEvent { registration, parameters };
        for hook in &self.preparing {
            hook(&mut event);
        }
    }

    pub(crate) fn run_activating(&self, mut instance: AnyArc, context: &ComponentContext) -> AnyArc {
        for hook in &self.activating {
            instance = hook(instance, context);
        }
        instance
    }

    pub(crate) fn run_activated(&self, instance: &AnyArc, context: &ComponentContext) {
        for hook in &self.activated {
            hook(instance, context);
        }
    }
}
