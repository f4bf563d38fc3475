use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};

use crate::{
    any::TypeInfo,
    key::ServiceKey,
    registration::{LayerId, PendingRegistration, Registration},
    scope::LifetimeScope,
};

/// Immutable index from service keys to registrations.
///
/// The registry of a configured child scope is an overlay whose parent is the registry of the enclosing scope.
/// Lookups check the overlay first.
pub struct Registry {
    layer: LayerId,
    parent: Option<Arc<Registry>>,
    registrations: Vec<Arc<Registration>>,
    // Indexes into `registrations` in registration order, one entry per registration and service type
    services: BTreeMap<TypeInfo, Vec<usize>>,
    exposes_lifetime_scope: bool,
}

impl Registry {
    pub(crate) fn new(pending: Vec<PendingRegistration>, parent: Option<Arc<Registry>>, exposes_lifetime_scope: bool) -> Self {
        let layer = LayerId::next();
        let registrations: Vec<_> = pending
            .into_iter()
            .map(|registration| Arc::new(registration.into_registration(layer)))
            .collect();

        let mut services: BTreeMap<TypeInfo, Vec<usize>> = BTreeMap::new();
        for (index, registration) in registrations.iter().enumerate() {
            for key in registration.services() {
                let indexes = services.entry(key.type_info).or_default();
                if indexes.last() != Some(&index) {
                    indexes.push(index);
                }
            }
        }

        let exposes_lifetime_scope = exposes_lifetime_scope || parent.as_ref().is_some_and(|parent| parent.exposes_lifetime_scope);

        Self {
            layer,
            parent,
            registrations,
            services,
            exposes_lifetime_scope,
        }
    }

    fn local<'a>(&'a self, key: &'a ServiceKey) -> impl DoubleEndedIterator<Item = &'a Arc<Registration>> + 'a {
        self.services
            .get(&key.type_info)
            .into_iter()
            .flatten()
            .map(|index| &self.registrations[*index])
            .filter(|registration| registration.service(key).is_some())
    }

    /// Most recently registered registration exposing `key`, or `None` if there is none.
    #[must_use]
    pub fn try_get_registration(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
        match self.local(key).next_back() {
            Some(registration) => Some(registration.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.try_get_registration(key)),
        }
    }

    /// Every registration exposing `key`: those of parent layers first, each layer in registration order.
    #[must_use]
    pub fn registrations_for(&self, key: &ServiceKey) -> Vec<Arc<Registration>> {
        let mut registrations = match &self.parent {
            Some(parent) => parent.registrations_for(key),
            None => Vec::new(),
        };
        registrations.extend(self.local(key).cloned());
        registrations
    }

    #[must_use]
    pub fn is_registered(&self, key: &ServiceKey) -> bool {
        (self.exposes_lifetime_scope && *key == ServiceKey::of::<LifetimeScope>())
            || self.local(key).next().is_some()
            || self.parent.as_ref().is_some_and(|parent| parent.is_registered(key))
    }

    /// Registrations of this layer, in registration order.
    pub fn registrations(&self) -> impl Iterator<Item = &Arc<Registration>> {
        self.registrations.iter()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Registry>> {
        self.parent.as_ref()
    }

    #[inline]
    #[must_use]
    pub(crate) fn layer(&self) -> LayerId {
        self.layer
    }

    #[inline]
    #[must_use]
    pub(crate) fn exposes_lifetime_scope(&self) -> bool {
        self.exposes_lifetime_scope
    }

    pub(crate) fn contains_layer(&self, layer: LayerId) -> bool {
        self.layer == layer || self.parent.as_ref().is_some_and(|parent| parent.contains_layer(layer))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Registry;
    use crate::{
        instantiator::boxed_instance,
        key::ServiceKey,
        registration::{PendingRegistration, RegistrationBuilder},
    };

    use alloc::{sync::Arc, vec, vec::Vec};

    trait Handler: Send + Sync {}
    struct Ping;
    struct Pong;

    impl Handler for Ping {}
    impl Handler for Pong {}

    fn handler<T: Handler + 'static>(instance: T, name: Option<&'static str>) -> PendingRegistration {
        let mut pending = PendingRegistration::new::<T>(boxed_instance(Arc::new(instance)));
        let builder = RegistrationBuilder::<T>::new(&mut pending).as_service(|handler| handler as Arc<dyn Handler>);
        if let Some(name) = name {
            builder.named_as(name, |handler| handler as Arc<dyn Handler>);
        }
        pending
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = Registry::new(vec![handler(Ping, None), handler(Pong, None)], None, false);

        let registration = registry.try_get_registration(&ServiceKey::of::<dyn Handler>()).unwrap();
        assert_eq!(registration.limit_type().short_name(), "Pong");
        assert_eq!(registry.registrations_for(&ServiceKey::of::<dyn Handler>()).len(), 2);
    }

    #[test]
    fn test_named_is_separate_contract() {
        let registry = Registry::new(vec![handler(Ping, Some("ping"))], None, false);

        assert!(registry.is_registered(&ServiceKey::named::<dyn Handler>("ping")));
        assert!(!registry.is_registered(&ServiceKey::named::<dyn Handler>("pong")));
        // Exposed both named and unnamed, listed once per contract
        assert_eq!(registry.registrations_for(&ServiceKey::of::<dyn Handler>()).len(), 1);
        assert!(!registry.is_registered(&ServiceKey::of::<Ping>()));
    }

    #[test]
    fn test_overlay_order() {
        let parent = Arc::new(Registry::new(vec![handler(Ping, None)], None, false));
        let overlay = Registry::new(vec![handler(Pong, None)], Some(parent.clone()), false);

        let names: Vec<_> = overlay
            .registrations_for(&ServiceKey::of::<dyn Handler>())
            .iter()
            .map(|registration| registration.limit_type().short_name())
            .collect();

        assert_eq!(names, ["Ping", "Pong"]);
        assert_eq!(
            overlay.try_get_registration(&ServiceKey::of::<dyn Handler>()).unwrap().limit_type().short_name(),
            "Pong"
        );
        assert!(overlay.contains_layer(parent.layer()));
        assert!(!parent.contains_layer(overlay.layer()));
        assert_eq!(parent.registrations_for(&ServiceKey::of::<dyn Handler>()).len(), 1);
    }
}
