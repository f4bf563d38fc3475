use alloc::collections::{BTreeMap, VecDeque};

use crate::{
    any::{AnyArc, TypeInfo},
    disposer::BoxedCloneDisposer,
    registration::RegistrationId,
};

/// Instances a lifetime scope holds on to.
#[derive(Default)]
pub(crate) struct Cache {
    shared: BTreeMap<RegistrationId, AnyArc>,
    owned: OwnedSet,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, id: RegistrationId) -> Option<AnyArc> {
        self.shared.get(&id).cloned()
    }

    #[inline]
    pub(crate) fn insert(&mut self, id: RegistrationId, instance: AnyArc) {
        self.shared.insert(id, instance);
    }

    #[inline]
    pub(crate) fn push_owned(&mut self, owned: Owned) {
        self.owned.0.push_back(owned);
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_owned(&mut self) -> OwnedSet {
        core::mem::take(&mut self.owned)
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_shared(&mut self) -> BTreeMap<RegistrationId, AnyArc> {
        core::mem::take(&mut self.shared)
    }

    #[inline]
    #[must_use]
    #[cfg(test)]
    pub(crate) fn owned_len(&self) -> usize {
        self.owned.0.len()
    }

    #[inline]
    #[must_use]
    #[cfg(test)]
    pub(crate) fn shared_len(&self) -> usize {
        self.shared.len()
    }
}

/// Instance the scope must release on disposal.
pub(crate) struct Owned {
    pub(crate) type_info: TypeInfo,
    pub(crate) instance: AnyArc,
    pub(crate) disposer: BoxedCloneDisposer,
}

/// Owned instances in activation order.
#[derive(Default)]
pub(crate) struct OwnedSet(pub(crate) VecDeque<Owned>);
