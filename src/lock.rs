use alloc::{collections::BTreeMap, sync::Arc};
use parking_lot::Mutex;

use crate::registration::RegistrationId;

/// One lock per shared registration of a scope, held while its instance is activated.
#[derive(Default)]
pub(crate) struct SlotLocks {
    slots: Mutex<BTreeMap<RegistrationId, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, id: RegistrationId) -> Arc<Mutex<()>> {
        self.slots.lock().entry(id).or_default().clone()
    }
}
