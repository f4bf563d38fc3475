use alloc::sync::Arc;
use core::convert::Infallible;
use tracing::error;

use crate::{
    any::{AnyArc, TypeInfo},
    service::{service_fn, BoxCloneService},
};

/// Release operation of a component, called once when the owning scope is disposed.
pub trait Disposer<T: ?Sized>: Clone + 'static {
    fn release(&mut self, instance: Arc<T>);
}

impl<F, T> Disposer<T> for F
where
    F: FnMut(Arc<T>) + Clone + 'static,
    T: ?Sized,
{
    #[inline]
    fn release(&mut self, instance: Arc<T>) {
        self(instance);
    }
}

/// Component with its own release operation, enabled per registration with
/// [`crate::RegistrationBuilder::disposable`].
pub trait Disposable {
    fn dispose(&self);
}

pub(crate) type BoxedCloneDisposer = BoxCloneService<AnyArc, (), Infallible>;

#[must_use]
pub(crate) fn boxed_disposer<T, D>(mut disposer: D) -> BoxedCloneDisposer
where
    T: Send + Sync + 'static,
    D: Disposer<T> + Send + Sync,
{
    BoxCloneService::new(service_fn(move |instance: AnyArc| {
        match instance.downcast::<T>() {
            Ok(instance) => disposer.release(instance),
            Err(_) => error!(expected = %TypeInfo::of::<T>(), "Released instance has an unexpected type"),
        }
        Ok::<_, Infallible>(())
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_disposer, Disposable};

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};
    #[allow(unused_imports)]
    use alloc::{
        format,
        string::{String, ToString as _},
    };
    use tracing_test::traced_test;

    struct Connection(AtomicU8);

    impl Disposable for Connection {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    #[traced_test]
    fn test_boxed_disposer() {
        let disposer = boxed_disposer(|connection: Arc<Connection>| connection.dispose());
        let connection = Arc::new(Connection(AtomicU8::new(0)));

        disposer.call_cloned(connection.clone()).unwrap();

        assert_eq!(connection.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_boxed_disposer_wrong_type() {
        let disposer = boxed_disposer(|connection: Arc<Connection>| connection.dispose());

        disposer.call_cloned(Arc::new(1u8)).unwrap();

        assert!(logs_contain("Released instance has an unexpected type"));
    }
}
