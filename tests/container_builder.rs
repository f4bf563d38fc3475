use arbor::{ContainerBuilder, Disposable, Module};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

trait Named: Send + Sync {
    fn name(&self) -> &'static str;
}

trait Tracked: Send + Sync {
    fn is_disposed(&self) -> bool;
}

#[derive(Default)]
struct DisposeTracker {
    disposed: AtomicBool,
}

impl Disposable for DisposeTracker {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

impl Named for DisposeTracker {
    fn name(&self) -> &'static str {
        "tracker"
    }
}

impl Tracked for DisposeTracker {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[test]
fn test_register_self() {
    let mut builder = ContainerBuilder::new();
    builder.register_default::<DisposeTracker>();
    let container = builder.build().unwrap();

    let tracker = container.resolve::<DisposeTracker>().unwrap();
    assert!(!tracker.is_disposed());
}

#[test]
fn test_register_as_service_hides_limit_type() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_default::<DisposeTracker>()
        .as_service(|tracker| tracker as Arc<dyn Named>);
    let container = builder.build().unwrap();

    assert_eq!(container.resolve::<dyn Named>().unwrap().name(), "tracker");
    assert!(!container.is_registered::<DisposeTracker>());
    assert!(container.resolve::<DisposeTracker>().err().unwrap().is_not_registered());
}

#[test]
fn test_externally_owned_instances_survive_dispose() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_default::<DisposeTracker>()
        .as_service(|tracker| tracker as Arc<dyn Tracked>)
        .disposable()
        .externally_owned();
    let container = builder.build().unwrap();

    let first = container.resolve::<dyn Tracked>().unwrap();
    let second = container.resolve::<dyn Tracked>().unwrap();

    container.dispose();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.is_disposed());
    assert!(!second.is_disposed());
}

#[test]
fn test_owned_single_instance_disposed_with_container() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_default::<DisposeTracker>()
        .as_service(|tracker| tracker as Arc<dyn Tracked>)
        .disposable()
        .owned_by_lifetime_scope()
        .single_instance();
    let container = builder.build().unwrap();

    let first = container.resolve::<dyn Tracked>().unwrap();
    let second = container.resolve::<dyn Tracked>().unwrap();

    container.dispose();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_disposed());
}

#[test]
fn test_per_dependency_disposed_with_scope() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_default::<DisposeTracker>()
        .as_service(|tracker| tracker as Arc<dyn Tracked>)
        .disposable();
    let container = builder.build().unwrap();

    let scope = container.begin_lifetime_scope().unwrap();
    let first = scope.resolve::<dyn Tracked>().unwrap();
    let second = scope.resolve::<dyn Tracked>().unwrap();

    scope.dispose();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.is_disposed());
    assert!(second.is_disposed());
    assert!(!container.is_disposed());
}

#[test]
fn test_last_registered_instance_wins() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(String::from("first"));
    builder.register_instance(String::from("second"));
    let container = builder.build().unwrap();

    assert_eq!(*container.resolve::<String>().unwrap(), "second");

    let all: Vec<_> = container.resolve_all::<String>().unwrap().iter().map(|value| value.to_string()).collect();
    assert_eq!(all, ["first", "second"]);
}

#[derive(Default)]
struct ObjectModule {
    configure_called: AtomicBool,
}

impl Module for ObjectModule {
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        self.configure_called.store(true, Ordering::SeqCst);
        builder.register(|| Ok(())).single_instance();
        Ok(())
    }
}

#[test]
fn test_module_loaded_on_build() {
    let module = Arc::new(ObjectModule::default());

    let mut builder = ContainerBuilder::new();
    builder.register_module(module.clone());

    assert!(!module.configure_called.load(Ordering::SeqCst));

    let container = builder.build().unwrap();

    assert!(module.configure_called.load(Ordering::SeqCst));
    assert!(container.is_registered::<()>());
}

#[test]
fn test_builder_is_single_use() {
    let mut builder = ContainerBuilder::new();
    builder.register_default::<DisposeTracker>();

    let _container = builder.build().unwrap();

    assert!(matches!(builder.build(), Err(arbor::BuildErrorKind::AlreadyBuilt)));
}
