use arbor::{
    linkme::distributed_slice, ContainerBuilder, LinkedModules, Module, ModuleCatalog, ModuleDescriptor, TypeInfo,
    MODULES,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

struct ModuleBase;

struct Greeting(&'static str);

struct Farewell(&'static str);

struct AModule;

impl Module for AModule {
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        builder.register(|| Ok(Greeting("hello")));
        Ok(())
    }
}

struct BModule;

impl Module for BModule {
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        builder.register(|| Ok(Farewell("bye")));
        Ok(())
    }
}

fn a_module() -> Box<dyn Module> {
    Box::new(AModule)
}

fn b_module() -> Box<dyn Module> {
    Box::new(BModule)
}

#[distributed_slice(MODULES)]
static A_MODULE: ModuleDescriptor =
    ModuleDescriptor::new("a", "test-bundle", a_module).with_base(TypeInfo::of::<ModuleBase>);

#[distributed_slice(MODULES)]
static B_MODULE: ModuleDescriptor = ModuleDescriptor::new("b", "test-bundle", b_module);

#[test]
fn test_linked_modules_discovered_by_bundle() {
    let mut names: Vec<_> = LinkedModules
        .discover("test-bundle")
        .into_iter()
        .map(|descriptor| descriptor.name)
        .collect();
    names.sort_unstable();

    assert_eq!(names, ["a", "b"]);
    assert!(LinkedModules.discover("unknown-bundle").is_empty());
}

#[test]
fn test_register_bundle_modules() {
    let mut builder = ContainerBuilder::new();
    builder.register_bundle_modules(&LinkedModules, "test-bundle");
    let container = builder.build().unwrap();

    assert_eq!(container.resolve::<Greeting>().unwrap().0, "hello");
    assert_eq!(container.resolve::<Farewell>().unwrap().0, "bye");
}

#[test]
fn test_register_bundle_modules_of_base() {
    let mut builder = ContainerBuilder::new();
    builder.register_bundle_modules_of::<ModuleBase, _>(&LinkedModules, "test-bundle");
    let container = builder.build().unwrap();

    assert!(container.is_registered::<Greeting>());
    assert!(!container.is_registered::<Farewell>());
}

#[derive(Default)]
struct ObjectModule {
    configure_called: AtomicBool,
}

impl Module for ObjectModule {
    fn load(&self, builder: &mut ContainerBuilder) -> anyhow::Result<()> {
        self.configure_called.store(true, Ordering::SeqCst);
        builder.register_instance(Greeting("from module"));
        Ok(())
    }
}

#[test]
fn test_module_registrations_keep_module_position() {
    let module = Arc::new(ObjectModule::default());

    let mut builder = ContainerBuilder::new();
    builder.register(|| Ok(Greeting("before")));
    builder.register_module(module.clone());
    builder.register(|| Ok(Greeting("after")));

    assert!(!module.configure_called.load(Ordering::SeqCst));

    let container = builder.build().unwrap();

    assert!(module.configure_called.load(Ordering::SeqCst));
    let greetings: Vec<_> = container
        .resolve_all::<Greeting>()
        .unwrap()
        .iter()
        .map(|greeting| greeting.0)
        .collect();
    assert_eq!(greetings, ["before", "from module", "after"]);
    assert_eq!(container.resolve::<Greeting>().unwrap().0, "after");
}

#[test]
fn test_failing_module_aborts_build() {
    struct Broken;

    impl Module for Broken {
        fn load(&self, _builder: &mut ContainerBuilder) -> anyhow::Result<()> {
            anyhow::bail!("connection string is missing")
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    let mut builder = ContainerBuilder::new();
    builder.register_module(Broken);

    let err = builder.build().unwrap_err();
    assert!(err.to_string().contains("broken"));
    assert!(err.to_string().contains("connection string is missing"));
}
