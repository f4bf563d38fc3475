#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod builder;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod discovery;
pub(crate) mod disposer;
pub(crate) mod errors;
pub(crate) mod hooks;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod lock;
pub(crate) mod metadata;
pub(crate) mod module;
pub(crate) mod parameter;
pub(crate) mod registration;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod service;
pub(crate) mod tag;

pub use any::TypeInfo;
pub use builder::ContainerBuilder;
pub use config::{Config, Ownership, Sharing};
pub use container::Container;
pub use context::ComponentContext;
pub use dependency_resolver::DependencyResolver;
pub use discovery::{LinkedModules, ModuleCatalog, ModuleDescriptor, MODULES};
pub use disposer::{Disposable, Disposer};
pub use errors::{
    BuildErrorKind, DependencyResolutionErrorKind, InstantiateErrorKind, InstantiatorErrorKind, InstantiatorResult,
    ResolveErrorKind, ScopeErrorKind,
};
pub use hooks::{ActivatedEvent, ActivatingEvent, PreparingEvent};
pub use inject::{Inject, InjectAll, InjectOpt, Meta};
pub use instantiator::{Injectable, Instantiator};
pub use key::{AnyKey, Qualifier, ServiceKey};
pub use metadata::Metadata;
pub use module::{module_fn, FnModule, Module};
pub use parameter::Parameter;
pub use registration::{Registration, RegistrationBuilder, RegistrationId};
pub use registry::Registry;
pub use scope::{ChildScopeBuilder, LifetimeScope};
pub use tag::{Tag, ROOT_TAG};

pub use linkme;
