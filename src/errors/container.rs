#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    #[error("Container builder was already built. A builder can be built only once")]
    AlreadyBuilt,
    #[error("Module `{name}` failed to load: {source}")]
    Module {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ScopeErrorKind {
    #[error("Can't begin a child of a disposed lifetime scope")]
    Disposed,
    #[error(transparent)]
    Build(#[from] BuildErrorKind),
}
