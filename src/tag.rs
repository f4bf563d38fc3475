use alloc::{borrow::Cow, string::String};
use core::fmt::{self, Display, Formatter};

/// Tag carried by the root scope of every container.
pub const ROOT_TAG: &str = "root";

/// Label of a lifetime scope, matched by [`crate::Sharing::PerMatchingLifetimeScope`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    #[inline]
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    #[inline]
    #[must_use]
    pub const fn root() -> Self {
        Self::new(ROOT_TAG)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Tag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
