//! Identity and naming convention of the resource that owns a custom data bag.

use crate::tools::strings::Case;
use crate::tools::url::child;

/// Path segment of the custom data sub-resource under its owner.
pub const CUSTOM_DATA_SEGMENT: &str = "customData";

/// What the custom data proxy needs to know about the resource it belongs to.
pub trait Resource: Send + Sync {
    /// stable reference, present once the resource is persisted
    fn href(&self) -> Option<&str>;

    fn is_new(&self) -> bool {
        self.href().is_none()
    }

    /// external (camelCase) key to its internal (snake_case) form
    fn canonicalize(&self, key: &str) -> String {
        Case::snake(key)
    }
}

/// Plain href-only identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    href: Option<String>,
}

impl Identity {
    pub fn persisted(href: &str) -> Self {
        Identity { href: Some(href.to_string()) }
    }

    /// not created remotely yet
    pub fn unsaved() -> Self {
        Identity { href: None }
    }

    /// identity of the custom data sub-resource of a persisted owner
    pub fn custom_data_of(owner_href: &str) -> Self {
        Identity::persisted(&child(owner_href, CUSTOM_DATA_SEGMENT))
    }
}

impl Resource for Identity {
    fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }
}
