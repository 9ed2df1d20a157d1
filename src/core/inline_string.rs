/*!
 * Inline String
 * Zero-allocation strings for error payloads
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;

/// String that stores short values (≤23 bytes) without heap allocation
///
/// Most error details ("pid 17 is not a child", "process table full")
/// fit inline, so building an error never allocates on the reap path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct InlineString {
    inner: SmartString,
}

impl InlineString {
    /// Get string slice
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Check if string is stored inline
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.inner.is_inline()
    }
}

impl From<&str> for InlineString {
    #[inline]
    fn from(s: &str) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<String> for InlineString {
    #[inline]
    fn from(s: String) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<InlineString> for String {
    #[inline]
    fn from(s: InlineString) -> Self {
        s.inner.into()
    }
}

impl AsRef<str> for InlineString {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for InlineString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
