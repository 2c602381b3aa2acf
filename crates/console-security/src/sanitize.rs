//! HTML escaping and frozen configuration values

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Escape HTML-significant characters for markup interpolation
///
/// `&`, `<`, `>`, `"`, `'` and `/` become `&amp;`, `&lt;`, `&gt;`, `&quot;`,
/// `&#x27;` and `&#x2F;`. Everything else passes through unchanged.
///
/// Escaping is not idempotent: call it exactly once per untrusted value.
#[must_use]
pub fn sanitize(input: impl AsRef<str>) -> String {
    let input = input.as_ref();
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// [`sanitize`] for an optional value; absence yields an empty string
#[must_use]
pub fn sanitize_optional(input: Option<&str>) -> String {
    input.map(sanitize).unwrap_or_default()
}

/// Shallowly immutable wrapper around a configuration value
///
/// Only shared access is exposed, so attempts to mutate do not compile:
///
/// ```compile_fail
/// use console_security::freeze;
///
/// struct Limits { a: u32 }
///
/// let frozen = freeze(Limits { a: 1 });
/// frozen.a = 2;
/// ```
pub struct Frozen<T>(Arc<T>);

/// Freeze a value against further mutation
#[inline]
#[must_use]
pub fn freeze<T>(value: T) -> Frozen<T> {
    Frozen(Arc::new(value))
}

impl<T> Frozen<T> {
    /// Borrow the frozen value
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Owned copy that may be edited without touching the frozen value
    #[inline]
    #[must_use]
    pub fn thaw(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.0)
    }
}

impl<T> Deref for Frozen<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Frozen<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for Frozen<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Frozen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frozen").field(&*self.0).finish()
    }
}

impl<T: PartialEq> PartialEq for Frozen<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_script_tag() {
        assert_eq!(
            sanitize("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;&#x2F;script&gt;"
        );
    }

    #[test]
    fn sanitize_empty_and_absent() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize_optional(None), "");
        assert_eq!(sanitize_optional(Some("a&b")), "a&amp;b");
    }

    #[test]
    fn sanitize_leaves_plain_text() {
        assert_eq!(sanitize("node-07 ✓ eu-west"), "node-07 ✓ eu-west");
    }

    #[test]
    fn sanitize_double_escapes() {
        let once = sanitize("\"");
        assert_eq!(once, "&quot;");
        assert_eq!(sanitize(&once), "&amp;quot;");
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Limits {
        a: u32,
    }

    #[test]
    fn frozen_value_survives_thawed_edits() {
        let frozen = freeze(Limits { a: 1 });
        let mut copy = frozen.thaw();
        copy.a = 2;

        assert_eq!(frozen.a, 1);
        assert_eq!(copy.a, 2);
    }

    #[test]
    fn frozen_clones_share_value() {
        let frozen = freeze(Limits { a: 7 });
        let other = frozen.clone();
        assert_eq!(frozen, other);
        assert_eq!(other.get().a, 7);
    }
}
