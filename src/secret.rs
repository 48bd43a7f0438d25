use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// A wrapper that keeps credential and key material out of logs.
///
/// Passwords, tokens and cipher keys travel through the pipeline inside
/// `Secret<T>`. The wrapped value is reachable only through
/// [`expose_secret`](Self::expose_secret), and it is zeroed when dropped.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - Inner memory is wiped on drop
///
/// # Examples
///
/// ```
/// use authn_metadata::Secret;
///
/// let password = Secret::new("s3cr3t".to_string());
///
/// println!("{:?}", password); // Prints: [REDACTED]
/// assert_eq!(password.expose_secret(), "s3cr3t");
/// ```
// BREAKING CHANGE WARNING: Do NOT add Clone, Copy, or Default derives.
// A cloned credential outlives the request that owns it.
pub struct Secret<T: Zeroize> {
    // BREAKING CHANGE WARNING: This field MUST remain private (CWE-532).
    inner: T,
}

impl<T: Zeroize> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// # Security Warning
    ///
    /// Do not log or format the returned reference.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<String> {
    /// Returns true if the wrapped string is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize + Default> Default for Secret<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<'de, T> Deserialize<'de> for Secret<T>
where
    T: Zeroize + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}
