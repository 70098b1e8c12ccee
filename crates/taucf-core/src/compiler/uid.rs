//! Deterministic, order-sensitive content hashing for UIDs.

use sha2::{Digest, Sha256};

/// Incremental UID builder.
///
/// Every field is terminated with a NUL byte so that `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
#[derive(Default)]
pub struct UidHasher {
    inner: Sha256,
}

impl UidHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, value: impl AsRef<[u8]>) -> &mut Self {
        self.inner.update(value.as_ref());
        self.inner.update([0u8]);
        self
    }

    pub fn fields<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        for value in values {
            self.field(value);
        }
        self
    }

    /// A tagged, length-prefixed list, so adjacent lists cannot trade
    /// entries without changing the digest.
    pub fn list<S: AsRef<[u8]>>(&mut self, tag: &str, values: &[S]) -> &mut Self {
        self.field(tag).field(values.len().to_string()).fields(values)
    }

    /// Lowercase hex digest.
    pub fn finish(self) -> String {
        format!("{:x}", self.inner.finalize())
    }
}
