//! Random tokens for session ids, CSRF values and API keys.
//!
//! Bytes come from the operating system's CSPRNG on every call. There is no
//! seeded generator and no state shared between calls.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::Error;

/// `n` bytes from the OS random source.
///
/// All or nothing: if the source cannot supply every byte the call fails
/// with [`Error::InsufficientEntropy`].
pub fn random_bytes(n: usize) -> Result<Vec<u8>, Error> {
    fill_from(&mut OsRng, n)
}

fn fill_from<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; n];
    rng.try_fill_bytes(&mut buf)
        .map_err(|source| Error::InsufficientEntropy { requested: n, source })?;
    Ok(buf)
}

/// `n` random bytes as URL-safe base64 (`A-Z a-z 0-9 - _`, `=` padded).
///
/// Safe in a path segment or cookie value. `generate(32)` gives 256 bits of
/// entropy in 44 characters.
pub fn generate(n: usize) -> Result<String, Error> {
    Ok(URL_SAFE.encode(random_bytes(n)?))
}
