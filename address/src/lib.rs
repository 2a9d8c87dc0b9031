//! Account addresses.
//!
//! An [`Address`] is the 32-byte identifier of an on-chain account. Beyond its
//! length it carries no structure that this crate checks: whether the bytes
//! are a valid curve point or a program-derived address is outside its scope.
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use {
    core::{fmt, str::FromStr},
    std::sync::atomic::{AtomicU64, Ordering},
    thiserror::Error,
};

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 32;
/// Maximum string length of a base58 encoded address.
const MAX_BASE58_LEN: usize = 44;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("String is the wrong size")]
    WrongSize,
    #[error("Invalid Base58 string")]
    Invalid,
}

/// The address of an account.
///
/// Serializes as its 32 raw bytes, which is exactly how it appears inside a
/// wire-format message.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address(pub(crate) [u8; ADDRESS_BYTES]);

impl Address {
    pub const fn new_from_array(address_array: [u8; ADDRESS_BYTES]) -> Self {
        Self(address_array)
    }

    /// Unique address for tests and benchmarks.
    ///
    /// The leading eight bytes hold a process-wide counter, so two calls never
    /// return the same value within one process.
    pub fn new_unique() -> Self {
        static I: AtomicU64 = AtomicU64::new(1);

        let mut b = [0u8; ADDRESS_BYTES];
        let i = I.fetch_add(1, Ordering::Relaxed);
        b[0..8].copy_from_slice(&i.to_be_bytes());
        Self::from(b)
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    #[inline]
    fn from(from: [u8; ADDRESS_BYTES]) -> Self {
        Self(from)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = core::array::TryFromSliceError;

    #[inline]
    fn try_from(address: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_BYTES]>::try_from(address).map(Self::from)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseAddressError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError::Invalid)?;
        Address::try_from(bytes.as_slice()).map_err(|_| ParseAddressError::WrongSize)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
