#![cfg_attr(docsrs, feature(doc_cfg))]
//! Sequences of [`Instruction`]s compiled into a single transaction message.
//!
//! A message is the compact wire encoding of a transaction's instructions. It
//! contains a flat array of all accounts accessed by all instructions in the
//! message, a [`MessageHeader`] that describes the layout of that account
//! array, a recent blockhash, and a compact encoding of the message's
//! instructions in which every account is replaced by its index into the
//! flat array.
//!
//! Two wire formats are supported, each in its own module: [`legacy`] and
//! [`v0`]. `v0` messages may reference additional accounts stored in on-chain
//! address lookup tables instead of carrying them inline. The
//! [`VersionedMessage`] type is a thin wrapper around either message version
//! and owns the prefix byte that tells them apart on the wire.
//!
//! [`TransactionMessage`] is the human-facing side of the codec: an ordered
//! list of [`Instruction`]s with a fee payer and blockhash, which compiles into
//! either wire format and can be recovered from a decoded message.

pub mod compiled_instruction;
mod compiled_keys;
pub mod legacy;

mod account_keys;
mod address_loader;
mod transaction_message;
mod versions;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
pub use {
    account_keys::AccountKeys,
    address_loader::{AddressLoader, AddressLoaderError, SimpleAddressLoader},
    compiled_keys::CompileError,
    legacy::Message,
    transaction_message::{DecompileError, TransactionMessage},
    txwire_address::Address,
    txwire_hash::Hash,
    txwire_instruction::{AccountMeta, Instruction},
    versions::*,
};

/// The length of a message header in bytes.
pub const MESSAGE_HEADER_LENGTH: usize = 3;

/// Three counts that partition a message's static account keys by the
/// permissions the message requests for them.
///
/// A message lists every account its instructions touch exactly once, and
/// [`CompiledInstruction`]s refer to accounts by position in that list.
/// The list is sorted into four consecutive runs:
///
/// - writable signers, the fee payer first
/// - read-only signers
/// - writable non-signers
/// - read-only non-signers
///
/// so the header only needs the length of the signer prefix and the number
/// of read-only keys at the end of each half. In a `v0` message the header
/// covers the static keys alone; accounts loaded from lookup tables are never
/// signers and take their writability from the lookup.
///
/// [`CompiledInstruction`]: crate::compiled_instruction::CompiledInstruction
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub struct MessageHeader {
    /// Number of leading static keys that must sign the transaction.
    pub num_required_signatures: u8,

    /// How many of the signer keys, counted from the end of the signer run,
    /// are read-only.
    pub num_readonly_signed_accounts: u8,

    /// How many of the non-signer static keys, counted from the end of the
    /// list, are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    /// Number of leading keys that are both signers and writable.
    ///
    /// Returns `None` unless at least one such key exists. A well-formed
    /// message always has one, the fee payer.
    pub fn num_writable_signed_accounts(&self) -> Option<u8> {
        self.num_required_signatures
            .checked_sub(self.num_readonly_signed_accounts)
            .filter(|num| *num > 0)
    }

    /// Number of static keys that are writable but not signers, given the
    /// total number of static keys in the message.
    ///
    /// Returns `None` if the header claims more signer and read-only keys
    /// than the message holds.
    pub fn num_writable_unsigned_accounts(&self, num_static_account_keys: usize) -> Option<usize> {
        num_static_account_keys
            .checked_sub(usize::from(self.num_required_signatures))?
            .checked_sub(usize::from(self.num_readonly_unsigned_accounts))
    }
}

/// The definition of address lookup table accounts.
///
/// As used by the `crate::v0` message format.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AddressLookupTableAccount {
    pub key: Address,
    pub addresses: Vec<Address>,
}

/// Returns true if the static account at the specified index was requested to
/// be writable.
///
/// Used by the legacy and v0 message types.
#[inline(always)]
fn is_writable_index(i: usize, header: MessageHeader, account_keys: &[Address]) -> bool {
    i < usize::from(header.num_required_signatures)
        .saturating_sub(usize::from(header.num_readonly_signed_accounts))
        || (i >= usize::from(header.num_required_signatures)
            && i < account_keys
                .len()
                .saturating_sub(usize::from(header.num_readonly_unsigned_accounts)))
}

/// Decodes exactly one value from `bytes`, rejecting anything left over.
#[cfg(feature = "bincode")]
fn deserialize_exact<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, MessageError> {
    let mut cursor = std::io::Cursor::new(bytes);
    let value = bincode::deserialize_from(&mut cursor)
        .map_err(|err| MessageError::InvalidEncoding(err.to_string()))?;
    let consumed = cursor.position();
    if usize::try_from(consumed).ok() != Some(bytes.len()) {
        log::debug!(
            "rejecting message with {} trailing bytes",
            (bytes.len() as u64).saturating_sub(consumed)
        );
        return Err(MessageError::TrailingData);
    }
    Ok(value)
}

#[cfg(feature = "bincode")]
fn serialize_message<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, MessageError> {
    bincode::serialize(value).map_err(|err| MessageError::Encoding(err.to_string()))
}
