//! The versioned message format that can reference accounts stored in on-chain
//! address lookup tables.
//!
//! Lookups let a message refer to many more accounts than fit inline: each
//! referenced table contributes one 32-byte key plus a one-byte index per
//! account, instead of a 32-byte address per account. Accounts loaded through
//! a lookup can never sign the message.

#[cfg(feature = "bincode")]
use crate::{MessageError, MESSAGE_VERSION_PREFIX};
#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use {
    crate::{
        compiled_instruction::CompiledInstruction, compiled_keys::CompiledKeys, AccountKeys,
        AddressLoader, AddressLoaderError, AddressLookupTableAccount, CompileError, MessageHeader,
    },
    txwire_address::Address,
    txwire_hash::Hash,
    txwire_instruction::Instruction,
};

mod loaded;

pub use loaded::*;

/// Address table lookups describe an on-chain address lookup table to use
/// for loading more readonly and writable accounts in a single tx.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct MessageAddressTableLookup {
    /// Address lookup table account key
    pub account_key: Address,
    /// List of indexes used to load writable account addresses
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub writable_indexes: Vec<u8>,
    /// List of indexes used to load readonly account addresses
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub readonly_indexes: Vec<u8>,
}

/// A transaction message that supports address lookup tables.
///
/// # Serialization
///
/// Encoded as the legacy layout followed by a short-vec of table lookups,
/// with the whole thing preceded by the version prefix byte `0x80` when
/// wrapped in a [`VersionedMessage`].
///
/// [`VersionedMessage`]: crate::VersionedMessage
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Message {
    /// The message header, identifying signed and read-only `account_keys`.
    /// Header values only describe static `account_keys`, they do not describe
    /// any additional account keys loaded via address table lookups.
    pub header: MessageHeader,

    /// List of accounts loaded by this transaction.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub account_keys: Vec<Address>,

    /// The blockhash of a recent block.
    pub recent_blockhash: Hash,

    /// Instructions that invoke a designated program, are executed in sequence,
    /// and committed in one atomic transaction if all succeed.
    ///
    /// # Notes
    ///
    /// Program indexes must index into the list of message `account_keys` because
    /// program id's cannot be dynamically loaded from a lookup table.
    ///
    /// Account indexes must index into the list of addresses
    /// constructed from the concatenation of three key lists:
    ///   1) message `account_keys`
    ///   2) ordered list of keys loaded from `writable` lookup table indexes
    ///   3) ordered list of keys loaded from `readable` lookup table indexes
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub instructions: Vec<CompiledInstruction>,

    /// List of address table lookups used to load additional accounts
    /// for this transaction.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

impl Message {
    /// Create a signable transaction message from a `payer` public key,
    /// `recent_blockhash`, list of `instructions`, and a list of
    /// `address_lookup_table_accounts`.
    ///
    /// Non-signer accounts found in a lookup table are loaded through it
    /// instead of being listed statically. Tables are consulted in the order
    /// given and the first table holding an account wins. Accounts invoked as
    /// programs always stay static, as do signers. A table that supplies no
    /// account produces no lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// # use txwire_message::{v0, AccountMeta, Address, AddressLookupTableAccount, Hash, Instruction};
    /// let payer = Address::new_unique();
    /// let program_id = Address::new_unique();
    /// let account = Address::new_unique();
    /// let table = AddressLookupTableAccount {
    ///     key: Address::new_unique(),
    ///     addresses: vec![Address::new_unique(), account],
    /// };
    /// let instruction = Instruction::new_with_bytes(
    ///     program_id,
    ///     &[],
    ///     vec![AccountMeta::new(account, false)],
    /// );
    ///
    /// let message =
    ///     v0::Message::try_compile(&payer, &[instruction], &[table], Hash::default()).unwrap();
    /// assert_eq!(message.account_keys, vec![payer, program_id]);
    /// assert_eq!(message.address_table_lookups[0].writable_indexes, vec![1]);
    /// // the looked-up account comes right after the static keys
    /// assert_eq!(message.instructions[0].accounts, vec![2]);
    /// ```
    pub fn try_compile(
        payer: &Address,
        instructions: &[Instruction],
        address_lookup_table_accounts: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<Self, CompileError> {
        let mut compiled_keys = CompiledKeys::compile(instructions, *payer);

        let mut address_table_lookups = Vec::with_capacity(address_lookup_table_accounts.len());
        let mut loaded_addresses_list = Vec::with_capacity(address_lookup_table_accounts.len());
        for lookup_table_account in address_lookup_table_accounts {
            if let Some((lookup, loaded_addresses)) =
                compiled_keys.try_extract_table_lookup(lookup_table_account)?
            {
                address_table_lookups.push(lookup);
                loaded_addresses_list.push(loaded_addresses);
            }
        }

        let (header, static_keys) = compiled_keys.try_into_message_components()?;
        let dynamic_keys = loaded_addresses_list.into_iter().collect();
        let account_keys = AccountKeys::new(&static_keys, Some(&dynamic_keys));
        let instructions = account_keys.try_compile_instructions(instructions)?;

        Ok(Self {
            header,
            account_keys: static_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        })
    }

    /// Serialize this message with a version #0 prefix.
    #[cfg(feature = "bincode")]
    pub fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        crate::serialize_message(&(MESSAGE_VERSION_PREFIX, self))
    }

    /// Decode a v0 message, version prefix included, from its wire format.
    #[cfg(feature = "bincode")]
    pub fn deserialize(bytes: &[u8]) -> Result<Self, MessageError> {
        match crate::VersionedMessage::deserialize(bytes)? {
            crate::VersionedMessage::V0(message) => Ok(message),
            crate::VersionedMessage::Legacy(_) => Err(MessageError::InvalidEncoding(
                "expected a v0 message, found a legacy message".to_string(),
            )),
        }
    }

    /// Resolve the address table lookups of this message.
    pub fn load_addresses(
        &self,
        loader: impl AddressLoader,
    ) -> Result<LoadedAddresses, AddressLoaderError> {
        loader.load_addresses(&self.address_table_lookups)
    }

    /// Returns true if the account at the specified index signed this
    /// message. Loaded accounts never sign.
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
    }

    /// Returns true if the account at the specified index of the combined
    /// static and loaded key list was requested to be writable.
    pub fn is_writable_index(&self, key_index: usize, loaded_addresses: &LoadedAddresses) -> bool {
        match key_index.checked_sub(self.account_keys.len()) {
            None => crate::is_writable_index(key_index, self.header, &self.account_keys),
            Some(loaded_index) => loaded_index < loaded_addresses.writable.len(),
        }
    }
}
