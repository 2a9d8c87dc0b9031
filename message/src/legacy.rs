//! The original message format.
//!
//! A legacy message carries every account it references inline, so it can
//! address at most 256 accounts and has no notion of lookup tables.

#[cfg(feature = "bincode")]
use crate::MessageError;
#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use {
    crate::{
        compiled_instruction::CompiledInstruction, compiled_keys::CompiledKeys, AccountKeys,
        CompileError, MessageHeader,
    },
    txwire_address::Address,
    txwire_hash::Hash,
    txwire_instruction::Instruction,
};

/// A legacy transaction message.
///
/// # Serialization
///
/// The header bytes, then the account keys as a short-vec, the 32-byte recent
/// blockhash and the compiled instructions as a short-vec. There is no
/// version prefix: the first byte is `num_required_signatures`, whose high bit
/// is never set in a message that can be signed.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Message {
    /// The message header, identifying signed and read-only `account_keys`.
    pub header: MessageHeader,

    /// All the account keys used by this transaction.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub account_keys: Vec<Address>,

    /// The id of a recent ledger entry.
    pub recent_blockhash: Hash,

    /// Programs that will be executed in sequence and committed in one atomic transaction if all
    /// succeed.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Create a signable legacy message from a `payer` public key,
    /// `recent_blockhash`, and list of instructions.
    ///
    /// The payer always ends up first in the account list. Every other
    /// account is merged by address and placed in the bucket its combined
    /// signer and writable flags select, keeping the order in which the
    /// instructions first reference it.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::AccountIndexOverflow`] if the instructions
    /// reference more accounts than a `u8` index can address.
    ///
    /// # Examples
    ///
    /// ```
    /// # use txwire_message::{legacy, AccountMeta, Address, Hash, Instruction};
    /// let payer = Address::new_unique();
    /// let program_id = Address::new_unique();
    /// let account = Address::new_unique();
    /// let instruction = Instruction::new_with_bytes(
    ///     program_id,
    ///     &[1, 2, 3],
    ///     vec![AccountMeta::new_readonly(account, false)],
    /// );
    ///
    /// let message = legacy::Message::try_compile(&payer, &[instruction], Hash::default()).unwrap();
    /// assert_eq!(message.account_keys, vec![payer, account, program_id]);
    /// assert_eq!(message.header.num_readonly_unsigned_accounts, 2);
    /// ```
    pub fn try_compile(
        payer: &Address,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> Result<Self, CompileError> {
        let compiled_keys = CompiledKeys::compile(instructions, *payer);
        let (header, account_keys) = compiled_keys.try_into_message_components()?;
        let instructions =
            AccountKeys::new(&account_keys, None).try_compile_instructions(instructions)?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    /// Serialize this message to its wire format.
    #[cfg(feature = "bincode")]
    pub fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        crate::serialize_message(self)
    }

    /// Decode a legacy message from its wire format.
    ///
    /// The input must hold exactly one message.
    #[cfg(feature = "bincode")]
    pub fn deserialize(bytes: &[u8]) -> Result<Self, MessageError> {
        crate::deserialize_exact(bytes)
    }

    /// Returns true if the account at the specified index signed this
    /// message.
    pub fn is_signer(&self, i: usize) -> bool {
        i < usize::from(self.header.num_required_signatures)
    }

    /// Returns true if the account at the specified index was requested to be
    /// writable.
    pub fn is_writable_index(&self, i: usize) -> bool {
        crate::is_writable_index(i, self.header, &self.account_keys)
    }

    /// Returns the fee payer, the first account key, if there is one.
    pub fn fee_payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }
}
