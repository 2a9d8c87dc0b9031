//! Types for directing the execution of on-chain programs.
//!
//! Every invocation of a program is described by an [`Instruction`]: the
//! address of the program to run, the accounts it reads or writes, and an
//! opaque byte payload the program interprets. Clients assemble lists of
//! instructions and compile them into a transaction message.
//!
//! The [`AccountMeta`] list of an instruction is significant in both content
//! and order. Programs address their accounts positionally, so compiling a
//! message must preserve that order exactly, and the signer and writable
//! flags on each entry decide where the account lands in the message's
//! account list.
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use txwire_address::Address;

/// A directive for a single invocation of a program.
///
/// An instruction specifies which program it is calling, which accounts it may
/// read or modify, and additional data that serves as input to the program.
/// One or more instructions are included in transactions submitted by
/// clients.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Instruction {
    /// Address of the program that executes this instruction.
    pub program_id: Address,
    /// Metadata describing accounts that should be passed to the program.
    pub accounts: Vec<AccountMeta>,
    /// Opaque data passed to the program for its own interpretation.
    pub data: Vec<u8>,
}

impl Instruction {
    /// Create a new instruction from a byte slice.
    ///
    /// The caller is responsible for encoding `data` the way the program
    /// expects it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use txwire_address::Address;
    /// # use txwire_instruction::{AccountMeta, Instruction};
    /// let program_id = Address::new_unique();
    /// let from = Address::new_unique();
    /// let to = Address::new_unique();
    ///
    /// let instruction = Instruction::new_with_bytes(
    ///     program_id,
    ///     &[2, 0, 1, 0, 0],
    ///     vec![AccountMeta::new(from, true), AccountMeta::new(to, false)],
    /// );
    /// assert_eq!(instruction.accounts.len(), 2);
    /// ```
    pub fn new_with_bytes(program_id: Address, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }

    #[cfg(feature = "bincode")]
    /// Create a new instruction from a value, encoded with [`bincode`].
    ///
    /// [`bincode`]: https://docs.rs/bincode/latest/bincode/
    ///
    /// # Panics
    ///
    /// Panics if `data` can not be serialized by bincode, which only happens
    /// for types whose `Serialize` impl returns an error.
    pub fn new_with_bincode<T: serde::Serialize>(
        program_id: Address,
        data: &T,
        accounts: Vec<AccountMeta>,
    ) -> Self {
        let data = bincode::serialize(data).unwrap();
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// Describes a single account read or written by a program during instruction
/// execution.
///
/// When constructing an [`Instruction`], a list of all accounts that may be
/// read or written during the execution of that instruction must be supplied.
/// Any account that may be mutated by the program during execution, either
/// its data or metadata such as held lamports, must be writable.
///
/// Note that because the message compiler merges accounts by address, an
/// account marked writable in one instruction is writable for every
/// instruction in the same message.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct AccountMeta {
    /// An account's address.
    pub pubkey: Address,
    /// True if an `Instruction` requires a `Transaction` signature matching `pubkey`.
    pub is_signer: bool,
    /// True if the account data or metadata may be mutated during program execution.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Construct metadata for a writable account.
    ///
    /// # Examples
    ///
    /// ```
    /// # use txwire_address::Address;
    /// # use txwire_instruction::AccountMeta;
    /// let payer = Address::new_unique();
    /// let meta = AccountMeta::new(payer, true);
    /// assert!(meta.is_signer && meta.is_writable);
    /// ```
    pub fn new(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// Construct metadata for a read-only account.
    ///
    /// # Examples
    ///
    /// ```
    /// # use txwire_address::Address;
    /// # use txwire_instruction::AccountMeta;
    /// let mint = Address::new_unique();
    /// let meta = AccountMeta::new_readonly(mint, false);
    /// assert!(!meta.is_signer && !meta.is_writable);
    /// ```
    pub fn new_readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}
