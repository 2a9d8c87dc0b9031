use {
    crate::{
        legacy::Message as LegacyMessage, v0, AccountKeys, AddressLoader, AddressLoaderError,
        AddressLookupTableAccount, CompileError, MessageHeader, VersionedMessage,
    },
    thiserror::Error,
    txwire_address::Address,
    txwire_hash::Hash,
    txwire_instruction::{AccountMeta, Instruction},
};

/// Errors raised while recovering instructions from a compiled message.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecompileError {
    #[error("message header does not describe a valid account layout")]
    InvalidHeader,
    #[error("failed to resolve message account keys: {0}")]
    NoAccountKeys(#[source] AddressLoaderError),
    #[error("message has no fee payer")]
    NoPayerKey,
    #[error("instruction references unknown account index {0}")]
    KeyNotFound(u8),
    #[error("instruction references unknown program index {0}")]
    ProgramIdNotFound(u8),
}

/// An ordered list of instructions together with the fee payer and blockhash
/// they are to be submitted under.
///
/// This is the form clients build transactions in. It compiles into either
/// wire format, and [`TransactionMessage::decompile`] recovers it from a
/// decoded message. Accounts that appear in several instructions come back
/// with the union of the signer and writable flags they were compiled with,
/// and the payer always comes back as a writable signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMessage {
    pub payer_key: Address,
    pub instructions: Vec<Instruction>,
    pub recent_blockhash: Hash,
}

impl TransactionMessage {
    pub fn new(payer_key: Address, instructions: Vec<Instruction>, recent_blockhash: Hash) -> Self {
        Self {
            payer_key,
            instructions,
            recent_blockhash,
        }
    }

    pub fn compile_to_legacy_message(&self) -> Result<LegacyMessage, CompileError> {
        let message =
            LegacyMessage::try_compile(&self.payer_key, &self.instructions, self.recent_blockhash)?;
        log::debug!(
            "compiled {} instructions into legacy message with {} accounts",
            message.instructions.len(),
            message.account_keys.len()
        );
        Ok(message)
    }

    pub fn compile_to_v0_message(
        &self,
        address_lookup_table_accounts: &[AddressLookupTableAccount],
    ) -> Result<v0::Message, CompileError> {
        let message = v0::Message::try_compile(
            &self.payer_key,
            &self.instructions,
            address_lookup_table_accounts,
            self.recent_blockhash,
        )?;
        log::debug!(
            "compiled {} instructions into v0 message with {} static accounts and {} lookups",
            message.instructions.len(),
            message.account_keys.len(),
            message.address_table_lookups.len()
        );
        Ok(message)
    }

    /// Recover the instructions of `message`, resolving any table lookups
    /// against `address_lookup_table_accounts`.
    ///
    /// Tables are ignored for a legacy message.
    ///
    /// # Errors
    ///
    /// The header is checked before anything else is resolved. A header
    /// without a writable signer, or one that claims more signer and
    /// read-only keys than the message holds, fails with
    /// [`DecompileError::InvalidHeader`]. A lookup that cannot be resolved
    /// fails with [`DecompileError::NoAccountKeys`]. Instruction indexes past
    /// the end of the resolved key list fail with
    /// [`DecompileError::KeyNotFound`] or
    /// [`DecompileError::ProgramIdNotFound`].
    pub fn decompile(
        message: &VersionedMessage,
        address_lookup_table_accounts: &[AddressLookupTableAccount],
    ) -> Result<Self, DecompileError> {
        Self::decompile_with_loader(message, address_lookup_table_accounts)
    }

    /// Like [`TransactionMessage::decompile`], with table lookups resolved by
    /// an arbitrary [`AddressLoader`].
    pub fn decompile_with_loader(
        message: &VersionedMessage,
        loader: impl AddressLoader,
    ) -> Result<Self, DecompileError> {
        let static_account_keys = message.static_account_keys();
        let permissions = AccountPermissions::try_new(message.header(), static_account_keys.len())
            .ok_or_else(|| {
                log::debug!("rejecting message header {:?}", message.header());
                DecompileError::InvalidHeader
            })?;

        let loaded_addresses = message.load_addresses(loader).map_err(|err| {
            log::debug!("failed to load message account keys: {err}");
            DecompileError::NoAccountKeys(err)
        })?;
        let account_keys = AccountKeys::new(static_account_keys, loaded_addresses.as_ref());

        let payer_key = *account_keys.get(0).ok_or(DecompileError::NoPayerKey)?;

        let instructions = message
            .instructions()
            .iter()
            .map(|compiled_ix| -> Result<Instruction, DecompileError> {
                let accounts = compiled_ix
                    .accounts
                    .iter()
                    .map(|key_index| -> Result<AccountMeta, DecompileError> {
                        let index = usize::from(*key_index);
                        let pubkey = *account_keys
                            .get(index)
                            .ok_or(DecompileError::KeyNotFound(*key_index))?;
                        Ok(AccountMeta {
                            pubkey,
                            is_signer: permissions.is_signer(index),
                            is_writable: permissions.is_writable(index, &account_keys),
                        })
                    })
                    .collect::<Result<Vec<_>, DecompileError>>()?;

                let program_id = *account_keys
                    .get(usize::from(compiled_ix.program_id_index))
                    .ok_or(DecompileError::ProgramIdNotFound(
                        compiled_ix.program_id_index,
                    ))?;

                Ok(Instruction {
                    program_id,
                    accounts,
                    data: compiled_ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, DecompileError>>()?;

        log::trace!(
            "decompiled {} instructions over {} accounts",
            instructions.len(),
            account_keys.len()
        );

        Ok(Self {
            payer_key,
            instructions,
            recent_blockhash: *message.recent_blockhash(),
        })
    }
}

/// Signer and writable layout of a message's accounts, derived from its
/// header.
struct AccountPermissions {
    num_required_signatures: usize,
    num_writable_signed_accounts: usize,
    num_writable_unsigned_accounts: usize,
    num_static_account_keys: usize,
}

impl AccountPermissions {
    fn try_new(header: &MessageHeader, num_static_account_keys: usize) -> Option<Self> {
        Some(Self {
            num_required_signatures: usize::from(header.num_required_signatures),
            num_writable_signed_accounts: usize::from(header.num_writable_signed_accounts()?),
            num_writable_unsigned_accounts: header
                .num_writable_unsigned_accounts(num_static_account_keys)?,
            num_static_account_keys,
        })
    }

    fn is_signer(&self, index: usize) -> bool {
        index < self.num_required_signatures
    }

    fn is_writable(&self, index: usize, account_keys: &AccountKeys) -> bool {
        if self.is_signer(index) {
            index < self.num_writable_signed_accounts
        } else if index < self.num_static_account_keys {
            index.saturating_sub(self.num_required_signatures) < self.num_writable_unsigned_accounts
        } else {
            index.saturating_sub(self.num_static_account_keys) < account_keys.num_lookup_writable()
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{compiled_instruction::CompiledInstruction, v0::MessageAddressTableLookup},
        assert_matches::assert_matches,
        proptest::prelude::*,
        std::collections::HashMap,
        test_case::test_case,
        txwire_compute_budget_interface::ComputeBudgetInstruction,
    };

    fn scenario_a() -> (Address, Address, Address, TransactionMessage) {
        let payer = Address::new_unique();
        let account = Address::new_unique();
        let program_id = Address::new_unique();
        let message = TransactionMessage::new(
            payer,
            vec![Instruction::new_with_bytes(
                program_id,
                &[1, 2, 3],
                vec![
                    AccountMeta::new(payer, true),
                    AccountMeta::new_readonly(account, false),
                ],
            )],
            "11111111111111111111111111111111".parse().unwrap(),
        );
        (payer, account, program_id, message)
    }

    #[test]
    fn test_compile_single_instruction() {
        let (payer, account, program_id, message) = scenario_a();
        let legacy = message.compile_to_legacy_message().unwrap();

        // both the account and the program are read-only and unsigned
        assert_eq!(
            legacy.header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 2,
            }
        );
        assert_eq!(legacy.account_keys, vec![payer, account, program_id]);
        assert_eq!(
            legacy.instructions,
            vec![CompiledInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data: vec![1, 2, 3],
            }]
        );
        assert_eq!(legacy.recent_blockhash, Hash::default());

        let versioned = VersionedMessage::Legacy(legacy);
        assert_eq!(TransactionMessage::decompile(&versioned, &[]), Ok(message));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let (_, _, _, message) = scenario_a();
        assert_eq!(
            message.compile_to_legacy_message().unwrap().serialize(),
            message.compile_to_legacy_message().unwrap().serialize()
        );
        assert_eq!(
            message.compile_to_v0_message(&[]),
            message.compile_to_v0_message(&[])
        );
    }

    #[test]
    fn test_compile_v0_without_tables_matches_legacy_layout() {
        let (_, _, _, message) = scenario_a();
        let legacy = message.compile_to_legacy_message().unwrap();
        let v0 = message.compile_to_v0_message(&[]).unwrap();
        assert_eq!(v0.header, legacy.header);
        assert_eq!(v0.account_keys, legacy.account_keys);
        assert_eq!(v0.instructions, legacy.instructions);
        assert!(v0.address_table_lookups.is_empty());
    }

    #[test]
    fn test_payer_is_always_first_writable_signer() {
        let payer = Address::new_unique();
        let other_signer = Address::new_unique();
        let program_id = Address::new_unique();
        let message = TransactionMessage::new(
            payer,
            vec![Instruction::new_with_bytes(
                program_id,
                &[],
                vec![
                    AccountMeta::new(other_signer, true),
                    AccountMeta::new_readonly(payer, false),
                ],
            )],
            Hash::new_unique(),
        );
        let legacy = message.compile_to_legacy_message().unwrap();
        assert_eq!(legacy.account_keys[0], payer);
        assert!(legacy.is_signer(0));
        assert!(legacy.is_writable_index(0));

        let decompiled =
            TransactionMessage::decompile(&VersionedMessage::Legacy(legacy), &[]).unwrap();
        assert_eq!(decompiled.payer_key, payer);
        assert_eq!(
            decompiled.instructions[0].accounts[1],
            AccountMeta::new(payer, true)
        );
    }

    #[test]
    fn test_duplicate_accounts_share_one_key() {
        let payer = Address::new_unique();
        let shared = Address::new_unique();
        let program_id = Address::new_unique();
        let message = TransactionMessage::new(
            payer,
            vec![
                Instruction::new_with_bytes(
                    program_id,
                    &[0],
                    vec![AccountMeta::new_readonly(shared, false)],
                ),
                Instruction::new_with_bytes(program_id, &[1], vec![AccountMeta::new(shared, false)]),
            ],
            Hash::new_unique(),
        );
        let legacy = message.compile_to_legacy_message().unwrap();
        assert_eq!(
            legacy
                .account_keys
                .iter()
                .filter(|key| **key == shared)
                .count(),
            1
        );

        let decompiled =
            TransactionMessage::decompile(&VersionedMessage::Legacy(legacy), &[]).unwrap();
        // both occurrences come back with the union of their flags
        for ix in &decompiled.instructions {
            assert_eq!(ix.accounts, vec![AccountMeta::new(shared, false)]);
        }
    }

    #[test_case(0, 0, 0 ; "no signers")]
    #[test_case(0, 1, 0 ; "readonly signers without signers")]
    #[test_case(2, 2, 0 ; "all signers readonly")]
    #[test_case(1, 0, 3 ; "too many readonly unsigned")]
    #[test_case(4, 0, 0 ; "more signers than keys")]
    fn test_decompile_invalid_header(
        num_required_signatures: u8,
        num_readonly_signed_accounts: u8,
        num_readonly_unsigned_accounts: u8,
    ) {
        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader {
                num_required_signatures,
                num_readonly_signed_accounts,
                num_readonly_unsigned_accounts,
            },
            account_keys: vec![Address::new_unique(), Address::new_unique(), Address::new_unique()],
            recent_blockhash: Hash::new_unique(),
            // would fail account resolution if it were attempted
            instructions: vec![CompiledInstruction::new_from_raw_parts(9, vec![], vec![9])],
        });
        assert_eq!(
            TransactionMessage::decompile(&message, &[]),
            Err(DecompileError::InvalidHeader)
        );
    }

    #[test]
    fn test_decompile_header_checked_before_lookups() {
        let message = VersionedMessage::V0(v0::Message {
            header: MessageHeader::default(),
            account_keys: vec![Address::new_unique()],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: Address::new_unique(),
                writable_indexes: vec![0],
                readonly_indexes: vec![],
            }],
            ..v0::Message::default()
        });
        assert_eq!(
            TransactionMessage::decompile(&message, &[]),
            Err(DecompileError::InvalidHeader)
        );
    }

    #[test]
    fn test_decompile_with_missing_lookup_table() {
        let payer = Address::new_unique();
        let program_id = Address::new_unique();
        let account = Address::new_unique();
        let table = AddressLookupTableAccount {
            key: Address::new_unique(),
            addresses: vec![account],
        };
        let message = TransactionMessage::new(
            payer,
            vec![Instruction::new_with_bytes(
                program_id,
                &[],
                vec![AccountMeta::new(account, false)],
            )],
            Hash::new_unique(),
        );
        let v0 = VersionedMessage::V0(message.compile_to_v0_message(&[table.clone()]).unwrap());

        let other_table = AddressLookupTableAccount {
            key: Address::new_unique(),
            addresses: vec![account],
        };
        assert_eq!(
            TransactionMessage::decompile(&v0, &[other_table]),
            Err(DecompileError::NoAccountKeys(
                AddressLoaderError::LookupTableAccountNotFound
            ))
        );
        assert_matches!(
            TransactionMessage::decompile(&v0, &[]),
            Err(DecompileError::NoAccountKeys(_))
        );
        assert_eq!(TransactionMessage::decompile(&v0, &[table]), Ok(message));
    }

    #[test]
    fn test_decompile_with_invalid_lookup_index() {
        let table = AddressLookupTableAccount {
            key: Address::new_unique(),
            addresses: vec![Address::new_unique()],
        };
        let message = VersionedMessage::V0(v0::Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 0,
            },
            account_keys: vec![Address::new_unique()],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes: vec![],
                readonly_indexes: vec![1],
            }],
            ..v0::Message::default()
        });
        assert_eq!(
            TransactionMessage::decompile(&message, &[table]),
            Err(DecompileError::NoAccountKeys(
                AddressLoaderError::InvalidLookupIndex
            ))
        );
    }

    #[test]
    fn test_decompile_key_one_past_the_end() {
        let table = AddressLookupTableAccount {
            key: Address::new_unique(),
            addresses: vec![Address::new_unique(), Address::new_unique()],
        };
        let static_keys = vec![Address::new_unique(), Address::new_unique()];
        let num_keys = 4u8;
        let message = VersionedMessage::V0(v0::Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: static_keys,
            recent_blockhash: Hash::new_unique(),
            instructions: vec![CompiledInstruction::new_from_raw_parts(
                1,
                vec![],
                vec![0, 2, 3, num_keys],
            )],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes: vec![0],
                readonly_indexes: vec![1],
            }],
        });
        assert_eq!(
            TransactionMessage::decompile(&message, &[table]),
            Err(DecompileError::KeyNotFound(num_keys))
        );
    }

    #[test]
    fn test_decompile_program_id_not_found() {
        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 0,
            },
            account_keys: vec![Address::new_unique()],
            recent_blockhash: Hash::new_unique(),
            instructions: vec![CompiledInstruction::new_from_raw_parts(1, vec![], vec![0])],
        });
        assert_eq!(
            TransactionMessage::decompile(&message, &[]),
            Err(DecompileError::ProgramIdNotFound(1))
        );
    }

    #[test]
    fn test_decompile_legacy_ignores_tables() {
        let (_, _, _, message) = scenario_a();
        let legacy = VersionedMessage::Legacy(message.compile_to_legacy_message().unwrap());
        let unrelated = AddressLookupTableAccount {
            key: Address::new_unique(),
            addresses: vec![Address::new_unique()],
        };
        assert_eq!(
            TransactionMessage::decompile(&legacy, &[unrelated]),
            Ok(message)
        );
    }

    #[test]
    fn test_decompile_with_loader() {
        let payer = Address::new_unique();
        let program_id = Address::new_unique();
        let writable = Address::new_unique();
        let readonly = Address::new_unique();
        let message = VersionedMessage::V0(v0::Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![payer, program_id],
            recent_blockhash: Hash::new_unique(),
            instructions: vec![CompiledInstruction::new_from_raw_parts(
                1,
                vec![5],
                vec![3, 2, 0],
            )],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: Address::new_unique(),
                writable_indexes: vec![0],
                readonly_indexes: vec![0],
            }],
        });

        let decompiled = TransactionMessage::decompile_with_loader(
            &message,
            crate::SimpleAddressLoader::Enabled(v0::LoadedAddresses {
                writable: vec![writable],
                readonly: vec![readonly],
            }),
        )
        .unwrap();
        assert_eq!(decompiled.payer_key, payer);
        assert_eq!(
            decompiled.instructions,
            vec![Instruction::new_with_bytes(
                program_id,
                &[5],
                vec![
                    AccountMeta::new_readonly(readonly, false),
                    AccountMeta::new(writable, false),
                    AccountMeta::new(payer, true),
                ],
            )]
        );

        assert_eq!(
            TransactionMessage::decompile_with_loader(
                &message,
                crate::SimpleAddressLoader::Disabled
            ),
            Err(DecompileError::NoAccountKeys(AddressLoaderError::Disabled))
        );
    }

    #[test]
    fn test_compute_budget_roundtrip_through_wire() {
        let payer = Address::new_unique();
        let message = TransactionMessage::new(
            payer,
            vec![
                ComputeBudgetInstruction::set_compute_unit_limit(200_000),
                ComputeBudgetInstruction::set_compute_unit_price(1_000),
            ],
            Hash::new_unique(),
        );
        let legacy = message.compile_to_legacy_message().unwrap();
        assert_eq!(
            legacy.account_keys,
            vec![payer, txwire_compute_budget_interface::id()]
        );

        let bytes = VersionedMessage::Legacy(legacy).serialize().unwrap();
        let decoded = VersionedMessage::deserialize(&bytes).unwrap();
        assert_eq!(TransactionMessage::decompile(&decoded, &[]), Ok(message));
    }

    /// Applies the flag merging compilation performs: every occurrence of a
    /// key carries the union of its flags, and the payer is a writable signer.
    fn normalize(message: &TransactionMessage) -> TransactionMessage {
        let mut flags = HashMap::<Address, (bool, bool)>::new();
        flags.insert(message.payer_key, (true, true));
        for meta in message.instructions.iter().flat_map(|ix| &ix.accounts) {
            let entry = flags.entry(meta.pubkey).or_default();
            entry.0 |= meta.is_signer;
            entry.1 |= meta.is_writable;
        }
        let instructions = message
            .instructions
            .iter()
            .map(|ix| Instruction {
                program_id: ix.program_id,
                accounts: ix
                    .accounts
                    .iter()
                    .map(|meta| {
                        let (is_signer, is_writable) = flags[&meta.pubkey];
                        AccountMeta {
                            pubkey: meta.pubkey,
                            is_signer,
                            is_writable,
                        }
                    })
                    .collect(),
                data: ix.data.clone(),
            })
            .collect();
        TransactionMessage::new(message.payer_key, instructions, message.recent_blockhash)
    }

    prop_compose! {
        fn arb_transaction_message()
            (
                keys in proptest::collection::vec(any::<[u8; 32]>(), 2..24),
                blockhash in any::<[u8; 32]>(),
            )
            (
                instructions in proptest::collection::vec(
                    (
                        0..keys.len(),
                        proptest::collection::vec((0..keys.len(), any::<bool>(), any::<bool>()), 0..8),
                        proptest::collection::vec(any::<u8>(), 0..16),
                    ),
                    0..6,
                ),
                keys in Just(keys),
                blockhash in Just(blockhash),
            ) -> TransactionMessage
        {
            let keys: Vec<Address> = keys.into_iter().map(Address::new_from_array).collect();
            let instructions = instructions
                .into_iter()
                .map(|(program_index, accounts, data)| Instruction {
                    program_id: keys[program_index],
                    accounts: accounts
                        .into_iter()
                        .map(|(index, is_signer, is_writable)| AccountMeta {
                            pubkey: keys[index],
                            is_signer,
                            is_writable,
                        })
                        .collect(),
                    data,
                })
                .collect();
            TransactionMessage::new(keys[0], instructions, Hash::new_from_array(blockhash))
        }
    }

    proptest! {
        #[test]
        fn test_legacy_roundtrip(message in arb_transaction_message()) {
            let compiled = message.compile_to_legacy_message().unwrap();
            let bytes = VersionedMessage::Legacy(compiled).serialize().unwrap();
            let decoded = VersionedMessage::deserialize(&bytes).unwrap();
            prop_assert_eq!(
                TransactionMessage::decompile(&decoded, &[]).unwrap(),
                normalize(&message)
            );
        }

        #[test]
        fn test_v0_roundtrip(
            message in arb_transaction_message(),
            split in 0usize..24,
        ) {
            let mut keys: Vec<Address> = message
                .instructions
                .iter()
                .flat_map(|ix| ix.accounts.iter().map(|meta| meta.pubkey))
                .collect();
            keys.dedup();
            let split = split.min(keys.len());
            let tables = vec![
                AddressLookupTableAccount {
                    key: Address::new_unique(),
                    addresses: keys[..split].to_vec(),
                },
                AddressLookupTableAccount {
                    key: Address::new_unique(),
                    addresses: keys.iter().rev().copied().collect(),
                },
            ];

            let compiled = message.compile_to_v0_message(&tables).unwrap();
            let bytes = VersionedMessage::V0(compiled).serialize().unwrap();
            let decoded = VersionedMessage::deserialize(&bytes).unwrap();
            prop_assert_eq!(
                TransactionMessage::decompile(&decoded, &tables).unwrap(),
                normalize(&message)
            );
        }
    }
}
