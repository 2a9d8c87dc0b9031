use {
    crate::{
        v0::{LoadedAddresses, MessageAddressTableLookup},
        AddressLookupTableAccount, MessageHeader,
    },
    indexmap::IndexMap,
    thiserror::Error,
    txwire_address::Address,
    txwire_instruction::Instruction,
};

/// A helper struct to collect addresses compiled for a set of instructions.
///
/// Keys keep the order in which they were first referenced: the payer, then
/// for each instruction its accounts followed by its program id. That order
/// survives the split into signer and writable buckets, which makes
/// compilation deterministic for a given instruction list.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledKeys {
    key_meta_map: IndexMap<Address, CompiledKeyMeta>,
}

#[derive(PartialEq, Debug, Error, Eq, Clone)]
pub enum CompileError {
    #[error("account index overflowed during compilation")]
    AccountIndexOverflow,
    #[error("address lookup table index overflowed during compilation")]
    AddressTableLookupIndexOverflow,
    #[error("encountered unknown account key `{0}` during instruction compilation")]
    UnknownInstructionKey(Address),
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct CompiledKeyMeta {
    is_signer: bool,
    is_writable: bool,
    is_invoked: bool,
}

impl CompiledKeys {
    /// Compiles the addresses referenced by a list of instructions, the payer
    /// first as a writable signer. Flags of an address referenced more than
    /// once are merged.
    pub(crate) fn compile(instructions: &[Instruction], payer: Address) -> Self {
        let mut key_meta_map = IndexMap::<Address, CompiledKeyMeta>::new();
        key_meta_map.insert(
            payer,
            CompiledKeyMeta {
                is_signer: true,
                is_writable: true,
                is_invoked: false,
            },
        );
        for ix in instructions {
            for account_meta in &ix.accounts {
                let meta = key_meta_map.entry(account_meta.pubkey).or_default();
                meta.is_signer |= account_meta.is_signer;
                meta.is_writable |= account_meta.is_writable;
            }
            key_meta_map.entry(ix.program_id).or_default().is_invoked = true;
        }
        log::trace!(
            "compiled {} unique keys from {} instructions",
            key_meta_map.len(),
            instructions.len()
        );
        Self { key_meta_map }
    }

    fn keys_matching(&self, filter: impl Fn(&CompiledKeyMeta) -> bool) -> Vec<Address> {
        self.key_meta_map
            .iter()
            .filter_map(|(key, meta)| filter(meta).then_some(*key))
            .collect()
    }

    pub(crate) fn try_into_message_components(
        self,
    ) -> Result<(MessageHeader, Vec<Address>), CompileError> {
        let try_into_u8 = |num: usize| -> Result<u8, CompileError> {
            u8::try_from(num).map_err(|_| CompileError::AccountIndexOverflow)
        };

        let writable_signer_keys = self.keys_matching(|meta| meta.is_signer && meta.is_writable);
        let readonly_signer_keys = self.keys_matching(|meta| meta.is_signer && !meta.is_writable);
        let writable_non_signer_keys =
            self.keys_matching(|meta| !meta.is_signer && meta.is_writable);
        let readonly_non_signer_keys =
            self.keys_matching(|meta| !meta.is_signer && !meta.is_writable);

        let signers_len = writable_signer_keys
            .len()
            .saturating_add(readonly_signer_keys.len());

        let header = MessageHeader {
            num_required_signatures: try_into_u8(signers_len)?,
            num_readonly_signed_accounts: try_into_u8(readonly_signer_keys.len())?,
            num_readonly_unsigned_accounts: try_into_u8(readonly_non_signer_keys.len())?,
        };

        let static_account_keys = std::iter::empty()
            .chain(writable_signer_keys)
            .chain(readonly_signer_keys)
            .chain(writable_non_signer_keys)
            .chain(readonly_non_signer_keys)
            .collect();

        Ok((header, static_account_keys))
    }

    /// Moves every non-signer key found in `lookup_table_account` out of the
    /// static key set and into a table lookup.
    ///
    /// Keys invoked as programs stay static. Returns `None` when the table
    /// holds none of the remaining candidates.
    pub(crate) fn try_extract_table_lookup(
        &mut self,
        lookup_table_account: &AddressLookupTableAccount,
    ) -> Result<Option<(MessageAddressTableLookup, LoadedAddresses)>, CompileError> {
        let (writable_indexes, drained_writable_keys) = self
            .try_drain_keys_found_in_lookup_table(&lookup_table_account.addresses, |meta| {
                !meta.is_signer && !meta.is_invoked && meta.is_writable
            })?;
        let (readonly_indexes, drained_readonly_keys) = self
            .try_drain_keys_found_in_lookup_table(&lookup_table_account.addresses, |meta| {
                !meta.is_signer && !meta.is_invoked && !meta.is_writable
            })?;

        // Don't extract lookup if no keys were found
        if writable_indexes.is_empty() && readonly_indexes.is_empty() {
            return Ok(None);
        }

        log::debug!(
            "lookup table {} supplies {} writable and {} readonly keys",
            lookup_table_account.key,
            writable_indexes.len(),
            readonly_indexes.len()
        );

        Ok(Some((
            MessageAddressTableLookup {
                account_key: lookup_table_account.key,
                writable_indexes,
                readonly_indexes,
            },
            LoadedAddresses {
                writable: drained_writable_keys,
                readonly: drained_readonly_keys,
            },
        )))
    }

    fn try_drain_keys_found_in_lookup_table(
        &mut self,
        lookup_table_addresses: &[Address],
        key_meta_filter: impl Fn(&CompiledKeyMeta) -> bool,
    ) -> Result<(Vec<u8>, Vec<Address>), CompileError> {
        let mut lookup_table_indexes = Vec::new();
        let mut drained_keys = Vec::new();

        for search_key in self.keys_matching(key_meta_filter) {
            let Some(key_index) = lookup_table_addresses
                .iter()
                .position(|key| key == &search_key)
            else {
                continue;
            };
            let lookup_table_index = u8::try_from(key_index)
                .map_err(|_| CompileError::AddressTableLookupIndexOverflow)?;
            lookup_table_indexes.push(lookup_table_index);
            drained_keys.push(search_key);
        }

        for key in &drained_keys {
            self.key_meta_map.shift_remove(key);
        }

        Ok((lookup_table_indexes, drained_keys))
    }
}
