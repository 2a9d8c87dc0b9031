use {
    crate::{compiled_instruction::CompiledInstruction, v0::LoadedAddresses, CompileError},
    std::collections::BTreeMap,
    txwire_address::Address,
    txwire_instruction::Instruction,
};

/// Collection of static and dynamically loaded keys used to load accounts
/// during transaction processing.
///
/// Indices run over the static keys first, then the writable loaded keys,
/// then the readonly loaded keys, which is the order compiled instructions
/// use to refer to accounts.
#[derive(Clone, Default, Debug, Eq)]
pub struct AccountKeys<'a> {
    static_keys: &'a [Address],
    dynamic_keys: Option<&'a LoadedAddresses>,
}

impl<'a> AccountKeys<'a> {
    pub fn new(static_keys: &'a [Address], dynamic_keys: Option<&'a LoadedAddresses>) -> Self {
        Self {
            static_keys,
            dynamic_keys,
        }
    }

    pub fn static_keys(&self) -> &'a [Address] {
        self.static_keys
    }

    pub fn dynamic_keys(&self) -> Option<&'a LoadedAddresses> {
        self.dynamic_keys
    }

    /// Returns an iterator of account key segments. The ordering of segments
    /// affects how account indexes from compiled instructions are resolved and
    /// so should not be changed.
    #[inline(always)]
    pub fn key_segment_iter(&self) -> impl Iterator<Item = &'a [Address]> + Clone {
        if let Some(dynamic_keys) = self.dynamic_keys {
            [
                self.static_keys,
                dynamic_keys.writable.as_slice(),
                dynamic_keys.readonly.as_slice(),
            ]
            .into_iter()
        } else {
            [self.static_keys, &[], &[]].into_iter()
        }
    }

    /// Returns the address of the account at the specified index or `None` if
    /// the index is invalid.
    #[inline]
    pub fn get(&self, mut index: usize) -> Option<&'a Address> {
        for key_segment in self.key_segment_iter() {
            if index < key_segment.len() {
                return key_segment.get(index);
            }
            index = index.saturating_sub(key_segment.len());
        }

        None
    }

    /// Returns the total length of loaded accounts for a message
    #[inline]
    pub fn len(&self) -> usize {
        self.key_segment_iter()
            .fold(0usize, |len, key_segment| len.saturating_add(key_segment.len()))
    }

    /// Returns true if this collection of account keys is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys loaded from lookup tables as writable.
    pub fn num_lookup_writable(&self) -> usize {
        self.dynamic_keys
            .map(|dynamic_keys| dynamic_keys.writable.len())
            .unwrap_or_default()
    }

    /// Iterator for the addresses of the loaded accounts for a message
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'a Address> + Clone {
        self.key_segment_iter().flatten()
    }

    /// Compile instructions using the order of account keys to determine
    /// compiled instruction account indexes.
    ///
    /// # Errors
    ///
    /// Compilation will fail if any `instructions` use account keys which are
    /// not present in this account key collection.
    ///
    /// Compilation will fail if any `instructions` use account keys which are
    /// located at an index which cannot be cast to a `u8` without overflow.
    pub fn try_compile_instructions(
        &self,
        instructions: &[Instruction],
    ) -> Result<Vec<CompiledInstruction>, CompileError> {
        let mut account_index_map = BTreeMap::<&Address, u8>::new();
        for (index, key) in self.iter().enumerate() {
            let index = u8::try_from(index).map_err(|_| CompileError::AccountIndexOverflow)?;
            account_index_map.entry(key).or_insert(index);
        }

        let get_account_index = |key: &Address| -> Result<u8, CompileError> {
            account_index_map
                .get(key)
                .copied()
                .ok_or(CompileError::UnknownInstructionKey(*key))
        };

        instructions
            .iter()
            .map(|ix| {
                let accounts: Vec<u8> = ix
                    .accounts
                    .iter()
                    .map(|account_meta| get_account_index(&account_meta.pubkey))
                    .collect::<Result<Vec<u8>, CompileError>>()?;

                Ok(CompiledInstruction {
                    program_id_index: get_account_index(&ix.program_id)?,
                    data: ix.data.clone(),
                    accounts,
                })
            })
            .collect()
    }
}

impl PartialEq for AccountKeys<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
