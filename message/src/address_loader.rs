use {
    crate::{
        v0::{LoadedAddresses, MessageAddressTableLookup},
        AddressLookupTableAccount,
    },
    thiserror::Error,
    txwire_address::Address,
};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AddressLoaderError {
    /// Address loading from lookup tables is disabled
    #[error("Address loading from lookup tables is disabled")]
    Disabled,

    /// Attempted to lookup addresses from a table that does not exist
    #[error("Attempted to lookup addresses from a table that does not exist")]
    LookupTableAccountNotFound,

    /// Address lookup contains an invalid index
    #[error("Address lookup contains an invalid index")]
    InvalidLookupIndex,
}

/// Resolves the table lookups of a `v0` message into the addresses they
/// reference.
///
/// Loaded addresses keep lookup order: the writable addresses of every
/// lookup, in lookup order, followed by the readonly addresses.
pub trait AddressLoader: Clone {
    fn load_addresses(
        self,
        lookups: &[MessageAddressTableLookup],
    ) -> Result<LoadedAddresses, AddressLoaderError>;
}

impl AddressLoader for &[AddressLookupTableAccount] {
    fn load_addresses(
        self,
        lookups: &[MessageAddressTableLookup],
    ) -> Result<LoadedAddresses, AddressLoaderError> {
        lookups
            .iter()
            .map(|lookup| -> Result<LoadedAddresses, AddressLoaderError> {
                let table = self
                    .iter()
                    .find(|table| table.key == lookup.account_key)
                    .ok_or_else(|| {
                        log::debug!("lookup table {} not supplied", lookup.account_key);
                        AddressLoaderError::LookupTableAccountNotFound
                    })?;
                Ok(LoadedAddresses {
                    writable: select_addresses(table, &lookup.writable_indexes)?,
                    readonly: select_addresses(table, &lookup.readonly_indexes)?,
                })
            })
            .collect()
    }
}

fn select_addresses(
    table: &AddressLookupTableAccount,
    indexes: &[u8],
) -> Result<Vec<Address>, AddressLoaderError> {
    indexes
        .iter()
        .map(|index| {
            table
                .addresses
                .get(usize::from(*index))
                .copied()
                .ok_or(AddressLoaderError::InvalidLookupIndex)
        })
        .collect()
}

/// An address loader that either refuses every lookup or hands out a fixed
/// set of addresses.
#[derive(Clone, Default, Debug)]
pub enum SimpleAddressLoader {
    #[default]
    Disabled,
    Enabled(LoadedAddresses),
}

impl AddressLoader for SimpleAddressLoader {
    fn load_addresses(
        self,
        _lookups: &[MessageAddressTableLookup],
    ) -> Result<LoadedAddresses, AddressLoaderError> {
        match self {
            Self::Disabled => Err(AddressLoaderError::Disabled),
            Self::Enabled(loaded_addresses) => Ok(loaded_addresses),
        }
    }
}
