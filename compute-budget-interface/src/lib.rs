//! Instructions for the compute budget native program.
#![cfg_attr(docsrs, feature(doc_cfg))]

use {
    core::mem::size_of,
    txwire_address::Address,
    txwire_instruction::Instruction,
};

/// Address of the compute budget program,
/// `ComputeBudget111111111111111111111111111111`.
pub const ID: Address = Address::new_from_array([
    3, 6, 70, 111, 229, 33, 23, 50, 255, 236, 173, 186, 114, 195, 155, 231, 188, 140, 229, 187,
    197, 247, 18, 107, 44, 67, 155, 58, 64, 0, 0, 0,
]);

/// Returns the address of the compute budget program.
pub const fn id() -> Address {
    ID
}

/// Returns `true` if given address is the compute budget program.
pub fn check_id(id: &Address) -> bool {
    id == &ID
}

/// Compute Budget Instructions
#[cfg_attr(
    feature = "serde",
    derive(serde_derive::Deserialize, serde_derive::Serialize)
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComputeBudgetInstruction {
    Unused, // deprecated variant, reserved value.
    /// Request a specific transaction-wide program heap region size in bytes.
    /// The value requested must be a multiple of 1024. This new heap region
    /// size applies to each program executed in the transaction, including all
    /// calls to CPIs.
    RequestHeapFrame(u32),
    /// Set a specific compute unit limit that the transaction is allowed to consume.
    SetComputeUnitLimit(u32),
    /// Set a compute unit price in "micro-lamports" to pay a higher transaction
    /// fee for higher transaction prioritization.
    SetComputeUnitPrice(u64),
    /// Set a specific transaction-wide account data size limit, in bytes, is allowed to load.
    SetLoadedAccountsDataSizeLimit(u32),
}

macro_rules! to_instruction {
    ($discriminator: expr, $num: expr, $num_type: ty) => {{
        let mut data = [0u8; size_of::<$num_type>() + 1];
        data[0] = $discriminator;
        data[1..].copy_from_slice(&$num.to_le_bytes());
        Instruction {
            program_id: id(),
            data: data.to_vec(),
            accounts: vec![],
        }
    }};
}

impl ComputeBudgetInstruction {
    /// Create a `ComputeBudgetInstruction::RequestHeapFrame` `Instruction`
    pub fn request_heap_frame(bytes: u32) -> Instruction {
        to_instruction!(1, bytes, u32)
    }

    /// Create a `ComputeBudgetInstruction::SetComputeUnitLimit` `Instruction`
    pub fn set_compute_unit_limit(units: u32) -> Instruction {
        to_instruction!(2, units, u32)
    }

    /// Create a `ComputeBudgetInstruction::SetComputeUnitPrice` `Instruction`
    pub fn set_compute_unit_price(micro_lamports: u64) -> Instruction {
        to_instruction!(3, micro_lamports, u64)
    }

    /// Create a `ComputeBudgetInstruction::SetLoadedAccountsDataSizeLimit` `Instruction`
    pub fn set_loaded_accounts_data_size_limit(bytes: u32) -> Instruction {
        to_instruction!(4, bytes, u32)
    }

    /// Builds the `Instruction` this variant describes.
    ///
    /// Returns `None` for the reserved `Unused` variant, which has no wire form.
    pub fn to_instruction(&self) -> Option<Instruction> {
        match *self {
            Self::Unused => None,
            Self::RequestHeapFrame(bytes) => Some(Self::request_heap_frame(bytes)),
            Self::SetComputeUnitLimit(units) => Some(Self::set_compute_unit_limit(units)),
            Self::SetComputeUnitPrice(micro_lamports) => {
                Some(Self::set_compute_unit_price(micro_lamports))
            }
            Self::SetLoadedAccountsDataSizeLimit(bytes) => {
                Some(Self::set_loaded_accounts_data_size_limit(bytes))
            }
        }
    }
}
