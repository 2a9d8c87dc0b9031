#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use txwire_address::Address;

/// A compact encoding of an instruction.
///
/// A `CompiledInstruction` is a component of a multi-instruction [`Message`].
/// It is created during the compilation of a message and replaces every
/// account of the original [`Instruction`] with its position in the message's
/// account list. Most users will not interact with it directly.
///
/// [`Message`]: crate::Message
/// [`Instruction`]: crate::Instruction
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct CompiledInstruction {
    /// Index into the transaction keys array indicating the program account that executes this instruction.
    pub program_id_index: u8,
    /// Ordered indices into the transaction keys array indicating which accounts to pass to the program.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub accounts: Vec<u8>,
    /// The program input data.
    #[cfg_attr(feature = "serde", serde(with = "txwire_short_vec"))]
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    pub fn new_from_raw_parts(program_id_index: u8, data: Vec<u8>, accounts: Vec<u8>) -> Self {
        Self {
            program_id_index,
            accounts,
            data,
        }
    }

    /// Looks up the program this instruction invokes in `account_keys`.
    ///
    /// Returns `None` if the program index points past the end of the list.
    pub fn program_id<'a>(&self, account_keys: &'a [Address]) -> Option<&'a Address> {
        account_keys.get(usize::from(self.program_id_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_id() {
        let keys = [Address::new_unique(), Address::new_unique()];
        let ix = CompiledInstruction::new_from_raw_parts(1, vec![], vec![0]);
        assert_eq!(ix.program_id(&keys), Some(&keys[1]));
        let ix = CompiledInstruction::new_from_raw_parts(2, vec![], vec![0]);
        assert_eq!(ix.program_id(&keys), None);
    }

    #[test]
    fn test_wire_layout() {
        let ix = CompiledInstruction::new_from_raw_parts(4, vec![9, 8, 7], vec![0, 1]);
        assert_eq!(
            bincode::serialize(&ix).unwrap(),
            vec![4, 2, 0, 1, 3, 9, 8, 7]
        );
    }
}
