use {
    crate::{
        compiled_instruction::CompiledInstruction, legacy::Message as LegacyMessage,
        v0::MessageAddressTableLookup, AddressLoader, AddressLoaderError, MessageHeader,
    },
    thiserror::Error,
    txwire_address::Address,
    txwire_hash::Hash,
};
#[cfg(feature = "serde")]
use {
    serde::{
        de::{self, Deserializer, SeqAccess, Unexpected, Visitor},
        ser::{SerializeTuple, Serializer},
    },
    serde_derive::{Deserialize, Serialize},
    std::fmt,
};

pub mod v0;

/// Bit mask that indicates whether a serialized message is versioned.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

/// Errors raised while encoding or decoding the wire form of a message.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MessageError {
    #[error("failed to encode message: {0}")]
    Encoding(String),
    #[error("failed to decode message: {0}")]
    InvalidEncoding(String),
    #[error("message is followed by trailing data")]
    TrailingData,
}

/// Type that serializes to the string "legacy"
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Legacy {
    Legacy,
}

#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(rename_all = "camelCase", untagged)
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionVersion {
    Legacy(Legacy),
    Number(u8),
}

impl TransactionVersion {
    pub const LEGACY: Self = Self::Legacy(Legacy::Legacy);
}

/// Either a legacy message or a v0 message.
///
/// # Serialization
///
/// The first byte decides the format. With its high bit clear the byte is
/// the legacy header's `num_required_signatures` and the whole input is a
/// legacy message. With the high bit set the low 7 bits are a version
/// number and the message body follows; only version `0` is supported.
///
/// Human-readable formats get a tagged object instead, `{"legacy": ..}` or
/// `{"v0": ..}`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VersionedMessage {
    Legacy(LegacyMessage),
    V0(v0::Message),
}

impl VersionedMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Legacy(message) => &message.header,
            Self::V0(message) => &message.header,
        }
    }

    pub fn static_account_keys(&self) -> &[Address] {
        match self {
            Self::Legacy(message) => &message.account_keys,
            Self::V0(message) => &message.account_keys,
        }
    }

    pub fn address_table_lookups(&self) -> Option<&[MessageAddressTableLookup]> {
        match self {
            Self::Legacy(_) => None,
            Self::V0(message) => Some(&message.address_table_lookups),
        }
    }

    /// Returns true if the account at the specified index signed this
    /// message.
    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header().num_required_signatures)
    }

    pub fn recent_blockhash(&self) -> &Hash {
        match self {
            Self::Legacy(message) => &message.recent_blockhash,
            Self::V0(message) => &message.recent_blockhash,
        }
    }

    pub fn set_recent_blockhash(&mut self, recent_blockhash: Hash) {
        match self {
            Self::Legacy(message) => message.recent_blockhash = recent_blockhash,
            Self::V0(message) => message.recent_blockhash = recent_blockhash,
        }
    }

    /// Program instructions that will be executed in sequence and committed in
    /// one atomic transaction if all succeed.
    #[inline(always)]
    pub fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            Self::Legacy(message) => &message.instructions,
            Self::V0(message) => &message.instructions,
        }
    }

    pub fn version(&self) -> TransactionVersion {
        match self {
            Self::Legacy(_) => TransactionVersion::LEGACY,
            Self::V0(_) => TransactionVersion::Number(0),
        }
    }

    /// Resolve the address table lookups of this message, if its version
    /// supports them. A legacy message never consults `loader`.
    pub fn load_addresses(
        &self,
        loader: impl AddressLoader,
    ) -> Result<Option<v0::LoadedAddresses>, AddressLoaderError> {
        match self {
            Self::Legacy(_) => Ok(None),
            Self::V0(message) => message.load_addresses(loader).map(Some),
        }
    }

    #[cfg(feature = "bincode")]
    pub fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        crate::serialize_message(self)
    }

    /// Decode a message of either version from its wire format.
    ///
    /// The input must hold exactly one message. Version 127 is reserved for
    /// off-chain messages and is rejected, as is any version other than 0.
    #[cfg(feature = "bincode")]
    pub fn deserialize(bytes: &[u8]) -> Result<Self, MessageError> {
        crate::deserialize_exact(bytes)
    }
}

impl Default for VersionedMessage {
    fn default() -> Self {
        Self::Legacy(LegacyMessage::default())
    }
}

impl From<LegacyMessage> for VersionedMessage {
    fn from(message: LegacyMessage) -> Self {
        Self::Legacy(message)
    }
}

impl From<v0::Message> for VersionedMessage {
    fn from(message: v0::Message) -> Self {
        Self::V0(message)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for VersionedMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let tagged = match self {
                Self::Legacy(message) => TaggedMessageRef::Legacy(message),
                Self::V0(message) => TaggedMessageRef::V0(message),
            };
            return serde::Serialize::serialize(&tagged, serializer);
        }

        match self {
            Self::Legacy(message) => {
                let mut seq = serializer.serialize_tuple(1)?;
                seq.serialize_element(message)?;
                seq.end()
            }
            Self::V0(message) => {
                let mut seq = serializer.serialize_tuple(2)?;
                seq.serialize_element(&MESSAGE_VERSION_PREFIX)?;
                seq.serialize_element(message)?;
                seq.end()
            }
        }
    }
}

/// Text form of a message: the version is named by the tag since there is no
/// prefix byte to carry it.
#[cfg(feature = "serde")]
#[derive(Serialize)]
#[serde(rename = "VersionedMessage", rename_all = "camelCase")]
enum TaggedMessageRef<'a> {
    Legacy(&'a LegacyMessage),
    V0(&'a v0::Message),
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(rename = "VersionedMessage", rename_all = "camelCase")]
enum TaggedMessage {
    Legacy(LegacyMessage),
    V0(v0::Message),
}

#[cfg(feature = "serde")]
impl From<TaggedMessage> for VersionedMessage {
    fn from(tagged: TaggedMessage) -> Self {
        match tagged {
            TaggedMessage::Legacy(message) => Self::Legacy(message),
            TaggedMessage::V0(message) => Self::V0(message),
        }
    }
}

/// Version number whose prefix byte, `0xff`, opens an off-chain message.
#[cfg(feature = "serde")]
const OFF_CHAIN_MESSAGE_VERSION: u8 = 127;

/// What the first byte of an encoded message says about the rest of it.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessagePrefix {
    /// A legacy message; the byte is its `num_required_signatures`.
    Legacy(u8),
    /// A versioned message; the byte carries the version in its low 7 bits.
    Versioned(u8),
}

#[cfg(feature = "serde")]
impl From<u8> for MessagePrefix {
    fn from(byte: u8) -> Self {
        if byte & MESSAGE_VERSION_PREFIX == 0 {
            Self::Legacy(byte)
        } else {
            Self::Versioned(byte & !MESSAGE_VERSION_PREFIX)
        }
    }
}

/// A legacy message minus the header byte consumed as its prefix.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct LegacyMessageTail {
    num_readonly_signed_accounts: u8,
    num_readonly_unsigned_accounts: u8,
    #[serde(with = "txwire_short_vec")]
    account_keys: Vec<Address>,
    recent_blockhash: Hash,
    #[serde(with = "txwire_short_vec")]
    instructions: Vec<CompiledInstruction>,
}

#[cfg(feature = "serde")]
impl LegacyMessageTail {
    fn into_message(self, num_required_signatures: u8) -> LegacyMessage {
        LegacyMessage {
            header: MessageHeader {
                num_required_signatures,
                num_readonly_signed_accounts: self.num_readonly_signed_accounts,
                num_readonly_unsigned_accounts: self.num_readonly_unsigned_accounts,
            },
            account_keys: self.account_keys,
            recent_blockhash: self.recent_blockhash,
            instructions: self.instructions,
        }
    }
}

#[cfg(feature = "serde")]
struct VersionedMessageVisitor;

#[cfg(feature = "serde")]
impl<'de> Visitor<'de> for VersionedMessageVisitor {
    type Value = VersionedMessage;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a prefix byte followed by a legacy or versioned message body")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<VersionedMessage, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let prefix: u8 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;

        match MessagePrefix::from(prefix) {
            MessagePrefix::Legacy(num_required_signatures) => {
                let tail: LegacyMessageTail = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(VersionedMessage::Legacy(
                    tail.into_message(num_required_signatures),
                ))
            }
            MessagePrefix::Versioned(0) => seq
                .next_element()?
                .map(VersionedMessage::V0)
                .ok_or_else(|| de::Error::invalid_length(1, &self)),
            MessagePrefix::Versioned(OFF_CHAIN_MESSAGE_VERSION) => {
                Err(de::Error::custom("off-chain messages are not accepted"))
            }
            MessagePrefix::Versioned(version) => Err(de::Error::invalid_value(
                Unexpected::Unsigned(u64::from(version)),
                &"a supported message version",
            )),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for VersionedMessage {
    fn deserialize<D>(deserializer: D) -> Result<VersionedMessage, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            return <TaggedMessage as serde::Deserialize>::deserialize(deserializer)
                .map(VersionedMessage::from);
        }
        // Two elements at most: the prefix byte and whatever body it selects.
        deserializer.deserialize_tuple(2, VersionedMessageVisitor)
    }
}
