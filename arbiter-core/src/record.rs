use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::Result;
use crate::topology::Topology;

/// Identity and descriptive metadata of one uploaded blob.
/// `size` is whatever the uploader reported and is never checked against the payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
}

impl BlobMeta {
    /// Metadata with a freshly assigned id.
    pub fn new(filename: impl Into<String>, size: u64, content_type: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            size,
            content_type,
        }
    }
}

/// The message passed between nodes: a blob plus one vote slot per identity.
///
/// On the wire the payload is a string with one code point per byte and an
/// unset slot is `-1`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    #[serde(with = "latin1")]
    pub payload: Vec<u8>,
    pub meta: BlobMeta,
    #[serde(with = "slots")]
    pub counts: Vec<Option<u64>>,
}

impl CountRecord {
    /// A record with every slot unset.
    pub fn new(meta: BlobMeta, payload: Vec<u8>, topology: &Topology) -> Self {
        Self { payload, meta, counts: vec![None; topology.len()] }
    }

    pub fn is_complete(&self) -> bool {
        self.counts.iter().all(Option::is_some)
    }

    /// The filled counts, or `None` while any slot is unset.
    pub fn complete_counts(&self) -> Option<Vec<u64>> {
        self.counts.iter().copied().collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Serializes raw bytes as a string where every byte becomes the code point
/// of the same value, so all 256 byte values survive a text encoding.
pub mod latin1 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|&b| char::from(b)).collect()
    }

    pub fn decode(text: &str) -> Option<Vec<u8>> {
        text.chars().map(|c| u8::try_from(c).ok()).collect()
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode(&text).ok_or_else(|| D::Error::custom("payload contains a code point above U+00FF"))
    }
}

/// Vote slots travel as integers with `-1` standing for "not counted yet".
mod slots {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    const UNSET: i64 = -1;

    pub fn serialize<S: Serializer>(counts: &[Option<u64>], serializer: S) -> Result<S::Ok, S::Error> {
        let raw = counts
            .iter()
            .map(|slot| match slot {
                Some(count) => i64::try_from(*count)
                    .map_err(|_| ser::Error::custom(format!("count {} does not fit a count slot", count))),
                None => Ok(UNSET),
            })
            .collect::<Result<Vec<i64>, S::Error>>()?;
        serializer.collect_seq(raw)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Option<u64>>, D::Error> {
        Vec::<i64>::deserialize(deserializer)?
            .into_iter()
            .map(|raw| match raw {
                UNSET => Ok(None),
                n if n >= 0 => Ok(Some(n as u64)),
                n => Err(de::Error::custom(format!("invalid count slot {}", n))),
            })
            .collect()
    }
}
