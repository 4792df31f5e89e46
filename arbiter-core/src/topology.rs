use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{ArbiterError, Result};

/// The value a node votes with. A node with identity `v` counts the bytes of a
/// payload equal to `v` and consumes the `count_v` topic.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Identity(u8);

impl Identity {
    pub const fn new(value: u8) -> Self {
        Identity(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = ArbiterError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u8>()
            .map(Identity)
            .map_err(|e| ArbiterError::Config(format!("invalid identity {:?}: {}", s, e)))
    }
}

/// Logical bus topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Records still waiting for the given identity's count.
    Count(Identity),
    /// Fully counted records; every node consumes these.
    Save,
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Count(identity) => write!(f, "count_{}", identity),
            Topic::Save => write!(f, "save"),
        }
    }
}

impl FromStr for Topic {
    type Err = ArbiterError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "save" {
            return Ok(Topic::Save);
        }
        match s.strip_prefix("count_") {
            Some(identity) => Ok(Topic::Count(identity.parse()?)),
            None => Err(ArbiterError::Config(format!("unknown topic {:?}", s))),
        }
    }
}

/// The ordered set of identities taking part in arbitration. Slot `i` of a
/// count record always belongs to `identities[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    identities: Vec<Identity>,
}

impl Topology {
    /// The two-node `{0, 1}` deployment.
    pub fn binary() -> Self {
        Topology { identities: vec![Identity(0), Identity(1)] }
    }

    /// Identities `0..size`.
    pub fn with_size(size: usize) -> Result<Self> {
        if size == 0 || size > 256 {
            return Err(ArbiterError::Config(format!(
                "topology size must be between 1 and 256, got {}",
                size
            )));
        }
        Ok(Topology { identities: (0..size).map(|i| Identity(i as u8)).collect() })
    }

    pub fn from_identities(identities: impl IntoIterator<Item = Identity>) -> Result<Self> {
        let identities: BTreeSet<Identity> = identities.into_iter().collect();
        if identities.is_empty() {
            return Err(ArbiterError::Config("topology needs at least one identity".to_string()));
        }
        Ok(Topology { identities: identities.into_iter().collect() })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.slot_of(identity).is_some()
    }

    pub fn slot_of(&self, identity: Identity) -> Option<usize> {
        self.identities.binary_search(&identity).ok()
    }

    /// Like [`Topology::slot_of`] but treats a foreign identity as a configuration error.
    pub fn require_slot(&self, identity: Identity) -> Result<usize> {
        self.slot_of(identity).ok_or_else(|| {
            ArbiterError::Config(format!(
                "identity {} is not part of topology {:?}",
                identity, self.identities
            ))
        })
    }

    /// Where a record goes after `after` has filled its slot: the count topic of the
    /// next identity (in order, wrapping) whose slot is still unset, or `save`
    /// once every slot is filled.
    ///
    /// With two identities this is always the complementary identity's topic
    /// after ingress and always `save` after counting.
    pub fn next_topic(&self, after: Identity, counts: &[Option<u64>]) -> Topic {
        let n = self.identities.len();
        let start = self.slot_of(after).map(|slot| slot + 1).unwrap_or(0);
        (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&slot| counts.get(slot).map_or(false, Option::is_none))
            .map(|slot| Topic::Count(self.identities[slot]))
            .unwrap_or(Topic::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::Count(Identity::new(0)).to_string(), "count_0");
        assert_eq!(Topic::Count(Identity::new(1)).to_string(), "count_1");
        assert_eq!(Topic::Save.to_string(), "save");

        assert_eq!("count_1".parse::<Topic>().unwrap(), Topic::Count(Identity::new(1)));
        assert_eq!("save".parse::<Topic>().unwrap(), Topic::Save);
        assert!("count_".parse::<Topic>().is_err());
        assert!("count_x".parse::<Topic>().is_err());
        assert!("load".parse::<Topic>().is_err());
    }

    #[test]
    fn test_binary_next_topic_is_complement_then_save() {
        let topology = Topology::binary();
        let zero = Identity::new(0);
        let one = Identity::new(1);

        assert_eq!(topology.next_topic(zero, &[Some(3), None]), Topic::Count(one));
        assert_eq!(topology.next_topic(one, &[None, Some(3)]), Topic::Count(zero));
        assert_eq!(topology.next_topic(one, &[Some(3), Some(1)]), Topic::Save);
    }

    #[test]
    fn test_next_topic_wraps_around() {
        let topology = Topology::with_size(3).unwrap();
        let two = Identity::new(2);

        assert_eq!(topology.next_topic(two, &[None, None, Some(1)]), Topic::Count(Identity::new(0)));
        assert_eq!(topology.next_topic(two, &[Some(0), None, Some(1)]), Topic::Count(Identity::new(1)));
        assert_eq!(topology.next_topic(Identity::new(1), &[Some(0), Some(4), Some(1)]), Topic::Save);
    }

    #[test]
    fn test_from_identities_sorts_and_dedupes() {
        let topology = Topology::from_identities([Identity::new(5), Identity::new(1), Identity::new(5)]).unwrap();
        assert_eq!(topology.identities(), &[Identity::new(1), Identity::new(5)]);
        assert_eq!(topology.slot_of(Identity::new(5)), Some(1));
        assert!(topology.require_slot(Identity::new(0)).is_err());
        assert!(Topology::from_identities(Vec::<Identity>::new()).is_err());
    }

    #[test]
    fn test_with_size_bounds() {
        assert!(Topology::with_size(0).is_err());
        assert!(Topology::with_size(257).is_err());
        assert_eq!(Topology::with_size(256).unwrap().len(), 256);
        assert_eq!(Topology::with_size(2).unwrap(), Topology::binary());
    }
}
