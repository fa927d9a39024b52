use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CAMEO quad class of an event (`QuadClass` in the source data).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EventType(u8);

impl EventType {
    pub const VERBAL_COOPERATION: EventType = EventType(1);
    pub const MATERIAL_COOPERATION: EventType = EventType(2);
    pub const VERBAL_CONFLICT: EventType = EventType(3);
    pub const MATERIAL_CONFLICT: EventType = EventType(4);

    pub const ALL: [EventType; 4] = [
        EventType::VERBAL_COOPERATION,
        EventType::MATERIAL_COOPERATION,
        EventType::VERBAL_CONFLICT,
        EventType::MATERIAL_CONFLICT,
    ];

    pub fn new(code: u8) -> Option<Self> {
        (1..=4).contains(&code).then_some(EventType(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    fn bit(self) -> u8 {
        1 << (self.0 - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event type {0} (expected 1..=4)")]
pub struct UnknownEventType(pub u8);

impl TryFrom<u8> for EventType {
    type Error = UnknownEventType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        EventType::new(code).ok_or(UnknownEventType(code))
    }
}

impl From<EventType> for u8 {
    fn from(t: EventType) -> Self {
        t.0
    }
}

/// Set of event types backed by a 4-bit mask; iterates in ascending code order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<EventType>", into = "Vec<EventType>")]
pub struct EventTypeSet {
    bits: u8,
}

impl Default for EventTypeSet {
    fn default() -> Self {
        Self::all()
    }
}

impl EventTypeSet {
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        EventType::ALL.into_iter().collect()
    }

    pub fn contains(&self, t: EventType) -> bool {
        self.bits & t.bit() != 0
    }

    pub fn insert(&mut self, t: EventType) -> bool {
        let before = self.bits;
        self.bits |= t.bit();
        before != self.bits
    }

    pub fn remove(&mut self, t: EventType) -> bool {
        let before = self.bits;
        self.bits &= !t.bit();
        before != self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Non-empty and missing at least one known type: the only case that
    /// actually narrows the result set.
    pub fn is_restrictive(&self) -> bool {
        !self.is_empty() && self.len() < EventType::ALL.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        EventType::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<EventType> for EventTypeSet {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        let mut set = EventTypeSet::empty();
        for t in iter {
            set.insert(t);
        }
        set
    }
}

impl From<Vec<EventType>> for EventTypeSet {
    fn from(v: Vec<EventType>) -> Self {
        v.into_iter().collect()
    }
}

impl From<EventTypeSet> for Vec<EventType> {
    fn from(s: EventTypeSet) -> Self {
        s.iter().collect()
    }
}
