use serde::{Deserialize, Serialize};

/// Tone above this is positive.
pub const POSITIVE_ABOVE: f64 = 2.0;
/// Tone below this is negative.
pub const NEGATIVE_BELOW: f64 = -2.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Bands an average tone value: `> 2` positive, `< -2` negative, else neutral.
    pub fn classify(tone: f64) -> Self {
        if tone > POSITIVE_ABOVE {
            Sentiment::Positive
        } else if tone < NEGATIVE_BELOW {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Sentiment::Positive => 0b001,
            Sentiment::Neutral => 0b010,
            Sentiment::Negative => 0b100,
        }
    }
}

/// Set of sentiment bands backed by a 3-bit mask.
///
/// Iteration order is always positive, neutral, negative.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Sentiment>", into = "Vec<Sentiment>")]
pub struct SentimentSet {
    bits: u8,
}

impl SentimentSet {
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        Sentiment::ALL.into_iter().collect()
    }

    pub fn contains(&self, s: Sentiment) -> bool {
        self.bits & s.bit() != 0
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, s: Sentiment) -> bool {
        let before = self.bits;
        self.bits |= s.bit();
        before != self.bits
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, s: Sentiment) -> bool {
        let before = self.bits;
        self.bits &= !s.bit();
        before != self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_all(&self) -> bool {
        self.len() == Sentiment::ALL.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sentiment> + '_ {
        Sentiment::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Sentiment> for SentimentSet {
    fn from_iter<I: IntoIterator<Item = Sentiment>>(iter: I) -> Self {
        let mut set = SentimentSet::empty();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

impl From<Vec<Sentiment>> for SentimentSet {
    fn from(v: Vec<Sentiment>) -> Self {
        v.into_iter().collect()
    }
}

impl From<SentimentSet> for Vec<Sentiment> {
    fn from(s: SentimentSet) -> Self {
        s.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Sentiment, SentimentSet};

    #[test]
    fn classify_uses_strict_thresholds() {
        assert_eq!(Sentiment::classify(2.0), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(2.01), Sentiment::Positive);
        assert_eq!(Sentiment::classify(-2.0), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(-7.5), Sentiment::Negative);
    }

    #[test]
    fn set_ops_and_stable_iteration() {
        let mut s = SentimentSet::empty();
        assert!(s.is_empty());
        assert!(s.insert(Sentiment::Negative));
        assert!(s.insert(Sentiment::Positive));
        assert!(!s.insert(Sentiment::Positive));
        assert_eq!(s.len(), 2);
        let got: Vec<_> = s.iter().collect();
        assert_eq!(got, vec![Sentiment::Positive, Sentiment::Negative]);
        assert!(s.remove(Sentiment::Positive));
        assert!(!s.remove(Sentiment::Positive));
        assert!(SentimentSet::all().is_all());
    }

    #[test]
    fn serializes_as_list_of_names() {
        let s: SentimentSet = [Sentiment::Neutral].into_iter().collect();
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"["neutral"]"#);
        let back: SentimentSet = serde_json::from_str(r#"["negative","positive"]"#).unwrap();
        assert!(back.contains(Sentiment::Negative) && back.contains(Sentiment::Positive));
    }
}
