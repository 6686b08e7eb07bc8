// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;

/// The label of the synthetic party that receives all the swung votes.
pub const NEW_PARTY: &str = "New";

/// The catch-all label for winners that have no dedicated map bucket.
pub const OTHER: &str = "other";

/// Verbose names for the party codes found in the results.
///
/// Codes that are not listed here are displayed as they are.
pub const PARTY_NAMES: &[(&str, &str)] = &[
    ("C", "Conservative"),
    ("Lab", "Labour"),
    ("LD", "Lib Dem"),
    ("Green", "Green"),
    ("Ind", "Independent"),
    ("DUP", "Democratic Unionist Party"),
    ("SF", "Sinn Fein"),
    ("SNP", "Scottish National Party"),
    ("PC", "Plaid Cymru"),
];

/// The display name of a winner label.
pub fn display_name(label: &str) -> String {
    PARTY_NAMES
        .iter()
        .find(|(code, _)| *code == label)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| label.to_string())
}

/// One electoral constituency, with the votes of each party at the last election.
///
/// The votes are aligned with the party columns of the [Dataset] that holds the record.
#[derive(PartialEq, Debug, Clone)]
pub struct ConstituencyRecord {
    pub code: String,
    pub name: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    /// The party code that actually won the seat, when the source data says so.
    pub recorded_winner: Option<String>,
    pub votes: Vec<f64>,
}

impl ConstituencyRecord {
    pub fn new(code: &str, votes: &[f64]) -> ConstituencyRecord {
        ConstituencyRecord {
            code: code.to_string(),
            name: None,
            region: None,
            county: None,
            recorded_winner: None,
            votes: votes.to_vec(),
        }
    }
}

/// The immutable base data: one record per constituency and a fixed set of party columns.
///
/// Use [Dataset::new] or the [crate::builder::Builder] to construct it; both check the
/// invariants (unique codes, aligned and valid vote counts).
#[derive(PartialEq, Debug, Clone)]
pub struct Dataset {
    parties: Vec<String>,
    constituencies: Vec<ConstituencyRecord>,
}

impl Dataset {
    pub fn new(
        parties: &[String],
        constituencies: Vec<ConstituencyRecord>,
    ) -> Result<Dataset, EngineError> {
        let mut seen_parties: Vec<&String> = Vec::new();
        for p in parties.iter() {
            if p == NEW_PARTY {
                return Err(EngineError::ReservedPartyCode(p.clone()));
            }
            if seen_parties.contains(&p) {
                return Err(EngineError::DuplicateParty(p.clone()));
            }
            seen_parties.push(p);
        }

        let mut seen_codes: BTreeSet<&str> = BTreeSet::new();
        for c in constituencies.iter() {
            if !seen_codes.insert(c.code.as_str()) {
                return Err(EngineError::DuplicateConstituency(c.code.clone()));
            }
            if c.votes.len() != parties.len() {
                return Err(EngineError::VoteColumnMismatch {
                    code: c.code.clone(),
                    expected: parties.len(),
                    got: c.votes.len(),
                });
            }
            for (party, v) in parties.iter().zip(c.votes.iter()) {
                if !v.is_finite() || *v < 0.0 {
                    return Err(EngineError::InvalidVoteCount {
                        code: c.code.clone(),
                        party: party.clone(),
                        value: *v,
                    });
                }
            }
        }

        Ok(Dataset {
            parties: parties.to_vec(),
            constituencies,
        })
    }

    /// The party codes, in column order.
    pub fn parties(&self) -> &[String] {
        &self.parties
    }

    pub fn constituencies(&self) -> &[ConstituencyRecord] {
        &self.constituencies
    }

    pub fn len(&self) -> usize {
        self.constituencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituencies.is_empty()
    }

    pub fn party_index(&self, party: &str) -> Option<usize> {
        self.parties.iter().position(|p| p == party)
    }

    pub fn get(&self, code: &str) -> Option<&ConstituencyRecord> {
        self.constituencies.iter().find(|c| c.code == code)
    }

    /// The votes of a party in a constituency. None if either is unknown.
    pub fn party_votes(&self, code: &str, party: &str) -> Option<f64> {
        let idx = self.party_index(party)?;
        self.get(code).map(|c| c.votes[idx])
    }
}

/// A swing percentage, guaranteed to be in the range [0, 100].
#[derive(PartialEq, PartialOrd, Debug, Clone, Copy)]
pub struct SwingPercent(f64);

impl SwingPercent {
    pub const ZERO: SwingPercent = SwingPercent(0.0);
    pub const FULL: SwingPercent = SwingPercent(100.0);

    pub fn new(party: &str, value: f64) -> Result<SwingPercent, EngineError> {
        if value.is_nan() || !(0.0..=100.0).contains(&value) {
            return Err(EngineError::InvalidSwing {
                party: party.to_string(),
                value,
            });
        }
        Ok(SwingPercent(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub(crate) fn fraction(&self) -> f64 {
        self.0 / 100.0
    }
}

/// The share of each party's voters that defect to the new party.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SwingMap {
    swings: BTreeMap<String, SwingPercent>,
}

impl SwingMap {
    pub fn new() -> SwingMap {
        SwingMap::default()
    }

    /// Validates raw numbers coming from a user interface or a configuration file.
    ///
    /// The first invalid value is reported; nothing is clamped.
    pub fn from_raw(swings: &[(String, f64)]) -> Result<SwingMap, EngineError> {
        let mut res = SwingMap::new();
        for (party, value) in swings.iter() {
            res.insert(party, SwingPercent::new(party, *value)?);
        }
        Ok(res)
    }

    pub fn insert(&mut self, party: &str, swing: SwingPercent) {
        self.swings.insert(party.to_string(), swing);
    }

    pub fn get(&self, party: &str) -> Option<SwingPercent> {
        self.swings.get(party).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.swings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SwingPercent)> {
        self.swings.iter()
    }
}

/// A geographic boundary, keyed by the code of its constituency.
///
/// The geometry is carried along untouched.
#[derive(PartialEq, Debug, Clone)]
pub struct BoundaryFeature<G> {
    pub code: String,
    pub geometry: G,
}

// ******** Output data structures *********

/// The votes after the swing has been applied.
///
/// It has the same party columns as the original dataset plus the [NEW_PARTY] column.
#[derive(PartialEq, Debug, Clone)]
pub struct AdjustedDataset {
    pub parties: Vec<String>,
    pub rows: Vec<AdjustedConstituency>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AdjustedConstituency {
    pub code: String,
    /// Retained votes, aligned with the party columns.
    pub votes: Vec<f64>,
    pub new_party: f64,
}

impl AdjustedConstituency {
    pub fn total(&self) -> f64 {
        self.votes.iter().sum::<f64>() + self.new_party
    }
}

/// Seats won per party, as (display name, number of seats).
///
/// Ordered by decreasing number of seats.
pub type WinnerSummary = Vec<(String, u64)>;

/// The winner label (party code or [NEW_PARTY]) of each constituency.
pub type ConstituencyWinnerMap = BTreeMap<String, String>;

/// The fixed set of choropleth buckets, in drawing order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum MapBucket {
    Conservative,
    Labour,
    Snp,
    LibDem,
    Green,
    PlaidCymru,
    New,
    Other,
}

impl MapBucket {
    pub const ALL: [MapBucket; 8] = [
        MapBucket::Conservative,
        MapBucket::Labour,
        MapBucket::Snp,
        MapBucket::LibDem,
        MapBucket::Green,
        MapBucket::PlaidCymru,
        MapBucket::New,
        MapBucket::Other,
    ];

    /// The bucket for a winner label. Anything without a dedicated bucket is [MapBucket::Other].
    pub fn from_label(label: &str) -> MapBucket {
        match label {
            "C" => MapBucket::Conservative,
            "Lab" => MapBucket::Labour,
            "SNP" => MapBucket::Snp,
            "LD" => MapBucket::LibDem,
            "Green" => MapBucket::Green,
            "PC" => MapBucket::PlaidCymru,
            NEW_PARTY => MapBucket::New,
            _ => MapBucket::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapBucket::Conservative => "C",
            MapBucket::Labour => "Lab",
            MapBucket::Snp => "SNP",
            MapBucket::LibDem => "LD",
            MapBucket::Green => "Green",
            MapBucket::PlaidCymru => "PC",
            MapBucket::New => NEW_PARTY,
            MapBucket::Other => OTHER,
        }
    }

    /// The fill colour of the map layer.
    pub fn color(&self) -> &'static str {
        match self {
            MapBucket::Conservative => "#0087DC",
            MapBucket::Labour => "#DC241f",
            MapBucket::Snp => "#f4f142",
            MapBucket::LibDem => "#FAA61A",
            MapBucket::Green => "#6AB023",
            MapBucket::PlaidCymru => "#2f8c1a",
            MapBucket::New => "#a1edd8",
            MapBucket::Other => "#bbbbbb",
        }
    }
}

/// The boundary features grouped by the winner of their constituency.
#[derive(PartialEq, Debug, Clone)]
pub struct BucketedBoundaries<G> {
    /// One entry per [MapBucket], in the order of [MapBucket::ALL]. Buckets may be empty.
    pub buckets: Vec<(MapBucket, Vec<BoundaryFeature<G>>)>,
    /// The codes of the features that had no matching constituency.
    /// They have been placed in the [MapBucket::Other] bucket.
    pub unmatched: Vec<String>,
}

impl<G> BucketedBoundaries<G> {
    pub fn bucket(&self, bucket: MapBucket) -> &[BoundaryFeature<G>] {
        self.buckets
            .iter()
            .find(|(b, _)| *b == bucket)
            .map(|(_, fs)| fs.as_slice())
            .unwrap_or(&[])
    }
}

/// Errors raised by the engine.
#[derive(PartialEq, Debug, Clone)]
pub enum EngineError {
    /// A swing value outside [0, 100], or not a number.
    InvalidSwing { party: String, value: f64 },
    DuplicateConstituency(String),
    DuplicateParty(String),
    /// A party column uses a label reserved by the engine.
    ReservedPartyCode(String),
    VoteColumnMismatch {
        code: String,
        expected: usize,
        got: usize,
    },
    InvalidVoteCount {
        code: String,
        party: String,
        value: f64,
    },
    MissingConstituency(String),
}

impl Error for EngineError {}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidSwing { party, value } => write!(
                f,
                "invalid swing for party {}: {} (expected a number between 0 and 100)",
                party, value
            ),
            EngineError::DuplicateConstituency(code) => {
                write!(f, "constituency {} appears more than once", code)
            }
            EngineError::DuplicateParty(p) => write!(f, "party {} appears more than once", p),
            EngineError::ReservedPartyCode(p) => {
                write!(f, "party code {} is reserved for the new party", p)
            }
            EngineError::VoteColumnMismatch {
                code,
                expected,
                got,
            } => write!(
                f,
                "constituency {}: expected {} vote columns, found {}",
                code, expected, got
            ),
            EngineError::InvalidVoteCount { code, party, value } => write!(
                f,
                "constituency {}: invalid vote count {} for party {}",
                code, value, party
            ),
            EngineError::MissingConstituency(code) => {
                write!(f, "no constituency with code {}", code)
            }
        }
    }
}
