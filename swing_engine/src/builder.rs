use log::debug;
use std::collections::{BTreeSet, HashMap};

pub use crate::config::*;

/// One candidate's result in one constituency, as found in the published results.
///
/// The results usually come with one row per candidate. All the rows of a constituency
/// repeat the same descriptive fields.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateResult {
    pub code: String,
    pub constituency_name: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    /// The party code of the candidate.
    pub party: String,
    pub votes: f64,
    /// The party code that won the constituency.
    pub majority_party: Option<String>,
}

/// A builder for assembling a [Dataset] from candidate results.
///
/// Only the parties that won at least one seat keep a vote column. If no row says
/// who won its constituency, all the parties are kept.
///
/// ```
/// use swing_engine::builder::Builder;
/// # use swing_engine::EngineError;
///
/// let mut builder = Builder::new();
/// builder.add_result_simple("A", "C", 100.0, Some("C"));
/// builder.add_result_simple("A", "Lab", 50.0, Some("C"));
/// builder.add_result_simple("B", "Lab", 80.0, Some("Lab"));
/// let dataset = builder.build()?;
///
/// assert_eq!(dataset.party_votes("B", "C"), Some(0.0));
/// # Ok::<(), EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _results: Vec<CandidateResult>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds a result with no descriptive fields.
    pub fn add_result_simple(
        &mut self,
        code: &str,
        party: &str,
        votes: f64,
        majority_party: Option<&str>,
    ) {
        self.add_result(&CandidateResult {
            code: code.to_string(),
            constituency_name: None,
            region: None,
            county: None,
            party: party.to_string(),
            votes,
            majority_party: majority_party.map(|s| s.to_string()),
        })
    }

    pub fn add_result(&mut self, result: &CandidateResult) {
        self._results.push(result.clone());
    }

    /// Builds the dataset: one record per constituency, one vote column per party.
    ///
    /// - constituencies are in the order they first appear, with the descriptive fields
    ///   of their first row
    /// - party columns are sorted by code
    /// - a party with several candidates in a constituency counts the best candidate
    /// - a party with no candidate in a constituency has zero votes there
    pub fn build(&self) -> Result<Dataset, EngineError> {
        let winning_parties: BTreeSet<&str> = self
            ._results
            .iter()
            .filter_map(|r| r.majority_party.as_deref())
            .collect();
        let keep_party = |p: &str| winning_parties.is_empty() || winning_parties.contains(p);

        let parties: Vec<String> = self
            ._results
            .iter()
            .map(|r| r.party.as_str())
            .filter(|p| keep_party(*p))
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        debug!("build: parties: {:?}", parties);
        let party_idx: HashMap<&str, usize> = parties
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.as_str(), idx))
            .collect();

        let mut constituency_idx: HashMap<&str, usize> = HashMap::new();
        let mut records: Vec<ConstituencyRecord> = Vec::new();
        for r in self._results.iter() {
            if !r.votes.is_finite() || r.votes < 0.0 {
                return Err(EngineError::InvalidVoteCount {
                    code: r.code.clone(),
                    party: r.party.clone(),
                    value: r.votes,
                });
            }
            let idx = match constituency_idx.get(r.code.as_str()) {
                Some(idx) => *idx,
                None => {
                    constituency_idx.insert(r.code.as_str(), records.len());
                    records.push(ConstituencyRecord {
                        code: r.code.clone(),
                        name: r.constituency_name.clone(),
                        region: r.region.clone(),
                        county: r.county.clone(),
                        recorded_winner: r.majority_party.clone(),
                        votes: vec![0.0; parties.len()],
                    });
                    records.len() - 1
                }
            };
            if let Some(pidx) = party_idx.get(r.party.as_str()) {
                let v = &mut records[idx].votes[*pidx];
                if r.votes > *v {
                    *v = r.votes;
                }
            } else {
                debug!(
                    "build: {}: dropping {} votes for party {:?} (no seat won)",
                    r.code, r.votes, r.party
                );
            }
        }
        debug!(
            "build: {} constituencies from {} results",
            records.len(),
            self._results.len()
        );
        Dataset::new(&parties, records)
    }
}
