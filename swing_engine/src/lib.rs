pub mod builder;
mod config;
pub mod manual;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;

// **** Private structures ****

/// A column of the adjusted dataset, in the order used to break ties.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
enum Column {
    Party(usize),
    New,
}

impl Column {
    fn label<'a>(&self, parties: &'a [String]) -> &'a str {
        match self {
            Column::Party(idx) => parties[*idx].as_str(),
            Column::New => NEW_PARTY,
        }
    }
}

/// Returns the column with the most votes.
///
/// The party columns come first, in dataset order, then the new party. On a tie,
/// the first column in that order wins. Returns None if there is no column at all.
fn arg_max(votes: &[f64], new_party: Option<f64>) -> Option<Column> {
    let all = votes
        .iter()
        .enumerate()
        .map(|(idx, v)| (Column::Party(idx), *v))
        .chain(new_party.map(|v| (Column::New, v)));
    let mut best: Option<(Column, f64)> = None;
    for (col, v) in all {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((col, v)),
        }
    }
    best.map(|(col, _)| col)
}

/// Counts the seats per column and expands the labels to display names.
///
/// The most seats come first; equal counts keep the column order.
fn summarize(winners: &[Column], parties: &[String]) -> WinnerSummary {
    let mut counts: BTreeMap<Column, u64> = BTreeMap::new();
    for col in winners.iter() {
        *counts.entry(*col).or_insert(0) += 1;
    }
    let mut sorted: Vec<(Column, u64)> = counts.into_iter().collect();
    // Stable sort: columns with the same count stay in column order.
    sorted.sort_by(|(_, c1), (_, c2)| c2.cmp(c1));
    sorted
        .iter()
        .map(|(col, count)| (display_name(col.label(parties)), *count))
        .collect()
}

/// Moves a share of each swung party's votes to the new party.
///
/// For each constituency and each party `p` of the swing map, the party keeps
/// `votes * (1 - swing/100)` and the new party receives `votes * swing/100`. The new
/// party's votes are summed over all the swung parties. Parties that are not in the
/// swing map keep their votes. Codes of the swing map that are not in the dataset are
/// ignored.
///
/// The dataset is not modified: every call starts from the original votes.
pub fn reallocate(dataset: &Dataset, swing_map: &SwingMap) -> AdjustedDataset {
    let parties = dataset.parties();
    for (party, swing) in swing_map.iter() {
        if dataset.party_index(party).is_none() {
            debug!(
                "reallocate: ignoring swing {:?} for unknown party {:?}",
                swing.value(),
                party
            );
        }
    }
    // The fraction of the votes that moves, per column. Zero for the parties without swing.
    let fractions: Vec<f64> = parties
        .iter()
        .map(|p| swing_map.get(p).map(|s| s.fraction()).unwrap_or(0.0))
        .collect();
    debug!("reallocate: swing fractions: {:?}", fractions);

    let rows: Vec<AdjustedConstituency> = dataset
        .constituencies()
        .iter()
        .map(|c| {
            let mut votes: Vec<f64> = Vec::with_capacity(c.votes.len());
            let mut new_party: f64 = 0.0;
            for (v, frac) in c.votes.iter().zip(fractions.iter()) {
                if *frac == 0.0 {
                    votes.push(*v);
                } else {
                    let donated = v * frac;
                    // Keeping the difference makes each split an exact partition of the votes.
                    votes.push(v - donated);
                    new_party += donated;
                }
            }
            AdjustedConstituency {
                code: c.code.clone(),
                votes,
                new_party,
            }
        })
        .collect();

    AdjustedDataset {
        parties: parties.to_vec(),
        rows,
    }
}

fn adjusted_winner(row: &AdjustedConstituency) -> Column {
    // There is always at least the new party column.
    arg_max(&row.votes, Some(row.new_party)).unwrap_or(Column::New)
}

/// The number of seats won by each party after the swing.
///
/// The winner of a constituency is the column with the most votes, the new party
/// included. Ties are broken in favour of the first column: the dataset's party
/// order, then the new party.
pub fn determine_winners(adjusted: &AdjustedDataset) -> WinnerSummary {
    let winners: Vec<Column> = adjusted.rows.iter().map(adjusted_winner).collect();
    let res = summarize(&winners, &adjusted.parties);
    info!(
        "determine_winners: {} constituencies: {:?}",
        adjusted.rows.len(),
        res
    );
    res
}

/// The number of seats won by each party at the election itself.
///
/// Uses the winner recorded in the data for each constituency, and the party with the
/// most votes when no winner is recorded.
pub fn identify_winners(dataset: &Dataset) -> WinnerSummary {
    let parties = dataset.parties();
    let mut winners: Vec<Column> = Vec::new();
    let mut extra: Vec<(String, u64)> = Vec::new();
    for c in dataset.constituencies().iter() {
        let recorded = c
            .recorded_winner
            .as_ref()
            .map(|w| (w, dataset.party_index(w)));
        match recorded {
            Some((_, Some(idx))) => winners.push(Column::Party(idx)),
            Some((w, None)) => {
                // The winner is not one of the party columns. It still holds the seat.
                warn!(
                    "identify_winners: constituency {}: recorded winner {:?} has no vote column",
                    c.code, w
                );
                match extra.iter_mut().find(|(name, _)| name == w) {
                    Some((_, count)) => *count += 1,
                    None => extra.push((w.clone(), 1)),
                }
            }
            None => {
                if let Some(col) = arg_max(&c.votes, None) {
                    winners.push(col);
                }
            }
        }
    }
    let mut res = summarize(&winners, parties);
    if !extra.is_empty() {
        res.extend(extra.into_iter().map(|(w, c)| (display_name(&w), c)));
        res.sort_by(|(_, c1), (_, c2)| c2.cmp(c1));
    }
    res
}

/// The winner label of every constituency after the swing.
pub fn winners_by_constituency(adjusted: &AdjustedDataset) -> ConstituencyWinnerMap {
    adjusted
        .rows
        .iter()
        .map(|row| {
            let col = adjusted_winner(row);
            (row.code.clone(), col.label(&adjusted.parties).to_string())
        })
        .collect()
}

/// The winner label of a single constituency after the swing.
pub fn lookup_winner(adjusted: &AdjustedDataset, code: &str) -> Result<String, EngineError> {
    let row = adjusted
        .rows
        .iter()
        .find(|r| r.code == code)
        .ok_or_else(|| EngineError::MissingConstituency(code.to_string()))?;
    Ok(adjusted_winner(row).label(&adjusted.parties).to_string())
}

/// Groups the boundary features by the winner of their constituency.
///
/// Every feature lands in exactly one bucket. A feature whose code has no
/// constituency, or whose winner has no dedicated bucket, goes to [MapBucket::Other].
/// Unmatched codes are listed in the result.
pub fn bucket_by_winner<G: Clone>(
    adjusted: &AdjustedDataset,
    features: &[BoundaryFeature<G>],
) -> BucketedBoundaries<G> {
    let winners: HashMap<&str, &str> = adjusted
        .rows
        .iter()
        .map(|row| {
            (
                row.code.as_str(),
                adjusted_winner(row).label(&adjusted.parties),
            )
        })
        .collect();

    let mut grouped: BTreeMap<MapBucket, Vec<BoundaryFeature<G>>> =
        MapBucket::ALL.iter().map(|b| (*b, Vec::new())).collect();
    let mut unmatched: Vec<String> = Vec::new();
    for feature in features.iter() {
        let bucket = match winners.get(feature.code.as_str()) {
            Some(label) => MapBucket::from_label(label),
            None => {
                warn!(
                    "bucket_by_winner: no constituency for boundary {:?}, using bucket {}",
                    feature.code,
                    OTHER
                );
                unmatched.push(feature.code.clone());
                MapBucket::Other
            }
        };
        if let Some(fs) = grouped.get_mut(&bucket) {
            fs.push(feature.clone());
        }
    }

    let buckets: Vec<(MapBucket, Vec<BoundaryFeature<G>>)> = MapBucket::ALL
        .iter()
        .map(|b| (*b, grouped.remove(b).unwrap_or_default()))
        .collect();
    for (b, fs) in buckets.iter() {
        debug!("bucket_by_winner: {}: {} features", b.label(), fs.len());
    }
    BucketedBoundaries { buckets, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn parties(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    fn swings(pairs: &[(&str, f64)]) -> SwingMap {
        let raw: Vec<(String, f64)> = pairs.iter().map(|(p, v)| (p.to_string(), *v)).collect();
        SwingMap::from_raw(&raw).unwrap()
    }

    // A: {C:100, Lab:50}, B: {C:30, Lab:80}
    fn two_seats() -> Dataset {
        Dataset::new(
            &parties(&["C", "Lab"]),
            vec![
                ConstituencyRecord::new("A", &[100.0, 50.0]),
                ConstituencyRecord::new("B", &[30.0, 80.0]),
            ],
        )
        .unwrap()
    }

    fn five_seats() -> Dataset {
        Dataset::new(
            &parties(&["C", "LD", "Lab", "SNP"]),
            vec![
                ConstituencyRecord::new("E1", &[20_143.0, 3_121.0, 18_220.0, 0.0]),
                ConstituencyRecord::new("E2", &[9_876.0, 15_031.0, 12_003.0, 0.0]),
                ConstituencyRecord::new("S1", &[8_101.0, 2_090.0, 11_546.0, 17_301.0]),
                ConstituencyRecord::new("S2", &[13_333.0, 1_000.0, 4_001.0, 13_332.0]),
                ConstituencyRecord::new("W1", &[7.0, 0.0, 31_217.5, 0.0]),
            ],
        )
        .unwrap()
    }

    fn seats(summary: &WinnerSummary) -> u64 {
        summary.iter().map(|(_, c)| *c).sum()
    }

    #[test]
    fn concrete_scenario() {
        init();
        let adjusted = reallocate(&two_seats(), &swings(&[("C", 50.0)]));
        assert_eq!(adjusted.rows[0].votes, vec![50.0, 50.0]);
        assert_eq!(adjusted.rows[0].new_party, 50.0);
        assert_eq!(adjusted.rows[1].votes, vec![15.0, 80.0]);
        assert_eq!(adjusted.rows[1].new_party, 15.0);

        // Three-way tie in A: the first column wins.
        assert_eq!(lookup_winner(&adjusted, "A"), Ok("C".to_string()));
        assert_eq!(lookup_winner(&adjusted, "B"), Ok("Lab".to_string()));

        let summary = determine_winners(&adjusted);
        assert_eq!(
            summary,
            vec![
                ("Conservative".to_string(), 1),
                ("Labour".to_string(), 1)
            ]
        );
        assert_eq!(seats(&summary), 2);
    }

    #[test]
    fn votes_are_conserved() {
        let ds = five_seats();
        let sm = swings(&[("C", 33.3), ("Lab", 71.0), ("SNP", 12.5), ("LD", 100.0)]);
        let adjusted = reallocate(&ds, &sm);
        for (orig, row) in ds.constituencies().iter().zip(adjusted.rows.iter()) {
            let before: f64 = orig.votes.iter().sum();
            assert!(
                (before - row.total()).abs() <= 1e-9 * before.max(1.0),
                "{}: {} != {}",
                orig.code,
                before,
                row.total()
            );
        }
    }

    #[test]
    fn zero_swing_is_identity() {
        let ds = five_seats();
        for sm in [SwingMap::new(), swings(&[("C", 0.0), ("Lab", 0.0)])] {
            let adjusted = reallocate(&ds, &sm);
            for (orig, row) in ds.constituencies().iter().zip(adjusted.rows.iter()) {
                assert_eq!(orig.votes, row.votes);
                assert_eq!(row.new_party, 0.0);
            }
            // Without a recorded winner, the election result is the plain arg-max.
            assert_eq!(determine_winners(&adjusted), identify_winners(&ds));
        }
    }

    #[test]
    fn seat_total_matches_constituencies() {
        let ds = five_seats();
        for sm in [
            SwingMap::new(),
            swings(&[("C", 10.0)]),
            swings(&[("Lab", 45.0), ("SNP", 60.0)]),
            swings(&[("C", 100.0), ("LD", 100.0), ("Lab", 100.0), ("SNP", 100.0)]),
        ] {
            let summary = determine_winners(&reallocate(&ds, &sm));
            assert_eq!(seats(&summary), ds.len() as u64);
        }
    }

    #[test]
    fn results_are_deterministic() {
        let ds = five_seats();
        let sm = swings(&[("C", 17.0), ("Lab", 23.0), ("SNP", 0.5)]);
        let a1 = reallocate(&ds, &sm);
        let a2 = reallocate(&ds, &sm);
        for (r1, r2) in a1.rows.iter().zip(a2.rows.iter()) {
            assert_eq!(r1.new_party.to_bits(), r2.new_party.to_bits());
            for (v1, v2) in r1.votes.iter().zip(r2.votes.iter()) {
                assert_eq!(v1.to_bits(), v2.to_bits());
            }
        }
        assert_eq!(determine_winners(&a1), determine_winners(&a2));
        assert_eq!(winners_by_constituency(&a1), winners_by_constituency(&a2));
    }

    #[test]
    fn full_swing_goes_to_new_party() {
        let ds = five_seats();
        let sm = swings(&[("C", 100.0), ("LD", 100.0), ("Lab", 100.0), ("SNP", 100.0)]);
        let adjusted = reallocate(&ds, &sm);
        for (orig, row) in ds.constituencies().iter().zip(adjusted.rows.iter()) {
            assert_eq!(row.new_party, orig.votes.iter().sum::<f64>());
            assert!(row.votes.iter().all(|v| *v == 0.0));
        }
        assert_eq!(determine_winners(&adjusted), vec![("New".to_string(), 5)]);
    }

    #[test]
    fn unknown_party_is_ignored() {
        let ds = two_seats();
        let with_unknown = reallocate(&ds, &swings(&[("XYZ", 50.0)]));
        let empty = reallocate(&ds, &SwingMap::new());
        assert_eq!(with_unknown, empty);
        assert_eq!(determine_winners(&with_unknown), determine_winners(&empty));
    }

    #[test]
    fn empty_dataset() {
        let ds = Dataset::new(&parties(&["C", "Lab"]), vec![]).unwrap();
        let adjusted = reallocate(&ds, &swings(&[("C", 20.0)]));
        assert!(adjusted.rows.is_empty());
        assert!(determine_winners(&adjusted).is_empty());
        assert!(identify_winners(&ds).is_empty());
        let buckets = bucket_by_winner::<()>(&adjusted, &[]);
        assert_eq!(buckets.buckets.len(), MapBucket::ALL.len());
        assert!(buckets.buckets.iter().all(|(_, fs)| fs.is_empty()));
    }

    #[test]
    fn invalid_swings_are_rejected() {
        for v in [-0.1, 100.5, f64::NAN, f64::INFINITY] {
            let res = SwingMap::from_raw(&[("C".to_string(), 10.0), ("Lab".to_string(), v)]);
            match res {
                Err(EngineError::InvalidSwing { party, .. }) => assert_eq!(party, "Lab"),
                x => panic!("expected an invalid swing, got {:?}", x),
            }
        }
        assert!(SwingPercent::new("C", 0.0).is_ok());
        assert!(SwingPercent::new("C", 100.0).is_ok());
    }

    #[test]
    fn new_party_can_win_from_several_donors() {
        // No single donor has more votes than the holder, but together they do.
        let ds = Dataset::new(
            &parties(&["C", "LD", "Lab"]),
            vec![ConstituencyRecord::new("X", &[400.0, 300.0, 350.0])],
        )
        .unwrap();
        let adjusted = reallocate(&ds, &swings(&[("LD", 80.0), ("Lab", 80.0)]));
        assert_eq!(lookup_winner(&adjusted, "X"), Ok(NEW_PARTY.to_string()));
        assert_eq!(determine_winners(&adjusted), vec![("New".to_string(), 1)]);
    }

    #[test]
    fn summary_ordering() {
        let adjusted = reallocate(&five_seats(), &SwingMap::new());
        // E1 C, E2 LD, S1 SNP, S2 C, W1 Lab
        assert_eq!(
            determine_winners(&adjusted),
            vec![
                ("Conservative".to_string(), 2),
                ("Lib Dem".to_string(), 1),
                ("Labour".to_string(), 1),
                ("Scottish National Party".to_string(), 1),
            ]
        );
    }

    #[test]
    fn recorded_winners_take_precedence() {
        let mut a = ConstituencyRecord::new("A", &[100.0, 50.0]);
        a.recorded_winner = Some("Lab".to_string());
        let mut b = ConstituencyRecord::new("B", &[30.0, 80.0]);
        b.recorded_winner = Some("Speaker".to_string());
        let c = ConstituencyRecord::new("C", &[30.0, 80.0]);
        let ds = Dataset::new(&parties(&["C", "Lab"]), vec![a, b, c]).unwrap();
        assert_eq!(
            identify_winners(&ds),
            vec![("Labour".to_string(), 2), ("Speaker".to_string(), 1)]
        );
    }

    #[test]
    fn bucketing_routes_unknown_codes_to_other() {
        init();
        let ds = Dataset::new(
            &parties(&["C", "DUP", "Lab"]),
            vec![
                ConstituencyRecord::new("A", &[100.0, 0.0, 50.0]),
                ConstituencyRecord::new("B", &[30.0, 0.0, 80.0]),
                ConstituencyRecord::new("N", &[1.0, 90.0, 2.0]),
            ],
        )
        .unwrap();
        let adjusted = reallocate(&ds, &swings(&[("Lab", 90.0)]));
        let features: Vec<BoundaryFeature<u32>> = ["A", "B", "N", "ZZZ"]
            .iter()
            .enumerate()
            .map(|(idx, code)| BoundaryFeature {
                code: code.to_string(),
                geometry: idx as u32,
            })
            .collect();
        let res = bucket_by_winner(&adjusted, &features);

        let codes = |b: MapBucket| -> Vec<String> {
            res.bucket(b).iter().map(|f| f.code.clone()).collect()
        };
        assert_eq!(codes(MapBucket::Conservative), vec!["A"]);
        assert_eq!(codes(MapBucket::New), vec!["B"]);
        // DUP has no bucket of its own.
        assert_eq!(codes(MapBucket::Other), vec!["N", "ZZZ"]);
        assert!(codes(MapBucket::Labour).is_empty());
        assert_eq!(res.unmatched, vec!["ZZZ".to_string()]);
        let total: usize = res.buckets.iter().map(|(_, fs)| fs.len()).sum();
        assert_eq!(total, features.len());
        assert_eq!(res.bucket(MapBucket::New)[0].geometry, 1);

        assert_eq!(
            lookup_winner(&adjusted, "ZZZ"),
            Err(EngineError::MissingConstituency("ZZZ".to_string()))
        );
    }

    #[test]
    fn winner_map_covers_every_constituency() {
        let ds = five_seats();
        let map = winners_by_constituency(&reallocate(&ds, &swings(&[("SNP", 50.0)])));
        assert_eq!(map.len(), ds.len());
        assert_eq!(map.get("S1").map(|s| s.as_str()), Some("Lab"));
        assert_eq!(map.get("S2").map(|s| s.as_str()), Some("C"));
    }

    #[test]
    fn dataset_invariants() {
        let p = parties(&["C", "Lab"]);
        assert_eq!(
            Dataset::new(
                &p,
                vec![
                    ConstituencyRecord::new("A", &[1.0, 2.0]),
                    ConstituencyRecord::new("A", &[1.0, 2.0])
                ]
            ),
            Err(EngineError::DuplicateConstituency("A".to_string()))
        );
        assert!(matches!(
            Dataset::new(&p, vec![ConstituencyRecord::new("A", &[1.0])]),
            Err(EngineError::VoteColumnMismatch { .. })
        ));
        assert!(matches!(
            Dataset::new(&p, vec![ConstituencyRecord::new("A", &[1.0, -3.0])]),
            Err(EngineError::InvalidVoteCount { .. })
        ));
        assert_eq!(
            Dataset::new(&parties(&["C", "New"]), vec![]),
            Err(EngineError::ReservedPartyCode("New".to_string()))
        );
        assert_eq!(
            Dataset::new(&parties(&["C", "C"]), vec![]),
            Err(EngineError::DuplicateParty("C".to_string()))
        );
    }
}
