use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use swing_engine::builder::{Builder, CandidateResult};
use swing_engine::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::swing::config_reader::*;

mod config_reader;
mod io_common;
mod io_excel;
mod io_geojson;

#[derive(Debug, Snafu)]
pub enum SwingError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The spreadsheet is empty"))]
    EmptyExcel {},
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Column {column} not found in the header of the spreadsheet"))]
    ExcelMissingColumn { column: String },
    #[snafu(display("Line {lineno}: cannot read column {column}: {content}"))]
    ExcelWrongCellType {
        lineno: u64,
        column: String,
        content: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("{path} is not a GeoJSON FeatureCollection"))]
    GeoJsonMissingFeatures { path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand swing {arg:?}, expected PARTY=PERCENT"))]
    InvalidSwingArg { arg: String },
    #[snafu(display("No election results: use --input or a configuration file"))]
    MissingInput {},
    #[snafu(display("Unknown results provider {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("{source}"))]
    Engine { source: EngineError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SwingResult<T> = Result<T, SwingError>;

/// The options of a run, after the command line has been parsed.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<String>,
    pub reference: Option<String>,
    pub out: Option<String>,
    pub map_out: Option<String>,
    pub input: Option<String>,
    pub boundaries: Option<String>,
    pub swings: Vec<String>,
    pub year: Option<i64>,
    pub excel_worksheet_name: Option<String>,
}

impl RunOptions {
    pub fn from_args(args: &Args) -> RunOptions {
        RunOptions {
            config: args.config.clone(),
            reference: args.reference.clone(),
            out: args.out.clone(),
            map_out: args.map_out.clone(),
            input: args.input.clone(),
            boundaries: args.boundaries.clone(),
            swings: args.swing.clone(),
            year: args.year,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }
    }
}

/// The seats before and after the swing.
#[derive(PartialEq, Debug, Clone)]
pub struct Projection {
    pub before: WinnerSummary,
    pub after: WinnerSummary,
    pub winners: ConstituencyWinnerMap,
    pub adjusted: AdjustedDataset,
}

pub fn project(dataset: &Dataset, swings: &SwingMap) -> Projection {
    let adjusted = reallocate(dataset, swings);
    Projection {
        before: identify_winners(dataset),
        after: determine_winners(&adjusted),
        winners: winners_by_constituency(&adjusted),
        adjusted,
    }
}

/// Parses a swing given on the command line, for example `C=10`.
pub fn parse_swing_arg(arg: &str) -> SwingResult<(String, f64)> {
    let (party, pct) = arg.split_once('=').context(InvalidSwingArgSnafu { arg })?;
    let party = party.trim();
    if party.is_empty() {
        return InvalidSwingArgSnafu { arg }.fail();
    }
    let value = pct
        .trim()
        .parse::<f64>()
        .ok()
        .context(InvalidSwingArgSnafu { arg })?;
    Ok((party.to_string(), value))
}

/// The swings of the configuration, overridden by the ones given on the command line.
fn merge_swings(config: &SwingConfig, args: &[String]) -> SwingResult<SwingMap> {
    let mut raw: Vec<(String, f64)> = config
        .swings
        .iter()
        .map(|(p, v)| (p.clone(), *v))
        .collect();
    for arg in args.iter() {
        let (party, value) = parse_swing_arg(arg)?;
        raw.retain(|(p, _)| *p != party);
        raw.push((party, value));
    }
    debug!("merge_swings: {:?}", raw);
    SwingMap::from_raw(&raw).context(EngineSnafu {})
}

fn summary_to_json(summary: &WinnerSummary) -> Vec<JSValue> {
    summary
        .iter()
        .map(|(party, seats)| json!({"party": party, "seatsWon": seats}))
        .collect()
}

fn build_summary_js(contest: Option<&String>, swings: &SwingMap, projection: &Projection) -> JSValue {
    let mut swings_js: JSMap<String, JSValue> = JSMap::new();
    for (party, s) in swings.iter() {
        swings_js.insert(party.clone(), json!(s.value()));
    }
    json!({
        "config": {
            "contest": contest,
            "swings": swings_js,
        },
        "results": {
            "before": summary_to_json(&projection.before),
            "after": summary_to_json(&projection.after),
            "constituencies": projection.winners,
        }
    })
}

fn read_results(path: &str, source: &ResultsSource) -> SwingResult<Dataset> {
    info!("Attempting to read results file {:?}", path);
    let results: Vec<CandidateResult> = match source.provider.as_str() {
        "excel" | "xls" | "xlsx" => io_excel::read_excel_results(path, source)?,
        x => {
            return UnknownProviderSnafu { provider: x }.fail();
        }
    };
    let mut builder = Builder::new();
    for r in results.iter() {
        builder.add_result(r);
    }
    let dataset = builder.build().context(EngineSnafu {})?;
    info!(
        "read_results: {} constituencies, parties: {:?}",
        dataset.len(),
        dataset.parties()
    );
    Ok(dataset)
}

fn write_json(js: &JSValue, path: Option<&String>) -> SwingResult<String> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    match path.map(|s| s.as_str()) {
        None | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(p) => {
            fs::write(p, &pretty).context(WritingOutputSnafu { path: p })?;
            info!("Wrote {}", p);
        }
    }
    Ok(pretty)
}

pub fn run_swing(opts: &RunOptions) -> SwingResult<()> {
    // Paths from the configuration are relative to its directory,
    // paths from the command line are taken as they are.
    let (config, root): (SwingConfig, PathBuf) = match &opts.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (SwingConfig::default(), PathBuf::new()),
    };
    info!("config: {:?}", config);

    let mut source: ResultsSource = match (&opts.input, &config.results_source) {
        (Some(input), Some(rs)) => ResultsSource {
            file_path: input.clone(),
            ..rs.clone()
        },
        (Some(input), None) => ResultsSource::from_path(input),
        (None, Some(rs)) => ResultsSource {
            file_path: io_common::resolve_path(&root, &rs.file_path),
            ..rs.clone()
        },
        (None, None) => {
            return MissingInputSnafu {}.fail();
        }
    };
    if opts.year.is_some() {
        source.year = opts.year;
    }
    if opts.excel_worksheet_name.is_some() {
        source.excel_worksheet_name = opts.excel_worksheet_name.clone();
    }

    let dataset = read_results(&source.file_path, &source)?;
    let swings = merge_swings(&config, &opts.swings)?;
    let projection = project(&dataset, &swings);
    for (party, seats) in projection.after.iter() {
        info!("{:>6} {}", seats, party);
    }

    let summary_js = build_summary_js(
        config.output_settings.contest_name.as_ref(),
        &swings,
        &projection,
    );
    let out_path: Option<String> = match &opts.out {
        Some(p) => Some(p.clone()),
        None => config
            .output_settings
            .output_path
            .as_ref()
            .map(|p| io_common::resolve_path(&root, p)),
    };
    let pretty_js_stats = write_json(&summary_js, out_path.as_ref())?;

    // The map layers, if the boundaries are known.
    let boundaries: Option<BoundariesSource> = match (&opts.boundaries, &config.boundaries_source) {
        (Some(p), Some(bs)) => Some(BoundariesSource {
            file_path: p.clone(),
            ..bs.clone()
        }),
        (Some(p), None) => Some(BoundariesSource {
            file_path: p.clone(),
            code_property: None,
        }),
        (None, Some(bs)) => Some(BoundariesSource {
            file_path: io_common::resolve_path(&root, &bs.file_path),
            ..bs.clone()
        }),
        (None, None) => None,
    };
    let map_out_path: Option<String> = match &opts.map_out {
        Some(p) => Some(p.clone()),
        None => config
            .output_settings
            .map_output_path
            .as_ref()
            .map(|p| io_common::resolve_path(&root, p)),
    };
    match (boundaries, map_out_path) {
        (Some(bs), map_out) => {
            let features = io_geojson::read_boundaries(&bs.file_path, &bs)?;
            let buckets = bucket_by_winner(&projection.adjusted, &features);
            if !buckets.unmatched.is_empty() {
                warn!(
                    "{} boundaries have no matching constituency",
                    buckets.unmatched.len()
                );
            }
            for (bucket, fs) in buckets.buckets.iter() {
                info!("map layer {}: {} boundaries", bucket.label(), fs.len());
            }
            if let Some(p) = map_out {
                let layers_js = io_geojson::build_layers_js(&buckets);
                write_json(&layers_js, Some(&p))?;
            }
        }
        (None, Some(p)) => {
            whatever!("Cannot write the map layers to {}: no boundaries provided", p)
        }
        (None, None) => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &opts.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("The summary matches the reference {}", summary_p);
    }
    Ok(())
}
