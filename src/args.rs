use clap::Parser;

/// This is a what-if seat projection program for first-past-the-post elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the inputs, the swings and the outputs.
    /// See the manual of the swing_engine crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing a summary in JSON format. If provided, swingometer will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the map layers will be written in JSON format to the given
    /// location. Requires the boundaries.
    #[clap(long, value_parser)]
    pub map_out: Option<String>,

    /// (file path or empty) The spreadsheet with the election results. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path or empty) The GeoJSON file with the constituency boundaries.
    #[clap(short, long, value_parser)]
    pub boundaries: Option<String>,

    /// (PARTY=PERCENT, repeatable) The share of the voters of a party that move to the new party,
    /// for example --swing C=10 --swing Lab=5. Overrides the swing of the same party in the configuration.
    #[clap(short, long, value_parser)]
    pub swing: Vec<String>,

    /// If specified, only the results of this election year are used.
    #[clap(long, value_parser)]
    pub year: Option<i64>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
