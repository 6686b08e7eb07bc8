use crate::swing::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "mapOutputPath")]
    pub map_output_path: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSource {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub year: Option<i64>,
    // Column names, when they differ from the published results.
    #[serde(rename = "codeColumn")]
    pub code_column: Option<String>,
    #[serde(rename = "partyColumn")]
    pub party_column: Option<String>,
    #[serde(rename = "votesColumn")]
    pub votes_column: Option<String>,
    #[serde(rename = "majorityPartyColumn")]
    pub majority_party_column: Option<String>,
    #[serde(rename = "constituencyColumn")]
    pub constituency_column: Option<String>,
    #[serde(rename = "regionColumn")]
    pub region_column: Option<String>,
    #[serde(rename = "countyColumn")]
    pub county_column: Option<String>,
    #[serde(rename = "yearColumn")]
    pub year_column: Option<String>,
}

fn default_provider() -> String {
    "excel".to_string()
}

impl ResultsSource {
    pub fn from_path(path: &str) -> ResultsSource {
        ResultsSource {
            provider: default_provider(),
            file_path: path.to_string(),
            excel_worksheet_name: None,
            year: None,
            code_column: None,
            party_column: None,
            votes_column: None,
            majority_party_column: None,
            constituency_column: None,
            region_column: None,
            county_column: None,
            year_column: None,
        }
    }

    pub fn code_column(&self) -> &str {
        self.code_column.as_deref().unwrap_or("Code")
    }
    pub fn party_column(&self) -> &str {
        self.party_column.as_deref().unwrap_or("Party Abbreviation")
    }
    pub fn votes_column(&self) -> &str {
        self.votes_column.as_deref().unwrap_or("Candidate Votes")
    }
    pub fn majority_party_column(&self) -> &str {
        self.majority_party_column
            .as_deref()
            .unwrap_or("Majority Party")
    }
    pub fn constituency_column(&self) -> &str {
        self.constituency_column.as_deref().unwrap_or("Constituency")
    }
    pub fn region_column(&self) -> &str {
        self.region_column.as_deref().unwrap_or("Region")
    }
    pub fn county_column(&self) -> &str {
        self.county_column.as_deref().unwrap_or("County")
    }
    pub fn year_column(&self) -> &str {
        self.year_column.as_deref().unwrap_or("Year")
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BoundariesSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "codeProperty")]
    pub code_property: Option<String>,
}

impl BoundariesSource {
    pub fn code_property(&self) -> &str {
        self.code_property.as_deref().unwrap_or("id")
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwingConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "resultsSource")]
    pub results_source: Option<ResultsSource>,
    #[serde(rename = "boundariesSource")]
    pub boundaries_source: Option<BoundariesSource>,
    #[serde(default)]
    pub swings: BTreeMap<String, f64>,
}

pub fn parse_config(contents: &str, path: &str) -> SwingResult<SwingConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu { path })
}

pub fn read_config(path: &str) -> SwingResult<SwingConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config = parse_config(&contents, path)?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> SwingResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}
