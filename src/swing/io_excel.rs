// Reading the election results from Excel spreadsheets (.xls and .xlsx).

use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::swing::{
    io_common::{
        cell_to_f64, cell_to_string, get_col_index_mapping, get_optional_col_index, is_blank,
        simplify_file_name,
    },
    *,
};

pub fn read_excel_results(path: &str, source: &ResultsSource) -> SwingResult<Vec<CandidateResult>> {
    let wrange = get_range(path, source)?;
    info!(
        "read_excel_results: {}: {} rows",
        simplify_file_name(path),
        wrange.height()
    );
    parse_result_rows(wrange.rows(), source)
}

/// Reads the rows of a results sheet. The first row is the header.
///
/// Rows of other election years are skipped when a year is selected. Blank rows are skipped.
pub fn parse_result_rows<'a>(
    mut rows: impl Iterator<Item = &'a [DataType]>,
    source: &ResultsSource,
) -> SwingResult<Vec<CandidateResult>> {
    let header = rows.next().context(EmptyExcelSnafu {})?;
    debug!("parse_result_rows: header: {:?}", header);

    let required = get_col_index_mapping(
        &[
            source.code_column(),
            source.party_column(),
            source.votes_column(),
        ],
        header,
    )?;
    let (code_idx, party_idx, votes_idx) = (required[0].0, required[1].0, required[2].0);
    let majority_idx = get_optional_col_index(source.majority_party_column(), header);
    let name_idx = get_optional_col_index(source.constituency_column(), header);
    let region_idx = get_optional_col_index(source.region_column(), header);
    let county_idx = get_optional_col_index(source.county_column(), header);
    let year_idx = match source.year {
        Some(_) => Some(
            get_optional_col_index(source.year_column(), header).context(
                ExcelMissingColumnSnafu {
                    column: source.year_column(),
                },
            )?,
        ),
        None => None,
    };

    let text_at = |row: &[DataType], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i)).and_then(cell_to_string)
    };

    let mut res: Vec<CandidateResult> = Vec::new();
    let mut skipped_years: usize = 0;
    for (idx, row) in rows.enumerate() {
        // The header is line 1.
        let lineno = (idx + 2) as u64;
        if is_blank(row) {
            debug!("parse_result_rows: line {}: blank row", lineno);
            continue;
        }

        if let (Some(year), Some(y_idx)) = (source.year, year_idx) {
            let row_year = row.get(y_idx).and_then(cell_to_f64).map(|y| y as i64);
            if row_year != Some(year) {
                skipped_years += 1;
                continue;
            }
        }

        let code = text_at(row, Some(code_idx)).context(ExcelWrongCellTypeSnafu {
            lineno,
            column: source.code_column(),
            content: format!("{:?}", row.get(code_idx)),
        })?;
        let party = text_at(row, Some(party_idx)).context(ExcelWrongCellTypeSnafu {
            lineno,
            column: source.party_column(),
            content: format!("{:?}", row.get(party_idx)),
        })?;
        let votes: f64 = match row.get(votes_idx) {
            None | Some(DataType::Empty) => {
                debug!("parse_result_rows: line {}: no votes, using 0", lineno);
                0.0
            }
            Some(cell) => cell_to_f64(cell).context(ExcelWrongCellTypeSnafu {
                lineno,
                column: source.votes_column(),
                content: format!("{:?}", cell),
            })?,
        };

        res.push(CandidateResult {
            code,
            constituency_name: text_at(row, name_idx),
            region: text_at(row, region_idx),
            county: text_at(row, county_idx),
            party,
            votes,
            majority_party: text_at(row, majority_idx),
        });
    }
    if skipped_years > 0 {
        info!(
            "parse_result_rows: skipped {} rows from other years than {:?}",
            skipped_years, source.year
        );
    }
    Ok(res)
}

fn get_range(path: &str, source: &ResultsSource) -> SwingResult<Range<DataType>> {
    let worksheet_name_o = source.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &worksheet_name_o
    );
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })
    } else {
        let all_worksheets = workbook.sheet_names().to_vec();
        if all_worksheets.len() > 1 {
            warn!(
                "get_range: {} has {} worksheets, using the first one: {:?}",
                path,
                all_worksheets.len(),
                all_worksheets.first()
            );
        }
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })
    }
}
