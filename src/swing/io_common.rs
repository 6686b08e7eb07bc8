use calamine::DataType;
use std::collections::HashMap;
use std::path::Path;

use crate::swing::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Paths in a configuration file are relative to the directory of that file.
pub fn resolve_path(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        let full: PathBuf = root.join(p);
        full.display().to_string()
    }
}

/// The text content of a cell. Blank cells have no content.
pub fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => None,
        DataType::String(s) => Some(s.trim().to_string()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The numeric content of a cell. Numbers stored as text are accepted, with
/// thousands separators.
pub fn cell_to_f64(cell: &DataType) -> Option<f64> {
    match cell {
        DataType::Float(f) => Some(*f),
        DataType::Int(i) => Some(*i as f64),
        DataType::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

pub fn is_blank(row: &[DataType]) -> bool {
    row.iter().all(|c| cell_to_string(c).is_none())
}

/// Given the header of a file (names of each of the columns), and the names of the required columns,
/// finds the mapping from each name to a column index position.
pub fn get_col_index_mapping(
    req_col_names: &[&str],
    header: &[DataType],
) -> SwingResult<Vec<(usize, String)>> {
    let col_names = header_positions(header);
    debug!("get_col_index_mapping: col_names: {:?}", col_names);

    let mut col_indexes: Vec<(usize, String)> = Vec::new();
    for cname in req_col_names {
        let idx = col_names
            .get(*cname)
            .context(ExcelMissingColumnSnafu { column: *cname })?;
        col_indexes.push((*idx, cname.to_string()));
    }
    Ok(col_indexes)
}

/// The position of a column that may be absent.
pub fn get_optional_col_index(col_name: &str, header: &[DataType]) -> Option<usize> {
    header_positions(header).get(col_name).cloned()
}

fn header_positions(header: &[DataType]) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| cell_to_string(x).map(|s| (s, idx)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_conversions() {
        assert_eq!(
            cell_to_string(&DataType::String(" Aldershot ".to_string())),
            Some("Aldershot".to_string())
        );
        assert_eq!(cell_to_string(&DataType::String("  ".to_string())), None);
        assert_eq!(cell_to_string(&DataType::Float(2017.0)), Some("2017".to_string()));
        assert_eq!(cell_to_string(&DataType::Empty), None);
        assert_eq!(cell_to_f64(&DataType::Int(26950)), Some(26950.0));
        assert_eq!(
            cell_to_f64(&DataType::String("26,950".to_string())),
            Some(26950.0)
        );
        assert_eq!(cell_to_f64(&DataType::String("n/a".to_string())), None);
        assert_eq!(cell_to_f64(&DataType::Empty), None);
    }

    #[test]
    fn maps_header_columns() {
        let header = vec![
            DataType::String("Year".to_string()),
            DataType::Empty,
            DataType::String("Code".to_string()),
            DataType::String("Party Abbreviation".to_string()),
        ];
        let m = get_col_index_mapping(&["Party Abbreviation", "Code"], &header).unwrap();
        assert_eq!(
            m,
            vec![(3, "Party Abbreviation".to_string()), (2, "Code".to_string())]
        );
        assert_eq!(get_optional_col_index("Year", &header), Some(0));
        assert_eq!(get_optional_col_index("County", &header), None);
        assert!(matches!(
            get_col_index_mapping(&["Candidate Votes"], &header),
            Err(SwingError::ExcelMissingColumn { .. })
        ));
    }

    #[test]
    fn file_names_and_paths() {
        assert_eq!(simplify_file_name("data/results.xls"), "results.xls");
        assert_eq!(
            resolve_path(Path::new("data"), "results.xls"),
            Path::new("data").join("results.xls").display().to_string()
        );
        assert_eq!(resolve_path(Path::new("data"), "/tmp/x.xls"), "/tmp/x.xls");
    }
}
