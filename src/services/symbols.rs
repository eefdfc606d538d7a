//! Symbol list parsing from uploaded CSV files.

use crate::error::Result;
use std::io::Read;
use std::path::Path;

/// Read ticker symbols from CSV.
///
/// Uses the `Symbol` column (header matched case-insensitively after
/// trimming) or the first column when there is none. Values are trimmed and
/// blanks dropped; order and duplicates are kept.
pub fn read_symbols<R: Read>(input: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("symbol"))
        .unwrap_or(0);

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column) {
            let value = value.trim();
            if !value.is_empty() {
                symbols.push(value.to_string());
            }
        }
    }

    Ok(symbols)
}

/// Read symbols from a CSV file on disk.
pub fn read_symbols_from_path(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    read_symbols(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_column() {
        let csv = "Name,Symbol\nApple,AAPL\nMicrosoft, MSFT \n";
        assert_eq!(read_symbols(csv.as_bytes()).unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_symbol_column_case_insensitive() {
        let csv = "name, SYMBOL \nTesla,TSLA\n";
        assert_eq!(read_symbols(csv.as_bytes()).unwrap(), vec!["TSLA"]);
    }

    #[test]
    fn test_first_column_fallback() {
        let csv = "Ticker,Weight\nNVDA,0.5\nAMD,0.5\n";
        assert_eq!(read_symbols(csv.as_bytes()).unwrap(), vec!["NVDA", "AMD"]);
    }

    #[test]
    fn test_blank_values_dropped() {
        let csv = "Symbol\nAAPL\n\n  \nGOOG\n";
        assert_eq!(read_symbols(csv.as_bytes()).unwrap(), vec!["AAPL", "GOOG"]);
    }

    #[test]
    fn test_short_rows_skipped() {
        let csv = "Name,Symbol\nOnlyName\nApple,AAPL\n";
        assert_eq!(read_symbols(csv.as_bytes()).unwrap(), vec!["AAPL"]);
    }

    #[test]
    fn test_header_only() {
        assert!(read_symbols("Symbol\n".as_bytes()).unwrap().is_empty());
    }
}
