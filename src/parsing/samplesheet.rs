//! Raw transcription of CASAVA sample sheets.
//!
//! Rows are kept as read; no column is interpreted.

use std::path::Path;

use crate::parsing::ParseError;

/// Sample sheet rows, header row included
pub type SampleSheetRows = Vec<Vec<String>>;

/// Read every row of a sample sheet
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or `ParseError::Csv`
/// if it is not valid CSV.
pub fn parse_samplesheet_file(path: &Path) -> Result<SampleSheetRows, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_samplesheet_text(&content)
}

/// Read every row of sample sheet text
///
/// # Errors
///
/// Returns `ParseError::Csv` if the text is not valid CSV.
pub fn parse_samplesheet_text(text: &str) -> Result<SampleSheetRows, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_samplesheet_text() {
        let text = "FCID,Lane,SampleID,SampleRef,Index,Description,Control,Recipe,Operator,SampleProject
C0UUUACXX,1,P1_101,hg19,ACAGTG,,N,R1,JD,J_Doe_12_01
C0UUUACXX,2,P1_102,hg19,GCCAAT,\"a, b\",N,R1,JD
";
        let rows = parse_samplesheet_text(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "FCID");
        assert_eq!(rows[1][4], "ACAGTG");
        assert_eq!(rows[2][5], "a, b");
        assert_eq!(rows[2].len(), 9);
    }
}
