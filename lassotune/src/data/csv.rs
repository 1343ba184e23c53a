// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::fs::File;
use std::path::Path;

use super::{Column, DataLoader, Dataset};
use crate::errors::DataError;

/// Loads a headered CSV file. Empty cells and `NA` are treated as missing.
pub struct CsvLoader;

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("na")
}

fn load_csv_common<P: AsRef<Path>>(path: P, target: &str) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(DataError::EmptyFile);
    }

    // Parse all fields as strings initially
    let mut data: Vec<Vec<String>> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if row.len() != headers.len() {
            return Err(DataError::InconsistentColumns {
                row: i + 2,
                actual: row.len(),
                expected: headers.len(),
            });
        }
        data.push(row);
    }

    if data.is_empty() {
        return Err(DataError::EmptyFile);
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let cells = data.iter().map(|row| row[col].as_str());
            // A column is numeric when every present cell parses as f64
            let numeric = data
                .iter()
                .map(|row| row[col].as_str())
                .filter(|cell| !is_missing(cell))
                .all(|cell| cell.parse::<f64>().is_ok());
            if numeric {
                Column::numeric(
                    name.clone(),
                    cells.map(|cell| if is_missing(cell) { None } else { cell.parse().ok() }).collect(),
                )
            } else {
                Column::categorical(
                    name.clone(),
                    cells
                        .map(|cell| if is_missing(cell) { None } else { Some(cell.to_string()) })
                        .collect(),
                )
            }
        })
        .collect();

    Dataset::new(columns, target)
}

impl DataLoader for CsvLoader {
    type Error = DataError;

    fn load<P: AsRef<Path>>(path: P, target: &str) -> Result<Dataset, Self::Error> {
        load_csv_common(path, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{load_data, ColumnData, Role};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_load_infers_column_types() {
        let csv_content = "interest_rate,annual_income,homeownership\n\
                           10.9,90000,MORTGAGE\n\
                           9.92,40000,RENT\n\
                           26.3,40000,RENT\n";
        let temp_file = create_temp_csv(csv_content);

        let ds = load_data::<CsvLoader, _>(temp_file.path(), "interest_rate")
            .expect("Failed to load CSV");

        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.column(0).role(), Role::Target);
        assert_eq!(ds.column(1).role(), Role::Numeric);
        assert_eq!(ds.column(2).role(), Role::Categorical);
        assert_eq!(ds.targets().unwrap().to_vec(), vec![10.9, 9.92, 26.3]);
    }

    #[test]
    fn test_load_missing_cells() {
        let csv_content = "y,x,c\n1.0,,a\n2.0,NA,\n3.0,4.5,b\n";
        let temp_file = create_temp_csv(csv_content);

        let ds = load_data::<CsvLoader, _>(temp_file.path(), "y").expect("Failed to load CSV");

        assert_eq!(ds.column(1).data(), &ColumnData::Numeric(vec![None, None, Some(4.5)]));
        assert_eq!(
            ds.column(2).data(),
            &ColumnData::Categorical(vec![Some("a".into()), None, Some("b".into())])
        );
    }

    #[test]
    fn test_load_empty_file() {
        let temp_file = create_temp_csv("");
        let result = load_data::<CsvLoader, _>(temp_file.path(), "y");
        assert!(matches!(result, Err(DataError::EmptyFile)));
    }

    #[test]
    fn test_load_headers_only() {
        let temp_file = create_temp_csv("y,x\n");
        let result = load_data::<CsvLoader, _>(temp_file.path(), "y");
        assert!(matches!(result, Err(DataError::EmptyFile)));
    }

    #[test]
    fn test_load_inconsistent_columns() {
        let temp_file = create_temp_csv("y,x\n1.0,2.0\n2.0,3.0,extra\n");
        let result = load_data::<CsvLoader, _>(temp_file.path(), "y");
        assert!(matches!(
            result,
            Err(DataError::InconsistentColumns { row: 3, actual: 3, expected: 2 })
        ));
    }

    #[test]
    fn test_load_categorical_target() {
        let temp_file = create_temp_csv("grade,x\nA,1\nB,2\n");
        let result = load_data::<CsvLoader, _>(temp_file.path(), "grade");
        assert!(matches!(result, Err(DataError::NonNumericTarget(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_data::<CsvLoader, _>("nonexistent.csv", "y");
        assert!(matches!(result, Err(DataError::FileOpen(_))));
    }
}
