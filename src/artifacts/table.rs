use serde::Serialize;
use thiserror::Error;

/// Rows shown when no explicit preview size is requested.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing header row")]
    MissingHeader,
}

/// The leading rows of an output table, with its full column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Data rows in the stored table, not counting the header.
    pub total_rows: usize,
}

impl OutputPreview {
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Parses a CSV table with a header row and keeps at most `max_rows` rows.
    ///
    /// The whole table is parsed, so a malformed row anywhere fails the preview.
    pub fn from_csv(bytes: &[u8], max_rows: usize) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(TableError::MissingHeader);
        }

        let mut rows = Vec::with_capacity(max_rows.min(64));
        let mut total_rows = 0;
        for record in reader.records() {
            let record = record?;
            if rows.len() < max_rows {
                rows.push(record.iter().map(str::to_string).collect());
            }
            total_rows += 1;
        }

        Ok(Self {
            headers,
            rows,
            total_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> String {
        let mut csv = String::from("name,price,rating\n");
        for i in 0..rows {
            csv.push_str(&format!("laptop {i},{}.99,4.{}\n", 500 + i, i % 10));
        }
        csv
    }

    #[test]
    fn short_table_is_returned_whole() {
        let preview = OutputPreview::from_csv(table(3).as_bytes(), 10).unwrap();
        assert_eq!(preview.headers, vec!["name", "price", "rating"]);
        assert_eq!(preview.rows.len(), 3);
        assert_eq!(preview.total_rows, 3);
        assert!(!preview.is_truncated());
    }

    #[test]
    fn long_table_is_cut_in_original_order() {
        let preview = OutputPreview::from_csv(table(50).as_bytes(), 10).unwrap();
        assert_eq!(preview.rows.len(), 10);
        assert_eq!(preview.total_rows, 50);
        assert!(preview.is_truncated());
        assert_eq!(preview.rows[0][0], "laptop 0");
        assert_eq!(preview.rows[9][0], "laptop 9");
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let csv = "title,tags\n\"Gaming, 16 inch\",\"a,b\"\n";
        let preview = OutputPreview::from_csv(csv.as_bytes(), 10).unwrap();
        assert_eq!(preview.rows, vec![vec!["Gaming, 16 inch", "a,b"]]);
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let preview = OutputPreview::from_csv(b"name,price\n", 10).unwrap();
        assert!(preview.rows.is_empty());
        assert_eq!(preview.total_rows, 0);
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = OutputPreview::from_csv(b"", 10).unwrap_err();
        assert!(matches!(err, TableError::MissingHeader));
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let csv = "name,price\nlaptop,999\nbroken\n";
        let err = OutputPreview::from_csv(csv.as_bytes(), 1).unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let bytes = b"name,price\n\xff\xfe,1\n";
        let err = OutputPreview::from_csv(bytes, 10).unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }
}
