use crate::error::{Error, Result};
use serde_json::Value as JsonValue;
use std::io::Read;

/// A single cell of a [`RecordTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV field. Empty fields and NaN markers are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            Ok(_) => Value::Missing,
            Err(_) if trimmed.eq_ignore_ascii_case("na") => Value::Missing,
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Key used for facet levels. Integral numbers print without a fraction
    /// so a code column reads `1`, `2`, ... rather than `1.0`.
    pub fn category_key(&self) -> Option<String> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Missing => None,
        }
    }
}

/// In-memory table of uniform rows. Every row holds one value per header.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(Error::unavailable(
                "<memory>",
                format!("row {} has {} fields, expected {}", idx + 1, row.len(), headers.len()),
            ));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_ok()
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    /// Column values in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Add a derived column, replacing any column of the same name.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(Error::unavailable(
                "<memory>",
                format!(
                    "derived column '{}' has {} values for {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            ));
        }
        match self.column_index(name) {
            Ok(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            Err(_) => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(self)
    }

    /// Parse CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R, source_id: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| Error::unavailable(source_id, format!("failed to read CSV headers: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() {
            return Err(Error::unavailable(source_id, "CSV has no columns"));
        }

        let mut rows = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| {
                Error::unavailable(source_id, format!("failed to parse CSV row {}: {e}", row_idx + 1))
            })?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        if rows.is_empty() {
            return Err(Error::unavailable(source_id, "CSV must contain at least one data row"));
        }

        Ok(Self { headers, rows })
    }

    /// Create a table from a JSON array of objects. Headers come from the first object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let source_id = "<json>";
        let array = value
            .as_array()
            .ok_or_else(|| Error::unavailable(source_id, "input data must be a JSON array of objects"))?;

        let first_obj = array
            .first()
            .ok_or_else(|| Error::unavailable(source_id, "input data array is empty"))?
            .as_object()
            .ok_or_else(|| Error::unavailable(source_id, "items in array must be objects"))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| Error::unavailable(source_id, "items in array must be objects"))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::parse(s),
                    Some(JsonValue::Number(n)) => n.as_f64().map_or(Value::Missing, Value::Number),
                    Some(JsonValue::Bool(b)) => Value::Text(b.to_string()),
                    Some(JsonValue::Null) | None => Value::Missing,
                    _ => {
                        return Err(Error::unavailable(
                            source_id,
                            format!("unsupported value type for field '{header}'"),
                        ))
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("12.5"), Value::Number(12.5));
        assert_eq!(Value::parse(" 3 "), Value::Number(3.0));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::parse("NA"), Value::Missing);
        assert_eq!(Value::parse("Male"), Value::Text("Male".to_string()));
    }

    #[test]
    fn test_category_key() {
        assert_eq!(Value::Number(2.0).category_key(), Some("2".to_string()));
        assert_eq!(Value::Number(2.5).category_key(), Some("2.5".to_string()));
        assert_eq!(Value::Text("Female".into()).category_key(), Some("Female".to_string()));
        assert_eq!(Value::Missing.category_key(), None);
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "leg,arm,gender\n30,20,1\n35,,2\n";
        let table = RecordTable::from_csv_reader(csv.as_bytes(), "test").unwrap();
        assert_eq!(table.headers(), &["leg", "arm", "gender"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, 1), &Value::Missing);
        assert_eq!(table.value(0, 0), &Value::Number(30.0));
    }

    #[test]
    fn test_from_csv_reader_no_rows() {
        let result = RecordTable::from_csv_reader("x,y\n".as_bytes(), "empty.csv");
        assert!(matches!(result, Err(Error::DataUnavailable { .. })));
    }

    #[test]
    fn test_from_csv_reader_ragged_row() {
        let result = RecordTable::from_csv_reader("x,y\n1,2\n3\n".as_bytes(), "ragged.csv");
        assert!(matches!(result, Err(Error::DataUnavailable { .. })));
    }

    #[test]
    fn test_column_index_case_insensitive() {
        let table = RecordTable::from_csv_reader("BMXLEG,BMXARML\n1,2\n".as_bytes(), "t").unwrap();
        assert_eq!(table.column_index("bmxleg").unwrap(), 0);
        assert!(matches!(table.column_index("nope"), Err(Error::ColumnNotFound(c)) if c == "nope"));
    }

    #[test]
    fn test_with_column_appends_and_replaces() {
        let table = RecordTable::from_csv_reader("a\n1\n2\n".as_bytes(), "t").unwrap();
        let table = table
            .with_column("b", vec![Value::Text("x".into()), Value::Missing])
            .unwrap();
        assert_eq!(table.headers().len(), 2);
        let table = table
            .with_column("B", vec![Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.value(1, 1), &Value::Number(2.0));
    }

    #[test]
    fn test_with_column_length_mismatch() {
        let table = RecordTable::from_csv_reader("a\n1\n2\n".as_bytes(), "t").unwrap();
        assert!(table.with_column("b", vec![Value::Missing]).is_err());
    }

    #[test]
    fn test_from_json() {
        let value = json!([
            {"leg": 30, "gender": "Male"},
            {"leg": null, "gender": "Female"}
        ]);
        let table = RecordTable::from_json(&value).unwrap();
        assert_eq!(table.len(), 2);
        let leg = table.column_index("leg").unwrap();
        assert_eq!(table.value(0, leg), &Value::Number(30.0));
        assert_eq!(table.value(1, leg), &Value::Missing);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(RecordTable::from_json(&json!({"a": 1})).is_err());
        assert!(RecordTable::from_json(&json!([])).is_err());
    }
}
