use crate::error::{HelperError, Result};
use rusqlite::types::{FromSql, FromSqlError, Type, Value, ValueRef};

/// Name and declared type of a result column.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultColumn {
    pub name: String,
    /// `None` for expressions and for columns without a declared type.
    pub decl_type: Option<String>,
}

/// Fully materialized query result.
///
/// Every row is held in memory; use [`crate::SqliteHelper::connection`] and a
/// prepared statement directly when the result is too large for that.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub(crate) columns: Vec<ResultColumn>,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
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

    /// Position of a column, matched ASCII case-insensitively like SQLite identifiers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Raw value of a cell, `None` if the row or column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Read a cell using rusqlite's `FromSql` conversion.
    ///
    /// `NULL` converts only into `Option<T>`.
    pub fn get<T: FromSql>(&self, row: usize, column: &str) -> Result<T> {
        let value = self.value(row, column).ok_or_else(|| HelperError::MissingColumn {
            column: column.to_string(),
        })?;
        value_as(value, column)
    }
}

pub(crate) fn value_as<T: FromSql>(value: &Value, column: &str) -> Result<T> {
    let value_ref = ValueRef::from(value);
    FromSql::column_result(value_ref).map_err(|err| match err {
        FromSqlError::InvalidType => HelperError::ValueTypeMismatch {
            column: column.to_string(),
            expected: std::any::type_name::<T>(),
            actual: type_name(value_ref.data_type()),
        },
        FromSqlError::OutOfRange(_) => HelperError::ValueOutOfRange {
            column: column.to_string(),
        },
        other => HelperError::Sql(rusqlite::Error::FromSqlConversionFailure(
            0,
            value_ref.data_type(),
            Box::new(other),
        )),
    })
}

fn type_name(ty: Type) -> &'static str {
    match ty {
        Type::Null => "NULL",
        Type::Integer => "INTEGER",
        Type::Real => "REAL",
        Type::Text => "TEXT",
        Type::Blob => "BLOB",
    }
}

#[cfg(test)]
mod tests {
    use super::{ResultColumn, ResultSet};
    use crate::error::HelperError;
    use rusqlite::types::Value;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec![
                ResultColumn {
                    name: "id".to_string(),
                    decl_type: Some("integer".to_string()),
                },
                ResultColumn {
                    name: "Name".to_string(),
                    decl_type: Some("text".to_string()),
                },
            ],
            rows: vec![
                vec![Value::Integer(1), Value::Text("a".to_string())],
                vec![Value::Integer(300), Value::Null],
            ],
        }
    }

    #[test]
    fn reads_typed_cells_case_insensitively() -> crate::Result<()> {
        let rs = sample();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.column_index("name"), Some(1));

        let id: i64 = rs.get(0, "ID")?;
        let name: String = rs.get(0, "name")?;
        let missing: Option<String> = rs.get(1, "name")?;
        assert_eq!(id, 1);
        assert_eq!(name, "a");
        assert_eq!(missing, None);
        Ok(())
    }

    #[test]
    fn reports_conversion_failures() {
        let rs = sample();

        match rs.get::<i64>(0, "name") {
            Err(HelperError::ValueTypeMismatch { column, actual, .. }) => {
                assert_eq!(column, "name");
                assert_eq!(actual, "TEXT");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            rs.get::<u8>(1, "id"),
            Err(HelperError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            rs.get::<i64>(0, "nope"),
            Err(HelperError::MissingColumn { .. })
        ));
    }
}
