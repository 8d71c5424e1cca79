use crate::result_set::ResultSet;
use crate::spatial::wkb_to_wkt;
use rusqlite::types::Value;

/// Render a cell for the console. BLOBs holding WKB are shown as WKT.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.clone(),
        Value::Blob(bytes) => {
            wkb_to_wkt(bytes).unwrap_or_else(|_| format!("<blob {} bytes>", bytes.len()))
        }
    }
}

/// Tab-delimited grid: a header line with the column names, then one line per row.
pub fn format_grid(result: &ResultSet) -> String {
    let mut grid = result.column_names().collect::<Vec<&str>>().join("\t");
    grid.push('\n');
    for row in result.rows() {
        let cells = row.iter().map(format_value).collect::<Vec<String>>();
        grid.push_str(&cells.join("\t"));
        grid.push('\n');
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::{format_grid, format_value};
    use crate::helper::SqliteHelper;
    use crate::spatial::geometry_to_wkb;
    use geo_types::Point;
    use rusqlite::types::Value;

    #[test]
    fn formats_each_value_kind() -> crate::Result<()> {
        assert_eq!(format_value(&Value::Null), "NULL");
        assert_eq!(format_value(&Value::Integer(-3)), "-3");
        assert_eq!(format_value(&Value::Real(0.5)), "0.5");
        assert_eq!(format_value(&Value::Text("a b".to_string())), "a b");
        assert_eq!(format_value(&Value::Blob(vec![1, 2, 3])), "<blob 3 bytes>");

        let wkb = geometry_to_wkb(&Point::new(2.0, 3.0))?;
        assert!(format_value(&Value::Blob(wkb)).starts_with("POINT"));
        Ok(())
    }

    #[test]
    fn formats_query_results_as_tab_separated_lines() -> crate::Result<()> {
        let helper = SqliteHelper::open_in_memory()?;
        let result = helper.select(
            "SELECT 1 AS id, 'a' AS name, NULL AS note UNION ALL SELECT 2, 'b', 1.5",
            [],
        )?;

        assert_eq!(
            format_grid(&result),
            "id\tname\tnote\n1\ta\tNULL\n2\tb\t1.5\n"
        );
        Ok(())
    }
}
