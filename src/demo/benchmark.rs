use super::tables::{DEMO_SRID, GEOMETRY_COLUMN, LINES_TABLE};
use crate::error::Result;
use crate::helper::SqliteHelper;
use crate::sql::{quote_identifier, quote_literal};
use rusqlite::named_params;
use std::time::{Duration, Instant};
use tracing::info;

/// Search window around Sydney.
pub const SEARCH_WINDOW_WKT: &str = "POLYGON((151 -34, 152 -34, 152 -33, 151 -33, 151 -34))";

#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkReport {
    /// Bounds of the search window as SpatiaLite parsed it.
    pub window: [f64; 4],
    /// Lines intersecting the window.
    pub hits: i64,
    pub elapsed: Duration,
}

pub(crate) fn sql_window_bounds() -> String {
    format!(
        "SELECT ST_MinX(g) AS min_x, ST_MinY(g) AS min_y, ST_MaxX(g) AS max_x, ST_MaxY(g) AS max_y
FROM (SELECT GeomFromText(@window, {DEMO_SRID}) AS g);"
    )
}

/// `ST_Intersects` count restricted to the R*Tree candidates of the
/// `SpatialIndex` virtual table.
pub(crate) fn sql_intersection_count(table: &str, column: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {table_ident}
WHERE ST_Intersects({column_ident}, GeomFromText(@window, {DEMO_SRID}))
  AND ROWID IN (
    SELECT ROWID FROM SpatialIndex
    WHERE f_table_name = {table_literal}
      AND f_geometry_column = {column_literal}
      AND search_frame = GeomFromText(@window, {DEMO_SRID})
  );",
        table_ident = quote_identifier(table),
        column_ident = quote_identifier(column),
        table_literal = quote_literal(table),
        column_literal = quote_literal(column),
    )
}

/// Time an indexed intersection query against the demo line table.
pub fn run_benchmark(helper: &SqliteHelper) -> Result<BenchmarkReport> {
    let bounds = helper.select(&sql_window_bounds(), named_params! { "@window": SEARCH_WINDOW_WKT })?;
    let window: [f64; 4] = [
        bounds.get(0, "min_x")?,
        bounds.get(0, "min_y")?,
        bounds.get(0, "max_x")?,
        bounds.get(0, "max_y")?,
    ];

    let sql = sql_intersection_count(LINES_TABLE, GEOMETRY_COLUMN);
    let start = Instant::now();
    let hits: i64 = helper.execute_scalar_as(&sql, named_params! { "@window": SEARCH_WINDOW_WKT })?;
    let elapsed = start.elapsed();

    info!(hits, elapsed_ms = elapsed.as_millis() as u64, "spatial query finished");
    Ok(BenchmarkReport {
        window,
        hits,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::{SEARCH_WINDOW_WKT, run_benchmark, sql_intersection_count};
    use crate::helper::SqliteHelper;
    use rusqlite::functions::FunctionFlags;

    #[test]
    fn intersection_query_filters_through_the_spatial_index() {
        let sql = sql_intersection_count("demo_lines", "geom");
        assert!(sql.starts_with("SELECT COUNT(*) FROM `demo_lines`"));
        assert!(sql.contains("ST_Intersects(`geom`, GeomFromText(@window, 4326))"));
        assert!(sql.contains("WHERE f_table_name = 'demo_lines'"));
        assert!(sql.contains("AND f_geometry_column = 'geom'"));
    }

    #[test]
    fn counts_index_candidates_that_intersect() -> crate::Result<()> {
        let helper = SqliteHelper::open_in_memory()?;
        let conn = helper.connection();
        conn.create_scalar_function("GeomFromText", 2, FunctionFlags::SQLITE_UTF8, |ctx| {
            ctx.get::<String>(0)
        })?;
        // Every line is a hit unless its geometry is 'far'.
        conn.create_scalar_function("ST_Intersects", 2, FunctionFlags::SQLITE_UTF8, |ctx| {
            let geom: String = ctx.get(0)?;
            Ok(i64::from(geom != "far"))
        })?;
        for (name, value) in [("ST_MinX", 151.0), ("ST_MinY", -34.0), ("ST_MaxX", 152.0), ("ST_MaxY", -33.0)] {
            conn.create_scalar_function(name, 1, FunctionFlags::SQLITE_UTF8, move |_| Ok(value))?;
        }
        helper.execute_batch(&format!(
            "CREATE TABLE demo_lines (id INTEGER PRIMARY KEY, geom TEXT);
             INSERT INTO demo_lines VALUES (1, 'near'), (2, 'far'), (3, 'near'), (4, 'near');
             CREATE TABLE SpatialIndex (f_table_name TEXT, f_geometry_column TEXT, search_frame TEXT);
             INSERT INTO SpatialIndex (rowid, f_table_name, f_geometry_column, search_frame)
             VALUES (1, 'demo_lines', 'geom', '{SEARCH_WINDOW_WKT}'),
                    (2, 'demo_lines', 'geom', '{SEARCH_WINDOW_WKT}'),
                    (3, 'demo_lines', 'geom', '{SEARCH_WINDOW_WKT}');"
        ))?;

        let report = run_benchmark(&helper)?;
        assert_eq!(report.window, [151.0, -34.0, 152.0, -33.0]);
        assert_eq!(report.hits, 2);
        Ok(())
    }
}
