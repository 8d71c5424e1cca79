use crate::error::Result;
use crate::helper::SqliteHelper;
use crate::sql::{escape, quote_identifier};
use crate::types::{Column, Table};
use tracing::warn;
use wkb::reader::{Dimension, GeometryType};

pub const DEMO_SRID: i32 = 4326;
pub const GEOMETRY_COLUMN: &str = "geom";
pub const POINTS_TABLE: &str = "demo_points";
pub const LINES_TABLE: &str = "demo_lines";
pub const POLYGONS_TABLE: &str = "demo_polygons";

struct DemoTable {
    name: &'static str,
    geometry_type: GeometryType,
    // (name, WKT)
    samples: &'static [(&'static str, &'static str)],
}

const DEMO_TABLES: [DemoTable; 3] = [
    DemoTable {
        name: POINTS_TABLE,
        geometry_type: GeometryType::Point,
        samples: &[
            ("Brisbane", "POINT(153.0251 -27.4698)"),
            ("Sydney", "POINT(151.2093 -33.8688)"),
            ("Melbourne", "POINT(144.9631 -37.8136)"),
        ],
    },
    DemoTable {
        name: LINES_TABLE,
        geometry_type: GeometryType::LineString,
        samples: &[
            (
                "Brisbane-Sydney",
                "LINESTRING(153.0251 -27.4698, 151.2093 -33.8688)",
            ),
            (
                "Sydney-Melbourne",
                "LINESTRING(151.2093 -33.8688, 149.1300 -35.2809, 144.9631 -37.8136)",
            ),
        ],
    },
    DemoTable {
        name: POLYGONS_TABLE,
        geometry_type: GeometryType::Polygon,
        samples: &[
            (
                "Brisbane box",
                "POLYGON((152.5 -28, 153.5 -28, 153.5 -27, 152.5 -27, 152.5 -28))",
            ),
            (
                "Sydney's triangle",
                "POLYGON((150.5 -34.5, 152 -34.5, 151.2 -33, 150.5 -34.5))",
            ),
        ],
    },
];

/// Schema shared by the demo tables; the geometry column is added by SpatiaLite.
pub fn demo_table_schema(name: &str) -> Table {
    Table::new(name)
        .column(Column::auto_increment("id"))
        .column(Column::new("name"))
}

/// Raw INSERT embedding `GeomFromText` in the VALUES clause.
pub(crate) fn sample_insert_sql(table: &str, name: &str, wkt: &str) -> String {
    format!(
        "INSERT INTO {} (`name`, {}) VALUES ('{}', GeomFromText('{}', {DEMO_SRID}));",
        quote_identifier(table),
        quote_identifier(GEOMETRY_COLUMN),
        escape(name),
        escape(wkt),
    )
}

/// Create the point, line and polygon demo tables with a spatial index and a
/// few sample rows each, in one transaction.
///
/// Returns the number of sample rows inserted per table. Geometry columns
/// that are already registered are left alone, so running it again only adds
/// more sample rows.
pub fn create_demo_tables(helper: &SqliteHelper) -> Result<Vec<(&'static str, usize)>> {
    helper.begin_transaction()?;
    match create_all(helper) {
        Ok(summary) => {
            helper.commit()?;
            Ok(summary)
        }
        Err(err) => {
            if let Err(rollback_err) = helper.rollback() {
                warn!(err = %rollback_err, "failed to roll back demo table creation");
            }
            Err(err)
        }
    }
}

fn create_all(helper: &SqliteHelper) -> Result<Vec<(&'static str, usize)>> {
    let mut summary = Vec::with_capacity(DEMO_TABLES.len());
    for table in &DEMO_TABLES {
        helper.create_table(&demo_table_schema(table.name))?;
        if !helper.has_geometry_column(table.name, GEOMETRY_COLUMN)? {
            helper.add_geometry_column(
                table.name,
                GEOMETRY_COLUMN,
                DEMO_SRID,
                table.geometry_type,
                Dimension::Xy,
            )?;
            helper.create_spatial_index(table.name, GEOMETRY_COLUMN)?;
        }

        let mut inserted = 0;
        for (name, wkt) in table.samples {
            inserted += helper.insert_sql(&sample_insert_sql(table.name, name, wkt))?;
        }
        summary.push((table.name, inserted));
    }
    Ok(summary)
}
