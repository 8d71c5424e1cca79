//! SpatiaLite integration.
//!
//! Everything spatial is done by the loaded extension; this module only
//! issues its SQL functions and converts geometries to WKB for binding and to
//! WKT for display.

use crate::error::{HelperError, Result};
use crate::helper::SqliteHelper;
use crate::sql::{
    SQL_ADD_GEOMETRY_COLUMN, SQL_CREATE_SPATIAL_INDEX, SQL_HAS_GEOMETRY_COLUMN,
    SQL_INIT_SPATIAL_METADATA, sql_insert_geometry, value_parameter,
};
use geo_traits::GeometryTrait;
use rusqlite::params;
use rusqlite::types::ToSql;
use tracing::info;
use wkb::reader::{Dimension, GeometryType, Wkb};

/// Module name handed to SQLite when no explicit path is configured.
pub const DEFAULT_SPATIALITE_MODULE: &str = "mod_spatialite";

#[inline]
pub(crate) fn geometry_type_to_str(geometry_type: GeometryType) -> &'static str {
    match geometry_type {
        GeometryType::Point => "POINT",
        GeometryType::LineString => "LINESTRING",
        GeometryType::Polygon => "POLYGON",
        GeometryType::MultiPoint => "MULTIPOINT",
        GeometryType::MultiLineString => "MULTILINESTRING",
        GeometryType::MultiPolygon => "MULTIPOLYGON",
        GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        // SpatiaLite accepts the generic type for anything else.
        _ => "GEOMETRY",
    }
}

#[inline]
pub(crate) fn dimension_to_str(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Xy => "XY",
        Dimension::Xyz => "XYZ",
        Dimension::Xym => "XYM",
        Dimension::Xyzm => "XYZM",
    }
}

/// Encode a geometry as ISO WKB.
pub fn geometry_to_wkb<G: GeometryTrait<T = f64>>(geometry: &G) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    wkb::writer::write_geometry(&mut buf, geometry, &Default::default())?;
    Ok(buf)
}

/// Render a geometry as WKT.
pub fn geometry_to_wkt<G: GeometryTrait<T = f64>>(geometry: &G) -> Result<String> {
    let mut wkt = String::new();
    wkt::to_wkt::write_geometry(&mut wkt, geometry)
        .map_err(|err| HelperError::Wkt(err.to_string()))?;
    Ok(wkt)
}

/// Render WKB bytes, e.g. the output of SpatiaLite's `AsBinary()`, as WKT.
pub fn wkb_to_wkt(bytes: &[u8]) -> Result<String> {
    let wkb = Wkb::try_new(bytes)?;
    geometry_to_wkt(&wkb)
}

impl SqliteHelper {
    /// Load [`DEFAULT_SPATIALITE_MODULE`] from the library search path.
    pub fn load_spatialite(&self) -> Result<()> {
        self.load_extension(DEFAULT_SPATIALITE_MODULE, None)
    }

    /// Create SpatiaLite's metadata tables.
    ///
    /// Required once on every new spatial database, before the first
    /// geometry column is added.
    pub fn init_spatial_metadata(&self) -> Result<()> {
        info!("initializing spatial metadata");
        self.execute_scalar(SQL_INIT_SPATIAL_METADATA, [])?;
        Ok(())
    }

    /// Register a geometry column on an existing table.
    pub fn add_geometry_column(
        &self,
        table: &str,
        column: &str,
        srid: i32,
        geometry_type: GeometryType,
        dimension: Dimension,
    ) -> Result<()> {
        let added: i64 = self.execute_scalar_as(
            SQL_ADD_GEOMETRY_COLUMN,
            params![
                table,
                column,
                srid,
                geometry_type_to_str(geometry_type),
                dimension_to_str(dimension)
            ],
        )?;
        if added == 0 {
            return Err(HelperError::SpatialFunctionFailed {
                function: "AddGeometryColumn",
            });
        }
        Ok(())
    }

    /// Build an R*Tree index for a registered geometry column.
    pub fn create_spatial_index(&self, table: &str, column: &str) -> Result<()> {
        let created: i64 =
            self.execute_scalar_as(SQL_CREATE_SPATIAL_INDEX, params![table, column])?;
        if created == 0 {
            return Err(HelperError::SpatialFunctionFailed {
                function: "CreateSpatialIndex",
            });
        }
        Ok(())
    }

    /// Whether `geometry_columns` already registers this column.
    pub fn has_geometry_column(&self, table: &str, column: &str) -> Result<bool> {
        self.execute_scalar_as(SQL_HAS_GEOMETRY_COLUMN, params![table, column])
    }

    /// Insert one row whose geometry is bound as WKB and converted with
    /// `GeomFromWKB(.., srid)`. Properties bind like [`SqliteHelper::insert`].
    ///
    /// ```no_run
    /// use geo_types::LineString;
    /// use spatialite_helper::SqliteHelper;
    ///
    /// let helper = SqliteHelper::open("demo.sqlite")?;
    /// helper.load_spatialite()?;
    /// let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
    /// helper.insert_geometry("demo_lines", "geom", &line, 4326, [("name", "diagonal")])?;
    /// # Ok::<(), spatialite_helper::HelperError>(())
    /// ```
    pub fn insert_geometry<G, I, K, V>(
        &self,
        table: &str,
        geometry_column: &str,
        geometry: &G,
        srid: i32,
        properties: I,
    ) -> Result<usize>
    where
        G: GeometryTrait<T = f64>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSql,
    {
        let wkb = geometry_to_wkb(geometry)?;
        let properties = properties.into_iter().collect::<Vec<(K, V)>>();
        let sql = sql_insert_geometry(
            table,
            geometry_column,
            srid,
            properties.iter().map(|(name, _)| name.as_ref()),
        );

        let mut params = Vec::with_capacity(properties.len() + 1);
        params.push((value_parameter(geometry_column), &wkb as &dyn ToSql));
        for (name, value) in &properties {
            params.push((value_parameter(name.as_ref()), value as &dyn ToSql));
        }
        self.execute_named(&sql, &params)
    }
}
