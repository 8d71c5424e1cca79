//! Schema-driven SQLite helper with SpatiaLite support, built on top of rusqlite.
//!
//! ## Overview
//!
//! - `SqliteHelper` owns one connection and builds the SQL for common
//!   operations: create/insert/update, table rebuilds, attach/detach and
//!   metadata queries.
//! - `Table` and `Column` describe a table to create. `FieldType` is the
//!   declared type of a column.
//! - `ResultSet` is a fully materialized query result whose cells are
//!   rusqlite `Value`s.
//! - The spatial methods (`load_spatialite`, `init_spatial_metadata`,
//!   `add_geometry_column`, `create_spatial_index`, `insert_geometry`) call
//!   the SpatiaLite extension's SQL functions.
//! - `demo::Shell` is the menu-driven console behind the `spatialite_demo`
//!   binary.
//!
//! `SqliteHelper` is the entry point:
//!
//! - `SqliteHelper::open(path)`: open or create a database file.
//! - `SqliteHelper::open_with(path, &options)`: same, with `OpenOptions`.
//! - `SqliteHelper::open_in_memory()`: a transient in-memory database.
//!
//! Values passed to `insert` and `update` are always bound as parameters,
//! never spliced into the SQL text.
//!
//! ## Short usage
//!
//! ```no_run
//! use spatialite_helper::{Column, FieldType, SqliteHelper, Table};
//!
//! let helper = SqliteHelper::open("people.sqlite")?;
//! helper.create_table(
//!     &Table::new("people")
//!         .column(Column::auto_increment("id"))
//!         .column(Column::new("name").not_null())
//!         .column(Column::with_type("age", FieldType::Integer)),
//! )?;
//!
//! helper.insert("people", [("name", "Ann")])?;
//! helper.update_where("people", [("age", 41)], "name", "Ann")?;
//!
//! let rows = helper.select("SELECT name, age FROM people", [])?;
//! let age: i64 = rows.get(0, "age")?;
//! # Ok::<(), spatialite_helper::HelperError>(())
//! ```
//!
//! ## Changing a table's structure
//!
//! SQLite cannot drop or retype columns in place. `update_table_structure`
//! rebuilds the table under a savepoint and keeps the data of every column
//! the old and new layouts share:
//!
//! ```no_run
//! use spatialite_helper::{Column, FieldType, SqliteHelper, Table};
//!
//! let helper = SqliteHelper::open("people.sqlite")?;
//! let people = Table::new("people")
//!     .column(Column::auto_increment("id"))
//!     .column(Column::new("name"))
//!     .column(Column::with_type("age", FieldType::Integer).default_value("18"));
//! helper.update_table_structure("people", &people)?;
//! # Ok::<(), spatialite_helper::HelperError>(())
//! ```
//!
//! ## Spatial data
//!
//! ```no_run
//! use geo_types::Point;
//! use spatialite_helper::{Column, Dimension, GeometryType, SqliteHelper, Table};
//!
//! let helper = SqliteHelper::open("spatial.sqlite")?;
//! helper.load_spatialite()?;
//! helper.init_spatial_metadata()?;
//!
//! helper.create_table(
//!     &Table::new("places")
//!         .column(Column::auto_increment("id"))
//!         .column(Column::new("name")),
//! )?;
//! helper.add_geometry_column("places", "geom", 4326, GeometryType::Point, Dimension::Xy)?;
//! helper.create_spatial_index("places", "geom")?;
//!
//! helper.insert_geometry("places", "geom", &Point::new(153.02, -27.47), 4326, [("name", "Brisbane")])?;
//! # Ok::<(), spatialite_helper::HelperError>(())
//! ```
//!
//! Geometries read back with `AsBinary(geom)` are WKB and can be shown with
//! `wkb_to_wkt`:
//!
//! ```no_run
//! use spatialite_helper::{SqliteHelper, wkb_to_wkt};
//!
//! let helper = SqliteHelper::open("spatial.sqlite")?;
//! helper.load_spatialite()?;
//! let rows = helper.select("SELECT name, AsBinary(geom) AS geom FROM places", [])?;
//! for row in 0..rows.len() {
//!     let name: String = rows.get(row, "name")?;
//!     let geom: Vec<u8> = rows.get(row, "geom")?;
//!     println!("{name}: {}", wkb_to_wkt(&geom)?);
//! }
//! # Ok::<(), spatialite_helper::HelperError>(())
//! ```
mod error;
mod helper;
mod result_set;
mod spatial;
mod sql;
mod types;

pub mod demo;

pub use error::{HelperError, Result};
pub use helper::{OpenOptions, SqliteHelper};
pub use result_set::{ResultColumn, ResultSet};
pub use spatial::{DEFAULT_SPATIALITE_MODULE, geometry_to_wkb, geometry_to_wkt, wkb_to_wkt};
pub use sql::escape;
pub use types::{Column, FieldType, Table};

// Re-export the rusqlite items used in public signatures.
pub use rusqlite::types::Value;
pub use rusqlite::{named_params, params};
pub use wkb::reader::{Dimension, GeometryType};
