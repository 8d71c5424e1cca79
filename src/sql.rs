// SQL text used by the helper. Identifiers are always quoted with backticks;
// values are bound as parameters except where noted.

use crate::error::{HelperError, Result};
use crate::types::{Column, FieldType, Table};

pub(crate) const SQL_BEGIN_TRANSACTION: &str = "BEGIN TRANSACTION;";
pub(crate) const SQL_COMMIT: &str = "COMMIT;";
pub(crate) const SQL_ROLLBACK: &str = "ROLLBACK;";

// A savepoint nests inside a transaction the caller may already have opened,
// and behaves like BEGIN when there is none.
pub(crate) const SQL_SAVEPOINT_REBUILD: &str = "SAVEPOINT update_table_structure;";
pub(crate) const SQL_RELEASE_REBUILD: &str = "RELEASE SAVEPOINT update_table_structure;";
pub(crate) const SQL_ROLLBACK_REBUILD: &str = "ROLLBACK TO SAVEPOINT update_table_structure;";

pub(crate) const SQL_TABLE_STATUS: &str = "SELECT * FROM sqlite_master;";
pub(crate) const SQL_TABLE_NAMES: &str =
    "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY rowid;";
pub(crate) const SQL_TABLE_EXISTS: &str = "SELECT EXISTS(
  SELECT 1 FROM sqlite_master WHERE type = 'table' AND lower(name) = lower(?1)
);";
pub(crate) const SQL_DATABASE_LIST: &str = "PRAGMA database_list;";

/// SQLite's bookkeeping table for `AUTOINCREMENT` counters.
pub(crate) const SQLITE_SEQUENCE: &str = "sqlite_sequence";

// cf. https://www.gaia-gis.it/gaia-sins/spatialite-sql-latest.html
pub(crate) const SQL_INIT_SPATIAL_METADATA: &str = "SELECT InitSpatialMetaData();";
pub(crate) const SQL_ADD_GEOMETRY_COLUMN: &str = "SELECT AddGeometryColumn(?1, ?2, ?3, ?4, ?5);";
pub(crate) const SQL_CREATE_SPATIAL_INDEX: &str = "SELECT CreateSpatialIndex(?1, ?2);";
pub(crate) const SQL_HAS_GEOMETRY_COLUMN: &str = "
SELECT EXISTS(
  SELECT 1 FROM geometry_columns
  WHERE lower(f_table_name) = lower(?1) AND lower(f_geometry_column) = lower(?2)
);
";

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Double single quotes and backslashes for manual literal embedding.
///
/// Nothing in this crate applies it automatically; values passed to
/// [`crate::SqliteHelper::insert`] and [`crate::SqliteHelper::update`] are
/// bound as parameters and must not be escaped.
pub fn escape(data: &str) -> String {
    data.replace('\'', "''").replace('\\', "\\\\")
}

pub(crate) fn value_parameter(column: &str) -> String {
    parameter_name('v', column)
}

pub(crate) fn condition_parameter(column: &str) -> String {
    parameter_name('c', column)
}

// Parameter names only take identifier characters. A column name with
// anything else has every byte outside [A-Za-z0-9] written as `_HH`.
fn parameter_name(prefix: char, column: &str) -> String {
    if column
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
    {
        return format!("@{prefix}{column}");
    }

    let mut name = format!("@{prefix}");
    for byte in column.bytes() {
        if byte.is_ascii_alphanumeric() {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("_{byte:02X}"));
        }
    }
    name
}

fn field_type_keyword(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "text",
        FieldType::Integer => "integer",
        FieldType::Decimal => "decimal",
        FieldType::DateTime => "datetime",
        FieldType::Blob => "blob",
    }
}

// At most one of primary key / not null / default is emitted, in that order.
fn column_definition(column: &Column) -> String {
    let name = quote_identifier(&column.name);
    if column.auto_increment {
        return format!("{name} integer primary key autoincrement");
    }

    let mut def = format!("{name} {}", field_type_keyword(column.field_type));
    if column.primary_key {
        def.push_str(" primary key");
    } else if column.not_null {
        def.push_str(" not null");
    } else if !column.default_value.is_empty() {
        def.push_str(" default ");
        let quoted = column.default_value.contains(' ')
            || matches!(column.field_type, FieldType::Text | FieldType::DateTime);
        if quoted {
            def.push_str(&quote_literal(&column.default_value));
        } else {
            def.push_str(&column.default_value);
        }
    }
    def
}

pub(crate) fn sql_create_table(table: &Table) -> Result<String> {
    let mut defs = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        if column.name.trim().is_empty() {
            return Err(HelperError::BlankColumnName {
                table: table.name.clone(),
            });
        }
        defs.push(column_definition(column));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        quote_identifier(&table.name),
        defs.join(",\n")
    ))
}

pub(crate) fn sql_insert<'a, I>(table: &str, columns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let (names, params): (Vec<String>, Vec<String>) = columns
        .into_iter()
        .map(|name| (quote_identifier(name), value_parameter(name)))
        .unzip();

    if names.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES;", quote_identifier(table));
    }

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_identifier(table),
        names.join(", "),
        params.join(", ")
    )
}

pub(crate) fn sql_update<'a, D, C>(table: &str, data_columns: D, condition_columns: C) -> String
where
    D: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'a str>,
{
    let assignments = data_columns
        .into_iter()
        .map(|name| format!("{} = {}", quote_identifier(name), value_parameter(name)))
        .collect::<Vec<String>>()
        .join(", ");
    let conditions = condition_columns
        .into_iter()
        .map(|name| format!("{} = {}", quote_identifier(name), condition_parameter(name)))
        .collect::<Vec<String>>()
        .join(" AND ");

    if conditions.is_empty() {
        format!("UPDATE {} SET {assignments};", quote_identifier(table))
    } else {
        format!(
            "UPDATE {} SET {assignments} WHERE {conditions};",
            quote_identifier(table)
        )
    }
}

pub(crate) fn sql_rename_table(from: &str, to: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {};",
        quote_identifier(from),
        quote_identifier(to)
    )
}

pub(crate) fn sql_drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", quote_identifier(table))
}

/// Returns no rows; only the column list is of interest.
pub(crate) fn sql_probe_columns(table: &str) -> String {
    format!("SELECT * FROM {} WHERE 1 = 2;", quote_identifier(table))
}

pub(crate) fn sql_copy_data(from: &str, to: &str, columns: &[String]) -> String {
    let joined = columns
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<String>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({joined}) SELECT {joined} FROM {};",
        quote_identifier(to),
        quote_identifier(from)
    )
}

pub(crate) fn sql_table_info(table: &str) -> String {
    format!("PRAGMA table_info({});", quote_identifier(table))
}

/// The file path is bound as `?1`.
pub(crate) fn sql_attach(alias: &str) -> String {
    format!("ATTACH DATABASE ?1 AS {};", quote_identifier(alias))
}

pub(crate) fn sql_detach(alias: &str) -> String {
    format!("DETACH DATABASE {};", quote_identifier(alias))
}

/// Geometry is bound as WKB under the geometry column's value parameter.
pub(crate) fn sql_insert_geometry<'a, I>(
    table: &str,
    geometry_column: &'a str,
    srid: i32,
    property_columns: I,
) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names = vec![quote_identifier(geometry_column)];
    let mut values = vec![format!(
        "GeomFromWKB({}, {srid})",
        value_parameter(geometry_column)
    )];
    for name in property_columns {
        names.push(quote_identifier(name));
        values.push(value_parameter(name));
    }

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_identifier(table),
        names.join(", "),
        values.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HelperError;
    use crate::types::{Column, FieldType, Table};

    #[test]
    fn create_table_emits_autoincrement_clause_only() -> crate::Result<()> {
        let mut id = Column::auto_increment("id");
        // Conflicting attributes set directly on the public fields are ignored too.
        id.not_null = true;
        id.default_value = "5".to_string();
        id.field_type = FieldType::Text;

        let table = Table::new("T").column(id).column(Column::new("name"));
        let sql = sql_create_table(&table)?;

        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `T` (\n`id` integer primary key autoincrement,\n`name` text\n);"
        );
        Ok(())
    }

    #[test]
    fn column_modifiers_are_exclusive_in_precedence_order() {
        let all = Column::define("a", FieldType::Integer, true, false, true, "1");
        assert_eq!(column_definition(&all), "`a` integer primary key");

        let not_null_and_default = Column::define("b", FieldType::Integer, false, false, true, "1");
        assert_eq!(column_definition(&not_null_and_default), "`b` integer not null");

        let default_only = Column::with_type("c", FieldType::Integer).default_value("1");
        assert_eq!(column_definition(&default_only), "`c` integer default 1");
    }

    #[test]
    fn default_values_are_quoted_for_text_and_spaces() {
        let text = Column::new("t").default_value("it's");
        assert_eq!(column_definition(&text), "`t` text default 'it''s'");

        let date = Column::with_type("d", FieldType::DateTime).default_value("2020-11-08");
        assert_eq!(column_definition(&date), "`d` datetime default '2020-11-08'");

        let spaced = Column::with_type("n", FieldType::Decimal).default_value("1 2");
        assert_eq!(column_definition(&spaced), "`n` decimal default '1 2'");

        let expr = Column::with_type("b", FieldType::Blob).default_value("x'00'");
        assert_eq!(column_definition(&expr), "`b` blob default x'00'");
    }

    #[test]
    fn create_table_rejects_blank_column_names() {
        let table = Table::new("t")
            .column(Column::new("ok"))
            .column(Column::new("   "));
        match sql_create_table(&table) {
            Err(HelperError::BlankColumnName { table }) => assert_eq!(table, "t"),
            other => panic!("unexpected result: {other:?}"),
        }

        let empty = Table::new("t").column(Column::new(""));
        assert!(sql_create_table(&empty).is_err());
    }

    #[test]
    fn insert_follows_column_order() {
        let sql = sql_insert("people", ["b", "a"]);
        assert_eq!(sql, "INSERT INTO `people` (`b`, `a`) VALUES (@vb, @va);");

        let sql = sql_insert("people", std::iter::empty());
        assert_eq!(sql, "INSERT INTO `people` DEFAULT VALUES;");
    }

    #[test]
    fn parameters_encode_non_identifier_column_names() {
        assert_eq!(value_parameter("first_name"), "@vfirst_name");
        assert_eq!(value_parameter("first name"), "@vfirst_20name");
        assert_eq!(condition_parameter("a-b.c"), "@ca_2Db_2Ec");
        assert_eq!(value_parameter("x_y z"), "@vx_5Fy_20z");
        assert_eq!(value_parameter("é"), "@v_C3_A9");

        let sql = sql_insert("t", ["first name"]);
        assert_eq!(sql, "INSERT INTO `t` (`first name`) VALUES (@vfirst_20name);");
    }

    #[test]
    fn update_prefixes_data_and_condition_parameters() {
        let sql = sql_update("people", ["name", "age"], ["id", "name"]);
        assert_eq!(
            sql,
            "UPDATE `people` SET `name` = @vname, `age` = @vage WHERE `id` = @cid AND `name` = @cname;"
        );

        let sql = sql_update("people", ["name"], std::iter::empty());
        assert_eq!(sql, "UPDATE `people` SET `name` = @vname;");
    }

    #[test]
    fn copy_lists_columns_twice() {
        let sql = sql_copy_data("a", "b", &["x".to_string(), "y".to_string()]);
        assert_eq!(sql, "INSERT INTO `b` (`x`, `y`) SELECT `x`, `y` FROM `a`;");
    }

    #[test]
    fn identifiers_and_literals_escape_their_quotes() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(quote_literal("o'k"), "'o''k'");
        assert_eq!(sql_drop_table("t"), "DROP TABLE IF EXISTS `t`;");
        assert_eq!(sql_rename_table("a", "b"), "ALTER TABLE `a` RENAME TO `b`;");
        assert_eq!(sql_detach("aux"), "DETACH DATABASE `aux`;");
    }

    #[test]
    fn escape_doubles_quotes_and_backslashes() {
        assert_eq!(escape(r"it's a\b"), r"it''s a\\b");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn insert_geometry_wraps_geometry_parameter() {
        let sql = sql_insert_geometry("lines", "geom", 4326, ["name"]);
        assert_eq!(
            sql,
            "INSERT INTO `lines` (`geom`, `name`) VALUES (GeomFromWKB(@vgeom, 4326), @vname);"
        );
    }
}
