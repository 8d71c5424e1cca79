use crate::error::{HelperError, Result};
use crate::result_set::{ResultColumn, ResultSet, value_as};
use crate::sql::{
    SQL_BEGIN_TRANSACTION, SQL_COMMIT, SQL_DATABASE_LIST, SQL_RELEASE_REBUILD, SQL_ROLLBACK,
    SQL_ROLLBACK_REBUILD, SQL_SAVEPOINT_REBUILD, SQL_TABLE_EXISTS, SQL_TABLE_NAMES, SQL_TABLE_STATUS,
    SQLITE_SEQUENCE, condition_parameter, sql_attach, sql_copy_data, sql_create_table,
    sql_detach, sql_drop_table, sql_insert, sql_probe_columns, sql_rename_table, sql_table_info,
    sql_update, value_parameter,
};
use crate::types::Table;
use rusqlite::types::{FromSql, ToSql, Value};
use rusqlite::{Connection, LoadExtensionGuard, OpenFlags, Params};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How [`SqliteHelper::open_with`] opens the database file.
#[derive(Clone, Debug)]
pub struct OpenOptions {
    /// Fail instead of creating the file when it does not exist.
    pub fail_if_missing: bool,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            fail_if_missing: false,
            busy_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug)]
/// SQL building and execution facade over a single SQLite connection.
///
/// The helper owns its connection. Every call runs to completion on the
/// caller's thread; transactions are explicit and never rolled back
/// implicitly.
pub struct SqliteHelper {
    conn: Connection,
}

impl SqliteHelper {
    /// Open a database file, creating it if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if !options.fail_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(path, flags)?;
        conn.busy_timeout(options.busy_timeout)?;
        info!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    /// Open a transient in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Wrap a connection the caller already opened.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Load a native SQLite extension such as `mod_spatialite`.
    ///
    /// A bare module name is resolved by SQLite using the platform's library
    /// search path and file suffix.
    pub fn load_extension<P: AsRef<Path>>(&self, path: P, entry_point: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        // SAFETY: the extension runs native code inside this process; callers
        // choose which module to trust. Loading is re-disabled when the guard drops.
        unsafe {
            let _guard = LoadExtensionGuard::new(&self.conn)?;
            self.conn.load_extension(path, entry_point)?;
        }
        info!(module = %path.display(), "loaded extension");
        Ok(())
    }

    /// Close the connection. Errors are logged and otherwise ignored.
    pub fn close(self) {
        match self.conn.close() {
            Ok(()) => info!("closed database"),
            Err((_conn, err)) => warn!(%err, "ignoring error while closing database"),
        }
    }

    /// Run a query and collect every row into memory.
    ///
    /// ```no_run
    /// use spatialite_helper::{SqliteHelper, named_params};
    ///
    /// let helper = SqliteHelper::open("demo.sqlite")?;
    /// let rows = helper.select(
    ///     "SELECT name FROM demo_points WHERE id > @min",
    ///     named_params! { "@min": 10 },
    /// )?;
    /// for row in 0..rows.len() {
    ///     let name: String = rows.get(row, "name")?;
    ///     println!("{name}");
    /// }
    /// # Ok::<(), spatialite_helper::HelperError>(())
    /// ```
    pub fn select<P: Params>(&self, sql: &str, params: P) -> Result<ResultSet> {
        debug!(sql, "select");
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt
            .columns()
            .into_iter()
            .map(|column| ResultColumn {
                name: column.name().to_string(),
                decl_type: column.decl_type().map(str::to_string),
            })
            .collect::<Vec<ResultColumn>>();

        let column_count = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query(params)?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(row.get::<_, Value>(idx)?);
            }
            rows.push(values);
        }

        Ok(ResultSet { columns, rows })
    }

    /// Execute a single statement and return the number of rows it modified.
    ///
    /// Rows produced by the statement, if any, are read and discarded.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        debug!(sql, "execute");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        while rows.next()?.is_some() {}
        Ok(self.conn.changes() as usize)
    }

    /// Execute a script of one or more statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(sql, "execute batch");
        Ok(self.conn.execute_batch(sql)?)
    }

    /// First column of the first row, or `NULL` when there is none.
    pub fn execute_scalar<P: Params>(&self, sql: &str, params: P) -> Result<Value> {
        Ok(self.query_scalar(sql, params)?.1)
    }

    /// Like [`Self::execute_scalar`], converted with rusqlite's `FromSql`.
    pub fn execute_scalar_as<T: FromSql, P: Params>(&self, sql: &str, params: P) -> Result<T> {
        let (column, value) = self.query_scalar(sql, params)?;
        value_as(&value, &column)
    }

    fn query_scalar<P: Params>(&self, sql: &str, params: P) -> Result<(String, Value)> {
        debug!(sql, "scalar");
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            stmt.query(params)?.next()?;
            return Ok((String::new(), Value::Null));
        }

        let column = stmt.column_name(0)?.to_string();
        let mut rows = stmt.query(params)?;
        let value = match rows.next()? {
            Some(row) => row.get(0)?,
            None => Value::Null,
        };
        Ok((column, value))
    }

    pub fn begin_transaction(&self) -> Result<()> {
        self.execute(SQL_BEGIN_TRANSACTION, [])?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.execute(SQL_COMMIT, [])?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.execute(SQL_ROLLBACK, [])?;
        Ok(())
    }

    /// Insert one row. Columns follow the iteration order of `values` and
    /// each value is bound as `@v<column>`.
    ///
    /// Table and column names are quoted but not validated.
    ///
    /// ```no_run
    /// use spatialite_helper::{SqliteHelper, Value};
    ///
    /// let helper = SqliteHelper::open_in_memory()?;
    /// helper.execute_batch("CREATE TABLE t (a INTEGER, b TEXT)")?;
    /// helper.insert("t", [("a", Value::from(1)), ("b", Value::from("x".to_string()))])?;
    /// # Ok::<(), spatialite_helper::HelperError>(())
    /// ```
    pub fn insert<I, K, V>(&self, table: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSql,
    {
        let values = values.into_iter().collect::<Vec<(K, V)>>();
        let sql = sql_insert(table, values.iter().map(|(name, _)| name.as_ref()));

        let params = values
            .iter()
            .map(|(name, value)| (value_parameter(name.as_ref()), value as &dyn ToSql))
            .collect::<Vec<(String, &dyn ToSql)>>();
        self.execute_named(&sql, &params)
    }

    /// Execute caller-written INSERT text as is, e.g. to embed SQL function
    /// calls such as `GeomFromText(...)` in the VALUES clause.
    pub fn insert_sql(&self, sql: &str) -> Result<usize> {
        self.execute(sql, [])
    }

    /// Update rows matching every entry of `condition` (all rows when it is
    /// empty). Data values bind as `@v<column>`, conditions as `@c<column>`.
    pub fn update<D, K, V, C, L, W>(&self, table: &str, data: D, condition: C) -> Result<usize>
    where
        D: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSql,
        C: IntoIterator<Item = (L, W)>,
        L: AsRef<str>,
        W: ToSql,
    {
        let data = data.into_iter().collect::<Vec<(K, V)>>();
        if data.is_empty() {
            return Err(HelperError::EmptyData {
                table: table.to_string(),
            });
        }
        let condition = condition.into_iter().collect::<Vec<(L, W)>>();

        let sql = sql_update(
            table,
            data.iter().map(|(name, _)| name.as_ref()),
            condition.iter().map(|(name, _)| name.as_ref()),
        );

        let mut params = Vec::with_capacity(data.len() + condition.len());
        for (name, value) in &data {
            params.push((value_parameter(name.as_ref()), value as &dyn ToSql));
        }
        for (name, value) in &condition {
            params.push((condition_parameter(name.as_ref()), value as &dyn ToSql));
        }
        self.execute_named(&sql, &params)
    }

    /// [`Self::update`] with a single `column = value` condition.
    pub fn update_where<D, K, V, W>(
        &self,
        table: &str,
        data: D,
        column: &str,
        value: W,
    ) -> Result<usize>
    where
        D: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSql,
        W: ToSql,
    {
        self.update(table, data, [(column, value)])
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub(crate) fn execute_named(&self, sql: &str, params: &[(String, &dyn ToSql)]) -> Result<usize> {
        debug!(sql, "execute");
        let params = params
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect::<Vec<(&str, &dyn ToSql)>>();
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.execute(params.as_slice())?)
    }

    /// `CREATE TABLE IF NOT EXISTS` from a table definition.
    pub fn create_table(&self, table: &Table) -> Result<()> {
        let sql = sql_create_table(table)?;
        self.execute(&sql, [])?;
        Ok(())
    }

    pub fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        self.execute(&sql_rename_table(from, to), [])?;
        Ok(())
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.execute(&sql_drop_table(table), [])?;
        Ok(())
    }

    /// Copy every row of `from` into `to`, limited to the columns both
    /// tables have. Returns the number of rows copied.
    pub fn copy_all_data(&self, from: &str, to: &str) -> Result<usize> {
        let source = self.select(&sql_probe_columns(from), [])?;
        let target = self.select(&sql_probe_columns(to), [])?;

        let mut shared: Vec<String> = Vec::new();
        let mut add_shared = |name: &str, other: &ResultSet| {
            if other.contains_column(name)
                && !shared.iter().any(|seen| seen.eq_ignore_ascii_case(name))
            {
                shared.push(name.to_string());
            }
        };
        for name in source.column_names() {
            add_shared(name, &target);
        }
        for name in target.column_names() {
            add_shared(name, &source);
        }

        if shared.is_empty() {
            debug!(from, to, "no shared columns, nothing to copy");
            return Ok(0);
        }

        self.execute(&sql_copy_data(from, to, &shared), [])
    }

    /// Rebuild `target` with the columns of `new_structure`, keeping the data
    /// of every column the old and new layouts share.
    ///
    /// The table is recreated as `<target>_temp`, filled, and renamed over the
    /// original. All steps run inside a savepoint, so a failure leaves the
    /// original table untouched, also when the caller has an open transaction.
    /// `new_structure.name` is ignored.
    ///
    /// A table already named `<target>_temp` is never reused or dropped; the
    /// call fails with [`HelperError::TableExists`] and changes nothing.
    pub fn update_table_structure(&self, target: &str, new_structure: &Table) -> Result<()> {
        let temp = new_structure.renamed(format!("{target}_temp"));
        info!(table = target, "rebuilding table structure");

        self.execute(SQL_SAVEPOINT_REBUILD, [])?;
        match self.rebuild_table(target, &temp) {
            Ok(()) => {
                self.execute(SQL_RELEASE_REBUILD, [])?;
                Ok(())
            }
            Err(err) => {
                let undo = self
                    .execute(SQL_ROLLBACK_REBUILD, [])
                    .and_then(|_| self.execute(SQL_RELEASE_REBUILD, []));
                if let Err(undo_err) = undo {
                    warn!(table = target, err = %undo_err, "failed to roll back table rebuild");
                }
                Err(err)
            }
        }
    }

    fn rebuild_table(&self, target: &str, temp: &Table) -> Result<()> {
        if self.execute_scalar_as::<bool, _>(SQL_TABLE_EXISTS, [temp.name.as_str()])? {
            return Err(HelperError::TableExists {
                table: temp.name.clone(),
            });
        }
        self.create_table(temp)?;
        self.copy_all_data(target, &temp.name)?;
        self.drop_table(target)?;
        self.rename_table(&temp.name, target)
    }

    pub fn attach_database<P: AsRef<Path>>(&self, path: P, alias: &str) -> Result<()> {
        let path = path.as_ref().to_string_lossy();
        self.execute(&sql_attach(alias), [path.as_ref()])?;
        Ok(())
    }

    pub fn detach_database(&self, alias: &str) -> Result<()> {
        self.execute(&sql_detach(alias), [])?;
        Ok(())
    }

    /// Rows of `sqlite_master`: type, name, tbl_name, rootpage, sql.
    pub fn table_status(&self) -> Result<ResultSet> {
        self.select(SQL_TABLE_STATUS, [])
    }

    /// Names of tables and views, without SQLite's `sqlite_sequence`.
    ///
    /// Indexes and triggers are not listed; use [`Self::table_status`] for
    /// every `sqlite_master` entry.
    pub fn table_list(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(SQL_TABLE_NAMES)?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(tables
            .into_iter()
            .filter(|name| name != SQLITE_SEQUENCE)
            .collect())
    }

    /// `PRAGMA table_info`: cid, name, type, notnull, dflt_value, pk.
    pub fn column_status(&self, table: &str) -> Result<ResultSet> {
        self.select(&sql_table_info(table), [])
    }

    /// `PRAGMA database_list`: seq, name, file.
    pub fn show_database(&self) -> Result<ResultSet> {
        self.select(SQL_DATABASE_LIST, [])
    }
}
