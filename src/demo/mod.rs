//! Interactive SpatiaLite console.
//!
//! The shell is generic over its input and output so the binary drives it
//! with stdin/stdout and tests drive it with in-memory buffers.

mod benchmark;
mod grid;
mod polyline;
mod tables;

pub use benchmark::{BenchmarkReport, SEARCH_WINDOW_WKT, run_benchmark};
pub use grid::{format_grid, format_value};
pub use polyline::{DEMO_EXTENT, Extent, generate_polylines, random_polyline};
pub use tables::{
    DEMO_SRID, GEOMETRY_COLUMN, LINES_TABLE, POINTS_TABLE, POLYGONS_TABLE, create_demo_tables,
    demo_table_schema,
};

use crate::error::{HelperError, Result};
use crate::helper::{OpenOptions, SqliteHelper};
use crate::spatial::DEFAULT_SPATIALITE_MODULE;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

const DEFAULT_POLYLINE_COUNT: usize = 10_000;

const MENU: &str = "
1. Create or open a database and load SpatiaLite
2. Initialize spatial metadata
3. Create demo tables
4. List tables
5. Run a query
6. Generate random polylines
7. Run the spatial query benchmark
0. Exit
";

/// Settings for the console, usually filled from the command line.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    /// Database offered when option 1 is answered with an empty line.
    pub database: PathBuf,
    /// Extension module passed to `load_extension`.
    pub extension: String,
    pub entry_point: Option<String>,
    /// Rows per transaction when generating polylines.
    pub batch_size: usize,
    pub open_options: OpenOptions,
    /// Fixed seed for reproducible polylines; random when `None`.
    pub seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("spatialite_demo.sqlite"),
            extension: DEFAULT_SPATIALITE_MODULE.to_string(),
            entry_point: None,
            batch_size: 1000,
            open_options: OpenOptions::default(),
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    OpenDatabase,
    InitSpatialMetadata,
    CreateDemoTables,
    ListTables,
    Query,
    GeneratePolylines,
    Benchmark,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = HelperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(Self::OpenDatabase),
            "2" => Ok(Self::InitSpatialMetadata),
            "3" => Ok(Self::CreateDemoTables),
            "4" => Ok(Self::ListTables),
            "5" => Ok(Self::Query),
            "6" => Ok(Self::GeneratePolylines),
            "7" => Ok(Self::Benchmark),
            "0" => Ok(Self::Exit),
            other => Err(HelperError::InvalidInput(format!(
                "unknown menu choice {other:?}"
            ))),
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenDatabase => "open database",
            Self::InitSpatialMetadata => "initialize spatial metadata",
            Self::CreateDemoTables => "create demo tables",
            Self::ListTables => "list tables",
            Self::Query => "query",
            Self::GeneratePolylines => "generate polylines",
            Self::Benchmark => "benchmark",
            Self::Exit => "exit",
        };
        f.write_str(name)
    }
}

/// Menu-driven console over a single [`SqliteHelper`].
///
/// Errors from a menu action are printed and the menu is shown again; only
/// failures of the console streams end [`Shell::run`] early.
pub struct Shell<R, W> {
    input: R,
    output: W,
    config: DemoConfig,
    helper: Option<SqliteHelper>,
    rng: StdRng,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W, config: DemoConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            input,
            output,
            config,
            helper: None,
            rng,
        }
    }

    /// Show the menu until the user picks 0 or the input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            write!(self.output, "{MENU}> ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                break;
            };
            if line.is_empty() {
                continue;
            }

            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(err) => {
                    writeln!(self.output, "{err}")?;
                    continue;
                }
            };
            if choice == MenuChoice::Exit {
                break;
            }

            match self.dispatch(choice) {
                Ok(()) => {}
                Err(HelperError::Io(err)) => return Err(HelperError::Io(err)),
                Err(err) => writeln!(self.output, "Error ({choice}): {err}")?,
            }
        }

        if let Some(helper) = self.helper.take() {
            helper.close();
        }
        writeln!(self.output, "Bye.")?;
        Ok(())
    }

    /// The open database, if option 1 succeeded.
    pub fn helper(&self) -> Option<&SqliteHelper> {
        self.helper.as_ref()
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::OpenDatabase => self.open_database(),
            MenuChoice::InitSpatialMetadata => {
                self.require_helper()?.init_spatial_metadata()?;
                writeln!(self.output, "Spatial metadata initialized.")?;
                Ok(())
            }
            MenuChoice::CreateDemoTables => {
                let summary = create_demo_tables(self.require_helper()?)?;
                for (table, rows) in summary {
                    writeln!(self.output, "{table}: {rows} sample rows")?;
                }
                Ok(())
            }
            MenuChoice::ListTables => {
                let tables = self.require_helper()?.table_list()?;
                for table in tables {
                    writeln!(self.output, "{table}")?;
                }
                Ok(())
            }
            MenuChoice::Query => self.query(),
            MenuChoice::GeneratePolylines => self.generate_polylines(),
            MenuChoice::Benchmark => {
                let report = run_benchmark(self.require_helper()?)?;
                let [min_x, min_y, max_x, max_y] = report.window;
                writeln!(
                    self.output,
                    "Window ({min_x}, {min_y}) - ({max_x}, {max_y}): {} intersecting lines in {:.3} ms",
                    report.hits,
                    report.elapsed.as_secs_f64() * 1000.0
                )?;
                Ok(())
            }
            MenuChoice::Exit => Ok(()),
        }
    }

    fn open_database(&mut self) -> Result<()> {
        let default = self.config.database.display().to_string();
        let answer = self.prompt(&format!("Database path [{default}]: "))?;
        let path = if answer.is_empty() {
            self.config.database.clone()
        } else {
            PathBuf::from(answer)
        };

        // The current database stays open if the new one cannot be opened.
        let helper = SqliteHelper::open_with(&path, &self.config.open_options)?;
        if let Some(previous) = self.helper.replace(helper) {
            previous.close();
        }
        writeln!(self.output, "Opened {}", path.display())?;

        // The database stays open even if the extension is unavailable.
        self.require_helper()?
            .load_extension(&self.config.extension, self.config.entry_point.as_deref())?;
        writeln!(self.output, "Loaded {}", self.config.extension)?;
        Ok(())
    }

    fn query(&mut self) -> Result<()> {
        let sql = self.prompt("SQL> ")?;
        if sql.is_empty() {
            return Err(HelperError::InvalidInput("empty query".to_string()));
        }
        let result = self.require_helper()?.select(&sql, [])?;
        write!(self.output, "{}", format_grid(&result))?;
        writeln!(self.output, "({} rows)", result.len())?;
        Ok(())
    }

    fn generate_polylines(&mut self) -> Result<()> {
        let answer = self.prompt(&format!("Number of polylines [{DEFAULT_POLYLINE_COUNT}]: "))?;
        let count = if answer.is_empty() {
            DEFAULT_POLYLINE_COUNT
        } else {
            answer
                .parse::<usize>()
                .map_err(|_| HelperError::InvalidInput(format!("not a count: {answer:?}")))?
        };

        let helper = self.helper.as_ref().ok_or(HelperError::NoOpenDatabase)?;
        let start = Instant::now();
        let inserted = generate_polylines(
            helper,
            &mut self.rng,
            count,
            self.config.batch_size,
            &mut self.output,
        )?;
        let elapsed = start.elapsed();
        info!(inserted, elapsed_ms = elapsed.as_millis() as u64, "polyline generation finished");
        writeln!(
            self.output,
            "Inserted {inserted} polylines in {:.2} s.",
            elapsed.as_secs_f64()
        )?;
        Ok(())
    }

    fn require_helper(&self) -> Result<&SqliteHelper> {
        self.helper.as_ref().ok_or(HelperError::NoOpenDatabase)
    }

    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        self.read_line()?
            .ok_or_else(|| HelperError::InvalidInput("unexpected end of input".to_string()))
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoConfig, MenuChoice, Shell};
    use crate::error::HelperError;
    use std::io::Cursor;

    fn run_script(script: &str, config: DemoConfig) -> crate::Result<String> {
        let mut output = Vec::new();
        Shell::new(Cursor::new(script.as_bytes()), &mut output, config).run()?;
        Ok(String::from_utf8(output).expect("utf-8"))
    }

    fn config_without_extension() -> DemoConfig {
        DemoConfig {
            extension: "no_such_spatialite_module".to_string(),
            seed: Some(3),
            ..DemoConfig::default()
        }
    }

    #[test]
    fn parses_menu_choices() {
        assert_eq!("1".parse::<MenuChoice>().ok(), Some(MenuChoice::OpenDatabase));
        assert_eq!(" 7 ".parse::<MenuChoice>().ok(), Some(MenuChoice::Benchmark));
        assert_eq!("0".parse::<MenuChoice>().ok(), Some(MenuChoice::Exit));
        assert!(matches!(
            "8".parse::<MenuChoice>(),
            Err(HelperError::InvalidInput(_))
        ));
    }

    #[test]
    fn exits_on_zero_and_on_end_of_input() -> crate::Result<()> {
        let output = run_script("0\n", DemoConfig::default())?;
        assert!(output.ends_with("Bye.\n"));

        let output = run_script("", DemoConfig::default())?;
        assert!(output.ends_with("Bye.\n"));
        Ok(())
    }

    #[test]
    fn actions_without_a_database_report_and_continue() -> crate::Result<()> {
        let output = run_script("4\n9\n0\n", DemoConfig::default())?;
        assert!(output.contains("no database is open"), "{output}");
        assert!(output.contains("unknown menu choice \"9\""), "{output}");
        assert!(output.ends_with("Bye.\n"));
        Ok(())
    }

    #[test]
    fn opens_database_even_when_the_extension_is_missing() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("shell.sqlite");
        let script = format!(
            "1\n{}\n5\nCREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)\n5\nselect 1 as one, 'two' as two\n4\n0\n",
            path.display()
        );

        let output = run_script(&script, config_without_extension())?;
        assert!(output.contains(&format!("Opened {}", path.display())), "{output}");
        assert!(!output.contains("Loaded"), "{output}");
        assert!(output.contains("Error (open database)"), "{output}");
        assert!(output.contains("one\ttwo\n1\ttwo\n(1 rows)"), "{output}");
        assert!(output.contains("> notes\n"), "{output}");
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn failed_reopen_keeps_the_current_database() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kept.sqlite");
        let unreachable = dir.path().join("no_such_dir").join("other.sqlite");
        let script = format!(
            "1\n{}\n5\nCREATE TABLE notes (id INTEGER PRIMARY KEY)\n1\n{}\n4\n0\n",
            path.display(),
            unreachable.display()
        );

        let output = run_script(&script, config_without_extension())?;
        assert!(!output.contains(&format!("Opened {}", unreachable.display())), "{output}");
        assert!(!output.contains("no database is open"), "{output}");
        assert!(output.contains("> notes\n"), "{output}");
        Ok(())
    }

    #[test]
    fn polyline_count_must_be_a_number() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("count.sqlite");
        let script = format!("1\n{}\n6\nmany\n0\n", path.display());

        let output = run_script(&script, config_without_extension())?;
        assert!(output.contains("not a count: \"many\""), "{output}");
        Ok(())
    }

    // Needs mod_spatialite on the library search path; skipped otherwise.
    #[test]
    fn full_session_with_spatialite() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("spatial.sqlite");
        {
            let probe = crate::SqliteHelper::open_in_memory()?;
            if probe.load_spatialite().is_err() {
                eprintln!("mod_spatialite is not available; skipping");
                return Ok(());
            }
        }

        let config = DemoConfig {
            batch_size: 50,
            seed: Some(11),
            ..DemoConfig::default()
        };
        let script = format!(
            "1\n{}\n2\n3\n6\n120\n7\n5\nselect name, AsBinary(geom) as geom from demo_points order by id limit 1\n0\n",
            path.display()
        );
        let output = run_script(&script, config)?;

        assert!(!output.contains("Error"), "{output}");
        assert!(output.contains("demo_points: 3 sample rows"), "{output}");
        assert!(output.contains("120/120 polylines inserted"), "{output}");
        assert!(output.contains("intersecting lines"), "{output}");
        assert!(output.contains("Brisbane\tPOINT"), "{output}");
        Ok(())
    }
}
