/// Declared SQL type of a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldType {
    #[default]
    Text,
    DateTime,
    Integer,
    Decimal,
    Blob,
}

/// Column definition used by [`crate::SqliteHelper::create_table`].
///
/// An auto-increment column is always an integer primary key. The
/// constructors and setters enforce this: once `auto_increment` is set,
/// any type, primary key, not-null or default setting is ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Column {
    pub name: String,
    pub field_type: FieldType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub not_null: bool,
    /// Default literal, empty for none.
    pub default_value: String,
}

impl Column {
    /// A nullable text column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    /// `integer primary key autoincrement`.
    pub fn auto_increment(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Integer,
            primary_key: true,
            auto_increment: true,
            ..Default::default()
        }
    }

    /// Build a column from every attribute at once.
    ///
    /// When `auto_increment` is true the remaining attributes are discarded.
    pub fn define(
        name: impl Into<String>,
        field_type: FieldType,
        primary_key: bool,
        auto_increment: bool,
        not_null: bool,
        default_value: impl Into<String>,
    ) -> Self {
        if auto_increment {
            return Self::auto_increment(name);
        }
        Self {
            name: name.into(),
            field_type,
            primary_key,
            auto_increment: false,
            not_null,
            default_value: default_value.into(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        if !self.auto_increment {
            self.primary_key = true;
        }
        self
    }

    pub fn not_null(mut self) -> Self {
        if !self.auto_increment {
            self.not_null = true;
        }
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        if !self.auto_increment {
            self.default_value = value.into();
        }
        self
    }
}

/// Table definition: a name and its columns in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column, builder style.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Same columns under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: self.columns.clone(),
        }
    }
}
