use std::time::Duration;
use crate::core::Result;
use crate::sql::validate_identifier;

/// Engine configuration
///
/// Names the columns every document table carries and the SQL spellings the
/// compiler emits. All names end up interpolated into query text, so they
/// are set by the application, never by end users.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Column holding the JSON document
    pub document_column: String,

    /// Column holding the document key
    pub key_column: String,

    /// JSON extraction function (`json_extract` for SQLite)
    pub extract_function: String,

    /// Prefix of compiler-generated parameter names (`p` gives `@p0`, `@p1`, ...)
    pub parameter_prefix: String,

    /// Prefix of provisioned virtual column names
    pub virtual_column_prefix: String,

    /// Upper bound for a schema metadata read on a cache miss
    pub schema_load_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            document_column: "data".to_string(),
            key_column: "id".to_string(),
            extract_function: "json_extract".to_string(),
            parameter_prefix: "p".to_string(),
            virtual_column_prefix: "vc_".to_string(),
            schema_load_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Set the document column name
    pub fn document_column(mut self, name: &str) -> Self {
        self.document_column = name.to_string();
        self
    }

    /// Set the key column name
    pub fn key_column(mut self, name: &str) -> Self {
        self.key_column = name.to_string();
        self
    }

    /// Set the JSON extraction function
    pub fn extract_function(mut self, name: &str) -> Self {
        self.extract_function = name.to_string();
        self
    }

    /// Set the parameter name prefix
    pub fn parameter_prefix(mut self, prefix: &str) -> Self {
        self.parameter_prefix = prefix.to_string();
        self
    }

    /// Set the virtual column name prefix
    pub fn virtual_column_prefix(mut self, prefix: &str) -> Self {
        self.virtual_column_prefix = prefix.to_string();
        self
    }

    /// Set the schema load timeout
    pub fn schema_load_timeout(mut self, timeout: Duration) -> Self {
        self.schema_load_timeout = Some(timeout);
        self
    }

    /// Wait on schema reads for as long as the collaborator takes
    pub fn no_schema_load_timeout(mut self) -> Self {
        self.schema_load_timeout = None;
        self
    }

    /// Check every configured name that ends up in query text
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.document_column)?;
        validate_identifier(&self.key_column)?;
        validate_identifier(&self.extract_function)?;
        validate_identifier(&self.parameter_prefix)?;
        validate_identifier(&self.virtual_column_prefix)?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
