pub mod error;
pub mod path;
pub mod value;

pub use error::{QueryError, Result};
pub use path::{DocumentPath, PathSegment};
pub use value::{ColumnType, Value};
