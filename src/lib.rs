//! Thread-safe access to `SQLite` databases bundled as application assets.
//!
//! Ship a read-only `SQLite` file with your application, address it by name,
//! and this crate copies it into private storage on first use, opens it, and
//! serializes concurrent access: reads run concurrently, mutations and
//! transactions get exclusive access, in fair order.
//!
//! ```no_run
//! use asset_sqlite::{DataAccess, DirContext, ParamValue};
//!
//! # async fn demo() -> Result<(), asset_sqlite::DataAccessError> {
//! let data = DataAccess::new(DirContext::new("assets", "storage"));
//!
//! let result = data
//!     .query(
//!         "app.db",
//!         "SELECT name FROM users WHERE id = ?",
//!         &[ParamValue::Int(1)],
//!     )
//!     .await?;
//! if let Some(err) = &result.error {
//!     eprintln!("query failed: {err}");
//! }
//! # Ok(())
//! # }
//! ```

mod access;
mod context;
mod error;
mod gate;
mod params;
mod query;
mod registry;
mod results;
mod types;
mod worker;

pub use access::DataAccess;
pub use context::{AssetContext, DirContext};
pub use error::DataAccessError;
pub use results::AccessResult;
pub use types::ParamValue;
