//! Document loading for rulemate.
//!
//! Rule catalogs, schemas and error-message catalogs are plain JSON or TOML
//! documents. [`TemplateSet`] gathers them from files or directories and
//! produces a [`ValidatorConfig`](rulemate_validation::ValidatorConfig);
//! [`EnvLoader`] overrides validator options from `RULEMATE_*` variables.
//!
//! ```no_run
//! use rulemate_config::{EnvLoader, TemplateSet};
//! use rulemate_validation::{CommonHelpers, ValidatorOptions};
//!
//! # fn main() -> rulemate_config::Result<()> {
//! let templates = TemplateSet::from_dirs("templates/rules", "templates/schemas", "templates/errors")?;
//! let options = EnvLoader::default().options_from_env(ValidatorOptions::default())?;
//! let config = templates
//!     .config("contactUs")?
//!     .with_helpers(CommonHelpers)
//!     .with_options(options);
//! # let _ = config;
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod templates;

pub use env::{DEFAULT_PREFIX, EnvLoader, load_dotenv};
pub use error::{ConfigError, Result};
pub use loader::{DocumentLoader, FileFormat, load_error_messages, load_rules, load_schema};
pub use templates::TemplateSet;
