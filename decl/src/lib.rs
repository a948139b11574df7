//! Declarative parser definitions for argkit.
//!
//! Describes an [`argkit_core::ArgumentParser`] in YAML or JSON and builds it
//! through the regular builder API, so a definition behaves exactly like the
//! equivalent `add_argument` calls.
//!
//! # Example
//!
//! ```
//! use argkit_decl::ParserDecl;
//!
//! let decl = ParserDecl::from_yaml_str(
//!     r#"
//! prog: fetch
//! arguments:
//!   - flags: ["-j", "--jobs"]
//!     type: int
//!     default: 1
//!   - flags: [url]
//! "#,
//! )
//! .unwrap();
//! let parser = decl.build().unwrap();
//! assert_eq!(parser.format_usage(), "usage: fetch [-h] [-j JOBS] url\n");
//! ```

mod error;
mod load;
mod model;

pub use error::{DeclError, Result};
pub use load::Format;
pub use model::{ArgumentDecl, CommandDecl, ExclusiveDecl, GroupDecl, ParserDecl, SubcommandsDecl};
