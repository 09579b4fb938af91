//! Batch machine translation of key/value localization files
//!
//! Every translatable line of a source file is sent through a
//! [`MachineTranslator`] once per target locale, with substitution variables
//! (`%{name}`), pass-through literals (`===ACME===`, `'''ACME'''`) and
//! numbered placeholders (`{0}`) masked so the backend cannot mangle them.
//! Keys already present in a locale's destination are left alone, so a run
//! only ever appends what is missing.
//!
//! # Example
//!
//! ```ignore
//! use idiom::{Config, DriverOptions, FileAppender, translate_all};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> idiom::Result<()> {
//!     let config = Config::load_or_default(Path::new("config/idiom.yml"))?;
//!     let translator = config.translator()?;
//!     let options = DriverOptions::default();
//!
//!     translate_all(
//!         Path::new("translations"),
//!         &config,
//!         translator.as_ref(),
//!         &FileAppender,
//!         &options,
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod existing;
pub mod layout;
pub mod markup;
pub mod mt;
pub mod runner;


pub use codec::{CodecError, LineFormat, TranslationUnit};
pub use config::{Config, ConfigError, Library, LocaleTask};
pub use driver::{
    DriverOptions, FileAppender, FileReport, LocaleDriver, LocaleReport, OutputSink,
    translation_banner,
};
pub use error::{IdiomError, Result};
pub use existing::ExistingKeySet;
pub use layout::{DestinationPaths, OutputLayout};
pub use markup::{ExtractionResult, MarkupError, PostProcessPolicy, extract, restore};
pub use mt::{MachineTranslator, MtError, MtResult};
pub use runner::{discover_sources, translate_all};
