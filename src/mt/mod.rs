/// Machine Translation Module
///
/// The translate capability the locale driver calls once per line: a generic
/// async trait plus the concrete backends.
///
/// 1. **MT Trait** - `MachineTranslator`, shared by every provider
/// 2. **Google Translate** - v2 REST API, keyed by `apiKey`
/// 3. **Microsoft Translator** - V2 HTTP API, keyed by `appId`
/// 4. **Mock** - deterministic translator for tests and dry runs
///
/// # Example
///
/// ```ignore
/// use idiom::mt::{MachineTranslator, MockTranslator, MockMode, SOURCE_LANGUAGE};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MockTranslator::new(MockMode::Suffix);
///     let translated = provider.translate("Hello |0|", SOURCE_LANGUAGE, "de").await?;
///     println!("{}", translated);
///     Ok(())
/// }
/// ```
pub mod error;
pub mod google_translate;
pub mod microsoft_translator;
pub mod mock;
pub mod translator;

pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use microsoft_translator::MicrosoftTranslatorProvider;
pub use mock::{MockCall, MockMode, MockTranslator};
pub use translator::{
    MachineTranslator, SERVICE_ERROR_SENTINEL, SOURCE_LANGUAGE, resolve_language_code,
    validate_locale,
};
