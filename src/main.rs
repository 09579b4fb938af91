use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use idiom::mt::{MachineTranslator, MockMode, MockTranslator};
use idiom::{Config, DriverOptions, FileAppender, OutputLayout, translate_all};

fn cli() -> Command {
    Command::new("idiom")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Machine-translate key/value localization files into every configured locale")
        .arg(
            Arg::new("source")
                .help("Source file (.yml, .yaml, .pres) or directory of *_<source locale> files")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("destination")
                .long("destination")
                .short('d')
                .help("Directory to write translations to (default: next to the source)"),
        )
        .arg(
            Arg::new("use-dirs")
                .long("use-dirs")
                .help("Write each locale into its own directory")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-use-dirs"),
        )
        .arg(
            Arg::new("no-use-dirs")
                .long("no-use-dirs")
                .help("Write every locale next to each other")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .short('o')
                .help("Translate keys even if the destination already has them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("languages")
                .long("languages")
                .short('l')
                .help("Comma-separated locales to translate into (default: all configured)")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file")
                .default_value("config/idiom.yml"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of the configured service")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show masked text and skip decisions")
                .action(ArgAction::SetTrue),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let Some(source) = matches.get_one::<String>("source").map(PathBuf::from) else {
        error!("No source given");
        return ExitCode::FAILURE;
    };
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config/idiom.yml");

    let layout = if matches.get_flag("use-dirs") {
        Some(OutputLayout::PerLocaleDirectory)
    } else if matches.get_flag("no-use-dirs") {
        Some(OutputLayout::Flat)
    } else {
        None
    };

    let options = DriverOptions {
        overwrite: matches.get_flag("overwrite"),
        languages: matches
            .get_many::<String>("languages")
            .map(|values| values.map(|v| v.trim().to_string()).collect()),
        layout,
        destination: matches.get_one::<String>("destination").map(PathBuf::from),
    };

    match run(&source, Path::new(config_path), matches.get_flag("mock"), &options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    source: &Path,
    config_path: &Path,
    use_mock: bool,
    options: &DriverOptions,
) -> idiom::Result<()> {
    let config = Config::load_or_default(config_path)?;
    let translator: Box<dyn MachineTranslator> = if use_mock {
        Box::new(MockTranslator::new(MockMode::Suffix))
    } else {
        config.translator()?
    };

    let reports = translate_all(source, &config, translator.as_ref(), &FileAppender, options).await?;

    for report in &reports {
        for locale in &report.locales {
            if let Some(path) = &locale.written_to {
                info!(
                    "{}: {} translated, {} skipped, {} dropped → {}",
                    locale.locale,
                    locale.translated,
                    locale.skipped,
                    locale.dropped,
                    path.display()
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_languages_are_split() {
        let matches = cli()
            .try_get_matches_from(["idiom", "--languages", "de-DE,fr-FR", "translations"])
            .unwrap();
        let languages: Vec<_> = matches.get_many::<String>("languages").unwrap().collect();
        assert_eq!(languages, vec!["de-DE", "fr-FR"]);
    }

    #[test]
    fn test_use_dirs_conflict() {
        let result = cli().try_get_matches_from(["idiom", "--use-dirs", "--no-use-dirs", "x"]);
        assert!(result.is_err());
    }
}
