use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use devrun::build::{build_site, list_categories};
use devrun::config::Config;
use std::error::Error;
use std::path::Path;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_OUTPUT: &str = "_site";

fn main() {
    let project = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .default_value(".")
        .help("A directory inside the project; devrun.yaml is searched for upward from here");

    let matches = App::new("devrun")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Log debug output"),
        )
        .arg(
            Arg::with_name("quiet")
                .long("quiet")
                .short("q")
                .global(true)
                .conflicts_with("verbose")
                .help("Only log errors"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(project.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .default_value(DEFAULT_OUTPUT)
                        .help("The output directory"),
                ),
        )
        .subcommand(
            SubCommand::with_name("categories")
                .about("Lists the categories, most frequent first")
                .arg(project),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(m)) => {
            init_logging(&matches, m);
            build(m)
        }
        ("categories", Some(m)) => {
            init_logging(&matches, m);
            categories(m)
        }
        _ => unreachable!("a subcommand is required"),
    };

    if let Err(err) = result {
        // the error types fold their causes into their messages
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Initialize logging based on verbosity settings. The flags are global, so
/// they may have been given before or after the subcommand.
fn init_logging(matches: &ArgMatches, subcommand: &ArgMatches) {
    let flag = |name: &str| matches.is_present(name) || subcommand.is_present(name);
    let level = if flag("quiet") {
        tracing::Level::ERROR
    } else if flag("verbose") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    // both arguments have default values
    let project = Path::new(matches.value_of("project").unwrap());
    let output = Path::new(matches.value_of("output").unwrap());

    let config = Config::from_directory(project, output)?;
    build_site(&config)?;
    Ok(())
}

fn categories(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let project = Path::new(matches.value_of("project").unwrap());
    let config = Config::from_directory(project, Path::new(DEFAULT_OUTPUT))?;

    for category in list_categories(&config)? {
        println!("{}", category);
    }
    Ok(())
}
