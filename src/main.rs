use std::error::Error;
use std::io;

use recordlink::{
    dedupe_table, gazetteer_match, left_join_tables, link_tables, read_csv_path, write_csv,
    ConsoleLabeler, RecordLinkConfig,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: recordlink-demo <dedupe|link|left-join|gazetteer> <config.yaml> <table.csv> [<second.csv>]";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, config_path, first, second) = match args.as_slice() {
        [mode, config, first] => (mode.as_str(), config, first, None),
        [mode, config, first, second] => (mode.as_str(), config, first, Some(second)),
        _ => return Err(USAGE.into()),
    };

    let config = RecordLinkConfig::from_file(config_path)?;
    let canonicalize = config.canonicalize();
    let first = read_csv_path(first, None)?;
    let second = second.map(|path| read_csv_path(path, None)).transpose()?;

    // Prompts go to stderr so stdout carries only the result table.
    let stdin = io::stdin();
    let mut labeler = ConsoleLabeler::new(stdin.lock(), io::stderr());

    let result = match (mode, second) {
        ("dedupe", None) => dedupe_table(
            &first,
            &config.fields,
            &config.name,
            &canonicalize,
            &config.dedupe_options(),
            &mut labeler,
        )?,
        ("link", Some(second)) => link_tables(
            &first,
            &second,
            &config.fields,
            &config.name,
            &canonicalize,
            &config.link_options(),
            &mut labeler,
        )?,
        ("left-join", Some(second)) => left_join_tables(
            &first,
            &second,
            &config.fields,
            &config.name,
            &canonicalize,
            &config.dedupe_options(),
            &mut labeler,
        )?,
        ("gazetteer", Some(messy)) => gazetteer_match(
            &first,
            &messy,
            &config.fields,
            &config.name,
            &canonicalize,
            &config.gazetteer_options(),
            &mut labeler,
        )?,
        _ => return Err(USAGE.into()),
    };

    write_csv(&result, io::stdout().lock(), Some("id"))?;
    Ok(())
}
