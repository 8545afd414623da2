use anyhow::Context;
use chrono::Local;
use clap::Parser;
use pmlib::{
    finder::Finder,
    pretty_print::pretty_print,
    relation_matcher::{RelationMatcher, read, read_and_write, write},
    scop::Scop,
};
use std::io::Write;
use std::path::PathBuf;

/// Match access patterns against the reads and writes of a scop
#[derive(Parser)]
struct Cli {
    /// Path to a scop description
    file: PathBuf,
    /// Labels of a read matcher, one character per dimension, e.g. `ij`
    #[arg(long = "read")]
    reads: Vec<String>,
    /// Labels of a write matcher
    #[arg(long = "write")]
    writes: Vec<String>,
    /// Labels of a matcher checked against both reads and writes
    #[arg(long = "read-write")]
    read_writes: Vec<String>,
}

fn labels(arg: &str) -> Vec<char> {
    arg.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    env_logger::builder()
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level()).bold();
            writeln!(
                buf,
                "{}|{level_style}{:7}{level_style:#}|{:10}| {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let scop = Scop::from_file(&args.file)
        .with_context(|| format!("Unable to load scop from {:?}", args.file))?;
    log::info!("Schedule tree:\n{}", pretty_print(&scop.schedule.root()));
    log::info!("Reads: {}", scop.reads);
    log::info!("Writes: {}", scop.writes);

    let matchers: Vec<RelationMatcher> = args
        .reads
        .iter()
        .map(|arg| read(&labels(arg)))
        .chain(args.writes.iter().map(|arg| write(&labels(arg))))
        .chain(args.read_writes.iter().map(|arg| read_and_write(&labels(arg))))
        .collect();
    if matchers.is_empty() {
        log::warn!("No matchers given, nothing to do");
        return Ok(());
    }

    let mut finder = Finder::new(scop.reads, scop.writes, matchers);
    let reports = finder.find_and_print();
    for report in reports.iter() {
        println!("{}", report);
    }
    for matcher in finder.read_matchers().iter().chain(finder.write_matchers()) {
        log::debug!("{}", pretty_print(matcher));
    }
    if reports.is_empty() {
        println!("no matching accesses");
    }
    Ok(())
}
