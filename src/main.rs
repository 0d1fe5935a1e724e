use std::io::{self, Write};
use std::process;

use anyhow::Result;
use clap::{
    arg, crate_authors, crate_name, crate_version, error::ErrorKind, ArgAction, ArgMatches,
    Command,
};
use portscan::{
    logger,
    report::Report,
    resolver::ScanTarget,
    scan::{PortRange, Scanner},
};

struct ParsedArgs {
    debug: bool,
    hostname: String,
    range: PortRange,
}

fn parse_args(matches: ArgMatches) -> ParsedArgs {
    let debug = matches.get_flag("debug");
    let hostname = matches
        .get_one::<String>("hostname")
        .expect("hostname is a required argument")
        .to_owned();
    let range = PortRange::select(matches.get_one::<String>("range").map(String::as_str));

    ParsedArgs {
        debug,
        hostname,
        range,
    }
}

fn command() -> Command {
    Command::new(crate_name!())
        .about(
            "Concurrent TCP connect port scanner.\n\
            Scans ports 1-1024, or every port with `full`.",
        )
        .version(crate_version!())
        .author(crate_authors!())
        .args([
            arg!(-d --debug "Turns on debugging information").action(ArgAction::SetTrue),
            arg!(<hostname> "Address or hostname to scan"),
            arg!([range] "`full` or `true` scans ports 1-65535"),
        ])
}

fn print_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    write!(out, "{}", report)?;
    out.flush()
}

fn main() -> Result<()> {
    let arg_matches = command()
        .try_get_matches()
        .unwrap_or_else(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                // Usage errors go to stderr with exit code 1.
                let _ = e.print();
                process::exit(1);
            }
        });

    // Extract arguments.
    let parsed = parse_args(arg_matches);

    // Set debug if desired.
    if parsed.debug {
        logger::init();
    }

    // Validate target before probing anything.
    let target = ScanTarget::resolve(&parsed.hostname)?;
    log::debug!("Target `{}` resolved to `{}`", target.hostname(), target.ip());

    // Start scanner.
    let result = Scanner::new(target.ip(), parsed.range).start()?;

    // Show result.
    print_report(&mut io::stdout().lock(), &Report::new(result.ports))?;

    Ok(())
}
