//! gpsdump: print the fix records a gpsd source emits
//!
//! Reads fixed-size binary fix records from stdin, for example the
//! payloads of a pipeline sink, and prints each one.

use clap::Parser;
use gpsdsrc::api::{JsonFormatter, TextFormatter};
use gpsdsrc::core::FixMode;
use gpsdsrc::processing::codec::{self, RecordReader};
use log::{debug, error};
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gpsdump")]
#[command(about = "Dump binary gpsd fix records from stdin in human-readable form", long_about = None)]
struct Args {
    /// Print each record as a JSON object
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match dump(&args) {
        Ok(count) => {
            debug!("dumped {} records", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("I/O error");
            ExitCode::FAILURE
        }
    }
}

fn dump(args: &Args) -> io::Result<u64> {
    let stdin = io::stdin();
    let mut records = RecordReader::new(stdin.lock());
    let mut out = BufWriter::new(io::stdout().lock());
    let text = TextFormatter::new();
    let json = JsonFormatter::new();
    let mut count = 0;

    while let Some(record) = records.next_record()? {
        let fix = codec::decode(&record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        count += 1;

        if args.json {
            if fix.mode() == FixMode::NotSeen {
                continue;
            }
            let line = json.format_json(&fix).map_err(io::Error::from)?;
            writeln!(out, "{}", line)?;
        } else {
            write!(out, "{}", text.format_fix(&fix))?;
            writeln!(out)?;
        }
        out.flush()?;
    }

    Ok(count)
}
