//! `mklwrap inspect` command

use anyhow::{Context, Result};

use super::{load_settings, scan_options};
use crate::cli::InspectArgs;
use mklwrap::ops::{format_table, scan, InspectReport};

pub fn execute(args: InspectArgs) -> Result<()> {
    let settings = load_settings(&args.scan)?;
    let report = scan(&scan_options(&args.scan, &settings))?;
    let inspect = InspectReport::new(&report);

    if args.json {
        let json = serde_json::to_string_pretty(&inspect).context("failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", format_table(&inspect));
    }

    Ok(())
}
