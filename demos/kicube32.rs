// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  kicube32.rs - Generate kipart pin tables from STM32CubeMX projects.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use clap::Parser;

use kicube::board::PinSelections;
use kicube::library::Library;
use kicube::pin::read_pin_table_file;
use kicube::project::Project;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The STM32CubeMX project file (.ioc).
    ioc: String,

    /// The pin table exported from the project (.csv).
    pins: String,

    /// The kipart pin table to write (.csv).
    output: String,

    /// Pin to use for a solder-bridged connector position. May be repeated.
    #[arg(long = "select", value_name = "NAME", default_values = ["PC0", "PC1"])]
    selections: Vec<String>,

    /// Library drawn by kipart from the output pin table.
    #[arg(long, value_name = "GENERATED.lib", requires = "library")]
    merge: Option<String>,

    /// Library to copy the drawn symbol into.
    #[arg(long, value_name = "TARGET.lib", requires = "merge")]
    library: Option<String>,
}

fn modified(path: &str) -> Result<DateTime<Local>, std::io::Error> {
    let time: SystemTime = fs::metadata(path)?.modified()?;
    Ok(DateTime::from(time))
}

fn has_extension(path: &str, extension: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    for (path, extension) in [(&args.ioc, "ioc"), (&args.pins, "csv"), (&args.output, "csv")] {
        if !has_extension(path, extension) {
            eprintln!("File name {:?} does not end in \".{}\"", path, extension);
            return ExitCode::FAILURE;
        }
    }

    let (ioc_time, pins_time) = match (modified(&args.ioc), modified(&args.pins)) {
        (Ok(ioc_time), Ok(pins_time)) => (ioc_time, pins_time),
        (Err(error), _) | (_, Err(error)) => {
            eprintln!("Error reading file times: {}", error);
            return ExitCode::FAILURE;
        }
    };
    if ioc_time >= pins_time {
        eprintln!(
            "File {:?} (modified {}) has changed since {:?} (modified {}). Please export the pin table again.",
            &args.ioc,
            ioc_time.format("%Y-%m-%d %H:%M:%S"),
            &args.pins,
            pins_time.format("%Y-%m-%d %H:%M:%S"),
        );
        return ExitCode::FAILURE;
    }

    let project = match Project::from_path(&args.ioc) {
        Ok(project) => project,
        Err(error) => {
            eprintln!("Error reading project {:?}: {}", &args.ioc, error);
            return ExitCode::FAILURE;
        }
    };

    let pins = match read_pin_table_file(&args.pins) {
        Ok(pins) => pins,
        Err(error) => {
            eprintln!("Error reading pin table {:?}: {}", &args.pins, error);
            return ExitCode::FAILURE;
        }
    };

    let selections: PinSelections = args.selections.iter().cloned().collect();
    let conversion = match project.convert(&pins, &selections) {
        Ok(conversion) => conversion,
        Err(error) => {
            eprintln!("Error converting {:?}: {}", &args.pins, error);
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = conversion.table.save(&args.output) {
        eprintln!("Error writing {:?}: {}", &args.output, error);
        return ExitCode::FAILURE;
    }
    println!(
        "Wrote {} pins of {} to {:?} ({} warnings)",
        conversion.table.rows.len(),
        conversion.target,
        &args.output,
        conversion.warnings.len()
    );

    if let (Some(generated), Some(target)) = (&args.merge, &args.library) {
        let symbol_name = &conversion.table.header.symbol_name;
        let result = Library::from_file(generated).and_then(|generated| {
            let mut symbol = generated.lookup(symbol_name)?.clone();
            symbol.fixup();
            let mut library = Library::from_file(target)?;
            library.insert(symbol);
            library.save(target)
        });
        if let Err(error) = result {
            eprintln!("Error merging {:?} into {:?}: {}", symbol_name, target, error);
            return ExitCode::FAILURE;
        }
        println!("Merged {:?} into {:?}", symbol_name, target);
    }

    ExitCode::SUCCESS
}
