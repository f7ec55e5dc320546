// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  kidocgen.rs - Generate a KiCad documentation library from kipart tables.
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

use std::process::ExitCode;

use clap::Parser;

use kicube::doclib::DocLibrary;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing *.kipart.csv files.
    csvs_dir: String,

    /// The documentation library to write (.dcm).
    output: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let doclib = match DocLibrary::from_dir(&args.csvs_dir) {
        Ok(doclib) => doclib,
        Err(error) => {
            eprintln!("Error scanning {:?}: {}", &args.csvs_dir, error);
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = doclib.save(&args.output) {
        eprintln!("Error writing {:?}: {}", &args.output, error);
        return ExitCode::FAILURE;
    }

    println!("Wrote {} entries to {:?}", doclib.entries.len(), &args.output);
    ExitCode::SUCCESS
}
