// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - KiCad symbol generator for STM32CubeMX pin exports.
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

/*!
 * # `kicube` Crate
 *
 * A library for turning STM32CubeMX pin exports into KiCad schematic
 * symbols, either for a bare STM32 chip or for the chip mounted on an STM32
 * Nucleo board.
 *
 * The pipeline looks like this:
 *
 * 1. [pin]: Parses the pin export CSV into pin records.
 * 2. [classifier]: Derives the schematic attributes of each pin.
 * 3. [board]: Maps Nucleo connector positions to chip pins.
 * 4. [assembler]: Joins the two and writes the intermediate pin table read
 *    by `kipart`.
 * 5. [library]: Copies the symbol drawn by `kipart` into a symbol library.
 *
 * [project] drives steps 1 to 4 from a CubeMX project file, and [doclib]
 * builds the matching documentation library.
 *
 * ## Usage Example
 *
 * ```no_run
 * use kicube::board::PinSelections;
 * use kicube::library::Library;
 * use kicube::pin::read_pin_table_file;
 * use kicube::project::Project;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Convert the pin export
 *     let project = Project::from_path("f030r8.ioc")?;
 *     let pins = read_pin_table_file("f030r8.csv")?;
 *     let selections: PinSelections = ["PC0", "PC1"].iter().map(|s| s.to_string()).collect();
 *     let conversion = project.convert(&pins, &selections)?;
 *     conversion.table.save("f030r8.kipart.csv")?;
 *
 *     // After running kipart, merge the symbol into a library
 *     let generated = Library::from_file("f030r8.lib")?;
 *     let mut library = Library::from_file("nucleo.lib")?;
 *     let mut symbol = generated.lookup(&conversion.table.header.symbol_name)?.clone();
 *     symbol.fixup();
 *     library.insert(symbol);
 *     library.save("nucleo.lib")?;
 *
 *     Ok(())
 * }
 * ```
 */

pub mod assembler;
pub mod board;
pub mod classifier;
pub mod doclib;
pub mod error;
pub mod library;
pub mod pin;
pub mod project;

pub use error::{Error, Result, Warning};
