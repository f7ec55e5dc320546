// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  tests/pipeline.rs - End-to-end conversion tests.
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
use std::path::PathBuf;

use kicube::Warning;
use kicube::assembler::SymbolHeader;
use kicube::board::PinSelections;
use kicube::doclib::DocLibrary;
use kicube::library::Library;
use kicube::pin::read_pin_table_file;
use kicube::project::Project;

macro_rules! test_path {
    ($fname:expr) => {
        concat!(env!("CARGO_MANIFEST_DIR"), "/resources/test/", $fname)
    };
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir =
        std::env::temp_dir().join(format!("kicube-pipeline-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn selections() -> PinSelections {
    ["PC0", "PC1"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn nucleo64_pin_table() {
    let project = Project::from_path(test_path!("f030r8.ioc")).unwrap();
    let pins = read_pin_table_file(test_path!("nucleo-f030r8.csv")).unwrap();
    let conversion = project.convert(&pins, &selections()).unwrap();

    let dir = scratch_dir("table");
    let output = dir.join("f030r8.kipart.csv");
    conversion.table.save(&output).unwrap();
    let text = fs::read_to_string(&output).unwrap();

    let mut lines = text.lines();
    let header = SymbolHeader::from_line(lines.next().unwrap()).unwrap().unwrap();
    assert_eq!(header, conversion.table.header);
    assert_eq!(
        lines.next(),
        Some("\"Pin\", \"Unit\", \"Type\", \"Name\", \"Style\", \"Side\"")
    );
    assert!(text.ends_with(",,,,,,\n\n"));
    assert!(text.contains(
        "\"1035\", \"PA\", \"output\", \"PA2(USART2_TX)\", \"line\", \"right\"\n"
    ));
    assert!(text.contains("\"714\", \"YMISC\", \"input\", \"RESET\", \"line\", \"right\"\n"));

    // The F030R8 has no VBAT pin.
    let unbound: Vec<&Warning> = conversion
        .warnings
        .iter()
        .filter(|warning| matches!(warning, Warning::UnboundName { .. }))
        .collect();
    assert!(!unbound.is_empty());

    // Ports come before the misc and power units.
    let units: Vec<String> = conversion
        .table
        .rows
        .iter()
        .map(|row| row.unit.to_string())
        .collect();
    let first_misc = units.iter().position(|unit| unit == "YMISC").unwrap();
    let first_power = units.iter().position(|unit| unit == "ZPWR").unwrap();
    assert!(units[..first_misc].iter().all(|unit| unit.starts_with('P')));
    assert!(units[first_power..].iter().all(|unit| unit == "ZPWR"));

    let doclib = DocLibrary::from_dir(&dir).unwrap();
    assert_eq!(doclib.entries.len(), 1);
    assert_eq!(doclib.entries[0].name, "F030R8;NUCLEO64");
    assert_eq!(doclib.entries[0].keywords, "Nucleo64 STM32F030R8");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn merge_drawn_symbol_into_library() {
    let generated = Library::from_file(test_path!("nucleo64.lib")).unwrap();
    let mut symbol = generated.lookup("F030R8;NUCLEO64").unwrap().clone();
    symbol.fixup();

    let mut library = Library::new();
    library.insert(symbol);

    let dir = scratch_dir("merge");
    let target = dir.join("nucleo.lib");
    library.save(&target).unwrap();

    let merged = Library::from_file(&target).unwrap();
    let lines = &merged.lookup("F030R8;NUCLEO64").unwrap().lines;
    assert!(lines.iter().any(|line| line == "F0 \"N\" 0 100 50 H V L CNN"));
    assert!(lines.iter().any(|line| line == "F2 \"\" 0 0 50 H I C CNN"));
    assert!(lines.iter().any(|line| line.ends_with("10 f N")));

    fs::remove_dir_all(&dir).unwrap();
}
