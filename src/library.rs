// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/library.rs - Reader, editor and writer for KiCad symbol libraries.
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
 * # `library` Module
 *
 * This module reads and writes KiCad 5 (`EESchema-LIBRARY Version 2.3`)
 * symbol libraries at the granularity of whole symbol blocks, so a symbol
 * drawn by `kipart` can be copied into a hand-maintained library.
 *
 * Lines inside a `DEF` ... `ENDDEF` block are kept verbatim. Everything
 * outside the blocks (the header and `#` comments) is regenerated on write.
 *
 * ## Usage Example
 *
 * ```no_run
 * use kicube::library::Library;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let generated = Library::from_file("generated.lib")?;
 *     let mut target = Library::from_file("nucleo.lib")?;
 *
 *     let mut symbol = generated.lookup("F030R8;NUCLEO64")?.clone();
 *     symbol.fixup();
 *     target.insert(symbol);
 *     target.save("nucleo.lib")?;
 *
 *     Ok(())
 * }
 * ```
 */

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

const HEADER: &str = "EESchema-LIBRARY Version 2.3";
const ENCODING: &str = "#encoding utf-8";
const FOOTER: &str = "#End Library";

const BLOCK_START: &str = "DEF ";
const BLOCK_END: &str = "ENDDEF";

const F2_FIELD: &str = "F2 \"\" 0 0 50 H I C CNN";
const F3_FIELD: &str = "F3 \"\" 0 0 50 H I C CNN";

/// One `DEF` ... `ENDDEF` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Every line of the block, including `DEF` and `ENDDEF`.
    pub lines: Vec<String>,
}

impl Symbol {
    /// Brings a symbol drawn by `kipart` in line with the conventions of the
    /// hand-maintained libraries. Applying it twice changes nothing.
    ///
    /// - Empty footprint (`F2`) and datasheet (`F3`) fields are added if the
    ///   symbol has none, `F2` after `F1` and `F3` after `F2`.
    /// - The reference designator field `F0 "U"` becomes `F0 "N"`.
    /// - Unfilled rectangles get a background fill (`f N`).
    /// - 60 mil field text shrinks to 50 mil.
    pub fn fixup(&mut self) {
        let has_f3 = self.lines.iter().any(|line| line.starts_with("F3 "));
        if let Some(f1) = self.lines.iter().position(|line| line.starts_with("F1 ")) {
            let f2 = match self.lines.iter().position(|line| line.starts_with("F2 ")) {
                Some(f2) => f2,
                None => {
                    self.lines.insert(f1 + 1, F2_FIELD.to_string());
                    f1 + 1
                }
            };
            if !has_f3 {
                self.lines.insert(f2 + 1, F3_FIELD.to_string());
            }
        }

        for line in self.lines.iter_mut() {
            if let Some(rest) = line.strip_prefix("F0 \"U\"") {
                *line = format!("F0 \"N\"{}", rest);
            }
            if line.starts_with("S ") && line.ends_with(" N") && !line.ends_with(" f N") {
                line.truncate(line.len() - 1);
                line.push_str("f N");
            }
            if let Some(stem) = line.strip_suffix("60 H V L CNN") {
                *line = format!("{}50 H V L CNN", stem);
            }
        }
    }
}

enum ParserState {
    Outside,
    Block {
        name: String,
        start: usize,
        lines: Vec<String>,
    },
}

/// A symbol library, ordered by symbol name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    pub symbols: BTreeMap<String, Symbol>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses library text.
    ///
    /// # Errors
    ///
    /// [Error::MalformedLibrary] for a nested `DEF`, a stray `ENDDEF`, a
    /// `DEF` with no name or a block that is never closed, and
    /// [Error::DuplicateSymbol] if two blocks share a name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut symbols = BTreeMap::new();
        let mut state = ParserState::Outside;

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let malformed = |reason: &str| Error::MalformedLibrary {
                line: line_number,
                reason: reason.to_string(),
            };

            state = match state {
                ParserState::Outside => {
                    if let Some(rest) = line.strip_prefix(BLOCK_START) {
                        let name = rest
                            .split_whitespace()
                            .next()
                            .ok_or_else(|| malformed("DEF without a symbol name"))?;
                        ParserState::Block {
                            name: name.to_string(),
                            start: line_number,
                            lines: vec![line.to_string()],
                        }
                    } else if line.starts_with(BLOCK_END) {
                        return Err(malformed("ENDDEF without a matching DEF"));
                    } else {
                        ParserState::Outside
                    }
                }
                ParserState::Block {
                    name,
                    start,
                    mut lines,
                } => {
                    if line.starts_with(BLOCK_START) {
                        return Err(malformed("DEF inside another symbol"));
                    }
                    lines.push(line.to_string());
                    if line.starts_with(BLOCK_END) {
                        if symbols.contains_key(&name) {
                            return Err(Error::DuplicateSymbol(name));
                        }
                        symbols.insert(name.clone(), Symbol { name, lines });
                        ParserState::Outside
                    } else {
                        ParserState::Block { name, start, lines }
                    }
                }
            };
        }

        if let ParserState::Block { name, start, .. } = state {
            return Err(Error::MalformedLibrary {
                line: start,
                reason: format!("symbol {:?} is missing ENDDEF", name),
            });
        }

        debug!("Parsed {} symbols", symbols.len());
        Ok(Self { symbols })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Returns the symbol named `name`.
    pub fn lookup(&self, name: &str) -> Result<&Symbol> {
        self.symbols
            .get(name)
            .ok_or_else(|| Error::SymbolNotFound(name.to_string()))
    }

    /// Adds `symbol`, replacing any symbol with the same name.
    pub fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(symbol.name.clone(), symbol)
    }

    /// Runs [Symbol::fixup] on every symbol.
    pub fn fixup(&mut self) {
        self.symbols.values_mut().for_each(Symbol::fixup);
    }

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", HEADER)?;
        writeln!(out, "{}", ENCODING)?;
        for symbol in self.symbols.values() {
            writeln!(out, "#")?;
            writeln!(out, "# {}", symbol.name)?;
            writeln!(out, "#")?;
            for line in &symbol.lines {
                writeln!(out, "{}", line)?;
            }
        }
        writeln!(out, "#")?;
        writeln!(out, "{}", FOOTER)
    }

    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        let _ = self.write(&mut buffer);
        String::from_utf8_lossy(&buffer).to_string()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        debug!("Wrote {} symbols", self.symbols.len());
        Ok(())
    }
}
