// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error and warning types for the kicube library.
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

use thiserror::Error;

/// Errors that abort a conversion.
#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: expected 5 fields, found {found}")]
    MalformedRow { line: u64, found: usize },
    #[error("malformed library at line {line}: {reason}")]
    MalformedLibrary { line: usize, reason: String },
    #[error("duplicate symbol {0:?}")]
    DuplicateSymbol(String),
    #[error("symbol {0:?} not found")]
    SymbolNotFound(String),
    #[error("connector pin {position} is shared: select either {first:?} or {second:?}")]
    AmbiguousPinSelection {
        position: u16,
        first: String,
        second: String,
    },
    #[error("unknown board {0:?}")]
    UnknownBoard(String),
    #[error("processor {processor:?} is not available on {family} boards")]
    UnknownProcessor { family: String, processor: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Anomalies found while classifying or assembling pins.
///
/// These never abort a conversion. The affected pin is still emitted with a
/// fallback classification (or dropped, for [Warning::UnboundName]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("unhandled I/O signal {signal:?} for {name:?}")]
    UnrecognizedSignal { name: String, signal: String },
    #[error("unrecognized I2C signal {0:?}")]
    UnrecognizedI2cSignal(String),
    #[error("unrecognized RCC signal {0:?}")]
    UnrecognizedRccSignal(String),
    #[error("unrecognized UART/USART signal {0:?}")]
    UnrecognizedUartSignal(String),
    #[error("unhandled USB signal {0:?}")]
    UnhandledUsbSignal(String),
    #[error("unhandled {direction} label {label:?}")]
    UnhandledLabel {
        direction: &'static str,
        label: String,
    },
    #[error("unrecognized power pin {0:?}")]
    UnrecognizedPower(String),
    #[error("unrecognized pin kind {kind:?} for {name:?}")]
    UnrecognizedKind { name: String, kind: String },
    #[error("unknown I/O name {name:?} (trimmed name {trimmed_name:?})")]
    UnparseablePortName { name: String, trimmed_name: String },
    #[error("unparseable pin position {0:?}")]
    UnparseablePosition(String),
    #[error("no chip pin for board binding {name:?} at position {position}")]
    UnboundName { position: u16, name: String },
}
