//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::error::TermError;
use crate::term::Terminal;
use crate::viewport::ScreenGeometry;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

/// The byte a terminal sends for Ctrl+`c`.
pub const fn ctrl(c: u8) -> u8 {
    c & 0x1f
}

struct State {
    /// `None` is a poll that timed out.
    input: VecDeque<Option<u8>>,
    output: Vec<u8>,
    parsed: usize,
    geometry: ScreenGeometry,
    cursor_row: u16,
    reports: bool,
}

/// A scripted terminal. Clones share state, so a test can keep a handle
/// while the session owns another.
///
/// It follows cursor moves and line feeds in the output well enough to
/// answer cursor position requests the way a real terminal would.
#[derive(Clone)]
pub struct FakeTerminal {
    state: Rc<RefCell<State>>,
}

impl FakeTerminal {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                input: VecDeque::new(),
                output: Vec::new(),
                parsed: 0,
                geometry: ScreenGeometry { rows, cols },
                cursor_row: 1,
                reports: true,
            })),
        }
    }

    pub fn with_keys(self, keys: &[u8]) -> Self {
        self.push_keys(keys);
        self
    }

    pub fn without_cursor_reports(self) -> Self {
        self.state.borrow_mut().reports = false;
        self
    }

    pub fn push_keys(&self, keys: &[u8]) {
        self.state
            .borrow_mut()
            .input
            .extend(keys.iter().copied().map(Some));
    }

    pub fn push_idle(&self) {
        self.state.borrow_mut().input.push_back(None);
    }

    pub fn set_cursor_row(&self, row: u16) {
        self.state.borrow_mut().cursor_row = row;
    }

    pub fn cursor_row(&self) -> u16 {
        self.state.borrow().cursor_row
    }

    pub fn set_geometry(&self, rows: u16, cols: u16) {
        self.state.borrow_mut().geometry = ScreenGeometry { rows, cols };
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.state.borrow().output).into_owned()
    }
}

impl State {
    fn track(&mut self) {
        while self.parsed < self.output.len() {
            let start = self.parsed;
            match self.output[start] {
                0x1b if self.output.get(start + 1) == Some(&b'[') => {
                    let Some(len) = self.output[start + 2..]
                        .iter()
                        .position(|b| (0x40..=0x7e).contains(b))
                    else {
                        // sequence not complete yet
                        return;
                    };
                    let end = start + 2 + len;
                    let params = String::from_utf8_lossy(&self.output[start + 2..end]).into_owned();
                    self.apply(&params, self.output[end]);
                    self.parsed = end + 1;
                }
                0x1b if start + 1 == self.output.len() => return,
                b'\n' => {
                    self.cursor_row = (self.cursor_row + 1).min(self.geometry.rows);
                    self.parsed += 1;
                }
                _ => self.parsed += 1,
            }
        }
    }

    fn apply(&mut self, params: &str, action: u8) {
        match action {
            b'H' => {
                let row = params.split(';').next().unwrap_or("");
                self.cursor_row = row.parse().unwrap_or(1);
            }
            b'n' if params == "6" && self.reports => {
                let report = format!("\x1b[{};1R", self.cursor_row);
                for byte in report.bytes().rev() {
                    self.input.push_front(Some(byte));
                }
            }
            _ => {}
        }
    }
}

impl Write for FakeTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.output.extend_from_slice(buf);
        state.track();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Terminal for FakeTerminal {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.state.borrow_mut().input.pop_front() {
            Some(byte) => Ok(byte),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "key script exhausted",
            )),
        }
    }

    fn window_size(&self) -> Result<ScreenGeometry, TermError> {
        Ok(self.state.borrow().geometry)
    }
}
