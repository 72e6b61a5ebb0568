//! Raw terminal access over `/dev/tty`.
//!
//! The UI is never written to stdout: that stream carries only the final
//! selection, so it can be captured by the shell.

use crate::error::TermError;
use crate::viewport::ScreenGeometry;
use crossterm::{
    queue,
    terminal::{Clear, ClearType},
};
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;

nix::ioctl_read_bad!(tiocgwinsz, nix::libc::TIOCGWINSZ, nix::libc::winsize);

const CURSOR_REPORT_LEN: usize = 32;
const CURSOR_REPORT_POLLS: usize = 10;
/// Longest control sequence body the key decoder will wait for.
const CSI_MAX_LEN: usize = 16;

const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Backspace,
    Esc,
    /// Control chord, stored as the lowercase letter (`Ctrl(b'c')`).
    Ctrl(u8),
    Char(u8),
    /// A sequence that was read in full but has no binding, such as a
    /// function key or an Alt chord.
    Unknown,
}

/// What the navigation session needs from a terminal.
pub trait Terminal: Write {
    /// Waits at most one poll interval for a byte.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    fn window_size(&self) -> Result<ScreenGeometry, TermError>;
}

/// The controlling terminal in raw mode.
///
/// The line discipline in effect when the value was created is reapplied
/// when it is dropped.
pub struct Tty {
    file: File,
    original: Termios,
}

impl Tty {
    pub fn open() -> Result<Self, TermError> {
        let file = File::options()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(TermError::Open)?;
        Self::new(file)
    }

    pub fn new(file: File) -> Result<Self, TermError> {
        let original = termios::tcgetattr(&file)?;
        termios::tcsetattr(&file, SetArg::TCSAFLUSH, &raw_mode(&original))?;
        Ok(Self { file, original })
    }

    /// Reapplies the saved line discipline. Safe to call more than once.
    pub fn restore(&self) -> Result<(), TermError> {
        termios::tcsetattr(&self.file, SetArg::TCSAFLUSH, &self.original)?;
        Ok(())
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::error!("failed to restore terminal: {}", e);
            eprintln!("browse: failed to restore terminal: {}", e);
        }
    }
}

fn raw_mode(original: &Termios) -> Termios {
    let mut raw = original.clone();
    raw.input_flags &= !(InputFlags::BRKINT
        | InputFlags::ICRNL
        | InputFlags::INPCK
        | InputFlags::ISTRIP
        | InputFlags::IXON);
    raw.output_flags &= !OutputFlags::OPOST;
    raw.control_flags |= ControlFlags::CS8;
    raw.local_flags &=
        !(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
    // return after 100ms even when nothing was typed
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 1;
    raw
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Terminal for Tty {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.file.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn window_size(&self) -> Result<ScreenGeometry, TermError> {
        let mut ws = nix::libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: the descriptor is open for the lifetime of `self` and `ws`
        // is a valid out-pointer for TIOCGWINSZ.
        unsafe { tiocgwinsz(self.file.as_raw_fd(), &mut ws) }?;
        if ws.ws_col == 0 || ws.ws_row == 0 {
            return Err(TermError::NoGeometry);
        }
        Ok(ScreenGeometry {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    }
}

/// Asks the terminal where the cursor is. Returns 1-based `(row, col)`.
pub fn cursor_position<T: Terminal + ?Sized>(term: &mut T) -> Result<(u16, u16), TermError> {
    term.write_all(b"\x1b[6n")?;
    term.flush()?;

    let mut buf = Vec::with_capacity(CURSOR_REPORT_LEN);
    let mut idle = 0;
    while buf.len() < CURSOR_REPORT_LEN - 1 {
        match term.read_byte()? {
            Some(b'R') => return parse_cursor_report(&buf),
            Some(byte) => {
                buf.push(byte);
                idle = 0;
            }
            None => {
                idle += 1;
                if idle >= CURSOR_REPORT_POLLS {
                    break;
                }
            }
        }
    }
    Err(TermError::CursorReport)
}

/// Parses `ESC [ row ; col` (the report without its `R` terminator).
pub fn parse_cursor_report(report: &[u8]) -> Result<(u16, u16), TermError> {
    let body = report
        .strip_prefix(&[ESC, b'['])
        .ok_or(TermError::CursorReport)?;
    let body = std::str::from_utf8(body).map_err(|_| TermError::CursorReport)?;
    let (row, col) = body.split_once(';').ok_or(TermError::CursorReport)?;

    let row: u16 = row.parse().map_err(|_| TermError::CursorReport)?;
    let col: u16 = col.parse().map_err(|_| TermError::CursorReport)?;
    if row == 0 || col == 0 {
        return Err(TermError::CursorReport);
    }
    Ok((row, col))
}

/// Clears the whole screen and homes the cursor with a bare `ESC [ H`.
pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, Clear(ClearType::All))?;
    out.write_all(b"\x1b[H")
}

/// Polls once for a keypress, decoding arrow and paging sequences.
pub fn read_key<T: Terminal + ?Sized>(term: &mut T) -> io::Result<Option<Key>> {
    let Some(byte) = term.read_byte()? else {
        return Ok(None);
    };

    let key = match byte {
        b'\r' | b'\n' => Key::Enter,
        0x7f | 0x08 => Key::Backspace,
        ESC => read_escape(term)?,
        b if b < 0x20 => Key::Ctrl(b | 0x60),
        b => Key::Char(b),
    };
    Ok(Some(key))
}

fn read_escape<T: Terminal + ?Sized>(term: &mut T) -> io::Result<Key> {
    let key = match term.read_byte()? {
        None | Some(ESC) => Key::Esc,
        Some(b'[') => read_csi(term)?,
        Some(b'O') => match term.read_byte()? {
            Some(b'A') => Key::Up,
            Some(b'B') => Key::Down,
            Some(b'C') => Key::Right,
            Some(b'D') => Key::Left,
            Some(b'H') => Key::Home,
            Some(b'F') => Key::End,
            _ => Key::Unknown,
        },
        // Alt chord
        Some(_) => Key::Unknown,
    };
    Ok(key)
}

/// Reads a control sequence through its final byte, so keys with no binding
/// never leave parameter bytes behind to be read as keys.
fn read_csi<T: Terminal + ?Sized>(term: &mut T) -> io::Result<Key> {
    let mut params = Vec::new();
    let last = loop {
        match term.read_byte()? {
            Some(byte @ 0x40..=0x7e) => break byte,
            Some(byte) if params.len() < CSI_MAX_LEN => params.push(byte),
            _ => return Ok(Key::Unknown),
        }
    };

    let key = match (params.as_slice(), last) {
        (b"", b'A') => Key::Up,
        (b"", b'B') => Key::Down,
        (b"", b'C') => Key::Right,
        (b"", b'D') => Key::Left,
        (b"", b'H') => Key::Home,
        (b"", b'F') => Key::End,
        (b"1" | b"7", b'~') => Key::Home,
        (b"4" | b"8", b'~') => Key::End,
        (b"5", b'~') => Key::PageUp,
        (b"6", b'~') => Key::PageDown,
        _ => Key::Unknown,
    };
    Ok(key)
}
