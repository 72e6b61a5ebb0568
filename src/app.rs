use crate::config::Config;
use crate::listing::{self, Entry};
use crate::signals::Signals;
use crate::term::{self, Key, Terminal};
use crate::ui;
use crate::viewport::{ScreenGeometry, Viewport};
use color_eyre::{eyre::WrapErr, Result};
use crossterm::{cursor, queue};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(OsString),
    Cancelled,
}

enum Action {
    Continue,
    Repaint,
    Done(Outcome),
}

/// One browse session on a terminal.
///
/// Dropping the session erases whatever it drew, so the UI is cleaned up on
/// every way out of [`App::run`], errors included.
pub struct App<T: Terminal> {
    term: T,
    view: Viewport,
    geometry: ScreenGeometry,
    cwd: PathBuf,
    entries: Vec<Entry>,
    show_hidden: bool,
    drawn: bool,
}

impl<T: Terminal> App<T> {
    pub fn new(
        term: T,
        config: &Config,
        cwd: PathBuf,
        entries: Vec<Entry>,
        show_hidden: bool,
    ) -> Self {
        Self {
            term,
            view: Viewport::new(config.max_rows),
            geometry: ScreenGeometry { rows: 0, cols: 0 },
            cwd,
            entries,
            show_hidden,
            drawn: false,
        }
    }

    pub fn run(&mut self, signals: &Signals) -> Result<Outcome> {
        self.start()?;

        loop {
            if signals.terminated() {
                log::info!("terminated by signal");
                return Ok(Outcome::Cancelled);
            }
            if signals.take_resize() {
                self.resize()?;
            }

            let Some(key) = term::read_key(&mut self.term)? else {
                continue;
            };
            match self.handle_key(key)? {
                Action::Continue => {}
                Action::Repaint => self.repaint()?,
                Action::Done(outcome) => {
                    log::info!("finished: {:?}", outcome);
                    return Ok(outcome);
                }
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        self.geometry = self.term.window_size()?;
        let (row, _) = term::cursor_position(&mut self.term)?;
        self.view.initialize(self.geometry, row)?;
        self.view.reset(self.entries.len());
        self.drawn = true;

        // Only real line feeds make a terminal scroll, cursor moves never do.
        for _ in 0..self.view.reserve(self.geometry) {
            self.term.write_all(b"\r\n")?;
        }
        queue!(self.term, cursor::Hide)?;

        log::debug!(
            "screen {}x{}, cursor row {}, anchor row {}, {} rows",
            self.geometry.rows,
            self.geometry.cols,
            row,
            self.view.anchor_row(),
            self.view.total_rows()
        );
        self.repaint()
    }

    fn resize(&mut self) -> Result<()> {
        let geometry = self.term.window_size()?;
        let (row, _) = term::cursor_position(&mut self.term)?;

        let mut next = self.view;
        next.on_resize(geometry, row, self.entries.len())?;
        self.geometry = geometry;
        self.view = next;

        log::debug!(
            "resized to {}x{}, anchor row {}, scroll {}, cursor offset {}",
            geometry.rows,
            geometry.cols,
            self.view.anchor_row(),
            self.view.scroll(),
            self.view.cursor_offset()
        );
        self.repaint()
    }

    fn repaint(&mut self) -> Result<()> {
        let header = self.cwd.display().to_string();
        ui::repaint(
            &mut self.term,
            &self.view,
            &header,
            &self.entries,
            self.geometry.cols,
        )?;
        Ok(())
    }

    fn highlighted(&self) -> Option<&Entry> {
        self.view
            .selected(self.entries.len())
            .and_then(|index| self.entries.get(index))
    }

    fn handle_key(&mut self, key: Key) -> Result<Action> {
        let count = self.entries.len();
        let page = self.view.entry_rows() as isize;
        let before = self.view;

        match key {
            Key::Char(b'q') | Key::Esc | Key::Ctrl(b'c') | Key::Ctrl(b'd') => {
                return Ok(Action::Done(Outcome::Cancelled));
            }

            Key::Down | Key::Char(b'j') => self.view.move_cursor(1, count),
            Key::Up | Key::Char(b'k') => self.view.move_cursor(-1, count),
            Key::PageDown => self.view.move_cursor(page, count),
            Key::PageUp => self.view.move_cursor(-page, count),
            Key::Home | Key::Char(b'g') => self.view.select(0, count),
            Key::End | Key::Char(b'G') => self.view.select(count.saturating_sub(1), count),

            Key::Enter => return self.activate(),
            Key::Right | Key::Char(b'l') => {
                if self.highlighted().is_some_and(|e| e.is_dir) {
                    return self.activate();
                }
            }
            Key::Left | Key::Backspace | Key::Char(b'h') => return self.leave_dir(),

            Key::Char(b'.') => return self.toggle_hidden(),
            Key::Ctrl(b'l') => return self.refresh(),

            _ => {}
        }

        if self.view == before {
            Ok(Action::Continue)
        } else {
            Ok(Action::Repaint)
        }
    }

    /// Enters the highlighted directory or selects the highlighted file.
    fn activate(&mut self) -> Result<Action> {
        let Some(entry) = self.highlighted() else {
            return Ok(Action::Continue);
        };

        if entry.is_dir {
            let dir = self.cwd.join(&entry.name);
            self.change_dir(dir, None)
        } else {
            Ok(Action::Done(Outcome::Selected(entry.name.clone())))
        }
    }

    fn leave_dir(&mut self) -> Result<Action> {
        let Some(parent) = self.cwd.parent().map(PathBuf::from) else {
            return Ok(Action::Continue);
        };
        let came_from = self.cwd.file_name().map(OsString::from);
        self.change_dir(parent, came_from.as_deref())
    }

    fn toggle_hidden(&mut self) -> Result<Action> {
        self.show_hidden = !self.show_hidden;
        let current = self.highlighted().map(|e| e.name.clone());
        self.change_dir(self.cwd.clone(), current.as_deref())
    }

    /// Lists `dir` and shows it in place, highlighting `focus` when present.
    fn change_dir(&mut self, dir: PathBuf, focus: Option<&OsStr>) -> Result<Action> {
        let entries = listing::read_entries(&dir, self.show_hidden)
            .wrap_err_with(|| format!("cannot read directory {}", dir.display()))?;
        log::debug!("listing {} ({} entries)", dir.display(), entries.len());

        self.cwd = dir;
        self.entries = entries;
        self.view.reset(self.entries.len());
        if let Some(name) = focus {
            if let Some(index) = self.entries.iter().position(|e| e.name.as_os_str() == name) {
                self.view.select(index, self.entries.len());
            }
        }
        Ok(Action::Repaint)
    }

    /// Clears the whole screen and redraws the UI at the top.
    fn refresh(&mut self) -> Result<Action> {
        let geometry = self.term.window_size()?;
        let mut next = self.view;
        next.on_resize(geometry, next.cursor_row() as u16, self.entries.len())?;
        next.relocate(1);

        term::clear_screen(&mut self.term)?;
        self.geometry = geometry;
        self.view = next;
        Ok(Action::Repaint)
    }
}

impl<T: Terminal> Drop for App<T> {
    fn drop(&mut self) {
        if self.drawn {
            if let Err(e) = ui::erase(&mut self.term, &self.view) {
                log::warn!("failed to erase UI: {}", e);
            }
        }
    }
}
