use crate::error::TermError;
use std::ops::Range;

/// Rows above the first entry (the directory path).
pub const HEADER_ROWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub rows: u16,
    pub cols: u16,
}

/// Where the UI sits on the screen and which slice of entries it shows.
///
/// `cursor_offset` is the distance from `anchor_row` to the highlighted
/// row. The terminal cursor is parked there after each paint, which is what
/// lets a resize recover the anchor from the reported cursor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    anchor_row: usize,
    scroll: usize,
    cursor_offset: usize,
    total_rows: usize,
    max_rows: usize,
}

impl Viewport {
    pub fn new(max_rows: usize) -> Self {
        Self {
            anchor_row: 1,
            scroll: 0,
            cursor_offset: 0,
            total_rows: max_rows,
            max_rows,
        }
    }

    pub fn anchor_row(&self) -> usize {
        self.anchor_row
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor_offset
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn entry_rows(&self) -> usize {
        self.total_rows - HEADER_ROWS
    }

    /// Terminal row the cursor is parked on between paints.
    pub fn cursor_row(&self) -> usize {
        self.anchor_row + self.cursor_offset
    }

    /// Index of the highlighted entry, if there is one.
    pub fn selected(&self, count: usize) -> Option<usize> {
        if count == 0 {
            None
        } else {
            Some(self.scroll + self.cursor_offset - HEADER_ROWS)
        }
    }

    /// Entries currently on screen.
    pub fn visible(&self, count: usize) -> Range<usize> {
        let end = (self.scroll + self.entry_rows()).min(count);
        self.scroll.min(end)..end
    }

    pub fn initialize(
        &mut self,
        geometry: ScreenGeometry,
        current_row: u16,
    ) -> Result<(), TermError> {
        self.fit(geometry)?;
        self.anchor_row = (current_row as usize).saturating_sub(self.cursor_offset).max(1);
        Ok(())
    }

    /// Moves the anchor below the prompt line and returns how many line
    /// feeds have to be written so the terminal has room for the whole UI.
    pub fn reserve(&mut self, geometry: ScreenGeometry) -> usize {
        let last_anchor = (geometry.rows as usize + 1).saturating_sub(self.total_rows).max(1);
        self.anchor_row = (self.anchor_row + 1).min(last_anchor);
        self.total_rows
    }

    pub fn on_resize(
        &mut self,
        geometry: ScreenGeometry,
        current_row: u16,
        count: usize,
    ) -> Result<(), TermError> {
        let selected = self.selected(count);
        self.anchor_row = (current_row as usize).saturating_sub(self.cursor_offset).max(1);
        self.fit(geometry)?;

        let last_anchor = (geometry.rows as usize + 1).saturating_sub(self.total_rows).max(1);
        self.anchor_row = self.anchor_row.min(last_anchor);
        match selected {
            Some(index) => self.settle(index, count),
            None => self.reset(count),
        }
        Ok(())
    }

    /// Re-anchors at a known row, e.g. after clearing the screen.
    pub fn relocate(&mut self, anchor_row: usize) {
        self.anchor_row = anchor_row.max(1);
    }

    pub fn reset(&mut self, count: usize) {
        self.scroll = 0;
        self.cursor_offset = if count == 0 { 0 } else { HEADER_ROWS };
    }

    pub fn move_cursor(&mut self, delta: isize, count: usize) {
        if let Some(current) = self.selected(count) {
            let target = (current as isize + delta).clamp(0, count as isize - 1) as usize;
            self.settle(target, count);
        }
    }

    pub fn select(&mut self, index: usize, count: usize) {
        if count == 0 {
            self.reset(count);
        } else {
            self.settle(index.min(count - 1), count);
        }
    }

    fn fit(&mut self, geometry: ScreenGeometry) -> Result<(), TermError> {
        let total = self.max_rows.min(geometry.rows as usize);
        if total <= HEADER_ROWS {
            return Err(TermError::TooSmall {
                rows: geometry.rows,
            });
        }
        self.total_rows = total;
        Ok(())
    }

    /// Highlights `index`, scrolling no further than needed to show it.
    fn settle(&mut self, index: usize, count: usize) {
        let rows = self.entry_rows();
        if index < self.scroll {
            self.scroll = index;
        } else if index >= self.scroll + rows {
            self.scroll = index + 1 - rows;
        }
        self.scroll = self.scroll.min(count.saturating_sub(rows));
        self.cursor_offset = HEADER_ROWS + index - self.scroll;
    }
}
