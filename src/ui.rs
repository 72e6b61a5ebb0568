use crate::listing::Entry;
use crate::viewport::Viewport;
use crossterm::{
    cursor::{self, MoveTo},
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Draws the header and the visible slice of entries at the anchor row,
/// then parks the cursor on the highlighted row.
pub fn repaint<W: Write>(
    out: &mut W,
    view: &Viewport,
    header: &str,
    entries: &[Entry],
    cols: u16,
) -> io::Result<()> {
    let width = cols as usize;
    let selected = view.selected(entries.len());

    queue!(
        out,
        MoveTo(0, row_index(view.anchor_row())),
        Clear(ClearType::FromCursorDown),
        Print(truncate(header, width))
    )?;

    for index in view.visible(entries.len()) {
        let label = truncate(&entries[index].label(), width);
        queue!(out, Print("\r\n"))?;
        if Some(index) == selected {
            queue!(
                out,
                SetAttribute(Attribute::Reverse),
                Print(label),
                SetAttribute(Attribute::Reset)
            )?;
        } else {
            queue!(out, Print(label))?;
        }
    }

    queue!(out, MoveTo(0, row_index(view.cursor_row())))?;
    out.flush()
}

/// Removes the UI and leaves the cursor where the UI started.
pub fn erase<W: Write>(out: &mut W, view: &Viewport) -> io::Result<()> {
    queue!(
        out,
        MoveTo(0, row_index(view.anchor_row())),
        Clear(ClearType::FromCursorDown),
        cursor::Show
    )?;
    out.flush()
}

/// Screen rows are 1-based, crossterm positions are 0-based.
fn row_index(row: usize) -> u16 {
    u16::try_from(row.saturating_sub(1)).unwrap_or(u16::MAX)
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ScreenGeometry;

    fn entries(names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|n| match n.strip_suffix('/') {
                Some(dir) => Entry {
                    name: dir.into(),
                    is_dir: true,
                },
                None => Entry {
                    name: (*n).into(),
                    is_dir: false,
                },
            })
            .collect()
    }

    fn view(max_rows: usize, anchor: u16, count: usize) -> Viewport {
        let mut view = Viewport::new(max_rows);
        view.initialize(ScreenGeometry { rows: 40, cols: 80 }, anchor)
            .unwrap();
        view.reset(count);
        view
    }

    fn paint(view: &Viewport, list: &[Entry], cols: u16) -> String {
        let mut out = Vec::new();
        repaint(&mut out, view, "/home/user", list, cols).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_repaint_layout() {
        let list = entries(&["sub/", "a.txt", "b.txt"]);
        let view = view(20, 5, list.len());

        assert_eq!(
            paint(&view, &list, 80),
            "\x1b[5;1H\x1b[J/home/user\r\n\x1b[7msub/\x1b[0m\r\na.txt\r\nb.txt\x1b[6;1H"
        );
    }

    #[test]
    fn test_repaint_highlights_moved_cursor() {
        let list = entries(&["a", "b", "c"]);
        let mut view = view(20, 1, list.len());
        view.move_cursor(2, list.len());

        let out = paint(&view, &list, 80);
        assert!(out.contains("\r\na\r\nb\r\n\x1b[7mc\x1b[0m"));
        assert!(out.ends_with("\x1b[4;1H"));
    }

    #[test]
    fn test_repaint_shows_only_visible_slice() {
        let names: Vec<String> = (0..10).map(|i| format!("f{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let list = entries(&refs);
        let mut view = view(4, 1, list.len());
        view.select(5, list.len());

        let out = paint(&view, &list, 80);
        assert!(!out.contains("f2"));
        assert!(out.contains("f3\r\nf4\r\n\x1b[7mf5\x1b[0m"));
        assert!(!out.contains("f6"));
        assert!(!out.ends_with("\r\n"));
    }

    #[test]
    fn test_repaint_truncates_to_width() {
        let list = entries(&["abcdefghij"]);
        let view = view(20, 1, list.len());
        let out = paint(&view, &list, 4);
        assert!(out.contains("/hom\r\n"));
        assert!(out.contains("abcd\x1b[0m"));
        assert!(!out.contains("abcde"));
    }

    #[test]
    fn test_control_bytes_in_names_are_masked() {
        let list = entries(&["evil\x1b[2Jname", "two\nlines"]);
        let view = view(20, 1, list.len());
        let out = paint(&view, &list, 80);
        assert!(out.contains("\x1b[7mevil?[2Jname\x1b[0m\r\ntwo?lines"));
        assert!(!out.contains("\x1b[2J"));
    }

    #[test]
    fn test_empty_listing_paints_header_only() {
        let view = view(20, 3, 0);
        assert_eq!(paint(&view, &[], 80), "\x1b[3;1H\x1b[J/home/user\x1b[3;1H");
    }

    #[test]
    fn test_erase_clears_from_anchor() {
        let view = view(20, 9, 3);
        let mut out = Vec::new();
        erase(&mut out, &view).unwrap();
        assert_eq!(out, b"\x1b[9;1H\x1b[J\x1b[?25h");
    }
}
