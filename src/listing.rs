use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub is_dir: bool,
}

impl Entry {
    /// The name as drawn, with control characters masked so a name cannot
    /// move the cursor or break the line.
    pub fn label(&self) -> String {
        let mut label: String = self
            .name
            .to_string_lossy()
            .chars()
            .map(|c| if c.is_control() { '?' } else { c })
            .collect();
        if self.is_dir {
            label.push('/');
        }
        label
    }
}

pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Directories first, then case-insensitive by name. Names that only differ
/// in case fall back to byte order so distinct names never compare equal.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => {
            let a_name = a.name.to_ascii_lowercase();
            let b_name = b.name.to_ascii_lowercase();
            a_name.cmp(&b_name).then_with(|| a.name.cmp(&b.name))
        }
    }
}

/// Lists `dir`, sorted with [`compare_entries`]. Hidden entries are dropped
/// unless `show_hidden` is set.
pub fn read_entries(dir: &Path, show_hidden: bool) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !show_hidden && is_hidden(&name) {
            continue;
        }
        // Follows symlinks, so a link to a directory can be entered.
        let is_dir = entry.path().is_dir();
        entries.push(Entry { name, is_dir });
    }

    entries.sort_by(compare_entries);
    Ok(entries)
}
