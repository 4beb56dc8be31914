//! Playlist of audio files discovered under a directory.
//!
//! Recursively scans a root directory for supported audio files and keeps an
//! ordered, filterable list the user can move through. The filter is a plain
//! case-insensitive substring match on the file name; there is no metadata
//! index and the list is rebuilt by rescanning, never persisted.

use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::AUDIO_EXTENSIONS;

pub struct Playlist {
    pub items: Vec<PathBuf>,
    /// Indices into `items` that survive the current filter
    pub filtered: Vec<usize>,
    pub selected: usize,
    pub filter: String,
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            selected: 0,
            filter: String::new(),
        }
    }

    pub fn scan_directory(&mut self, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.items.clear();
        self.scan_recursive(root)?;
        self.items.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        self.apply_filter();
        Ok(())
    }

    fn scan_recursive(&mut self, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }

            if path.is_dir() {
                if let Err(e) = self.scan_recursive(&path) {
                    warn!("Could not scan directory {path:?}: {e}");
                }
            } else if path.is_file() && is_supported_audio_file(&path) {
                self.items.push(path);
            }
        }
        Ok(())
    }

    pub fn push_char(&mut self, c: char) {
        self.filter.push(c);
        self.apply_filter();
    }

    pub fn pop_char(&mut self) {
        self.filter.pop();
        self.apply_filter();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        if self.filter.is_empty() {
            self.filtered = (0..self.items.len()).collect();
        } else {
            let needle = self.filter.to_lowercase();
            self.filtered = self
                .items
                .iter()
                .enumerate()
                .filter(|(_, path)| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
                })
                .map(|(idx, _)| idx)
                .collect();
        }

        if self.selected >= self.filtered.len() {
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + 1) % self.filtered.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.filtered.is_empty() {
            if self.selected == 0 {
                self.selected = self.filtered.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.filtered
            .get(self.selected)
            .and_then(|idx| self.items.get(*idx))
            .map(|p| p.as_path())
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &PathBuf> {
        self.filtered.iter().filter_map(|idx| self.items.get(*idx))
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
