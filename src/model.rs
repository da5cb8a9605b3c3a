use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanFlags {
    pub hashtags: bool,
    pub paren_groups: bool,
    pub bracket_groups: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_loop_playlist")]
    pub loop_playlist: bool,
    #[serde(default)]
    pub repeat_one: bool,
    #[serde(default = "default_display_width")]
    pub display_width: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub music_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_volume() -> u8 {
    85
}

fn default_loop_playlist() -> bool {
    true
}

fn default_display_width() -> usize {
    crate::names::DEFAULT_DISPLAY_WIDTH
}

fn default_extensions() -> Vec<String> {
    ["mp3", "vaw", "flac"].map(String::from).to_vec()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            loop_playlist: default_loop_playlist(),
            repeat_one: false,
            display_width: default_display_width(),
            extensions: default_extensions(),
            music_dir: None,
            log_dir: None,
        }
    }
}
