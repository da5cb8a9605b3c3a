use crate::model::CleanFlags;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadDirectory(PathBuf),
    TogglePause,
    Skip,
    Return,
    PlayIndex(usize),
    PlayName(String),
    ToggleRepeat,
    SetLoopPlaylist(bool),
    SetVolume(u8),
    ToggleSettings,
    ToggleCleanOption(CleanOption),
    CleanNames,
    SelectNext,
    SelectPrev,
    PlaySelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOption {
    Hashtags,
    ParenGroups,
    BracketGroups,
}

impl CleanOption {
    pub fn toggle(self, flags: &mut CleanFlags) {
        match self {
            Self::Hashtags => flags.hashtags = !flags.hashtags,
            Self::ParenGroups => flags.paren_groups = !flags.paren_groups,
            Self::BracketGroups => flags.bracket_groups = !flags.bracket_groups,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    EndOfMedia,
    PositionChanged(Duration),
}
