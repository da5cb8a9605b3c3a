use crate::error::PlaylistError;
use crate::model::{CleanFlags, PlaybackState, Settings, Track};
use crate::names;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const RETURN_THRESHOLD_RATIO: f64 = 0.025;
const RETURN_THRESHOLD_MIN: Duration = Duration::from_millis(3_000);
const RETURN_THRESHOLD_MAX: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Play(usize),
    Stop,
}

#[derive(Debug)]
pub struct PlaylistController {
    catalog: BTreeMap<String, PathBuf>,
    playlist: Vec<String>,
    cursor: usize,
    state: PlaybackState,
    repeat_one: bool,
    loop_playlist: bool,
}

impl Default for PlaylistController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaylistController {
    pub fn new() -> Self {
        Self {
            catalog: BTreeMap::new(),
            playlist: Vec::new(),
            cursor: 0,
            state: PlaybackState::Stopped,
            repeat_one: false,
            loop_playlist: true,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            repeat_one: settings.repeat_one,
            loop_playlist: settings.loop_playlist,
            ..Self::new()
        }
    }

    /// Replaces the catalog. An empty `entries` is ignored and `false` is
    /// returned. The playlist stays empty until [`Self::rebuild_playlist`].
    pub fn load_catalog(&mut self, entries: BTreeMap<String, PathBuf>) -> bool {
        if entries.is_empty() {
            debug!("empty catalog ignored, keeping previous playlist");
            return false;
        }

        info!(tracks = entries.len(), "catalog replaced");
        self.catalog = entries;
        self.playlist.clear();
        self.cursor = 0;
        self.state = PlaybackState::Stopped;
        true
    }

    pub fn rebuild_playlist(&mut self, flags: CleanFlags) -> Effect {
        let mut catalog = BTreeMap::new();
        let mut playlist = Vec::with_capacity(self.catalog.len());
        let mut placeholder_counter = 0;

        for (name, path) in std::mem::take(&mut self.catalog) {
            let mut derived = names::normalize_name(&name, flags);
            if derived.is_empty() || catalog.contains_key(&derived) {
                derived = loop {
                    let candidate = names::placeholder_name(placeholder_counter);
                    placeholder_counter += 1;
                    if !catalog.contains_key(&candidate) {
                        break candidate;
                    }
                };
            }
            catalog.insert(derived.clone(), path);
            playlist.push(derived);
        }

        self.catalog = catalog;
        self.playlist = playlist;
        if self.cursor >= self.playlist.len() {
            self.cursor = 0;
        }
        self.state = PlaybackState::Stopped;
        info!(
            tracks = self.playlist.len(),
            placeholders = placeholder_counter,
            ?flags,
            "playlist rebuilt"
        );
        Effect::Stop
    }

    pub fn current_track(&self) -> Result<Track, PlaylistError> {
        self.track_at(self.cursor)
    }

    pub fn track_at(&self, index: usize) -> Result<Track, PlaylistError> {
        self.ensure_not_empty()?;
        let name = self
            .playlist
            .get(index)
            .ok_or(PlaylistError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            })?;
        let path = self.catalog.get(name).ok_or(PlaylistError::NoActiveTrack)?;
        Ok(Track {
            name: name.clone(),
            path: path.clone(),
        })
    }

    /// Position of `name` in the playlist, or `len()` when it is absent.
    pub fn index_of(&self, name: &str) -> usize {
        self.playlist
            .iter()
            .position(|entry| entry == name)
            .unwrap_or(self.playlist.len())
    }

    pub fn select_index(&mut self, index: usize) -> Result<Effect, PlaylistError> {
        self.ensure_not_empty()?;
        if index >= self.playlist.len() {
            return Err(PlaylistError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }

        self.cursor = index;
        Ok(self.play_cursor())
    }

    pub fn select_name(&mut self, name: &str) -> Result<Effect, PlaylistError> {
        let index = self.index_of(name);
        self.select_index(index)
    }

    pub fn advance(&mut self) -> Result<Effect, PlaylistError> {
        self.ensure_not_empty()?;
        if self.repeat_one {
            return Ok(self.play_cursor());
        }

        let next = self.cursor + 1;
        if next >= self.playlist.len() {
            warn!(index = next, len = self.playlist.len(), "skip past last track clamped");
            return Err(PlaylistError::IndexOutOfRange {
                index: next,
                len: self.playlist.len(),
            });
        }

        self.cursor = next;
        Ok(self.play_cursor())
    }

    pub fn retreat(
        &mut self,
        position: Duration,
        duration: Option<Duration>,
    ) -> Result<Effect, PlaylistError> {
        self.ensure_not_empty()?;
        if !self.repeat_one && position < return_threshold(duration) {
            match self.cursor.checked_sub(1) {
                Some(previous) => self.cursor = previous,
                None => warn!("return before first track clamped to index 0"),
            }
        }
        Ok(self.play_cursor())
    }

    pub fn on_track_finished(&mut self) -> Effect {
        if self.state == PlaybackState::Stopped || self.playlist.is_empty() {
            return Effect::None;
        }

        if self.repeat_one {
            return self.play_cursor();
        }

        if self.cursor + 1 >= self.playlist.len() {
            if self.loop_playlist {
                self.cursor = 0;
                return self.play_cursor();
            }
            debug!("end of playlist reached");
            self.state = PlaybackState::Stopped;
            return Effect::Stop;
        }

        self.cursor += 1;
        self.play_cursor()
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn set_repeat_one(&mut self, enabled: bool) {
        self.repeat_one = enabled;
    }

    pub fn toggle_repeat_one(&mut self) -> bool {
        self.repeat_one = !self.repeat_one;
        self.repeat_one
    }

    pub fn set_loop_playlist(&mut self, enabled: bool) {
        self.loop_playlist = enabled;
    }

    pub fn repeat_one(&self) -> bool {
        self.repeat_one
    }

    pub fn loop_playlist(&self) -> bool {
        self.loop_playlist
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playlist(&self) -> &[String] {
        &self.playlist
    }

    pub fn catalog(&self) -> &BTreeMap<String, PathBuf> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    fn play_cursor(&mut self) -> Effect {
        self.state = PlaybackState::Playing(self.cursor);
        debug!(index = self.cursor, "play");
        Effect::Play(self.cursor)
    }

    fn ensure_not_empty(&self) -> Result<(), PlaylistError> {
        if self.playlist.is_empty() {
            return Err(PlaylistError::NoActiveTrack);
        }
        Ok(())
    }
}

/// How far into a track "return" still means "previous track":
/// 2.5 % of the duration, kept within 3 to 5 seconds.
pub fn return_threshold(duration: Option<Duration>) -> Duration {
    duration
        .map_or(Duration::ZERO, |total| total.mul_f64(RETURN_THRESHOLD_RATIO))
        .clamp(RETURN_THRESHOLD_MIN, RETURN_THRESHOLD_MAX)
}
