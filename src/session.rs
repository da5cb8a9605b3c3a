use crate::audio::AudioEngine;
use crate::commands::{BackendEvent, Command};
use crate::controller::{Effect, PlaylistController};
use crate::error::PlaylistError;
use crate::library;
use crate::model::{CleanFlags, Settings};
use crate::names;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Playlist,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl Progress {
    pub fn ratio(&self) -> Option<f64> {
        let total = self.duration?.as_secs_f64();
        (total > 0.0).then(|| (self.position.as_secs_f64() / total).clamp(0.0, 1.0))
    }
}

pub struct Session<A: AudioEngine + ?Sized = dyn AudioEngine> {
    pub controller: PlaylistController,
    pub title: String,
    pub progress: Progress,
    pub volume: u8,
    pub view: View,
    pub clean_flags: CleanFlags,
    pub selected: usize,
    pub status: String,
    pub dirty: bool,
    display_width: usize,
    extensions: Vec<String>,
    audio: Box<A>,
}

impl<A: AudioEngine + ?Sized> Session<A> {
    pub fn new(mut audio: Box<A>, settings: &Settings) -> Self {
        let volume = settings.volume.min(100);
        audio.set_volume(f32::from(volume) / 100.0);

        Self {
            controller: PlaylistController::from_settings(settings),
            title: String::new(),
            progress: Progress::default(),
            volume,
            view: View::Playlist,
            clean_flags: CleanFlags::default(),
            selected: 0,
            status: String::from("Ready"),
            dirty: true,
            display_width: settings.display_width,
            extensions: settings.extensions.clone(),
            audio,
        }
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::LoadDirectory(dir) => self.load_directory(&dir),
            Command::TogglePause => self.toggle_pause(),
            Command::Skip => match self.controller.advance() {
                Err(PlaylistError::IndexOutOfRange { .. }) => self.set_status("No more tracks"),
                result => self.apply_result(result),
            },
            Command::Return => {
                let position = self.audio.position().unwrap_or_default();
                let duration = self.audio.duration();
                let result = self.controller.retreat(position, duration);
                self.apply_result(result);
            }
            Command::PlayIndex(index) => {
                let result = self.controller.select_index(index);
                self.apply_result(result);
            }
            Command::PlayName(name) => {
                let result = self.controller.select_name(&name);
                self.apply_result(result);
            }
            Command::PlaySelected => {
                let result = self.controller.select_index(self.selected);
                self.apply_result(result);
            }
            Command::ToggleRepeat => {
                let enabled = self.controller.toggle_repeat_one();
                self.set_status(if enabled { "Repeat on" } else { "Repeat off" });
            }
            Command::SetLoopPlaylist(enabled) => {
                self.controller.set_loop_playlist(enabled);
                self.set_status(if enabled {
                    "Loop playlist on"
                } else {
                    "Loop playlist off"
                });
            }
            Command::SetVolume(percent) => {
                self.volume = percent.min(100);
                self.audio.set_volume(f32::from(self.volume) / 100.0);
                self.set_status(&format!("Volume: {}%", self.volume));
            }
            Command::ToggleSettings => {
                self.view = match self.view {
                    View::Playlist => View::Settings,
                    View::Settings => View::Playlist,
                };
                self.dirty = true;
            }
            Command::ToggleCleanOption(option) => {
                option.toggle(&mut self.clean_flags);
                self.dirty = true;
            }
            Command::CleanNames => self.clean_names(),
            Command::SelectNext => {
                if !self.controller.is_empty() {
                    self.selected = (self.selected + 1).min(self.controller.len() - 1);
                    self.dirty = true;
                }
            }
            Command::SelectPrev => {
                self.selected = self.selected.saturating_sub(1);
                self.dirty = true;
            }
        }
    }

    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::EndOfMedia => {
                let effect = self.controller.on_track_finished();
                if effect == Effect::Stop {
                    self.set_status("Reached end of playlist");
                }
                self.apply(effect);
            }
            BackendEvent::PositionChanged(position) => {
                self.progress = Progress {
                    position,
                    duration: self.audio.duration(),
                };
                self.dirty = true;
            }
        }
    }

    pub fn poll_backend(&mut self) {
        if self.audio.is_finished() {
            self.handle_backend_event(BackendEvent::EndOfMedia);
            return;
        }

        if !self.audio.is_playing() {
            return;
        }
        if let Some(position) = self.audio.position()
            && position != self.progress.position
        {
            self.handle_backend_event(BackendEvent::PositionChanged(position));
        }
    }

    fn load_directory(&mut self, dir: &Path) {
        self.audio.pause();

        let entries = match library::scan_directory(dir, &self.extensions) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("scan failed: {err:#}");
                self.set_status(&format!("scan error: {err:#}"));
                return;
            }
        };

        if !self.controller.load_catalog(entries) {
            self.set_status(&format!("No audio files in {}", dir.display()));
            return;
        }

        self.selected = 0;
        let effect = self.controller.rebuild_playlist(CleanFlags::default());
        self.apply(effect);
        info!(dir = %dir.display(), tracks = self.controller.len(), "directory loaded");
        self.set_status(&format!(
            "Loaded {} tracks from {}",
            self.controller.len(),
            dir.display()
        ));
    }

    fn toggle_pause(&mut self) {
        if !self.audio.has_media() {
            self.set_status("Nothing loaded");
            return;
        }

        if self.audio.is_playing() {
            self.audio.pause();
            self.set_status("Paused");
        } else {
            self.audio.play();
            self.set_status("Playing");
        }
    }

    fn clean_names(&mut self) {
        if self.controller.is_empty() {
            self.set_status("Playlist is empty");
            return;
        }

        let effect = self.controller.rebuild_playlist(self.clean_flags);
        self.apply(effect);
        self.selected = self.selected.min(self.controller.len() - 1);
        self.set_status("Names cleaned");
    }

    fn apply_result(&mut self, result: Result<Effect, PlaylistError>) {
        match result {
            Ok(effect) => self.apply(effect),
            Err(err) => {
                warn!("{err}");
                let message = match err {
                    PlaylistError::NoActiveTrack => String::from("Playlist is empty"),
                    other => other.to_string(),
                };
                self.set_status(&message);
            }
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Stop => {
                self.audio.stop();
                self.title.clear();
                self.progress = Progress::default();
                self.dirty = true;
            }
            Effect::Play(index) => self.play_track(index),
        }
    }

    fn play_track(&mut self, index: usize) {
        let track = match self.controller.track_at(index) {
            Ok(track) => track,
            Err(err) => {
                self.apply_result(Err(err));
                return;
            }
        };

        if let Err(err) = self.audio.load(&track.path) {
            warn!("playback failed: {err:#}");
            self.controller.stop();
            self.set_status(&format!("playback error: {err:#}"));
            return;
        }

        self.audio.play();
        self.title = names::shorten(&track.name, self.display_width);
        self.selected = index;
        self.progress = Progress {
            position: Duration::ZERO,
            duration: self.audio.duration(),
        };
        self.set_status(&format!("Playing {}", track.name));
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CleanOption;
    use anyhow::{Result, bail};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Default)]
    struct TestAudioEngine {
        current: Option<PathBuf>,
        playing: bool,
        finished: bool,
        position: Duration,
        duration: Option<Duration>,
        volume: f32,
        loaded: Vec<PathBuf>,
        stops: usize,
        fail_on: Option<PathBuf>,
    }

    impl AudioEngine for TestAudioEngine {
        fn load(&mut self, path: &Path) -> Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                bail!("cannot decode {}", path.display());
            }
            self.current = Some(path.to_path_buf());
            self.playing = false;
            self.finished = false;
            self.position = Duration::ZERO;
            self.loaded.push(path.to_path_buf());
            Ok(())
        }

        fn play(&mut self) {
            self.playing = self.current.is_some();
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.current = None;
            self.playing = false;
            self.finished = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn current_track(&self) -> Option<&Path> {
            self.current.as_deref()
        }

        fn position(&self) -> Option<Duration> {
            self.current.as_ref().map(|_| self.position)
        }

        fn duration(&self) -> Option<Duration> {
            self.duration
        }

        fn volume(&self) -> f32 {
            self.volume
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }

        fn output_name(&self) -> Option<String> {
            Some(String::from("test"))
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    fn session_with(names: &[&str]) -> Session<TestAudioEngine> {
        let mut session = Session::new(Box::<TestAudioEngine>::default(), &Settings::default());
        session.controller.load_catalog(
            names
                .iter()
                .map(|name| (name.to_string(), PathBuf::from(format!("{name}.mp3"))))
                .collect(),
        );
        session.controller.rebuild_playlist(CleanFlags::default());
        session
    }

    fn finish_track(session: &mut Session<TestAudioEngine>) {
        session.audio.finished = true;
        session.poll_backend();
    }

    #[test]
    fn initial_volume_comes_from_settings() {
        let session = session_with(&[]);
        assert_eq!(session.volume, 85);
        assert!((session.audio().volume - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn volume_percent_maps_to_unit_range() {
        let mut session = session_with(&[]);
        session.dispatch(Command::SetVolume(40));
        assert!((session.audio().volume - 0.4).abs() < f32::EPSILON);
        session.dispatch(Command::SetVolume(180));
        assert_eq!(session.volume, 100);
        assert_eq!(session.audio().volume, 1.0);
    }

    #[test]
    fn selecting_track_loads_and_plays_it() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::PlayName(String::from("b")));

        assert_eq!(session.audio().loaded, vec![PathBuf::from("b.mp3")]);
        assert!(session.audio().is_playing());
        assert_eq!(session.title, "b");
        assert_eq!(session.selected, 1);
    }

    #[test]
    fn long_titles_are_shortened() {
        let long = "x".repeat(40);
        let mut session = session_with(&[long.as_str()]);
        session.dispatch(Command::PlayIndex(0));
        assert_eq!(session.title, format!("{}...", "x".repeat(27)));
    }

    #[test]
    fn end_of_media_plays_next_track() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::PlayIndex(0));
        finish_track(&mut session);

        assert_eq!(
            session.audio().loaded,
            vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")]
        );
        assert_eq!(session.controller.cursor(), 1);
    }

    #[test]
    fn end_of_playlist_without_loop_stops_and_clears_title() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::SetLoopPlaylist(false));
        session.dispatch(Command::PlayIndex(1));
        finish_track(&mut session);

        assert!(session.title.is_empty());
        assert!(!session.audio().has_media());
        assert_eq!(session.status, "Reached end of playlist");
        assert_eq!(session.audio().loaded.len(), 1);
    }

    #[test]
    fn end_of_playlist_with_loop_wraps_to_first() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::PlayIndex(1));
        finish_track(&mut session);

        assert_eq!(session.audio().loaded.last(), Some(&PathBuf::from("a.mp3")));
        assert_eq!(session.controller.cursor(), 0);
    }

    #[test]
    fn skip_past_end_reports_and_keeps_playing() {
        let mut session = session_with(&["a"]);
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::Skip);

        assert_eq!(session.status, "No more tracks");
        assert_eq!(session.title, "a");
        assert!(session.audio().is_playing());
    }

    #[test]
    fn selecting_past_end_reports_index() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::PlayIndex(5));

        assert_eq!(
            session.status,
            "track index 5 is out of range for a playlist of 2"
        );
        assert_eq!(session.title, "a");

        session.dispatch(Command::PlayName(String::from("zzz")));
        assert_eq!(
            session.status,
            "track index 2 is out of range for a playlist of 2"
        );
    }

    #[test]
    fn return_goes_back_only_near_track_start() {
        let mut session = session_with(&["a", "b", "c"]);
        session.audio.duration = Some(Duration::from_secs(200));
        session.dispatch(Command::PlayIndex(2));

        session.audio.position = Duration::from_secs(6);
        session.dispatch(Command::Return);
        assert_eq!(session.controller.cursor(), 2);

        session.audio.position = Duration::from_secs(1);
        session.dispatch(Command::Return);
        assert_eq!(session.controller.cursor(), 1);
    }

    #[test]
    fn repeat_replays_on_skip_and_end() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(Command::ToggleRepeat);
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::Skip);
        finish_track(&mut session);

        assert_eq!(session.audio().loaded, vec![PathBuf::from("a.mp3"); 3]);
    }

    #[test]
    fn playback_failure_keeps_previous_title() {
        let mut session = session_with(&["a", "b"]);
        session.audio.fail_on = Some(PathBuf::from("b.mp3"));
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::Skip);

        assert_eq!(session.title, "a");
        assert!(session.status.starts_with("playback error"));
    }

    #[test]
    fn toggle_pause_needs_loaded_media() {
        let mut session = session_with(&["a"]);
        session.dispatch(Command::TogglePause);
        assert_eq!(session.status, "Nothing loaded");

        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::TogglePause);
        assert!(!session.audio().is_playing());
        session.dispatch(Command::TogglePause);
        assert!(session.audio().is_playing());
    }

    #[test]
    fn cleaning_names_stops_and_rebuilds() {
        let mut session = session_with(&["#x", "song (live)"]);
        session.dispatch(Command::PlayIndex(1));
        session.dispatch(Command::ToggleCleanOption(CleanOption::Hashtags));
        session.dispatch(Command::ToggleCleanOption(CleanOption::ParenGroups));
        session.dispatch(Command::CleanNames);

        assert_eq!(session.controller.playlist(), ["[emptyName0]", "song"]);
        assert!(session.title.is_empty());
        assert_eq!(session.audio().stops, 1);
        assert_eq!(session.controller.cursor(), 1);
    }

    #[test]
    fn position_updates_flow_into_progress() {
        let mut session = session_with(&["a"]);
        session.audio.duration = Some(Duration::from_secs(10));
        session.dispatch(Command::PlayIndex(0));
        session.audio.position = Duration::from_secs(5);
        session.poll_backend();

        assert_eq!(session.progress.position, Duration::from_secs(5));
        assert_eq!(session.progress.ratio(), Some(0.5));
    }

    #[test]
    fn loading_directory_replaces_playlist() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("one.mp3"), b"x").expect("write");
        fs::write(dir.path().join("two.flac"), b"x").expect("write");

        let mut session = session_with(&["old"]);
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::LoadDirectory(dir.path().to_path_buf()));

        assert_eq!(session.controller.playlist(), ["one", "two"]);
        assert!(session.title.is_empty());
        assert!(!session.audio().has_media());
    }

    #[test]
    fn loading_empty_directory_keeps_playlist_paused() {
        let dir = tempdir().expect("tempdir");
        let mut session = session_with(&["old"]);
        session.dispatch(Command::PlayIndex(0));
        session.dispatch(Command::LoadDirectory(dir.path().to_path_buf()));

        assert_eq!(session.controller.playlist(), ["old"]);
        assert_eq!(session.title, "old");
        assert!(session.audio().has_media());
        assert!(!session.audio().is_playing());
        assert!(session.status.starts_with("No audio files"));
    }

    #[test]
    fn commands_on_empty_playlist_are_harmless() {
        let mut session = session_with(&[]);
        session.dispatch(Command::Skip);
        assert_eq!(session.status, "Playlist is empty");
        session.dispatch(Command::Return);
        session.dispatch(Command::PlaySelected);
        session.dispatch(Command::CleanNames);
        session.dispatch(Command::SelectNext);
        assert_eq!(session.selected, 0);
        assert!(session.audio().loaded.is_empty());
    }

    #[test]
    fn settings_view_toggles() {
        let mut session = session_with(&[]);
        session.dispatch(Command::ToggleSettings);
        assert_eq!(session.view, View::Settings);
        session.dispatch(Command::ToggleSettings);
        assert_eq!(session.view, View::Playlist);
    }
}
