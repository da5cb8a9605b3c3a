use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::commands::{CleanOption, Command};
use crate::model::Settings;
use crate::session::{Session, View};
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const VOLUME_STEP: u8 = 5;

#[derive(Debug, Default)]
pub struct AppStartupOptions {
    pub initial_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    Quit,
    Dispatch(Command),
    EnterCommandMode(&'static str),
}

pub fn run_with_startup(settings: Settings, options: AppStartupOptions) -> Result<()> {
    let audio: Box<dyn AudioEngine> = match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            warn!("no audio output, running silent: {err:#}");
            Box::new(NullAudioEngine::new())
        }
    };
    let mut session = Session::new(audio, &settings);

    if let Some(dir) = options.initial_dir.or_else(|| settings.music_dir.clone()) {
        session.dispatch(Command::LoadDirectory(dir));
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    info!("terminal ready");

    let result = event_loop(&mut terminal, &mut session);
    finish_with_restore(result, || {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("terminal restored");
        Ok(())
    })
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session,
) -> Result<()> {
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();
    let mut list_rect = ratatui::prelude::Rect::default();

    loop {
        session.poll_backend();

        if session.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                list_rect = crate::ui::list_rect(frame.area());
                crate::ui::draw(frame, session, &command_buffer, command_mode)
            })?;
            session.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(session, mouse, list_rect);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    session.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(session, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                    session.dirty = true;
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    session.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    session.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match map_key(key, session) {
            Some(KeyAction::Quit) => return Ok(()),
            Some(KeyAction::Dispatch(command)) => session.dispatch(command),
            Some(KeyAction::EnterCommandMode(prefix)) => {
                command_mode = true;
                command_buffer = prefix.to_string();
                session.dirty = true;
            }
            None => {}
        }
    }
}

/// Runs `restore` whatever `result` is; the loop's own error wins over a
/// restore error.
fn finish_with_restore<T>(result: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    let restored = restore();
    if let Err(err) = &restored {
        warn!("terminal restore failed: {err:#}");
    }
    let value = result?;
    restored?;
    Ok(value)
}

fn map_key<A: AudioEngine + ?Sized>(key: KeyEvent, session: &Session<A>) -> Option<KeyAction> {
    let volume = session.volume;
    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::Dispatch(Command::TogglePause),
        KeyCode::Char('n') => KeyAction::Dispatch(Command::Skip),
        KeyCode::Char('p') => KeyAction::Dispatch(Command::Return),
        KeyCode::Char('r') => KeyAction::Dispatch(Command::ToggleRepeat),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            KeyAction::Dispatch(Command::SetVolume(volume.saturating_add(VOLUME_STEP).min(100)))
        }
        KeyCode::Char('-') => {
            KeyAction::Dispatch(Command::SetVolume(volume.saturating_sub(VOLUME_STEP)))
        }
        KeyCode::Char('s') => KeyAction::Dispatch(Command::ToggleSettings),
        KeyCode::Char('o') => KeyAction::EnterCommandMode("load "),
        KeyCode::Char(':') => KeyAction::EnterCommandMode(""),
        _ => return map_view_key(key, session),
    };
    Some(action)
}

fn map_view_key<A: AudioEngine + ?Sized>(key: KeyEvent, session: &Session<A>) -> Option<KeyAction> {
    let command = match (session.view, key.code) {
        (View::Playlist, KeyCode::Down) => Command::SelectNext,
        (View::Playlist, KeyCode::Up) => Command::SelectPrev,
        (View::Playlist, KeyCode::Enter) => Command::PlaySelected,
        (View::Settings, KeyCode::Esc) => Command::ToggleSettings,
        (View::Settings, KeyCode::Char('1')) => Command::ToggleCleanOption(CleanOption::Hashtags),
        (View::Settings, KeyCode::Char('2')) => {
            Command::ToggleCleanOption(CleanOption::ParenGroups)
        }
        (View::Settings, KeyCode::Char('3')) => {
            Command::ToggleCleanOption(CleanOption::BracketGroups)
        }
        (View::Settings, KeyCode::Char('c')) => Command::CleanNames,
        (View::Settings, KeyCode::Char('l')) => {
            Command::SetLoopPlaylist(!session.controller.loop_playlist())
        }
        _ => return None,
    };
    Some(KeyAction::Dispatch(command))
}

fn handle_mouse(session: &mut Session, mouse: MouseEvent, list_rect: ratatui::prelude::Rect) {
    if session.view != View::Playlist || !point_in_rect(mouse.column, mouse.row, list_rect) {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => session.dispatch(Command::SelectNext),
        MouseEventKind::ScrollUp => session.dispatch(Command::SelectPrev),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: ratatui::prelude::Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn run_command<A: AudioEngine + ?Sized>(session: &mut Session<A>, raw: &str) {
    match parse_command(raw, session.controller.loop_playlist()) {
        Ok(command) => session.dispatch(command),
        Err(message) => {
            session.status = message;
            session.dirty = true;
        }
    }
}

fn parse_command(raw: &str, loop_playlist: bool) -> Result<Command, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(String::from("No command"));
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => Err(String::from(
            "Commands: load <dir> | play <name> | volume <0-100> | loop [on|off] | repeat | clean",
        )),
        "load" | "open" => {
            if rest.is_empty() {
                return Err(String::from("Usage: load <dir>"));
            }
            Ok(Command::LoadDirectory(PathBuf::from(rest)))
        }
        "play" => {
            if rest.is_empty() {
                return Err(String::from("Usage: play <name>"));
            }
            Ok(Command::PlayName(rest.to_string()))
        }
        "volume" => rest
            .parse::<u8>()
            .ok()
            .filter(|percent| *percent <= 100)
            .map(Command::SetVolume)
            .ok_or_else(|| String::from("Usage: volume <0-100>")),
        "loop" => match rest {
            "" => Ok(Command::SetLoopPlaylist(!loop_playlist)),
            "on" => Ok(Command::SetLoopPlaylist(true)),
            "off" => Ok(Command::SetLoopPlaylist(false)),
            _ => Err(String::from("Usage: loop [on|off]")),
        },
        "repeat" => Ok(Command::ToggleRepeat),
        "clean" => Ok(Command::CleanNames),
        _ => Err(String::from("Unknown command. Use :help")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn session(view: View, volume: u8) -> Session<NullAudioEngine> {
        let mut session = Session::new(Box::new(NullAudioEngine::new()), &Settings::default());
        session.view = view;
        session.volume = volume;
        session
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            parse_command("wat", true),
            Err(String::from("Unknown command. Use :help"))
        );
    }

    #[test]
    fn load_command_accepts_paths_with_spaces() {
        assert_eq!(
            parse_command("load /srv/My Music", true),
            Ok(Command::LoadDirectory(PathBuf::from("/srv/My Music")))
        );
        assert!(parse_command("load", true).is_err());
    }

    #[test]
    fn loop_command_toggles_without_argument() {
        assert_eq!(
            parse_command("loop", true),
            Ok(Command::SetLoopPlaylist(false))
        );
        assert_eq!(
            parse_command("loop on", false),
            Ok(Command::SetLoopPlaylist(true))
        );
        assert!(parse_command("loop maybe", true).is_err());
    }

    #[test]
    fn volume_command_rejects_out_of_range() {
        assert_eq!(parse_command("volume 40", true), Ok(Command::SetVolume(40)));
        assert!(parse_command("volume 140", true).is_err());
        assert!(parse_command("volume loud", true).is_err());
    }

    #[test]
    fn volume_keys_step_and_clamp() {
        assert_eq!(
            map_key(press(KeyCode::Char('+')), &session(View::Playlist, 98)),
            Some(KeyAction::Dispatch(Command::SetVolume(100)))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('-')), &session(View::Playlist, 3)),
            Some(KeyAction::Dispatch(Command::SetVolume(0)))
        );
    }

    #[test]
    fn clean_keys_only_apply_in_settings() {
        assert_eq!(map_key(press(KeyCode::Char('1')), &session(View::Playlist, 85)), None);
        assert_eq!(
            map_key(press(KeyCode::Char('1')), &session(View::Settings, 85)),
            Some(KeyAction::Dispatch(Command::ToggleCleanOption(
                CleanOption::Hashtags
            )))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('c')), &session(View::Settings, 85)),
            Some(KeyAction::Dispatch(Command::CleanNames))
        );
        assert_eq!(
            map_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &session(View::Settings, 85)
            ),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn loop_key_flips_current_setting() {
        assert_eq!(
            map_key(press(KeyCode::Char('l')), &session(View::Settings, 85)),
            Some(KeyAction::Dispatch(Command::SetLoopPlaylist(false)))
        );
    }

    #[test]
    fn open_key_prefills_load_prompt() {
        assert_eq!(
            map_key(press(KeyCode::Char('o')), &session(View::Playlist, 85)),
            Some(KeyAction::EnterCommandMode("load "))
        );
    }

    #[test]
    fn terminal_is_restored_when_loop_fails() {
        let mut restored = false;
        let result: Result<()> = finish_with_restore(Err(anyhow::anyhow!("poll failed")), || {
            restored = true;
            Ok(())
        });

        assert!(restored);
        assert_eq!(result.expect_err("loop error").to_string(), "poll failed");
    }

    #[test]
    fn restore_error_surfaces_after_clean_exit() {
        let result = finish_with_restore(Ok(7), || Err(anyhow::anyhow!("raw mode stuck")));
        assert_eq!(result.expect_err("restore error").to_string(), "raw mode stuck");
        assert_eq!(finish_with_restore(Ok(7), || Ok(())).expect("clean"), 7);
    }

    #[test]
    fn typed_load_command_fills_playlist() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("first.mp3"), b"x").expect("write");

        let mut session = Session::new(Box::new(NullAudioEngine::new()), &Settings::default());
        run_command(&mut session, &format!("load {}", dir.path().display()));

        assert_eq!(session.controller.playlist(), ["first"]);
    }
}
