#![no_main]

use dirplay::controller::PlaylistController;
use dirplay::model::CleanFlags;
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;
use std::time::Duration;

fuzz_target!(|data: &[u8]| {
    let mut controller = PlaylistController::new();
    let len = data.len() % 32;
    controller.load_catalog(
        (0..len)
            .map(|idx| (format!("#t{idx} (live) [{idx}]"), PathBuf::from(format!("{idx}.mp3"))))
            .collect(),
    );
    controller.rebuild_playlist(CleanFlags::default());

    for byte in data {
        match byte % 8 {
            0 => {
                let _ = controller.advance();
            }
            1 => {
                let _ = controller.retreat(
                    Duration::from_millis(u64::from(*byte) * 40),
                    Some(Duration::from_secs(u64::from(*byte))),
                );
            }
            2 => {
                let _ = controller.select_index(usize::from(*byte) % 40);
            }
            3 => {
                controller.on_track_finished();
            }
            4 => {
                controller.toggle_repeat_one();
            }
            5 => controller.set_loop_playlist(byte & 0x80 != 0),
            6 => {
                controller.rebuild_playlist(CleanFlags {
                    hashtags: byte & 0x10 != 0,
                    paren_groups: byte & 0x20 != 0,
                    bracket_groups: byte & 0x40 != 0,
                });
            }
            _ => {
                let _ = controller.select_name("[emptyName0]");
            }
        }

        assert_eq!(controller.len(), controller.catalog().len());
        assert!(controller.is_empty() || controller.cursor() < controller.len());
    }
});
