#![no_main]

use dirplay::model::CleanFlags;
use dirplay::names::{normalize_name, shorten};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&mask, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);
    let flags = CleanFlags {
        hashtags: mask & 1 != 0,
        paren_groups: mask & 2 != 0,
        bracket_groups: mask & 4 != 0,
    };

    let cleaned = normalize_name(&text, flags);
    assert_eq!(cleaned, cleaned.trim());
    assert!(shorten(&cleaned, usize::from(mask)).chars().count() <= usize::from(mask).max(3));
});
