use crate::model::CleanFlags;

pub const DEFAULT_DISPLAY_WIDTH: usize = 30;
const ELLIPSIS: &str = "...";

pub fn normalize_name(name: &str, flags: CleanFlags) -> String {
    let mut cleaned = name.to_string();
    if flags.hashtags {
        cleaned = strip_hashtags(&cleaned);
    }
    if flags.paren_groups {
        cleaned = strip_paren_groups(&cleaned);
    }
    if flags.bracket_groups {
        cleaned = strip_bracket_groups(&cleaned);
    }
    cleaned.trim().to_string()
}

pub fn strip_hashtags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '#' && chars.peek().is_some_and(|next| is_tag_char(*next)) {
            while chars.peek().is_some_and(|next| is_tag_char(*next)) {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    out
}

pub fn strip_paren_groups(text: &str) -> String {
    strip_groups(text, '(', ')')
}

pub fn strip_bracket_groups(text: &str) -> String {
    strip_groups(text, '[', ']')
}

pub fn placeholder_name(counter: usize) -> String {
    format!("[emptyName{counter}]")
}

pub fn shorten(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let mut out: String = text.chars().take(max_len.saturating_sub(3)).collect();
    out.push_str(ELLIPSIS);
    out
}

fn is_tag_char(ch: char) -> bool {
    ch != '#' && !ch.is_whitespace()
}

fn strip_groups(text: &str, open: char, close: char) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        if ch == open {
            let line_end = chars[index..]
                .iter()
                .position(|c| *c == '\n')
                .map_or(chars.len(), |offset| index + offset);

            if index + 1 < line_end {
                let body = &chars[index + 1..line_end];
                index = body
                    .iter()
                    .rposition(|c| *c == close)
                    .map_or(line_end, |offset| index + 1 + offset + 1);
                continue;
            }
        }

        out.push(ch);
        index += 1;
    }

    out
}
