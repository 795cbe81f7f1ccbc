//! Greedy word wrapping for subtitle lines.

/// Characters per subtitle line.
pub const WRAP_WIDTH: usize = 25;

/// Wrap `text` into lines of at most `width` characters.
///
/// Runs of whitespace collapse to a single space, lines never start or end
/// with whitespace, and words longer than `width` are split across lines.
/// Blank input yields no lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();

        if chars.len() <= width {
            if current_len == 0 {
                current.push_str(word);
                current_len = chars.len();
            } else if current_len + 1 + chars.len() <= width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + chars.len();
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = chars.len();
            }
            continue;
        }

        // Long word: top up the current line first, then hard-split the rest
        let mut rest: &[char] = &chars;
        if current_len > 0 {
            let space_left = width.saturating_sub(current_len + 1);
            if space_left > 0 {
                current.push(' ');
                current.extend(&rest[..space_left]);
                rest = &rest[space_left..];
            }
            lines.push(std::mem::take(&mut current));
        }

        while rest.len() > width {
            lines.push(rest[..width].iter().collect());
            rest = &rest[width..];
        }
        current = rest.iter().collect();
        current_len = rest.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
