//! Text helpers for laying free-form input into fixed-width spreadsheet rows.

/// Wraps free text into lines of at most `width` characters.
///
/// Explicit line breaks split the text into paragraphs first. A blank paragraph
/// is kept as an empty line; other paragraphs are filled greedily word by word,
/// and words longer than `width` are broken across lines. Runs of whitespace
/// inside a paragraph collapse to a single space.
pub(crate) fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut line = String::new();
        let mut line_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len <= width {
                line.push(' ');
                line.push_str(word);
                line_len += 1 + word_len;
                continue;
            }
            // A word longer than a whole line starts in the space left on this one.
            if line_len > 0 && word_len > width && line_len + 1 < width {
                let room = width - line_len - 1;
                let split = word.char_indices().nth(room).map(|(index, _)| index).unwrap_or(word.len());
                line.push(' ');
                line.push_str(&word[..split]);
                word = &word[split..];
                word_len -= room;
            }
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            while word_len > width {
                let split = word.char_indices().nth(width).map(|(index, _)| index).unwrap_or(word.len());
                lines.push(word[..split].to_owned());
                word = &word[split..];
                word_len -= width;
            }
            line.push_str(word);
            line_len = word_len;
        }
        if line_len > 0 {
            lines.push(line);
        }
    }
    lines
}

/// Converts loosely typed numeric input to a number; blanks and garbage become zero.
pub(crate) fn to_number(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() {
        0.0
    } else {
        value.parse::<f64>().ok().filter(|number| number.is_finite()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_lines("pour slab at grid C", 10), vec!["pour slab", "at grid C"]);
    }

    #[test]
    fn keeps_blank_lines() {
        assert_eq!(wrap_lines("first\n\nsecond", 110), vec!["first", "", "second"]);
    }

    #[test]
    fn breaks_long_words() {
        assert_eq!(wrap_lines("aaaaaaaaaaaaaaa bb cc", 6), vec!["aaaaaa", "aaaaaa", "aaa bb", "cc"]);
    }

    #[test]
    fn long_words_start_in_the_space_left_on_the_line() {
        assert_eq!(wrap_lines("ab cdefghij", 5), vec!["ab cd", "efghi", "j"]);
        assert_eq!(wrap_lines("abcd efghijk", 5), vec!["abcd", "efghi", "jk"]);
        assert_eq!(wrap_lines("ab cde", 5), vec!["ab", "cde"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(wrap_lines("ééé ééé", 3), vec!["ééé", "ééé"]);
    }

    #[test]
    fn empty_text_produces_no_lines() {
        assert!(wrap_lines("", 110).is_empty());
    }

    #[test]
    fn numbers_fall_back_to_zero() {
        assert_eq!(to_number("12.5"), 12.5);
        assert_eq!(to_number(" 3 "), 3.0);
        assert_eq!(to_number(""), 0.0);
        assert_eq!(to_number("n/a"), 0.0);
        assert_eq!(to_number("NaN"), 0.0);
    }
}
