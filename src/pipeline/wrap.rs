//! Greedy line wrapping against real font metrics.
//!
//! Text containing whitespace wraps at word boundaries. Text without any
//! whitespace (typically CJK, which has no inter-word spaces) wraps between
//! individual characters. Widths always come from the font the line will be
//! drawn with, since a break decided with the wrong metrics overflows the
//! right margin.

/// Measures rendered text width in points.
pub trait TextMeasure {
    /// Width of `text` set at `size` points.
    fn string_width(&self, text: &str, size: f32) -> f32;
}

/// Break `text` into lines no wider than `max_width` where possible.
///
/// * Empty text yields one empty line.
/// * A unit wider than `max_width` on its own still gets its own line.
/// * Whitespace-only text yields no lines.
pub fn wrap(text: &str, font: &dyn TextMeasure, size: f32, max_width: f32) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let word_split = text.chars().any(char::is_whitespace);
    let units: Vec<&str> = if word_split {
        text.split_whitespace().collect()
    } else {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    };
    let separator = if word_split { " " } else { "" };

    let mut lines = Vec::new();
    let mut line = String::new();
    for unit in units {
        let candidate = if line.is_empty() {
            unit.to_string()
        } else {
            format!("{line}{separator}{unit}")
        };
        if font.string_width(&candidate, size) <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        line = unit.to_string();
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is `size` points wide.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn string_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size
        }
    }

    #[test]
    fn test_empty_text_yields_one_empty_line() {
        assert_eq!(wrap("", &Monospace, 1.0, 10.0), vec![String::new()]);
    }

    #[test]
    fn test_whitespace_only_yields_nothing() {
        assert!(wrap("   ", &Monospace, 1.0, 10.0).is_empty());
    }

    #[test]
    fn test_word_wrap() {
        let lines = wrap("the quick brown fox jumps", &Monospace, 1.0, 10.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_exact_fit_stays_on_line() {
        assert_eq!(wrap("abcde fghi", &Monospace, 1.0, 10.0), vec!["abcde fghi"]);
    }

    #[test]
    fn test_oversized_word_gets_own_line() {
        let lines = wrap("a supercalifragilistic b", &Monospace, 1.0, 5.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_character_wrap_without_separator() {
        let lines = wrap("本条款适用于所有用户", &Monospace, 1.0, 4.0);
        assert_eq!(lines, vec!["本条款适", "用于所有", "用户"]);
        assert_eq!(lines.concat(), "本条款适用于所有用户");
    }

    #[test]
    fn test_size_scales_measurement() {
        assert_eq!(wrap("ab cd", &Monospace, 2.0, 10.0), vec!["ab cd"]);
        assert_eq!(wrap("ab cd", &Monospace, 3.0, 10.0), vec!["ab", "cd"]);
    }

    #[test]
    fn test_lines_fit_and_reconstruct() {
        let text = "Users must not misuse the service or attempt to access it using a method other than the interface provided.";
        let max_width = 24.0;
        let lines = wrap(text, &Monospace, 1.0, max_width);
        for line in &lines {
            assert!(Monospace.string_width(line, 1.0) <= max_width, "too wide: {line:?}");
        }
        let rebuilt: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_mixed_whitespace_collapses_to_single_separator() {
        assert_eq!(wrap("a\t\tb", &Monospace, 1.0, 10.0), vec!["a b"]);
    }
}
