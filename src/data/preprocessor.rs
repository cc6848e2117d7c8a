// ============================================================
// Layer 4 - Sentence Preprocessor
// ============================================================
// Normalises one corpus cell before tokenisation. Corpus files
// collected from the web carry invisible junk that would
// otherwise end up as vocabulary entries:
//
//   - non-breaking / zero-width spaces, byte order marks
//   - stray control characters and carriage returns
//   - runs of spaces
//
// A sentence is a single line, so everything collapses to one
// line of single-spaced text.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // drops leading whitespace

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() || c.is_whitespace() => ' ',
                c => c,
            };
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.truncate(out.trim_end().len());
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  ¿Dónde está?  "), "¿Dónde está?");
    }

    #[test]
    fn test_unicode_spaces_and_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("\u{FEFF}hola\u{00A0}\u{200B}mundo\r\n"), "hola mundo");
        assert_eq!(p.clean("a\x01b"), "a b");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
        assert_eq!(p.clean(" \t "), "");
    }
}
