//! Command-line tokenizer.

/// Tokenize a command line on whitespace, respecting quotes and backslash
/// escapes.
///
/// - Single-quoted text is taken literally.
/// - Double-quoted text groups words; `\"` and `\\` are unescaped inside.
/// - A backslash outside quotes escapes the next character.
/// - An unterminated quote extends to the end of the line.
///
/// A line made only of whitespace yields no tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes `''` (an empty token) from no token at all.
    let mut has_token = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => match chars.peek() {
                    Some(&next) if next == '"' || next == '\\' => {
                        current.push(next);
                        chars.next();
                    },
                    _ => current.push('\\'),
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    has_token = true;
                },
                '"' => {
                    in_double = true;
                    has_token = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        has_token = true;
                    }
                },
                c if c.is_whitespace() => {
                    if has_token {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                },
                _ => {
                    current.push(ch);
                    has_token = true;
                },
            }
        }
    }

    if has_token {
        tokens.push(current);
    }

    tokens
}
