//! A language-agnostic tokenizer for the built-in whitespace sniffs.
//!
//! Produces newline tokens (`\r\n`, `\n`, `\r`), runs of spaces and tabs,
//! runs of word characters, and single characters for everything else.
//! Joining the tokens always gives back the input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Newline,
    Blank,
    Word,
    Other,
}

fn classify(c: char) -> Class {
    match c {
        '\n' | '\r' => Class::Newline,
        ' ' | '\t' => Class::Blank,
        c if c.is_alphanumeric() || c == '_' => Class::Word,
        _ => Class::Other,
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let class = classify(c);
        let mut end = start + c.len_utf8();
        match class {
            Class::Newline => {
                if c == '\r' {
                    if let Some(&(idx, '\n')) = chars.peek() {
                        end = idx + 1;
                        chars.next();
                    }
                }
            }
            Class::Blank | Class::Word => {
                while let Some(&(idx, next)) = chars.peek() {
                    if classify(next) != class {
                        break;
                    }
                    end = idx + next.len_utf8();
                    chars.next();
                }
            }
            Class::Other => {}
        }
        tokens.push(text[start..end].to_string());
    }

    tokens
}

pub fn is_newline(token: &str) -> bool {
    matches!(token, "\n" | "\r\n" | "\r")
}

pub fn is_blank(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c == ' ' || c == '\t')
}

/// 1-based line of the token at `pos`.
pub fn line_of(tokens: &[String], pos: usize) -> usize {
    1 + tokens
        .iter()
        .take(pos)
        .filter(|t| t.ends_with(['\n', '\r']))
        .count()
}
