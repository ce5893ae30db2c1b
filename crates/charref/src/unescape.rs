//! Character reference decoding.
//!
//! Recognised tokens are `&name;`, `&#123;`, `&#x7B;` and `&#X7B;`, where a
//! name is a run of ASCII letters, digits and underscores. Tokens are resolved
//! in one left-to-right pass; substituted text is never scanned again, so
//! `&amp;lt;` decodes to `&lt;` and not `<`.
//!
//! Uses Cow for zero-copy when no `&` is present.

use crate::table::ReferenceTable;
use memchr::memchr;
use std::borrow::Cow;

enum Resolution<'a> {
    Substituted(char),
    Unchanged(&'a str),
}

/// Replaces every named and numeric character reference in `text` with the
/// character it denotes.
///
/// Unknown names and numeric payloads that are not a Unicode scalar value
/// (out of range, surrogates, overflow) are left in the output untouched.
pub fn unescape<'a>(table: &ReferenceTable, text: &'a str) -> Cow<'a, str> {
    let bytes = text.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len());
    let mut position = 0;

    while let Some(offset) = memchr(b'&', &bytes[position..]) {
        let start = position + offset;
        output.push_str(&text[position..start]);

        match scan_token(&text[start..]) {
            Some(token) => {
                match resolve(table, token) {
                    Resolution::Substituted(character) => output.push(character),
                    Resolution::Unchanged(original) => output.push_str(original),
                }
                position = start + token.len();
            }
            None => {
                output.push('&');
                position = start + 1;
            }
        }
    }

    output.push_str(&text[position..]);
    Cow::Owned(output)
}

/// Looks up a single named reference such as `&copy;`.
pub fn unescape_charref(table: &ReferenceTable, name: &str) -> Option<char> {
    table.lookup_name(name)
}

/// Returns the token at the start of `input` (which begins with `&`),
/// delimiters included, or `None` if no well-formed token starts here.
fn scan_token(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    let body_start = if bytes.get(1) == Some(&b'#') { 2 } else { 1 };

    let run = bytes[body_start..]
        .iter()
        .take_while(|byte| is_word_byte(**byte))
        .count();
    if run == 0 {
        return None;
    }

    let semicolon = body_start + run;
    if bytes.get(semicolon) != Some(&b';') {
        return None;
    }

    Some(&input[..=semicolon])
}

fn resolve<'a>(table: &ReferenceTable, token: &'a str) -> Resolution<'a> {
    let body = &token[1..token.len() - 1];

    let resolved = match body.strip_prefix('#') {
        Some(payload) => decode_numeric(payload),
        None => table.lookup_name(token),
    };

    match resolved {
        Some(character) => Resolution::Substituted(character),
        None => Resolution::Unchanged(token),
    }
}

fn decode_numeric(payload: &str) -> Option<char> {
    let code_point = match payload.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => payload.parse::<u32>().ok()?,
    };
    char::from_u32(code_point)
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
