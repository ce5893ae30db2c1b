use crate::table::ReferenceTable;
use std::borrow::Cow;

/// Returns the preferred character reference for `character`.
///
/// When several names alias the character, the first all-lowercase name
/// (`&[a-z]+;`) wins, falling back to the first name in table order.
/// Characters without a name are returned as-is if `named_only` is set or if
/// they are ASCII; everything else becomes a `&#xhhhhh;` escape.
pub fn escape_char(table: &ReferenceTable, character: char, named_only: bool) -> Cow<'_, str> {
    if let Some(names) = table.lookup_code_point(character) {
        if let Some(name) = preferred_name(names) {
            return Cow::Borrowed(name);
        }
    }

    if named_only || character.is_ascii() {
        return Cow::Owned(character.to_string());
    }

    Cow::Owned(format!("&#x{:05x};", u32::from(character)))
}

/// Every name registered for `character`, in table order, for callers that
/// want to pick one themselves.
pub fn escape_char_advanced(table: &ReferenceTable, character: char) -> Option<&[String]> {
    table.lookup_code_point(character)
}

pub fn escape_text(table: &ReferenceTable, text: &str, named_only: bool) -> String {
    let mut output = String::with_capacity(text.len());
    for character in text.chars() {
        output.push_str(&escape_char(table, character, named_only));
    }
    output
}

/// Escapes UTF-16 code units. Unpaired surrogates have no scalar value to
/// escape and are copied through unchanged.
pub fn escape_utf16(table: &ReferenceTable, units: &[u16], named_only: bool) -> Vec<u16> {
    let mut output = Vec::with_capacity(units.len());
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(character) => {
                output.extend(escape_char(table, character, named_only).encode_utf16());
            }
            Err(error) => output.push(error.unpaired_surrogate()),
        }
    }
    output
}

fn preferred_name(names: &[String]) -> Option<&str> {
    if names.len() > 1 {
        if let Some(lowercase) = names.iter().find(|name| is_lowercase_name(name)) {
            return Some(lowercase.as_str());
        }
    }
    names.first().map(String::as_str)
}

fn is_lowercase_name(name: &str) -> bool {
    name.strip_prefix('&')
        .and_then(|rest| rest.strip_suffix(';'))
        .is_some_and(|body| !body.is_empty() && body.bytes().all(|byte| byte.is_ascii_lowercase()))
}
