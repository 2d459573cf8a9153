//! Job name normalization and de-duplication.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const FALLBACK_JOB_NAME: &str = "job";

/// Fold a job name to plain ASCII: accents are stripped, a handful of
/// letters without a decomposition are spelled out, anything else that is
/// not ASCII is dropped. Surrounding whitespace is trimmed.
pub fn transliterate(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());

    for c in name.nfkd() {
        if c.is_ascii() {
            folded.push(c);
            continue;
        }
        if is_combining_mark(c) {
            continue;
        }
        if let Some(replacement) = spell_out(c) {
            folded.push_str(replacement);
        }
    }

    let trimmed = folded.trim();
    if trimmed.is_empty() {
        FALLBACK_JOB_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn spell_out(c: char) -> Option<&'static str> {
    let replacement = match c {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'ð' => "d",
        'Ð' => "D",
        'þ' => "th",
        'Þ' => "TH",
        'ı' => "i",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        '\u{2013}' | '\u{2014}' => "-",
        _ => return None,
    };
    Some(replacement)
}

/// Whether two job names collide once both are transliterated and ASCII
/// case is ignored.
pub fn same_job_name(a: &str, b: &str) -> bool {
    transliterate(a).eq_ignore_ascii_case(&transliterate(b))
}

/// Suffix number of `candidate` if it reads `<base>_(<N>)`. A suffix that
/// cannot be incremented does not count as a variant.
fn numbered_suffix(base: &str, candidate: &str) -> Option<u64> {
    if candidate.len() <= base.len() || !candidate.is_char_boundary(base.len()) {
        return None;
    }
    let (head, tail) = candidate.split_at(base.len());
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    let digits = tail.strip_prefix("_(")?.strip_suffix(')')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().filter(|n| *n < u64::MAX)
}

/// Return a transliterated `job_name` that does not collide with any of
/// `existing`. Existing names are transliterated too before comparing.
///
/// If neither the name nor a numbered variant `<name>_(<N>)` exists, the
/// name is returned as is. Otherwise the highest existing number plus one
/// is appended, so freed numbers are never handed out again.
pub fn make_unique<'a, I>(job_name: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = transliterate(job_name);

    let mut name_exists = false;
    let mut max_number = 0u64;

    for other in existing {
        let other = transliterate(other);
        if other.eq_ignore_ascii_case(&base) {
            name_exists = true;
        } else if let Some(number) = numbered_suffix(&base, &other) {
            name_exists = true;
            max_number = max_number.max(number);
        }
    }

    if !name_exists {
        base
    } else {
        format!("{}_({})", base, max_number + 1)
    }
}
