//! Character reference decoding (`&amp;`, `&#38;`, `&#x26;`).
//!
//! Only the frequently used named references are known. Anything that does
//! not decode is left in the text exactly as written.

use ahash::AHashMap;
use std::sync::LazyLock;

/// `(name, replacement, legacy)`. Legacy names also match without the
/// trailing semicolon, as browsers have always accepted `&amp` and `&copy`.
const NAMED_REFERENCES: &[(&str, &str, bool)] = &[
    ("amp", "&", true),
    ("lt", "<", true),
    ("gt", ">", true),
    ("quot", "\"", true),
    ("apos", "'", false),
    ("nbsp", "\u{00A0}", true),
    ("iexcl", "\u{00A1}", true),
    ("cent", "\u{00A2}", true),
    ("pound", "\u{00A3}", true),
    ("curren", "\u{00A4}", true),
    ("yen", "\u{00A5}", true),
    ("brvbar", "\u{00A6}", true),
    ("sect", "\u{00A7}", true),
    ("uml", "\u{00A8}", true),
    ("copy", "\u{00A9}", true),
    ("ordf", "\u{00AA}", true),
    ("laquo", "\u{00AB}", true),
    ("not", "\u{00AC}", true),
    ("shy", "\u{00AD}", true),
    ("reg", "\u{00AE}", true),
    ("macr", "\u{00AF}", true),
    ("deg", "\u{00B0}", true),
    ("plusmn", "\u{00B1}", true),
    ("sup2", "\u{00B2}", true),
    ("sup3", "\u{00B3}", true),
    ("acute", "\u{00B4}", true),
    ("micro", "\u{00B5}", true),
    ("para", "\u{00B6}", true),
    ("middot", "\u{00B7}", true),
    ("cedil", "\u{00B8}", true),
    ("sup1", "\u{00B9}", true),
    ("ordm", "\u{00BA}", true),
    ("raquo", "\u{00BB}", true),
    ("frac14", "\u{00BC}", true),
    ("frac12", "\u{00BD}", true),
    ("frac34", "\u{00BE}", true),
    ("iquest", "\u{00BF}", true),
    ("Agrave", "\u{00C0}", true),
    ("Aacute", "\u{00C1}", true),
    ("Acirc", "\u{00C2}", true),
    ("Atilde", "\u{00C3}", true),
    ("Auml", "\u{00C4}", true),
    ("Aring", "\u{00C5}", true),
    ("AElig", "\u{00C6}", true),
    ("Ccedil", "\u{00C7}", true),
    ("Egrave", "\u{00C8}", true),
    ("Eacute", "\u{00C9}", true),
    ("Ecirc", "\u{00CA}", true),
    ("Euml", "\u{00CB}", true),
    ("Igrave", "\u{00CC}", true),
    ("Iacute", "\u{00CD}", true),
    ("Icirc", "\u{00CE}", true),
    ("Iuml", "\u{00CF}", true),
    ("ETH", "\u{00D0}", true),
    ("Ntilde", "\u{00D1}", true),
    ("Ograve", "\u{00D2}", true),
    ("Oacute", "\u{00D3}", true),
    ("Ocirc", "\u{00D4}", true),
    ("Otilde", "\u{00D5}", true),
    ("Ouml", "\u{00D6}", true),
    ("times", "\u{00D7}", true),
    ("Oslash", "\u{00D8}", true),
    ("Ugrave", "\u{00D9}", true),
    ("Uacute", "\u{00DA}", true),
    ("Ucirc", "\u{00DB}", true),
    ("Uuml", "\u{00DC}", true),
    ("Yacute", "\u{00DD}", true),
    ("THORN", "\u{00DE}", true),
    ("szlig", "\u{00DF}", true),
    ("agrave", "\u{00E0}", true),
    ("aacute", "\u{00E1}", true),
    ("acirc", "\u{00E2}", true),
    ("atilde", "\u{00E3}", true),
    ("auml", "\u{00E4}", true),
    ("aring", "\u{00E5}", true),
    ("aelig", "\u{00E6}", true),
    ("ccedil", "\u{00E7}", true),
    ("egrave", "\u{00E8}", true),
    ("eacute", "\u{00E9}", true),
    ("ecirc", "\u{00EA}", true),
    ("euml", "\u{00EB}", true),
    ("igrave", "\u{00EC}", true),
    ("iacute", "\u{00ED}", true),
    ("icirc", "\u{00EE}", true),
    ("iuml", "\u{00EF}", true),
    ("eth", "\u{00F0}", true),
    ("ntilde", "\u{00F1}", true),
    ("ograve", "\u{00F2}", true),
    ("oacute", "\u{00F3}", true),
    ("ocirc", "\u{00F4}", true),
    ("otilde", "\u{00F5}", true),
    ("ouml", "\u{00F6}", true),
    ("divide", "\u{00F7}", true),
    ("oslash", "\u{00F8}", true),
    ("ugrave", "\u{00F9}", true),
    ("uacute", "\u{00FA}", true),
    ("ucirc", "\u{00FB}", true),
    ("uuml", "\u{00FC}", true),
    ("yacute", "\u{00FD}", true),
    ("thorn", "\u{00FE}", true),
    ("yuml", "\u{00FF}", true),
    ("OElig", "\u{0152}", false),
    ("oelig", "\u{0153}", false),
    ("Scaron", "\u{0160}", false),
    ("scaron", "\u{0161}", false),
    ("Yuml", "\u{0178}", false),
    ("fnof", "\u{0192}", false),
    ("circ", "\u{02C6}", false),
    ("tilde", "\u{02DC}", false),
    ("Alpha", "\u{0391}", false),
    ("Beta", "\u{0392}", false),
    ("Gamma", "\u{0393}", false),
    ("Delta", "\u{0394}", false),
    ("Theta", "\u{0398}", false),
    ("Lambda", "\u{039B}", false),
    ("Pi", "\u{03A0}", false),
    ("Sigma", "\u{03A3}", false),
    ("Phi", "\u{03A6}", false),
    ("Omega", "\u{03A9}", false),
    ("alpha", "\u{03B1}", false),
    ("beta", "\u{03B2}", false),
    ("gamma", "\u{03B3}", false),
    ("delta", "\u{03B4}", false),
    ("epsilon", "\u{03B5}", false),
    ("theta", "\u{03B8}", false),
    ("lambda", "\u{03BB}", false),
    ("mu", "\u{03BC}", false),
    ("pi", "\u{03C0}", false),
    ("sigma", "\u{03C3}", false),
    ("tau", "\u{03C4}", false),
    ("phi", "\u{03C6}", false),
    ("omega", "\u{03C9}", false),
    ("ensp", "\u{2002}", false),
    ("emsp", "\u{2003}", false),
    ("thinsp", "\u{2009}", false),
    ("zwnj", "\u{200C}", false),
    ("zwj", "\u{200D}", false),
    ("lrm", "\u{200E}", false),
    ("rlm", "\u{200F}", false),
    ("ndash", "\u{2013}", false),
    ("mdash", "\u{2014}", false),
    ("lsquo", "\u{2018}", false),
    ("rsquo", "\u{2019}", false),
    ("sbquo", "\u{201A}", false),
    ("ldquo", "\u{201C}", false),
    ("rdquo", "\u{201D}", false),
    ("bdquo", "\u{201E}", false),
    ("dagger", "\u{2020}", false),
    ("Dagger", "\u{2021}", false),
    ("bull", "\u{2022}", false),
    ("hellip", "\u{2026}", false),
    ("permil", "\u{2030}", false),
    ("prime", "\u{2032}", false),
    ("Prime", "\u{2033}", false),
    ("lsaquo", "\u{2039}", false),
    ("rsaquo", "\u{203A}", false),
    ("oline", "\u{203E}", false),
    ("frasl", "\u{2044}", false),
    ("euro", "\u{20AC}", false),
    ("trade", "\u{2122}", false),
    ("larr", "\u{2190}", false),
    ("uarr", "\u{2191}", false),
    ("rarr", "\u{2192}", false),
    ("darr", "\u{2193}", false),
    ("harr", "\u{2194}", false),
    ("forall", "\u{2200}", false),
    ("part", "\u{2202}", false),
    ("exist", "\u{2203}", false),
    ("empty", "\u{2205}", false),
    ("isin", "\u{2208}", false),
    ("sum", "\u{2211}", false),
    ("prod", "\u{220F}", false),
    ("minus", "\u{2212}", false),
    ("radic", "\u{221A}", false),
    ("infin", "\u{221E}", false),
    ("and", "\u{2227}", false),
    ("or", "\u{2228}", false),
    ("cap", "\u{2229}", false),
    ("cup", "\u{222A}", false),
    ("int", "\u{222B}", false),
    ("asymp", "\u{2248}", false),
    ("ne", "\u{2260}", false),
    ("equiv", "\u{2261}", false),
    ("le", "\u{2264}", false),
    ("ge", "\u{2265}", false),
    ("loz", "\u{25CA}", false),
    ("spades", "\u{2660}", false),
    ("clubs", "\u{2663}", false),
    ("hearts", "\u{2665}", false),
    ("diams", "\u{2666}", false),
];

/// Longest name in the table that may appear without a semicolon.
const LONGEST_LEGACY_NAME: usize = 6;

static NAMED_TABLE: LazyLock<AHashMap<&'static str, (&'static str, bool)>> = LazyLock::new(|| {
    NAMED_REFERENCES
        .iter()
        .map(|&(name, value, legacy)| (name, (value, legacy)))
        .collect()
});

/// A decoded reference and how many bytes of input (after the `&`) it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRef {
    pub text: String,
    pub consumed: usize,
}

/// Try to decode the character reference at the start of `rest`, which is
/// the input just after an `&`.
///
/// Returns `None` when the text does not form a reference the tokenizer
/// should decode; the caller then keeps the `&` literally.
pub fn decode(rest: &str, in_attribute: bool) -> Option<CharRef> {
    if rest.starts_with('#') {
        decode_numeric(rest)
    } else {
        decode_named(rest, in_attribute)
    }
}

fn decode_numeric(rest: &str) -> Option<CharRef> {
    let bytes = rest.as_bytes();
    let (radix, start) = match bytes.get(1) {
        Some(b'x') | Some(b'X') => (16, 2),
        _ => (10, 1),
    };

    let digits = bytes[start..]
        .iter()
        .take_while(|b| match radix {
            16 => b.is_ascii_hexdigit(),
            _ => b.is_ascii_digit(),
        })
        .count();
    if digits == 0 {
        return None;
    }

    let digits_end = start + digits;
    let consumed = if bytes.get(digits_end) == Some(&b';') {
        digits_end + 1
    } else {
        digits_end
    };

    // Overflow, NUL, surrogates and values past U+10FFFF stay literal.
    let c = u32::from_str_radix(&rest[start..digits_end], radix)
        .ok()
        .and_then(char::from_u32)
        .filter(|&c| c != '\0')?;

    Some(CharRef {
        text: c.to_string(),
        consumed,
    })
}

fn decode_named(rest: &str, in_attribute: bool) -> Option<CharRef> {
    let name_len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];

    if rest[name_len..].starts_with(';') {
        if let Some(&(value, _)) = NAMED_TABLE.get(name) {
            return Some(CharRef {
                text: value.to_string(),
                consumed: name_len + 1,
            });
        }
    }

    for len in (2..=name_len.min(LONGEST_LEGACY_NAME)).rev() {
        let Some(&(value, true)) = NAMED_TABLE.get(&name[..len]) else {
            continue;
        };
        if in_attribute {
            let next = rest[len..].chars().next();
            if next == Some('=') || next.is_some_and(|c| c.is_ascii_alphanumeric()) {
                return None;
            }
        }
        return Some(CharRef {
            text: value.to_string(),
            consumed: len,
        });
    }

    None
}
