use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Longest slug produced by [`slugify`].
pub const SLUG_MAX_LEN: usize = 80;

/// Returned by [`slugify`] when nothing usable survives normalization.
pub const SLUG_PLACEHOLDER: &str = "x";

/// Build a stable, ASCII-lowercase, hyphen-joined code from free text.
///
/// Diacritics are decomposed and dropped (`"Pneus Época"` -> `pneus-epoca`),
/// every run of characters outside `[a-z0-9]` collapses to a single hyphen,
/// and leading/trailing hyphens are trimmed. The result is capped at
/// [`SLUG_MAX_LEN`] bytes and falls back to [`SLUG_PLACEHOLDER`] when empty.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for ch in input.nfd().filter(|c| !is_combining_mark(*c)) {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    // Output is pure ASCII, so byte truncation never splits a character.
    out.truncate(SLUG_MAX_LEN);
    let trimmed = out.trim_end_matches('-');

    if trimmed.is_empty() {
        SLUG_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Racing Seats"), "racing-seats");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(slugify("Acessórios Condução"), "acessorios-conducao");
        assert_eq!(slugify("Ç ã é"), "c-a-e");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("Tyres | Racing"), "tyres-racing");
        assert_eq!(slugify("A  --  B"), "a-b");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  (Helmets)  "), "helmets");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("FIA 8856-2018"), "fia-8856-2018");
    }

    #[test]
    fn upper_case_non_ascii_letters_are_folded() {
        assert_eq!(slugify("ÉPOCA"), "epoca");
    }

    #[test]
    fn empty_or_symbol_only_input_falls_back() {
        assert_eq!(slugify(""), SLUG_PLACEHOLDER);
        assert_eq!(slugify("  | / -- "), SLUG_PLACEHOLDER);
    }

    #[test]
    fn caps_length_without_trailing_hyphen() {
        let long = format!("{} b", "a".repeat(SLUG_MAX_LEN - 1));
        let slug = slugify(&long);
        assert_eq!(slug.len(), SLUG_MAX_LEN - 1);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn identical_input_gives_identical_slug() {
        let a = slugify("Volantes | Desportivos | 350mm");
        let b = slugify("Volantes | Desportivos | 350mm");
        assert_eq!(a, b);
    }
}
