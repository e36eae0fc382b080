// ── Street name normalization ──
//
// Shared by the street index (dedup key) and street input validation.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(street|avenue|road|drive|suite)\b").expect("suffix pattern is valid")
});

fn abbreviate(word: &str) -> &'static str {
    match word {
        "street" => "st",
        "avenue" => "ave",
        "road" => "rd",
        "drive" => "dr",
        _ => "ste",
    }
}

/// Normalize a street name for comparison.
///
/// Trims, lowercases, strips periods, then abbreviates whole-word suffixes
/// (`street`→`st`, `avenue`→`ave`, `road`→`rd`, `drive`→`dr`, `suite`→`ste`).
/// Words that merely contain a suffix (`streetwise`) are left alone.
pub fn normalize(name: &str) -> String {
    let folded = name.trim().to_lowercase().replace('.', "");
    SUFFIX
        .replace_all(&folded, |caps: &Captures<'_>| abbreviate(&caps[1]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn abbreviates_suffixes_and_strips_periods() {
        assert_eq!(normalize("123 Main Street."), "123 main st");
        assert_eq!(normalize("Suite 4 Drive"), "ste 4 dr");
        assert_eq!(normalize("  Oak Grove Road "), "oak grove rd");
        assert_eq!(normalize("N. Main Avenue"), "n main ave");
    }

    #[test]
    fn leaves_partial_words_untouched() {
        assert_eq!(normalize("Streetwise Avenues"), "streetwise avenues");
        assert_eq!(normalize("Broadway"), "broadway");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize("Ygnacio Valley Road");
        assert_eq!(normalize(&once), once);
    }
}
