use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, NFKC, strip accents
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let nfkc = lower.nfkc().collect::<String>();
    strip_accents(&nfkc)
}

fn strip_accents(s: &str) -> String {
    // NFD, затем выкидываем combining marks
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn folds_case_width_and_accents() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("ＧＲＡＳＳ"), "grass");
        assert_eq!(normalize("Ёлка"), "елка");
    }
}
