use super::normalizer::normalize;

/// Токены текста: нормализация + разбиение по не-буквенно-цифровым символам.
/// Апостроф внутри слова сохраняется (`don't`), по краям срезается.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
