// crates/podgrep_segment/src/common/strings.rs

/// Первая половина текста, обрезанная по границе слова.
///
/// Берём середину по символам (не байтам), затем идём вперёд до ближайшего
/// пробела и режем перед ним. Если после середины пробела нет или префикс
/// пустой: `None`: перекрытия нет.
pub fn half_prefix(s: &str) -> Option<&str> {
    let (byte_of_char, total_chars) = index_chars(s);
    if total_chars == 0 {
        return None;
    }
    let half_b = byte_of_char[total_chars / 2];
    let rel = s[half_b..].find(' ')?;
    let prefix = &s[..half_b + rel];
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Усечение по символам с «…».
pub fn truncate_chars_with_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let (byte_of_char, total_chars) = index_chars(s);
    if total_chars <= max_chars {
        return s.to_string();
    }
    let end_b = byte_of_char[max_chars];
    let mut out = String::from(&s[..end_b]);
    out.push('…');
    out
}

/// Таблица char_idx -> byte_offset, в конце добавлен s.len().
/// Возвращает (таблица, количество символов).
fn index_chars(s: &str) -> (Vec<usize>, usize) {
    let mut byte_of_char = Vec::with_capacity(s.len() + 1);
    for (b, _) in s.char_indices() {
        byte_of_char.push(b);
    }
    byte_of_char.push(s.len());
    let total_chars = byte_of_char.len() - 1;
    (byte_of_char, total_chars)
}
