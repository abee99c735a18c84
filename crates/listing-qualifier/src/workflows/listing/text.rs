const INVISIBLE: [char; 4] = ['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}'];

/// Scan form of listing text: invisible joiners removed, whitespace collapsed.
///
/// Scraped Thai copy routinely carries zero-width spaces between words, which
/// would otherwise split dictionary phrases. Evidence spans refer to this form.
pub(crate) fn scan_text(value: &str) -> String {
    let cleaned = value.replace(INVISIBLE, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup key for localities and dictionary phrases.
pub(crate) fn normalize_key(value: &str) -> String {
    scan_text(value).to_lowercase()
}

/// Sentence of `text` surrounding the byte range `start..end`.
pub(crate) fn enclosing_sentence(text: &str, start: usize, end: usize) -> &str {
    let (begin, finish) = sentence_bounds(text, start, end);
    text[begin..finish].trim()
}

/// Byte bounds of the sentence around `start..end`, terminator included.
pub(crate) fn sentence_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    // A full stop inside a number such as `2.2` does not end a sentence.
    let is_stop = |idx: usize, c: char| match c {
        '!' | '?' | '\n' => true,
        '.' => !text[idx + 1..]
            .chars()
            .next()
            .is_some_and(|next| next.is_ascii_digit()),
        _ => false,
    };
    let begin = text[..start]
        .char_indices()
        .rev()
        .find(|(idx, c)| is_stop(*idx, *c))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let finish = text[end..]
        .char_indices()
        .find(|(idx, c)| is_stop(end + idx, *c))
        .map(|(idx, c)| end + idx + c.len_utf8())
        .unwrap_or(text.len());
    (begin, finish)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_text_strips_zero_width_and_collapses_whitespace() {
        let source = "\u{feff}เจ้าของ\u{200b}ขายเอง   บ้าน\nเดี่ยว";
        assert_eq!(scan_text(source), "เจ้าของขายเอง บ้าน เดี่ยว");
    }

    #[test]
    fn normalize_key_folds_case() {
        assert_eq!(normalize_key("  Don   Mueang "), "don mueang");
    }

    #[test]
    fn enclosing_sentence_stops_at_punctuation() {
        let text = "Great house. Raised floor above 2011 flood level! Call now.";
        let start = text.find("flood").expect("present");
        let sentence = enclosing_sentence(text, start, start + "flood".len());
        assert_eq!(sentence, "Raised floor above 2011 flood level!");
    }

    #[test]
    fn decimal_point_does_not_split_sentences() {
        let text = "ราคา 2.2 ล้าน ช่วงหน้าฝนน้ำท่วมขังเล็กน้อย. โทรเลย";
        let start = text.find("น้ำท่วม").expect("present");
        let sentence = enclosing_sentence(text, start, start + "น้ำท่วม".len());
        assert_eq!(sentence, "ราคา 2.2 ล้าน ช่วงหน้าฝนน้ำท่วมขังเล็กน้อย.");
    }
}
