/// Punctuation kept by [`clean_text`]; everything else that is not a word
/// character or whitespace is replaced by a space.
const KEPT_PUNCTUATION: &[char] = &['.', ',', '!', '?', ':', ';', '(', ')', '-', '\''];

fn is_kept(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || KEPT_PUNCTUATION.contains(&ch)
}

/// Normalizes scraped page text before chunking.
///
/// - characters outside word characters and basic punctuation become spaces
/// - whitespace runs collapse to a single separator: `"\n\n"` if the run held
///   two or more newlines, `"\n"` for exactly one, otherwise `" "`
/// - leading and trailing whitespace is removed
///
/// Paragraph and line breaks survive so the chunker can still prefer them.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut pending_newlines = 0usize;

    for ch in text.chars() {
        if is_kept(ch) {
            if !out.is_empty() {
                match pending_newlines {
                    0 if pending_space => out.push(' '),
                    0 => {}
                    1 => out.push('\n'),
                    _ => out.push_str("\n\n"),
                }
            }
            pending_space = false;
            pending_newlines = 0;
            out.push(ch);
        } else if ch == '\n' {
            pending_newlines += 1;
        } else {
            pending_space = true;
        }
    }

    out
}
