const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

const REPLACEMENT: &str = "****";

/// Replace profane words with asterisks.
///
/// Words are separated by any whitespace, which is kept as is. Matching is
/// case-insensitive. Words with punctuation attached (`Sharbert!`) are left
/// untouched.
pub fn clean_body(body: &str) -> String {
    let mut cleaned = String::with_capacity(body.len());
    let mut rest = body;
    while !rest.is_empty() {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (word, tail) = rest.split_at(word_end);
        cleaned.push_str(if is_profane(word) { REPLACEMENT } else { word });

        let gap_end = tail.find(|c: char| !c.is_whitespace()).unwrap_or(tail.len());
        cleaned.push_str(&tail[..gap_end]);
        rest = &tail[gap_end..];
    }
    cleaned
}

fn is_profane(word: &str) -> bool {
    PROFANE_WORDS.contains(&word.to_lowercase().as_str())
}
