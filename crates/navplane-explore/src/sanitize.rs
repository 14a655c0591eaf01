//! Node-name sanitisation (spec.md §4.5 phase 1 "Normalise item strings"),
//! grounded in `node_generator.py::target_to_node_name`: lower-case, strip
//! HTML entities and common menu-chrome words, normalise accented
//! characters, collapse everything else to underscores.

const NOISE_WORDS: &[&str] = &[
    "tab",
    "register",
    "button",
    "screen",
    "menu",
    "page",
    "currently selected",
];

/// "TV Guide Tab" → "tv_guide", "Movies &amp; Series Tab" → "movies_series".
pub fn sanitize_node_name(raw: &str) -> String {
    let mut text = raw.to_lowercase();
    text = text.replace("&amp;", " ").replace("&nbsp;", " ").replace("&lt;", " ").replace("&gt;", " ");

    for word in NOISE_WORDS {
        text = text.replace(word, " ");
    }

    let decomposed: String = strip_accents(&text);

    let mut cleaned = String::with_capacity(decomposed.len());
    let mut last_was_sep = false;
    for ch in decomposed.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            cleaned.push('_');
            last_was_sep = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drop combining diacritics after NFD-equivalent decomposition for the
/// handful of accented Latin characters this system actually sees (spec.md
/// §4.5 "normalise accents"). A hand-rolled table rather than a full
/// Unicode normalisation pass, since the set of devices this targets only
/// ever surfaces Western European menu labels.
fn strip_accents(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Appends the `_temp` lifecycle suffix used for every node/edge created
/// during exploration until `finalize_structure` strips it (spec.md §4.5
/// phase 3).
pub fn temp_label(name: &str) -> String {
    format!("{name}_temp")
}
