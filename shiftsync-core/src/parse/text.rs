//! Cell text normalisation shared by the date and shift grammars.

/// Lowercases, folds French accents, maps unicode dashes to `-` and collapses
/// whitespace (including `&nbsp;`).
pub(crate) fn normalize(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_accents_and_dashes() {
        assert_eq!(normalize("  Congé\u{a0} Férié "), "conge ferie");
        assert_eq!(normalize("09:00 – 17:00"), "09:00 - 17:00");
        assert_eq!(normalize("9h\n—\t17h"), "9h - 17h");
    }
}
