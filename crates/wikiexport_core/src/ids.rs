use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Stable identifier for a title: lowercase ascii words joined by `-`.
pub fn normalize(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.nfd().filter(|ch| !is_combining_mark(*ch)) {
        let folded: &[char] = match ch {
            'œ' | 'Œ' => &['o', 'e'],
            'æ' | 'Æ' => &['a', 'e'],
            '\'' | '’' => continue,
            _ => &[],
        };
        if !folded.is_empty() {
            flush_separator(&mut output, &mut pending_separator);
            output.extend(folded.iter());
            continue;
        }
        if ch.is_alphanumeric() {
            flush_separator(&mut output, &mut pending_separator);
            output.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    output
}

fn flush_separator(output: &mut String, pending: &mut bool) {
    if *pending && !output.is_empty() {
        output.push('-');
    }
    *pending = false;
}

/// Page name used by the DRP site: every alphanumeric run starts uppercase.
pub fn title_case_page_name(id: &str) -> String {
    let mut output = String::with_capacity(id.len());
    let mut word_start = true;
    for ch in id.chars() {
        if ch.is_alphanumeric() {
            if word_start {
                output.extend(ch.to_uppercase());
                word_start = false;
            } else {
                output.push(ch);
            }
        } else {
            output.push('-');
            word_start = true;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{normalize, title_case_page_name};

    #[test]
    fn normalize_folds_case_diacritics_and_punctuation() {
        assert_eq!(normalize("Boule de feu"), "boule-de-feu");
        assert_eq!(normalize("Éclair"), "eclair");
        assert_eq!(normalize("Arme de prédilection"), "arme-de-predilection");
        assert_eq!(normalize("  Soins légers (masse) "), "soins-legers-masse");
        assert_eq!(normalize("Oeil du mage"), normalize("Œil du mage"));
    }

    #[test]
    fn normalize_drops_apostrophes_inside_words() {
        assert_eq!(normalize("Main d'Anathème"), "main-danatheme");
        assert_eq!(normalize("Main d’Anathème"), "main-danatheme");
    }

    #[test]
    fn normalize_is_stable_for_already_normalized_ids() {
        let once = normalize("Convocation de monstres I");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn title_case_page_name_uppercases_each_word() {
        assert_eq!(title_case_page_name("boule-de-feu"), "Boule-De-Feu");
        assert_eq!(title_case_page_name("soins 2"), "Soins-2");
    }
}
