//! URL slugs with Turkish transliteration.

pub const MAX_SLUG_LENGTH: usize = 100;

fn fold_turkish(c: char) -> Option<char> {
    let folded = match c {
        'İ' | 'I' | 'ı' | 'î' | 'Î' => 'i',
        'Ç' | 'ç' => 'c',
        'Ğ' | 'ğ' => 'g',
        'Ö' | 'ö' => 'o',
        'Ş' | 'ş' => 's',
        'Ü' | 'ü' | 'û' | 'Û' => 'u',
        'â' | 'Â' => 'a',
        _ => return None,
    };
    Some(folded)
}

/// `"Deprem Bölgesi İçin Acil Yardım!"` becomes `"deprem-bolgesi-icin-acil-yardim"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars() {
        let c = fold_turkish(c).unwrap_or_else(|| c.to_ascii_lowercase());
        if c.is_whitespace() || c == '-' {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            slug.push(c);
        }
    }

    let mut slug = slug.trim_matches('-').to_string();
    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        if let Some(cut) = slug.rfind('-') {
            if cut > MAX_SLUG_LENGTH / 2 {
                slug.truncate(cut);
            }
        }
        slug = slug.trim_matches('-').to_string();
    }
    slug
}

/// `base`, then `base-1`, `base-2`, ... for collision retries.
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
