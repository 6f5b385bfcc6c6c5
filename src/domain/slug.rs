use rand::distributions::Alphanumeric;
use rand::Rng;

const SUFFIX_LENGTH: usize = 6;
const MAX_BASE_LENGTH: usize = 40;

/// Builds a public slug from an establishment name plus a random suffix.
/// Calling it again for the same name yields a different candidate, which is
/// what the creation path relies on when a slug is already taken.
pub fn generate_slug<R: Rng>(name: &str, rng: &mut R) -> String {
    let base = slugify(name);
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect();
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if slug.len() == MAX_BASE_LENGTH {
                break;
            }
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
