//! Region slugs as they appear in navigation paths.

pub const REGIONS: &[(&str, &str)] = &[
    ("north-america-east", "North America East"),
    ("north-america-west", "North America West"),
    ("europe-central", "Europe Central"),
    ("europe-west", "Europe West"),
    ("south-america", "South America"),
];

/// Display name for a region path token, if the token is known.
pub fn lookup(slug: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, name)| *name)
}

/// Lowercase, URL-safe slug of a display name.
///
/// Runs of anything that is not ASCII alphanumeric collapse into a single
/// `-`, and leading or trailing separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_round_trips_known_regions() {
        for (slug, name) in REGIONS {
            assert_eq!(slugify(name), *slug);
        }
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Adventurer's  Tome "), "adventurer-s-tome");
        assert_eq!(slugify(""), "");
    }
}
