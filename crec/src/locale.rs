//! Accept-Language parsing for locale matching.
//!
//! Each requested tag is reduced to lower-cased (language, script, region)
//! values. When a tag leaves script or region implicit, the most likely value
//! for the language is filled in, so `de` requests region `de` and script
//! `latn` just as `de-DE` would.

/// One requested locale, all values lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTag {
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
}

// language -> (script, region)
const LIKELY_SUBTAGS: &[(&str, &str, &str)] = &[
    ("ar", "arab", "eg"),
    ("bg", "cyrl", "bg"),
    ("bn", "beng", "bd"),
    ("ca", "latn", "es"),
    ("cs", "latn", "cz"),
    ("da", "latn", "dk"),
    ("de", "latn", "de"),
    ("el", "grek", "gr"),
    ("en", "latn", "us"),
    ("es", "latn", "es"),
    ("et", "latn", "ee"),
    ("fa", "arab", "ir"),
    ("fi", "latn", "fi"),
    ("fr", "latn", "fr"),
    ("he", "hebr", "il"),
    ("hi", "deva", "in"),
    ("hr", "latn", "hr"),
    ("hu", "latn", "hu"),
    ("id", "latn", "id"),
    ("it", "latn", "it"),
    ("ja", "jpan", "jp"),
    ("ko", "kore", "kr"),
    ("lt", "latn", "lt"),
    ("lv", "latn", "lv"),
    ("ms", "latn", "my"),
    ("nb", "latn", "no"),
    ("nl", "latn", "nl"),
    ("no", "latn", "no"),
    ("pl", "latn", "pl"),
    ("pt", "latn", "br"),
    ("ro", "latn", "ro"),
    ("ru", "cyrl", "ru"),
    ("sk", "latn", "sk"),
    ("sl", "latn", "si"),
    ("sr", "cyrl", "rs"),
    ("sv", "latn", "se"),
    ("th", "thai", "th"),
    ("tr", "latn", "tr"),
    ("uk", "cyrl", "ua"),
    ("vi", "latn", "vn"),
    ("zh", "hans", "cn"),
];

fn likely_script(language: &str, region: Option<&str>) -> Option<String> {
    if language == "zh" && matches!(region, Some("tw") | Some("hk") | Some("mo")) {
        return Some("hant".to_string());
    }
    LIKELY_SUBTAGS
        .iter()
        .find(|(lang, _, _)| *lang == language)
        .map(|(_, script, _)| script.to_string())
}

fn likely_region(language: &str, script: Option<&str>) -> Option<String> {
    if language == "zh" && script == Some("hant") {
        return Some("tw".to_string());
    }
    LIKELY_SUBTAGS
        .iter()
        .find(|(lang, _, _)| *lang == language)
        .map(|(_, _, region)| region.to_string())
}

fn is_alpha(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_digit(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// Parses a single language tag such as `de`, `de-AT` or `zh_Hant_TW`.
pub fn parse_tag(raw: &str) -> Option<LocaleTag> {
    let lowered = raw.trim().to_ascii_lowercase();
    let mut subtags = lowered.split(['-', '_']).peekable();

    let language = subtags.next()?;
    let valid_language =
        is_alpha(language) && matches!(language.len(), 2 | 3 | 5..=8);
    if !valid_language {
        return None;
    }

    // extlang
    let mut skipped = 0;
    while let Some(next) = subtags.peek() {
        if skipped < 3 && next.len() == 3 && is_alpha(next) {
            subtags.next();
            skipped += 1;
        } else {
            break;
        }
    }

    let mut script = None;
    if let Some(next) = subtags.peek() {
        if next.len() == 4 && is_alpha(next) {
            script = Some(next.to_string());
            subtags.next();
        }
    }

    let mut region = None;
    if let Some(next) = subtags.peek() {
        if (next.len() == 2 && is_alpha(next)) || (next.len() == 3 && is_digit(next)) {
            region = Some(next.to_string());
            subtags.next();
        }
    }

    // variants and extensions only need to be well formed
    for rest in subtags {
        if rest.is_empty() || rest.len() > 8 || !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
    }

    let script = script.or_else(|| likely_script(language, region.as_deref()));
    let region = region.or_else(|| likely_region(language, script.as_deref()));

    Some(LocaleTag {
        language: language.to_string(),
        script,
        region,
    })
}

/// Parses an Accept-Language header into tags ordered by preference.
///
/// Wildcards and entries with `q=0` are dropped. A single malformed entry
/// rejects the whole header. An empty result means "no usable preference".
pub fn parse_accept_language(header: &str) -> Vec<LocaleTag> {
    let mut weighted: Vec<(f32, LocaleTag)> = Vec::new();

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let tag = parts.next().unwrap_or("").trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let mut quality = 1.0_f32;
        for param in parts {
            let param = param.trim();
            if let Some(value) = param.strip_prefix("q=").or_else(|| param.strip_prefix("Q=")) {
                match value.trim().parse::<f32>() {
                    Ok(q) if (0.0..=1.0).contains(&q) => quality = q,
                    _ => return Vec::new(),
                }
            }
        }

        let Some(parsed) = parse_tag(tag) else {
            return Vec::new();
        };
        if quality > 0.0 {
            weighted.push((quality, parsed));
        }
    }

    // stable: equal weights keep header order
    weighted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(_, tag)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explicit_region() {
        let tag = parse_tag("de-AT").unwrap();
        assert_eq!(tag.language, "de");
        assert_eq!(tag.region.as_deref(), Some("at"));
        assert_eq!(tag.script.as_deref(), Some("latn"));
    }

    #[test]
    fn test_parse_infers_region_and_script() {
        let tag = parse_tag("de").unwrap();
        assert_eq!(tag.region.as_deref(), Some("de"));
        assert_eq!(tag.script.as_deref(), Some("latn"));

        let tag = parse_tag("zh-TW").unwrap();
        assert_eq!(tag.script.as_deref(), Some("hant"));
    }

    #[test]
    fn test_parse_script_and_underscore() {
        let tag = parse_tag("sr_Latn_RS").unwrap();
        assert_eq!(tag.language, "sr");
        assert_eq!(tag.script.as_deref(), Some("latn"));
        assert_eq!(tag.region.as_deref(), Some("rs"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_tag("").is_none());
        assert!(parse_tag("1234").is_none());
        assert!(parse_tag("en-!!").is_none());
    }

    #[test]
    fn test_accept_language_orders_by_quality() {
        let tags = parse_accept_language("fr;q=0.5, en-CA, de;q=0.8");
        let languages: Vec<&str> = tags.iter().map(|t| t.language.as_str()).collect();
        assert_eq!(languages, vec!["en", "de", "fr"]);
    }

    #[test]
    fn test_accept_language_drops_wildcard_and_zero_quality() {
        assert!(parse_accept_language("*").is_empty());
        assert!(parse_accept_language("en;q=0").is_empty());
        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn test_accept_language_rejects_header_with_malformed_entry() {
        assert!(parse_accept_language("en;q=abc, de").is_empty());
        assert!(parse_accept_language("de-AT, !!").is_empty());
        assert!(parse_accept_language("en;q=1.5").is_empty());
        assert_eq!(parse_accept_language("de-AT, , en").len(), 2);
    }
}
