use std::fmt;

/// Discriminator for the logical request a key belongs to. Two kinds never
/// share a key even if their parameters coincide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Geocode,
    Overpass,
    ReverseGeocode,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Geocode => "geocode",
            RequestKind::Overpass => "overpass",
            RequestKind::ReverseGeocode => "reverse",
        }
    }
}

/// Opaque cache key. Built only through [`fingerprint`]; callers never
/// inspect its contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a logical request to its cache key: `kind:a=1&b=2`, parameters
/// sorted by name so call sites do not have to agree on an order.
///
/// Pure and deterministic. Parameters must already be normalized (see
/// [`normalize_city`], [`round_coord`]) so near-duplicate requests collapse
/// onto the same key.
pub fn fingerprint(kind: RequestKind, params: &[(&str, String)]) -> CacheKey {
    let mut params: Vec<&(&str, String)> = params.iter().collect();
    params.sort_by_key(|(name, _)| *name);

    let mut key = String::from(kind.as_str());
    key.push(':');
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            key.push('&');
        }
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    CacheKey(key)
}

/// Trim, collapse inner whitespace, lowercase. "  SÃO  Paulo " and
/// "são paulo" become the same city.
pub fn normalize_city(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fixed-precision coordinate text for keys; 5 decimals is ~1m, close
/// enough that jittered coordinates still dedupe.
pub fn round_coord(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_whitespace_variants_share_a_key() {
        let a = fingerprint(
            RequestKind::Geocode,
            &[("city", normalize_city("  Lisbon "))],
        );
        let b = fingerprint(RequestKind::Geocode, &[("city", normalize_city("lisbon"))]);
        assert_eq!(a, b);
    }

    #[test]
    fn inner_whitespace_is_collapsed() {
        assert_eq!(normalize_city("  New   York "), "new york");
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let a = fingerprint(
            RequestKind::Overpass,
            &[("lat", "38.70000".into()), ("lon", "-9.10000".into())],
        );
        let b = fingerprint(
            RequestKind::Overpass,
            &[("lon", "-9.10000".into()), ("lat", "38.70000".into())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn kinds_never_collide() {
        let params = [("city", "porto".to_string())];
        let a = fingerprint(RequestKind::Geocode, &params);
        let b = fingerprint(RequestKind::Overpass, &params);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_params_get_distinct_keys() {
        let a = fingerprint(RequestKind::Geocode, &[("city", "porto".into())]);
        let b = fingerprint(RequestKind::Geocode, &[("city", "faro".into())]);
        assert_ne!(a, b);
    }

    #[test]
    fn coordinates_round_to_fixed_precision() {
        assert_eq!(round_coord(38.70000012, 5), "38.70000");
        assert_eq!(round_coord(-9.1, 5), "-9.10000");
        assert_eq!(round_coord(38.700004, 5), round_coord(38.7, 5));
    }
}
