use lazy_static::lazy_static;
use regex::Regex;

/// Smallest reading accepted as a body weight, in kg.
pub const MIN_PLAUSIBLE_KG: f64 = 20.0;
/// Largest reading accepted as a body weight, in kg.
pub const MAX_PLAUSIBLE_KG: f64 = 300.0;

/// First decimal number in `text` that falls inside the plausible body-weight range.
pub fn find_weight(text: &str) -> Option<f64> {
    lazy_static! {
        static ref NUMBER_RE: Regex = Regex::new(r"\d+(?:[.,]\d+)?").unwrap();
    }
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .find(|v| (MIN_PLAUSIBLE_KG..=MAX_PLAUSIBLE_KG).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_display() {
        assert_eq!(find_weight("82.5 kg\n"), Some(82.5));
    }

    #[test]
    fn accepts_decimal_comma() {
        assert_eq!(find_weight("  74,3"), Some(74.3));
    }

    #[test]
    fn skips_implausible_numbers() {
        // clock digits and a battery percentage before the reading
        assert_eq!(find_weight("07 12 5% 91.2 KG"), Some(91.2));
        assert_eq!(find_weight("1500 3.2"), None);
    }

    #[test]
    fn none_without_digits() {
        assert_eq!(find_weight("Err LO"), None);
        assert_eq!(find_weight(""), None);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert_eq!(find_weight("20"), Some(20.0));
        assert_eq!(find_weight("300.0"), Some(300.0));
        assert_eq!(find_weight("300.1"), None);
    }
}
