use crate::model::Profile;

const NUMBER_MEANINGS: [&str; 9] = [
    "initiative",
    "partnership",
    "expression",
    "foundation",
    "change",
    "care",
    "inner search",
    "mastery",
    "completion",
];

/// Reduces a digit sum to a single digit 1..=9.
fn reduce(mut n: u32) -> u32 {
    while n > 9 {
        n = digits_sum(n);
    }
    n.max(1)
}

fn digits_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Pythagorean letter value: a..z cycle through 1..9.
fn letter_value(c: char) -> Option<u32> {
    c.is_ascii_alphabetic()
        .then(|| (c.to_ascii_lowercase() as u32 - 'a' as u32) % 9 + 1)
}

fn name_number(name: &str) -> Option<u32> {
    let sum: u32 = name.chars().filter_map(letter_value).sum();
    (sum > 0).then(|| reduce(sum))
}

fn birth_number(date: &str) -> Option<u32> {
    let sum: u32 = date
        .chars()
        .filter(char::is_ascii_digit)
        .map(|c| c as u32 - '0' as u32)
        .sum();
    (sum > 0).then(|| reduce(sum))
}

fn meaning(n: u32) -> &'static str {
    NUMBER_MEANINGS[(n as usize - 1).min(8)]
}

/// Personal-mode insight derived from the profile's name and birth date.
///
/// Plain digit-reduction numerology: deterministic, explainable, and empty
/// when the profile carries nothing usable.
pub(crate) fn personal_insight(profile: &Profile) -> Option<String> {
    let name = profile
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(name_number);
    let birth = profile
        .birth_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(birth_number);

    match (name, birth) {
        (Some(n), Some(b)) => Some(format!(
            "Your name carries the vibration of {n} ({}); your birth path is {b} ({}). Where they meet is where this verse wants to be read.",
            meaning(n),
            meaning(b)
        )),
        (Some(n), None) => Some(format!(
            "Your name carries the vibration of {n} ({}). Read the verse with that in mind.",
            meaning(n)
        )),
        (None, Some(b)) => Some(format!(
            "Your birth path is {b} ({}). Read the verse with that in mind.",
            meaning(b)
        )),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Option<&str>, date: Option<&str>) -> Profile {
        Profile {
            full_name: name.map(str::to_string),
            birth_date: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn insight_is_deterministic() {
        let p = profile(Some("Maria da Silva"), Some("1990-04-17"));
        assert_eq!(personal_insight(&p), personal_insight(&p));
    }

    #[test]
    fn empty_profile_yields_no_insight() {
        assert_eq!(personal_insight(&profile(None, None)), None);
        assert_eq!(personal_insight(&profile(Some("   "), Some(""))), None);
    }

    #[test]
    fn name_only_and_date_only_both_work() {
        assert!(personal_insight(&profile(Some("Ana"), None)).is_some());
        assert!(personal_insight(&profile(None, Some("2000-01-01"))).is_some());
    }

    #[test]
    fn non_letters_are_ignored_in_names() {
        let with_punct = personal_insight(&profile(Some("Ana-Luísa!"), None));
        let plain = personal_insight(&profile(Some("AnaLusa"), None));
        // Accented characters are skipped (ASCII letters only), punctuation too.
        assert_eq!(with_punct, plain);
    }

    #[test]
    fn reduction_lands_between_one_and_nine() {
        for date in ["1999-09-29", "1900-01-01", "2024-12-31"] {
            let n = birth_number(date).unwrap();
            assert!((1..=9).contains(&n));
        }
    }
}
