mod common;

use lazyparse::parser::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn many_never_fails_and_collects_leading_matches(text in "[ab]{0,24}") {
        let leading = text.chars().take_while(|c| *c == 'a').count();
        let (rest, values) = character('a').many().parse_str(&text).unwrap();
        prop_assert_eq!(values.len(), leading);
        prop_assert_eq!(rest.position(), leading);
        prop_assert_eq!(rest.to_string(), text[leading..].to_string());
    }

    #[test]
    fn or_prefers_left_whenever_it_succeeds(text in "[abc]{0,12}") {
        let left = literal("ab");
        let both = literal("ab").or(literal("a"));
        if let Ok(expected) = left.parse_str(&text) {
            prop_assert_eq!(both.parse_str(&text).unwrap(), expected);
        }
    }

    #[test]
    fn then_failure_is_deterministic(text in "[0-9a-z]{0,6}") {
        let digit = satisfy(|c: &char| c.to_digit(10));
        let pair = digit.clone().then(digit);
        let input = Stream::from(text.as_str());
        let first = pair.parse(&input);
        let second = pair.parse(&input);
        prop_assert_eq!(&first, &second);
        if let Err(error) = first {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            prop_assert_eq!(error.position(), digits.min(1));
        }
    }

    #[test]
    fn times_has_no_partial_result(available in 0usize..8, wanted in 0usize..8) {
        let text = format!("{}b", "a".repeat(available));
        let result = character('a').times(wanted).parse_str(&text);
        if wanted <= available {
            let (rest, values) = result.unwrap();
            prop_assert_eq!(values.len(), wanted);
            prop_assert_eq!(rest.position(), wanted);
        } else {
            let error = result.unwrap_err();
            prop_assert_eq!(error.position(), available);
        }
    }

    #[test]
    fn sep_by_collects_every_item(items in proptest::collection::vec(0u32..10, 0..10)) {
        let text: String = items.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",");
        let digit = satisfy(|c: &char| c.to_digit(10));
        let (rest, values) = digit.sep_by(character(',')).parse_str(&text).unwrap();
        prop_assert_eq!(values, items);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn stream_equality_is_structural(text in ".{0,16}") {
        prop_assert_eq!(Stream::from(text.as_str()), text.chars().collect::<Stream<char>>());
    }

    #[test]
    fn digit_pattern_stops_at_first_non_digit(digits in "[0-9]{1,8}", tail in "[a-z ]{0,8}") {
        let text = format!("{}{}", digits, tail);
        let (rest, value) = pattern("[0-9]+").unwrap().parse_str(&text).unwrap();
        prop_assert_eq!(value, digits);
        prop_assert_eq!(rest.to_string(), tail);
    }
}

#[test]
fn sep_by_on_empty_input_keeps_the_stream() {
    let input = Stream::from("");
    let (rest, values) = any_char().sep_by(character(',')).parse(&input).unwrap();
    assert!(values.is_empty());
    assert!(rest.ptr_eq(&input));
}
