use inspection_loader::decode_traceability;
use inspection_loader::extractor::packing_date;
use proptest::prelude::*;

proptest! {
    #[test]
    fn decoder_is_total(code in "\\PC{0,24}") {
        let (week, year) = decode_traceability(&code);
        prop_assert!(week <= 53);
        prop_assert!((week == 0) == (year == 0));
    }

    #[test]
    fn short_codes_decode_to_zero(code in "[0-9]{0,5}") {
        prop_assert_eq!(decode_traceability(&code), (0, 0));
    }

    #[test]
    fn valid_suffix_decodes(prefix in "[A-Z0-9]{0,8}", day in 1u32..=28, month in 1u32..=12, yy in 0u32..=99) {
        let code = format!("{}{:02}{:02}{:02}", prefix, day, month, yy);
        let date = packing_date(&code);
        prop_assert!(date.is_some());

        let (week, year) = decode_traceability(&code);
        prop_assert!((1..=53).contains(&week));
        let expected_year = if yy <= 30 { 2000 + yy as i32 } else { 1900 + yy as i32 };
        prop_assert_eq!(year, expected_year);
    }
}
