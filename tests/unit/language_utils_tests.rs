/*!
 * Tests for language code handling
 */

use docxlate::language_utils::{
    SourceLanguage, TargetLanguage, get_language_name, language_codes_match, normalize_to_part1,
    supported_target_codes,
};

#[test]
fn test_supportedTargetCodes_shouldListEightIndianLanguages() {
    let codes = supported_target_codes();
    assert_eq!(codes, vec!["bn", "hi", "or", "pa", "ta", "te", "gu", "ml"]);
}

#[test]
fn test_targetLanguage_parse_withThreeLetterCode_shouldResolve() {
    assert_eq!(TargetLanguage::parse("tam").unwrap(), TargetLanguage::Tamil);
    assert_eq!(TargetLanguage::parse(" Telugu ").unwrap(), TargetLanguage::Telugu);
}

#[test]
fn test_targetLanguage_nativeName_shouldBeKnownForHindi() {
    assert!(TargetLanguage::Hindi.native_name().is_some());
}

#[test]
fn test_sourceLanguage_parse_withThreeLetterCode_shouldNormalize() {
    assert_eq!(SourceLanguage::parse("eng").unwrap(), SourceLanguage::Fixed("en".to_string()));
    assert_eq!(SourceLanguage::parse("").unwrap(), SourceLanguage::Auto);
    assert!(SourceLanguage::parse("xx").is_err());
}

#[test]
fn test_languageCodesMatch_shouldCompareAcrossStandards() {
    assert!(language_codes_match("hi", "hin"));
    assert!(!language_codes_match("hi", "ta"));
    assert!(!language_codes_match("hi", "zz"));
}

#[test]
fn test_normalizeToPart1_withInvalidCode_shouldFail() {
    assert!(normalize_to_part1("english").is_err());
    assert_eq!(normalize_to_part1("BEN").unwrap(), "bn");
}

#[test]
fn test_getLanguageName_withAuto_shouldDescribeDetection() {
    assert_eq!(get_language_name("auto").unwrap(), "Auto-detect");
    assert_eq!(get_language_name("gu").unwrap(), "Gujarati");
}
