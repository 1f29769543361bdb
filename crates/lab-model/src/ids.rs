//! Case admission identifiers.

/// Width the episode suffix is zero-padded to.
pub const CASE_SUFFIX_WIDTH: usize = 4;

/// Builds a case admission identifier from a patient identifier and an
/// episode suffix: `"{patient_id}_{suffix}"` with the suffix left-padded with
/// zeros to four characters. Longer suffixes are kept unchanged.
pub fn case_admission_id(patient_id: &str, episode_suffix: &str) -> String {
    let suffix = episode_suffix.trim();
    format!(
        "{}_{:0>width$}",
        patient_id.trim(),
        suffix,
        width = CASE_SUFFIX_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_suffix() {
        assert_eq!(case_admission_id("123", "45"), "123_0045");
    }

    #[test]
    fn keeps_full_suffix() {
        assert_eq!(case_admission_id("123", "9876"), "123_9876");
        assert_eq!(case_admission_id("123", "123456"), "123_123456");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(case_admission_id(" 7 ", " 1 "), "7_0001");
    }
}
