use crate::error::{ConvertError, Result};

/// Convert a spreadsheet column letter sequence to a 1-based column index.
/// A -> 1, B -> 2, Z -> 26, AA -> 27, etc. Case-insensitive.
pub fn column_letter_to_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(ConvertError::InvalidColumn(letters.to_string()));
    }

    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(ConvertError::InvalidColumn(letters.to_string()));
        }
        let digit = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index
            .checked_mul(26)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| ConvertError::InvalidColumn(letters.to_string()))?;
    }

    Ok(index)
}
