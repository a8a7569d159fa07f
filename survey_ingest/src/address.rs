//! Spreadsheet-style cell addresses (`A1`, `B1`, `AA10`), used as stand-in
//! identifiers when a respondent has no identifier in the sheet.

/// The letters of a 0-based column index: 0 is `A`, 25 is `Z`, 26 is `AA`.
pub fn column_name(col: usize) -> String {
    let mut letters: Vec<char> = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The address of a cell from its 0-based row and column indices.
/// Distinct positions always give distinct addresses.
pub fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(1), "B");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn addresses() {
        assert_eq!(cell_address(0, 1), "B1");
        assert_eq!(cell_address(9, 0), "A10");
        assert_eq!(cell_address(0, 27), "AB1");
    }

    #[test]
    fn addresses_never_repeat() {
        let mut seen: HashSet<String> = HashSet::new();
        for row in 0..40 {
            for col in 0..800 {
                assert!(seen.insert(cell_address(row, col)), "{} {}", row, col);
            }
        }
    }
}
