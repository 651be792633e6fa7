//! A1-style cell and range reference parsing.

use crate::error::ResolveError;

/// 1-based (row, column) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Render back to an A1-style literal, mostly for log messages.
    pub fn to_a1(self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }
}

/// Parse an A1-style literal like `B12` or `$B$12` into a 1-based coordinate.
pub fn parse_cell(reference: &str) -> Result<CellRef, ResolveError> {
    let cleaned: String = reference.trim().chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| ResolveError::InvalidReference(reference.trim().to_string()))?;

    let (letters, digits) = cleaned.split_at(split);
    let col = column_index(letters)
        .ok_or_else(|| ResolveError::InvalidReference(reference.trim().to_string()))?;
    let row: u32 = digits
        .parse()
        .map_err(|_| ResolveError::InvalidReference(reference.trim().to_string()))?;
    if row == 0 {
        return Err(ResolveError::InvalidReference(reference.trim().to_string()));
    }

    Ok(CellRef::new(row, col))
}

/// Parse a `A1:C3` range literal into start and end coordinates.
pub fn parse_range(reference: &str) -> Result<(CellRef, CellRef), ResolveError> {
    let (start, end) = reference
        .split_once(':')
        .ok_or_else(|| ResolveError::InvalidReference(reference.trim().to_string()))?;
    Ok((parse_cell(start)?, parse_cell(end)?))
}

/// Split an optional embedded sheet name off a reference like
/// `Sheet1!$A$1:$B$2` (the form defined names resolve to).
pub fn split_sheet(reference: &str) -> (Option<&str>, &str) {
    match reference.split_once('!') {
        Some((sheet, rest)) => (Some(sheet.trim().trim_matches('\'')), rest),
        None => (None, reference),
    }
}

/// Convert column letters to a 1-based index (`A` → 1, `AA` → 27).
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
    }
    Some(col)
}

/// Convert a 1-based column index to letters (1 → `A`, 27 → `AA`).
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        result.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("A1").unwrap(), CellRef::new(1, 1));
        assert_eq!(parse_cell("B12").unwrap(), CellRef::new(12, 2));
        assert_eq!(parse_cell("AA3").unwrap(), CellRef::new(3, 27));
        assert_eq!(parse_cell("$C$7").unwrap(), CellRef::new(7, 3));
        assert_eq!(parse_cell(" d4 ").unwrap(), CellRef::new(4, 4));
    }

    #[test]
    fn test_parse_cell_rejects_garbage() {
        assert!(parse_cell("").is_err());
        assert!(parse_cell("123").is_err());
        assert!(parse_cell("ABC").is_err());
        assert!(parse_cell("A0").is_err());
        assert!(parse_cell("1A").is_err());
    }

    #[test]
    fn test_parse_range() {
        let (start, end) = parse_range("A1:C3").unwrap();
        assert_eq!(start, CellRef::new(1, 1));
        assert_eq!(end, CellRef::new(3, 3));
        assert!(parse_range("A1").is_err());
    }

    #[test]
    fn test_split_sheet() {
        assert_eq!(split_sheet("Sheet1!A1"), (Some("Sheet1"), "A1"));
        assert_eq!(split_sheet("'My Sheet'!B2:C3"), (Some("My Sheet"), "B2:C3"));
        assert_eq!(split_sheet("A1"), (None, "A1"));
    }

    #[test]
    fn test_column_letters_round_trip() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(703), "AAA");
        for col in [1u32, 2, 25, 26, 27, 52, 53, 702, 703] {
            assert_eq!(column_index(&column_letter(col)), Some(col));
        }
    }

    #[test]
    fn test_cell_ref_to_a1() {
        assert_eq!(CellRef::new(12, 2).to_a1(), "B12");
    }
}
