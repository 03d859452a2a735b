//! Case folding shared by keyword matching and snippet extraction

/// One char in, one char out, so folded positions line up with the original.
/// Final sigma folds to σ; chars whose lowercase is longer than one char stay as they are.
pub fn fold_case(c: char) -> char {
    if c == 'ς' {
        return 'σ';
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

pub fn fold_str(s: &str) -> String {
    s.chars().map(fold_case).collect()
}
