//! Identifier grammar shared by every definition domain.

/// Names that would collide with C keywords in generated headers.
pub const RESERVED: &[&str] = &["int", "float", "while", "if", "else", "return"];

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*` and is not reserved.
pub fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return false;
    }
    if !bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return false;
    }
    !RESERVED.contains(&name)
}
