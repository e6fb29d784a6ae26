pub mod mem;
pub mod pkt;
pub mod reg;

/// Argument wins over manifest value wins over the built-in default.
pub(crate) fn pick<T>(arg: Option<T>, manifest: Option<T>, default: T) -> T {
    arg.or(manifest).unwrap_or(default)
}
