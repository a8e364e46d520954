use std::path::PathBuf;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// Append a freshly computed checksum field to a line body (trailing
/// separator included in the sum), for building corrupted-file variants.
pub fn resign(body: &str) -> String {
    format!("{body}{:02X}", cggtts::checksum::checksum(body))
}
