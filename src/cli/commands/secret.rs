use rand::{rngs::OsRng, RngCore};
use std::fmt::Write;

pub fn handle(bytes: u16) -> anyhow::Result<()> {
    println!("{}", generate(usize::from(bytes)));
    Ok(())
}

/// `len` random bytes, hex encoded.
pub fn generate(len: usize) -> String {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf.iter().fold(String::with_capacity(len * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
