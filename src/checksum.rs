use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use sha1_smol::Sha1;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Stream a reader through SHA-1 and return the lowercase hex digest.
pub fn sha1_stream<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.digest().to_string())
}

/// SHA-1 of a file on disk. The file is read in chunks, never held in memory whole.
pub fn sha1_file(path: &Path) -> anyhow::Result<String> {
    let file = File::open(path).with_context(|| format!("opening file for checksum: {path:?}"))?;
    let digest =
        sha1_stream(file).with_context(|| format!("reading file for checksum: {path:?}"))?;
    Ok(digest)
}
