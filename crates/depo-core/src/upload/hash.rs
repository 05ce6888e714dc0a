//! SHA-256 content hashes, as announced to the repository before upload.

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Hash everything `reader` yields, `chunk` bytes at a time, as lowercase hex.
/// Memory use is bounded by the chunk size, so large files are fine.
pub async fn sha256_reader<R>(reader: &mut R, chunk: usize) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk.max(1)];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
