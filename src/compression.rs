//! Per-table compression
//!
//! WOFF 1.0 stores each table either zlib-compressed or, when compression would not make it
//! smaller, verbatim. The actual deflate implementation sits behind [`TableCodec`] so that callers
//! can plug in their own. The storage policy (when to store verbatim, how lengths must line up)
//! is enforced here rather than by the codec.

use std::error::Error;

pub trait TableCodec {
    /// Compress a table. May return output larger than the input.
    fn compress(&self, data: &[u8]) -> Vec<u8>;

    /// Decompress a table that is known to decompress to `size_hint` bytes.
    fn decompress(&self, data: &[u8], size_hint: usize) -> Result<Vec<u8>, Box<dyn Error>>;
}

/// zlib codec backed by `flate2`
#[cfg(feature = "z")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibCodec;

#[cfg(feature = "z")]
impl TableCodec for ZlibCodec {
    fn compress(&self, data: &[u8]) -> Vec<u8> {
        use flate2::{Compression, write::ZlibEncoder};
        use std::io::Write as _;

        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len()), Compression::best());
        // Writing into a Vec cannot fail. Should it ever, returning the input unchanged makes
        // `compress_table` fall back to storing the table verbatim.
        match encoder.write_all(data).and_then(|_| encoder.finish()) {
            Ok(compressed) => compressed,
            Err(_) => data.to_vec(),
        }
    }

    fn decompress(&self, data: &[u8], size_hint: usize) -> Result<Vec<u8>, Box<dyn Error>> {
        use flate2::{Decompress, FlushDecompress};
        // One spare byte so that data longer than expected is detectable
        let mut output: Vec<u8> = Vec::with_capacity(size_hint + 1);
        let mut decompressor = Decompress::new(true);
        decompressor.decompress_vec(data, &mut output, FlushDecompress::Finish)?;
        Ok(output)
    }
}

/// Compress `data` for storage, falling back to a verbatim copy if that is not strictly smaller.
pub(crate) fn compress_table(codec: &dyn TableCodec, data: &[u8]) -> Vec<u8> {
    let compressed = codec.compress(data);
    if compressed.len() < data.len() {
        compressed
    } else {
        data.to_vec()
    }
}

/// Recover the original table data from its stored form.
///
/// Returns `None` if the stored data cannot produce exactly `orig_length` bytes.
pub(crate) fn decompress_table(
    codec: &dyn TableCodec,
    data: &[u8],
    orig_length: usize,
) -> Option<Vec<u8>> {
    if orig_length < data.len() {
        return None;
    }
    if orig_length == data.len() {
        return Some(data.to_vec());
    }
    let decompressed = codec.decompress(data, orig_length).ok()?;
    (decompressed.len() == orig_length).then_some(decompressed)
}
