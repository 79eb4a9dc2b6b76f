use super::{Filter, FilterError, FilterResult};
use miniz_oxide::deflate::{
    core::{compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus},
    CompressionLevel,
};

const OUT_CHUNK: usize = 16 * 1024;

/// Streaming zlib compressor. The deflate state is carried between calls to `consume`,
/// so the output is a single zlib stream regardless of how the input was split.
pub struct FlateEncoder {
    compressor: CompressorOxide,
}

impl FlateEncoder {
    pub fn new() -> FlateEncoder {
        FlateEncoder::with_level(CompressionLevel::DefaultLevel as i32)
    }

    pub fn with_level(level: i32) -> FlateEncoder {
        // positive window bits selects the zlib wrapper
        let flags = create_comp_flags_from_zip_params(level, 1, 0);
        FlateEncoder {
            compressor: CompressorOxide::new(flags),
        }
    }

    fn drive(&mut self, mut input: &[u8], flush: TDEFLFlush) -> FilterResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut buffer = vec![0u8; OUT_CHUNK];
        loop {
            let (status, consumed, produced) = compress(&mut self.compressor, input, &mut buffer, flush);
            out.extend_from_slice(&buffer[..produced]);
            input = &input[consumed..];

            match status {
                TDEFLStatus::Done => return Ok(out),
                TDEFLStatus::Okay => {
                    // without a flush request the compressor is done once the input is
                    // used up and the output buffer was not filled
                    if flush == TDEFLFlush::None && input.is_empty() && produced < buffer.len() {
                        return Ok(out);
                    }
                }
                status => return Err(FilterError::Compression(format!("{status:?}"))),
            }
        }
    }
}

impl Default for FlateEncoder {
    fn default() -> Self {
        FlateEncoder::new()
    }
}

impl Filter for FlateEncoder {
    fn consume(&mut self, chunk: &[u8]) -> FilterResult<Vec<u8>> {
        self.drive(chunk, TDEFLFlush::None)
    }

    fn finish(&mut self) -> FilterResult<Vec<u8>> {
        self.drive(&[], TDEFLFlush::Finish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    fn encode(data: &[u8], chunk_size: usize) -> Vec<u8> {
        let mut encoder = FlateEncoder::new();
        let mut out = Vec::new();
        for chunk in data.chunks(chunk_size) {
            out.extend(encoder.consume(chunk).unwrap());
        }
        out.extend(encoder.finish().unwrap());
        out
    }

    #[test]
    fn round_trips() {
        let data = b"BT /F1 12 Tf 72 720 Td (Hello, world) Tj ET\n".repeat(200);
        let encoded = encode(&data, data.len());
        assert!(encoded.len() < data.len());
        assert_eq!(decompress_to_vec_zlib(&encoded).unwrap(), data);
    }

    #[test]
    fn chunked_input_round_trips() {
        // incompressible-ish data so the output outgrows one buffer
        let mut x: u32 = 0x1234_5678;
        let data: Vec<u8> = (0..100_000)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect();
        for chunk_size in [7, 1000, 65_536] {
            let encoded = encode(&data, chunk_size);
            assert_eq!(decompress_to_vec_zlib(&encoded).unwrap(), data);
        }
    }

    #[test]
    fn empty_input_is_a_valid_stream() {
        let encoded = encode(&[], 1);
        assert!(!encoded.is_empty());
        assert!(decompress_to_vec_zlib(&encoded).unwrap().is_empty());
    }
}
