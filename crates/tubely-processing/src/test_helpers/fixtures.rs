//! Byte fixtures with real magic numbers

use tubely_core::Video;
use uuid::Uuid;

/// JPEG/JFIF header followed by filler, `len` bytes total.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
    ];
    data.resize(len.max(data.len()), 0xAB);
    data
}

/// Minimal PNG signature plus the start of an IHDR chunk.
pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R']);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x10]);
    data
}

/// MP4 `ftyp` box (isom) followed by filler, `len` bytes total.
pub fn mp4_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x00, 0x18];
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    data.extend_from_slice(b"isomiso2");
    data.resize(len.max(data.len()), 0x00);
    data
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec()
}

pub fn sample_video(owner_id: Uuid) -> Video {
    Video::new(owner_id, "Launch trailer")
}
