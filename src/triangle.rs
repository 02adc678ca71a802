use byteorder::ByteOrder;
use cgmath::{prelude::*, Point3, Vector3};
use static_assertions::const_assert_eq;


/// Size of the opaque header at the start of a binary STL stream.
pub const HEADER_SIZE: usize = 80;

/// Size of one binary triangle record: 12 `f32` (normal + three vertices)
/// followed by the 2-byte attribute field.
pub const TRIANGLE_RAW_SIZE: usize = 4 * 3 * 4 + 2;

const_assert_eq!(TRIANGLE_RAW_SIZE, 50);

/// One raw STL triangle: a facet normal plus three vertex positions.
///
/// This is a plain value type, copied by value across the source/sink
/// boundary. The codec never retains one after delivering it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// Face normal.
    pub normal: [f32; 3],

    /// The 3D positions of the vertices in CCW order (when looking at the
    /// face "from the outside").
    pub vertices: [[f32; 3]; 3],

    /// Only stored in the binary format and almost always zero. Some
    /// software abuses it to store a 16 bit color. When a triangle is parsed
    /// from ASCII input this is set to 0.
    pub attribute_byte_count: u16,
}

impl Triangle {
    /// Decodes one 50-byte wire record. `raw` must hold at least
    /// [`TRIANGLE_RAW_SIZE`] bytes.
    pub(crate) fn decode<B: ByteOrder>(raw: &[u8]) -> Self {
        fn vec3<B: ByteOrder>(data: &[u8]) -> [f32; 3] {
            [
                B::read_f32(&data[0..]),
                B::read_f32(&data[4..]),
                B::read_f32(&data[8..]),
            ]
        }

        Self {
            normal: vec3::<B>(&raw[0..]),
            vertices: [
                vec3::<B>(&raw[12..]),
                vec3::<B>(&raw[24..]),
                vec3::<B>(&raw[36..]),
            ],
            attribute_byte_count: B::read_u16(&raw[48..]),
        }
    }

    /// Encodes `self` into one 50-byte wire record.
    pub(crate) fn encode<B: ByteOrder>(&self, out: &mut [u8]) {
        fn vec3<B: ByteOrder>(out: &mut [u8], v: [f32; 3]) {
            B::write_f32(&mut out[0..], v[0]);
            B::write_f32(&mut out[4..], v[1]);
            B::write_f32(&mut out[8..], v[2]);
        }

        vec3::<B>(&mut out[0..], self.normal);
        vec3::<B>(&mut out[12..], self.vertices[0]);
        vec3::<B>(&mut out[24..], self.vertices[1]);
        vec3::<B>(&mut out[36..], self.vertices[2]);
        B::write_u16(&mut out[48..], self.attribute_byte_count);
    }
}

/// Calculates the unit normal of the face defined by three vertices in CCW
/// order.
///
/// STL sources without stored normals can use this as fallback. The codec
/// itself never recomputes normals: what the source/stream provides is what
/// gets written/delivered.
pub fn normal_from_vertices(positions: &[[f32; 3]; 3]) -> [f32; 3] {
    let pos_a = Point3::from(positions[0]);
    let pos_b = Point3::from(positions[1]);
    let pos_c = Point3::from(positions[2]);

    let normal: Vector3<f32> = (pos_b - pos_a).cross(pos_c - pos_a).normalize();
    normal.into()
}

/// The 80-byte header of a binary STL stream.
///
/// Its content carries no meaning to the format itself, but by convention it
/// must not begin with the bytes `solid` (that would confuse ASCII-first
/// sniffers in other software).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Header(pub [u8; HEADER_SIZE]);

impl Header {
    /// An all-zeroes header.
    pub fn zeroed() -> Self {
        Self([0; HEADER_SIZE])
    }

    /// Builds a header from an ASCII string, truncated to 80 bytes and
    /// padded with spaces.
    pub fn from_ascii(text: &str) -> Self {
        let mut out = [b' '; HEADER_SIZE];
        let n = text.len().min(HEADER_SIZE);
        out[..n].copy_from_slice(&text.as_bytes()[..n]);
        Self(out)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Header({:?})", String::from_utf8_lossy(&self.0))
    }
}


#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, LittleEndian};

    use super::*;

    fn sample() -> Triangle {
        Triangle {
            normal: [0.0, 0.0, 1.0],
            vertices: [
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            attribute_byte_count: 7,
        }
    }

    #[test]
    fn encode_decode_le() {
        let mut raw = [0u8; TRIANGLE_RAW_SIZE];
        sample().encode::<LittleEndian>(&mut raw);
        assert_eq!(Triangle::decode::<LittleEndian>(&raw), sample());
    }

    #[test]
    fn le_and_be_records_are_byte_swapped_field_by_field() {
        let mut le = [0u8; TRIANGLE_RAW_SIZE];
        let mut be = [0u8; TRIANGLE_RAW_SIZE];
        sample().encode::<LittleEndian>(&mut le);
        sample().encode::<BigEndian>(&mut be);

        // 12 32-bit words plus one 16-bit word.
        for i in 0..12 {
            let word = &le[i * 4..i * 4 + 4];
            let swapped: Vec<u8> = word.iter().rev().cloned().collect();
            assert_eq!(&be[i * 4..i * 4 + 4], &swapped[..]);
        }
        assert_eq!([le[49], le[48]], [be[48], be[49]]);
    }

    #[test]
    fn fallback_normal_is_unit_length() {
        let n = normal_from_vertices(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
        ]);
        assert_eq!(n, [0.0, 0.0, 1.0]);
    }
}
