use std::fmt;
use std::ops::Range;

use crate::error::DecodeError;

/// Every frame is exactly this many bytes on the wire.
pub const FRAME_LEN: usize = 14;

/// Head marker (ASCII STX).
pub const HEAD: u8 = 0x02;

/// Tail marker (ASCII ETX).
pub const TAIL: u8 = 0x03;

const VERSION: Range<usize> = 1..3;
const TAG: Range<usize> = 3..11;
const CHECKSUM: Range<usize> = 11..13;

/// Version and tag digits, the region the checksum covers.
const CHECKSUMMED: Range<usize> = VERSION.start..TAG.end;

/// Number of hex pairs XORed into the checksum.
const CHECKSUM_PAIRS: usize = 5;

// Widening the version or tag field must change the pair count with it.
const _: () = assert!(CHECKSUMMED.end - CHECKSUMMED.start == 2 * CHECKSUM_PAIRS);
const _: () = assert!(CHECKSUM.end + 1 == FRAME_LEN);

/// Named ASCII hex fields of a frame, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Version,
    Tag,
    Checksum,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Version => "version",
            Field::Tag => "tag",
            Field::Checksum => "checksum",
        })
    }
}

/// One candidate frame, byte-for-byte as received.
///
/// Only the length is guaranteed; everything else is checked by
/// [`decode_frame`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Validate and parse this frame.
    pub fn decode(&self) -> Result<TagRecord, DecodeError> {
        decode_frame(&self.0)
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| DecodeError::InvalidLength {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame(")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// A validated tag read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    protocol_version: u8,
    raw_tag: String,
    formatted_tag: String,
}

impl TagRecord {
    /// Version byte transmitted ahead of the tag.
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// The 8 hex digits of the tag ID, exactly as transmitted.
    pub fn raw_tag(&self) -> &str {
        &self.raw_tag
    }

    /// The tag ID in decimal, zero-padded to 10 digits.
    pub fn formatted_tag(&self) -> &str {
        &self.formatted_tag
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_tag)
    }
}

/// Validate and parse one frame.
///
/// Checks run in a fixed order so the first problem found is the one
/// reported: length, markers, version/checksum hex, checksum value, tag hex.
pub fn decode_frame(frame: &[u8]) -> Result<TagRecord, DecodeError> {
    if frame.len() != FRAME_LEN {
        return Err(DecodeError::InvalidLength {
            expected: FRAME_LEN,
            actual: frame.len(),
        });
    }

    let (head, tail) = (frame[0], frame[FRAME_LEN - 1]);
    if head != HEAD || tail != TAIL {
        return Err(DecodeError::InvalidMarker { head, tail });
    }

    let protocol_version = parse_hex_field(Field::Version, &frame[VERSION])?;
    let raw_tag = &frame[TAG];
    let expected = parse_hex_field(Field::Checksum, &frame[CHECKSUM])?;

    // The version pair is already known to be hex, so a bad pair is in the tag.
    let computed =
        checksum(&frame[CHECKSUMMED]).ok_or_else(|| invalid_hex(Field::Tag, raw_tag))?;
    if computed != expected {
        return Err(DecodeError::ChecksumMismatch { computed, expected });
    }

    let tag_id = parse_hex_u32(raw_tag).ok_or_else(|| invalid_hex(Field::Tag, raw_tag))?;

    Ok(TagRecord {
        protocol_version,
        raw_tag: String::from_utf8_lossy(raw_tag).into_owned(),
        formatted_tag: format!("{tag_id:010}"),
    })
}

/// XOR of the hex pairs in `region`, left to right.
///
/// Returns `None` if `region` has an odd length or contains a non-hex byte.
pub fn checksum(region: &[u8]) -> Option<u8> {
    if region.len() % 2 != 0 {
        return None;
    }
    region
        .chunks_exact(2)
        .try_fold(0u8, |acc, pair| Some(acc ^ parse_hex_u8(pair)?))
}

/// Build a well-formed frame for `version` and `tag`, with uppercase digits.
pub fn encode_frame(version: u8, tag: u32) -> RawFrame {
    let sum = tag.to_be_bytes().iter().fold(version, |acc, byte| acc ^ byte);
    let digits = format!("{version:02X}{tag:08X}{sum:02X}");

    let mut bytes = [0u8; FRAME_LEN];
    bytes[0] = HEAD;
    bytes[VERSION.start..CHECKSUM.end].copy_from_slice(digits.as_bytes());
    bytes[FRAME_LEN - 1] = TAIL;
    RawFrame(bytes)
}

fn parse_hex_field(field: Field, digits: &[u8]) -> Result<u8, DecodeError> {
    parse_hex_u8(digits).ok_or_else(|| invalid_hex(field, digits))
}

fn invalid_hex(field: Field, digits: &[u8]) -> DecodeError {
    DecodeError::InvalidHex {
        field,
        value: String::from_utf8_lossy(digits).into_owned(),
    }
}

fn hex_digit(byte: u8) -> Option<u32> {
    char::from(byte).to_digit(16)
}

fn parse_hex_u8(digits: &[u8]) -> Option<u8> {
    match digits {
        [hi, lo] => Some((hex_digit(*hi)? << 4 | hex_digit(*lo)?) as u8),
        _ => None,
    }
}

fn parse_hex_u32(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    digits
        .iter()
        .try_fold(0u32, |acc, byte| Some(acc << 4 | hex_digit(*byte)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKED_EXAMPLE: [u8; FRAME_LEN] = [
        0x02, 0x30, 0x31, 0x41, 0x42, 0x43, 0x44, 0x30, 0x30, 0x30, 0x30, 0x30, 0x36, 0x03,
    ];

    fn frame_from_text(digits: &str) -> Vec<u8> {
        let mut bytes = vec![HEAD];
        bytes.extend_from_slice(digits.as_bytes());
        bytes.push(TAIL);
        bytes
    }

    #[test]
    fn worked_example_with_wrong_checksum() {
        let err = decode_frame(&WORKED_EXAMPLE).unwrap_err();
        assert_eq!(
            err,
            DecodeError::ChecksumMismatch {
                computed: 0x67,
                expected: 0x06,
            }
        );
    }

    #[test]
    fn worked_example_with_correct_checksum() {
        let mut bytes = WORKED_EXAMPLE;
        bytes[11..13].copy_from_slice(b"67");

        let tag = decode_frame(&bytes).unwrap();
        assert_eq!(tag.protocol_version(), 1);
        assert_eq!(tag.raw_tag(), "ABCD0000");
        assert_eq!(tag.formatted_tag(), "2882338816");
        assert_eq!(tag.to_string(), "2882338816");
    }

    #[test]
    fn canonical_formatting_pads_to_ten_digits() {
        let small = encode_frame(0x01, 0x0000_001A).decode().unwrap();
        assert_eq!(small.raw_tag(), "0000001A");
        assert_eq!(small.formatted_tag(), "0000000026");

        let max = encode_frame(0x01, u32::MAX).decode().unwrap();
        assert_eq!(max.raw_tag(), "FFFFFFFF");
        assert_eq!(max.formatted_tag(), "4294967295");

        let zero = encode_frame(0x00, 0).decode().unwrap();
        assert_eq!(zero.formatted_tag(), "0000000000");
    }

    #[test]
    fn encoded_frames_decode_to_their_inputs() {
        let tags = [
            0x0000_0000,
            0x0000_0001,
            0x0000_00FF,
            0x0001_0000,
            0x1234_5678,
            0x7FFF_FFFF,
            0x8000_0000,
            0xABCD_0000,
            0xDEAD_BEEF,
            0xFFFF_FFFE,
            u32::MAX,
        ];
        for version in 0..=u8::MAX {
            for tag in tags {
                let frame = encode_frame(version, tag);
                let record = frame.decode().unwrap();
                assert_eq!(record.protocol_version(), version);
                assert_eq!(record.raw_tag(), format!("{tag:08X}"));
                assert_eq!(record.formatted_tag(), format!("{tag:010}"));

                let lower = frame_from_text(&format!(
                    "{version:02x}{tag:08x}{:02x}",
                    checksum(&frame.as_bytes()[CHECKSUMMED]).unwrap()
                ));
                let record = decode_frame(&lower).unwrap();
                assert_eq!(record.protocol_version(), version);
                assert_eq!(record.raw_tag(), format!("{tag:08x}"));
                assert_eq!(record.formatted_tag(), format!("{tag:010}"));
            }
        }
    }

    #[test]
    fn lowercase_digits_are_accepted_and_kept_verbatim() {
        // 0x0a ^ 0xab ^ 0xcd ^ 0x00 ^ 0x01 = 0x6d
        let bytes = frame_from_text("0aabcd00016d");
        let tag = decode_frame(&bytes).unwrap();
        assert_eq!(tag.protocol_version(), 0x0a);
        assert_eq!(tag.raw_tag(), "abcd0001");
        assert_eq!(tag.formatted_tag(), "2882338817");
    }

    #[test]
    fn single_bit_flips_are_detected() {
        let good = *encode_frame(0x01, 0xABCD_0000).as_bytes();

        for pos in CHECKSUMMED {
            for bit in 0..8 {
                let mut bytes = good;
                bytes[pos] ^= 1 << bit;

                let before = hex_digit(good[pos]);
                let after = hex_digit(bytes[pos]);
                let result = decode_frame(&bytes);

                match after {
                    None => {
                        let field = if VERSION.contains(&pos) {
                            Field::Version
                        } else {
                            Field::Tag
                        };
                        assert!(
                            matches!(result, Err(DecodeError::InvalidHex { field: f, .. }) if f == field),
                            "pos {pos} bit {bit}: {result:?}"
                        );
                    }
                    // Case change only: same value, same checksum.
                    Some(value) if Some(value) == before => assert!(result.is_ok()),
                    Some(_) => assert!(
                        matches!(result, Err(DecodeError::ChecksumMismatch { .. })),
                        "pos {pos} bit {bit}: {result:?}"
                    ),
                }
            }
        }
    }

    #[test]
    fn any_other_head_or_tail_is_rejected() {
        let good = *encode_frame(0x01, 0x0000_001A).as_bytes();

        for value in (0..=u8::MAX).filter(|v| *v != HEAD) {
            let mut bytes = good;
            bytes[0] = value;
            assert_eq!(
                decode_frame(&bytes),
                Err(DecodeError::InvalidMarker {
                    head: value,
                    tail: TAIL
                })
            );
        }

        for value in (0..=u8::MAX).filter(|v| *v != TAIL) {
            let mut bytes = good;
            bytes[FRAME_LEN - 1] = value;
            assert_eq!(
                decode_frame(&bytes),
                Err(DecodeError::InvalidMarker {
                    head: HEAD,
                    tail: value
                })
            );
        }
    }

    #[test]
    fn wrong_lengths_are_rejected_before_anything_else() {
        let good = encode_frame(0x01, 0x0000_001A);
        for len in (0..=32).filter(|len| *len != FRAME_LEN) {
            let mut bytes: Vec<u8> = good.as_bytes().iter().copied().cycle().take(len).collect();
            if let Some(first) = bytes.first_mut() {
                *first = b'Z';
            }
            assert_eq!(
                decode_frame(&bytes),
                Err(DecodeError::InvalidLength {
                    expected: FRAME_LEN,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn markers_are_checked_before_field_hex() {
        let mut bytes = frame_from_text("ZZABCD0000ZZ");
        bytes[0] = 0x00;
        assert!(matches!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidMarker { head: 0x00, .. })
        ));
    }

    #[test]
    fn version_hex_is_checked_before_checksum_hex() {
        let bytes = frame_from_text("0GABCD0000ZZ");
        assert_eq!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidHex {
                field: Field::Version,
                value: "0G".into()
            })
        );
    }

    #[test]
    fn bad_checksum_digits_are_a_parse_error() {
        let bytes = frame_from_text("01ABCD0000x7");
        assert_eq!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidHex {
                field: Field::Checksum,
                value: "x7".into()
            })
        );
    }

    #[test]
    fn non_hex_tag_is_reported_against_the_tag_field() {
        let bytes = frame_from_text("01ABCDZZ0067");
        assert_eq!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidHex {
                field: Field::Tag,
                value: "ABCDZZ00".into()
            })
        );
    }

    #[test]
    fn signs_and_spaces_are_not_hex() {
        for digits in ["+1ABCD000066", " 1ABCD000066", "01ABCD0000+6"] {
            let bytes = frame_from_text(digits);
            assert!(
                matches!(decode_frame(&bytes), Err(DecodeError::InvalidHex { .. })),
                "{digits}"
            );
        }
    }

    #[test]
    fn checksum_helper() {
        assert_eq!(checksum(b"01ABCD0000"), Some(0x67));
        assert_eq!(checksum(b""), Some(0));
        assert_eq!(checksum(b"0"), None);
        assert_eq!(checksum(b"0g"), None);
    }

    #[test]
    fn raw_frame_conversions() {
        let frame = RawFrame::try_from(&WORKED_EXAMPLE[..]).unwrap();
        assert_eq!(frame.as_bytes(), &WORKED_EXAMPLE);
        assert_eq!(frame.as_ref(), &WORKED_EXAMPLE[..]);
        assert_eq!(RawFrame::from_bytes(WORKED_EXAMPLE), frame);

        let err = RawFrame::try_from(&WORKED_EXAMPLE[..13]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                expected: FRAME_LEN,
                actual: 13
            }
        );

        assert_eq!(
            format!("{frame:?}"),
            "RawFrame(02 30 31 41 42 43 44 30 30 30 30 30 36 03)"
        );
    }
}
