use crate::core::error::UsageError;
use crate::core::models::trajectory::{Frame, Trajectory};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"TTRJ";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not a trajectory blob (bad magic bytes)")]
    BadMagic,
    #[error("Unsupported trajectory format version {0}")]
    UnsupportedVersion(u16),
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Decoded trajectory is invalid: {0}")]
    Invalid(#[from] UsageError),
}

/// Encodes a trajectory as a versioned binary blob.
///
/// Floating-point values are stored by bit pattern, so `decode(encode(t)) == t` holds
/// exactly, including signed zeros.
pub fn encode(trajectory: &Trajectory) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(trajectory.frames())?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<Trajectory, CodecError> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let frames: Vec<Frame> = bincode::deserialize(&bytes[HEADER_LEN..])?;
    Ok(Trajectory::new(frames)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    fn awkward_trajectory() -> Trajectory {
        let frame_a = Frame::new(vec![
            Atom::new(Element::CARBON, Point3::new(0.1, -0.0, 1e-300)),
            Atom::new(Element::HYDROGEN, Point3::new(f64::MAX, 1.0 / 3.0, -2.5)),
        ]);
        let frame_b = Frame::at_time(
            vec![
                Atom::new(Element::CARBON, Point3::new(0.2, 0.0, 0.0)),
                Atom::new(Element::HYDROGEN, Point3::new(0.3, 0.7, std::f64::consts::PI)),
            ],
            0.125,
        );
        Trajectory::new(vec![frame_a, frame_b]).unwrap()
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let original = awkward_trajectory();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);

        let z = decoded.first().atoms[0].position.y;
        assert!(z == 0.0 && z.is_sign_negative());
    }

    #[test]
    fn encoding_is_deterministic() {
        let traj = awkward_trajectory();
        assert_eq!(encode(&traj).unwrap(), encode(&traj).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode(b"nope"), Err(CodecError::BadMagic)));
        assert!(matches!(decode(b"XXXX\x01\x00abc"), Err(CodecError::BadMagic)));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = encode(&awkward_trajectory()).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncated_body_is_rejected() {
        let bytes = encode(&awkward_trajectory()).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 5]),
            Err(CodecError::Bincode(_))
        ));
    }
}
