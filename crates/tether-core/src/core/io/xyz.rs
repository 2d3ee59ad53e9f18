use super::traits::TrajectoryFile;
use crate::core::error::UsageError;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::trajectory::{Frame, Trajectory};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Invalid trajectory: {0}")]
    Invalid(#[from] UsageError),
}

/// Multi-frame XYZ files.
///
/// Each frame is an atom count line, a comment line carrying `frame=<n>` and, for timed
/// frames, `time=<t>`, then one `Symbol x y z` line per atom. Coordinates are written in
/// the caller's length unit with full round-trip precision.
pub struct XyzFile;

impl TrajectoryFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Trajectory, Self::Error> {
        let mut frames = Vec::new();
        let mut lines = reader.lines().enumerate();

        while let Some((line_num, line)) = lines.next() {
            let line = line?;
            let line_num = line_num + 1;
            if line.trim().is_empty() {
                continue;
            }
            let count: usize = line.trim().parse().map_err(|_| XyzError::Parse {
                line: line_num,
                message: format!("expected atom count, found '{}'", line.trim()),
            })?;

            let (_, comment) = lines.next().ok_or(XyzError::Parse {
                line: line_num + 1,
                message: "missing comment line".into(),
            })?;
            let time = parse_time(&comment?);

            let mut atoms = Vec::with_capacity(count);
            for _ in 0..count {
                let (atom_line_num, atom_line) = lines.next().ok_or(XyzError::Parse {
                    line: line_num,
                    message: format!("frame declares {} atoms but the file ends early", count),
                })?;
                atoms.push(parse_atom(&atom_line?, atom_line_num + 1)?);
            }
            frames.push(Frame { atoms, time });
        }

        Ok(Trajectory::new(frames)?)
    }

    fn write_to(trajectory: &Trajectory, writer: &mut impl Write) -> Result<(), Self::Error> {
        for (index, frame) in trajectory.frames().iter().enumerate() {
            writeln!(writer, "{}", frame.len())?;
            match frame.time {
                Some(time) => writeln!(writer, "frame={} time={:?}", index, time)?,
                None => writeln!(writer, "frame={}", index)?,
            }
            for atom in &frame.atoms {
                let p = atom.position;
                writeln!(
                    writer,
                    "{:<2} {:?} {:?} {:?}",
                    atom.element.symbol(),
                    p.x,
                    p.y,
                    p.z
                )?;
            }
        }
        Ok(())
    }
}

fn parse_time(comment: &str) -> Option<f64> {
    comment
        .split_whitespace()
        .find_map(|token| token.strip_prefix("time="))
        .and_then(|value| value.parse().ok())
}

fn parse_atom(line: &str, line_num: usize) -> Result<Atom, XyzError> {
    let parse_err = |message: String| XyzError::Parse {
        line: line_num,
        message,
    };
    let mut fields = line.split_whitespace();
    let symbol = fields
        .next()
        .ok_or_else(|| parse_err("empty atom line".into()))?;
    let element: Element = symbol
        .parse()
        .map_err(|_| parse_err(format!("unknown element '{}'", symbol)))?;

    let mut coords = [0.0; 3];
    for coord in &mut coords {
        let field = fields
            .next()
            .ok_or_else(|| parse_err("expected three coordinates".into()))?;
        *coord = field
            .parse()
            .map_err(|_| parse_err(format!("invalid coordinate '{}'", field)))?;
    }
    Ok(Atom::new(element, Point3::from(coords)))
}
