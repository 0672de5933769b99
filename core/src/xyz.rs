//! Reader for multi-frame xyz trajectories.
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    atom::AtomTable,
    error::{Error, Result},
    frame::FrameTable,
};

pub const ANGSTROM_TO_BOHR: f64 = 1.88973;

/// Atoms and frames of a trajectory, positions in bohr.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub atoms: AtomTable,
    pub frames: FrameTable,
    /// non-empty comment lines as "{line}:{comment}", lines counted from 1
    pub comments: Vec<String>,
    /// unit the coordinates were given in
    pub unit: String,
}

pub fn read_xyz(path: impl AsRef<Path>, unit: &str) -> Result<Xyz> {
    let path = path.as_ref();
    log::debug!("reading {}", path.display());
    parse_xyz(BufReader::new(File::open(path)?), unit)
}

/// Parse frames of the form
///
/// ```text
/// <atom count> [unit]
/// <comment>
/// <symbol> <x> <y> <z>
/// ...
/// ```
///
/// The unit is taken from the first line if present, else `default_unit`.
/// Coordinates in "A" are converted to bohr.
///
/// A line where a frame header is expected but that does not start with an
/// atom count is skipped, and scanning resumes on the next line.
pub fn parse_xyz(reader: impl BufRead, default_unit: &str) -> Result<Xyz> {
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;

    let unit = lines
        .first()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or(default_unit)
        .to_owned();
    let scale = if unit == "A" { ANGSTROM_TO_BOHR } else { 1.0 };

    let mut atoms = AtomTable::default();
    let mut comments = Vec::new();
    let mut frame = 0;
    let mut position = 0;

    while position < lines.len() {
        let header = &lines[position];
        let Some(Ok(count)) = header.split_whitespace().next().map(str::parse::<usize>) else {
            if !header.trim().is_empty() {
                log::warn!("line {}: skipping malformed frame header {header:?}", position + 1);
            }
            position += 1;
            continue;
        };

        let end = position + 2 + count;
        if end > lines.len() {
            return Err(Error::Parse {
                line: lines.len(),
                message: format!(
                    "frame {frame} declares {count} atoms on line {} but the file ends early",
                    position + 1
                ),
            });
        }

        let comment = lines[position + 1].trim();
        if !comment.is_empty() {
            comments.push(format!("{}:{comment}", position + 2));
        }

        for (index, line) in lines[position + 2..end].iter().enumerate() {
            let (symbol, r) = parse_atom(line, position + 3 + index)?;
            atoms.push(frame, index, symbol, r * scale);
        }

        frame += 1;
        position = end;
    }

    let frames = FrameTable::minimal(&atoms);
    log::debug!("read {} atoms in {} frames", atoms.len(), frames.len());

    Ok(Xyz {
        atoms,
        frames,
        comments,
        unit,
    })
}

fn parse_atom(line: &str, number: usize) -> Result<(&str, Vector3<f64>)> {
    let error = |message: String| Error::Parse {
        line: number,
        message,
    };

    let mut tokens = line.split_whitespace();
    let symbol = tokens
        .next()
        .ok_or_else(|| error("expected an atom, found an empty line".to_owned()))?;

    let mut r = Vector3::zeros();
    for axis in 0..3 {
        let token = tokens
            .next()
            .ok_or_else(|| error(format!("atom {symbol} has fewer than three coordinates")))?;
        r[axis] = token
            .parse()
            .map_err(|_| error(format!("{token:?} is not a coordinate")))?;
    }

    Ok((symbol, r))
}
