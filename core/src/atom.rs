use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A single row of an [`AtomTable`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Atom<'a> {
    pub frame: usize,
    /// position of the atom within its frame
    pub index: usize,
    pub symbol: &'a str,
    pub(crate) position: Vector3<f64>,
}

impl Atom<'_> {
    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }
}

/// Atomic positions of every frame, in internal (bohr) units.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomTable {
    pub frame: Vec<usize>,
    pub index: Vec<usize>,
    pub symbol: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl AtomTable {
    pub fn push(&mut self, frame: usize, index: usize, symbol: impl Into<String>, position: Vector3<f64>) {
        self.frame.push(frame);
        self.index.push(index);
        self.symbol.push(symbol.into());
        self.x.push(position.x);
        self.y.push(position.y);
        self.z.push(position.z);
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<Atom<'_>> {
        (row < self.len()).then(|| Atom {
            frame: self.frame[row],
            index: self.index[row],
            symbol: &self.symbol[row],
            position: Vector3::new(self.x[row], self.y[row], self.z[row]),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Atom<'_>> {
        (0..self.len()).filter_map(|row| self.get(row))
    }

    /// The atoms of one frame, in order.
    pub fn frame_atoms(&self, frame: usize) -> impl Iterator<Item = Atom<'_>> {
        self.iter().filter(move |atom| atom.frame == frame)
    }

    /// Number of frames, counting any gaps before the last one.
    pub fn frame_count(&self) -> usize {
        self.frame.iter().max().map_or(0, |&last| last + 1)
    }

    /// How often each symbol occurs in a frame.
    pub fn symbol_counts(&self, frame: usize) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for atom in self.frame_atoms(frame) {
            *counts.entry(atom.symbol.to_owned()).or_default() += 1;
        }
        counts
    }
}
