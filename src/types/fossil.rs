//! Buried fossil clue, read from an F3+I line

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CHUNK_SIZE;

lazy_static! {
    // F3+I on a fossil bone block: /setblock <x> <y> <z> minecraft:bone_block[axis=..]
    static ref RE_FOSSIL_F3I: Regex = Regex::new(
        r"^/setblock (-?\d+) (-?\d+) (-?\d+) minecraft:bone_block(\[[^\]]*\])?$"
    ).unwrap();
}

/// A fossil located at block x-coordinate `x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fossil {
    pub x: i32,
}

impl Fossil {
    pub fn new(x: i32) -> Self {
        Self { x }
    }

    /// Parse an F3+I line of a bone block. Anything else yields `None`.
    pub fn parse_f3i(line: &str) -> Option<Fossil> {
        let captures = RE_FOSSIL_F3I.captures(line.trim_end())?;
        let x = captures.get(1)?.as_str().parse::<i32>().ok()?;
        Some(Fossil::new(x))
    }

    /// Block x within its chunk, always in `0..16`
    pub fn x_in_chunk(&self) -> i32 {
        self.x.rem_euclid(CHUNK_SIZE)
    }
}
