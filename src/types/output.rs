//! Output structures for terminal and JSON display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BlindResult, ChunkPrediction, Dimension, DivineResult};

/// Serializable view of one throw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowSummary {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dimension: Dimension,
    pub raw_alpha: f64,
    /// Bearing including lens and manual correction
    pub alpha: f64,
    pub beta: f64,
    pub correction: f64,
    pub std: f64,
}

/// Everything the manager publishes, read in one locked pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub timestamp: DateTime<Utc>,
    pub throws: Vec<ThrowSummary>,
    /// Candidate chunks of the full result; `None` when the estimator had no answer
    pub predictions: Option<Vec<ChunkPrediction>>,
    pub top_prediction: Option<ChunkPrediction>,
    /// Yaw from the player position to the top chunk
    pub top_heading: Option<f64>,
    pub blind: Option<BlindResult>,
    pub divine: Option<DivineResult>,
}

impl ResultSnapshot {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        use colored::Colorize;

        let mut lines = vec![format!("throws={}", self.throws.len()).dimmed().to_string()];
        if let Some(top) = &self.top_prediction {
            lines.push(
                format!(
                    "stronghold chunk ({}, {}) | block ({:.0}, {:.0}) | certainty {:.1}%",
                    top.chunk_x,
                    top.chunk_z,
                    top.x_in_overworld(),
                    top.z_in_overworld(),
                    top.certainty * 100.0
                )
                .green()
                .to_string(),
            );
            if let Some(heading) = self.top_heading {
                lines.push(format!("heading {:.1}", heading).green().to_string());
            }
        } else if !self.throws.is_empty() {
            lines.push("no stronghold estimate yet".yellow().to_string());
        }
        if let Some(blind) = &self.blind {
            lines.push(blind_line(blind).cyan().to_string());
        }
        if let Some(divine) = &self.divine {
            lines.push(divine_line(divine).magenta().to_string());
        }
        lines.join("\n")
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let mut parts = vec![format!("throws={}", self.throws.len())];
        match &self.top_prediction {
            Some(top) => {
                parts.push(format!(
                    "top=({},{}) certainty={:.3}",
                    top.chunk_x, top.chunk_z, top.certainty
                ));
                if let Some(heading) = self.top_heading {
                    parts.push(format!("heading={:.1}", heading));
                }
            }
            None => parts.push("top=none".to_string()),
        }
        if let Some(blind) = &self.blind {
            parts.push(blind_line(blind));
        }
        if let Some(divine) = &self.divine {
            parts.push(divine_line(divine));
        }
        parts.join(" | ")
    }
}

fn blind_line(blind: &BlindResult) -> String {
    format!(
        "blind: {:.0} blocks from origin, heading {:.1}{}",
        blind.distance_from_origin,
        blind.heading_outward,
        if blind.in_first_ring { ", inside first ring" } else { "" }
    )
}

fn divine_line(divine: &DivineResult) -> String {
    let [a, b, c] = divine.sector_headings;
    format!(
        "divine: fossil x={} sectors {:.1} / {:.1} / {:.1}",
        divine.fossil.x, a, b, c
    )
}
