use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SplineRole {
    Loop,
    Rail,
    Camera,
    Other,
}

impl SplineRole {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "loop" => SplineRole::Loop,
            "rail" => SplineRole::Rail,
            "camera" => SplineRole::Camera,
            _ => SplineRole::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplinePoint {
    pub position: Vec3,
    pub distance: f32,
}

/// One guided path: an ordered point run the host's path subsystem follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplineFile {
    pub role: SplineRole,
    pub total_distance: f32,
    pub points: Vec<SplinePoint>,
}

impl SplineFile {
    pub fn parse(input: &[u8]) -> Result<Self> {
        let text = String::from_utf8(input.to_vec())?;
        let normalized = text.replace("\r\n", "\n");
        let mut lines = normalized.lines();

        let mut role = None;
        let mut total_distance = None;
        let mut expected_points: Option<usize> = None;
        let mut points: Vec<SplinePoint> = Vec::new();

        while let Some(raw_line) = lines.next() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("kind") {
                if let Some(value) = line.split_whitespace().last() {
                    role = Some(SplineRole::from_str(value));
                }
            } else if line.starts_with("totaldistance") {
                let value = line
                    .split_whitespace()
                    .last()
                    .ok_or_else(|| anyhow!("missing totaldistance value"))?;
                total_distance = Some(value.parse()?);
            } else if line.starts_with("numpoints") {
                let value = line
                    .split_whitespace()
                    .last()
                    .ok_or_else(|| anyhow!("missing numpoints value"))?;
                expected_points = Some(value.parse()?);
            } else if line.starts_with("points:") {
                let expected = expected_points
                    .ok_or_else(|| anyhow!("numpoints must precede points block"))?;
                while points.len() < expected {
                    let raw = lines
                        .next()
                        .ok_or_else(|| anyhow!("unexpected EOF reading points"))?;
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    points.push(parse_point(trimmed)?);
                }
            }
        }

        let role = role.ok_or_else(|| anyhow!("path file missing kind line"))?;
        let expected = expected_points.ok_or_else(|| anyhow!("path file missing numpoints"))?;
        if expected != points.len() {
            return Err(anyhow!(
                "path file expected {} points, found {}",
                expected,
                points.len()
            ));
        }

        let total_distance = total_distance.unwrap_or_else(|| segment_length_sum(&points));

        Ok(SplineFile {
            role,
            total_distance,
            points,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .with_context(|| format!("reading path file {}", path.as_ref().display()))?;
        Self::parse(&bytes)
            .with_context(|| format!("parsing path file {}", path.as_ref().display()))
    }
}

fn parse_point(raw: &str) -> Result<SplinePoint> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(anyhow!("invalid point line: {raw}"));
    }
    let position = Vec3 {
        x: parts[0].parse()?,
        y: parts[1].parse()?,
        z: parts[2].parse()?,
    };
    let distance: f32 = parts[3].parse()?;
    Ok(SplinePoint { position, distance })
}

fn segment_length_sum(points: &[SplinePoint]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].position.distance_to(pair[1].position))
        .sum()
}
