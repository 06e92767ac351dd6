//! Scripted player input for headless runs.

use std::str::FromStr;

use glam::Vec2;
use thiserror::Error;
use umbra_system_movement::MoveKeys;

/// Keys held for a number of consecutive steps, written `KEYS:STEPS`.
///
/// `KEYS` is any combination of `w`, `a`, `s` and `d`, or `-` for none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InputSegment {
    pub(crate) keys: MoveKeys,
    pub(crate) steps: u32,
}

/// Reasons an input segment could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum InputParseError {
    #[error("expected KEYS:STEPS, found `{0}`")]
    MissingSeparator(String),
    #[error("`{0}` is not a movement key; use w, a, s, d or -")]
    UnknownKey(char),
    #[error("`{0}` is not a step count")]
    InvalidSteps(String),
}

impl FromStr for InputSegment {
    type Err = InputParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (keys, steps) = value
            .split_once(':')
            .ok_or_else(|| InputParseError::MissingSeparator(value.to_owned()))?;

        let mut held = MoveKeys::default();
        for key in keys.trim().chars() {
            match key.to_ascii_lowercase() {
                'w' => held.forward = true,
                's' => held.back = true,
                'a' => held.left = true,
                'd' => held.right = true,
                '-' => {}
                other => return Err(InputParseError::UnknownKey(other)),
            }
        }

        let steps = steps
            .trim()
            .parse()
            .map_err(|_| InputParseError::InvalidSteps(steps.to_owned()))?;
        Ok(Self { keys: held, steps })
    }
}

/// Replays input segments one step at a time, idling once they run out.
#[derive(Debug)]
pub(crate) struct InputScript {
    segments: Vec<InputSegment>,
    current: usize,
    used: u32,
}

impl InputScript {
    pub(crate) fn new(segments: Vec<InputSegment>) -> Self {
        Self {
            segments,
            current: 0,
            used: 0,
        }
    }

    /// Steps covered by the script.
    pub(crate) fn len(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| u64::from(segment.steps))
            .sum()
    }

    /// Keys held during the next step.
    pub(crate) fn next_keys(&mut self) -> MoveKeys {
        while let Some(segment) = self.segments.get(self.current) {
            if self.used < segment.steps {
                self.used += 1;
                return segment.keys;
            }
            self.current += 1;
            self.used = 0;
        }
        MoveKeys::default()
    }
}

/// Parses a point written `X,Y`.
pub(crate) fn parse_point(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, found `{value}`"))?;
    let x = x
        .trim()
        .parse()
        .map_err(|_| format!("`{x}` is not a coordinate"))?;
    let y = y
        .trim()
        .parse()
        .map_err(|_| format!("`{y}` is not a coordinate"))?;
    Ok(Vec2::new(x, y))
}
