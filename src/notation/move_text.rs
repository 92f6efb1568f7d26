//! Standard move notation, written from the mover's side of the board.
//!
//! ```
//! use rust_backgammon::board::Move;
//! use rust_backgammon::core::CheckerColor;
//! use rust_backgammon::notation::move_text;
//!
//! let moves = [Move::new(8, 5, 3, false), Move::new(6, 5, 1, false)];
//! assert_eq!(move_text::format_play(CheckerColor::White, &moves), "8/5 6/5");
//!
//! // Red's 1-point is White's 24-point.
//! let moves = [Move::new(0, 3, 3, true)];
//! assert_eq!(move_text::format_play(CheckerColor::Red, &moves), "bar/22*");
//! ```

use crate::board::{LegalMoves, Move, MoveSequence, BAR, POINT_COUNT};
use crate::core::CheckerColor;
use crate::error::ParseError;

const OFF_SLOT: usize = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    to: u8,
    hit: bool,
}

/// A single checker's path through the turn.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Path {
    from: u8,
    steps: Vec<Step>,
}

impl Path {
    fn last(&self) -> u8 {
        self.steps.last().map_or(self.from, |step| step.to)
    }

    fn render(&self) -> String {
        let mut out = label(self.from);
        for step in &self.steps {
            out.push('/');
            out.push_str(&label(step.to));
            if step.hit {
                out.push('*');
            }
        }
        out
    }
}

/// Relative point number: 25 = bar, 0 = off.
fn relative(color: CheckerColor, point: u8, is_source: bool) -> u8 {
    if is_source && point == BAR {
        25
    } else if !is_source && point == color.off_point() {
        0
    } else {
        color.relative_point(point)
    }
}

fn label(relative: u8) -> String {
    match relative {
        25 => "bar".to_string(),
        0 => "off".to_string(),
        n => n.to_string(),
    }
}

/// Format a play for `color`: chained checkers, `*` hits and `(n)` repeats.
#[must_use]
pub fn format_play(color: CheckerColor, moves: &[Move]) -> String {
    let mut paths: Vec<Path> = Vec::new();
    for mv in moves {
        let from = relative(color, mv.from, true);
        let step = Step {
            to: relative(color, mv.to, false),
            hit: mv.is_hit,
        };
        match paths.iter_mut().find(|path| path.last() == from) {
            Some(path) => path.steps.push(step),
            None => paths.push(Path {
                from,
                steps: vec![step],
            }),
        }
    }
    paths.sort_by(|a, b| b.from.cmp(&a.from).then(b.last().cmp(&a.last())));

    let mut parts: Vec<(String, usize)> = Vec::new();
    for path in &paths {
        let text = path.render();
        match parts.last_mut() {
            Some((last, count)) if *last == text => *count += 1,
            _ => parts.push((text, 1)),
        }
    }

    parts
        .into_iter()
        .map(|(text, count)| if count > 1 { format!("{text}({count})") } else { text })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a move sequence.
#[must_use]
pub fn format_sequence(color: CheckerColor, sequence: &MoveSequence) -> String {
    format_play(color, sequence.moves())
}

fn parse_point(color: CheckerColor, token: &str, is_source: bool, text: &str) -> Result<u8, ParseError> {
    let bad = || ParseError::InvalidNotation(text.to_string());
    match token.trim_end_matches('*') {
        "bar" if is_source => Ok(BAR),
        "off" if !is_source => Ok(color.off_point()),
        number => {
            let relative: u8 = number.parse().map_err(|_| bad())?;
            if (1..=POINT_COUNT).contains(&relative) {
                Ok(color.absolute_point(relative))
            } else {
                Err(bad())
            }
        }
    }
}

/// Parse notation into absolute `(from, to)` hops, expanding chains and repeats.
///
/// A hop may span several dice (`24/14` for a 6-4); see [`find_play`].
pub fn parse_play(color: CheckerColor, text: &str) -> Result<Vec<(u8, u8)>, ParseError> {
    let bad = || ParseError::InvalidNotation(text.to_string());
    let mut hops = Vec::new();

    for token in text.split_whitespace() {
        let (path, repeat) = match token.split_once('(') {
            Some((path, rest)) => {
                let count: usize = rest.strip_suffix(')').and_then(|n| n.parse().ok()).ok_or_else(bad)?;
                if count == 0 || count > 4 {
                    return Err(bad());
                }
                (path, count)
            }
            None => (token, 1),
        };

        let tokens: Vec<&str> = path.split('/').collect();
        if tokens.len() < 2 {
            return Err(bad());
        }
        let last = tokens.len() - 1;
        if tokens[1..last].iter().any(|t| t.trim_end_matches('*') == "off") {
            return Err(bad());
        }
        let points = tokens
            .iter()
            .enumerate()
            .map(|(index, point)| parse_point(color, point, index == 0, text))
            .collect::<Result<Vec<_>, _>>()?;
        for _ in 0..repeat {
            hops.extend(points.windows(2).map(|pair| (pair[0], pair[1])));
        }
    }

    if hops.is_empty() {
        return Err(bad());
    }
    Ok(hops)
}

fn slot(color: CheckerColor, point: u8, is_source: bool) -> usize {
    if is_source && point == BAR {
        0
    } else if !is_source && point == color.off_point() {
        OFF_SLOT
    } else {
        usize::from(point)
    }
}

/// Net checker flow per slot (bar, points 1-24, off).
fn net_flow(color: CheckerColor, hops: impl IntoIterator<Item = (u8, u8)>) -> [i8; 26] {
    let mut flow = [0i8; 26];
    for (from, to) in hops {
        flow[slot(color, from, true)] -= 1;
        flow[slot(color, to, false)] += 1;
    }
    flow
}

fn hops_of(sequence: &MoveSequence) -> impl Iterator<Item = (u8, u8)> + '_ {
    sequence.moves().iter().map(|mv| (mv.from, mv.to))
}

fn sorted_hops(hops: impl IntoIterator<Item = (u8, u8)>) -> Vec<(u8, u8)> {
    let mut hops: Vec<_> = hops.into_iter().collect();
    hops.sort_unstable();
    hops
}

/// The legal play matching `text`, if any.
///
/// A play spelled hop by hop matches exactly, so the intermediate point
/// (and any hit on it) is respected. Otherwise plays match on net checker
/// movement: `24/14` finds `24/18 18/14` as well as `24/20 20/14`.
pub fn find_play(
    legal: &LegalMoves,
    color: CheckerColor,
    text: &str,
) -> Result<Option<MoveSequence>, ParseError> {
    let hops = parse_play(color, text)?;

    let exact = sorted_hops(hops.iter().copied());
    if let Some(sequence) = legal
        .sequences()
        .iter()
        .find(|sequence| sorted_hops(hops_of(sequence)) == exact)
    {
        return Ok(Some(sequence.clone()));
    }

    let wanted = net_flow(color, hops);
    Ok(legal
        .sequences()
        .iter()
        .find(|sequence| net_flow(color, hops_of(sequence)) == wanted)
        .cloned())
}
