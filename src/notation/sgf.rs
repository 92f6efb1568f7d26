//! Backgammon SGF (`GM[6]`) import and export.
//!
//! ## Layout
//!
//! ```text
//! (;FF[4]GM[6]CA[UTF-8]AP[rust-backgammon]MI[length:5][game:1][ws:0][bs:2]RE[W+2G]
//!  ;AE[a:y]AW[x][x]...AB[a][a]...PL[W]CV[1]CP[c]
//!  ;W[31hefe]
//!  ;B[double];W[take]
//!  ;B[64aglp])
//! ```
//!
//! - Points `a`-`x` are 1-24 in White's numbering, `y` is the bar and `z`
//!   is off. `AW`/`AB` repeat a point once per checker.
//! - `PL` is the player on turn, `CV`/`CP` the cube value and owner (`w`,
//!   `b` or `c`entered). Red plays as `B`.
//! - `DI` holds a roll already made this turn and `RD` the dice still to
//!   play when some were used. `DO` is a pending double, `CR[1]` marks the
//!   Crawford game.
//! - A turn node holds the roll followed by from/to letter pairs; a roll
//!   alone is a pass.
//! - `RE` is `<winner>+<points>`, then `G`/`B` for gammon or backgammon and
//!   an end-reason code. A turn cut short by a resignation or forfeit is
//!   written as far as it went and is the last turn before the result.
//!
//! Import parses the whole document before touching any game, then replays
//! every recorded turn through the engine, so recorded moves are validated
//! exactly like live ones.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::board::{Position, BAR, CHECKERS_PER_SIDE, POINT_COUNT};
use crate::core::{CheckerColor, ColorMap, DiceRoll, DieValues};
use crate::error::{EngineError, ParseError};
use crate::rules::{
    CubeOwner, DoublingAction, DoublingCube, EndReason, Game, GameContext, GameOutcome, TurnPhase,
    TurnSnapshot, WinType,
};

const APPLICATION: &str = "rust-backgammon";
const BAR_LETTER: char = 'y';
const OFF_LETTER: char = 'z';

/// Match information carried in the root node (`MI`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SgfHeader {
    /// Match length; `None` for unlimited sessions.
    pub match_length: Option<u32>,
    /// 1-based game number within the match.
    pub game_number: u32,
    /// Scores before this game.
    pub scores: ColorMap<u32>,
}

/// Result of [`import`].
#[derive(Clone, Debug)]
pub struct SgfGame {
    pub header: SgfHeader,
    pub game: Game,
    /// The document held turn nodes, not just a position.
    pub has_record: bool,
}

// === Export ===

/// Write the current position and turn context, plus the result of a
/// finished game. History is omitted.
#[must_use]
pub fn export_position(game: &Game, header: &SgfHeader) -> String {
    let mut out = String::from("(");
    write_root(&mut out, header, game.outcome());
    write_setup(&mut out, &game.context());
    out.push(')');
    out
}

/// Write the starting setup and every recorded turn.
#[must_use]
pub fn export_game(game: &Game, header: &SgfHeader) -> String {
    let start = game.start_context();
    let mut out = String::from("(");
    write_root(&mut out, header, game.outcome());
    write_setup(&mut out, start);

    for (index, turn) in game.history().iter().enumerate() {
        let first = index == 0;
        write_turn(
            &mut out,
            turn,
            first && start.pending_double.is_some(),
            first && start.dice.is_some(),
        );
    }
    out.push(')');
    out
}

fn write_root(out: &mut String, header: &SgfHeader, outcome: Option<&GameOutcome>) {
    let _ = write!(out, ";FF[4]GM[6]CA[UTF-8]AP[{APPLICATION}]");
    if let Some(length) = header.match_length {
        let _ = write!(
            out,
            "MI[length:{length}][game:{}][ws:{}][bs:{}]",
            header.game_number,
            header.scores[CheckerColor::White],
            header.scores[CheckerColor::Red]
        );
    }
    if let Some(outcome) = outcome {
        let _ = write!(out, "RE[{}+{}", outcome.winner.code(), outcome.stakes());
        match outcome.win_type {
            WinType::Normal => {}
            WinType::Gammon => out.push('G'),
            WinType::Backgammon => out.push('B'),
        }
        if let Some(code) = outcome.reason.code() {
            out.push(code);
        }
        out.push(']');
    }
}

fn point_letter(point: u8) -> char {
    char::from(b'a' + point - 1)
}

fn write_setup(out: &mut String, context: &GameContext) {
    out.push_str(";AE[a:y]");
    for (ident, color) in [("AW", CheckerColor::White), ("AB", CheckerColor::Red)] {
        let letters = checker_letters(&context.position, color);
        if letters.is_empty() {
            continue;
        }
        out.push_str(ident);
        for letter in letters {
            let _ = write!(out, "[{letter}]");
        }
    }

    let _ = write!(out, "PL[{}]CV[{}]", context.player.code(), context.cube.value());
    let owner = match context.cube.owner() {
        CubeOwner::Centered => 'c',
        CubeOwner::OwnedBy(color) => color.code().to_ascii_lowercase(),
    };
    let _ = write!(out, "CP[{owner}]");

    if let Some(roll) = context.dice {
        let _ = write!(out, "DI[{roll}]");
        if context.remaining != roll.values() {
            out.push_str("RD[");
            for die in &context.remaining {
                let _ = write!(out, "{die}");
            }
            out.push(']');
        }
    }
    if let Some(value) = context.pending_double {
        let _ = write!(out, "DO[{value}]");
    }
    if context.crawford {
        out.push_str("CR[1]");
    }
}

fn checker_letters(position: &Position, color: CheckerColor) -> Vec<char> {
    let mut letters = Vec::new();
    for point in 1..=POINT_COUNT {
        for _ in 0..position.count(color, point) {
            letters.push(point_letter(point));
        }
    }
    for _ in 0..position.bar(color) {
        letters.push(BAR_LETTER);
    }
    letters
}

fn write_turn(out: &mut String, turn: &TurnSnapshot, skip_offer: bool, skip_dice: bool) {
    let me = turn.player.code();
    let them = turn.player.opponent().code();

    let response = match turn.doubling {
        Some(DoublingAction::Accepted { .. }) => Some(Some("take")),
        Some(DoublingAction::Rejected { .. }) => Some(Some("drop")),
        Some(DoublingAction::Offered { .. }) => Some(None),
        None => None,
    };
    if let Some(response) = response {
        if !skip_offer {
            let _ = write!(out, ";{me}[double]");
        }
        if let Some(response) = response {
            let _ = write!(out, ";{them}[{response}]");
        }
    }

    if let Some(roll) = turn.dice {
        let _ = write!(out, ";{me}[");
        if !skip_dice {
            let _ = write!(out, "{roll}");
        }
        for mv in &turn.moves {
            out.push(if mv.is_entry() { BAR_LETTER } else { point_letter(mv.from) });
            out.push(if mv.is_bear_off(turn.player) {
                OFF_LETTER
            } else {
                point_letter(mv.to)
            });
        }
        out.push(']');
    }
}

// === Import ===

/// Parse a document and rebuild the game it describes.
pub fn import(text: &str) -> Result<SgfGame, ParseError> {
    let nodes = parse_collection(text)?;
    let mut nodes = nodes.into_iter();
    let root = nodes.next().ok_or(ParseError::MissingProperty("GM"))?;

    match root.first("GM") {
        Some("6") => {}
        Some(other) => return Err(invalid("GM", other)),
        None => return Err(ParseError::MissingProperty("GM")),
    }
    let header = parse_header(&root)?;
    let result = root.first("RE").map(parse_result).transpose()?;

    let mut rest: Vec<SgfNode> = nodes.collect();
    let context = if rest.first().is_some_and(SgfNode::is_setup) {
        parse_setup(&rest.remove(0))?
    } else {
        parse_setup(&root)?
    };

    let mut game = Game::restore(context).map_err(into_parse_error)?;
    let has_record = !rest.is_empty();

    for (index, node) in rest.iter().enumerate() {
        let cut_short = result.is_some() && index + 1 == rest.len();
        replay_node(&mut game, node, index + 1, cut_short)?;
    }
    if let Some(result) = result {
        apply_result(&mut game, &result, rest.len())?;
    }

    Ok(SgfGame {
        header,
        game,
        has_record,
    })
}

/// `export(import(text))`, in whichever form the input used.
pub fn canonicalize(text: &str) -> Result<String, ParseError> {
    let imported = import(text)?;
    Ok(if imported.has_record {
        export_game(&imported.game, &imported.header)
    } else {
        export_position(&imported.game, &imported.header)
    })
}

fn invalid(property: &str, value: &str) -> ParseError {
    ParseError::InvalidValue {
        property: property.to_string(),
        value: value.to_string(),
    }
}

fn into_parse_error(err: EngineError) -> ParseError {
    match err {
        EngineError::PositionParse(parse) => parse,
        other => ParseError::InvalidValue {
            property: "setup".to_string(),
            value: other.to_string(),
        },
    }
}

fn parse_header(root: &SgfNode) -> Result<SgfHeader, ParseError> {
    let mut header = SgfHeader::default();
    let Some(values) = root.values("MI") else {
        return Ok(header);
    };

    for value in values {
        let Some((key, number)) = value.split_once(':') else {
            return Err(invalid("MI", value));
        };
        let parsed: u32 = number.trim().parse().map_err(|_| invalid("MI", value))?;
        match key.trim() {
            "length" => header.match_length = Some(parsed),
            "game" => header.game_number = parsed,
            "ws" => header.scores[CheckerColor::White] = parsed,
            "bs" => header.scores[CheckerColor::Red] = parsed,
            _ => {}
        }
    }
    Ok(header)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RecordedResult {
    winner: CheckerColor,
    stakes: u32,
    win_type: WinType,
    reason: Option<EndReason>,
}

fn parse_result(value: &str) -> Result<RecordedResult, ParseError> {
    let bad = || invalid("RE", value);
    let mut chars = value.trim().chars();
    let winner = chars.next().and_then(CheckerColor::from_code).ok_or_else(bad)?;
    if chars.next() != Some('+') {
        return Err(bad());
    }
    let rest: String = chars.collect();
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let stakes: u32 = rest[..digits_end].parse().map_err(|_| bad())?;

    let mut suffix = rest[digits_end..].chars().peekable();
    let win_type = match suffix.peek() {
        Some('G') => {
            suffix.next();
            WinType::Gammon
        }
        Some('B') => {
            suffix.next();
            WinType::Backgammon
        }
        _ => WinType::Normal,
    };
    let reason = match suffix.next() {
        Some(code) => Some(EndReason::from_code(code).ok_or_else(bad)?),
        None => None,
    };
    if suffix.next().is_some() {
        return Err(bad());
    }

    Ok(RecordedResult {
        winner,
        stakes,
        win_type,
        reason,
    })
}

fn parse_point(property: &str, letter: char) -> Result<Option<u8>, ParseError> {
    match letter {
        'a'..='x' => Ok(Some(letter as u8 - b'a' + 1)),
        BAR_LETTER => Ok(None),
        _ => Err(invalid(property, &letter.to_string())),
    }
}

/// Expand a point list entry: `"f"` or a range `"a:f"`.
fn expand_letters(property: &str, value: &str) -> Result<Vec<char>, ParseError> {
    let chars: Vec<char> = value.trim().chars().collect();
    match chars.as_slice() {
        [single] => Ok(vec![*single]),
        [start, ':', end] if start <= end => Ok((*start..=*end).collect()),
        _ => Err(invalid(property, value)),
    }
}

fn parse_color(property: &str, value: &str) -> Result<CheckerColor, ParseError> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => CheckerColor::from_code(code).ok_or_else(|| invalid(property, value)),
        _ => Err(invalid(property, value)),
    }
}

fn parse_number(property: &str, value: &str) -> Result<u32, ParseError> {
    value.trim().parse().map_err(|_| invalid(property, value))
}

fn parse_digits(property: &str, value: &str) -> Result<DieValues, ParseError> {
    value
        .trim()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d @ 1..=6) => Ok(d as u8),
            _ => Err(invalid(property, value)),
        })
        .collect()
}

fn parse_setup(node: &SgfNode) -> Result<GameContext, ParseError> {
    let has_checkers = ["AE", "AW", "AB"].iter().any(|ident| node.values(ident).is_some());
    let mut position = if has_checkers {
        Position::empty()
    } else {
        Position::starting()
    };

    for (ident, color) in [("AW", CheckerColor::White), ("AB", CheckerColor::Red)] {
        let Some(values) = node.values(ident) else {
            continue;
        };
        let mut counts = [0u8; 25];
        for value in values {
            for letter in expand_letters(ident, value)? {
                let slot = parse_point(ident, letter)?.map_or(0, usize::from);
                counts[slot] = counts[slot].saturating_add(1);
            }
        }
        if counts.iter().map(|&c| u32::from(c)).sum::<u32>() > u32::from(CHECKERS_PER_SIDE) {
            return Err(invalid(ident, "more than 15 checkers"));
        }
        position.set_bar(color, counts[0]);
        for point in 1..=POINT_COUNT {
            let count = counts[usize::from(point)];
            if count == 0 {
                continue;
            }
            if position.point(point).count > 0 {
                return Err(invalid(ident, &point_letter(point).to_string()));
            }
            position.set_point(point, Some(color), count);
        }
    }
    if has_checkers {
        for color in CheckerColor::ALL {
            position.fill_off(color)?;
        }
    }

    let player = match node.first("PL") {
        Some(value) => parse_color("PL", value)?,
        None => CheckerColor::White,
    };

    let value = match node.first("CV") {
        Some(value) => parse_number("CV", value)?,
        None => 1,
    };
    let owner = match node.first("CP").map(str::trim) {
        None | Some("c") => CubeOwner::Centered,
        Some("w") => CubeOwner::OwnedBy(CheckerColor::White),
        Some("b") | Some("r") => CubeOwner::OwnedBy(CheckerColor::Red),
        Some(other) => return Err(invalid("CP", other)),
    };
    let cube = DoublingCube::at(value, owner).ok_or_else(|| invalid("CV", &value.to_string()))?;

    let mut dice = None;
    let mut remaining = DieValues::new();
    if let Some(value) = node.first("DI") {
        let faces = parse_digits("DI", value)?;
        let roll = match faces.as_slice() {
            [first, second] => DiceRoll::new(*first, *second),
            _ => None,
        }
        .ok_or_else(|| invalid("DI", value))?;
        remaining = match node.first("RD") {
            Some(rest) => parse_digits("RD", rest)?,
            None => roll.values(),
        };
        dice = Some(roll);
    }

    let pending_double = node.first("DO").map(|v| parse_number("DO", v)).transpose()?;
    let crawford = node.first("CR").is_some_and(|v| v.trim() == "1");

    Ok(GameContext {
        position,
        player,
        cube,
        dice,
        remaining,
        pending_double,
        crawford,
    })
}

/// Replay one node. With `cut_short`, a play that leaves dice unused keeps
/// the turn open for the result that follows.
fn replay_node(game: &mut Game, node: &SgfNode, turn: usize, cut_short: bool) -> Result<(), ParseError> {
    let recorded = |detail: String| ParseError::IllegalRecordedTurn { turn, detail };
    let replay_err = |err: EngineError| recorded(err.to_string());

    let (color, value) = node
        .turn_action()
        .ok_or_else(|| recorded("node has no W or B property".to_string()))?;
    if game.is_over() {
        return Err(recorded("game is already over".to_string()));
    }
    if color != game.actor() {
        return Err(recorded(format!("{color} acted out of turn")));
    }

    match value.trim() {
        "double" => game.offer_double().map(|_| ()).map_err(replay_err),
        "take" => game.accept_double().map(|_| ()).map_err(replay_err),
        "drop" => game.reject_double().map(|_| ()).map_err(replay_err),
        play => replay_play(game, play, cut_short).map_err(|err| match err {
            ReplayError::Engine(err) => replay_err(err),
            ReplayError::Syntax => recorded(format!("malformed play {play:?}")),
        }),
    }
}

enum ReplayError {
    Engine(EngineError),
    Syntax,
}

impl From<EngineError> for ReplayError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

fn replay_play(game: &mut Game, play: &str, cut_short: bool) -> Result<(), ReplayError> {
    let chars: Vec<char> = play.chars().collect();
    let digits = chars.iter().take_while(|c| c.is_ascii_digit()).count();

    let letters = match digits {
        2 => {
            let face = |c: char| c.to_digit(10).map(|d| d as u8).ok_or(ReplayError::Syntax);
            game.set_dice(face(chars[0])?, face(chars[1])?)?;
            &chars[2..]
        }
        0 if game.phase().is_moving() => &chars[..],
        _ => return Err(ReplayError::Syntax),
    };
    if letters.len() % 2 != 0 {
        return Err(ReplayError::Syntax);
    }

    let player = game.current_player();
    for pair in letters.chunks_exact(2) {
        let from = match pair[0] {
            BAR_LETTER => BAR,
            letter => parse_point("move", letter)
                .ok()
                .flatten()
                .ok_or(ReplayError::Syntax)?,
        };
        let to = match pair[1] {
            OFF_LETTER => player.off_point(),
            letter => parse_point("move", letter)
                .ok()
                .flatten()
                .ok_or(ReplayError::Syntax)?,
        };
        game.make_move(from, to)?;
        if game.is_over() {
            return Ok(());
        }
    }
    if !cut_short || game.legal_moves().is_empty() {
        game.end_turn()?;
    }
    Ok(())
}

fn apply_result(game: &mut Game, result: &RecordedResult, turns: usize) -> Result<(), ParseError> {
    let mismatch = |detail: String| ParseError::IllegalRecordedTurn {
        turn: turns,
        detail,
    };

    if !game.is_over() {
        let loser = result.winner.opponent();
        let ended = match result.reason {
            Some(EndReason::Resigned) => game.resign(loser, result.win_type),
            Some(reason @ (EndReason::Timeout | EndReason::Forfeit)) => game.forfeit(loser, reason),
            // A bare position whose result is a drop: replay the offer and the drop.
            Some(EndReason::DoubleRejected) if turns == 0 => replay_drop(game),
            _ => return Err(mismatch("result recorded but the game is not over".to_string())),
        };
        ended.map_err(|err| mismatch(err.to_string()))?;
    }

    let outcome = game
        .outcome()
        .copied()
        .ok_or_else(|| mismatch("game has no outcome".to_string()))?;
    let recorded = RecordedResult {
        winner: outcome.winner,
        stakes: outcome.stakes(),
        win_type: outcome.win_type,
        reason: outcome.reason.code().and_then(EndReason::from_code),
    };
    if recorded != *result {
        return Err(invalid("RE", "does not match the replayed game"));
    }
    Ok(())
}

fn replay_drop(game: &mut Game) -> Result<GameOutcome, EngineError> {
    if !matches!(game.phase(), TurnPhase::AwaitingDoubleResponse { .. }) {
        game.offer_double()?;
    }
    game.reject_double()
}

// === Tokenizer ===

#[derive(Clone, Debug, Default)]
struct SgfNode {
    properties: Vec<(String, Vec<String>)>,
}

impl SgfNode {
    fn values(&self, ident: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|(name, _)| name == ident)
            .map(|(_, values)| values.as_slice())
    }

    fn first(&self, ident: &str) -> Option<&str> {
        self.values(ident).and_then(|values| values.first()).map(String::as_str)
    }

    fn is_setup(&self) -> bool {
        ["AE", "AW", "AB", "PL", "CV", "CP", "DI", "DO", "CR"]
            .iter()
            .any(|ident| self.values(ident).is_some())
    }

    fn turn_action(&self) -> Option<(CheckerColor, &str)> {
        if let Some(value) = self.first("W") {
            return Some((CheckerColor::White, value));
        }
        self.first("B").map(|value| (CheckerColor::Red, value))
    }
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn skip_whitespace(chars: &mut Chars<'_>) {
    while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}

fn unexpected(next: Option<(usize, char)>) -> ParseError {
    match next {
        Some((offset, found)) => ParseError::UnexpectedChar { offset, found },
        None => ParseError::UnexpectedEnd,
    }
}

fn parse_collection(text: &str) -> Result<Vec<SgfNode>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut chars = text.char_indices().peekable();

    skip_whitespace(&mut chars);
    match chars.next() {
        Some((_, '(')) => {}
        other => return Err(unexpected(other)),
    }

    let mut nodes = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.next() {
            Some((_, ';')) => nodes.push(parse_node(&mut chars)?),
            Some((_, ')')) => break,
            other => return Err(unexpected(other)),
        }
    }

    skip_whitespace(&mut chars);
    if let Some(extra) = chars.next() {
        return Err(unexpected(Some(extra)));
    }
    Ok(nodes)
}

fn parse_node(chars: &mut Chars<'_>) -> Result<SgfNode, ParseError> {
    let mut node = SgfNode::default();
    loop {
        skip_whitespace(chars);
        let mut ident = String::new();
        while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_uppercase()) {
            ident.push(c);
        }
        if ident.is_empty() {
            return Ok(node);
        }

        let mut values = Vec::new();
        loop {
            skip_whitespace(chars);
            if chars.next_if(|(_, c)| *c == '[').is_none() {
                break;
            }
            values.push(parse_value(chars)?);
        }
        if values.is_empty() {
            return Err(unexpected(chars.peek().copied()));
        }
        node.properties.push((ident, values));
    }
}

fn parse_value(chars: &mut Chars<'_>) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, ']')) => return Ok(value),
            Some((_, '\\')) => {
                let (_, escaped) = chars.next().ok_or(ParseError::UnexpectedEnd)?;
                value.push(escaped);
            }
            Some((_, c)) => value.push(c),
            None => return Err(ParseError::UnexpectedEnd),
        }
    }
}
