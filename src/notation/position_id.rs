//! GNU Backgammon position ids.
//!
//! A position id packs both sides' checkers into an 80-bit key and encodes
//! it as 14 base64 characters. Each side is written from its own point of
//! view: points 1-24 then the bar, every checker a `1` bit, every slot
//! terminated by a `0` bit. The side *not* on roll is written first.
//!
//! ```
//! use rust_backgammon::board::Position;
//! use rust_backgammon::core::CheckerColor;
//! use rust_backgammon::notation::position_id;
//!
//! let id = position_id::encode(&Position::starting(), CheckerColor::White);
//! assert_eq!(id, "4HPwATDgc/ABMA");
//! ```

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;

use crate::board::{Position, CHECKERS_PER_SIDE, POINT_COUNT};
use crate::core::CheckerColor;
use crate::error::ParseError;

const KEY_BYTES: usize = 10;
const ID_LEN: usize = 14;
const SLOTS: u8 = POINT_COUNT + 1;

fn side_order(on_roll: CheckerColor) -> [CheckerColor; 2] {
    [on_roll.opponent(), on_roll]
}

fn slot_count(position: &Position, color: CheckerColor, slot: u8) -> u8 {
    if slot == POINT_COUNT {
        position.bar(color)
    } else {
        position.count(color, color.absolute_point(slot + 1))
    }
}

/// Encode `position` with `on_roll` as the player to move.
#[must_use]
pub fn encode(position: &Position, on_roll: CheckerColor) -> String {
    let mut key = [0u8; KEY_BYTES];
    let mut bit = 0usize;

    for color in side_order(on_roll) {
        for slot in 0..SLOTS {
            for _ in 0..slot_count(position, color, slot) {
                if let Some(byte) = key.get_mut(bit / 8) {
                    *byte |= 1 << (bit % 8);
                }
                bit += 1;
            }
            bit += 1;
        }
    }

    STANDARD_NO_PAD.encode(key)
}

/// Decode a position id, with `on_roll` as the player to move.
///
/// Checkers missing from the key are borne off.
pub fn decode(id: &str, on_roll: CheckerColor) -> Result<Position, ParseError> {
    let invalid = || ParseError::InvalidPositionId(id.to_string());

    let trimmed = id.trim();
    if trimmed.len() != ID_LEN {
        return Err(invalid());
    }
    let bytes = STANDARD_NO_PAD.decode(trimmed).map_err(|_| invalid())?;
    if bytes.len() != KEY_BYTES {
        return Err(invalid());
    }

    let total_bits = KEY_BYTES * 8;
    let bit_at = |index: usize| bytes[index / 8] & (1 << (index % 8)) != 0;

    let mut position = Position::empty();
    let mut bit = 0usize;

    for color in side_order(on_roll) {
        let mut placed = 0u8;
        for slot in 0..SLOTS {
            let mut count = 0u8;
            while bit < total_bits && bit_at(bit) {
                count += 1;
                bit += 1;
            }
            if bit >= total_bits {
                return Err(invalid());
            }
            bit += 1;

            placed = placed.saturating_add(count);
            if placed > CHECKERS_PER_SIDE {
                return Err(invalid());
            }
            if count == 0 {
                continue;
            }

            if slot == POINT_COUNT {
                position.set_bar(color, count);
            } else {
                let point = color.absolute_point(slot + 1);
                if position.point(point).count > 0 {
                    return Err(invalid());
                }
                position.set_point(point, Some(color), count);
            }
        }
        position.fill_off(color)?;
    }

    Ok(position)
}
