use model::{PartIndex, Rect, Twips};

use crate::scan::Scanner;

const ENTIRE_PART_SENTINEL: &str = "EMPTY";

/// Decoded `invalidate_tiles` payload: `x, y, w, h[, part]` or `EMPTY[, part]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileInvalidation {
    EntirePart { part: Option<PartIndex> },
    Rect { rect: Rect<Twips>, part: Option<PartIndex> },
    Nothing,
}

pub fn parse_invalidate_tiles(payload: &str) -> TileInvalidation {
    let trimmed = payload.trim();
    if let Some(rest) = trimmed.strip_prefix(ENTIRE_PART_SENTINEL)
        && (rest.is_empty() || rest.starts_with(','))
    {
        let mut scanner = Scanner::new(rest.as_bytes());
        return TileInvalidation::EntirePart {
            part: trailing_number(&mut scanner),
        };
    }

    let mut scanner = Scanner::new(trimmed.as_bytes());
    let rect = scanner.parse_rect();
    if rect.is_empty() {
        return TileInvalidation::Nothing;
    }
    TileInvalidation::Rect {
        rect,
        part: trailing_number(&mut scanner),
    }
}

fn trailing_number(scanner: &mut Scanner<'_>) -> Option<PartIndex> {
    scanner.skip_non_numeric();
    if scanner.is_at_end() {
        return None;
    }
    PartIndex::try_from(scanner.parse_u64()).ok()
}
