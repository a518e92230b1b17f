//! Mapping board squares to screen pixels for move execution.

use std::fmt;

use shakmaty::Square;

/// Which side of the board is drawn at the bottom of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Orientation {
    #[default]
    WhiteBottom,
    BlackBottom,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::WhiteBottom => write!(f, "white_bottom"),
            Orientation::BlackBottom => write!(f, "black_bottom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Position and size of the on-screen board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardGeometry {
    /// Screen x of the board's left edge
    pub offset_x: i32,
    /// Screen y of the board's top edge
    pub offset_y: i32,
    /// Width and height of one square in pixels
    pub square_size: i32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        BoardGeometry {
            offset_x: 312,
            offset_y: 272,
            square_size: 144,
        }
    }
}

impl BoardGeometry {
    /// Centre pixel of `square` as seen from `orientation`.
    #[must_use]
    pub fn square_center(&self, square: Square, orientation: Orientation) -> Point {
        let file = square.file() as i32;
        let rank = square.rank() as i32;
        let (col, row) = match orientation {
            Orientation::WhiteBottom => (file, 7 - rank),
            Orientation::BlackBottom => (7 - file, rank),
        };
        let half = self.square_size / 2;
        Point {
            x: self.offset_x + col * self.square_size + half,
            y: self.offset_y + row * self.square_size + half,
        }
    }

    /// Source and target pixels of a UCI move such as `e2e4` or `e7e8q`.
    #[must_use]
    pub fn move_points(&self, uci_move: &str, orientation: Orientation) -> Option<(Point, Point)> {
        let from = uci_move.get(0..2)?.parse::<Square>().ok()?;
        let to = uci_move.get(2..4)?.parse::<Square>().ok()?;
        Some((
            self.square_center(from, orientation),
            self.square_center(to, orientation),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_bottom_corners() {
        let geometry = BoardGeometry::default();
        assert_eq!(
            geometry.square_center(Square::A1, Orientation::WhiteBottom),
            Point { x: 384, y: 1352 }
        );
        assert_eq!(
            geometry.square_center(Square::H8, Orientation::WhiteBottom),
            Point { x: 1392, y: 344 }
        );
    }

    #[test]
    fn test_black_bottom_mirrors_both_axes() {
        let geometry = BoardGeometry::default();
        assert_eq!(
            geometry.square_center(Square::A1, Orientation::BlackBottom),
            geometry.square_center(Square::H8, Orientation::WhiteBottom)
        );
    }

    #[test]
    fn test_move_points() {
        let geometry = BoardGeometry {
            offset_x: 0,
            offset_y: 0,
            square_size: 100,
        };
        let (from, to) = geometry.move_points("e2e4", Orientation::WhiteBottom).unwrap();
        assert_eq!(from, Point { x: 450, y: 650 });
        assert_eq!(to, Point { x: 450, y: 450 });

        let (from, _) = geometry.move_points("e7e8q", Orientation::BlackBottom).unwrap();
        assert_eq!(from, Point { x: 350, y: 650 });
    }

    #[test]
    fn test_move_points_rejects_garbage() {
        let geometry = BoardGeometry::default();
        assert_eq!(geometry.move_points("(none)", Orientation::WhiteBottom), None);
        assert_eq!(geometry.move_points("e2", Orientation::WhiteBottom), None);
        assert_eq!(geometry.move_points("z9e4", Orientation::WhiteBottom), None);
    }
}
