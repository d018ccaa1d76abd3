/// A terminal-cell coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Point { x, y }
    }
}

/// A width/height pair in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Size { width, height }
    }
}

/// Handle to a decoded image in the [`ArtBook`](crate::assets::ArtBook).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtId(pub usize);

/// A single tile on the board.
///
/// A card shows its back until it is flipped.  Once `matched` it stays face
/// up for the rest of the board and can no longer be flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub name: String,
    pub front: ArtId,
    pub back: ArtId,
    pub position: Point,
    pub size: Size,
    pub flipped: bool,
    pub matched: bool,
}

impl Card {
    pub fn new(
        name: impl Into<String>,
        front: ArtId,
        back: ArtId,
        position: Point,
        size: Size,
    ) -> Self {
        Card {
            name: name.into(),
            front,
            back,
            position,
            size,
            flipped: false,
            matched: false,
        }
    }

    /// Toggle the card face.  Matched cards are left alone.
    pub fn flip(&mut self) {
        if !self.matched {
            self.flipped = !self.flipped;
        }
    }

    /// Whether the card currently shows its front.
    pub fn face_up(&self) -> bool {
        self.flipped || self.matched
    }

    /// Half-open hit test: the right and bottom edges belong to the padding.
    pub fn contains_point(&self, point: Point) -> bool {
        let Point { x, y } = self.position;
        point.x >= x
            && point.y >= y
            && u32::from(point.x) < u32::from(x) + u32::from(self.size.width)
            && u32::from(point.y) < u32::from(y) + u32::from(self.size.height)
    }

    /// Bounds as a ratatui rect, for drawing.
    pub fn rect(&self) -> ratatui::layout::Rect {
        ratatui::layout::Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }
}
