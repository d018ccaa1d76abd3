use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::card::{ArtId, Card, Point, Size};

/// Cards per grid row.
pub const GRID_COLUMNS: usize = 5;

/// A dealable character and its front art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub front: ArtId,
}

/// Every character with loaded art, plus the shared card back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub characters: Vec<Character>,
    pub back: ArtId,
}

/// Rows at the bottom of a board screen kept for the key-hint footer.
pub const FOOTER_ROWS: u16 = 1;

/// Smallest card a grid shrinks to: a border around a single row of art.
pub const MIN_CARD: Size = Size::new(5, 3);

/// Geometry shared by both game modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub screen: Size,
    pub card: Size,
    pub padding: u16,
}

impl Layout {
    /// The largest layout, no bigger than `max_card` and `max_padding`, whose
    /// `count`-card grid fits below `top(card_height)` rows and above the
    /// footer.  The card keeps the proportions of `max_card` as it shrinks.
    ///
    /// When even `MIN_CARD` does not fit, the smallest layout is returned and
    /// [`Layout::required_screen`] reports how much room it needs.
    pub fn fit(
        screen: Size,
        max_card: Size,
        max_padding: u16,
        count: usize,
        top: impl Fn(u16) -> u16,
    ) -> Self {
        let min_height = MIN_CARD.height.min(max_card.height);
        let min_padding = max_padding.min(1);
        let mut smallest = Layout {
            screen,
            card: max_card,
            padding: max_padding,
        };
        for height in (min_height..=max_card.height).rev() {
            let card = Size::new(scaled_width(max_card, height), height);
            for padding in (min_padding..=max_padding).rev() {
                smallest = Layout { screen, card, padding };
                if smallest.fits(count, top(height)) {
                    return smallest;
                }
            }
        }
        smallest
    }

    /// Width and height of a `count`-card grid.
    fn grid_size(&self, count: usize) -> (u32, u32) {
        if count == 0 {
            return (0, 0);
        }
        let rows = count.div_ceil(GRID_COLUMNS) as u32;
        let cols = count.min(GRID_COLUMNS) as u32;
        let pad = u32::from(self.padding);
        (
            (u32::from(self.card.width) + pad) * cols - pad,
            (u32::from(self.card.height) + pad) * rows - pad,
        )
    }

    /// Whether every card of a `count`-card grid starting at row `y_offset`
    /// lands on screen, above the footer.
    pub fn fits(&self, count: usize, y_offset: u16) -> bool {
        let (w, h) = self.grid_size(count);
        let bottom = u32::from(self.screen.height.saturating_sub(FOOTER_ROWS));
        w <= u32::from(self.screen.width) && u32::from(y_offset) + h <= bottom
    }

    /// Screen size this grid needs, or `None` when the current screen is big
    /// enough.
    pub fn required_screen(&self, count: usize, y_offset: u16) -> Option<Size> {
        if self.fits(count, y_offset) {
            return None;
        }
        let (w, h) = self.grid_size(count);
        let rows = u32::from(y_offset) + h + u32::from(FOOTER_ROWS);
        Some(Size::new(clamp_u16(w), clamp_u16(rows)))
    }

    /// Top-left corner of each of `count` cards in a grid `GRID_COLUMNS`
    /// across, centered horizontally and centered vertically between row
    /// `y_offset` and the footer.
    ///
    /// When the grid is larger than that area the origin clamps and the
    /// overflow is clipped at draw time.
    pub fn grid_positions(&self, count: usize, y_offset: u16) -> Vec<Point> {
        if count == 0 {
            return Vec::new();
        }
        let cols = GRID_COLUMNS as u32;
        let step_x = u32::from(self.card.width) + u32::from(self.padding);
        let step_y = u32::from(self.card.height) + u32::from(self.padding);
        let grid_w = step_x * cols - u32::from(self.padding);
        let (_, grid_h) = self.grid_size(count);

        let band = self.screen.height.saturating_sub(FOOTER_ROWS).saturating_sub(y_offset);
        let start_x = u32::from(self.screen.width).saturating_sub(grid_w) / 2;
        let start_y = u32::from(band).saturating_sub(grid_h) / 2 + u32::from(y_offset);

        (0..count as u32)
            .map(|i| {
                let x = start_x + (i % cols) * step_x;
                let y = start_y + (i / cols) * step_y;
                Point::new(clamp_u16(x), clamp_u16(y))
            })
            .collect()
    }

    /// Place `names` on the grid as face-down cards.
    pub fn deal(&self, names: &[&Character], back: ArtId, y_offset: u16) -> Vec<Card> {
        self.grid_positions(names.len(), y_offset)
            .into_iter()
            .zip(names)
            .map(|(pos, ch)| Card::new(ch.name.clone(), ch.front, back, pos, self.card))
            .collect()
    }

    /// Move existing cards onto a fresh grid for a new screen size, keeping
    /// their order and flags.
    pub fn reposition(&self, cards: &mut [Card], y_offset: u16) {
        let positions = self.grid_positions(cards.len(), y_offset);
        for (card, pos) in cards.iter_mut().zip(positions) {
            card.position = pos;
            card.size = self.card;
        }
    }
}

/// `max_card.width` scaled to `height`, rounded, never below `MIN_CARD`.
fn scaled_width(max_card: Size, height: u16) -> u16 {
    if max_card.height == 0 {
        return max_card.width;
    }
    let w = (u32::from(max_card.width) * u32::from(height) + u32::from(max_card.height) / 2)
        / u32::from(max_card.height);
    clamp_u16(w).clamp(MIN_CARD.width.min(max_card.width), max_card.width)
}

fn clamp_u16(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// Shuffle the roster and take up to `count` characters.
pub fn pick_characters<'a, R: Rng + ?Sized>(
    roster: &'a Roster,
    count: usize,
    rng: &mut R,
) -> Vec<&'a Character> {
    let mut chosen: Vec<&Character> = roster.characters.iter().collect();
    chosen.shuffle(rng);
    chosen.truncate(count.min(roster.characters.len()));
    chosen
}

/// `mm:ss`, minutes unbounded.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    pub(crate) fn roster(n: usize) -> Roster {
        Roster {
            characters: (0..n)
                .map(|i| Character {
                    name: format!("Brawler{}", i),
                    front: ArtId(i + 1),
                })
                .collect(),
            back: ArtId(0),
        }
    }

    pub(crate) fn layout() -> Layout {
        Layout {
            screen: Size::new(100, 40),
            card: Size::new(14, 8),
            padding: 2,
        }
    }

    #[test]
    fn grid_is_centered_five_across() {
        let positions = layout().grid_positions(10, 0);
        // grid: 5*16-2 = 78 wide, 2*10-2 = 18 tall, in 39 rows above the footer
        assert_eq!(positions[0], Point::new(11, 10));
        assert_eq!(positions[4], Point::new(11 + 4 * 16, 10));
        assert_eq!(positions[5], Point::new(11, 20));
    }

    #[test]
    fn grid_offset_and_small_screens() {
        let l = layout();
        // One row of 8 centered in rows 6..39.
        assert_eq!(l.grid_positions(5, 6)[0].y, 6 + (33 - 8) / 2);

        let tiny = Layout {
            screen: Size::new(20, 5),
            ..l
        };
        assert_eq!(tiny.grid_positions(7, 0)[0], Point::new(0, 0));
        assert!(tiny.grid_positions(0, 0).is_empty());
    }

    #[test]
    fn fit_keeps_full_size_when_there_is_room() {
        let l = Layout::fit(Size::new(100, 40), Size::new(14, 8), 2, 10, |_| 3);
        assert_eq!((l.card, l.padding), (Size::new(14, 8), 2));
        assert!(l.fits(10, 3));
        assert_eq!(l.required_screen(10, 3), None);
    }

    #[test]
    fn fit_shrinks_twenty_cards_into_a_standard_terminal() {
        let screen = Size::new(80, 24);
        let l = Layout::fit(screen, Size::new(14, 8), 2, 20, |_| 3);
        assert!(l.card.height < 8 && l.card.width < 14);
        assert!(l.card.width >= MIN_CARD.width && l.card.height >= MIN_CARD.height);
        let positions = l.grid_positions(20, 3);
        for p in &positions {
            assert!(p.y >= 3);
            assert!(p.x + l.card.width <= screen.width);
            assert!(p.y + l.card.height <= screen.height - FOOTER_ROWS);
        }
    }

    #[test]
    fn fit_reserves_a_band_that_grows_with_the_card() {
        let top = |h: u16| 4 + h + 1;
        let l = Layout::fit(Size::new(80, 24), Size::new(14, 8), 2, 10, top);
        let band = top(l.card.height);
        assert!(l.fits(10, band));
        assert!(l.grid_positions(10, band).iter().all(|p| p.y >= band));
    }

    #[test]
    fn too_small_screen_reports_needed_size() {
        let l = Layout::fit(Size::new(20, 6), Size::new(14, 8), 2, 20, |_| 3);
        assert_eq!(l.card.height, MIN_CARD.height);
        let needed = l.required_screen(20, 3).unwrap();
        assert!(needed.width > 20 && needed.height > 6);
        let roomy = Layout {
            screen: needed,
            ..l
        };
        assert!(roomy.fits(20, 3));
    }

    #[test]
    fn pick_characters_caps_at_roster_size() {
        let r = roster(4);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(pick_characters(&r, 3, &mut rng).len(), 3);
        let all = pick_characters(&r, 9, &mut rng);
        assert_eq!(all.len(), 4);
        let mut names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn picks_are_reproducible_with_a_seed() {
        let r = roster(10);
        let a: Vec<_> = pick_characters(&r, 5, &mut SmallRng::seed_from_u64(9))
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let b: Vec<_> = pick_characters(&r, 5, &mut SmallRng::seed_from_u64(9))
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_millis(75_900)), "01:15");
        assert_eq!(format_clock(Duration::from_secs(6000)), "100:00");
    }
}
