//! Card art: the character roster, placeholder generation and image loading.
//!
//! Images live in a plain directory (`assets/images` by default).  Missing
//! files are generated as simple placeholders on startup, and any image that
//! still fails to decode is replaced in memory so the game always has a full
//! deck to deal.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::board::{Character, Roster};
use crate::card::{ArtId, Size};

pub const CARD_BACK_FILE: &str = "card_back.png";

/// A character and the image file that depicts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterAsset {
    pub name: &'static str,
    pub file: &'static str,
}

/// The ten characters the game ships with.
pub const DEFAULT_ROSTER: [CharacterAsset; 10] = [
    CharacterAsset { name: "Spacesuit", file: "Brawl Stars Character in Spacesuit.png" },
    CharacterAsset { name: "Colt", file: "Brawl Stars Colt Action Pose.png" },
    CharacterAsset { name: "Leon", file: "Brawl Stars Leon Render.png" },
    CharacterAsset { name: "Nita", file: "Brawl Stars Nita and Bruce Costumes.png" },
    CharacterAsset { name: "Robo", file: "Brawl Stars Robo Rumble Brawler.png" },
    CharacterAsset { name: "Figure1", file: "ChatGPT Image May 2 2025 (1).png" },
    CharacterAsset { name: "Figure2", file: "ChatGPT Image May 2 2025 (2).png" },
    CharacterAsset { name: "Figure3", file: "ChatGPT Image May 2 2025 (3).png" },
    CharacterAsset { name: "Figure4", file: "ChatGPT Image May 2 2025 (4).png" },
    CharacterAsset { name: "Figure5", file: "ChatGPT Image May 2 2025.png" },
];

/// On-disk size of generated placeholders.
const PLACEHOLDER_SIZE: (u32, u32) = (150, 200);

const BRAWL_BLUE: [u8; 3] = [27, 67, 186];
const STAR_YELLOW: [u8; 3] = [255, 230, 0];
const GOLD: [u8; 3] = [255, 204, 0];
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

// ---------------------------------------------------------------------------
// Pixmaps
// ---------------------------------------------------------------------------

/// A decoded image already scaled to a card's pixel area.
///
/// One terminal cell holds two vertical pixels, so a card of `w × h` inner
/// cells has a `w × 2h` pixmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    image: RgbaImage,
}

impl Pixmap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Scale `source` to fit inside `width × height`, keeping its aspect
    /// ratio, centered on a transparent canvas.
    pub fn fit(source: &RgbaImage, width: u32, height: u32) -> Self {
        let mut canvas = RgbaImage::new(width.max(1), height.max(1));
        let (sw, sh) = source.dimensions();
        if sw == 0 || sh == 0 {
            return Pixmap { image: canvas };
        }

        let ratio = f64::min(f64::from(width) / f64::from(sw), f64::from(height) / f64::from(sh));
        let nw = ((f64::from(sw) * ratio) as u32).clamp(1, width.max(1));
        let nh = ((f64::from(sh) * ratio) as u32).clamp(1, height.max(1));
        let scaled = imageops::resize(source, nw, nh, FilterType::Triangle);

        let x = i64::from((width - nw) / 2);
        let y = i64::from((height - nh) / 2);
        imageops::overlay(&mut canvas, &scaled, x, y);
        Pixmap { image: canvas }
    }

    /// Scale `source` to exactly `width × height`, ignoring aspect ratio.
    /// Used for card backs, which always fill the card.
    pub fn stretch(source: &RgbaImage, width: u32, height: u32) -> Self {
        Pixmap {
            image: imageops::resize(source, width.max(1), height.max(1), FilterType::Triangle),
        }
    }
}

/// Owner of every pixmap in play.  Cards refer to entries by [`ArtId`].
#[derive(Debug, Clone, Default)]
pub struct ArtBook {
    images: Vec<Pixmap>,
}

impl ArtBook {
    pub fn push(&mut self, pixmap: Pixmap) -> ArtId {
        self.images.push(pixmap);
        ArtId(self.images.len() - 1)
    }

    pub fn get(&self, id: ArtId) -> Option<&Pixmap> {
        self.images.get(id.0)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.images.len()
    }
}

// ---------------------------------------------------------------------------
// Placeholder art
// ---------------------------------------------------------------------------

/// A stable per-name color, each channel in `55..=254`.
pub fn name_color(name: &str) -> [u8; 3] {
    // FNV-1a; stable across runs, unlike std's randomized hasher.
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    let channel = |k: u64| (hash.wrapping_mul(k) % 200) as u8 + 55;
    [channel(1), channel(2), channel(3)]
}

fn rgba(c: [u8; 3]) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], 255])
}

fn draw_border(img: &mut RgbaImage, color: [u8; 3], thickness: u32) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            if x < thickness || y < thickness || x + thickness >= w || y + thickness >= h {
                img.put_pixel(x, y, rgba(color));
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 3]) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, rgba(color));
        }
    }
}

/// Even-odd point-in-polygon test.
fn inside_polygon(px: f64, py: f64, points: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Ten-point star centered on the image, sized relative to a 150×200 card.
fn star_points(width: u32, height: u32) -> Vec<(f64, f64)> {
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let s = f64::from(width.min(height)) / 150.0;
    [
        (0.0, -20.0),
        (7.0, -7.0),
        (20.0, -5.0),
        (10.0, 7.0),
        (15.0, 20.0),
        (0.0, 15.0),
        (-15.0, 20.0),
        (-10.0, 7.0),
        (-20.0, -5.0),
        (-7.0, -7.0),
    ]
    .iter()
    .map(|(dx, dy)| (cx + dx * s * 2.0, cy + dy * s * 2.0))
    .collect()
}

/// The Brawl-blue card back with a yellow star and a gold border.
pub fn card_back_image(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, rgba(BRAWL_BLUE));
    let star = star_points(width, height);
    for y in 0..height {
        for x in 0..width {
            if inside_polygon(f64::from(x) + 0.5, f64::from(y) + 0.5, &star) {
                img.put_pixel(x, y, rgba(STAR_YELLOW));
            }
        }
    }
    draw_border(&mut img, GOLD, (width / 50).max(1));
    img
}

/// Placeholder written to disk for a character with no image.
pub fn placeholder_image(name: &str, width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, rgba(name_color(name)));
    draw_border(&mut img, WHITE, (width / 75).max(1));
    img
}

/// In-memory front used when a character's image cannot be decoded.
pub fn fallback_front(name: &str, width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, rgba([200, 200, 200]));
    let inset = (width / 16).max(1);
    fill_rect(
        &mut img,
        inset,
        inset,
        width.saturating_sub(inset),
        height.saturating_sub(inset),
        name_color(name),
    );
    draw_border(&mut img, BLACK, 1);
    img
}

/// In-memory back used when the card back cannot be decoded.
pub fn fallback_back(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, rgba([50, 50, 200]));
    draw_border(&mut img, WHITE, 1);
    img
}

// ---------------------------------------------------------------------------
// Disk
// ---------------------------------------------------------------------------

/// Create `dir` and write placeholders for every missing image.
/// Returns how many files were generated.  Only a missing directory is an
/// error; a file that cannot be written is logged and skipped.
pub fn ensure_assets(dir: &Path, roster: &[CharacterAsset]) -> Result<usize> {
    fs::create_dir_all(dir)
        .wrap_err_with(|| format!("creating assets directory {}", dir.display()))?;

    let (w, h) = PLACEHOLDER_SIZE;
    let mut created = 0;

    let back_path = dir.join(CARD_BACK_FILE);
    if !back_path.exists() && write_png(&card_back_image(w, h), &back_path, "card back") {
        created += 1;
    }

    for character in roster {
        let path = dir.join(character.file);
        if path.exists() {
            continue;
        }
        if write_png(&placeholder_image(character.name, w, h), &path, character.name) {
            created += 1;
        }
    }

    Ok(created)
}

fn write_png(img: &RgbaImage, path: &Path, what: &str) -> bool {
    match img.save(path) {
        Ok(()) => {
            log::info!("created placeholder for {}: {}", what, path.display());
            true
        }
        Err(e) => {
            log::warn!("could not write placeholder {}: {}", path.display(), e);
            false
        }
    }
}

fn open_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).wrap_err_with(|| format!("loading {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// Pixel area of a card: its inner cells (inside the border), two pixels
/// per cell vertically.
pub fn pixel_area(card: Size) -> (u32, u32) {
    (
        u32::from(card.width.saturating_sub(2)).max(1),
        u32::from(card.height.saturating_sub(2)).max(1) * 2,
    )
}

/// Decode the card back and every character, scaled for `card`.
/// Unreadable images are replaced by generated art.
pub fn load_roster(dir: &Path, roster: &[CharacterAsset], card: Size) -> (ArtBook, Roster) {
    let (w, h) = pixel_area(card);
    let mut book = ArtBook::default();

    let back_pixmap = match open_rgba(&dir.join(CARD_BACK_FILE)) {
        Ok(img) => Pixmap::stretch(&img, w, h),
        Err(e) => {
            log::warn!("card back unavailable, using fallback: {e:#}");
            Pixmap { image: fallback_back(w, h) }
        }
    };
    let back = book.push(back_pixmap);

    let characters = roster
        .iter()
        .map(|character| {
            let pixmap = match open_rgba(&dir.join(character.file)) {
                Ok(img) => Pixmap::fit(&img, w, h),
                Err(e) => {
                    log::warn!("{} image unavailable, using fallback: {e:#}", character.name);
                    Pixmap { image: fallback_front(character.name, w, h) }
                }
            };
            Character {
                name: character.name.to_string(),
                front: book.push(pixmap),
            }
        })
        .collect();

    (book, Roster { characters, back })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brawl-memory-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn name_color_is_stable_and_bright() {
        let a = name_color("Colt");
        assert_eq!(a, name_color("Colt"));
        assert!(a.iter().all(|&c| (55..=254).contains(&c)));
        assert_ne!(name_color("Colt"), name_color("Leon"));
    }

    #[test]
    fn fit_keeps_aspect_and_centers() {
        let wide = RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255]));
        let pm = Pixmap::fit(&wide, 12, 12);
        assert_eq!((pm.width(), pm.height()), (12, 12));
        // Letterboxed: top rows transparent, middle rows opaque.
        assert_eq!(pm.pixel(6, 0).unwrap()[3], 0);
        assert_eq!(pm.pixel(6, 6).unwrap()[3], 255);
        assert_eq!(pm.pixel(6, 11).unwrap()[3], 0);
        assert!(pm.pixel(12, 0).is_none());
    }

    #[test]
    fn card_back_has_star_and_border() {
        let img = card_back_image(150, 200);
        assert_eq!(img.get_pixel(75, 100).0[..3], STAR_YELLOW);
        assert_eq!(img.get_pixel(0, 0).0[..3], GOLD);
        assert_eq!(img.get_pixel(20, 20).0[..3], BRAWL_BLUE);
    }

    #[test]
    fn ensure_assets_creates_missing_files_once() {
        let dir = scratch_dir("ensure");
        let roster = &DEFAULT_ROSTER[..3];
        assert_eq!(ensure_assets(&dir, roster).unwrap(), 4);
        assert!(dir.join(CARD_BACK_FILE).exists());
        assert!(dir.join(roster[0].file).exists());
        assert_eq!(ensure_assets(&dir, roster).unwrap(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn ensure_assets_keeps_going_after_a_failed_write() {
        let dir = scratch_dir("partial");
        let roster = [
            CharacterAsset {
                name: "Nowhere",
                file: "no_such_dir/nowhere.png",
            },
            DEFAULT_ROSTER[0],
        ];
        assert_eq!(ensure_assets(&dir, &roster).unwrap(), 2);
        assert!(dir.join(CARD_BACK_FILE).exists());
        assert!(!dir.join(roster[0].file).exists());
        assert!(dir.join(roster[1].file).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_roster_falls_back_for_missing_images() {
        let dir = scratch_dir("fallback");
        fs::create_dir_all(&dir).unwrap();
        let card = Size::new(14, 8);
        let (book, roster) = load_roster(&dir, &DEFAULT_ROSTER[..2], card);

        assert_eq!(book.len(), 3);
        assert_eq!(roster.characters.len(), 2);
        assert_eq!(roster.characters[0].name, "Spacesuit");
        let front = book.get(roster.characters[0].front).unwrap();
        assert_eq!((front.width(), front.height()), pixel_area(card));
        // Black frame of the in-memory fallback.
        assert_eq!(front.pixel(0, 0).unwrap(), [0, 0, 0, 255]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_roster_reads_generated_placeholders() {
        let dir = scratch_dir("load");
        let roster = &DEFAULT_ROSTER[..1];
        ensure_assets(&dir, roster).unwrap();
        let (book, loaded) = load_roster(&dir, roster, Size::new(14, 8));
        let front = book.get(loaded.characters[0].front).unwrap();
        let center = front.pixel(front.width() / 2, front.height() / 2).unwrap();
        let expected = name_color(roster[0].name);
        for (got, want) in center[..3].iter().zip(expected) {
            assert!(got.abs_diff(want) <= 2, "{center:?} vs {expected:?}");
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
