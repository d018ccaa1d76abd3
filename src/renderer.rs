use std::time::Instant;

use color_eyre::eyre::{Result, WrapErr};
use ratatui::DefaultTerminal;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};

use crate::assets::{ArtBook, Pixmap};
use crate::board::format_clock;
use crate::card::{Card, Size};
use crate::difficulty::{COUNT_ROW, DifficultySelector};
use crate::game::{Mode, Screen, Session};
use crate::match_game::{MatchGameManager, Phase, TARGET_TOP};
use crate::memory::GameManager;
use crate::menu::{Button, MODE_DESCRIPTIONS, PORTAL_SUBTITLE, PORTAL_TITLE, Portal};

/// Trait that abstracts the drawing surface, so the game loop can run
/// against a real terminal or a test double.
pub trait Renderer {
    /// Current drawable size in cells.
    fn size(&self) -> Result<Size>;
    /// Draw one frame of the current screen.
    fn render(&mut self, screen: &Screen, art: &ArtBook, now: Instant) -> Result<()>;
}

// ---------------------------------------------------------------------------
// TUI Renderer
// ---------------------------------------------------------------------------

/// Full-screen ratatui renderer.
pub struct TuiRenderer {
    terminal: DefaultTerminal,
}

impl TuiRenderer {
    pub fn new(terminal: DefaultTerminal) -> Self {
        TuiRenderer { terminal }
    }
}

impl Renderer for TuiRenderer {
    fn size(&self) -> Result<Size> {
        let size = self.terminal.size().wrap_err("querying terminal size")?;
        Ok(Size::new(size.width, size.height))
    }

    fn render(&mut self, screen: &Screen, art: &ArtBook, now: Instant) -> Result<()> {
        self.terminal
            .draw(|frame| draw_screen(frame, screen, art, now))
            .wrap_err("drawing frame")?;
        Ok(())
    }
}

const TABLE_GREEN: Color = Color::Rgb(0, 128, 0);
const MENU_BLUE: Color = Color::Rgb(30, 30, 70);
const TEXT: Color = Color::Rgb(255, 255, 255);
const DIM_TEXT: Color = Color::Rgb(200, 200, 200);
const HIGHLIGHT: Color = Color::Rgb(255, 255, 0);
const BAR_EMPTY: Color = Color::Rgb(50, 50, 50);

pub fn draw_screen(frame: &mut Frame, screen: &Screen, art: &ArtBook, now: Instant) {
    match screen {
        Screen::Portal(portal) => draw_portal(frame, portal),
        Screen::Difficulty { mode, selector } => draw_difficulty(frame, *mode, selector),
        Screen::Playing(Session::Memory(gm)) => draw_memory(frame, gm, art, now),
        Screen::Playing(Session::Match(mm)) => draw_match(frame, mm, art, now),
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// The visible part of `rect`, or `None` when it is entirely off screen.
fn clip(frame: &Frame, rect: Rect) -> Option<Rect> {
    let visible = rect.intersection(frame.area());
    (!visible.is_empty()).then_some(visible)
}

fn fill_background(frame: &mut Frame, color: Color) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(color)), area);
}

fn text_at(frame: &mut Frame, text: &str, row: u16, style: Style) {
    let area = frame.area();
    if row >= area.height {
        return;
    }
    let line = Rect::new(area.x, area.y + row, area.width, 1);
    frame.render_widget(
        Paragraph::new(Line::styled(text.to_string(), style)).alignment(Alignment::Center),
        line,
    );
}

fn hud(frame: &mut Frame, lines: &[String]) {
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) as u16 + 2;
    let rect = Rect::new(0, 0, width, lines.len() as u16);
    let Some(rect) = clip(frame, rect) else { return };
    let text: Vec<Line> = lines.iter().map(|l| Line::from(format!(" {}", l))).collect();
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD)),
        rect,
    );
}

fn draw_button(frame: &mut Frame, button: &Button) {
    let Some(rect) = clip(frame, button.rect) else { return };
    let border = if button.hovered { TEXT } else { DIM_TEXT };
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(button.fill()));
    frame.render_widget(
        Paragraph::new(button.label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
            .block(block),
        rect,
    );
}

/// Horizontal countdown bar; `ratio` of the width is filled.
fn draw_bar(frame: &mut Frame, rect: Rect, ratio: f64, fill: Color, ticks: bool) {
    let Some(rect) = clip(frame, rect) else { return };
    let filled = (f64::from(rect.width) * ratio.clamp(0.0, 1.0)).round() as u16;
    let tick_every = (rect.width / 10).max(1);
    let buf = frame.buffer_mut();
    for dx in 0..rect.width {
        for dy in 0..rect.height {
            let Some(cell) = buf.cell_mut((rect.x + dx, rect.y + dy)) else { continue };
            cell.set_char(' ')
                .set_bg(if dx < filled { fill } else { BAR_EMPTY });
            if ticks && dx > 0 && dx % tick_every == 0 && dx / tick_every < 10 {
                cell.set_char('┊').set_fg(DIM_TEXT);
            }
        }
    }
}

/// Centered framed panel over the board.
fn panel(frame: &mut Frame, lines: Vec<Line<'static>>) {
    let screen = frame.area();
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 6;
    let height = lines.len() as u16 + 2;
    let rect = Rect::new(
        screen.width.saturating_sub(width) / 2,
        screen.height.saturating_sub(height) / 2,
        width,
        height,
    );
    let Some(rect) = clip(frame, rect) else { return };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::bordered()
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(TEXT))
                .style(Style::default().bg(Color::Black).fg(TEXT)),
        ),
        rect,
    );
}

/// Darken everything already drawn, standing in for a translucent overlay.
fn dim_frame(frame: &mut Frame) {
    let area = frame.area();
    let buf = frame.buffer_mut();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                let fg = darken(cell.fg);
                let bg = darken(cell.bg);
                cell.set_fg(fg).set_bg(bg);
            }
        }
    }
}

fn darken(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(r / 2, g / 2, b / 2),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Draws a pixmap two pixels per cell with upper-half blocks, resampled to
/// the area it is given.
struct PixmapWidget<'a> {
    pixmap: &'a Pixmap,
    backdrop: [u8; 3],
    faded: bool,
}

impl PixmapWidget<'_> {
    fn color(&self, x: u32, y: u32) -> Color {
        let [r, g, b, a] = self.pixmap.pixel(x, y).unwrap_or([0, 0, 0, 0]);
        let alpha = if self.faded { u16::from(a) / 2 } else { u16::from(a) };
        let mix = |c: u8, under: u8| {
            ((u16::from(c) * alpha + u16::from(under) * (255 - alpha)) / 255) as u8
        };
        Color::Rgb(mix(r, self.backdrop[0]), mix(g, self.backdrop[1]), mix(b, self.backdrop[2]))
    }
}

impl Widget for PixmapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cols, rows) = (u32::from(area.width), u32::from(area.height) * 2);
        if cols == 0 || rows == 0 {
            return;
        }
        let (src_w, src_h) = (self.pixmap.width(), self.pixmap.height());
        // Nearest pixel of the source for destination column `x`, row `y`.
        let sample = |x: u32, y: u32| self.color(x * src_w / cols, y * src_h / rows);

        let visible = area.intersection(buf.area);
        for y in visible.top()..visible.bottom() {
            for x in visible.left()..visible.right() {
                let (dx, dy) = (u32::from(x - area.x), u32::from(y - area.y));
                let top = sample(dx, dy * 2);
                let bottom = sample(dx, dy * 2 + 1);
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char('▀').set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

fn draw_card(frame: &mut Frame, card: &Card, art: &ArtBook, outline: Option<Color>) {
    let Some(rect) = clip(frame, card.rect()) else { return };
    let face_up = card.face_up();

    let border = outline.unwrap_or(if card.matched {
        Color::Rgb(120, 120, 120)
    } else if face_up {
        TEXT
    } else {
        Color::Rgb(255, 204, 0)
    });
    let mut block = Block::new()
        .borders(Borders::ALL)
        .border_type(if outline.is_some() { BorderType::Thick } else { BorderType::Rounded })
        .border_style(Style::default().fg(border).bg(TABLE_GREEN));
    if face_up {
        block = block.title_bottom(Line::from(card.name.clone()).centered());
    }
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let id = if face_up { card.front } else { card.back };
    if let Some(pixmap) = art.get(id) {
        frame.render_widget(
            PixmapWidget {
                pixmap,
                backdrop: [0, 128, 0],
                faded: card.matched,
            },
            inner,
        );
    }
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

fn draw_portal(frame: &mut Frame, portal: &Portal) {
    fill_background(frame, MENU_BLUE);
    text_at(frame, PORTAL_TITLE, 2, Style::default().fg(TEXT).add_modifier(Modifier::BOLD));
    text_at(frame, PORTAL_SUBTITLE, 4, Style::default().fg(DIM_TEXT));
    for (button, _) in &portal.buttons {
        draw_button(frame, button);
    }
    let top = portal.descriptions_top();
    for (i, desc) in MODE_DESCRIPTIONS.iter().enumerate() {
        text_at(frame, desc, top + i as u16, Style::default().fg(DIM_TEXT));
    }
    footer(frame, "↑/↓ select · Enter start · 1/2 quick start · Esc exit");
}

fn draw_difficulty(frame: &mut Frame, mode: Mode, sel: &DifficultySelector) {
    fill_background(frame, MENU_BLUE);
    text_at(frame, mode.title(), 0, Style::default().fg(DIM_TEXT));
    text_at(frame, "Game Difficulty", 2, Style::default().fg(TEXT).add_modifier(Modifier::BOLD));
    let prompt = Style::default().fg(Color::Rgb(220, 220, 220));
    text_at(frame, "Select number of characters:", 4, prompt);
    let label = Style::default().fg(sel.label_color()).add_modifier(Modifier::BOLD);
    text_at(frame, sel.label(), 6, label);
    text_at(
        frame,
        &sel.selected.to_string(),
        COUNT_ROW,
        Style::default().fg(Color::Rgb(255, 255, 100)).add_modifier(Modifier::BOLD),
    );
    text_at(frame, sel.description(), COUNT_ROW + 3, Style::default().fg(DIM_TEXT));

    for button in [&sel.decrement, &sel.increment, &sel.confirm, &sel.back] {
        draw_button(frame, button);
    }
    draw_difficulty_decorations(frame, sel);
    footer(frame, "←/→ change · Enter start · Esc back");
}

/// Side bars sized by the count, and one card icon per character.
fn draw_difficulty_decorations(frame: &mut Frame, sel: &DifficultySelector) {
    let screen = frame.area();
    let bar_height = 2 * sel.selected as u16;
    let bar_y = screen.height.saturating_sub(bar_height) / 2;
    let bar_x = screen.width / 8;
    for x in [bar_x, screen.width.saturating_sub(bar_x + 2)] {
        if let Some(rect) = clip(frame, Rect::new(x, bar_y, 2, bar_height)) {
            frame.render_widget(
                Block::default().style(Style::default().bg(Color::Rgb(50, 100, 200))),
                rect,
            );
        }
    }

    let icons = sel.selected as u16;
    let spacing = 4;
    let start_x = screen.width.saturating_sub(icons * spacing) / 2;
    let y = screen.height.saturating_sub(4);
    for i in 0..icons {
        if let Some(rect) = clip(frame, Rect::new(start_x + i * spacing, y, 3, 2)) {
            frame.render_widget(
                Block::default().style(Style::default().bg(Color::Rgb(50, 50, 200)).fg(TEXT)),
                rect,
            );
        }
    }
}

/// Covers a board that cannot fit on screen.
fn too_small(frame: &mut Frame, needed: Size) {
    let area = frame.area();
    let sizes = format!(
        "needs {}x{}, have {}x{}",
        needed.width, needed.height, area.width, area.height
    );
    panel(
        frame,
        vec![
            Line::styled("Terminal too small", Style::default().add_modifier(Modifier::BOLD)),
            Line::from(sizes),
            Line::from("Resize the window or press Esc"),
        ],
    );
}

fn footer(frame: &mut Frame, text: &str) {
    let row = frame.area().height.saturating_sub(1);
    text_at(frame, text, row, Style::default().fg(Color::Rgb(150, 150, 150)));
}

fn draw_memory(frame: &mut Frame, gm: &GameManager, art: &ArtBook, now: Instant) {
    fill_background(frame, TABLE_GREEN);

    let mismatched = gm.mismatched();
    for (i, card) in gm.cards.iter().enumerate() {
        let outline = mismatched
            .filter(|&(a, b)| i == a || i == b)
            .map(|_| Color::Rgb(255, 0, 0));
        draw_card(frame, card, art, outline);
    }

    if let Some(ratio) = gm.mismatch_remaining(now) {
        let screen = frame.area();
        let width = 30;
        let rect = Rect::new(screen.width.saturating_sub(width) / 2, 1, width, 1);
        draw_bar(frame, rect, ratio, Color::Rgb(255, 0, 0), true);
        // Clock face whose hand sweeps as the delay runs out.
        let faces = ['◴', '◷', '◶', '◵'];
        let hand = (((1.0 - ratio) * 4.0) as usize).min(3);
        if rect.x >= 3 {
            let clock = Rect::new(rect.x - 3, 1, 2, 1);
            if let Some(clock) = clip(frame, clock) {
                frame.render_widget(
                    Paragraph::new(faces[hand].to_string())
                        .style(Style::default().fg(Color::Rgb(250, 250, 150))),
                    clock,
                );
            }
        }
    }

    let time = format_clock(gm.elapsed(now));
    hud(
        frame,
        &[
            format!("Score: {}/{}", gm.score(), gm.pairs()),
            format!("Time: {}", time),
            format!("Attempts: {}", gm.attempts()),
        ],
    );

    if let Some(needed) = gm.required_screen() {
        dim_frame(frame);
        too_small(frame, needed);
    } else if gm.is_game_over() {
        dim_frame(frame);
        panel(
            frame,
            vec![
                Line::styled("Game Over!", Style::default().add_modifier(Modifier::BOLD)),
                Line::from(""),
                Line::from(format!("Time: {}", time)),
                Line::from(format!("Attempts: {}", gm.attempts())),
                Line::from(""),
                Line::from("Press 'R' to play again"),
                Line::from("Press 'M' to return to difficulty selection"),
            ],
        );
    } else {
        footer(frame, "Click cards to flip · Esc difficulty · Ctrl-C quit");
    }
}

fn draw_match(frame: &mut Frame, mm: &MatchGameManager, art: &ArtBook, now: Instant) {
    fill_background(frame, TABLE_GREEN);

    for card in &mm.cards {
        draw_card(frame, card, art, None);
    }

    match mm.phase() {
        Phase::Playing | Phase::ShowingResult => {
            if let Some(target) = mm.target() {
                draw_card(frame, target, art, Some(HIGHLIGHT));
                text_at(
                    frame,
                    "Find this card!",
                    TARGET_TOP.saturating_sub(1),
                    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
                );
            }
        }
        Phase::Preview => {
            if let Some((left, ratio)) = mm.preview_remaining(now) {
                text_at(
                    frame,
                    &format!("Memorize the cards! {}s", left.as_secs()),
                    1,
                    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD),
                );
                let screen = frame.area();
                let width = 40;
                let rect = Rect::new(screen.width.saturating_sub(width) / 2, 2, width, 1);
                draw_bar(frame, rect, ratio, Color::Rgb(0, 255, 0), false);
            }
        }
        Phase::GameOver => {}
    }

    if mm.phase() == Phase::ShowingResult {
        let (text, color) = if mm.last_correct() {
            ("CORRECT!", Color::Rgb(0, 255, 0))
        } else {
            ("WRONG!", Color::Rgb(255, 0, 0))
        };
        let screen = frame.area();
        let width = text.len() as u16 + 8;
        let rect = Rect::new(screen.width.saturating_sub(width) / 2, screen.height / 2, width, 3);
        if let Some(rect) = clip(frame, rect) {
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(color).bg(Color::Black).add_modifier(Modifier::BOLD))
                    .block(
                        Block::bordered()
                            .border_style(Style::default().fg(color).bg(Color::Black)),
                    ),
                rect,
            );
        }
    }

    let time = format_clock(mm.elapsed(now));
    hud(
        frame,
        &[
            format!("Score: {}/{}", mm.score(), mm.total_rounds()),
            format!("Time: {}", time),
            format!("Round: {}/{}", mm.total_rounds(), mm.rounds()),
        ],
    );

    if let Some(needed) = mm.required_screen() {
        dim_frame(frame);
        too_small(frame, needed);
    } else if mm.is_game_over() {
        dim_frame(frame);
        panel(
            frame,
            vec![
                Line::styled("Game Over!", Style::default().add_modifier(Modifier::BOLD)),
                Line::from(""),
                Line::from(format!("Time: {}", time)),
                Line::from(format!("Score: {}/{}", mm.score(), mm.total_rounds())),
                Line::from(format!("Accuracy: {}%", mm.accuracy())),
                Line::from(""),
                Line::from("Press 'R' to play again"),
                Line::from("Press 'M' to return to difficulty selection"),
            ],
        );
    } else {
        footer(frame, "Click the matching card · Esc difficulty · Ctrl-C quit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::roster;
    use crate::config::Config;
    use image::{Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn art() -> ArtBook {
        let mut book = ArtBook::default();
        for i in 0..11u8 {
            let img = RgbaImage::from_pixel(12, 12, Rgba([i * 20, 100, 50, 255]));
            book.push(Pixmap::fit(&img, 12, 12));
        }
        book
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render(screen: &Screen, now: Instant) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 44)).unwrap();
        let book = art();
        terminal.draw(|f| draw_screen(f, screen, &book, now)).unwrap();
        screen_text(&terminal)
    }

    #[test]
    fn portal_shows_modes() {
        let text = render(&Screen::Portal(Portal::new(Size::new(100, 44))), Instant::now());
        assert!(text.contains("Brawl Stars Games"));
        assert!(text.contains("Memory Card Game"));
        assert!(text.contains("Match Card Challenge"));
        assert!(text.contains("Exit"));
    }

    #[test]
    fn difficulty_shows_label_and_count() {
        let screen = Screen::Difficulty {
            mode: Mode::Match,
            selector: DifficultySelector::new(Size::new(100, 44), 5, 10),
        };
        let text = render(&screen, Instant::now());
        assert!(text.contains("Game Difficulty"));
        assert!(text.contains("Easy"));
        assert!(text.contains("Fewer characters"));
    }

    #[test]
    fn memory_hud_and_backs() {
        let now = Instant::now();
        let gm = GameManager::new(
            roster(10),
            5,
            Size::new(100, 44),
            &Config::default(),
            SmallRng::seed_from_u64(1),
            now,
        );
        let text = render(&Screen::Playing(Session::Memory(gm)), now);
        assert!(text.contains("Score: 0/5"));
        assert!(text.contains("Time: 00:00"));
        assert!(text.contains("Attempts: 0"));
        assert!(text.contains('▀'));
        assert!(!text.contains("Brawler"), "names stay hidden face down");
    }

    #[test]
    fn match_preview_shows_countdown_and_names() {
        let now = Instant::now();
        let mm = MatchGameManager::new(
            roster(10),
            5,
            Size::new(100, 44),
            &Config::default(),
            SmallRng::seed_from_u64(1),
            now,
        );
        let text = render(&Screen::Playing(Session::Match(mm)), now);
        assert!(text.contains("Memorize the cards! 5s"));
        assert!(text.contains("Round: 0/10"));
        assert!(text.contains("Brawler"));
    }

    #[test]
    fn offscreen_cards_do_not_panic() {
        let now = Instant::now();
        let gm = GameManager::new(
            roster(10),
            10,
            Size::new(100, 44),
            &Config::default(),
            SmallRng::seed_from_u64(1),
            now,
        );
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        let book = art();
        let screen = Screen::Playing(Session::Memory(gm));
        terminal.draw(|f| draw_screen(f, &screen, &book, now)).unwrap();
    }

    #[test]
    fn board_too_big_for_terminal_says_so() {
        let now = Instant::now();
        let gm = GameManager::new(
            roster(10),
            10,
            Size::new(30, 10),
            &Config::default(),
            SmallRng::seed_from_u64(1),
            now,
        );
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let book = art();
        let screen = Screen::Playing(Session::Memory(gm));
        terminal.draw(|f| draw_screen(f, &screen, &book, now)).unwrap();
        assert!(screen_text(&terminal).contains("Terminal too small"));
    }

    #[test]
    fn full_memory_board_draws_on_a_standard_terminal() {
        let now = Instant::now();
        let gm = GameManager::new(
            roster(10),
            10,
            Size::new(80, 24),
            &Config::default(),
            SmallRng::seed_from_u64(1),
            now,
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let book = art();
        let screen = Screen::Playing(Session::Memory(gm));
        terminal.draw(|f| draw_screen(f, &screen, &book, now)).unwrap();
        let text = screen_text(&terminal);
        assert!(!text.contains("Terminal too small"));
        assert!(text.contains("Score: 0/10"));
    }

    #[test]
    fn pixmap_is_resampled_to_the_card() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        for x in 0..4 {
            for y in 2..4 {
                img.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let pixmap = Pixmap::fit(&img, 4, 4);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        PixmapWidget {
            pixmap: &pixmap,
            backdrop: [0, 0, 0],
            faded: false,
        }
        .render(area, &mut buf);
        for x in 0..2 {
            assert_eq!(buf[(x, 0)].fg, Color::Rgb(255, 0, 0));
            assert_eq!(buf[(x, 0)].bg, Color::Rgb(0, 0, 255));
        }
    }
}
