use platformer_engine::{
    EntityKind, EntitySprite, PowerUpKind, RenderSink, TileKind, TileSprite, Viewport,
};

const EMPTY_CELL: char = '.';

/// Character-grid render target: one cell per `cell_size` square of screen space.
#[derive(Debug, Clone)]
pub(crate) struct AsciiFrame {
    columns: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<char>,
}

impl AsciiFrame {
    pub(crate) fn new(viewport: Viewport, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let columns = (viewport.width / cell_size).ceil().max(0.0) as usize;
        let rows = (viewport.height / cell_size).ceil().max(0.0) as usize;
        Self {
            columns,
            rows,
            cell_size,
            cells: vec![EMPTY_CELL; columns * rows],
        }
    }

    pub(crate) fn cell(&self, column: usize, row: usize) -> Option<char> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + column).copied()
    }

    pub(crate) fn to_text(&self) -> String {
        self.cells
            .chunks(self.columns.max(1))
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, glyph: char) {
        let Some((first_column, last_column)) = self.cell_span(x, width, self.columns) else {
            return;
        };
        let Some((first_row, last_row)) = self.cell_span(y, height, self.rows) else {
            return;
        };
        for row in first_row..=last_row {
            for column in first_column..=last_column {
                self.cells[row * self.columns + column] = glyph;
            }
        }
    }

    fn cell_span(&self, start: f32, length: f32, count: usize) -> Option<(usize, usize)> {
        if count == 0 || length <= 0.0 {
            return None;
        }
        let first = (start / self.cell_size).floor().max(0.0);
        let last = ((start + length) / self.cell_size).ceil() - 1.0;
        let last = last.min(count as f32 - 1.0);
        if last < first {
            return None;
        }
        Some((first as usize, last as usize))
    }
}

fn tile_glyph(kind: TileKind) -> Option<char> {
    match kind {
        TileKind::Solid => Some('#'),
        TileKind::Passthrough => Some('='),
        TileKind::Air => None,
    }
}

fn entity_glyph(kind: EntityKind) -> char {
    match kind {
        EntityKind::Hero => 'H',
        EntityKind::Enemy => 'E',
        EntityKind::PowerUp(PowerUpKind::Heart) => 'h',
        EntityKind::PowerUp(PowerUpKind::Invincibility) => 'i',
        EntityKind::PowerUp(PowerUpKind::Speed) => 's',
        EntityKind::PowerUp(PowerUpKind::DoubleJump) => 'd',
        EntityKind::PowerUp(PowerUpKind::Unknown) => '?',
    }
}

impl RenderSink for AsciiFrame {
    fn draw_tile(&mut self, sprite: TileSprite) {
        if let Some(glyph) = tile_glyph(sprite.kind) {
            self.fill(
                sprite.screen.x,
                sprite.screen.y,
                sprite.width,
                sprite.height,
                glyph,
            );
        }
    }

    fn draw_entity(&mut self, sprite: EntitySprite) {
        self.fill(
            sprite.screen.x,
            sprite.screen.y,
            sprite.width,
            sprite.height,
            entity_glyph(sprite.kind),
        );
    }
}
