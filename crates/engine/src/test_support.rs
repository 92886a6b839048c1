use crate::level::{Level, LevelData, DEFAULT_TILE_SIZE};

/// Builds a level from ASCII rows: `#` solid, `=` passthrough, anything else air.
pub(crate) fn level_from_rows(rows: &[&str]) -> Level {
    let height = rows.len() as u32;
    let width = rows.first().map(|row| row.len()).unwrap_or(0) as u32;
    let data = rows
        .iter()
        .flat_map(|row| {
            row.chars().map(|cell| match cell {
                '#' => 1,
                '=' => 2,
                _ => 0,
            })
        })
        .collect();
    Level::from_data(
        &LevelData {
            width,
            height,
            data,
            name: "rows".to_string(),
            enemies: Vec::new(),
            power_ups: Vec::new(),
        },
        DEFAULT_TILE_SIZE,
    )
    .expect("level")
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= 1e-3,
        "{actual} vs {expected}"
    );
}
