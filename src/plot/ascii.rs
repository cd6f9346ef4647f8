//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each column of the table gets its own glyph, used for both its line and
//! its points. A missing value breaks the line. Columns drawn earlier win
//! where lines cross.

use crate::domain::{SeriesTable, date_ordinal};

const GLYPHS: [char; 12] = ['*', '+', 'o', 'x', '#', '@', '%', '&', '=', '~', '^', '$'];

pub fn glyph(index: usize) -> char {
    GLYPHS[index % GLYPHS.len()]
}

/// Render every column of `table` as a line chart.
pub fn render_ascii_chart(table: &SeriesTable, width: usize, height: usize, unit: Option<&str>) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (table.dates.first(), table.dates.last()) else {
        return "(no data)\n".to_string();
    };
    let Some((y_min, y_max)) = table.value_bounds() else {
        return "(no data)\n".to_string();
    };

    let (mut t_min, mut t_max) = (date_ordinal(*first), date_ordinal(*last));
    if t_max <= t_min {
        t_min -= 1.0;
        t_max += 1.0;
    }
    let (y_min, y_max) = if y_max > y_min { pad_range(y_min, y_max, 0.05) } else { (y_min - 1.0, y_max + 1.0) };

    let mut grid = vec![vec![' '; width]; height];
    let xs: Vec<f64> = table.dates.iter().map(|d| date_ordinal(*d)).collect();

    for (idx, column) in table.columns.iter().enumerate() {
        let ch = glyph(idx);
        let mut prev: Option<(usize, usize)> = None;
        for (x, value) in xs.iter().zip(&column.values) {
            let Some(v) = value else {
                prev = None;
                continue;
            };
            let px = map_x(*x, t_min, t_max, width);
            let py = map_y(*v, y_min, y_max, height);
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, px, py, ch),
                None => {
                    if grid[py][px] == ' ' {
                        grid[py][px] = ch;
                    }
                }
            }
            prev = Some((px, py));
        }
    }

    let unit = unit.map(|u| format!(" {u}")).unwrap_or_default();
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {first}..{last} | y=[{y_min:.2}, {y_max:.2}]{unit}\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}", glyph(i), c.label))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Column;
    use chrono::NaiveDate;

    fn table(columns: Vec<Column>, months: u32) -> SeriesTable {
        SeriesTable {
            dates: (1..=months)
                .map(|m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap())
                .collect(),
            periods: (1..=months).map(|m| format!("2023-{m:02}")).collect(),
            columns,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let t = table(
            vec![Column {
                label: "London".to_string(),
                values: vec![Some(1.0), Some(2.0)],
            }],
            2,
        );

        let txt = render_ascii_chart(&t, 10, 5, Some("%"));
        let expected = concat!(
            "Plot: 2023-01-01..2023-02-01 | y=[0.95, 2.05] %\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
            "Legend: * London\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn missing_values_break_the_line() {
        let t = table(
            vec![Column {
                label: "Wales".to_string(),
                values: vec![Some(1.0), None, Some(1.0)],
            }],
            3,
        );
        let txt = render_ascii_chart(&t, 11, 5, None);
        let rows: Vec<&str> = txt.lines().collect();
        // Flat series sits mid-grid; only the two endpoints are drawn.
        let drawn: usize = rows[1..6].iter().map(|r| r.matches('*').count()).sum();
        assert_eq!(drawn, 2);
    }

    #[test]
    fn each_column_gets_its_own_glyph() {
        let t = table(
            vec![
                Column {
                    label: "16-24".to_string(),
                    values: vec![Some(10.0), Some(11.0)],
                },
                Column {
                    label: "50+".to_string(),
                    values: vec![Some(3.0), Some(3.5)],
                },
            ],
            2,
        );
        let txt = render_ascii_chart(&t, 20, 8, None);
        assert!(txt.contains('*'));
        assert!(txt.contains('+'));
        assert!(txt.ends_with("Legend: * 16-24  + 50+\n"));
    }

    #[test]
    fn empty_table_renders_placeholder() {
        assert_eq!(render_ascii_chart(&SeriesTable::default(), 10, 5, None), "(no data)\n");
        let all_missing = table(
            vec![Column {
                label: "x".to_string(),
                values: vec![None],
            }],
            1,
        );
        assert_eq!(render_ascii_chart(&all_missing, 10, 5, None), "(no data)\n");
    }
}
