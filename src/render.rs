//! Two panel drawing of a [`BoardView`]: COP board on the left, force grid on the right.

use crate::output::board::{BoardView, BOARD_HEIGHT_CM, BOARD_WIDTH_CM};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// Space around the board outline in cm.
const BOARD_MARGIN_CM: f64 = 5.0;

const BOARD_FILL: RGBColor = RGBColor(211, 211, 211);
const COP_OUTLINE: RGBColor = RGBColor(139, 0, 0);
const LABEL_FILL: RGBColor = RGBColor(245, 222, 179);

/// Dash and gap length of the zero lines in pixels.
const DASH_PX: i32 = 6;
const GAP_PX: i32 = 4;

/// Lower left corner of each force cell, in the order of `BoardView::cells`.
const CELL_ORIGINS: [(f64, f64); 4] = [(0.0, 1.0), (1.0, 1.0), (0.0, 0.0), (1.0, 0.0)];
const CELL_COLORS: [RGBColor; 4] = [GREEN, RED, BLUE, MAGENTA];

/// Render the view into a PNG file, replacing the previous frame.
pub fn render_png(view: &BoardView, path: &Path, size: (u32, u32)) -> anyhow::Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw(&root, view)?;
    root.present()?;
    Ok(())
}

/// Draw both panels onto any plotters backend.
pub fn draw<DB>(root: &DrawingArea<DB, Shift>, view: &BoardView) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    draw_cop_panel(&panels[0], view)?;
    draw_force_panel(&panels[1], view)?;
    Ok(())
}

fn centered(size: i32) -> TextStyle<'static> {
    ("sans-serif", size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_cop_panel<DB>(area: &DrawingArea<DB, Shift>, view: &BoardView) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (half_w, half_h) = (BOARD_WIDTH_CM / 2.0, BOARD_HEIGHT_CM / 2.0);
    let (x_max, y_max) = (half_w + BOARD_MARGIN_CM, half_h + BOARD_MARGIN_CM);

    let mut chart = ChartBuilder::on(area)
        .caption("Center of Pressure", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-x_max..x_max, -y_max..y_max)?;

    chart
        .configure_mesh()
        .x_desc("X (cm)")
        .y_desc("Y (cm)")
        .light_line_style(WHITE.mix(0.7))
        .draw()?;

    let outline = [(-half_w, -half_h), (half_w, half_h)];
    chart.draw_series(std::iter::once(Rectangle::new(
        outline,
        BOARD_FILL.mix(0.3).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        outline,
        ShapeStyle::from(&BLACK).stroke_width(3),
    )))?;

    draw_zero_lines(&mut chart, x_max, y_max)?;

    if !view.trail.is_empty() {
        chart.draw_series(LineSeries::new(
            view.trail.iter().copied(),
            BLUE.mix(0.5).stroke_width(2),
        ))?;
    }

    chart.draw_series(std::iter::once(Circle::new(
        view.cop,
        10,
        RED.mix(0.9).filled(),
    )))?;
    chart.draw_series(std::iter::once(Circle::new(
        view.cop,
        10,
        ShapeStyle::from(&COP_OUTLINE).stroke_width(2),
    )))?;

    area.draw(&Rectangle::new(
        [(60, 40), (270, 68)],
        LABEL_FILL.mix(0.8).filled(),
    ))?;
    area.draw(&Text::new(
        view.cop_label(),
        (66, 46),
        ("sans-serif", 18).into_font().color(&BLACK),
    ))?;

    Ok(())
}

fn draw_zero_lines<DB>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x_max: f64,
    y_max: f64,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    for segment in [[(-x_max, 0.0), (x_max, 0.0)], [(0.0, -y_max), (0.0, y_max)]] {
        chart.draw_series(DashedLineSeries::new(
            segment,
            DASH_PX,
            GAP_PX,
            BLACK.mix(0.3).stroke_width(1),
        ))?;
    }
    Ok(())
}

fn draw_force_panel<DB>(area: &DrawingArea<DB, Shift>, view: &BoardView) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .caption("Force Sensors", ("sans-serif", 24))
        .margin(20)
        .build_cartesian_2d(0.0..2.0, -0.3..2.0)?;

    for (i, cell) in view.cells.iter().enumerate() {
        let (x, y) = CELL_ORIGINS[i];
        let rect = [(x + 0.05, y + 0.05), (x + 0.95, y + 0.95)];

        chart.draw_series(std::iter::once(Rectangle::new(
            rect,
            CELL_COLORS[i].mix(cell.opacity).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            rect,
            ShapeStyle::from(&BLACK).stroke_width(2),
        )))?;
        chart.draw_series([
            Text::new(cell.name.to_string(), (x + 0.5, y + 0.75), centered(26)),
            Text::new(cell.force_label(), (x + 0.5, y + 0.5), centered(22)),
            Text::new(cell.percent_label(), (x + 0.5, y + 0.25), centered(18)),
        ])?;
    }

    chart.draw_series(std::iter::once(Rectangle::new(
        [(0.7, -0.25), (1.3, -0.05)],
        YELLOW.mix(0.7).filled(),
    )))?;
    chart.draw_series(std::iter::once(Text::new(
        view.total_label(),
        (1.0, -0.15),
        centered(22),
    )))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::draw_zero_lines;
    use plotters::prelude::*;

    #[test]
    fn test_zero_lines_are_dashed() {
        let (w, h) = (200u32, 100u32);
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        let (row, span) = {
            let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            let mut chart = ChartBuilder::on(&root)
                .build_cartesian_2d(-35.0..35.0, -27.5..27.5)
                .unwrap();
            draw_zero_lines(&mut chart, 35.0, 27.5).unwrap();
            // Stay clear of the vertical line at x = 0.
            let (left, row) = chart.backend_coord(&(-30.0, 0.0));
            let (right, _) = chart.backend_coord(&(-5.0, 0.0));
            root.present().unwrap();
            (row, left..right)
        };

        let white: Vec<bool> = span
            .map(|x| buffer[((row as u32 * w + x as u32) * 3) as usize] == 255)
            .collect();
        assert!(white.len() > 2 * (super::DASH_PX + super::GAP_PX) as usize);
        assert!(white.iter().any(|px| *px), "line has no gaps");
        assert!(white.iter().any(|px| !*px), "line was not drawn");
    }
}
