//! Screen-space panels drawn on top of the map: the legend and text boxes.

use gtk4::{
    cairo::{Context, Error, FontSlant, FontWeight},
    prelude::WidgetExt,
    DrawingArea,
};

use crate::{
    colormap::Rgb,
    geometry::FocusRange,
    legend::LegendEntry,
    window::Layer,
};

const FONT_SIZE: f64 = 13.0;
const LINE_HEIGHT: f64 = 18.0;
const PADDING: f64 = 8.0;
const MARGIN: f64 = 10.0;
const SWATCH_SIZE: f64 = 14.0;

fn set_font(cr: &Context, weight: FontWeight) {
    cr.select_font_face("Sans", FontSlant::Normal, weight);
    cr.set_font_size(FONT_SIZE);
}

fn text_width(cr: &Context, text: &str) -> Result<f64, Error> {
    Ok(cr.text_extents(text)?.x_advance())
}

/// Size of the box [`draw_text_box`] would draw for `lines`.
pub fn measure_text_box(cr: &Context, lines: &[String]) -> Result<(f64, f64), Error> {
    set_font(cr, FontWeight::Bold);
    let mut width: f64 = 0.0;
    for line in lines {
        width = width.max(text_width(cr, line)?);
    }
    Ok((
        width + PADDING * 2.0,
        lines.len() as f64 * LINE_HEIGHT + PADDING * 2.0,
    ))
}

/// Draws `lines` in a white box with its top-left corner at (`x`, `y`). The
/// first line is bold and empty lines leave a gap.
pub fn draw_text_box(cr: &Context, x: f64, y: f64, lines: &[String]) -> Result<(), Error> {
    let (width, height) = measure_text_box(cr, lines)?;
    fill_panel(cr, x, y, width, height)?;

    cr.set_source_rgb(0.1, 0.1, 0.1);
    for (i, line) in lines.iter().enumerate() {
        set_font(
            cr,
            if i == 0 {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            },
        );
        cr.move_to(x + PADDING, y + PADDING + (i as f64 + 0.75) * LINE_HEIGHT);
        cr.show_text(line)?;
    }
    Ok(())
}

fn fill_panel(cr: &Context, x: f64, y: f64, width: f64, height: f64) -> Result<(), Error> {
    cr.set_source_rgba(1.0, 1.0, 1.0, 0.9);
    cr.rectangle(x, y, width, height);
    cr.fill_preserve()?;
    cr.set_source_rgba(0.0, 0.0, 0.0, 0.3);
    cr.set_line_width(1.0);
    cr.stroke()
}

/// Bottom-right legend panel: one swatch and range label per entry.
pub struct LegendLayer {
    entries: Vec<(Rgb, String)>,
}

impl LegendLayer {
    pub fn new(entries: &[LegendEntry]) -> crate::Result<Self> {
        let entries = entries
            .iter()
            .map(|entry| Ok((Rgb::from_hex(entry.color)?, entry.label.clone())))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, label)| label.as_str())
    }
}

impl Layer for LegendLayer {
    fn draw(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
        _focus_range: &FocusRange,
    ) -> Result<(), Error> {
        if self.entries.is_empty() {
            return Ok(());
        }

        set_font(cr, FontWeight::Normal);
        let mut label_width: f64 = 0.0;
        for (_, label) in &self.entries {
            label_width = label_width.max(text_width(cr, label)?);
        }

        let width = PADDING * 3.0 + SWATCH_SIZE + label_width;
        let height = PADDING * 2.0 + self.entries.len() as f64 * LINE_HEIGHT;
        let x = drawing_area.width() as f64 - width - MARGIN;
        let y = drawing_area.height() as f64 - height - MARGIN;
        fill_panel(cr, x, y, width, height)?;

        for (i, (color, label)) in self.entries.iter().enumerate() {
            let row_y = y + PADDING + i as f64 * LINE_HEIGHT;
            cr.set_source_rgb(color.r, color.g, color.b);
            cr.rectangle(
                x + PADDING,
                row_y + (LINE_HEIGHT - SWATCH_SIZE) / 2.0,
                SWATCH_SIZE,
                SWATCH_SIZE,
            );
            cr.fill()?;

            cr.set_source_rgb(0.1, 0.1, 0.1);
            cr.move_to(x + PADDING * 2.0 + SWATCH_SIZE, row_y + LINE_HEIGHT * 0.75);
            cr.show_text(label)?;
        }

        Ok(())
    }
}
