use crate::ir::{DrawCommand, PanelScene};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Fixed-size drawing surface for one panel
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Canvas size must be positive (got {}x{})", width, height);
        }
        Ok(Self { width, height })
    }

    /// Draw the scene into an RGB buffer and encode it as PNG
    pub fn render_png(&self, scene: &PanelScene) -> Result<Vec<u8>> {
        let Some(len) = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3))
        else {
            anyhow::bail!("Canvas {}x{} is too large", self.width, self.height);
        };
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            draw_scene(&root, scene)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    /// Draw the scene as an SVG document
    pub fn render_svg(&self, scene: &PanelScene) -> Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            draw_scene(&root, scene)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg.into_bytes())
    }
}

/// Execute the scene's draw commands on any plotters backend
fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &PanelScene) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(scene.caption(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            scene.x_scale.domain.0..scene.x_scale.domain.1,
            scene.y_scale.domain.0..scene.y_scale.domain.1,
        )
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc(scene.x_label.as_str())
        .y_desc(scene.y_label.as_str())
        .draw()
        .context("Failed to draw mesh")?;

    let mut has_legend = false;

    for command in &scene.commands {
        match command {
            DrawCommand::DrawPoints { points, style, legend } => {
                let color = style.color;
                let shape = color.mix(style.alpha).filled();
                let size = style.size.round().max(1.0) as i32;
                let series = chart
                    .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), size, shape)))
                    .context("Failed to draw point series")?;
                if let Some(label) = legend {
                    has_legend = true;
                    series
                        .label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
                }
            }
            DrawCommand::DrawRect { tl, br, color, alpha, legend } => {
                let color = *color;
                let series = chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [*tl, *br],
                        color.mix(*alpha).filled(),
                    )))
                    .context("Failed to draw band")?;
                if let Some(label) = legend {
                    has_legend = true;
                    series.label(label.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x - 5, y - 5), (x + 5, y + 5)], color.filled())
                    });
                }
            }
            DrawCommand::DrawSegments { segments, color } => {
                chart
                    .draw_series(
                        segments
                            .iter()
                            .map(|&(a, b)| PathElement::new(vec![a, b], color.stroke_width(1))),
                    )
                    .context("Failed to draw rug")?;
            }
            DrawCommand::DrawText { pos, text, color, size } => {
                let style = ("sans-serif", *size).into_font().color(color);
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *pos, style)))
                    .context("Failed to draw annotation")?;
            }
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{PointStyle, Scale};

    fn make_scene() -> PanelScene {
        PanelScene {
            row: 0,
            col: 0,
            nrow: 1,
            ncol: 1,
            title: "Test".into(),
            panel_label: None,
            x_label: "x".into(),
            y_label: "y".into(),
            x_scale: Scale { domain: (0.0, 10.0) },
            y_scale: Scale { domain: (0.0, 10.0) },
            row_count: 2,
            point_count: 2,
            correlation: None,
            commands: vec![
                DrawCommand::DrawRect {
                    tl: (1.0, 5.0),
                    br: (4.0, 1.0),
                    color: RGBColor(68, 1, 84),
                    alpha: 1.0,
                    legend: Some("90-100% of peak".into()),
                },
                DrawCommand::DrawPoints {
                    points: vec![(2.0, 3.0), (7.0, 8.0)],
                    style: PointStyle { color: RGBColor(31, 119, 180), size: 3.0, alpha: 0.5 },
                    legend: Some("Male".into()),
                },
            ],
        }
    }

    #[test]
    fn test_canvas_rejects_zero_size() {
        assert!(Canvas::new(0, 600).is_err());
    }

    #[test]
    fn test_render_png_rejects_oversized_buffer() {
        let canvas = Canvas::new(u32::MAX, u32::MAX).unwrap();
        assert!(canvas.render_png(&make_scene()).is_err());
    }

    #[test]
    fn test_render_png() {
        let canvas = Canvas::new(320, 240).unwrap();
        let bytes = canvas.render_png(&make_scene()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_svg() {
        let canvas = Canvas::new(320, 240).unwrap();
        let bytes = canvas.render_svg(&make_scene()).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.contains("<svg"));
    }
}
