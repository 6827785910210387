use crate::artifact::ChartArtifact;
use crate::data::RecordTable;
use crate::error::{Error, Result};
use crate::graph::Canvas;
use crate::ir::{ChartRequest, PanelScene};
use crate::parser::parse_request_str;
use crate::{compiler, resolve, scale, transform, OutputFormat, RenderOptions};

/// Run the pipeline up to the scene graph: one scene per non-empty facet cell
pub fn build_scenes(table: &RecordTable, request: &ChartRequest) -> Result<Vec<PanelScene>> {
    // 1. Resolve columns and levels
    let resolved = resolve::resolve_request(request, table)?;

    // 2. Partition and compute panel geometry
    let data = transform::apply_transformations(&resolved, table);
    log::debug!(
        "{} request on {} x {}: {} panel(s) in a {}x{} grid",
        request.kind.name(),
        request.x,
        request.y,
        data.panels.len(),
        data.layout.nrow,
        data.layout.ncol
    );

    // 3. Scales per panel
    let scales = scale::build_scales(&data, request.scales);

    // 4. Compile to draw commands
    Ok(compiler::compile_geometry(data, scales, &resolved))
}

/// Render a typed request into one artifact per non-empty facet cell, in
/// row-major grid order
pub fn render_request(
    table: &RecordTable,
    request: &ChartRequest,
    options: &RenderOptions,
) -> Result<Vec<ChartArtifact>> {
    let scenes = build_scenes(table, request)?;
    let canvas = Canvas::new(options.width, options.height).map_err(render_error)?;

    scenes
        .iter()
        .map(|scene| {
            let bytes = match options.format {
                OutputFormat::Png => canvas.render_png(scene),
                OutputFormat::Svg => canvas.render_svg(scene),
            }
            .map_err(render_error)?;
            Ok(ChartArtifact::from_scene(scene, options.format, bytes))
        })
        .collect()
}

/// Parse a request string and render it
pub fn render_str(
    table: &RecordTable,
    request: &str,
    options: &RenderOptions,
) -> Result<Vec<ChartArtifact>> {
    let spec = parse_request_str(request)?;
    let request = ChartRequest::try_from(spec)?;
    render_request(table, &request, options)
}

fn render_error(e: anyhow::Error) -> Error {
    Error::Render(format!("{e:#}"))
}
