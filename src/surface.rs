// Display surfaces: where narrative and rendered charts end up

use crate::artifact::ChartArtifact;
use crate::error::Result;
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// One-time page setup, handed to [`ChartSurface::init`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub subtitle: Option<String>,
    /// Leave out page header and footer decorations
    pub hide_chrome: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Analysis of multivariate data".to_string(),
            subtitle: None,
            hide_chrome: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPosition {
    /// A standalone chart in the page flow
    Inline,
    /// A cell of a facet grid. Cells sharing `group` belong to the same grid.
    Grid {
        group: usize,
        row: usize,
        col: usize,
        nrow: usize,
        ncol: usize,
    },
}

impl DisplayPosition {
    /// Inline for single-panel requests, a grid cell otherwise
    pub fn for_artifact(artifact: &ChartArtifact, group: usize) -> Self {
        let pos = artifact.position();
        if artifact.is_faceted() {
            DisplayPosition::Grid {
                group,
                row: pos.row,
                col: pos.col,
                nrow: pos.nrow,
                ncol: pos.ncol,
            }
        } else {
            DisplayPosition::Inline
        }
    }
}

/// Anything that can present a report
pub trait ChartSurface {
    fn init(&mut self, page: &PageConfig) -> Result<()>;

    /// Add a narrative block. Lines starting with `#` are headings.
    fn narrate(&mut self, text: &str) -> Result<()>;

    fn show(&mut self, artifact: ChartArtifact, position: DisplayPosition) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

// =============================================================================
// HTML
// =============================================================================

#[derive(Debug)]
enum HtmlBlock {
    Narrative(String),
    Figure { file: String, caption: String },
    Grid { group: usize, ncol: usize, cells: Vec<GridCell> },
}

#[derive(Debug)]
struct GridCell {
    row: usize,
    col: usize,
    file: String,
    caption: String,
}

/// Writes every artifact to a file and lays the page out in `index.html`
#[derive(Debug)]
pub struct HtmlSurface {
    out_dir: PathBuf,
    page: PageConfig,
    blocks: Vec<HtmlBlock>,
    chart_count: usize,
}

impl HtmlSurface {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            page: PageConfig::default(),
            blocks: Vec::new(),
            chart_count: 0,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.out_dir.join("index.html")
    }

    fn render_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
            escape(&self.page.title),
            STYLE
        );

        if self.page.hide_chrome {
            let _ = writeln!(html, "<h1>{}</h1>", escape(&self.page.title));
        } else {
            let _ = writeln!(html, "<header><h1>{}</h1>", escape(&self.page.title));
            if let Some(subtitle) = &self.page.subtitle {
                let _ = writeln!(html, "<p class=\"subtitle\">{}</p>", escape(subtitle));
            }
            html.push_str("</header>\n");
        }

        for block in &self.blocks {
            match block {
                HtmlBlock::Narrative(text) => html.push_str(&narrative_html(text)),
                HtmlBlock::Figure { file, caption } => {
                    let _ = writeln!(
                        html,
                        "<figure><img src=\"{}\" alt=\"{}\"></figure>",
                        escape(file),
                        escape(caption)
                    );
                }
                HtmlBlock::Grid { ncol, cells, .. } => {
                    let _ = writeln!(
                        html,
                        "<div class=\"grid\" style=\"grid-template-columns: repeat({}, 1fr)\">",
                        ncol
                    );
                    for cell in cells {
                        let _ = writeln!(
                            html,
                            "<figure style=\"grid-row: {}; grid-column: {}\"><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                            cell.row + 1,
                            cell.col + 1,
                            escape(&cell.file),
                            escape(&cell.caption),
                            escape(&cell.caption)
                        );
                    }
                    html.push_str("</div>\n");
                }
            }
        }

        if !self.page.hide_chrome {
            html.push_str("<footer>Generated by strataplot</footer>\n");
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

const STYLE: &str = "body{font-family:sans-serif;max-width:1100px;margin:2em auto;padding:0 1em}\
img{max-width:100%}\
.grid{display:grid;gap:8px}\
.grid figure{margin:0}\
figcaption{text-align:center;font-size:0.9em;color:#555}\
.subtitle{color:#555}";

impl ChartSurface for HtmlSurface {
    fn init(&mut self, page: &PageConfig) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        self.page = page.clone();
        self.blocks.clear();
        self.chart_count = 0;
        Ok(())
    }

    fn narrate(&mut self, text: &str) -> Result<()> {
        self.blocks.push(HtmlBlock::Narrative(text.to_string()));
        Ok(())
    }

    fn show(&mut self, artifact: ChartArtifact, position: DisplayPosition) -> Result<()> {
        self.chart_count += 1;
        let file = format!("chart-{:03}.{}", self.chart_count, artifact.format().extension());
        fs::write(self.out_dir.join(&file), artifact.bytes())?;
        let caption = artifact.caption().to_string();

        match position {
            DisplayPosition::Inline => self.blocks.push(HtmlBlock::Figure { file, caption }),
            DisplayPosition::Grid { group, row, col, ncol, .. } => {
                let cell = GridCell { row, col, file, caption };
                match self.blocks.last_mut() {
                    Some(HtmlBlock::Grid { group: g, cells, .. }) if *g == group => {
                        cells.push(cell);
                        return Ok(());
                    }
                    _ => {}
                }
                self.blocks.push(HtmlBlock::Grid {
                    group,
                    ncol,
                    cells: vec![cell],
                });
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let path = self.index_path();
        fs::write(&path, self.render_html())?;
        log::info!("Wrote {} chart(s) to {}", self.chart_count, path.display());
        Ok(())
    }
}

fn narrative_html(text: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        let level = line.chars().take_while(|&c| c == '#').count();
        if line.is_empty() {
            flush_paragraph(&mut html, &mut paragraph);
        } else if (1..=6).contains(&level) {
            flush_paragraph(&mut html, &mut paragraph);
            let _ = writeln!(html, "<h{0}>{1}</h{0}>", level, escape(line[level..].trim()));
        } else {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut html, &mut paragraph);
    html
}

fn flush_paragraph(html: &mut String, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        let _ = writeln!(html, "<p>{}</p>", escape(&paragraph.join(" ")));
        paragraph.clear();
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    Init(PageConfig),
    Narrative(String),
    Chart {
        artifact: ChartArtifact,
        position: DisplayPosition,
    },
    Finish,
}

/// Keeps every call in order. Useful for tests and for embedding.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> impl Iterator<Item = (&ChartArtifact, DisplayPosition)> {
        self.events.iter().filter_map(|e| match e {
            SurfaceEvent::Chart { artifact, position } => Some((artifact, *position)),
            _ => None,
        })
    }

    pub fn narratives(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            SurfaceEvent::Narrative(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl ChartSurface for RecordingSurface {
    fn init(&mut self, page: &PageConfig) -> Result<()> {
        self.events.push(SurfaceEvent::Init(page.clone()));
        Ok(())
    }

    fn narrate(&mut self, text: &str) -> Result<()> {
        self.events.push(SurfaceEvent::Narrative(text.to_string()));
        Ok(())
    }

    fn show(&mut self, artifact: ChartArtifact, position: DisplayPosition) -> Result<()> {
        self.events.push(SurfaceEvent::Chart { artifact, position });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.events.push(SurfaceEvent::Finish);
        Ok(())
    }
}
