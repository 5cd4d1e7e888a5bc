use std::path::PathBuf;

use log::{debug, info};
use particle_id::ParticleID;
use plotters::{coord::Shift, prelude::*};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    cluster::{Jet, JetConfiguration},
    compose::WorkingEvent,
    config::{Rgb, Style},
    event::{Charge, Particle},
    raster::{Raster, ZRange},
    traits::RenderPage,
};

/// Everything shown on one page
#[derive(Copy, Clone, Debug)]
pub struct Page<'a> {
    /// Position in the output document, starting from zero
    pub number: usize,
    pub event: &'a WorkingEvent,
    pub jet_config: &'a JetConfiguration,
    pub jets: &'a [Jet],
    pub raster: &'a Raster,
    /// Range of the colour scale
    pub z_range: ZRange,
    /// Whether to explain the markers
    pub legend: bool,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to draw: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing(err.to_string())
    }
}

/// Writes each page to a numbered SVG file in an output directory
#[derive(Debug, TypedBuilder)]
pub struct SvgDocument {
    #[builder(setter(into))]
    dir: PathBuf,
    #[builder(default = (1000, 700))]
    size: (u32, u32),
    #[builder(default)]
    style: Style,
    /// Process description shown on each page
    #[builder(default, setter(into))]
    process: String,
    /// Minimum transverse momentum for drawing particles
    #[builder(default = 1.)]
    hadron_pt_min: f64,
    /// Mean number of pileup interactions shown in the legend
    #[builder(default)]
    pileup_mu: f64,
    #[builder(default, setter(skip))]
    npages: usize,
}

const FONT: &str = "sans-serif";
const COLOUR_BAR_WIDTH: i32 = 110;
const COLOUR_BAR_STEPS: usize = 100;

fn rgb([r, g, b]: Rgb) -> RGBColor {
    RGBColor(r, g, b)
}

/// Position of `value` on the logarithmic colour scale
///
/// Returns `None` for values below the range. Values above the range are
/// mapped to the top of the scale.
pub fn colour_position(value: f64, z_range: ZRange) -> Option<f64> {
    if value < z_range.min || value <= 0. {
        return None;
    }
    if z_range.min <= 0. || z_range.max <= z_range.min {
        return Some(1.);
    }
    let pos = (value / z_range.min).ln() / (z_range.max / z_range.min).ln();
    Some(pos.min(1.))
}

fn coord(particle: &Particle) -> (f64, f64) {
    (particle.p.rap().raw(), particle.p.phi().raw())
}

fn palette(pos: f64) -> HSLColor {
    // from blue to red
    HSLColor(2. / 3. * (1. - pos), 1., 0.5)
}

/// Label for a particle, e.g. "W+" or "b̄"
pub fn symbol(id: ParticleID) -> String {
    let anti = id.id() < 0;
    let sign = |s: bool| if s { "+" } else { "-" };
    match id.abs().id() {
        q @ 1..=6 => {
            let name = ["d", "u", "s", "c", "b", "t"][(q - 1) as usize];
            if anti {
                format!("{name}\u{0304}")
            } else {
                name.to_owned()
            }
        }
        l @ (11 | 13 | 15) => {
            let name = match l {
                11 => "e",
                13 => "μ",
                _ => "τ",
            };
            format!("{name}{}", sign(anti))
        }
        12 | 14 | 16 => "ν".to_owned(),
        21 => "g".to_owned(),
        22 => "γ".to_owned(),
        23 => "Z".to_owned(),
        24 => format!("W{}", sign(!anti)),
        25 => "H".to_owned(),
        _ => id.id().to_string(),
    }
}

/// Rapidity and azimuth of the jet axes inside the displayed range
pub fn jet_axes(jets: &[Jet], raster: &Raster) -> Vec<(f64, f64)> {
    jets.iter()
        .map(|jet| (jet.p.rap().raw(), jet.p.phi().raw()))
        .filter(|&(y, phi)| {
            raster.y_axis().find_bin(y).is_some()
                && raster.phi_axis().find_bin(phi).is_some()
        })
        .collect()
}

impl SvgDocument {
    fn in_acceptance(&self, particle: &Particle, raster: &Raster) -> bool {
        let p = &particle.p;
        p.pt() > self.hadron_pt_min
            && raster.y_axis().find_bin(p.rap().raw()).is_some()
            && raster.phi_axis().find_bin(p.phi().raw()).is_some()
    }

    fn draw_page(
        &self,
        root: &DrawingArea<SVGBackend<'_>, Shift>,
        page: &Page<'_>,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE)?;
        let (width, _) = root.dim_in_pixel();
        let (main, colour_bar) =
            root.split_horizontally(width as i32 - COLOUR_BAR_WIDTH);

        let raster = page.raster;
        let (y_axis, phi_axis) = (raster.y_axis(), raster.phi_axis());
        let mut chart = ChartBuilder::on(&main)
            .margin(10)
            .margin_top(60)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                y_axis.min()..y_axis.max(),
                phi_axis.min()..phi_axis.max(),
            )?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("y")
            .y_desc("φ")
            .draw()?;

        let z_range = page.z_range;
        chart.draw_series(raster.nonzero().filter_map(|((iy, iphi), pt)| {
            let pos = colour_position(pt, z_range)?;
            let y0 = y_axis.bin_low_edge(iy);
            let phi0 = phi_axis.bin_low_edge(iphi);
            Some(Rectangle::new(
                [
                    (y0, phi0),
                    (y0 + y_axis.bin_width(), phi0 + phi_axis.bin_width()),
                ],
                palette(pos).filled(),
            ))
        }))?;

        let event = page.event;
        let style = self.style;
        let colour = rgb(style.pileup);
        let (charged, neutral): (Vec<_>, Vec<_>) = event
            .pileup
            .iter()
            .filter(|p| self.in_acceptance(p, raster))
            .partition(|p| p.charge != Charge::Neutral);
        let anno = chart.draw_series(
            charged.iter().map(|p| Circle::new(coord(p), 3, colour)),
        )?;
        if page.legend {
            anno.label(format!("pileup, μ = {}, charged", self.pileup_mu))
                .legend(move |c| Circle::new(c, 3, colour));
        }
        let anno = chart.draw_series(
            neutral.iter().map(|p| {
                EmptyElement::at(coord(p)) + Rectangle::new([(-3, -3), (3, 3)], colour)
            }),
        )?;
        if page.legend {
            anno.label(format!("pileup, μ = {}, neutral", self.pileup_mu))
                .legend(move |c| {
                    EmptyElement::at(c) + Rectangle::new([(-3, -3), (3, 3)], colour)
                });
        }

        for (charge, colour, name) in [
            (Charge::Positive, style.positive, "+"),
            (Charge::Negative, style.negative, "−"),
            (Charge::Neutral, style.neutral, "neutral"),
        ] {
            let colour = rgb(colour);
            let coords: Vec<_> = event
                .hard_scatter
                .iter()
                .filter(|p| p.charge == charge && self.in_acceptance(p, raster))
                .map(coord)
                .collect();
            if charge == Charge::Neutral {
                chart.draw_series(coords.iter().map(|&c| {
                    EmptyElement::at(c) + Rectangle::new([(-2, -2), (2, 2)], colour.filled())
                }))?;
            }
            let anno = chart
                .draw_series(coords.iter().map(|&c| Cross::new(c, 4, colour)))?;
            if page.legend {
                anno.label(format!("hard scatter, {name}"))
                    .legend(move |c| Cross::new(c, 4, colour));
            }
        }

        let colour = rgb(style.hard_scatter);
        let axes = jet_axes(page.jets, raster);
        if axes.len() < page.jets.len() {
            debug!("{} jet axes outside of display", page.jets.len() - axes.len());
        }
        let anno = chart.draw_series(
            axes.into_iter().map(|c| TriangleMarker::new(c, 6, colour.stroke_width(2))),
        )?;
        if page.legend {
            anno.label("jet axis")
                .legend(move |c| TriangleMarker::new(c, 6, colour.stroke_width(2)));
        }

        let text_style = (FONT, 16).into_font().color(&colour);
        for resonance in &event.resonances {
            let daughters = resonance.daughters.iter().flatten();
            for particle in std::iter::once(&resonance.particle).chain(daughters) {
                let (y, phi) = (particle.p.rap().raw(), particle.p.phi().raw());
                if y_axis.find_bin(y).is_none() || phi_axis.find_bin(phi).is_none() {
                    debug!("{} outside of display", symbol(particle.id));
                    continue;
                }
                chart.draw_series(std::iter::once(Text::new(
                    symbol(particle.id),
                    (y, phi),
                    text_style.clone(),
                )))?;
            }
        }

        if page.legend {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.draw(&Text::new(
            self.process.as_str(),
            (20, 10),
            (FONT, 18).into_font(),
        ))?;
        let description = format!(
            "{}, pT > {} GeV",
            page.jet_config.label, page.jet_config.jet_def.min_pt
        );
        root.draw(&Text::new(description, (20, 32), (FONT, 16).into_font()))?;
        if page.legend {
            let cut = format!("particles with pT > {:.1} GeV", self.hadron_pt_min);
            root.draw(&Text::new(cut, (20, 52), (FONT, 12).into_font()))?;
        }

        self.draw_colour_bar(&colour_bar, z_range)
    }

    fn draw_colour_bar(
        &self,
        area: &DrawingArea<SVGBackend<'_>, Shift>,
        z_range: ZRange,
    ) -> Result<(), RenderError> {
        let ZRange { min, max } = z_range;
        if !(min > 0. && max > min) {
            debug!("No colour bar for range [{min}, {max}]");
            return Ok(());
        }
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .margin_top(60)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..1f64, (min..max).log_scale())?;
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_desc("pT [GeV]")
            .draw()?;
        let ratio = max / min;
        chart.draw_series((0..COLOUR_BAR_STEPS).map(|step| {
            let lo = step as f64 / COLOUR_BAR_STEPS as f64;
            let hi = (step + 1) as f64 / COLOUR_BAR_STEPS as f64;
            Rectangle::new(
                [(0., min * ratio.powf(lo)), (1., min * ratio.powf(hi))],
                palette(lo).filled(),
            )
        }))?;
        Ok(())
    }
}

impl RenderPage for SvgDocument {
    type Error = RenderError;

    fn render(&mut self, page: &Page<'_>) -> Result<(), Self::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("page-{:04}.svg", page.number + 1));
        debug!("Drawing page {} to {path:?}", page.number + 1);
        let root = SVGBackend::new(&path, self.size).into_drawing_area();
        self.draw_page(&root, page)?;
        root.present()?;
        self.npages += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        info!("Wrote {} pages to {:?}", self.npages, self.dir);
        Ok(())
    }
}
