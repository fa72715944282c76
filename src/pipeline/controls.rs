use crate::model::settings::{Backend, FigureSettings, StaticStyle};
use crate::pipeline::widgets;
use crate::session::{BindCtx, Upload};

pub fn upload(ctx: &mut BindCtx<'_>) -> Option<Upload> {
    ctx.surface.file(widgets::UPLOAD)
}

pub fn inspect_summary(ctx: &mut BindCtx<'_>) -> bool {
    ctx.surface.button(widgets::INSPECT_SUMMARY)
}

pub fn explore_gene_sets(ctx: &mut BindCtx<'_>) -> bool {
    ctx.surface.button(widgets::EXPLORE_GENE_SETS)
}

/// Figure styling shared by both pages. The static backend adds size,
/// spine and palette controls.
pub fn scatter_figure_controls(ctx: &mut BindCtx<'_>) -> FigureSettings {
    let profile = ctx.profile;
    let surface = &mut *ctx.surface;

    let backend = surface
        .select(widgets::BACKEND, &Backend::options())
        .and_then(|b| Backend::parse(&b))
        .unwrap_or(Backend::Interactive);
    let xlabel = surface.text(widgets::XLABEL, profile.xlabel);
    let ylabel = surface.text(widgets::YLABEL, profile.ylabel);
    let padding = surface.slider(
        widgets::PADDING,
        profile.padding_range.0,
        profile.padding_range.1,
        profile.padding,
        profile.padding_step,
    );

    let static_style = if backend == Backend::Static {
        let width = surface.number(
            widgets::FIG_WIDTH,
            profile.width_range.0,
            profile.width_range.1,
            profile.figsize.0,
        );
        let height = surface.number(
            widgets::FIG_HEIGHT,
            profile.height_range.0,
            profile.height_range.1,
            profile.figsize.1,
        );
        let despine = surface.checkbox(widgets::DESPINE, profile.despine);
        let palette = surface.text(widgets::PALETTE, profile.palette);
        Some(StaticStyle {
            figsize: (width as u32, height as u32),
            despine,
            palette,
        })
    } else {
        None
    };

    FigureSettings {
        backend,
        xlabel,
        ylabel,
        padding,
        static_style,
    }
}
