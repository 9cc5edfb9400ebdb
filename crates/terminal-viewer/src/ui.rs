//! egui overlays: layer panel, loading indicator and status HUD.

use floorplan::{FloorRegistry, LoadTracker};

/// Below this logical width the layer panel starts collapsed.
pub const PANEL_COLLAPSE_WIDTH: f32 = 768.0;

/// Seconds the loading indicator takes to fade out.
const LOADING_FADE_S: f32 = 0.8;

pub fn panel_starts_open(logical_width: f32) -> bool {
    logical_width >= PANEL_COLLAPSE_WIDTH
}

/// Numbers shown in the status HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HudStats {
    pub floors_populated: usize,
    pub features: usize,
    pub link_segments: u32,
}

impl HudStats {
    pub fn text(&self) -> String {
        format!(
            "floors {} | features {} | link segments {}",
            self.floors_populated, self.features, self.link_segments
        )
    }
}

/// One checkbox per floor group (top floor first) and one per overlay.
pub fn draw_layer_panel<L>(
    ctx: &egui::Context,
    open_by_default: bool,
    floors: &mut FloorRegistry<L>,
    show_links: &mut bool,
    show_context: &mut bool,
) {
    egui::Window::new("Layers")
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .default_open(open_by_default)
        .resizable(false)
        .show(ctx, |ui| {
            for floor in floors.floors() {
                let Some(group) = floors.get(floor) else {
                    continue;
                };
                let mut visible = group.is_visible();
                let label = if group.is_empty() {
                    egui::RichText::new(group.label()).weak()
                } else {
                    egui::RichText::new(group.label())
                };
                if ui.checkbox(&mut visible, label).changed() {
                    floors.set_visible(floor, visible);
                }
            }

            ui.separator();
            ui.checkbox(show_links, "Pedestrian network");
            ui.checkbox(show_context, "Context lines");
        });
}

/// `completed/total` with a bar; fades out once every load has resolved.
pub fn draw_loading(ctx: &egui::Context, tracker: &LoadTracker) {
    let opacity = ctx.animate_bool_with_time(
        egui::Id::new("loading_indicator"),
        !tracker.is_finished(),
        LOADING_FADE_S,
    );
    if opacity <= 0.0 {
        return;
    }

    egui::Area::new(egui::Id::new("loading_area"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -32.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .multiply_with_opacity(opacity)
                .show(ui, |ui| {
                    let text = format!("Loading {}/{}", tracker.completed(), tracker.total());
                    ui.label(egui::RichText::new(text).color(egui::Color32::WHITE.gamma_multiply(opacity)));
                    ui.add(
                        egui::ProgressBar::new(tracker.progress())
                            .desired_width(220.0)
                            .fill(egui::Color32::from_rgb(45, 247, 255).gamma_multiply(opacity)),
                    );
                });
        });
}

pub fn draw_hud(ctx: &egui::Context, stats: HudStats) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_BOTTOM, [12.0, -12.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(stats.text())
                    .monospace()
                    .color(egui::Color32::from_rgb(45, 247, 255)),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_collapse_threshold() {
        assert!(!panel_starts_open(390.0));
        assert!(!panel_starts_open(767.9));
        assert!(panel_starts_open(768.0));
        assert!(panel_starts_open(1280.0));
    }

    #[test]
    fn test_hud_text() {
        let stats = HudStats {
            floors_populated: 3,
            features: 120,
            link_segments: 4096,
        };
        assert_eq!(stats.text(), "floors 3 | features 120 | link segments 4096");
    }

    #[test]
    fn test_overlays_run_headless() {
        let ctx = egui::Context::default();
        let mut floors: FloorRegistry<()> = FloorRegistry::default();
        floors.insert(1, ()).unwrap();
        let (mut links, mut context) = (true, false);
        let tracker = LoadTracker::new(4);

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            draw_layer_panel(ctx, false, &mut floors, &mut links, &mut context);
            draw_loading(ctx, &tracker);
            draw_hud(ctx, HudStats::default());
        });

        assert!(links);
        assert!(!context);
        assert!(floors.iter().all(|g| g.is_visible()));
    }
}
