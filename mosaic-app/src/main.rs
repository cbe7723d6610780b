use fxhash::FxHashMap;
use mosaic::prelude::*;

const DEFAULT_API: &str = "http://localhost:8080";

/// Standalone mosaic viewer.
///
/// Usage: `mosaic-app [config.json]`. The preview service is read from
/// `MOSAIC_API` (default `http://localhost:8080`).
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    mosaic::init_debug_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => MosaicConfig::from_json_file(&path)?,
        None => MosaicProfile::Balanced.resolve(),
    };
    let api = std::env::var("MOSAIC_API").unwrap_or_else(|_| DEFAULT_API.to_string());
    log::info!("using preview service at {}", api);

    let mosaic = Mosaic::new(
        config,
        Arc::new(HttpPreviewSource::new(api)),
        Arc::new(HttpImageFetcher::new()),
    )?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Mosaic"),
        ..Default::default()
    };

    eframe::run_native(
        "mosaic-app",
        options,
        Box::new(|cc| Box::new(MosaicApp::new(cc, mosaic))),
    )?;

    Ok(())
}

/// Drift applied once the first frame is laid out, hinting that the
/// surface can be dragged
const FLICK_HINT: Point = Point { x: -240.0, y: -120.0 };

struct MosaicApp {
    mosaic: Mosaic,
    textures: FxHashMap<u64, egui::TextureHandle>,
    selected: Arc<Mutex<Option<String>>>,
    viewport_size: Option<Point>,
    last_frame: Instant,
    show_debug_panel: bool,
}

impl MosaicApp {
    fn new(_cc: &eframe::CreationContext<'_>, mut mosaic: Mosaic) -> Self {
        let selected = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&selected);
        mosaic.on_select(move |target_id| {
            log::info!("selected {}", target_id);
            if let Ok(mut selected) = sink.lock() {
                *selected = Some(target_id.to_string());
            }
        });

        Self {
            mosaic,
            textures: FxHashMap::default(),
            selected,
            viewport_size: None,
            last_frame: Instant::now(),
            show_debug_panel: false,
        }
    }

    /// Forwards pointer, wheel and pinch input inside `rect` to the mosaic
    fn forward_input(&mut self, ctx: &egui::Context, rect: egui::Rect, hovered: bool) {
        let now = Instant::now();
        let local = |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        let (pressed, released, down, position, scroll, zoom) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
                i.raw_scroll_delta.y,
                i.zoom_delta(),
            )
        });
        let Some(position) = position.map(local) else {
            return;
        };

        if pressed && hovered {
            self.mosaic
                .handle_input(InputEvent::PointerDown { position }, now);
        } else if released {
            self.mosaic.handle_input(InputEvent::PointerUp { position }, now);
        } else if down {
            self.mosaic
                .handle_input(InputEvent::PointerMove { position }, now);
        }

        if hovered {
            if zoom != 1.0 {
                if let Err(err) = self
                    .mosaic
                    .controller_mut()
                    .zoom_by(zoom as f64, position)
                {
                    log::debug!("pinch ignored: {}", err);
                }
            } else if scroll != 0.0 {
                self.mosaic.handle_input(
                    InputEvent::Scroll {
                        delta: -scroll as f64,
                        position,
                    },
                    now,
                );
            }
        }
    }

    fn paint(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect, tiles: &[PresentationTile<TileMetadata>]) {
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        for presented in tiles.iter().filter(|p| p.on_screen) {
            let tile_rect = egui::Rect::from_min_size(
                rect.min + egui::vec2(presented.position.x as f32, presented.position.y as f32),
                egui::Vec2::splat(presented.size as f32),
            );
            let tile = &presented.tile;

            match tile.state() {
                TileState::Ready => {
                    let texture = self.textures.entry(tile.id()).or_insert_with(|| {
                        let image = tile.with_image(|image| {
                            image.map(|image| {
                                egui::ColorImage::from_rgba_unmultiplied(
                                    [image.width() as usize, image.height() as usize],
                                    image.as_raw(),
                                )
                            })
                        });
                        ctx.load_texture(
                            format!("tile-{}", tile.id()),
                            image.unwrap_or_else(|| egui::ColorImage::new([1, 1], egui::Color32::TRANSPARENT)),
                            egui::TextureOptions::LINEAR,
                        )
                    });
                    let opacity = tile.with_metadata(|metadata| metadata.opacity);
                    painter.image(
                        texture.id(),
                        tile_rect.shrink(1.0),
                        uv,
                        egui::Color32::WHITE.gamma_multiply(opacity),
                    );
                }
                TileState::Errored => {
                    painter.rect_filled(tile_rect.shrink(1.0), 0.0, egui::Color32::from_gray(40));
                }
                _ => {
                    painter.rect_filled(tile_rect.shrink(1.0), 0.0, egui::Color32::from_gray(24));
                }
            }
        }

        // Release textures of tiles that left the grid
        let live: HashSet<u64> = tiles.iter().map(|p| p.tile.id()).collect();
        self.textures.retain(|id, _| live.contains(id));
    }
}

impl eframe::App for MosaicApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_debug_panel, "Debug Panel");
                });
                ui.separator();
                if ui.button("Flick").clicked() {
                    self.mosaic.flick(FLICK_HINT);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let selected = self
                        .selected
                        .lock()
                        .ok()
                        .and_then(|selected| selected.clone());
                    ui.label(match selected {
                        Some(target_id) => format!("Selected: {}", target_id),
                        None => "Tap a tile to select it".to_string(),
                    });
                    ui.separator();
                    ui.label(format!("Zoom: {:.2}", self.mosaic.zoom_level()));
                });
            });
        });

        if self.show_debug_panel {
            egui::SidePanel::left("debug_panel").resizable(true).show(ctx, |ui| {
                ui.heading("Debug Info");
                ui.separator();

                let controller = self.mosaic.controller();
                let grid = controller.grid();
                ui.label(format!("Tiles: {}", grid.len()));
                ui.label(format!("Extent: {} x {}", grid.extent().cols, grid.extent().rows));
                ui.label(format!("Tile size: {:.1}", grid.tile_size()));
                ui.label(format!("Origin: {:.1}, {:.1}", grid.origin().x, grid.origin().y));
                ui.label(format!("Dragging: {}", controller.is_dragging()));
                ui.label(format!("Drift: {:.1} px/s", controller.drift().velocity().magnitude()));

                ui.separator();
                ui.heading("Loading");
                let ready = grid.tiles().filter(|t| t.state() == TileState::Ready).count();
                let errored = grid.tiles().filter(|t| t.state() == TileState::Errored).count();
                ui.label(format!("Ready: {}", ready));
                ui.label(format!("Errored: {}", errored));
                ui.label(format!("Queued previews: {}", self.mosaic.pool().queued()));
                ui.label(format!("Cached images: {}", self.mosaic.pool().cache().len()));
                ui.label(format!("Textures: {}", self.textures.len()));
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
                let size = Point::new(rect.width() as f64, rect.height() as f64);

                match self.viewport_size {
                    None => {
                        self.mosaic.init(size);
                        self.mosaic.flick(FLICK_HINT);
                    }
                    Some(previous) if previous != size => {
                        self.mosaic
                            .handle_input(InputEvent::Resize { size }, Instant::now());
                    }
                    Some(_) => {}
                }
                self.viewport_size = Some(size);

                self.forward_input(ctx, rect, response.hovered());
                let tiles = self.mosaic.tick(elapsed);
                let painter = ui.painter_at(rect);
                self.paint(ctx, &painter, rect, &tiles);
            });

        ctx.request_repaint();
    }
}
