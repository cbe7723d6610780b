use mosaic::prelude::*;

/// Gesture-level behaviour of the viewport controller
#[cfg(test)]
mod viewport_controller {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn controller() -> ViewportController<TileMetadata> {
        let mut controller =
            ViewportController::new(&MosaicConfig::default(), TileMetadata::default());
        controller.init(Point::new(800.0, 600.0));
        controller
    }

    fn drag(
        controller: &mut ViewportController<TileMetadata>,
        from: Point,
        to: Point,
        start: Instant,
    ) {
        controller.handle_input(InputEvent::PointerDown { position: from }, start);
        let mid = from.midpoint(&to);
        controller.handle_input(
            InputEvent::PointerMove { position: mid },
            start + Duration::from_millis(40),
        );
        controller.handle_input(
            InputEvent::PointerUp { position: to },
            start + Duration::from_millis(80),
        );
    }

    #[test]
    fn test_initial_fill_scenario() {
        let controller = controller();
        let grid = controller.grid();

        assert_eq!(grid.len(), 42);
        assert_eq!(grid.extent().cols, 7);
        assert_eq!(grid.extent().rows, 6);
        assert_eq!(grid.grid_offset(), GridCoord::new(-1, -1));
        assert_eq!(grid.present().iter().filter(|p| p.on_screen).count(), 24);
    }

    #[test]
    fn test_out_of_range_zoom_changes_nothing() {
        let mut controller = controller();
        controller.pan(Point::new(12.0, 34.0));
        let size = controller.grid().tile_size();
        let origin = controller.grid().origin();
        let tiles = controller.grid().len();

        for level in [0.0, 0.49, 3.01, 10.0, -1.0] {
            match controller.zoom_to(level, Some(Point::new(100.0, 100.0))) {
                Err(MosaicError::ZoomOutOfRange { requested, .. }) => assert_eq!(requested, level),
                other => panic!("zoom {} accepted: {:?}", level, other),
            }
        }

        assert_eq!(controller.grid().tile_size(), size);
        assert_eq!(controller.grid().origin(), origin);
        assert_eq!(controller.grid().len(), tiles);
        assert_eq!(controller.zoom_level(), 1.0);
    }

    #[test]
    fn test_zoom_preserves_focal_point() {
        let mut controller = controller();
        controller.pan(Point::new(-91.0, 57.5));

        for (level, focus) in [
            (2.5, Point::new(640.0, 120.0)),
            (0.5, Point::new(13.0, 590.0)),
            (1.75, Point::new(400.0, 300.0)),
        ] {
            let grid_point = |c: &ViewportController<TileMetadata>| {
                focus
                    .subtract(&c.grid().origin())
                    .divide(c.grid().tile_size())
            };
            let before = grid_point(&controller);
            controller.zoom_to(level, Some(focus)).unwrap();
            let after = grid_point(&controller);

            assert!(before.distance_to(&after) < 1e-9, "level {}", level);
            assert_eq!(controller.grid().tile_size(), 150.0 * level);
        }
    }

    #[test]
    fn test_zoom_defaults_to_viewport_center() {
        let mut controller = controller();
        let center = Point::new(400.0, 300.0);
        let before = center.subtract(&controller.grid().origin()).divide(150.0);

        controller.zoom_to(2.0, None).unwrap();
        let after = center.subtract(&controller.grid().origin()).divide(300.0);
        assert!(before.distance_to(&after) < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_tiles_mid_download() {
        let mut controller = controller();
        let kept: Vec<TileHandle<TileMetadata>> = controller.grid().tiles().cloned().collect();
        controller.zoom_to(1.2, None).unwrap();

        // A small zoom in does not rebuild the grid from scratch
        let survivors = kept.iter().filter(|tile| tile.is_alive()).count();
        assert!(survivors > 0);
    }

    #[test]
    fn test_tap_selects_but_drag_does_not() {
        let mut controller = controller();
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&selected);
        controller.set_on_select(move |metadata: &TileMetadata| {
            sink.lock().unwrap().push(metadata.clone());
        });

        let start = Instant::now();
        let here = Point::new(200.0, 200.0);
        controller.handle_input(InputEvent::PointerDown { position: here }, start);
        controller.handle_input(InputEvent::PointerUp { position: here }, start + FRAME);
        assert_eq!(selected.lock().unwrap().len(), 1);

        drag(&mut controller, here, Point::new(201.0, 200.0), start);
        assert_eq!(selected.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drag_pans_with_pointer() {
        let mut controller = controller();
        let start = Instant::now();
        drag(
            &mut controller,
            Point::new(300.0, 300.0),
            Point::new(250.0, 380.0),
            start,
        );
        assert_eq!(controller.grid().origin(), Point::new(-50.0, 80.0));
    }

    #[test]
    fn test_release_drift_decays_to_zero() {
        let mut controller = controller();
        drag(
            &mut controller,
            Point::new(100.0, 300.0),
            Point::new(500.0, 300.0),
            Instant::now(),
        );
        let seeded = controller.drift().velocity();
        assert!(seeded.x > 0.0);

        let mut ticks = 0;
        let mut travelled = 0.0;
        while let Some(delta) = controller.tick(FRAME) {
            travelled += delta.x;
            ticks += 1;
            assert!(ticks < 10_000, "drift never stopped");
        }
        assert_eq!(controller.drift().velocity(), Point::zero());
        assert!(travelled > 0.0);
        assert_eq!(controller.tick(FRAME), None);
    }

    #[test]
    fn test_drift_is_suspended_while_dragging() {
        let mut controller = controller();
        controller.flick(Point::new(-600.0, 0.0));

        let start = Instant::now();
        let here = Point::new(400.0, 300.0);
        controller.handle_input(InputEvent::PointerDown { position: here }, start);
        let origin = controller.grid().origin();

        assert_eq!(controller.tick(FRAME), None);
        assert_eq!(controller.grid().origin(), origin);
        assert_eq!(controller.drift().velocity(), Point::new(-600.0, 0.0));

        // Releasing without motion resumes the retained drift
        controller.handle_input(InputEvent::PointerUp { position: here }, start + FRAME);
        assert!(controller.tick(FRAME).is_some());
        assert!(controller.grid().origin().x < origin.x);
    }

    #[test]
    fn test_flick_moves_grid_and_keeps_coverage() {
        let mut controller = controller();
        controller.flick(Point::new(3000.0, -2000.0));
        while controller.tick(FRAME).is_some() {
            let grid = controller.grid();
            for corner in [
                Point::new(0.0, 0.0),
                Point::new(799.0, 0.0),
                Point::new(0.0, 599.0),
                Point::new(799.0, 599.0),
            ] {
                assert!(grid.tile_at(corner).is_some());
            }
        }
        assert!(controller.grid().origin().x > 0.0);
    }

    #[test]
    fn test_wheel_and_resize_events() {
        let mut controller = controller();
        let now = Instant::now();

        controller.handle_input(
            InputEvent::Scroll {
                delta: -200.0,
                position: Point::new(100.0, 100.0),
            },
            now,
        );
        assert!(controller.zoom_level() > 1.0);

        controller.handle_input(
            InputEvent::Resize {
                size: Point::new(1600.0, 1200.0),
            },
            now,
        );
        assert_eq!(controller.grid().viewport_size(), Point::new(1600.0, 1200.0));
        assert!(controller.grid().tile_at(Point::new(1599.0, 1199.0)).is_some());
    }
}
