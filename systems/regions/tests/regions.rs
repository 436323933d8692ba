use color_defense_canvas::PixelCanvas;
use color_defense_core::{
    AreaFootprint, AreaShape, Canvas, CanvasEvent, CurveKey, OwnerId, PaintColor, PixelCoord,
    RegionEvent, RegionId, RegionStatus, ResponseCurve, Vec2,
};
use color_defense_system_regions::{ColorChangeRegion, RegionTuning, DEFAULT_TIME_TO_COMPLETE};

const PLAYER: OwnerId = OwnerId::new(1);

fn player_color() -> PaintColor {
    PaintColor::from_rgb_u8(0x1e, 0x88, 0xe5)
}

fn square_region(
    canvas: &PixelCanvas,
    time_to_complete: f32,
    tuning: RegionTuning,
) -> ColorChangeRegion {
    let footprint = AreaFootprint::new(AreaShape::Square, Vec2::new(50.0, 50.0), 20.0);
    ColorChangeRegion::spawn(RegionId::new(1), footprint, time_to_complete, tuning, canvas)
}

/// Claims the first `count` pixels of the footprint for the player.
fn paint_pixels(canvas: &mut PixelCanvas, footprint: &AreaFootprint, count: usize) {
    let resolution = canvas.resolution().expect("canvas ready");
    let pixels: Vec<PixelCoord> = footprint.pixels(resolution).take(count).collect();
    for pixel in pixels {
        canvas.paint_with_alpha(pixel, PLAYER, 1.0, player_color(), 1.0);
    }
    canvas.flush_pending_updates();
}

fn count_events(events: &[RegionEvent], predicate: impl Fn(&RegionEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn pixel_total_is_counted_on_a_ready_canvas() {
    let canvas = PixelCanvas::new(100, 100);
    let region = square_region(&canvas, 10.0, RegionTuning::default());
    assert_eq!(region.total_pixels_in_area(), 400);
}

#[test]
fn coverage_above_threshold_defends_before_time_runs_out() {
    let pending = PixelCanvas::pending();
    let footprint = AreaFootprint::new(AreaShape::Circle, Vec2::new(100.0, 100.0), 100.0);
    let mut region = ColorChangeRegion::spawn(
        RegionId::new(7),
        footprint,
        10.0,
        RegionTuning::default(),
        &pending,
    );
    assert_eq!(region.total_pixels_in_area(), 7_854);

    let mut canvas = PixelCanvas::new(200, 200);
    let mut events = Vec::new();
    for _ in 0..30 {
        let _ = region.update(0.1, &mut canvas, &mut events);
    }
    assert!((region.change_progress() - 0.3).abs() < 1e-3);

    paint_pixels(&mut canvas, &footprint, 4_000);
    region.rescan_coverage(&canvas);

    assert!((region.defended_progress() - 4_000.0 / 7_854.0).abs() < 1e-4);
    assert!(region.is_fully_defended());
    assert!(!region.is_fully_changed());
}

#[test]
fn undefended_region_changes_after_its_time_budget() {
    let mut canvas = PixelCanvas::new(100, 100);
    let mut region = square_region(&canvas, 10.0, RegionTuning::default());
    let mut events = Vec::new();

    for tick in 0..100 {
        let status = region.update(0.1, &mut canvas, &mut events);
        if tick < 99 {
            assert_eq!(status, RegionStatus::Active, "tick {tick}");
        }
    }

    assert_eq!(region.change_progress(), 1.0);
    assert_eq!(region.status(), RegionStatus::FullyChanged);

    for _ in 0..5 {
        let _ = region.update(0.1, &mut canvas, &mut events);
    }
    let changed = count_events(&events, |event| matches!(event, RegionEvent::Changed { .. }));
    assert_eq!(changed, 1);
}

#[test]
fn change_progress_never_decreases() {
    let mut canvas = PixelCanvas::new(100, 100);
    let tuning = RegionTuning {
        defense_threshold: 0.95,
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 5.0, tuning);
    let footprint = *region.footprint();
    let mut events = Vec::new();
    let mut previous = 0.0;

    for tick in 0..60 {
        if tick == 10 {
            paint_pixels(&mut canvas, &footprint, 300);
        }
        let _ = region.update(0.1, &mut canvas, &mut events);
        assert!(region.change_progress() >= previous);
        assert!((0.0..=1.0).contains(&region.defended_progress()));
        previous = region.change_progress();
    }
}

#[test]
fn player_coverage_slows_aging() {
    let mut canvas = PixelCanvas::new(100, 100);
    let tuning = RegionTuning {
        defense_threshold: 0.7,
        paint_slowdown_effect: 1.0,
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 10.0, tuning);
    let footprint = *region.footprint();
    paint_pixels(&mut canvas, &footprint, 240);

    let mut events = Vec::new();
    for _ in 0..10 {
        let _ = region.update(0.1, &mut canvas, &mut events);
    }

    assert!((region.defended_progress() - 0.6).abs() < 1e-6);
    assert!((region.elapsed_time() - 0.4).abs() < 1e-4);
}

#[test]
fn slowdown_never_drops_below_floor() {
    let mut canvas = PixelCanvas::new(100, 100);
    let tuning = RegionTuning {
        defense_threshold: 1.1,
        paint_slowdown_effect: 5.0,
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 10.0, tuning);
    let footprint = *region.footprint();
    paint_pixels(&mut canvas, &footprint, 200);

    let mut events = Vec::new();
    let _ = region.update(1.0, &mut canvas, &mut events);
    assert!((region.elapsed_time() - 0.1).abs() < 1e-6);
}

#[test]
fn enemy_paint_is_applied_once_per_tenth() {
    let mut canvas = PixelCanvas::new(100, 100);
    let mut region = square_region(&canvas, 10.0, RegionTuning::default());
    let mut events = Vec::new();

    let _ = region.update(2.9, &mut canvas, &mut events);
    assert!((region.last_paint_step() - 0.2).abs() < 1e-6);
    let flushes_before = canvas.flush_count();

    let _ = region.update(0.2, &mut canvas, &mut events);
    assert!((region.change_progress() - 0.31).abs() < 1e-4);
    assert!((region.last_paint_step() - 0.3).abs() < 1e-6);
    assert_eq!(canvas.flush_count(), flushes_before + 1);

    let state = canvas
        .pixel(PixelCoord::new(50, 50))
        .expect("pixel on canvas");
    assert!(state.owner.is_enemy());
    assert!((state.color.alpha - 0.3).abs() < 1e-6);

    let _ = region.update(0.05, &mut canvas, &mut events);
    assert_eq!(canvas.flush_count(), flushes_before + 1);
}

#[test]
fn enemy_paint_never_overwrites_player_pixels() {
    let mut canvas = PixelCanvas::new(100, 100);
    let tuning = RegionTuning {
        defense_threshold: 0.9,
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 4.0, tuning);
    let footprint = *region.footprint();
    paint_pixels(&mut canvas, &footprint, 100);

    let mut events = Vec::new();
    while !region.status().is_terminal() {
        let _ = region.update(0.25, &mut canvas, &mut events);
    }

    assert_eq!(region.status(), RegionStatus::FullyChanged);
    assert_eq!(canvas.count_owned(PLAYER), 100);
    assert_eq!(canvas.count_owned(OwnerId::ENEMY), 300);
}

#[test]
fn defended_event_fires_once_and_erases_enemy_color() {
    let mut canvas = PixelCanvas::new(100, 100);
    let mut region = square_region(&canvas, 10.0, RegionTuning::default());
    let footprint = *region.footprint();
    let mut events = Vec::new();

    let _ = region.update(3.0, &mut canvas, &mut events);
    assert!(canvas.count_owned(OwnerId::ENEMY) > 0);

    paint_pixels(&mut canvas, &footprint, 220);
    let stroke = CanvasEvent::StrokeCompleted {
        position: footprint.center,
        owner: PLAYER,
        intensity: 1.0,
    };
    assert_eq!(
        region.handle_canvas_event(&stroke, &mut canvas, &mut events),
        RegionStatus::FullyDefended
    );
    assert_eq!(
        region.handle_canvas_event(&stroke, &mut canvas, &mut events),
        RegionStatus::FullyDefended
    );
    for _ in 0..5 {
        let _ = region.update(0.1, &mut canvas, &mut events);
    }

    let defended = count_events(&events, |event| matches!(event, RegionEvent::Defended { .. }));
    assert_eq!(defended, 1);
    assert!(region.auto_paint_cancelled());
    assert_eq!(canvas.count_owned(OwnerId::ENEMY), 0);
}

#[test]
fn suppressed_painting_refreshes_coverage_without_defending() {
    let mut canvas = PixelCanvas::new(100, 100);
    let mut region = square_region(&canvas, 10.0, RegionTuning::default());
    let footprint = *region.footprint();
    paint_pixels(&mut canvas, &footprint, 300);

    let mut events = Vec::new();
    let status =
        region.handle_canvas_event(&CanvasEvent::PaintingSuppressed, &mut canvas, &mut events);

    assert_eq!(status, RegionStatus::Active);
    assert!((region.defended_progress() - 0.75).abs() < 1e-6);
    assert!(events.is_empty());
}

#[test]
fn cancelled_region_stops_aging_but_can_be_defended() {
    let mut canvas = PixelCanvas::new(100, 100);
    let mut region = square_region(&canvas, 10.0, RegionTuning::default());
    let footprint = *region.footprint();
    let mut events = Vec::new();

    let _ = region.update(1.0, &mut canvas, &mut events);
    region.cancel_auto_paint();
    let _ = region.update(1.0, &mut canvas, &mut events);
    assert!((region.elapsed_time() - 1.0).abs() < 1e-6);

    paint_pixels(&mut canvas, &footprint, 250);
    assert_eq!(
        region.update(0.1, &mut canvas, &mut events),
        RegionStatus::FullyDefended
    );
}

#[test]
fn non_positive_time_budget_uses_default() {
    let canvas = PixelCanvas::new(100, 100);
    let region = square_region(&canvas, 0.0, RegionTuning::default());
    assert_eq!(region.effective_time_to_complete(), DEFAULT_TIME_TO_COMPLETE);
}

#[test]
fn progress_curve_remaps_time() {
    let mut canvas = PixelCanvas::new(100, 100);
    let curve = ResponseCurve::new(vec![
        CurveKey::new(0.0, 0.0),
        CurveKey::new(0.5, 0.1),
        CurveKey::new(1.0, 1.0),
    ])
    .expect("valid curve");
    let tuning = RegionTuning {
        progress_curve: Some(curve),
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 10.0, tuning);

    let mut events = Vec::new();
    let _ = region.update(5.0, &mut canvas, &mut events);
    assert!((region.change_progress() - 0.1).abs() < 1e-6);
}

#[test]
fn auto_paint_can_be_disabled() {
    let mut canvas = PixelCanvas::new(100, 100);
    let tuning = RegionTuning {
        auto_paint_enabled: false,
        ..RegionTuning::default()
    };
    let mut region = square_region(&canvas, 10.0, tuning);

    let mut events = Vec::new();
    let _ = region.update(6.0, &mut canvas, &mut events);
    assert_eq!(canvas.count_owned(OwnerId::ENEMY), 0);
    assert!(matches!(
        events.last(),
        Some(RegionEvent::ProgressChanged { progress, .. }) if (*progress - 0.6).abs() < 1e-6
    ));
}

#[test]
fn coverage_stays_within_unit_range_when_estimate_undercounts() {
    let pending = PixelCanvas::pending();
    let footprint = AreaFootprint::new(AreaShape::Square, Vec2::new(50.5, 50.5), 20.0);
    let mut region = ColorChangeRegion::spawn(
        RegionId::new(3),
        footprint,
        10.0,
        RegionTuning::default(),
        &pending,
    );
    assert_eq!(region.total_pixels_in_area(), 400);

    let mut canvas = PixelCanvas::new(100, 100);
    let resolution = canvas.resolution().expect("canvas ready");
    assert_eq!(footprint.pixel_count(resolution), 441);
    paint_pixels(&mut canvas, &footprint, usize::MAX);

    let mut events = Vec::new();
    let status = region.update(0.1, &mut canvas, &mut events);

    assert_eq!(region.defended_progress(), 1.0);
    assert_eq!(status, RegionStatus::FullyDefended);
}

#[test]
fn rectangle_region_scans_only_its_own_pixels() {
    let mut canvas = PixelCanvas::new(100, 100);
    let shape = AreaShape::Rectangle {
        width_ratio: 2.0,
        height_ratio: 0.5,
    };
    let footprint = AreaFootprint::new(shape, Vec2::new(50.0, 50.0), 20.0);
    let mut region = ColorChangeRegion::spawn(
        RegionId::new(4),
        footprint,
        10.0,
        RegionTuning::default(),
        &canvas,
    );
    assert_eq!(region.total_pixels_in_area(), 400);
    assert_eq!(shape.estimated_pixel_count(20.0), 400);

    for pixel in [PixelCoord::new(50, 40), PixelCoord::new(20, 50)] {
        canvas.paint_with_alpha(pixel, PLAYER, 1.0, player_color(), 1.0);
    }
    let resolution = canvas.resolution().expect("canvas ready");
    let left_half: Vec<PixelCoord> = footprint
        .pixels(resolution)
        .filter(|pixel| pixel.x() < 40)
        .collect();
    assert_eq!(left_half.len(), 100);
    for pixel in left_half {
        canvas.paint_with_alpha(pixel, PLAYER, 1.0, player_color(), 1.0);
    }
    canvas.flush_pending_updates();

    region.rescan_coverage(&canvas);
    assert!((region.defended_progress() - 0.25).abs() < 1e-6);
    assert!(!region.is_fully_defended());
}
