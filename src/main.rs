//! Handtron entry point
//!
//! In the browser: webcam capture, a tracking timer and the animation-frame
//! game loop drawing a top-down view on a 2D canvas. Natively: a headless
//! demo fed by a synthetic camera, tracking on its own thread.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, KeyboardEvent, MediaStream,
        MediaStreamConstraints,
    };

    use handtron::Settings;
    use handtron::consts::*;
    use handtron::sim::{GamePhase, Simulator};
    use handtron::steering::{
        Frame, HandTracker, PixelFormat, Region, SteeringSignal, calibrate,
    };

    /// Webcam frames are downscaled to this before tracking
    const CAPTURE_WIDTH: u32 = 160;
    const CAPTURE_HEIGHT: u32 = 120;
    /// Side of the calibration guide box (capture pixels)
    const CALIBRATION_SIZE: u32 = 16;
    /// Pause after a goal or crash before the next level starts (ms)
    const TRANSITION_MS: f32 = 1500.0;
    const MAX_SUBSTEPS: u32 = 8;

    /// Video element plus an offscreen canvas to read its pixels back
    struct Camera {
        video: HtmlVideoElement,
        ctx: CanvasRenderingContext2d,
    }

    impl Camera {
        fn capture(&self) -> Result<Frame, JsValue> {
            let (w, h) = (CAPTURE_WIDTH as f64, CAPTURE_HEIGHT as f64);
            self.ctx
                .draw_image_with_html_video_element_and_dw_and_dh(&self.video, 0.0, 0.0, w, h)?;
            let image = self.ctx.get_image_data(0.0, 0.0, w, h)?;
            Frame::from_raw(image.data().0, image.width(), image.height(), PixelFormat::Rgba8)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }

    /// Game instance holding all state
    struct Game {
        settings: Settings,
        sim: Simulator,
        /// `None` until the player calibrates
        tracker: Option<HandTracker>,
        signal: SteeringSignal,
        camera: Camera,
        view: CanvasRenderingContext2d,
        view_size: (f64, f64),
        accumulator: f32,
        last_time: f64,
        /// Countdown to `Simulator::advance` after a goal or crash
        transition_ms: Option<f32>,
        calibrate_requested: bool,
    }

    impl Game {
        /// Tracking timer callback
        fn track(&mut self) -> Result<(), JsValue> {
            let frame = self.camera.capture()?;
            if self.calibrate_requested {
                self.calibrate_requested = false;
                let region = Region::centered(frame.width(), frame.height(), CALIBRATION_SIZE);
                match calibrate(&frame.view(), region) {
                    Ok(skin) => {
                        let tracker = HandTracker::new(skin, self.settings.tracker_config())
                            .with_signal(self.signal.clone());
                        self.tracker = Some(tracker);
                    }
                    Err(e) => log::warn!("Calibration failed: {}", e),
                }
                return Ok(());
            }
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.estimate(&frame.view());
            }
            Ok(())
        }

        /// Run simulation ticks for `dt_ms` of wall time
        fn update(&mut self, dt_ms: f32) {
            let dt_ms = dt_ms.min(100.0);

            if let Some(remaining) = self.transition_ms {
                let remaining = remaining - dt_ms;
                if remaining > 0.0 {
                    self.transition_ms = Some(remaining);
                } else {
                    self.finish_transition();
                }
                return;
            }

            self.accumulator += dt_ms;
            let mut substeps = 0;
            while self.accumulator >= TIMESTEP_MS && substeps < MAX_SUBSTEPS {
                self.accumulator -= TIMESTEP_MS;
                substeps += 1;
                if let Some(event) = self.sim.step(TIMESTEP_MS, self.signal.theta()) {
                    log::info!("{:?}", event);
                    self.transition_ms = Some(TRANSITION_MS);
                    self.accumulator = 0.0;
                    break;
                }
            }
        }

        fn finish_transition(&mut self) {
            self.transition_ms = None;
            self.accumulator = 0.0;
            self.sim.advance();
        }

        /// Top-down render sink; reads the state, never mutates it
        fn render(&self) -> Result<(), JsValue> {
            let ctx = &self.view;
            let state = self.sim.state();
            let config = self.sim.config();
            let (w, h) = self.view_size;
            let sx = w / config.arena.map_width as f64;
            let sy = h / config.arena.map_height as f64;
            let cell = config.arena.cell_size();

            ctx.set_global_alpha(1.0);
            ctx.set_fill_style_str("#0b0f14");
            ctx.fill_rect(0.0, 0.0, w, h);

            for obstacle in &state.obstacles {
                match obstacle.hover {
                    Some(hover) => {
                        let alpha = 1.0 - 0.8 * (hover.z / FLOATING_OBSTACLE_MAX_HEIGHT) as f64;
                        ctx.set_global_alpha(alpha);
                        ctx.set_fill_style_str("#3fa7ff");
                    }
                    None => ctx.set_fill_style_str("#c8324b"),
                }
                ctx.fill_rect(
                    obstacle.pos.x as f64 * sx,
                    obstacle.pos.y as f64 * sy,
                    cell.x as f64 * sx,
                    cell.y as f64 * sy,
                );
                ctx.set_global_alpha(1.0);
            }

            if let Some(goal) = &state.goal {
                ctx.set_fill_style_str("#3ddc84");
                ctx.fill_rect(
                    goal.pos.x as f64 * sx,
                    goal.pos.y as f64 * sy,
                    cell.x as f64 * sx,
                    cell.y as f64 * sy,
                );
            }

            let [nose, a, b] = state.player.hit_box(config.player_length, config.player_width);
            ctx.set_fill_style_str("#f5d142");
            ctx.begin_path();
            ctx.move_to(nose.x as f64 * sx, nose.y as f64 * sy);
            ctx.line_to(a.x as f64 * sx, a.y as f64 * sy);
            ctx.line_to(b.x as f64 * sx, b.y as f64 * sy);
            ctx.close_path();
            ctx.fill();

            ctx.set_fill_style_str("#e6e6e6");
            ctx.set_font("16px monospace");
            ctx.fill_text(
                &format!(
                    "Level {}  Score {}  Steering {:+.2}",
                    state.level,
                    state.display_score(),
                    self.signal.theta()
                ),
                10.0,
                22.0,
            )?;

            let message = match (state.phase, self.tracker.is_some()) {
                (GamePhase::GoalReached, _) => Some("Goal!".to_string()),
                (GamePhase::GameOver, _) => {
                    Some(format!("Game over - score {}", state.display_score()))
                }
                (_, false) => Some("Hold a hand in front of the camera and press C".to_string()),
                _ if state.paused => Some("Paused".to_string()),
                _ if !self.signal.is_active() => Some("Show both hands".to_string()),
                _ => None,
            };
            if let Some(message) = message {
                ctx.fill_text(&message, 10.0, h - 16.0)?;
            }
            Ok(())
        }
    }

    fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
        canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)
    }

    async fn open_camera(document: &web_sys::Document) -> Result<Camera, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&JsValue::TRUE);
        let promise = window
            .navigator()
            .media_devices()?
            .get_user_media_with_constraints(&constraints)?;
        let stream: MediaStream = JsFuture::from(promise).await?.dyn_into()?;

        let video: HtmlVideoElement = document.create_element("video")?.dyn_into()?;
        video.set_muted(true);
        video.set_src_object(Some(&stream));
        JsFuture::from(video.play()?).await?;

        let capture: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        capture.set_width(CAPTURE_WIDTH);
        capture.set_height(CAPTURE_HEIGHT);
        Ok(Camera {
            video,
            ctx: context_2d(&capture)?,
        })
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Handtron starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let view = context_2d(&canvas)?;
        let view_size = (canvas.width() as f64, canvas.height() as f64);

        let camera = open_camera(&document).await?;

        let settings = Settings::load();
        let mut sim_config = settings.sim_config();
        sim_config.seed.get_or_insert(js_sys::Date::now() as u64);

        let poll_ms = settings.poll_frequency_ms;
        let game = Rc::new(RefCell::new(Game {
            sim: Simulator::new(sim_config),
            settings,
            tracker: None,
            signal: SteeringSignal::new(),
            camera,
            view,
            view_size,
            accumulator: 0.0,
            last_time: 0.0,
            transition_ms: None,
            calibrate_requested: false,
        }));

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                if let Err(e) = game.borrow_mut().track() {
                    log::warn!("Frame capture failed: {:?}", e);
                }
            });
            window.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                poll_ms as i32,
            )?;
            closure.forget();
        }

        setup_input_handlers(&window, game.clone())?;
        request_animation_frame(game);

        log::info!("Handtron running!");
        Ok(())
    }

    fn setup_input_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                "c" | "C" => g.calibrate_requested = true,
                " " => {
                    let paused = g.sim.state().paused;
                    g.sim.set_paused(!paused);
                }
                "Enter" if g.transition_ms.is_some() => g.finish_transition(),
                _ => {}
            }
        });
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                (time - g.last_time) as f32
            } else {
                TIMESTEP_MS
            };
            g.last_time = time;

            g.update(dt);
            if let Err(e) = g.render() {
                log::warn!("Render error: {:?}", e);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native_demo {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use handtron::Settings;
    use handtron::consts::*;
    use handtron::sim::{Simulator, TickEvent};
    use handtron::steering::{
        Centroid, Frame, FrameError, HandTracker, Pixel, PixelFormat, Region, Rgb, SteeringSignal,
        calibrate,
    };

    const FRAME_WIDTH: u32 = 160;
    const FRAME_HEIGHT: u32 = 120;
    const HAND_SIZE: u32 = 12;
    const SKIN: Rgb = Rgb::new(224.0, 172.0, 105.0);
    const BACKGROUND: Rgb = Rgb::new(40.0, 44.0, 52.0);
    const MAX_SUBSTEPS: u32 = 8;

    /// Stand-in webcam: two skin-colored squares tilting like hands on a wheel.
    /// The right hand drops out for one second in every eight.
    struct SyntheticCamera {
        started: Instant,
    }

    impl SyntheticCamera {
        fn calibration_frame(&self) -> Frame {
            let mut frame = Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, PixelFormat::Rgba8, BACKGROUND);
            paint_square(&mut frame, FRAME_WIDTH / 2, FRAME_HEIGHT / 2, HAND_SIZE * 2);
            frame
        }

        fn capture(&self) -> Frame {
            let t = self.started.elapsed().as_secs_f32();
            let offset = 0.35 * (t * 0.6).sin() * FRAME_WIDTH as f32 * 0.3;
            let mid = FRAME_HEIGHT as f32 / 2.0;

            let mut frame = Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, PixelFormat::Rgba8, BACKGROUND);
            paint_square(&mut frame, FRAME_WIDTH / 5, (mid + offset) as u32, HAND_SIZE);
            if t % 8.0 < 7.0 {
                paint_square(&mut frame, FRAME_WIDTH * 4 / 5, (mid - offset) as u32, HAND_SIZE);
            }
            frame
        }
    }

    fn paint_square(frame: &mut Frame, cx: u32, cy: u32, size: u32) {
        let half = size / 2;
        for y in cy.saturating_sub(half)..(cy + half).min(frame.height()) {
            for x in cx.saturating_sub(half)..(cx + half).min(frame.width()) {
                frame.set_pixel(x, y, SKIN);
            }
        }
    }

    fn track(camera: SyntheticCamera, mut tracker: HandTracker, poll: Duration, running: Arc<AtomicBool>) {
        let mut was_active = false;
        while running.load(Ordering::Acquire) {
            let start = Instant::now();
            let frame = camera.capture();
            let estimate = tracker.estimate(&frame.view());
            if estimate.confidence != was_active {
                if estimate.confidence {
                    log::info!("Hands found, steering {:+.2}", estimate.theta);
                } else {
                    log::info!("Hands lost, holding steering at {:+.2}", estimate.theta);
                }
                was_active = estimate.confidence;
            }
            if let Some(rest) = poll.checked_sub(start.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    fn report(sim: &Simulator, signal: &SteeringSignal) {
        let state = sim.state();
        let dir = state.player.dir;
        log::info!(
            "level {} score {} pos ({:.0}, {:.0}) heading {:.0} deg steering {:+.2}{}",
            state.level,
            state.display_score(),
            state.player.pos.x,
            state.player.pos.y,
            dir.y.atan2(dir.x).to_degrees(),
            signal.theta(),
            if signal.is_active() { "" } else { " (no hands)" }
        );
    }

    pub fn run(settings: &Settings, duration: Duration) -> Result<(), FrameError> {
        let camera = SyntheticCamera {
            started: Instant::now(),
        };
        let skin = calibrate(
            &camera.calibration_frame().view(),
            Region::centered(FRAME_WIDTH, FRAME_HEIGHT, HAND_SIZE),
        )?;

        let signal = SteeringSignal::new();
        let tracker = HandTracker::new(skin, settings.tracker_config())
            .with_signal(signal.clone())
            .with_observer(|pixels: &[Pixel], left: Centroid, right: Centroid| {
                log::trace!(
                    "{} skin pixels, left ({:.1}, {:.1}) right ({:.1}, {:.1})",
                    pixels.len(),
                    left.x,
                    left.y,
                    right.x,
                    right.y
                );
            });

        let running = Arc::new(AtomicBool::new(true));
        let poll = Duration::from_millis(u64::from(settings.poll_frequency_ms));
        let tracking = {
            let running = running.clone();
            thread::spawn(move || track(camera, tracker, poll, running))
        };

        let mut sim = Simulator::new(settings.sim_config());
        let step = Duration::from_secs_f32(TIMESTEP_MS / 1000.0);
        let started = Instant::now();
        let mut last = started;
        let mut accumulator = Duration::ZERO;
        let mut next_report = Duration::ZERO;

        while started.elapsed() < duration {
            let now = Instant::now();
            accumulator += now - last;
            last = now;

            let mut substeps = 0;
            while accumulator >= step {
                accumulator -= step;
                substeps += 1;
                match sim.step(TIMESTEP_MS, signal.theta()) {
                    Some(TickEvent::GoalReached { level }) => {
                        log::info!("Goal! On to level {}", level);
                        sim.advance();
                    }
                    Some(TickEvent::GameOver) => {
                        log::info!("Crashed with score {}", sim.state().display_score());
                        sim.advance();
                    }
                    None => {}
                }
                if substeps == MAX_SUBSTEPS {
                    accumulator = Duration::ZERO;
                }
            }

            if started.elapsed() >= next_report {
                report(&sim, &signal);
                next_report += Duration::from_secs(1);
            }
            thread::sleep(step / 2);
        }

        running.store(false, Ordering::Release);
        if tracking.join().is_err() {
            log::error!("Tracking thread panicked");
        }
        log::info!(
            "Demo finished on level {} with score {}",
            sim.state().level,
            sim.state().display_score()
        );
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        web_sys::console::error_1(&e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::Duration;

    use handtron::Settings;

    const DEFAULT_DEMO_SECS: u64 = 20;

    env_logger::init();
    log::info!("Handtron (native) starting...");
    log::info!("Running headless demo with a synthetic camera - use `trunk serve` for the webcam version");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match Settings::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DEMO_SECS);

    if let Err(e) = native_demo::run(&settings, Duration::from_secs(seconds)) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
