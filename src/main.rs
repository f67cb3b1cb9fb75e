//! Nose Balance entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{HtmlCanvasElement, HtmlElement, HtmlVideoElement, MediaStream, MediaStreamTrack};

    use nose_balance::persistence::LocalStorageStore;
    use nose_balance::platform::{Detector, SetupSlot};
    use nose_balance::renderer::CanvasRenderer;
    use nose_balance::sim::{FrameSize, FrameSnapshot, GameEvent, GameState, Landmark, TickInput, tick};
    use nose_balance::ui::LoadingStage;
    use nose_balance::{BestScore, SetupError, Tuning, format_seconds};

    // MediaPipe face landmarker and getUserMedia bindings
    #[wasm_bindgen(inline_js = "
        import { FilesetResolver, FaceLandmarker } from 'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.0/vision_bundle.js';

        export async function create_face_landmarker() {
            const fileset = await FilesetResolver.forVisionTasks(
                'https://cdn.jsdelivr.net/npm/@mediapipe/tasks-vision@0.10.0/wasm'
            );
            return FaceLandmarker.createFromOptions(fileset, {
                baseOptions: { modelAssetPath: './models/face_landmarker.task' },
                runningMode: 'VIDEO',
                numFaces: 1,
            });
        }

        export function detect_landmarks(landmarker, video, timestamp) {
            const result = landmarker.detectForVideo(video, timestamp);
            const face = result && result.faceLandmarks && result.faceLandmarks[0];
            if (!face) return null;
            const out = new Float32Array(face.length * 3);
            for (let i = 0; i < face.length; i++) {
                out[i * 3] = face[i].x;
                out[i * 3 + 1] = face[i].y;
                out[i * 3 + 2] = face[i].z || 0;
            }
            return out;
        }

        export function close_landmarker(landmarker) {
            if (landmarker && landmarker.close) landmarker.close();
        }

        export async function open_camera(video) {
            if (!navigator.mediaDevices || !navigator.mediaDevices.getUserMedia) {
                const err = new Error('Webcam not supported in this browser');
                err.name = 'NotSupportedError';
                throw err;
            }
            const stream = await navigator.mediaDevices.getUserMedia({
                audio: false,
                video: {
                    width: { ideal: 1280 },
                    height: { ideal: 720 },
                    frameRate: { ideal: 30 },
                    facingMode: 'user',
                },
            });
            video.srcObject = stream;
            await video.play();
            return stream;
        }

        export function wait_for_video(video) {
            if (video.readyState >= 2) return Promise.resolve();
            return new Promise((resolve) => {
                video.addEventListener('loadeddata', resolve, { once: true });
            });
        }
    ")]
    extern "C" {
        #[wasm_bindgen(catch)]
        async fn create_face_landmarker() -> Result<JsValue, JsValue>;
        fn detect_landmarks(landmarker: &JsValue, video: &HtmlVideoElement, timestamp: f64) -> JsValue;
        fn close_landmarker(landmarker: &JsValue);
        #[wasm_bindgen(catch)]
        async fn open_camera(video: &HtmlVideoElement) -> Result<JsValue, JsValue>;
        fn wait_for_video(video: &HtmlVideoElement) -> js_sys::Promise;
    }

    /// MediaPipe FaceLandmarker bound to the hidden video element
    struct MediaPipeDetector {
        landmarker: JsValue,
        video: HtmlVideoElement,
        last_timestamp: f64,
    }

    impl Detector for MediaPipeDetector {
        fn detect(&mut self, timestamp_ms: f64) -> Option<Vec<Landmark>> {
            // MediaPipe rejects timestamps that go backwards
            let ts = timestamp_ms.max(self.last_timestamp);
            self.last_timestamp = ts;

            let raw = detect_landmarks(&self.landmarker, &self.video, ts);
            let points = raw.dyn_into::<js_sys::Float32Array>().ok()?.to_vec();
            Some(
                points
                    .chunks_exact(3)
                    .map(|p| Landmark { x: p[0], y: p[1], z: p[2] })
                    .collect(),
            )
        }

        fn close(&mut self) {
            close_landmarker(&self.landmarker);
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: CanvasRenderer,
        video: HtmlVideoElement,
        detector: SetupSlot<MediaPipeDetector>,
        camera: SetupSlot<MediaStream>,
        store: LocalStorageStore,
        frame: FrameSize,
    }

    impl Game {
        fn update(&mut self, time: f64) {
            let video_ready = self.video.ready_state() >= 2;
            let landmarks = if self.state.is_tracking() && video_ready {
                self.detector.get_mut().and_then(|d| d.detect(time))
            } else {
                None
            };

            let input = TickInput {
                landmarks: landmarks.as_deref(),
                frame: self.frame,
            };
            let snapshot = tick(&mut self.state, &input, time);

            for event in &snapshot.events {
                if let GameEvent::NewBest { best_ms } = event {
                    log::info!("Saving best score {}s", format_seconds(*best_ms));
                    self.state.best.save(&mut self.store);
                }
            }

            if let Err(e) = self.renderer.draw(&snapshot) {
                log::warn!("Render error: {:?}", e);
            }
            update_hud(&snapshot);
        }

        /// Called once setup has resolved
        fn attach_video(&mut self) {
            self.renderer.sync_to_video();
            let size = self.renderer.size();
            self.frame = FrameSize::new(size.x, size.y);
        }

        /// Stop the camera and release the detector
        fn teardown(&mut self) {
            if let Some(stream) = self.camera.take() {
                for track in stream.get_tracks().iter() {
                    if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                        track.stop();
                    }
                }
            }
            if let Some(mut detector) = self.detector.take() {
                detector.close();
            }
        }
    }

    fn now_ms() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    fn js_error_message(err: &JsValue) -> (String, String) {
        let field = |key: &str| {
            js_sys::Reflect::get(err, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default()
        };
        let message = err.as_string().unwrap_or_else(|| field("message"));
        (field("name"), message)
    }

    async fn ensure_detector(game: &Rc<RefCell<Game>>) -> Result<(), SetupError> {
        if !game.borrow_mut().detector.begin() {
            if game.borrow().detector.is_ready() {
                return Ok(());
            }
            return Err(SetupError::Other("Face tracker is still loading".into()));
        }

        let result = create_face_landmarker().await.map_err(|err| {
            let (_, message) = js_error_message(&err);
            SetupError::DetectorLoad(message)
        });

        let mut g = game.borrow_mut();
        let video = g.video.clone();
        g.detector.finish(result.map(|landmarker| MediaPipeDetector {
            landmarker,
            video,
            last_timestamp: 0.0,
        }))
    }

    async fn ensure_camera(game: &Rc<RefCell<Game>>) -> Result<(), SetupError> {
        if !game.borrow_mut().camera.begin() {
            if game.borrow().camera.is_ready() {
                return Ok(());
            }
            return Err(SetupError::Other("Camera is still starting".into()));
        }

        let video = game.borrow().video.clone();
        let result = open_camera(&video)
            .await
            .map(|stream| stream.unchecked_into::<MediaStream>())
            .map_err(|err| {
                let (name, message) = js_error_message(&err);
                SetupError::from_dom_error(&name, &message)
            });

        game.borrow_mut().camera.finish(result)
    }

    async fn setup(game: &Rc<RefCell<Game>>) -> Result<(), SetupError> {
        ensure_detector(game).await?;
        game.borrow_mut().state.set_loading_stage(LoadingStage::Camera);
        ensure_camera(game).await?;

        let video = game.borrow().video.clone();
        JsFuture::from(wait_for_video(&video))
            .await
            .map_err(|err| SetupError::Other(js_error_message(&err).1))?;
        Ok(())
    }

    async fn begin_game_flow(game: Rc<RefCell<Game>>) {
        if !game.borrow_mut().state.start() {
            return;
        }

        match setup(&game).await {
            Ok(()) => {
                let mut g = game.borrow_mut();
                g.attach_video();
                g.state.setup_ready(now_ms());
            }
            Err(err) => {
                log::error!("Setup failed: {}", err);
                game.borrow_mut().state.setup_failed(&err, now_ms());
            }
        }
    }

    fn update_hud(snapshot: &FrameSnapshot) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(el) = document.get_element_by_id("score") {
            el.set_text_content(Some(&format_seconds(snapshot.score_ms)));
        }
        if let Some(el) = document.get_element_by_id("best") {
            el.set_text_content(Some(&format_seconds(snapshot.best_ms)));
        }

        if let Some(overlay_el) = document.get_element_by_id("overlay") {
            match &snapshot.hud.overlay {
                Some(overlay) => {
                    if let Some(el) = document.get_element_by_id("overlay-title") {
                        el.set_text_content(Some(&overlay.title));
                    }
                    if let Some(el) = document.get_element_by_id("overlay-body") {
                        el.set_text_content(Some(&overlay.body));
                    }
                    if let Some(el) = document
                        .get_element_by_id("overlay-action")
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                    {
                        match &overlay.action {
                            Some(label) => {
                                el.set_text_content(Some(label));
                                let _ = el.style().set_property("display", "inline-flex");
                            }
                            None => {
                                let _ = el.style().set_property("display", "none");
                            }
                        }
                    }
                    let _ = overlay_el.class_list().remove_1("hidden");
                }
                None => {
                    let _ = overlay_el.class_list().add_1("hidden");
                }
            }
        }

        if let Some(el) = document.get_element_by_id("status") {
            match &snapshot.hud.status {
                Some(text) => {
                    el.set_text_content(Some(text));
                    let _ = el.class_list().remove_1("hidden");
                }
                None => {
                    el.set_text_content(Some(""));
                    let _ = el.class_list().add_1("hidden");
                }
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Nose Balance starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("view")
            .ok_or("no canvas")?
            .dyn_into()?;

        let video: HtmlVideoElement = document.create_element("video")?.dyn_into()?;
        video.set_attribute("playsinline", "")?;
        video.set_attribute("autoplay", "")?;
        video.set_muted(true);

        let tuning = Tuning::load();
        let store = LocalStorageStore;
        let best = BestScore::load(&store);
        let frame = FrameSize::new(canvas.width() as f32, canvas.height() as f32);

        let game = Rc::new(RefCell::new(Game {
            state: GameState::new(tuning, best),
            renderer: CanvasRenderer::new(canvas, video.clone())?,
            video,
            detector: SetupSlot::default(),
            camera: SetupSlot::default(),
            store,
            frame,
        }));

        setup_start_button(game.clone());
        setup_visibility_resync(game.clone());
        setup_teardown(game.clone());

        request_animation_frame(game);
        log::info!("Nose Balance running!");
        Ok(())
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) {
        let Some(btn) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("overlay-action"))
        else {
            log::warn!("No overlay action button");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if game.borrow().state.phase.accepts_start() {
                spawn_local(begin_game_flow(game.clone()));
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_visibility_resync(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Visible {
                game.borrow_mut().state.resync_clock(now_ms());
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Ok(mut g) = game.try_borrow_mut() {
                g.teardown();
            }
        });
        let _ = window
            .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            log::error!("requestAnimationFrame unavailable");
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().update(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Nose Balance (native) starting...");
    log::info!("Native mode has no camera - run with `trunk serve` for the web version");

    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session: calibrate level, sit out the countdown, then hold a tilt
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use nose_balance::persistence::{BestScoreStore, MemoryStore};
    use nose_balance::platform::{Detector, ScriptedDetector};
    use nose_balance::sim::{
        FrameSize, GameEvent, GamePhase, GameState, LEFT_EYE_OUTER, Landmark, NOSE_TIP,
        RIGHT_EYE_OUTER, TickInput, tick,
    };
    use nose_balance::{BestScore, Tuning, format_seconds};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const TILT: f32 = 0.25;

    fn face(roll: f32) -> Vec<Landmark> {
        let dy = roll.tan() * 0.08;
        let mut landmarks = vec![Landmark::default(); 478];
        landmarks[LEFT_EYE_OUTER] = Landmark::new(0.42, 0.45 - dy);
        landmarks[RIGHT_EYE_OUTER] = Landmark::new(0.58, 0.45 + dy);
        landmarks[NOSE_TIP] = Landmark::new(0.5, 0.55);
        landmarks
    }

    pub fn run() {
        let mut store = MemoryStore::new();
        let mut state = GameState::new(Tuning::default(), BestScore::load(&store));
        let frame = FrameSize::new(1280.0, 720.0);

        // 1.5s level, 3.5s away from the camera, then tilted until the ball drops
        let mut detector = ScriptedDetector::default();
        for _ in 0..90 {
            detector.push(Some(face(0.0)));
        }
        for _ in 0..210 {
            detector.push(None);
        }
        for _ in 0..1800 {
            detector.push(Some(face(TILT)));
        }

        state.start();
        state.setup_ready(0.0);

        let mut now = 0.0;
        while detector.remaining() > 0 && state.phase != GamePhase::GameOver {
            let landmarks = detector.detect(now);
            let input = TickInput {
                landmarks: landmarks.as_deref(),
                frame,
            };
            let snapshot = tick(&mut state, &input, now);
            for event in &snapshot.events {
                match event {
                    GameEvent::PhaseChanged { from, to } => {
                        log::info!("{:>8.0}ms  {} -> {}", now, from, to)
                    }
                    GameEvent::NewBest { .. } => state.best.save(&mut store),
                    GameEvent::RunEnded { .. } => {}
                }
            }
            now += FRAME_MS;
        }
        detector.close();

        if state.phase == GamePhase::GameOver {
            println!(
                "✓ Ball dropped after {}s at {} rad tilt (best {}s)",
                format_seconds(state.display_score_ms()),
                TILT,
                format_seconds(store.read_best()),
            );
        } else {
            println!("Script ended in {} without a drop", state.phase);
        }
    }
}
