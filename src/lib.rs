use std::sync::{Arc, Mutex};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};
use glam::Vec2;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use once_cell::sync::{Lazy, OnceCell};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::future_to_promise;
#[cfg(target_arch = "wasm32")]
use js_sys::Promise;
#[cfg(target_arch = "wasm32")]
use winit::event_loop::EventLoopProxy;

pub mod analysis;
pub mod canvas;
pub mod color;
pub mod config;
pub mod driver;
pub mod models;
pub mod scene;
pub mod ui_events;
pub mod viewport;
mod app_state;

use app_state::State;
use canvas::Canvas;
use config::AppConfig;
use driver::{Driver, SurfaceMetrics};
use ui_events::UserCommand;

#[cfg(target_arch = "wasm32")]
use analysis::{HttpTransport, UploadFile};
#[cfg(target_arch = "wasm32")]
use config::{AnalysisConfig, SceneKind};

#[cfg(target_arch = "wasm32")]
static WASM_API_INSTANCE: OnceCell<WasmApi> = OnceCell::new();

#[cfg(target_arch = "wasm32")]
static WASM_READY_FLUME_CHANNEL: OnceCell<(flume::Sender<()>, flume::Receiver<()>)> = OnceCell::new();

// Analysis settings used by `analyzeFile`, kept in sync by `setConfig`.
#[cfg(target_arch = "wasm32")]
static ANALYSIS_CONFIG: Lazy<Mutex<AnalysisConfig>> = Lazy::new(|| Mutex::new(AnalysisConfig::default()));

struct App {
    window: Option<Arc<Window>>,
    state: Arc<Mutex<Option<State>>>, // Filled asynchronously on wasm
    driver: Driver,
    config: AppConfig,
    #[cfg(target_arch = "wasm32")]
    proxy: Option<EventLoopProxy<UserCommand>>,
}

impl App {
    fn new(config: AppConfig, #[cfg(target_arch = "wasm32")] event_loop: &EventLoop<UserCommand>) -> Self {
        #[cfg(target_arch = "wasm32")]
        let app_proxy = event_loop.create_proxy();

        #[cfg(target_arch = "wasm32")]
        {
            let wasm_api_instance = WasmApi { proxy: app_proxy.clone() };
            if WASM_API_INSTANCE.set(wasm_api_instance).is_err() {
                log::warn!("WASM_API_INSTANCE was already set. This should only happen once.");
            }
            if let Ok(mut analysis) = ANALYSIS_CONFIG.lock() {
                *analysis = config.analysis.clone();
            }
        }

        let driver = Driver::new(scene::build_scene(&config), config.seed);
        Self {
            window: None,
            state: Arc::new(Mutex::new(None)),
            driver,
            config,
            #[cfg(target_arch = "wasm32")]
            proxy: Some(app_proxy),
        }
    }

    fn surface_metrics(&self) -> Option<SurfaceMetrics> {
        let window = self.window.as_ref()?;
        let size = window.inner_size();
        Some(SurfaceMetrics::from_physical(
            size.width,
            size.height,
            window.scale_factor(),
            self.driver.scene().max_device_pixel_ratio(),
        ))
    }

    /// Hands the current window size to the driver and the GPU surface.
    fn sync_surface(&mut self) {
        let (Some(window), Some(metrics)) = (self.window.clone(), self.surface_metrics()) else {
            return;
        };
        self.driver.resize(metrics);
        with_state(&self.state, |state| configure_surface(state, &window, &metrics));
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let driver = &mut self.driver;
        let outcome = with_state(&self.state, |state| {
            let running = driver.step(&mut state.draw_list);
            if !running {
                state.draw_list.clear();
            }
            state.update();
            match state.render() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory, exiting.");
                    return None;
                }
                Err(e) => log::error!("{:?}", e),
            }
            Some(running)
        });

        match outcome {
            Some(Some(true)) => {
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            Some(None) => event_loop.exit(),
            _ => {}
        }
    }
}

fn with_state<R>(state: &Mutex<Option<State>>, f: impl FnOnce(&mut State) -> R) -> Option<R> {
    match state.lock() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            log::error!("GPU state lock poisoned.");
            None
        }
    }
}

// The browser surface is sized to the (possibly capped) backing store; a
// native swapchain must match the window.
fn configure_surface(state: &mut State, window: &Window, metrics: &SurfaceMetrics) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            let _ = window;
            let (width, height) = metrics.backing_size();
            state.resize(width, height, metrics.device_pixel_ratio);
        } else {
            let _ = metrics;
            let size = window.inner_size();
            state.resize(size.width, size.height, window.scale_factor());
        }
    }
}

impl ApplicationHandler<UserCommand> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("DeepGuard");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(State::new(window.clone())) {
                Ok(state) => {
                    if let Ok(mut guard) = self.state.lock() {
                        guard.replace(state);
                    }
                    self.sync_surface();
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to create GPU state: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            // Clone Arc<Mutex<Option<State>>> and Arc<Window> for the async task
            let state_arc_for_spawn = self.state.clone();
            let Some(proxy_for_init_notification) = self.proxy.clone() else {
                log::error!("App proxy not set.");
                return;
            };

            wasm_bindgen_futures::spawn_local(async move {
                match State::new(window).await {
                    Ok(state_instance) => {
                        log::info!("WASM State created in async task.");
                        if let Ok(mut guard) = state_arc_for_spawn.lock() {
                            guard.replace(state_instance);
                        }
                        if proxy_for_init_notification.send_event(UserCommand::StateInitialized).is_err() {
                            log::error!("Failed to send StateInitialized event.");
                        }
                    }
                    Err(e) => log::error!("Failed to create State in WASM: {:?}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserCommand) {
        match event {
            UserCommand::StateInitialized => {
                log::info!("WASM State initialized and ready.");
                // Signal to the promise resolver
                #[cfg(target_arch = "wasm32")]
                if let Some((sender, _)) = WASM_READY_FLUME_CHANNEL.get() {
                    if let Err(e) = sender.send(()) {
                        log::error!("Failed to send WASM ready signal: {:?}", e);
                    }
                }
                self.sync_surface();
            }
            command => {
                self.driver.process_command(command, &mut self.config);
                // A new scene may cap the pixel ratio differently.
                self.sync_surface();
            }
        }
        if let Some(w_handle) = self.window.as_ref() {
            w_handle.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.driver.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.sync_surface();
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(window.scale_factor());
                self.driver.pointer_moved(Vec2::new(logical.x, logical.y));
            }
            WindowEvent::CursorLeft { .. } => self.driver.pointer_left(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.driver.stop();
    }
}

/// Installs the platform logger. Call once, before [`run`].
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized.".into());
        }
    }
}

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    log::info!("Starting DeepGuard backdrop ({:?} scene).", config.scene);

    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(
        config,
        #[cfg(target_arch = "wasm32")]
        &event_loop,
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    init_logging();
    log::info!("WASM started: Calling run().");

    let (sender, receiver) = flume::unbounded();
    if WASM_READY_FLUME_CHANNEL.set((sender, receiver)).is_err() {
        return Err(JsValue::from_str("WASM ready channel was already initialized."));
    }

    run(AppConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct WasmApi {
    proxy: EventLoopProxy<UserCommand>,
}

#[cfg(target_arch = "wasm32")]
impl WasmApi {
    fn send(&self, command: UserCommand) -> Result<(), JsValue> {
        self.proxy
            .send_event(command)
            .map_err(|_| JsValue::from_str("Failed to send command to event loop."))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl WasmApi {
    #[wasm_bindgen(js_name = setScene)]
    pub fn set_scene(&self, kind: &str) -> Result<(), JsValue> {
        let kind: SceneKind = kind.parse().map_err(|e: anyhow::Error| JsValue::from_str(&e.to_string()))?;
        log::info!("Received SetScene({:?}) from JS.", kind);
        self.send(UserCommand::SetScene(kind))
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&self, config_json: &str) -> Result<(), JsValue> {
        let config = AppConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
        if let Ok(mut analysis) = ANALYSIS_CONFIG.lock() {
            *analysis = config.analysis.clone();
        }
        log::info!("Received SetConfig command from JS.");
        self.send(UserCommand::SetConfig(Box::new(config)))
    }

    pub fn teardown(&self) -> Result<(), JsValue> {
        self.send(UserCommand::Teardown)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmApi)]
pub fn get_wasm_api() -> Result<WasmApi, JsValue> {
    WASM_API_INSTANCE.get()
        .cloned()
        .ok_or_else(|| JsValue::from_str("WasmApi is not initialized. Call run_web() first."))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmReadyPromise)]
pub fn get_wasm_ready_promise() -> Result<Promise, JsValue> {
    let (_, receiver) = WASM_READY_FLUME_CHANNEL.get()
        .ok_or_else(|| JsValue::from_str("WASM ready channel not initialized. Call run_web() first."))?;
    let receiver = receiver.clone();

    let ready_promise = future_to_promise(async move {
        receiver
            .recv_async()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsValue::NULL)
    });

    Ok(ready_promise)
}

/// Uploads one file to the analysis service. Resolves with the normalized
/// result object, rejects with the message to show the user.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = analyzeFile)]
pub fn analyze_file(name: String, mime_type: String, bytes: Vec<u8>) -> Promise {
    let config = ANALYSIS_CONFIG.lock().map(|c| c.clone()).unwrap_or_default();

    future_to_promise(async move {
        let file = UploadFile::new(name, Some(mime_type), bytes);
        file.validate(config.max_upload_bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let transport = HttpTransport::new();
        let deadline = analysis::deadline(config.timeout());
        match analysis::analyze(&transport, &config.endpoint(), &file, deadline).await {
            Ok(result) => {
                let json = serde_json::to_string(&result)
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                js_sys::JSON::parse(&json)
            }
            Err(err) => {
                log::error!("API Error: {err}");
                Err(JsValue::from_str(&err.user_message()))
            }
        }
    })
}
