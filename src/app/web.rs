//! Browser driver
//!
//! [`PageHost`] maps [`Host`] onto the page: query string from
//! `location.search`, the loading indicator and the stats overlay by
//! element id, and `requestAnimationFrame` for scheduling.
//! [`run_web`] drives an [`AppContext`] from animation frames.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::app::context::AppContext;
use crate::app::host::Host;
use crate::errors::{ArError, Result};
use crate::render::Viewport;
use crate::utils::{FrameStats, Timer};

/// Shared slot holding the animation frame callback.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Routes `log` to the browser console and panics to `console.error`.
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("Logger already initialized");
    }
}

pub struct PageHost {
    window: web_sys::Window,
    loading: Option<web_sys::HtmlElement>,
    stats: Option<web_sys::HtmlElement>,
    frame_callback: FrameCallback,
}

impl PageHost {
    /// Looks up the loading indicator and the stats overlay by id. Missing
    /// elements are tolerated.
    pub fn new(loading_id: &str, stats_id: &str) -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| ArError::WasmError("missing window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| ArError::WasmError("missing document".to_string()))?;

        let element = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
        };

        Ok(Self {
            loading: element(loading_id),
            stats: element(stats_id),
            window,
            frame_callback: Rc::new(RefCell::new(None)),
        })
    }

    /// The slot [`run_web`] fills with the frame callback.
    #[must_use]
    pub fn frame_callback(&self) -> FrameCallback {
        Rc::clone(&self.frame_callback)
    }
}

impl Host for PageHost {
    fn query_string(&self) -> String {
        self.window.location().search().unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: std::result::Result<wasm_bindgen::JsValue, _>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32
        };
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn set_loading_visible(&mut self, visible: bool) {
        let Some(loading) = &self.loading else { return };
        let display = if visible { "block" } else { "none" };
        if let Err(e) = loading.style().set_property("display", display) {
            log::warn!("Failed to toggle loading indicator: {e:?}");
        }
    }

    fn request_frame(&mut self) {
        if let Some(callback) = self.frame_callback.borrow().as_ref()
            && let Err(e) = self
                .window
                .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            log::error!("requestAnimationFrame failed: {e:?}");
        }
    }

    fn update_stats(&mut self, stats: &FrameStats) {
        if let Some(el) = &self.stats {
            el.set_text_content(Some(&format!("{:.0} FPS ({:.1} ms)", stats.fps, stats.frame_ms)));
        }
    }
}

/// Starts ticking `ctx` from animation frames. Window resizes are applied
/// before the next tick.
///
/// `frame_callback` must be the slot of the context's [`PageHost`].
pub fn run_web(ctx: AppContext, frame_callback: &FrameCallback) -> Result<()> {
    let window =
        web_sys::window().ok_or_else(|| ArError::WasmError("missing window".to_string()))?;

    let resized = Rc::new(Cell::new(false));
    let flag = Rc::clone(&resized);
    let on_resize = Closure::<dyn FnMut()>::new(move || flag.set(true));
    window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        .map_err(|e| ArError::WasmError(format!("{e:?}")))?;
    on_resize.forget();

    let mut ctx = ctx;
    let mut timer = Timer::new();
    *frame_callback.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
        if resized.replace(false) {
            ctx.resize();
        }
        let frame = timer.tick();
        ctx.tick(&frame);
    }));

    if let Some(callback) = frame_callback.borrow().as_ref() {
        window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| ArError::WasmError(format!("{e:?}")))?;
    }
    Ok(())
}
