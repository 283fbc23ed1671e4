//! Cropview WASM - WebAssembly bindings for the crop engine
//!
//! This crate exposes the cropview-core crop view to JavaScript/TypeScript
//! hosts.
//!
//! # Module Structure
//!
//! - `engine` - `JsCropEngine`, the gesture/animation/crop facade
//! - `types` - WASM-compatible wrapper types for image data and crop output
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEngine, JsDecodedImage } from '@cropview/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const engine = new JsCropEngine({ target_aspect_ratio: 16 / 9 });
//! engine.set_widget_size(800, 600);
//! engine.load_image(new JsDecodedImage(width, height, rgb), width, height);
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod types;

// Re-export public types
pub use engine::JsCropEngine;
pub use types::{JsCropOutput, JsDecodedImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
