//! Orbiting team-member cloud for the landing page.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! whole behavior of the member cloud: placing the outer ring without
//! overlaps, rotating both rings every animation frame, dragging outer members
//! and springing them back onto their orbit, and the cursor proximity effect.
//! The core is plain Rust and returns [`engine::Action`]s; the `web` feature
//! adds the [`dom`] host that wires page events to the core and applies those
//! actions to the elements.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::CloudCore`] controller and the actions it emits |
//! | [`member`] | Member records, rings, orbits, motion states, and the member store |
//! | [`placement`] | Rejection-sampling placement of the outer ring |
//! | [`orbit`] | Ring rotation, orbit targets, and the snap-back spring |
//! | [`proximity`] | Nearest-member highlight and repulsion |
//! | [`input`] | Pointer samples and the drag gesture state |
//! | [`roster`] | Member image sources and outer-ring selection |
//! | [`config`] | Tunable constants and their validation |
//! | [`geom`] | Points and rectangles |
//! | [`consts`] | Timing and styling constants |
//! | `dom` | Browser host (`web` feature only) |

pub mod config;
pub mod consts;
#[cfg(feature = "web")]
pub mod dom;
pub mod engine;
pub mod geom;
pub mod input;
pub mod member;
pub mod orbit;
pub mod placement;
pub mod proximity;
pub mod roster;
