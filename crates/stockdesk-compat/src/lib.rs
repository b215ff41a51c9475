// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Workarounds for rendering and interaction defects of the WeChat Work
//! embedded browser, modelled as detect, correct, persist.

pub mod correction;
pub mod detect;
pub mod document;
pub mod menu;
pub mod patch;

pub use correction::*;
pub use detect::*;
pub use document::*;
pub use menu::*;
pub use patch::*;
