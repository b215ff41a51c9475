// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod api;
pub mod crud;
pub mod error;
pub mod forms;
pub mod ids;
pub mod model;
pub mod paging;
pub mod reference;
pub mod state;
pub mod surface;

pub use api::*;
pub use crud::*;
pub use error::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use paging::*;
pub use reference::*;
pub use state::*;
pub use surface::*;
