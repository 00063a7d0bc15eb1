// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cache;
pub mod ids;
pub mod model;
pub mod reconcile;
pub mod schema;
pub mod session;
pub mod state;
pub mod validation;

pub use cache::*;
pub use ids::*;
pub use model::*;
pub use reconcile::*;
pub use schema::*;
pub use session::*;
pub use state::*;
